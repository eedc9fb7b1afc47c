//! `/routes` endpoints
//!
//! Status changes are partial updates carrying the target status. The
//! server is authoritative on transitions; callers can pre-check with
//! `RouteStatus::can_transition_to`.

use fleet_client::{ApiClient, ApiError, ApiRequest, Result};
use serde::de::IgnoredAny;
use tracing::debug;

use crate::types::{NewRoute, Route, RoutePage, RouteStatus, RouteUpdate};

pub async fn list(client: &ApiClient, page: Option<u32>, limit: Option<u32>) -> Result<RoutePage> {
    let request = ApiRequest::get("/routes")
        .query_opt("page", page)
        .query_opt("limit", limit);
    client.call(request, "Failed to fetch routes").await
}

pub async fn get(client: &ApiClient, id: u64) -> Result<Route> {
    client
        .call(ApiRequest::get(format!("/routes/{id}")), "Failed to fetch route")
        .await
}

pub async fn create(client: &ApiClient, route: &NewRoute) -> Result<Route> {
    let request = ApiRequest::post("/routes").json(route)?;
    client.call(request, "Failed to create route").await
}

pub async fn update(client: &ApiClient, id: u64, update: &RouteUpdate) -> Result<Route> {
    let request = ApiRequest::patch(format!("/routes/{id}")).json(update)?;
    client.call(request, "Failed to update route").await
}

pub async fn delete(client: &ApiClient, id: u64) -> Result<()> {
    client
        .call::<IgnoredAny>(ApiRequest::delete(format!("/routes/{id}")), "Failed to delete route")
        .await
        .map(|_| ())
}

pub async fn start(client: &ApiClient, id: u64) -> Result<Route> {
    set_status(client, id, RouteStatus::InProgress, None).await
}

/// Complete a route with the fuel actually consumed, in liters.
pub async fn complete(client: &ApiClient, id: u64, actual_fuel_l: f64) -> Result<Route> {
    if !actual_fuel_l.is_finite() || actual_fuel_l <= 0.0 {
        return Err(ApiError::Request(
            "actual fuel must be greater than zero".into(),
        ));
    }
    set_status(client, id, RouteStatus::Completed, Some(actual_fuel_l)).await
}

pub async fn cancel(client: &ApiClient, id: u64) -> Result<Route> {
    set_status(client, id, RouteStatus::Cancelled, None).await
}

async fn set_status(
    client: &ApiClient,
    id: u64,
    status: RouteStatus,
    actual_fuel_l: Option<f64>,
) -> Result<Route> {
    debug!(route_id = id, status = status.label(), "changing route status");
    let changes = RouteUpdate {
        status: Some(status),
        actual_fuel_l,
        ..RouteUpdate::default()
    };
    update(client, id, &changes).await
}
