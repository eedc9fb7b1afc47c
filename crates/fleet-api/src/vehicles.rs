//! `/vehicles` endpoints
//!
//! Engine and machinery types travel as integer codes on this resource.

use fleet_client::{ApiClient, ApiRequest, Result};
use serde::de::IgnoredAny;

use crate::types::{Vehicle, VehicleInput, VehiclePage, VehicleUpdate};

pub async fn list(client: &ApiClient, page: Option<u32>, limit: Option<u32>) -> Result<VehiclePage> {
    let request = ApiRequest::get("/vehicles")
        .query_opt("page", page)
        .query_opt("limit", limit);
    client.call(request, "Failed to fetch vehicles").await
}

pub async fn get(client: &ApiClient, id: u64) -> Result<Vehicle> {
    client
        .call(ApiRequest::get(format!("/vehicles/{id}")), "Failed to fetch vehicle")
        .await
}

pub async fn create(client: &ApiClient, vehicle: &VehicleInput) -> Result<Vehicle> {
    let request = ApiRequest::post("/vehicles").json(vehicle)?;
    client.call(request, "Failed to create vehicle").await
}

pub async fn update(client: &ApiClient, id: u64, update: &VehicleUpdate) -> Result<Vehicle> {
    let request = ApiRequest::patch(format!("/vehicles/{id}")).json(update)?;
    client.call(request, "Failed to update vehicle").await
}

pub async fn delete(client: &ApiClient, id: u64) -> Result<()> {
    client
        .call::<IgnoredAny>(ApiRequest::delete(format!("/vehicles/{id}")), "Failed to delete vehicle")
        .await
        .map(|_| ())
}

/// Toggle availability; a partial update carrying only `available`.
pub async fn set_availability(client: &ApiClient, id: u64, available: bool) -> Result<Vehicle> {
    let changes = VehicleUpdate {
        available: Some(available),
        ..VehicleUpdate::default()
    };
    update(client, id, &changes).await
}
