use serde::{Deserialize, Serialize};

use super::driver::License;
use super::vehicle::{EngineType, MachineryType};

/// Route lifecycle: `PLANNED -> IN_PROGRESS -> COMPLETED`, with
/// cancellation allowed from either open state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl RouteStatus {
    pub fn can_transition_to(self, next: RouteStatus) -> bool {
        matches!(
            (self, next),
            (RouteStatus::Planned, RouteStatus::InProgress)
                | (RouteStatus::Planned, RouteStatus::Cancelled)
                | (RouteStatus::InProgress, RouteStatus::Completed)
                | (RouteStatus::InProgress, RouteStatus::Cancelled)
        )
    }

    /// Only planned routes may be edited.
    pub fn is_editable(self) -> bool {
        self == RouteStatus::Planned
    }

    pub fn is_deletable(self) -> bool {
        matches!(self, RouteStatus::Planned | RouteStatus::Cancelled)
    }

    pub fn label(self) -> &'static str {
        match self {
            RouteStatus::Planned => "Planned",
            RouteStatus::InProgress => "In Progress",
            RouteStatus::Completed => "Completed",
            RouteStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Operational,
    UnderMaintenance,
    OutOfService,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDriver {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub license: Option<License>,
    #[serde(default)]
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteVehicle {
    pub id: u64,
    pub plate: String,
    #[serde(default)]
    pub engine_type: Option<EngineType>,
    #[serde(default)]
    pub machinery_type: Option<MachineryType>,
    #[serde(default)]
    pub tank_capacity: Option<f64>,
    #[serde(default)]
    pub engine_displacement: Option<f64>,
    #[serde(default)]
    pub average_consumption: Option<f64>,
    #[serde(default)]
    pub mileage: Option<f64>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub status: Option<VehicleStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: u64,
    pub code: String,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub machinery_type: MachineryType,
    pub estimated_fuel_l: f64,
    #[serde(default)]
    pub actual_fuel_l: Option<f64>,
    pub status: RouteStatus,
    pub scheduled_at: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub driver: RouteDriver,
    pub vehicle: RouteVehicle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePage {
    pub routes: Vec<Route>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

/// Payload for creating a route. Distance and estimated fuel are sent
/// rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoute {
    pub origin: String,
    pub destination: String,
    #[serde(serialize_with = "super::serialize_rounded")]
    pub distance_km: f64,
    pub machinery_type: MachineryType,
    pub driver_id: String,
    pub vehicle_id: u64,
    /// ISO timestamp; omitted to let the server schedule it now.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(serialize_with = "super::serialize_rounded")]
    pub estimated_fuel_l: f64,
}

/// Partial route update; status changes go through `routes::start`,
/// `routes::complete` and `routes::cancel`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machinery_type: Option<MachineryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_fuel_l: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RouteStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_fuel_l: Option<f64>,
}
