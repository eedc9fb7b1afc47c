//! Wire models for the fleet API resources

pub mod driver;
pub mod fuel;
pub mod route;
pub mod user;
pub mod vehicle;

use serde::Serializer;

pub use driver::{Driver, DriverPage, DriverUpdate, License};
pub use fuel::{
    Anomaly, AnomalyRecord, DriverFuelHistory, FuelEntry, FuelRecord, FuelReportItem, FuelSource,
    ReportFilter, VehicleFuelHistory,
};
pub use route::{NewRoute, Route, RoutePage, RouteStatus, RouteUpdate};
pub use user::{NewUser, User, UserUpdate, role_code, role_from_code};
pub use vehicle::{EngineType, MachineryType, Vehicle, VehicleInput, VehiclePage, VehicleUpdate};

/// Round to two decimals, the precision the backend stores quantities at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}
