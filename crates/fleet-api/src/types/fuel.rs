use std::fmt;

use serde::{Deserialize, Serialize};

use super::round2;
use super::vehicle::MachineryType;

/// Deviation (absolute percent) below which a record is normal.
pub const WARNING_THRESHOLD_PERCENT: f64 = 10.0;
/// Deviation (absolute percent) from which a record is flagged.
pub const ALERT_THRESHOLD_PERCENT: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FuelSource {
    Manual,
    Sensor,
    RouteCompletion,
}

/// Display classification of a record's deviation from the estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anomaly {
    Normal,
    Warning(f64),
    /// More fuel than estimated.
    Theft(f64),
    /// Less fuel than estimated.
    Leak(f64),
}

impl Anomaly {
    /// Classify a server-computed `deltaPercent`.
    pub fn classify(delta_percent: Option<f64>) -> Self {
        let Some(delta) = delta_percent.filter(|d| *d != 0.0 && d.is_finite()) else {
            return Anomaly::Normal;
        };
        let magnitude = delta.abs();
        if magnitude < WARNING_THRESHOLD_PERCENT {
            Anomaly::Normal
        } else if magnitude < ALERT_THRESHOLD_PERCENT {
            Anomaly::Warning(magnitude)
        } else if delta > 0.0 {
            Anomaly::Theft(magnitude)
        } else {
            Anomaly::Leak(magnitude)
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Anomaly::Theft(_) | Anomaly::Leak(_))
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::Normal => f.write_str("Normal"),
            Anomaly::Warning(p) => write!(f, "Warning ({p:.1}%)"),
            Anomaly::Theft(p) => write!(f, "Theft ({p:.1}%)"),
            Anomaly::Leak(p) => write!(f, "Leak ({p:.1}%)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRef {
    pub id: u64,
    pub plate: String,
    pub brand: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelRecord {
    pub id: String,
    #[serde(default)]
    pub external_id: Option<String>,
    pub driver_id: String,
    pub vehicle_id: u64,
    #[serde(default)]
    pub route_id: Option<u64>,
    pub liters: f64,
    #[serde(default)]
    pub odometer: Option<f64>,
    #[serde(default)]
    pub gps_location: Option<String>,
    pub source: FuelSource,
    #[serde(default)]
    pub estimated_fuel_l: Option<f64>,
    #[serde(default)]
    pub delta_percent: Option<f64>,
    pub recorded_at: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub driver: Option<DriverRef>,
    #[serde(default)]
    pub vehicle: Option<VehicleRef>,
    #[serde(default)]
    pub route_code: Option<String>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub machinery_type: Option<MachineryType>,
    #[serde(default)]
    pub fuel_type: Option<String>,
}

impl FuelRecord {
    pub fn anomaly(&self) -> Anomaly {
        Anomaly::classify(self.delta_percent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyRecord {
    pub record_id: String,
    pub delta_percent: f64,
    pub liters: f64,
    #[serde(default)]
    pub estimated_fuel_l: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub recorded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFuelHistory {
    pub vehicle: VehicleRef,
    pub records: Vec<FuelRecord>,
    pub anomalies_detected: u32,
    #[serde(default)]
    pub anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverFuelHistory {
    pub driver_id: String,
    pub records: Vec<FuelRecord>,
    pub anomalies_detected: u32,
    #[serde(default)]
    pub anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportVehicle {
    pub id: u64,
    pub plate: String,
    pub machinery_type: MachineryType,
    pub brand: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelReportItem {
    pub vehicle: ReportVehicle,
    pub total_liters: f64,
    pub avg_liters_per_km: f64,
    pub records_count: u32,
    pub anomalies_detected: u32,
    #[serde(default)]
    pub anomaly_records: Vec<AnomalyRecord>,
}

/// A manually entered fuel record.
#[derive(Debug, Clone, PartialEq)]
pub struct FuelEntry {
    pub driver_id: String,
    pub vehicle_id: u64,
    pub liters: f64,
    pub odometer: Option<f64>,
    pub route_id: Option<u64>,
}

/// Wire form of `FuelEntry`: ids as strings, liters rounded, fixed source.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateFuelRequest {
    driver_id: String,
    vehicle_id: String,
    liters: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    odometer: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    route_id: Option<String>,
    source: FuelSource,
}

impl From<&FuelEntry> for CreateFuelRequest {
    fn from(entry: &FuelEntry) -> Self {
        Self {
            driver_id: entry.driver_id.clone(),
            vehicle_id: entry.vehicle_id.to_string(),
            liters: round2(entry.liters),
            odometer: entry.odometer,
            route_id: entry.route_id.filter(|id| *id > 0).map(|id| id.to_string()),
            source: FuelSource::Manual,
        }
    }
}

/// Filter for the fleet fuel report. `from`/`to` are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    pub from: String,
    pub to: String,
    pub vehicle_ids: Vec<u64>,
    pub machinery_type: Option<MachineryType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn anomaly_thresholds() {
        assert_eq!(Anomaly::classify(None), Anomaly::Normal);
        assert_eq!(Anomaly::classify(Some(0.0)), Anomaly::Normal);
        assert_eq!(Anomaly::classify(Some(-9.9)), Anomaly::Normal);
        assert_eq!(Anomaly::classify(Some(10.0)), Anomaly::Warning(10.0));
        assert_eq!(Anomaly::classify(Some(-19.5)), Anomaly::Warning(19.5));
        assert_eq!(Anomaly::classify(Some(20.0)), Anomaly::Theft(20.0));
        assert_eq!(Anomaly::classify(Some(-35.0)), Anomaly::Leak(35.0));
    }

    #[test]
    fn anomaly_labels() {
        assert_eq!(Anomaly::Warning(12.34).to_string(), "Warning (12.3%)");
        assert_eq!(Anomaly::Leak(25.0).to_string(), "Leak (25.0%)");
        assert!(Anomaly::Theft(21.0).is_alert());
        assert!(!Anomaly::Warning(15.0).is_alert());
    }

    #[test]
    fn create_request_stringifies_ids_and_rounds_liters() {
        let entry = FuelEntry {
            driver_id: "d-1".into(),
            vehicle_id: 4,
            liters: 45.678,
            odometer: None,
            route_id: Some(0),
        };
        assert_eq!(
            serde_json::to_value(CreateFuelRequest::from(&entry)).unwrap(),
            json!({"driverId": "d-1", "vehicleId": "4", "liters": 45.68, "source": "manual"})
        );
    }

    #[test]
    fn decodes_route_completion_record() {
        let record: FuelRecord = serde_json::from_value(json!({
            "id": "f-1",
            "driverId": "d-1",
            "vehicleId": 4,
            "routeId": 12,
            "liters": 61.0,
            "source": "route-completion",
            "estimatedFuelL": 48.1,
            "deltaPercent": 26.8,
            "recordedAt": "2025-03-01T12:00:00Z",
            "createdAt": "2025-03-01T12:00:00Z",
            "updatedAt": "2025-03-01T12:00:00Z",
            "machineryType": 1
        }))
        .unwrap();
        assert_eq!(record.source, FuelSource::RouteCompletion);
        assert_eq!(record.machinery_type, Some(MachineryType::Heavy));
        assert_eq!(record.anomaly(), Anomaly::Theft(26.8));
    }
}
