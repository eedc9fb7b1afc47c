use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Engine type. Travels as an integer code (`0=DIESEL ... 3=HYBRID`);
/// the upper-case name is accepted on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineType {
    Diesel,
    Gasoline,
    Electric,
    Hybrid,
}

impl EngineType {
    pub const ALL: [EngineType; 4] = [
        EngineType::Diesel,
        EngineType::Gasoline,
        EngineType::Electric,
        EngineType::Hybrid,
    ];

    pub fn code(self) -> u8 {
        match self {
            EngineType::Diesel => 0,
            EngineType::Gasoline => 1,
            EngineType::Electric => 2,
            EngineType::Hybrid => 3,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| u64::from(t.code()) == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            EngineType::Diesel => "DIESEL",
            EngineType::Gasoline => "GASOLINE",
            EngineType::Electric => "ELECTRIC",
            EngineType::Hybrid => "HYBRID",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for EngineType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for EngineType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CodeOrName {
            expecting: "an engine type code or name",
            from_code: EngineType::from_code,
            from_name: EngineType::from_name,
        })
    }
}

/// Machinery class. Routes and reports use `"LIGHT"`/`"HEAVY"`, the vehicle
/// resource uses `0`/`1`; both are accepted on input. Serializes as the
/// name; vehicle payloads go through `machinery_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineryType {
    Light,
    Heavy,
}

impl MachineryType {
    pub fn code(self) -> u8 {
        match self {
            MachineryType::Light => 0,
            MachineryType::Heavy => 1,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(MachineryType::Light),
            1 => Some(MachineryType::Heavy),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MachineryType::Light => "LIGHT",
            MachineryType::Heavy => "HEAVY",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [MachineryType::Light, MachineryType::Heavy]
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for MachineryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for MachineryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for MachineryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CodeOrName {
            expecting: "a machinery type code or name",
            from_code: MachineryType::from_code,
            from_name: MachineryType::from_name,
        })
    }
}

/// Integer encoding of `MachineryType` used by the vehicle resource.
pub mod machinery_code {
    use super::MachineryType;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &MachineryType, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(value.code())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MachineryType, D::Error> {
        MachineryType::deserialize(deserializer)
    }

    pub fn serialize_opt<S: Serializer>(
        value: &Option<MachineryType>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&value.code()),
            None => serializer.serialize_none(),
        }
    }
}

struct CodeOrName<T> {
    expecting: &'static str,
    from_code: fn(u64) -> Option<T>,
    from_name: fn(&str) -> Option<T>,
}

impl<'de, T> Visitor<'de> for CodeOrName<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.expecting)
    }

    fn visit_u64<E: de::Error>(self, code: u64) -> Result<T, E> {
        (self.from_code)(code).ok_or_else(|| E::custom(format!("unknown code {code}")))
    }

    fn visit_i64<E: de::Error>(self, code: i64) -> Result<T, E> {
        u64::try_from(code)
            .ok()
            .and_then(self.from_code)
            .ok_or_else(|| E::custom(format!("unknown code {code}")))
    }

    fn visit_str<E: de::Error>(self, name: &str) -> Result<T, E> {
        // Numeric strings show up when ids and codes are stringified upstream
        if let Ok(code) = name.parse::<u64>() {
            return self.visit_u64(code);
        }
        (self.from_name)(name).ok_or_else(|| E::custom(format!("unknown name {name:?}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: u64,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: u16,
    pub engine_type: EngineType,
    #[serde(with = "machinery_code")]
    pub machinery_type: MachineryType,
    pub tank_capacity: f64,
    pub engine_displacement: f64,
    pub average_consumption: f64,
    pub mileage: f64,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePage {
    pub vehicles: Vec<Vehicle>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

/// Payload for creating a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInput {
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: u16,
    pub engine_type: EngineType,
    #[serde(serialize_with = "machinery_code::serialize")]
    pub machinery_type: MachineryType,
    pub tank_capacity: f64,
    pub engine_displacement: f64,
    pub average_consumption: f64,
    pub mileage: f64,
    pub available: bool,
}

/// Partial update; only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_type: Option<EngineType>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "machinery_code::serialize_opt"
    )]
    pub machinery_type: Option<MachineryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tank_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_displacement: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_consumption: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}
