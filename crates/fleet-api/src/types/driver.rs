use serde::{Deserialize, Serialize};

/// Driving licence class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum License {
    C,
    D,
    E,
    G,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub license: Option<License>,
    /// ISO date
    #[serde(default)]
    pub birth_date: Option<String>,
    pub is_available: bool,
    pub registration_date: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverPage {
    pub drivers: Vec<Driver>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

/// Partial driver update.
///
/// `license: Some(None)` clears the licence. Empty phone or birth date
/// strings are treated as "not provided" and omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<Option<License>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

impl DriverUpdate {
    /// Drop empty optional strings before sending.
    pub fn normalized(mut self) -> Self {
        self.phone = self.phone.filter(|p| !p.is_empty());
        self.birth_date = self.birth_date.filter(|d| !d.is_empty());
        self
    }
}
