use std::collections::BTreeMap;
use std::net::IpAddr;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

/// A registered device as returned by the listing endpoints.
/// The external address it registered from is never part of this view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Self-reported internal address, a bare IP literal
    pub address: IpAddr,

    /// Stable device identity, e.g. a serial number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Free-text label
    pub name: String,

    /// Optional key-value labels, emitted in key order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    /// Time of the most recent registration
    pub added: DateTime<Utc>,
}

/// Payload accepted by the registration endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Absent and null both mean an empty name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Unvalidated; the daemon trims and parses it
    #[serde(default)]
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}
