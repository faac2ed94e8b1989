use serde::{Deserialize, Serialize};

/// The device a user account is bound to.
///
/// Written whole on registration and never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device_id: String,   // stable per installation
    pub device_name: String, // "Unknown Device" when the platform can't tell
    pub platform: String,
    pub os_version: String,
    pub app_version: String,
    pub registered_ts: i64,
}
