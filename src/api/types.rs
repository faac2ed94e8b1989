use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DeviceUserRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeviceIdResponse {
    pub device_id: String,
}
