use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::platform::{BrowserEnvironment, PlatformInfo};

/// How this installation derives its device id, picked once from the
/// capabilities the platform reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceIdStrategy {
    Native(String),
    BrowserFingerprint(BrowserEnvironment),
    Random,
}

impl DeviceIdStrategy {
    pub fn detect(platform: &dyn PlatformInfo) -> Self {
        if let Some(id) = platform
            .native_installation_id()
            .filter(|id| !id.trim().is_empty())
        {
            return DeviceIdStrategy::Native(id);
        }
        if let Some(env) = platform.browser_environment() {
            return DeviceIdStrategy::BrowserFingerprint(env);
        }
        DeviceIdStrategy::Random
    }

    pub fn name(&self) -> &'static str {
        match self {
            DeviceIdStrategy::Native(_) => "native",
            DeviceIdStrategy::BrowserFingerprint(_) => "browser_fingerprint",
            DeviceIdStrategy::Random => "random",
        }
    }

    pub fn derive(&self) -> String {
        match self {
            DeviceIdStrategy::Native(id) => id.clone(),
            DeviceIdStrategy::BrowserFingerprint(env) => fingerprint(env),
            DeviceIdStrategy::Random => random_device_id(),
        }
    }
}

/// Stable for a given screen geometry and user agent.
pub fn fingerprint(env: &BrowserEnvironment) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}x{}|{}",
        env.screen_width, env.screen_height, env.user_agent
    ));
    let digest = hasher.finalize();
    format!("web-{}", hex::encode(&digest[..16]))
}

pub fn random_device_id() -> String {
    format!("device-{}", Uuid::new_v4().simple())
}
