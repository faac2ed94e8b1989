//! Single-device-per-account binding.
//!
//! Each user id maps to at most one [`DeviceRecord`]. The policy is a
//! sharing deterrent rather than access control: every storage problem
//! resolves to the permissive answer and nothing here returns an error to
//! the caller.

pub mod identity;
pub mod platform;

use std::{collections::HashMap, sync::Arc};

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    model::DeviceRecord,
    storage::{KeyValueStore, StorageResult},
};
use identity::{random_device_id, DeviceIdStrategy};
use platform::PlatformInfo;

pub const DEVICE_ID_KEY: &str = "device_id";
/// Older layout: the whole user → device map serialized under one key.
pub const LEGACY_MAPPING_KEY: &str = "user_devices";

const UNKNOWN_DEVICE: &str = "Unknown Device";
const UNKNOWN: &str = "unknown";

fn binding_key(user_id: &str) -> String {
    format!("user_device:{user_id}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceCheck {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_device: Option<DeviceRecord>,
}

impl DeviceCheck {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            existing_device: None,
        }
    }

    fn blocked(existing: DeviceRecord) -> Self {
        Self {
            allowed: false,
            reason: Some(format!(
                "This account is already registered on another device ({}). \
                 Only one device per account is allowed.",
                existing.device_name
            )),
            existing_device: Some(existing),
        }
    }
}

pub struct DeviceBindingPolicy {
    identity_store: Arc<dyn KeyValueStore>,
    binding_store: Arc<dyn KeyValueStore>,
    platform: Arc<dyn PlatformInfo>,
    strategy: OnceCell<DeviceIdStrategy>,
    /// Set once the legacy blob has been folded into per-user keys. Every
    /// mutation waits on it, so no write can interleave with the migration.
    legacy_migrated: tokio::sync::OnceCell<()>,
}

impl DeviceBindingPolicy {
    /// Keeps the device id and the bindings in the same store.
    pub fn new(store: Arc<dyn KeyValueStore>, platform: Arc<dyn PlatformInfo>) -> Self {
        Self {
            identity_store: store.clone(),
            binding_store: store,
            platform,
            strategy: OnceCell::new(),
            legacy_migrated: tokio::sync::OnceCell::new(),
        }
    }

    /// Reads and writes bindings in `store` instead of the identity store.
    pub fn with_binding_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.binding_store = store;
        self
    }

    fn strategy(&self) -> &DeviceIdStrategy {
        self.strategy.get_or_init(|| {
            let strategy = DeviceIdStrategy::detect(self.platform.as_ref());
            debug!(strategy = strategy.name(), "device id strategy selected");
            strategy
        })
    }

    // ============================================================
    // DEVICE IDENTITY
    // ============================================================

    /// Stable id of this installation. Falls back to an unpersisted random
    /// id when storage fails.
    pub async fn get_device_id(&self) -> String {
        match self.try_device_id().await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "device id storage failed, using a temporary id");
                random_device_id()
            }
        }
    }

    async fn try_device_id(&self) -> StorageResult<String> {
        if let Some(id) = self
            .identity_store
            .get(DEVICE_ID_KEY)
            .await?
            .filter(|id| !id.is_empty())
        {
            return Ok(id);
        }

        let id = self.strategy().derive();
        self.identity_store.set(DEVICE_ID_KEY, &id).await?;
        Ok(id)
    }

    /// The record `register_user_device` would write for this installation.
    pub async fn current_device(&self) -> DeviceRecord {
        let device_id = self.get_device_id().await;
        self.build_record(device_id)
    }

    fn build_record(&self, device_id: String) -> DeviceRecord {
        DeviceRecord {
            device_id,
            device_name: self
                .platform
                .device_name()
                .unwrap_or_else(|| UNKNOWN_DEVICE.to_string()),
            platform: self.platform.os_name(),
            os_version: self
                .platform
                .os_version()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            app_version: self
                .platform
                .app_version()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            registered_ts: chrono::Utc::now().timestamp(),
        }
    }

    // ============================================================
    // BINDINGS
    // ============================================================

    async fn load_binding(&self, user_id: &str) -> StorageResult<Option<DeviceRecord>> {
        if let Some(raw) = self.binding_store.get(&binding_key(user_id)).await? {
            return Ok(Some(serde_json::from_str(&raw)?));
        }

        match self.binding_store.get(LEGACY_MAPPING_KEY).await? {
            Some(raw) => {
                let mut legacy: HashMap<String, DeviceRecord> = serde_json::from_str(&raw)?;
                Ok(legacy.remove(user_id))
            }
            None => Ok(None),
        }
    }

    /// Folds the legacy blob into per-user keys. Runs at most once per policy;
    /// concurrent callers wait for the first run, and a failed run is retried
    /// by the next caller. Returns whether the migration has completed.
    pub async fn ensure_legacy_migrated(&self) -> bool {
        match self.migrated().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "legacy device mapping migration failed");
                false
            }
        }
    }

    async fn migrated(&self) -> StorageResult<()> {
        self.legacy_migrated
            .get_or_try_init(|| self.migrate_legacy())
            .await?;
        Ok(())
    }

    /// Moves entries of the legacy blob to per-user keys, then drops the blob.
    /// Existing per-user keys are newer and win.
    async fn migrate_legacy(&self) -> StorageResult<()> {
        let Some(raw) = self.binding_store.get(LEGACY_MAPPING_KEY).await? else {
            return Ok(());
        };

        match serde_json::from_str::<HashMap<String, DeviceRecord>>(&raw) {
            Ok(legacy) => {
                for (user_id, record) in legacy {
                    let key = binding_key(&user_id);
                    if self.binding_store.get(&key).await?.is_none() {
                        let val = serde_json::to_string(&record)?;
                        self.binding_store.set(&key, &val).await?;
                    }
                }
                info!("migrated legacy device mapping to per-user keys");
            }
            Err(e) => {
                warn!(error = %e, "discarding unreadable legacy device mapping");
            }
        }

        self.binding_store.remove(LEGACY_MAPPING_KEY).await
    }

    /// Whether `user_id` may sign in from this installation.
    ///
    /// Unknown users and the already-bound device are allowed. A different
    /// bound device blocks, carrying the conflicting record. Storage failures
    /// allow.
    pub async fn check_device_restriction(&self, user_id: &str) -> DeviceCheck {
        if user_id.trim().is_empty() {
            return DeviceCheck::allowed();
        }

        match self.try_check(user_id).await {
            Ok(check) => check,
            Err(e) => {
                warn!(user_id, error = %e, "device restriction check failed, allowing");
                DeviceCheck::allowed()
            }
        }
    }

    async fn try_check(&self, user_id: &str) -> StorageResult<DeviceCheck> {
        let Some(existing) = self.load_binding(user_id).await? else {
            return Ok(DeviceCheck::allowed());
        };

        let current = self.try_device_id().await?;
        if existing.device_id == current {
            Ok(DeviceCheck::allowed())
        } else {
            Ok(DeviceCheck::blocked(existing))
        }
    }

    /// Binds `user_id` to this installation, replacing any previous binding.
    /// Does not consult `check_device_restriction`. Returns whether the
    /// binding was written; failures are logged, never raised.
    pub async fn register_user_device(&self, user_id: &str) -> bool {
        if user_id.trim().is_empty() {
            debug!("ignoring device registration without a user id");
            return false;
        }

        match self.try_register(user_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(user_id, error = %e, "device registration failed");
                false
            }
        }
    }

    async fn try_register(&self, user_id: &str) -> StorageResult<()> {
        let device_id = self.try_device_id().await?;
        let record = self.build_record(device_id);

        self.migrated().await?;

        let val = serde_json::to_string(&record)?;
        self.binding_store.set(&binding_key(user_id), &val).await?;

        info!(user_id, device_id = %record.device_id, "device registered");
        Ok(())
    }

    /// Removes whatever device `user_id` is bound to. Returns whether the
    /// removal was written.
    pub async fn unregister_user_device(&self, user_id: &str) -> bool {
        if user_id.trim().is_empty() {
            debug!("ignoring device unregistration without a user id");
            return false;
        }

        match self.try_unregister(user_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(user_id, error = %e, "device unregistration failed");
                false
            }
        }
    }

    async fn try_unregister(&self, user_id: &str) -> StorageResult<()> {
        self.migrated().await?;
        self.binding_store.remove(&binding_key(user_id)).await?;
        info!(user_id, "device unregistered");
        Ok(())
    }

    /// The device `user_id` is currently bound to, if any can be read.
    pub async fn bound_device(&self, user_id: &str) -> Option<DeviceRecord> {
        if user_id.trim().is_empty() {
            return None;
        }

        self.load_binding(user_id).await.unwrap_or_else(|e| {
            warn!(user_id, error = %e, "device binding lookup failed");
            None
        })
    }
}
