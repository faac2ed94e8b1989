pub mod device;
pub mod trust;

pub use device::DeviceRecord;
pub use trust::{TrustLevel, TrustScore, TrustScoreError};
