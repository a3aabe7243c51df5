//! Sensor module - signal model for simulated devices

mod walk;
mod profile;
mod payload;
mod device;

pub use walk::{clamp, round_to, BoundedRandomWalk, WalkSpec, DEFAULT_JITTER};
pub use profile::{DeviceProfile, EventPolicy, IAQ_BASELINE, DP_PRIMARY_BASELINE, DP_SECONDARY_BASELINE};
pub use payload::*;
pub use device::{DeviceSimulator, DEFAULT_FIRMWARE};
