//! Content fingerprinting and change tracking

pub mod fingerprint;
pub mod tracker;

pub use fingerprint::{calculate_fingerprint, FingerprintRecord};
pub use tracker::FingerprintTracker;
