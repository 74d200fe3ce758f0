//! Fingerprint store implementations

pub mod json_file;
pub mod memory;
pub mod traits;

pub use json_file::JsonFileFingerprintStore;
pub use memory::MemoryFingerprintStore;
pub use traits::FingerprintStore;
