//! Document sink implementations

pub mod json_dir;
pub mod memory;
pub mod traits;

pub use json_dir::JsonDirectorySink;
pub use memory::MemorySink;
pub use traits::DocumentSink;
