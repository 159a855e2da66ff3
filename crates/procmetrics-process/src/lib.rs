//! Standard process metrics backed by Linux `/proc`.
//!
//! Data sources read through the [`fs::FileSystem`] seam so every parser and
//! the capability probe can be exercised against an in-memory tree.

pub mod fs;
pub mod probe;
pub mod source;
pub mod standard;
pub mod status;

pub use fs::{FileSystem, MemoryFs, RealFs};
pub use probe::PlatformCapabilities;
pub use source::ProcessSource;
pub use standard::StandardMetrics;
pub use status::{ProcStatusReader, StatusParser, StatusSource};
