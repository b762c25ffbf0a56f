//! CLI command implementations.

pub mod scan;
pub mod watch;

pub use scan::ScanCommand;
pub use watch::WatchCommand;
