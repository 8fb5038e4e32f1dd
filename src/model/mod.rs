pub mod vocation;
pub mod snapshot;
pub mod change;
pub mod scan;

// Re-exports for convenience
pub use vocation::Vocation;
pub use snapshot::{GroupSnapshot, Guildhall, Invite, Member};
pub use change::{Change, ChangeKind};
pub use scan::{ScanId, ScanOutcome, ScanRecord};
