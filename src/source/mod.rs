pub mod tibiadata;

use crate::error::WatchResult;
use crate::model::GroupSnapshot;

pub use tibiadata::TibiaDataClient;

/// Produces the current snapshot of a guild.
///
/// A guild that does not exist is `Err(WatchError::NotFound)`; a transport
/// problem is `Err(WatchError::Network)`. An empty roster is a valid snapshot.
pub trait GroupSource {
    fn fetch_group(&self, name: &str) -> WatchResult<GroupSnapshot>;
}
