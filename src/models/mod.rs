//! Core data structures shared across the client.
//!
//! - [`SearchQuery`] and [`ResultPage`]: one paginated result set and its pages
//! - [`Record`]: a decoded bibliographic record
//! - [`ArtifactLocation`]: where to download the binary artifact of a record

mod record;
mod search;

pub use record::{ArtifactLocation, PropertyEntry, Record, RecordFields};
pub use search::{DatabaseScope, FilterField, OrderField, ResultPage, SearchQuery};
