pub mod sqlite;

use crate::app::Result;
use crate::domain::{JobListing, Source};

pub use sqlite::SqliteStore;

pub trait Store {
    /// Create the `jobs` table if it does not exist yet.
    fn ensure_schema(&self) -> Result<()>;

    /// Insert-or-replace every listing in one transaction, keyed by URL.
    ///
    /// Either the whole batch is written or none of it is.
    fn upsert_batch(&self, listings: &[JobListing]) -> Result<usize>;

    fn get_by_url(&self, url: &str) -> Result<Option<JobListing>>;
    fn all_listings(&self) -> Result<Vec<JobListing>>;
    fn count(&self) -> Result<i64>;
    fn count_by_source(&self) -> Result<Vec<(Source, i64)>>;
}
