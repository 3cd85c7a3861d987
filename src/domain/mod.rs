pub mod listing;
pub mod session_state;

pub use listing::{JobListing, ListingDetail, PartialListing, Source};
pub use session_state::SessionState;
