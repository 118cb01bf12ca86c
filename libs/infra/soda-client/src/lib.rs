
pub mod client;
pub mod errors;
pub mod limiter;
pub mod query;

pub use client::{PagedFetch, SodaClient, SODA_PAGE_SIZE};
pub use errors::SodaError;
pub use limiter::PortalRateLimiter;
pub use query::FetchQuery;
