//! Paginated user feed.
//!
//! This crate turns a paginated list endpoint into one logical, growing list:
//!
//! - [`Fetcher`] retrieves a single page (`HttpFetcher` with the `http` feature).
//! - [`PageCache`] deduplicates page requests and merges resolved pages in index order.
//! - [`Pagination`] decides when the list grows, one page at a time.
//! - [`Feed`] ties both to a [`userdir_window::Window`] and is the state a view subscribes to.
//! - [`Driver`] executes the requests a feed hands out on the tokio runtime.
//!
//! The state types are sans-IO: they return [`PageRequest`]s instead of performing them, so they
//! can be driven by any executor and tested without a network.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod cache;
mod driver;
mod error;
mod feed;
mod fetch;
mod model;
mod pagination;

#[cfg(test)]
mod tests;

pub use cache::{Completion, FetchState, PageCache, PageRequest};
pub use driver::{Driver, Outcome};
pub use error::FetchError;
pub use feed::{Feed, FeedChangeCallback, FeedOptions, Phase};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::{Fetcher, page_skip, page_url};
pub use model::{Company, Page, PageEnvelope, UserRecord};
pub use pagination::{Pagination, PaginationState, Progress};

pub use userdir_window;
