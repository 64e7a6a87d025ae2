//! # Fetcher
//!
//! Retrieval of the base settings document and the external information feeds
//! (quota, capabilities, ASR and MAUS language lists).
//!
//! Every feed is fetched through [`retry`], which wraps transport *and* parsing:
//! a malformed body counts as a failed attempt exactly like a network error.
//! Whatever the wire format (JSON, XML, HTML), callers only ever receive the
//! normalized types from `portal_domain` or a [`FetchError`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use portal_fetcher::{HttpTransport, RetryPolicy, feeds};
//!
//! let transport = HttpTransport::new(&config.fetch)?;
//! let settings = feeds::fetch_base_settings(&transport, RetryPolicy::STANDARD, "settings.json").await?;
//! ```

mod error;
pub mod feeds;
pub mod normalize;
pub mod parse;
mod retry;
mod transport;

pub use crate::error::FetchError;
pub use crate::retry::{RetryPolicy, retry};
pub use crate::transport::{HttpTransport, Transport};
