//! Kernel utilities shared across slices.
//! Keep this crate lightweight; it only hosts configuration loading for now.
//!
//! ## Config loading
//! ```rust,ignore
//! use portal_kernel::config::load_portal_config;
//! let cfg = load_portal_config(Some("portal.toml")).unwrap();
//! ```
pub mod config;

pub use portal_domain as domain;
