//! Pure parsers from raw response bodies to normalized domain values.
//!
//! Each parser is `&str -> Result<_, FetchError>`; a shape mismatch is a
//! [`FetchError::Parse`](crate::FetchError::Parse) and counts as a failed attempt.

pub mod capabilities;
pub mod languages;
pub mod quota;
pub mod settings;

pub use capabilities::parse_capabilities;
pub use languages::parse_languages;
pub use quota::parse_quota;
pub use settings::parse_base_settings;
