//! URL handling for Kumo-Crawl
//!
//! Every identifier that enters the admission gate goes through
//! [`normalize_url`] first, so that trivially-different spellings of the same
//! URL cannot be admitted twice.

mod normalize;

pub use normalize::normalize_url;
