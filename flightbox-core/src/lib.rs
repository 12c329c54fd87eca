#![warn(missing_docs)]
//! # flightbox-core
//!
//! Core types shared by the flightbox crates.
//!
//! This crate holds the plain data that the cache and the API client pass
//! around:
//!
//! - [`CacheKey`] - string key built from a prefix and the identity of a
//!   logical request
//! - [`CacheValue`] - cached data with an optional absolute expiration time
//!
//! The storage and coalescing logic lives in the `flightbox` crate.

pub mod key;
pub mod value;

pub use key::CacheKey;
pub use value::CacheValue;

#[doc(hidden)]
pub use smol_str::SmolStr;
