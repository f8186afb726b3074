//! # Generation Cache
//!
//! [`TtlCache`] avoids repeating expensive generation calls for equivalent requests.
//! Keys come from [`generation_cache_key`].

pub mod key;
pub mod ttl_cache;

pub use key::{generation_cache_key, normalize};
pub use ttl_cache::{CacheEntry, CacheStats, TtlCache};
