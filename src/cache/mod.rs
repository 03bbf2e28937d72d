//! Cache
//!
//! Cache Redis opcional para resultados de geocodificación inversa.

pub mod cache_config;
pub mod redis_client;

pub use cache_config::{CacheConfig, CacheOperations};
pub use redis_client::RedisClient;
