//! Storage backends.

pub mod redis_repo;

pub use redis_repo::RedisRepository;
