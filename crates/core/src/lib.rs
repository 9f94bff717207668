//! Functional core for cachebound.
//!
//! Everything in this crate is pure data and pure functions: the entity
//! model, cache key/expiration/serialization policy, in-memory query
//! selection, and the trait contracts that the `cachebound` crate
//! implements against real caches and stores.

pub mod cache;
pub mod entity;
pub mod identity;
pub mod query;
pub mod storage;
