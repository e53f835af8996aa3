//! finblog: content backend for a finance blog.
//!
//! Posts and categories live in Postgres. Public reads go through in-process
//! TTL caches that writes invalidate before they return.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
