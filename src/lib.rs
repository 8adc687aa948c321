//! Catalog service: categories, products and variants behind a cache-aside layer.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
