//! Catalog services: cache-aside reads and invalidating writes over the
//! repository traits.

pub mod catalog;
pub mod categories;
pub mod error;
pub mod products;
pub mod repos;
pub mod retry;
pub mod variants;
