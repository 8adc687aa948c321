//! Handlers organized by resource kind.

mod categories;
mod health;
mod products;
mod variants;

pub use categories::*;
pub use health::*;
pub use products::*;
pub use variants::*;
