//! Checkout
//!
//! Moves an authenticated cart through address validation, payment intent
//! creation, payment confirmation, order persistence and cart clearing.

mod cancellation;
mod errors;
mod locks;
mod models;
mod service;

pub use cancellation::*;
pub use errors::*;
pub use locks::*;
pub use models::*;
pub use service::*;
