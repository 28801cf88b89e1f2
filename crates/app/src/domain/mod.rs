//! Storefront Domain Concerns

pub mod addresses;
pub mod carts;
pub mod orders;
pub mod products;
pub mod users;
