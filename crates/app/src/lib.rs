//! Storefront domain, persistence, payments, cart store and checkout.

pub mod auth;
pub mod cart_store;
pub mod checkout;
pub mod context;
pub mod database;
pub mod domain;
pub mod payments;
pub mod pricing;

#[cfg(test)]
mod test;

pub mod uuids;
