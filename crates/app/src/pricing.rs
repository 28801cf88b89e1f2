//! Pricing
//!
//! Line and cart totals are always derived from product records read at
//! computation time; cart rows never carry a price of their own.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

use crate::domain::products::records::{ProductRecord, ProductUuid};

/// A single priced cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    /// Live `sell_price` in minor units.
    pub unit_price: u64,
    pub line_total: u64,
}

/// Priced lines and their grand total, in minor units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartTotals {
    pub lines: Vec<PricedLine>,
    pub total: u64,
}

impl CartTotals {
    #[must_use]
    pub fn line(&self, product: ProductUuid) -> Option<&PricedLine> {
        self.lines.iter().find(|line| line.product_uuid == product)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("total for product {0} overflows")]
    Overflow(ProductUuid),

    #[error("unknown currency code {0:?}")]
    UnknownCurrency(String),

    #[error("amount is negative or not representable in minor units")]
    InvalidAmount,
}

/// Price `(product, quantity)` pairs at each product's current `sell_price`.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if any line or the total exceeds `u64`.
pub fn price_lines<'a, I>(lines: I) -> Result<CartTotals, PricingError>
where
    I: IntoIterator<Item = (&'a ProductRecord, u32)>,
{
    let mut totals = CartTotals::default();

    for (product, quantity) in lines {
        let line_total = product
            .sell_price
            .checked_mul(u64::from(quantity))
            .ok_or(PricingError::Overflow(product.uuid))?;

        totals.total = totals
            .total
            .checked_add(line_total)
            .ok_or(PricingError::Overflow(product.uuid))?;

        totals.lines.push(PricedLine {
            product_uuid: product.uuid,
            quantity,
            unit_price: product.sell_price,
            line_total,
        });
    }

    Ok(totals)
}

/// Resolve an ISO 4217 code such as `usd` or `GBP`.
///
/// # Errors
///
/// Returns [`PricingError::UnknownCurrency`] for codes rusty-money does not know.
pub fn resolve_currency(code: &str) -> Result<&'static Currency, PricingError> {
    iso::find(&code.to_ascii_uppercase()).ok_or_else(|| PricingError::UnknownCurrency(code.to_string()))
}

/// Convert a major-unit amount (e.g. `19.99`) to minor units (`1999`), rounding
/// half away from zero at the currency's exponent.
///
/// # Errors
///
/// Returns [`PricingError::InvalidAmount`] for negative or oversized amounts.
pub fn to_minor_units(amount: Decimal, currency: &Currency) -> Result<u64, PricingError> {
    let scale = 10_u64
        .checked_pow(currency.exponent)
        .ok_or(PricingError::InvalidAmount)?;

    amount
        .round_dp_with_strategy(currency.exponent, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::from(scale))
        .and_then(|minor| minor.to_u64())
        .ok_or(PricingError::InvalidAmount)
}

/// Convert minor units back to a major-unit decimal.
#[must_use]
pub fn to_major_units(minor: u64, currency: &Currency) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(minor), currency.exponent)
}

/// Human readable amount, e.g. `$50.00`.
#[must_use]
pub fn format_amount(minor: u64, currency: &Currency) -> String {
    match i64::try_from(minor) {
        Ok(minor) => Money::from_minor(minor, currency).to_string(),
        Err(_overflow) => format!("{} {}", to_major_units(minor, currency), currency.iso_alpha_code),
    }
}
