//! Money arithmetic on top of `rust_decimal`.
//!
//! The remote API quotes every amount in a single store currency, so prices are
//! carried as bare [`Decimal`] values. Display formatting lives here so every
//! surface renders amounts the same way.

use rust_decimal::Decimal;

/// Multiply a unit price by a quantity.
///
/// Saturates at [`Decimal::MAX`] instead of panicking on amounts that do not
/// fit.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    unit_price.saturating_mul(Decimal::from(quantity))
}

/// Add two amounts, saturating at the representable bounds.
#[must_use]
pub fn add_amounts(a: Decimal, b: Decimal) -> Decimal {
    a.saturating_add(b)
}

/// Format an amount for display (e.g., `$19.99`).
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}
