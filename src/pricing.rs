use rust_decimal::Decimal;

/// Discount tiers a customer profile may carry, in percent.
pub const DISCOUNT_TIERS: [u32; 5] = [0, 5, 10, 15, 20];

pub fn is_valid_discount(discount: u32) -> bool {
    DISCOUNT_TIERS.contains(&discount)
}

/// Applies a percentage discount to a service price, in exact decimal
/// arithmetic, rounded to 2 decimal places. Every booking write derives
/// `total_price` through this function from the referenced service's current
/// price and the customer's current discount tier.
pub fn discounted_price(price: Decimal, discount_percent: u32) -> Decimal {
    let discount_amount = price * Decimal::from(discount_percent) / Decimal::from(100u32);
    (price - discount_amount).round_dp(2)
}
