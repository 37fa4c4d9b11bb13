//! Price arithmetic.
//!
//! Prices are whole currency units (KRW has no minor unit) stored as `INTEGER`.
//! Discounted prices and order totals are computed in `i64` so that
//! `price * discount` and `unit * quantity` cannot overflow for any stored row.

/// Errors from order total arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    /// The total does not fit in an `i64`.
    #[error("order total overflows")]
    Overflow,
}

/// Discounted unit price: `price - price * discount_percent / 100`.
///
/// Division truncates toward zero, so a 10% discount on 999 yields
/// `999 - 99 = 900`.
///
/// ```
/// use modish_core::real_price;
///
/// assert_eq!(real_price(10_000, 15), 8_500);
/// assert_eq!(real_price(999, 10), 900);
/// ```
#[must_use]
pub fn real_price(price: i32, discount_percent: i32) -> i64 {
    let price = i64::from(price);
    price - price * i64::from(discount_percent) / 100
}

/// Total for one cart line: `real_price * quantity`.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the product does not fit in an `i64`.
pub fn line_total(price: i32, discount_percent: i32, quantity: i32) -> Result<i64, PriceError> {
    real_price(price, discount_percent)
        .checked_mul(i64::from(quantity))
        .ok_or(PriceError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_price_no_discount() {
        assert_eq!(real_price(25_000, 0), 25_000);
    }

    #[test]
    fn test_real_price_full_discount() {
        assert_eq!(real_price(25_000, 100), 0);
    }

    #[test]
    fn test_real_price_truncates_toward_zero() {
        // 333 * 33 / 100 = 109.89 -> 109
        assert_eq!(real_price(333, 33), 224);
        assert_eq!(real_price(1, 50), 1);
    }

    #[test]
    fn test_real_price_large_values_do_not_overflow() {
        assert_eq!(
            real_price(i32::MAX, 50),
            i64::from(i32::MAX) - i64::from(i32::MAX) * 50 / 100
        );
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(10_000, 10, 3), Ok(27_000));
        assert_eq!(line_total(10_000, 10, 0), Ok(0));
    }
}
