//! Initial pool price in Uniswap V3 `sqrtPriceX96` form.
//!
//! `sqrtPriceX96 = sqrt(child_fdv / spirit_fdv) * 2^96`, computed entirely in
//! integers: the ratio is lifted by 10^18 before the root and the extra
//! factor is divided back out afterwards.
//!
//! The lift bounds the resolution. A `child_fdv / spirit_fdv` ratio below
//! 10^-18 truncates to a zero scaled ratio, so very large spirit FDVs price
//! every child at 0 and monotonicity is only non-strict there.

use crate::domain::amount::amount_to_f64;
use crate::domain::{Amount, SqrtPriceResult};
use crate::error::ErrorKind;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

/// 2^96.
pub const Q96: Amount = Amount::from_limbs([0, 1 << 32, 0, 0]);

/// 10^18.
pub const SCALE: Amount = Amount::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Fixed circulating supply used to turn a unit price into an FDV.
pub const SPIRIT_SUPPLY: u64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("spirit FDV must be positive")]
    DivisionByZero,
    #[error("sqrt price overflows uint256 while computing {0}")]
    Overflow(&'static str),
    #[error("spirit USD price must be positive: {0}")]
    InvalidUsdPrice(Decimal),
}

impl PriceError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

/// Floor of the square root of `n`, by Newton's iteration.
///
/// Starts from `ceil(n / 2)` and stops as soon as the estimate stops
/// decreasing, which is exactly `floor(sqrt(n))`.
pub fn isqrt(n: Amount) -> Amount {
    if n.is_zero() {
        return Amount::ZERO;
    }
    let one = Amount::from(1u64);
    let two = Amount::from(2u64);
    let mut x = n;
    let mut y = n / two + (n & one);
    while y < x {
        x = y;
        y = (x + n / x) / two;
    }
    x
}

pub struct PriceEngine;

impl PriceEngine {
    pub fn calculate_sqrt_price(
        spirit_fdv: Amount,
        child_fdv: Amount,
    ) -> Result<SqrtPriceResult, PriceError> {
        if spirit_fdv.is_zero() {
            return Err(PriceError::DivisionByZero);
        }

        let scaled_ratio = child_fdv
            .checked_mul(SCALE)
            .ok_or(PriceError::Overflow("scaled ratio"))?
            / spirit_fdv;
        let sqrt_scaled = isqrt(
            scaled_ratio
                .checked_mul(SCALE)
                .ok_or(PriceError::Overflow("scaled root"))?,
        );
        // isqrt(SCALE * SCALE) == SCALE
        let sqrt_price_x96 = sqrt_scaled
            .checked_mul(Q96)
            .ok_or(PriceError::Overflow("sqrtPriceX96"))?
            / SCALE;

        let result = SqrtPriceResult {
            sqrt_price_x96,
            price_ratio: amount_to_f64(child_fdv) / amount_to_f64(spirit_fdv),
            spirit_fdv,
            child_fdv,
        };
        debug!(
            spirit_fdv = %spirit_fdv,
            child_fdv = %child_fdv,
            sqrt_price_x96 = %sqrt_price_x96,
            "calculated sqrt price"
        );
        Ok(result)
    }

    /// Price a child token against spirit quoted in USD per token.
    ///
    /// The spirit FDV is `floor(price * 1_000_000_000)`.
    pub fn calculate_sqrt_price_from_usd(
        spirit_price_usd: Decimal,
        child_fdv: Amount,
    ) -> Result<SqrtPriceResult, PriceError> {
        let spirit_fdv = spirit_fdv_from_usd(spirit_price_usd)?;
        Self::calculate_sqrt_price(spirit_fdv, child_fdv)
    }

    /// Whether `sqrt_price_x96` lies within a factor of ten of parity.
    pub fn validate_sqrt_price(sqrt_price_x96: Amount) -> bool {
        let ten = Amount::from(10u64);
        let within = sqrt_price_x96 >= Q96 / ten && sqrt_price_x96 <= Q96 * ten;
        if !within {
            warn!(sqrt_price_x96 = %sqrt_price_x96, "sqrt price outside precision bounds");
        }
        within
    }

    /// `(sqrt_price_x96 / 2^96)^2` as a float.
    pub fn decode_price(sqrt_price_x96: Amount) -> f64 {
        let root = amount_to_f64(sqrt_price_x96) / amount_to_f64(Q96);
        root * root
    }
}

pub fn spirit_fdv_from_usd(spirit_price_usd: Decimal) -> Result<Amount, PriceError> {
    if spirit_price_usd <= Decimal::ZERO {
        return Err(PriceError::InvalidUsdPrice(spirit_price_usd));
    }
    let fdv = spirit_price_usd
        .checked_mul(Decimal::from(SPIRIT_SUPPLY))
        .ok_or(PriceError::Overflow("spirit FDV"))?
        .trunc()
        .to_u128()
        .ok_or(PriceError::Overflow("spirit FDV"))?;
    if fdv == 0 {
        return Err(PriceError::DivisionByZero);
    }
    Ok(Amount::from(fdv))
}
