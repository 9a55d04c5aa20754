//! Pool price parameters.

use super::primitives::Amount;
use serde::{Deserialize, Serialize};

/// Q64.96 square-root price derived from two valuations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqrtPriceResult {
    /// Value submitted on-chain.
    #[serde(rename = "sqrtPriceX96", with = "crate::domain::amount")]
    pub sqrt_price_x96: Amount,
    /// `child_fdv / spirit_fdv` as a float. Informational only.
    pub price_ratio: f64,
    #[serde(with = "crate::domain::amount")]
    pub spirit_fdv: Amount,
    #[serde(with = "crate::domain::amount")]
    pub child_fdv: Amount,
}
