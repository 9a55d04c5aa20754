use crate::domain::holder::total_held;
use crate::domain::{Address, Amount, BlockNumber, Holder, TransferEvent};
use crate::error::ErrorKind;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("total supply must be positive")]
    DivisionByZero,
    #[error("final balance of {address} is negative: short by {shortfall}")]
    NegativeBalance { address: Address, shortfall: Amount },
    #[error("running balance of {address} leaves the uint256 range at block {block_number}")]
    BalanceOverflow {
        address: Address,
        block_number: BlockNumber,
    },
    #[error("holders hold {held} which exceeds total supply {total_supply}")]
    SupplyExceeded { held: Amount, total_supply: Amount },
    #[error("share of supply for {0} cannot be computed in 256 bits")]
    ShareOverflow(Address),
}

impl AggregationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AggregationError::DivisionByZero | AggregationError::ShareOverflow(_) => {
                ErrorKind::InvalidInput
            }
            AggregationError::NegativeBalance { .. }
            | AggregationError::BalanceOverflow { .. }
            | AggregationError::SupplyExceeded { .. } => ErrorKind::ArithmeticInconsistency,
        }
    }
}

/// Signed running balance as a sign and a uint256 magnitude.
///
/// At most one side is non-zero.
#[derive(Debug, Clone, Copy, Default)]
struct RunningBalance {
    credit: Amount,
    debit: Amount,
}

impl RunningBalance {
    fn add(&mut self, value: Amount) -> Option<()> {
        if self.debit >= value {
            self.debit -= value;
        } else {
            let rest = value - self.debit;
            self.debit = Amount::ZERO;
            self.credit = self.credit.checked_add(rest)?;
        }
        Some(())
    }

    fn sub(&mut self, value: Amount) -> Option<()> {
        if self.credit >= value {
            self.credit -= value;
        } else {
            let rest = value - self.credit;
            self.credit = Amount::ZERO;
            self.debit = self.debit.checked_add(rest)?;
        }
        Some(())
    }
}

/// Replays a transfer log into signed running balances.
///
/// Events must be fed in chain order. The zero address is never tracked:
/// transfers from it are mints, transfers to it are burns. A balance may dip
/// below zero mid-stream (a debit logged before its funding credit); only a
/// negative final balance is an inconsistency.
pub struct LedgerAggregator {
    total_supply: Amount,
    balances: HashMap<Address, RunningBalance>,
}

impl LedgerAggregator {
    /// Fails with `DivisionByZero` when `total_supply` is zero.
    pub fn new(total_supply: Amount) -> Result<Self, AggregationError> {
        if total_supply.is_zero() {
            return Err(AggregationError::DivisionByZero);
        }
        Ok(Self {
            total_supply,
            balances: HashMap::new(),
        })
    }

    /// Replay `events` and return the final holder table.
    ///
    /// Either every balance settles non-negative and the full table is
    /// returned, or the inconsistency is reported and nothing is emitted.
    pub fn aggregate(
        events: &[TransferEvent],
        total_supply: Amount,
    ) -> Result<Vec<Holder>, AggregationError> {
        let mut aggregator = Self::new(total_supply)?;
        for event in events {
            aggregator.apply(event)?;
        }
        aggregator.into_holders()
    }

    /// Apply a single transfer.
    pub fn apply(&mut self, event: &TransferEvent) -> Result<(), AggregationError> {
        if !event.from.is_zero() {
            self.balances
                .entry(event.from)
                .or_default()
                .sub(event.value)
                .ok_or(AggregationError::BalanceOverflow {
                    address: event.from,
                    block_number: event.block_number,
                })?;
        }
        if !event.to.is_zero() {
            self.balances
                .entry(event.to)
                .or_default()
                .add(event.value)
                .ok_or(AggregationError::BalanceOverflow {
                    address: event.to,
                    block_number: event.block_number,
                })?;
        }
        Ok(())
    }

    /// Emit holders with a positive balance, ordered by balance descending
    /// then address ascending.
    pub fn into_holders(self) -> Result<Vec<Holder>, AggregationError> {
        // Lowest address first so the reported offender is stable.
        if let Some((address, balance)) = self
            .balances
            .iter()
            .filter(|(_, balance)| !balance.debit.is_zero())
            .min_by_key(|(address, _)| **address)
        {
            return Err(AggregationError::NegativeBalance {
                address: *address,
                shortfall: balance.debit,
            });
        }

        let mut positive: Vec<(Address, Amount)> = self
            .balances
            .into_iter()
            .map(|(address, balance)| (address, balance.credit))
            .filter(|(_, balance)| !balance.is_zero())
            .collect();
        positive.sort_by(|(addr_a, bal_a), (addr_b, bal_b)| {
            bal_b.cmp(bal_a).then_with(|| addr_a.cmp(addr_b))
        });

        let holders = positive
            .into_iter()
            .map(|(address, balance)| {
                let bps = basis_points(balance, self.total_supply)
                    .ok_or(AggregationError::ShareOverflow(address))?;
                Ok(Holder::new(address, balance, bps))
            })
            .collect::<Result<Vec<_>, AggregationError>>()?;

        // Each balance is bounded, but the sum can still exceed supply when
        // the log is inconsistent with the supply figure.
        let held = total_held(&holders).ok_or(AggregationError::SupplyExceeded {
            held: Amount::MAX,
            total_supply: self.total_supply,
        })?;
        if held > self.total_supply {
            return Err(AggregationError::SupplyExceeded {
                held,
                total_supply: self.total_supply,
            });
        }

        Ok(holders)
    }
}

/// `floor(balance * 10000 / total_supply)`; `None` if the product overflows
/// or the share does not fit in u64.
fn basis_points(balance: Amount, total_supply: Amount) -> Option<u64> {
    let scaled = balance.checked_mul(Amount::from(10_000u64))?;
    u64::try_from(scaled / total_supply).ok()
}
