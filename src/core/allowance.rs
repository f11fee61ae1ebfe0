//! Allowance arithmetic - The pure rules behind every ledger write.
//!
//! Nothing here touches the database. The operation modules load a client's
//! [`Balances`], run them through one of these functions and persist the result,
//! which keeps the money rules testable in isolation.

use crate::{
    entities::TransactionStatus,
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use std::{fmt, str::FromStr};

/// How a transaction larger than the available balance is handled.
///
/// Exactly one policy is in force for a ledger; they are never combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OveragePolicy {
    /// Accept every transaction. The uncovered part becomes debt and the
    /// transaction is flagged.
    Flag,
    /// Refuse overdrafts unless the caller confirms them and the uncovered part
    /// stays within the configured ceiling.
    Capped,
}

impl FromStr for OveragePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flag" => Ok(Self::Flag),
            "capped" => Ok(Self::Capped),
            other => Err(Error::Config {
                message: format!("Unknown overage policy '{other}', expected 'flag' or 'capped'"),
            }),
        }
    }
}

impl fmt::Display for OveragePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => f.write_str("flag"),
            Self::Capped => f.write_str("capped"),
        }
    }
}

/// The three numbers the ledger keeps per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balances {
    /// Budget for the current period
    pub period_allowance: Decimal,
    /// Spent so far in the current period
    pub utilized_amount: Decimal,
    /// Outstanding overdraft, never negative
    pub debt: Decimal,
}

impl Balances {
    /// Balances of a client that has not spent anything yet.
    #[must_use]
    pub const fn fresh(period_allowance: Decimal) -> Self {
        Self {
            period_allowance,
            utilized_amount: Decimal::ZERO,
            debt: Decimal::ZERO,
        }
    }

    /// `period_allowance - utilized_amount`. Negative once the client has overdrawn.
    #[must_use]
    pub fn available(&self) -> Decimal {
        self.period_allowance - self.utilized_amount
    }

    /// Part of `amount` not covered by the available balance.
    #[must_use]
    pub fn overage_for(&self, amount: Decimal) -> Decimal {
        (amount - self.available().max(Decimal::ZERO)).max(Decimal::ZERO)
    }
}

/// Outcome of [`assess_transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    /// Balances after the transaction is applied
    pub balances: Balances,
    /// Status to record on the transaction
    pub status: TransactionStatus,
    /// Uncovered part of the amount, zero when fully covered
    pub overage: Decimal,
}

/// Allowance each sponsored employee receives, rounded to cents.
///
/// A zero (or negative) employee count yields zero rather than dividing by it.
#[must_use]
pub fn allowance_per_client(total_shared_amount: Decimal, sponsored_employees_count: i32) -> Decimal {
    if sponsored_employees_count <= 0 {
        return Decimal::ZERO;
    }
    (total_shared_amount / Decimal::from(sponsored_employees_count)).round_dp(2)
}

/// Checks that `amount` can be billed.
pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Applies a transaction of `amount` to `balances` under `policy`.
///
/// Utilization always grows by the full amount; debt grows by the overage.
///
/// # Errors
/// - [`Error::InvalidAmount`] for non-positive amounts
/// - [`Error::OverageNotConfirmed`] / [`Error::OverageCeilingExceeded`] when the
///   capped policy refuses the overdraft
pub fn assess_transaction(
    policy: OveragePolicy,
    ceiling: Decimal,
    balances: &Balances,
    amount: Decimal,
    allow_overage: bool,
) -> Result<Assessment> {
    validate_amount(amount)?;

    let overage = balances.overage_for(amount);

    let status = match policy {
        OveragePolicy::Flag if overage > Decimal::ZERO => TransactionStatus::Flagged,
        OveragePolicy::Flag => TransactionStatus::Completed,
        OveragePolicy::Capped => {
            if overage > Decimal::ZERO {
                if !allow_overage {
                    return Err(Error::OverageNotConfirmed {
                        amount,
                        available: balances.available(),
                    });
                }
                if overage > ceiling {
                    return Err(Error::OverageCeilingExceeded { overage, ceiling });
                }
            }
            TransactionStatus::Completed
        }
    };

    Ok(Assessment {
        balances: Balances {
            period_allowance: balances.period_allowance,
            utilized_amount: balances.utilized_amount + amount,
            debt: balances.debt + overage,
        },
        status,
        overage,
    })
}

/// Undoes a deleted transaction of `amount`.
///
/// Debt drops by the amount, floored at zero. Utilization is only given back when
/// the transaction belongs to the current period; earlier periods were already
/// reset by a rollover.
#[must_use]
pub fn reverse_transaction(balances: &Balances, amount: Decimal, in_current_period: bool) -> Balances {
    let utilized_amount = if in_current_period {
        (balances.utilized_amount - amount).max(Decimal::ZERO)
    } else {
        balances.utilized_amount
    };

    Balances {
        period_allowance: balances.period_allowance,
        utilized_amount,
        debt: (balances.debt - amount).max(Decimal::ZERO),
    }
}

/// Balances at the start of a new period.
///
/// Outstanding debt is paid out of the fresh allowance first:
/// `effective = new_allowance - previous_debt`. A non-negative `effective`
/// becomes the allowance with no debt left; a negative one leaves a zero
/// allowance and carries `-effective` forward as debt. Utilization resets.
#[must_use]
pub fn roll_over(previous_debt: Decimal, new_allowance: Decimal) -> Balances {
    let effective = new_allowance - previous_debt.max(Decimal::ZERO);
    if effective >= Decimal::ZERO {
        Balances::fresh(effective)
    } else {
        Balances {
            period_allowance: Decimal::ZERO,
            utilized_amount: Decimal::ZERO,
            debt: -effective,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    const CEILING: Decimal = dec!(300);

    fn balances(allowance: Decimal, utilized: Decimal, debt: Decimal) -> Balances {
        Balances {
            period_allowance: allowance,
            utilized_amount: utilized,
            debt,
        }
    }

    #[test]
    fn test_allowance_per_client_splits_evenly() {
        assert_eq!(allowance_per_client(dec!(2000), 2), dec!(1000));
        assert_eq!(allowance_per_client(dec!(1000), 3), dec!(333.33));
        assert_eq!(allowance_per_client(dec!(2000), 0), Decimal::ZERO);
    }

    #[test]
    fn test_available_balance() {
        let b = balances(dec!(1000), dec!(250), Decimal::ZERO);
        assert_eq!(b.available(), dec!(750));
        let overdrawn = balances(dec!(1000), dec!(1200), dec!(200));
        assert_eq!(overdrawn.available(), dec!(-200));
    }

    #[test]
    fn test_flag_policy_within_balance_completes() {
        let a = assess_transaction(
            OveragePolicy::Flag,
            CEILING,
            &Balances::fresh(dec!(1000)),
            dec!(400),
            false,
        )
        .unwrap();
        assert_eq!(a.status, TransactionStatus::Completed);
        assert_eq!(a.overage, Decimal::ZERO);
        assert_eq!(a.balances, balances(dec!(1000), dec!(400), Decimal::ZERO));
    }

    #[test]
    fn test_flag_policy_overdraft_is_flagged() {
        // allowance 1000, spend 1200 -> utilized 1200, debt 200, flagged
        let a = assess_transaction(
            OveragePolicy::Flag,
            CEILING,
            &Balances::fresh(dec!(1000)),
            dec!(1200),
            false,
        )
        .unwrap();
        assert_eq!(a.status, TransactionStatus::Flagged);
        assert_eq!(a.overage, dec!(200));
        assert_eq!(a.balances, balances(dec!(1000), dec!(1200), dec!(200)));
    }

    #[test]
    fn test_overage_only_counts_uncovered_part_when_already_negative() {
        // allowance lowered below utilization without any debt
        let b = balances(dec!(500), dec!(600), Decimal::ZERO);
        assert_eq!(b.overage_for(dec!(50)), dec!(50));
    }

    #[test]
    fn test_capped_policy_requires_confirmation() {
        let result = assess_transaction(
            OveragePolicy::Capped,
            CEILING,
            &Balances::fresh(dec!(1000)),
            dec!(1100),
            false,
        );
        assert!(matches!(
            result,
            Err(Error::OverageNotConfirmed { available, .. }) if available == dec!(1000)
        ));
    }

    #[test]
    fn test_capped_policy_accepts_confirmed_overage_within_ceiling() {
        let a = assess_transaction(
            OveragePolicy::Capped,
            CEILING,
            &Balances::fresh(dec!(1000)),
            dec!(1300),
            true,
        )
        .unwrap();
        assert_eq!(a.status, TransactionStatus::Completed);
        assert_eq!(a.balances.debt, dec!(300));
        assert_eq!(a.balances.utilized_amount, dec!(1300));
    }

    #[test]
    fn test_capped_policy_rejects_overage_above_ceiling() {
        let result = assess_transaction(
            OveragePolicy::Capped,
            CEILING,
            &Balances::fresh(dec!(1000)),
            dec!(1300.01),
            true,
        );
        assert!(matches!(
            result,
            Err(Error::OverageCeilingExceeded { overage, .. }) if overage == dec!(300.01)
        ));
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        for amount in [Decimal::ZERO, dec!(-5)] {
            let result = assess_transaction(
                OveragePolicy::Flag,
                CEILING,
                &Balances::fresh(dec!(1000)),
                amount,
                false,
            );
            assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        }
    }

    #[test]
    fn test_roll_over_debt_smaller_than_allowance() {
        assert_eq!(
            roll_over(dec!(500), dec!(1200)),
            balances(dec!(700), Decimal::ZERO, Decimal::ZERO)
        );
    }

    #[test]
    fn test_roll_over_debt_larger_than_allowance() {
        assert_eq!(
            roll_over(dec!(1500), dec!(1200)),
            balances(Decimal::ZERO, Decimal::ZERO, dec!(300))
        );
    }

    #[test]
    fn test_roll_over_debt_equal_to_allowance() {
        assert_eq!(
            roll_over(dec!(1200), dec!(1200)),
            balances(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        );
    }

    #[test]
    fn test_reverse_outside_current_period_keeps_utilization() {
        let b = balances(dec!(700), dec!(100), dec!(50));
        let reversed = reverse_transaction(&b, dec!(80), false);
        assert_eq!(reversed, balances(dec!(700), dec!(100), Decimal::ZERO));
    }

    #[test]
    fn test_overage_policy_parse_and_display() {
        assert_eq!("FLAG".parse::<OveragePolicy>().unwrap(), OveragePolicy::Flag);
        assert_eq!(" capped ".parse::<OveragePolicy>().unwrap(), OveragePolicy::Capped);
        assert!("strict".parse::<OveragePolicy>().is_err());
        assert_eq!(OveragePolicy::Capped.to_string(), "capped");
    }

    fn money() -> impl Strategy<Value = Decimal> {
        (0i64..500_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    fn positive_money() -> impl Strategy<Value = Decimal> {
        (1i64..500_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    #[derive(Debug, Clone)]
    enum Step {
        Record(Decimal),
        Delete(Decimal),
        RollOver(Decimal),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            positive_money().prop_map(Step::Record),
            positive_money().prop_map(Step::Delete),
            money().prop_map(Step::RollOver),
        ]
    }

    proptest! {
        #[test]
        fn prop_record_then_delete_restores_debt(
            allowance in money(),
            utilized in money(),
            amount in positive_money(),
        ) {
            // debt blocks new transactions, so a recordable client is debt free
            let before = balances(allowance, utilized, Decimal::ZERO);
            let after = assess_transaction(OveragePolicy::Flag, CEILING, &before, amount, false)
                .unwrap()
                .balances;
            let restored = reverse_transaction(&after, amount, true);
            prop_assert_eq!(restored.debt, before.debt);
            prop_assert_eq!(restored.utilized_amount, before.utilized_amount);
        }

        #[test]
        fn prop_debt_never_negative(start in money(), steps in prop::collection::vec(step(), 1..40)) {
            let mut b = Balances::fresh(start);
            for s in steps {
                b = match s {
                    Step::Record(amount) => {
                        assess_transaction(OveragePolicy::Flag, CEILING, &b, amount, false)
                            .unwrap()
                            .balances
                    }
                    Step::Delete(amount) => reverse_transaction(&b, amount, true),
                    Step::RollOver(allowance) => roll_over(b.debt, allowance),
                };
                prop_assert!(b.debt >= Decimal::ZERO);
                prop_assert!(b.utilized_amount >= Decimal::ZERO);
            }
        }

        #[test]
        fn prop_roll_over_conserves_money(debt in money(), allowance in money()) {
            let b = roll_over(debt, allowance);
            prop_assert_eq!(b.utilized_amount, Decimal::ZERO);
            prop_assert_eq!(b.period_allowance - b.debt, allowance - debt);
            prop_assert!(b.period_allowance == Decimal::ZERO || b.debt == Decimal::ZERO);
        }
    }
}
