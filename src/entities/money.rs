//! Money column type.
//!
//! `SQLite` has no decimal type and `SeaORM` decodes `Decimal` columns there through
//! `f64`. [`Money`] stores the exact decimal text in a `TEXT` column instead and
//! parses it back on read, so amounts round-trip digit for digit.

use rust_decimal::Decimal;
use sea_orm::{
    ColIdx, DbErr, QueryResult, TryGetError, TryGetable,
    sea_query::{ArrayType, ColumnType, Nullable, Value, ValueType, ValueTypeErr},
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};

/// An exact amount of money as stored in the ledger tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// The amount as a plain [`Decimal`].
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl PartialEq<Decimal> for Money {
    fn eq(&self, other: &Decimal) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<Decimal> for Money {
    fn partial_cmp(&self, other: &Decimal) -> Option<Ordering> {
        self.0.partial_cmp(other)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

fn parse(raw: &str) -> Option<Money> {
    Decimal::from_str(raw.trim()).ok().map(Money)
}

impl From<Money> for Value {
    fn from(money: Money) -> Self {
        Self::String(Some(Box::new(money.0.to_string())))
    }
}

impl TryGetable for Money {
    fn try_get_by<I: ColIdx>(res: &QueryResult, index: I) -> Result<Self, TryGetError> {
        let raw = String::try_get_by(res, index)?;
        parse(&raw).ok_or_else(|| {
            TryGetError::DbErr(DbErr::Type(format!("'{raw}' is not a valid amount")))
        })
    }
}

impl ValueType for Money {
    fn try_from(v: Value) -> Result<Self, ValueTypeErr> {
        match v {
            Value::String(Some(raw)) => parse(&raw).ok_or(ValueTypeErr),
            _ => Err(ValueTypeErr),
        }
    }

    fn type_name() -> String {
        "Money".to_owned()
    }

    fn array_type() -> ArrayType {
        ArrayType::String
    }

    fn column_type() -> ColumnType {
        ColumnType::Text
    }
}

impl Nullable for Money {
    fn null() -> Value {
        Value::String(None)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_value_conversion_is_exact() {
        let money = Money(dec!(99999999999999.99));
        let value: Value = money.into();
        assert_eq!(value, Value::String(Some(Box::new("99999999999999.99".to_string()))));
        assert_eq!(<Money as ValueType>::try_from(value).unwrap(), money);
    }

    #[test]
    fn test_rejects_non_numeric_text() {
        let value = Value::String(Some(Box::new("lots".to_string())));
        assert!(<Money as ValueType>::try_from(value).is_err());
        assert!(<Money as ValueType>::try_from(Value::String(None)).is_err());
    }

    #[test]
    fn test_compares_with_decimal() {
        assert_eq!(Money(dec!(10.50)), dec!(10.5));
        assert!(Money(dec!(0.01)) > Decimal::ZERO);
        assert_eq!(format!("{:.2}", Money(dec!(7))), "7.00");
    }
}
