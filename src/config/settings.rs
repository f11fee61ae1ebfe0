//! Ledger settings loaded from environment variables.
//!
//! | Variable                     | Default |
//! |------------------------------|---------|
//! | `HOTEL_HUB_OVERAGE_POLICY`   | `flag`  |
//! | `HOTEL_HUB_OVERAGE_CEILING`  | `300`   |
//! | `HOTEL_HUB_MAX_RETRIES`      | `5`     |
//! | `HOTEL_HUB_CURRENCY`         | `KES`   |

use crate::core::allowance::OveragePolicy;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Tunables for the ledger operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// How transactions exceeding the available balance are treated
    pub overage_policy: OveragePolicy,
    /// Largest overage accepted under [`OveragePolicy::Capped`]
    pub overage_ceiling: Decimal,
    /// Compare-and-swap attempts before giving up with a conflict
    pub max_retries: u32,
    /// Currency code used when formatting amounts
    pub currency: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            overage_policy: OveragePolicy::Flag,
            overage_ceiling: Decimal::from(300),
            max_retries: 5,
            currency: "KES".to_string(),
        }
    }
}

impl LedgerSettings {
    /// Reads the settings from the process environment, falling back to defaults
    /// for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let overage_policy = match lookup("HOTEL_HUB_OVERAGE_POLICY") {
            Some(raw) => raw.parse()?,
            None => defaults.overage_policy,
        };

        let overage_ceiling = match lookup("HOTEL_HUB_OVERAGE_CEILING") {
            Some(raw) => {
                let ceiling = Decimal::from_str(raw.trim()).map_err(|e| Error::Config {
                    message: format!("HOTEL_HUB_OVERAGE_CEILING '{raw}' is not a number: {e}"),
                })?;
                if ceiling.is_sign_negative() {
                    return Err(Error::Config {
                        message: format!("HOTEL_HUB_OVERAGE_CEILING must not be negative, got {raw}"),
                    });
                }
                ceiling
            }
            None => defaults.overage_ceiling,
        };

        let max_retries = match lookup("HOTEL_HUB_MAX_RETRIES") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) | Err(_) => {
                    return Err(Error::Config {
                        message: format!("HOTEL_HUB_MAX_RETRIES must be a positive integer, got '{raw}'"),
                    });
                }
                Ok(n) => n,
            },
            None => defaults.max_retries,
        };

        let currency = lookup("HOTEL_HUB_CURRENCY")
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or(defaults.currency);

        Ok(Self {
            overage_policy,
            overage_ceiling,
            max_retries,
            currency,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = LedgerSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, LedgerSettings::default());
        assert_eq!(settings.overage_ceiling, Decimal::from(300));
        assert_eq!(settings.overage_policy, OveragePolicy::Flag);
    }

    #[test]
    fn test_overrides() {
        let settings = LedgerSettings::from_lookup(lookup_from(&[
            ("HOTEL_HUB_OVERAGE_POLICY", "capped"),
            ("HOTEL_HUB_OVERAGE_CEILING", "450.50"),
            ("HOTEL_HUB_MAX_RETRIES", "8"),
            ("HOTEL_HUB_CURRENCY", "usd"),
        ]))
        .unwrap();
        assert_eq!(settings.overage_policy, OveragePolicy::Capped);
        assert_eq!(settings.overage_ceiling, Decimal::new(45050, 2));
        assert_eq!(settings.max_retries, 8);
        assert_eq!(settings.currency, "USD");
    }

    #[test]
    fn test_rejects_bad_values() {
        for pairs in [
            [("HOTEL_HUB_OVERAGE_POLICY", "sometimes")],
            [("HOTEL_HUB_OVERAGE_CEILING", "lots")],
            [("HOTEL_HUB_OVERAGE_CEILING", "-1")],
            [("HOTEL_HUB_MAX_RETRIES", "0")],
        ] {
            let result = LedgerSettings::from_lookup(lookup_from(&pairs));
            assert!(matches!(result, Err(Error::Config { .. })), "{pairs:?}");
        }
    }
}
