//! Price history: append-only record of price changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{PriceHistoryId, ProductId};

use crate::product::Price;

/// One immutable history row, written when a product's price actually changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub id: PriceHistoryId,
    pub product_id: ProductId,
    pub price: Price,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of comparing a product's stored price with a requested one.
///
/// The price itself is always re-persisted; only a `Changed` outcome appends a
/// history row.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PriceChange {
    Unchanged,
    Changed { from: Price, to: Price },
}

impl PriceChange {
    pub fn between(old: Price, new: Price) -> Self {
        if old == new {
            Self::Unchanged
        } else {
            Self::Changed { from: old, to: new }
        }
    }

    /// The price to record in history, if any.
    pub fn recorded_price(&self) -> Option<Price> {
        match self {
            Self::Unchanged => None,
            Self::Changed { to, .. } => Some(*to),
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn price(amount: i64) -> Price {
        Price::new(amount).unwrap()
    }

    #[test]
    fn same_price_is_unchanged() {
        let change = PriceChange::between(price(500), price(500));
        assert_eq!(change, PriceChange::Unchanged);
        assert_eq!(change.recorded_price(), None);
    }

    #[test]
    fn different_price_records_new_value() {
        let change = PriceChange::between(price(500), price(450));
        assert_eq!(
            change,
            PriceChange::Changed {
                from: price(500),
                to: price(450)
            }
        );
        assert_eq!(change.recorded_price(), Some(price(450)));
    }

    proptest! {
        #[test]
        fn records_iff_prices_differ(old in 0i64..1_000_000, new in 0i64..1_000_000) {
            let change = PriceChange::between(price(old), price(new));
            prop_assert_eq!(change.is_change(), old != new);
            if old != new {
                prop_assert_eq!(change.recorded_price(), Some(price(new)));
            }
        }
    }
}
