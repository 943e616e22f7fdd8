//! Cost dimensions reported and optimized by the routing service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Cost values keyed by dimension.
pub type Costs = BTreeMap<CostKind, f64>;

/// A cost dimension.
///
/// The discriminant is the numeric code used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CostKind {
    Distance = 1,
    Duration = 2,
    Price = 3,
    Carbon = 4,
    Calories = 5,
    NumberOfChanges = 6,
    Variability = 7,
}

impl CostKind {
    /// Every dimension, in wire-code order.
    pub const ALL: [CostKind; 7] = [
        CostKind::Distance,
        CostKind::Duration,
        CostKind::Price,
        CostKind::Carbon,
        CostKind::Calories,
        CostKind::NumberOfChanges,
        CostKind::Variability,
    ];

    /// Look up a dimension by its wire code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            CostKind::Distance => "Distance",
            CostKind::Duration => "Duration",
            CostKind::Price => "Price",
            CostKind::Carbon => "Carbon",
            CostKind::Calories => "Calories",
            CostKind::NumberOfChanges => "NumberOfChanges",
            CostKind::Variability => "Variability",
        }
    }

    /// Display unit; empty for dimensionless counts.
    pub fn unit(self) -> &'static str {
        match self {
            CostKind::Distance => "m",
            CostKind::Duration => "min",
            CostKind::Price => "€",
            CostKind::Carbon => "kg",
            CostKind::Calories => "kcal",
            CostKind::NumberOfChanges | CostKind::Variability => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for kind in CostKind::ALL {
            assert_eq!(CostKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(CostKind::from_code(0), None);
        assert_eq!(CostKind::from_code(99), None);
    }

    #[test]
    fn table_is_total() {
        for kind in CostKind::ALL {
            assert!(!kind.name().is_empty());
            // unit() is exhaustive by construction; spot-check the known ones
            let _ = kind.unit();
        }
        assert_eq!(CostKind::Duration.unit(), "min");
        assert_eq!(CostKind::Distance.unit(), "m");
        assert_eq!(CostKind::NumberOfChanges.unit(), "");
    }

    #[test]
    fn serializes_by_name() {
        let json = serde_json::to_string(&CostKind::Carbon).unwrap();
        assert_eq!(json, "\"Carbon\"");
    }
}
