use serde::{Deserialize, Serialize};

use super::{allocate_proportionally, AllocationError, Cents};

/// Tax configuration for a bill: either a percentage of the subtotal or an
/// exact amount read off the receipt.
///
/// Serializes in tagged form, e.g. `{"type":"rate","rate":0.08}` or
/// `{"type":"exact","amount":825}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TaxInput {
    /// Percentage of the pre-tax subtotal, as a decimal in [0, 1]
    Rate { rate: f64 },
    /// Exact tax amount in cents
    Exact { amount: Cents },
}

/// Compute the total tax for a bill subtotal.
///
/// A rate is applied to the subtotal and rounded to the nearest cent. An
/// exact amount passes through unchanged, with no sanity check against the
/// subtotal.
pub fn calculate_tax(subtotal: Cents, input: &TaxInput) -> Cents {
    match input {
        TaxInput::Rate { rate } => (subtotal as f64 * rate).round() as Cents,
        TaxInput::Exact { amount } => *amount,
    }
}

/// Distribute a tax total across people, proportional to their item
/// subtotals. Delegates to the largest-remainder allocator, so the shares
/// sum back to `total_tax` exactly.
pub fn distribute_tax(
    total_tax: Cents,
    person_subtotals: &[Cents],
) -> Result<Vec<Cents>, AllocationError> {
    allocate_proportionally(total_tax, person_subtotals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_from_rate() {
        assert_eq!(calculate_tax(10000, &TaxInput::Rate { rate: 0.08 }), 800);
        assert_eq!(calculate_tax(2000, &TaxInput::Rate { rate: 0.10 }), 200);
    }

    #[test]
    fn test_tax_from_rate_rounds_to_nearest_cent() {
        // 999 * 0.0825 = 82.4175 -> 82
        assert_eq!(calculate_tax(999, &TaxInput::Rate { rate: 0.0825 }), 82);
        // 1010 * 0.0825 = 83.325 -> 83
        assert_eq!(calculate_tax(1010, &TaxInput::Rate { rate: 0.0825 }), 83);
    }

    #[test]
    fn test_tax_zero_rate() {
        assert_eq!(calculate_tax(10000, &TaxInput::Rate { rate: 0.0 }), 0);
    }

    #[test]
    fn test_tax_exact_passes_through() {
        assert_eq!(calculate_tax(10000, &TaxInput::Exact { amount: 825 }), 825);
        // No reasonableness check against the subtotal
        assert_eq!(calculate_tax(100, &TaxInput::Exact { amount: 9999 }), 9999);
    }

    #[test]
    fn test_distribute_tax() {
        let shares = distribute_tax(300, &[1000, 1000, 1000]).unwrap();
        assert_eq!(shares, vec![100, 100, 100]);

        let shares = distribute_tax(100, &[5000, 3000, 2000]).unwrap();
        assert_eq!(shares, vec![50, 30, 20]);
    }

    #[test]
    fn test_tax_input_serde_round_trip() {
        let rate = TaxInput::Rate { rate: 0.08 };
        let json = serde_json::to_string(&rate).unwrap();
        assert_eq!(json, r#"{"type":"rate","rate":0.08}"#);
        assert_eq!(serde_json::from_str::<TaxInput>(&json).unwrap(), rate);

        let exact = TaxInput::Exact { amount: 825 };
        let json = serde_json::to_string(&exact).unwrap();
        assert_eq!(json, r#"{"type":"exact","amount":825}"#);
        assert_eq!(serde_json::from_str::<TaxInput>(&json).unwrap(), exact);
    }
}
