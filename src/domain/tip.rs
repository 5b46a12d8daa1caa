use super::{allocate_proportionally, AllocationError, Cents};

/// Compute the tip for a bill subtotal, rounded to the nearest cent.
///
/// Tip is always computed on the pre-tax subtotal. That is the usual
/// restaurant convention and it is fixed, not configurable.
pub fn calculate_tip(subtotal: Cents, rate: f64) -> Cents {
    (subtotal as f64 * rate).round() as Cents
}

/// Distribute a tip total across people, proportional to their pre-tax item
/// subtotals. Delegates to the largest-remainder allocator, so the shares
/// sum back to `total_tip` exactly.
pub fn distribute_tip(
    total_tip: Cents,
    person_subtotals: &[Cents],
) -> Result<Vec<Cents>, AllocationError> {
    allocate_proportionally(total_tip, person_subtotals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tip_from_rate() {
        assert_eq!(calculate_tip(10000, 0.18), 1800);
        assert_eq!(calculate_tip(5000, 0.20), 1000);
    }

    #[test]
    fn test_tip_rounds_to_nearest_cent() {
        // 999 * 0.18 = 179.82 -> 180
        assert_eq!(calculate_tip(999, 0.18), 180);
        // 997 * 0.15 = 149.55 -> 150
        assert_eq!(calculate_tip(997, 0.15), 150);
    }

    #[test]
    fn test_tip_zero_rate() {
        assert_eq!(calculate_tip(10000, 0.0), 0);
    }

    #[test]
    fn test_distribute_tip() {
        let shares = distribute_tip(600, &[2000, 2000, 2000]).unwrap();
        assert_eq!(shares, vec![200, 200, 200]);

        let shares = distribute_tip(1000, &[5000, 3000, 2000]).unwrap();
        assert_eq!(shares, vec![500, 300, 200]);
    }
}
