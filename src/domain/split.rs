use super::{AllocationError, Cents};

/// Split a total equally into `num_people` shares that sum back to `total`
/// exactly.
///
/// Rounding pennies are placed deterministically: everyone gets the floored
/// base share, and the first `total mod num_people` positions (in input
/// order) get one extra cent. Callers must pass people in a consistent order
/// to get a stable result per person.
///
/// Example: split_equally(1000, 3) -> [334, 333, 333]
pub fn split_equally(total: Cents, num_people: usize) -> Result<Vec<Cents>, AllocationError> {
    if num_people == 0 {
        return Err(AllocationError::NoShares);
    }

    // Euclidean division keeps the sum invariant even for negative totals,
    // where plain truncating division would drop the remainder's sign.
    let n = num_people as Cents;
    let base = total.div_euclid(n);
    let remainder = total.rem_euclid(n) as usize;

    Ok((0..num_people)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_evenly_divisible() {
        assert_eq!(split_equally(1800, 3).unwrap(), vec![600, 600, 600]);
        assert_eq!(split_equally(1200, 3).unwrap(), vec![400, 400, 400]);
    }

    #[test]
    fn test_split_with_remainder() {
        // First person gets the extra penny
        assert_eq!(split_equally(1000, 3).unwrap(), vec![334, 333, 333]);
        assert_eq!(split_equally(1001, 2).unwrap(), vec![501, 500]);
    }

    #[test]
    fn test_split_single_person() {
        assert_eq!(split_equally(999, 1).unwrap(), vec![999]);
    }

    #[test]
    fn test_split_zero_total() {
        assert_eq!(split_equally(0, 4).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_split_total_smaller_than_group() {
        assert_eq!(split_equally(2, 3).unwrap(), vec![1, 1, 0]);
    }

    #[test]
    fn test_split_sum_invariant() {
        for total in [0, 1, 7, 99, 1000, 12345] {
            for num_people in 1..=7 {
                let shares = split_equally(total, num_people).unwrap();
                assert_eq!(shares.len(), num_people);
                assert_eq!(shares.iter().sum::<Cents>(), total);
            }
        }
    }

    #[test]
    fn test_split_negative_total_keeps_sum() {
        let shares = split_equally(-1000, 3).unwrap();
        assert_eq!(shares.iter().sum::<Cents>(), -1000);
    }

    #[test]
    fn test_split_zero_people() {
        assert_eq!(split_equally(1000, 0), Err(AllocationError::NoShares));
    }
}
