//! Benjamini–Hochberg false discovery rate correction.

/// Compute BH-corrected rates for a set of p-values.
///
/// Entry `i` of the result is the corrected rate for `p_values[i]`:
/// `min over j with p_j >= p_i of (p_j * n / rank_j)`, clamped to 1.0.
/// Order matches the input.
#[must_use]
pub fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len();
    if n == 0 {
        return vec![];
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_unstable_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    // Walk from the largest p-value down, carrying the running minimum so
    // corrected rates are monotone in the p-values.
    let mut corrected = vec![0.0f64; n];
    let mut running = 1.0f64;
    for rank in (0..n).rev() {
        let idx = order[rank];
        let rate = p_values[idx] * n as f64 / (rank + 1) as f64;
        running = running.min(rate);
        corrected[idx] = running;
    }
    corrected
}

#[cfg(test)]
mod tests {
    use super::benjamini_hochberg;

    #[test]
    fn known_vector() {
        let corrected = benjamini_hochberg(&[0.01, 0.04, 0.03, 0.005]);
        // Sorted: 0.005, 0.01, 0.03, 0.04 with raw rates 0.02, 0.02, 0.04, 0.04.
        assert!((corrected[0] - 0.02).abs() < 1e-12);
        assert!((corrected[1] - 0.04).abs() < 1e-12);
        assert!((corrected[2] - 0.04).abs() < 1e-12);
        assert!((corrected[3] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn single_value_unchanged() {
        let corrected = benjamini_hochberg(&[0.07]);
        assert!((corrected[0] - 0.07).abs() < 1e-12);
    }

    #[test]
    fn monotone_in_p_values() {
        let p = [0.2, 0.01, 0.8, 0.05, 0.3];
        let corrected = benjamini_hochberg(&p);
        let mut pairs: Vec<(f64, f64)> = p.iter().copied().zip(corrected).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        for w in pairs.windows(2) {
            assert!(w[0].1 <= w[1].1 + 1e-12);
        }
    }

    #[test]
    fn capped_at_one() {
        let corrected = benjamini_hochberg(&[0.9, 0.95, 1.0]);
        assert!(corrected.iter().all(|&q| q <= 1.0));
    }

    #[test]
    fn empty_input() {
        assert!(benjamini_hochberg(&[]).is_empty());
    }
}
