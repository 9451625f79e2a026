//! Bootstrap sampling and weighted split-candidate selection.

use rand::Rng;

/// Generate a bootstrap sample and the out-of-bag indices.
pub(crate) fn bootstrap_sample(
    n_samples: usize,
    draw_count: usize,
    rng: &mut impl Rng,
) -> (Vec<usize>, Vec<usize>) {
    let mut in_bag = vec![false; n_samples];
    let mut bootstrap_indices = Vec::with_capacity(draw_count);
    for _ in 0..draw_count {
        let idx = rng.gen_range(0..n_samples);
        bootstrap_indices.push(idx);
        in_bag[idx] = true;
    }
    let oob_indices: Vec<usize> = (0..n_samples).filter(|&i| !in_bag[i]).collect();
    (bootstrap_indices, oob_indices)
}

/// Draw up to `mtry` candidate features without replacement, with selection
/// probability proportional to the weights.
///
/// Uses exponential-key sampling (Efraimidis–Spirakis): each feature with
/// weight w > 0 gets key `u^(1/w)` for uniform u, and the `mtry` largest
/// keys win. Zero-weight features are never drawn. Returns fewer than
/// `mtry` candidates when fewer features are active.
pub(crate) fn weighted_candidates(
    weights: &[f64],
    mtry: usize,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let mut keyed: Vec<(f64, usize)> = weights
        .iter()
        .enumerate()
        .filter(|&(_, &w)| w > 0.0)
        .map(|(idx, &w)| {
            let u: f64 = rng.r#gen();
            (u.powf(1.0 / w), idx)
        })
        .collect();

    keyed.sort_unstable_by(|a, b| b.0.total_cmp(&a.0));
    keyed.truncate(mtry);
    keyed.into_iter().map(|(_, idx)| idx).collect()
}
