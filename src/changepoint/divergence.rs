// Mean-shift divergence between the two sides of a candidate split
//
// For a split of n points into a left part of size a and a right part of
// size b, the statistic is
//
//     D = a * b / n * (mean_left - mean_right)^2
//
// which is the between-group sum of squares of a two-group ANOVA. It is
// symmetric under swapping the sides and zero when both means are equal.

/// Best split of a contiguous range
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BestSplit {
    /// Offset of the first element of the right side, relative to the range
    pub offset: usize,
    pub statistic: f64,
}

/// Divergence between a left part and a right part given their sizes and sums
pub(crate) fn divergence(left_len: usize, left_sum: f64, right_len: usize, right_sum: f64) -> f64 {
    let a = left_len as f64;
    let b = right_len as f64;
    let diff = left_sum / a - right_sum / b;
    a * b / (a + b) * diff * diff
}

/// Split maximizing the divergence with at least `min_segment_size` points per side
///
/// Scans every admissible split in one pass over running sums. On ties the
/// earliest offset wins. Returns `None` when the range is too short to split.
pub(crate) fn best_split(values: &[f64], min_segment_size: usize) -> Option<BestSplit> {
    let min = min_segment_size.max(1);
    let len = values.len();
    if len < min.saturating_mul(2) {
        return None;
    }

    let total: f64 = values.iter().sum();
    let mut left_sum = 0.0;
    let mut best: Option<BestSplit> = None;

    for (i, v) in values.iter().enumerate().take(len - min) {
        left_sum += v;
        let offset = i + 1;
        if offset < min {
            continue;
        }

        let statistic = divergence(offset, left_sum, len - offset, total - left_sum);
        if best.map_or(true, |b| statistic > b.statistic) {
            best = Some(BestSplit { offset, statistic });
        }
    }

    best
}

/// Largest divergence over all admissible splits (0 if none)
pub(crate) fn max_divergence(values: &[f64], min_segment_size: usize) -> f64 {
    best_split(values, min_segment_size).map_or(0.0, |b| b.statistic)
}
