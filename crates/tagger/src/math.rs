#![forbid(unsafe_code)]

/// Index of the highest score; the first index wins ties.
///
/// NaN never compares greater, so a row of NaN (or an empty row) yields 0.
pub fn argmax(scores: &[f32]) -> usize {
    let mut best = 0usize;
    let mut max = f32::NEG_INFINITY;
    for (i, &s) in scores.iter().enumerate() {
        if s > max {
            max = s;
            best = i;
        }
    }
    best
}

/// Minimal softmax over a score row, used to report tag confidence.
pub fn softmax(logits: &mut [f32]) {
    if logits.is_empty() {
        return;
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0_f32;
    for v in logits.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum == 0.0 || !sum.is_finite() {
        return;
    }
    for v in logits.iter_mut() {
        *v /= sum;
    }
}
