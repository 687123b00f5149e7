//! Elementary series operations used by the smoother and the extractor.

use statrs::statistics::Statistics;

/// Numerical first derivative with unit spacing.
///
/// Central differences in the interior, one-sided differences at the two
/// ends, so the output has the same length as the input.
pub fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    match n {
        0 => vec![],
        1 => vec![0.0],
        _ => (0..n)
            .map(|i| {
                if i == 0 {
                    values[1] - values[0]
                } else if i == n - 1 {
                    values[n - 1] - values[n - 2]
                } else {
                    (values[i + 1] - values[i - 1]) / 2.0
                }
            })
            .collect(),
    }
}

/// Running sum.
pub fn cumulative_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Index of the first maximum, ignoring NaN. `None` for an empty or all-NaN slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Index of the first minimum, ignoring NaN.
pub fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b <= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Min/max of a year's values, used to rescale it onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Range of `values`, or `None` when it cannot normalize anything
    /// (empty input, NaN present, or max == min).
    pub fn of(values: &[f64]) -> Option<Self> {
        let min = Statistics::min(values);
        let max = Statistics::max(values);
        if !min.is_finite() || !max.is_finite() || max - min <= 0.0 {
            return None;
        }
        Some(Self { min, max })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn normalize(&self, v: f64) -> f64 {
        (v - self.min) / self.span()
    }
}

/// Sign as -1, 0 or 1; `None` for NaN.
fn sign(x: f64) -> Option<i8> {
    if x.is_nan() {
        None
    } else if x > 0.0 {
        Some(1)
    } else if x < 0.0 {
        Some(-1)
    } else {
        Some(0)
    }
}

/// Indices `i` where `range.normalize(values[i]) - threshold` changes sign
/// between day `i` and day `i + 1`.
///
/// Touching the threshold exactly counts as a sign of zero, so a curve that
/// lands on it and moves on yields two crossings. Pairs involving NaN never
/// count.
pub fn threshold_crossings(values: &[f64], range: &ValueRange, threshold: f64) -> Vec<usize> {
    let signs: Vec<Option<i8>> = values
        .iter()
        .map(|&v| sign(range.normalize(v) - threshold))
        .collect();

    signs
        .windows(2)
        .enumerate()
        .filter_map(|(i, w)| match (w[0], w[1]) {
            (Some(a), Some(b)) if a != b => Some(i),
            _ => None,
        })
        .collect()
}
