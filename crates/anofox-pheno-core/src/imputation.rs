//! Missing value imputation.

/// Fill missing values by linear interpolation between the surrounding
/// observed values.
///
/// Interior gaps are bridged linearly. Missing values before the first or
/// after the last observation are held at that observation. An input with no
/// observed value at all comes back as NaN.
pub fn fill_linear(values: &[Option<f64>]) -> Vec<f64> {
    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|x| (i, x)))
        .collect();

    let (Some(&(first, first_val)), Some(&(last, last_val))) = (known.first(), known.last())
    else {
        return vec![f64::NAN; values.len()];
    };

    let mut result = vec![f64::NAN; values.len()];
    result[..first].fill(first_val);
    result[last..].fill(last_val);

    for pair in known.windows(2) {
        let (i0, v0) = pair[0];
        let (i1, v1) = pair[1];
        let slope = (v1 - v0) / (i1 - i0) as f64;
        for (k, slot) in result[i0..i1].iter_mut().enumerate() {
            *slot = v0 + slope * k as f64;
        }
    }

    result
}

/// Length of the longest run of consecutive missing values.
pub fn longest_gap(values: &[Option<f64>]) -> usize {
    values
        .split(|v| v.is_some())
        .map(|run| run.len())
        .max()
        .unwrap_or(0)
}
