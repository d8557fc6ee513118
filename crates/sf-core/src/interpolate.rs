//! Table lookup helpers.
//!
//! All functions work on strictly increasing coordinate lists and never
//! extrapolate: queries outside the table are held at the boundary value.
//! Lookups can be split into a bracket search plus an interpolation with a
//! precomputed index or fraction, so several columns sharing one coordinate
//! list only pay for the search once.

/// Bracket index `i` such that `list[i] <= value < list[i + 1]`, clamped to
/// `[0, len - 2]`.
pub fn binary_search(list: &[f64], value: f64) -> usize {
    let n = list.len();
    if n < 2 || value <= list[0] {
        return 0;
    }
    if value >= list[n - 1] {
        return n - 2;
    }
    // partition_point gives the first element greater than value
    let upper = list.partition_point(|x| *x <= value);
    upper.saturating_sub(1).min(n - 2)
}

/// Same contract as [`binary_search`], scanning forward from `start`.
///
/// Cheap when successive queries move slowly through the table.
pub fn linear_search(list: &[f64], value: f64, start: usize) -> usize {
    let n = list.len();
    if n < 2 {
        return 0;
    }
    let mut i = start.min(n - 2);
    while i > 0 && value < list[i] {
        i -= 1;
    }
    while i < n - 2 && value >= list[i + 1] {
        i += 1;
    }
    i
}

/// Linear fraction of `x_new` inside bracket `index`, clamped to `[0, 1]`.
pub fn fraction(x_new: f64, x_list: &[f64], index: usize) -> f64 {
    if x_list.len() < 2 {
        return 0.0;
    }
    let i = index.min(x_list.len() - 2);
    let span = x_list[i + 1] - x_list[i];
    if span <= 0.0 {
        return 0.0;
    }
    ((x_new - x_list[i]) / span).clamp(0.0, 1.0)
}

/// Interpolate with a known bracket fraction.
pub fn interpolate1d_frac(x_frac: f64, data: &[f64], index: usize) -> f64 {
    match data.len() {
        0 => 0.0,
        1 => data[0],
        n => {
            let i = index.min(n - 2);
            data[i] + x_frac * (data[i + 1] - data[i])
        }
    }
}

/// Interpolate with a known bracket index.
pub fn interpolate1d_at(x_new: f64, x_list: &[f64], data: &[f64], index: usize) -> f64 {
    interpolate1d_frac(fraction(x_new, x_list, index), data, index)
}

/// Linear interpolation of `data` sampled at `x_list`.
pub fn interpolate1d(x_new: f64, x_list: &[f64], data: &[f64]) -> f64 {
    let index = binary_search(x_list, x_new);
    interpolate1d_at(x_new, x_list, data, index)
}

/// Bilinear interpolation with known bracket fractions.
///
/// `data` is laid out as `data[x][y]`.
pub fn interpolate2d_frac(
    x_frac: f64,
    y_frac: f64,
    data: &[Vec<f64>],
    x_index: usize,
    y_index: usize,
) -> f64 {
    match data.len() {
        0 => 0.0,
        1 => interpolate1d_frac(y_frac, &data[0], y_index),
        n => {
            let i = x_index.min(n - 2);
            let low = interpolate1d_frac(y_frac, &data[i], y_index);
            let high = interpolate1d_frac(y_frac, &data[i + 1], y_index);
            low + x_frac * (high - low)
        }
    }
}

/// Bilinear interpolation with known bracket indices.
pub fn interpolate2d_at(
    x_new: f64,
    y_new: f64,
    x_list: &[f64],
    y_list: &[f64],
    data: &[Vec<f64>],
    x_index: usize,
    y_index: usize,
) -> f64 {
    let x_frac = fraction(x_new, x_list, x_index);
    let y_frac = fraction(y_new, y_list, y_index);
    interpolate2d_frac(x_frac, y_frac, data, x_index, y_index)
}

/// Bilinear interpolation of `data[x][y]` sampled on `x_list` × `y_list`.
pub fn interpolate2d(
    x_new: f64,
    y_new: f64,
    x_list: &[f64],
    y_list: &[f64],
    data: &[Vec<f64>],
) -> f64 {
    let x_index = binary_search(x_list, x_new);
    let y_index = binary_search(y_list, y_new);
    interpolate2d_at(x_new, y_new, x_list, y_list, data, x_index, y_index)
}
