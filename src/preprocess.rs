use ndarray::{Array2, ArrayView2, Axis};

/// Min-max normalize every column into `[0, 1]`.
///
/// Each column is shifted by its minimum and divided by its maximum after the
/// shift. Constant columns are only shifted.
pub fn normalize(data: &ArrayView2<f64>) -> Array2<f64> {
    if data.nrows() == 0 {
        return data.to_owned();
    }

    let mins = data.fold_axis(Axis(0), f64::INFINITY, |&acc, &v| acc.min(v));
    let mut out = data.to_owned();
    out -= &mins;

    let maxs = out
        .fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| acc.max(v))
        .mapv(|m| if m == 0.0 { 1.0 } else { m });
    out /= &maxs;

    out
}
