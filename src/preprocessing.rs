/// Arithmetic mean. NaN for an empty slice.
pub fn mean(data: &[f32]) -> f32 {
    data.iter().sum::<f32>() / data.len() as f32
}

/// Population standard deviation; 0.0 for an empty slice.
pub fn std_dev(data: &[f32]) -> f32 {
    let n = data.len() as f32;
    if n == 0.0 {
        return 0.0;
    }

    let mean = mean(data);
    let variance = data
        .iter()
        .map(|&x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f32>()
        / n;

    variance.sqrt()
}

/// Nearest-rank percentile without interpolation: the sorted value at
/// `floor(p / 100 * (len - 1))`. Returns `None` for an empty slice.
pub fn percentile(data: &[f32], p: f32) -> Option<f32> {
    if data.is_empty() {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let index = ((p / 100.0) * (sorted.len() - 1) as f32).floor() as usize;
    sorted.get(index.min(sorted.len() - 1)).copied()
}

/// Replace values outside `[Q1 - factor*IQR, Q3 + factor*IQR]` with the mean
/// of the unfiltered series. The output always has the input's length.
///
/// Returns the cleaned series and the number of replaced values.
pub fn filter_outliers(data: &[f32], factor: f32) -> (Vec<f32>, usize) {
    let (Some(q1), Some(q3)) = (percentile(data, 25.0), percentile(data, 75.0)) else {
        return (Vec::new(), 0);
    };
    let iqr = q3 - q1;
    let lower_bound = q1 - factor * iqr;
    let upper_bound = q3 + factor * iqr;

    // Mean includes the outliers themselves
    let mean = mean(data);

    let mut replaced = 0;
    let cleaned = data
        .iter()
        .map(|&value| {
            if value >= lower_bound && value <= upper_bound {
                value
            } else {
                replaced += 1;
                mean
            }
        })
        .collect();

    (cleaned, replaced)
}

/// Simple moving average over each full window; no edge padding.
pub fn moving_average(data: &[f32], window_size: usize) -> Vec<f32> {
    if window_size == 0 {
        return Vec::new();
    }
    data.windows(window_size)
        .map(|window| window.iter().sum::<f32>() / window_size as f32)
        .collect()
}
