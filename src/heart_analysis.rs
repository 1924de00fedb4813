use crate::config::PeakParams;
use crate::preprocessing::{mean, std_dev};
use crate::Sample;

/// Find local maxima that clear `height` and stand out by more than
/// `prominence` against the `distance` samples on either side.
///
/// Windows near the ends of the series are clipped. Consecutive peaks are not
/// forced apart beyond what height and prominence already reject.
pub fn find_peaks(data: &[f32], params: &PeakParams) -> Vec<usize> {
    let mut peaks = Vec::new();
    if data.len() < 3 {
        return peaks;
    }

    for i in 1..data.len() - 1 {
        if data[i] > data[i - 1] && data[i] > data[i + 1] && data[i] >= params.height {
            // Near the start the left window shrinks to s[0..i]; it is never
            // skipped, so the left prominence check applies from i = 1
            let left = window_max(&data[i.saturating_sub(params.distance)..i]);
            let right = window_max(&data[i + 1..(i + 1 + params.distance).min(data.len())]);
            if data[i] > left + params.prominence && data[i] > right + params.prominence {
                peaks.push(i);
            }
        }
    }

    peaks
}

fn window_max(window: &[f32]) -> f32 {
    window.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b))
}

/// Instantaneous BPM for each pair of consecutive peaks, assuming samples
/// arrive exactly at `frame_rate`.
pub fn calculate_heart_rate(peaks: &[usize], frame_rate: f32) -> Vec<f32> {
    let time_interval = 1.0 / frame_rate;
    let peak_times: Vec<f32> = peaks.iter().map(|&i| i as f32 * time_interval).collect();

    peak_times
        .windows(2)
        .map(|w| w[1] - w[0])
        .map(|interval| 60.0 / interval)
        .collect()
}

/// Instantaneous BPM using the capture time of each peak.
///
/// `timestamps` must be aligned with the series the peaks index into.
/// Peaks without a timestamp and non-increasing times are skipped.
pub fn calculate_heart_rate_from_timestamps(peaks: &[usize], timestamps: &[i64]) -> Vec<f32> {
    let peak_times: Vec<i64> = peaks
        .iter()
        .filter_map(|&i| timestamps.get(i).copied())
        .collect();

    peak_times
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&elapsed_ms| elapsed_ms > 0)
        .map(|elapsed_ms| 60_000.0 / elapsed_ms as f32)
        .collect()
}

/// Mean of the instantaneous rates. NaN when there are none.
pub fn get_heart_rate(heart_rates: &[f32]) -> f32 {
    mean(heart_rates)
}

/// Summary of the mean-crossing analysis over a sample window.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingStats {
    pub average: f32,
    pub min: f32,
    pub max: f32,
    pub range: f32,
    pub crossings: Vec<Sample>,
}

/// Drop samples further than two standard deviations from the mean.
/// Falls back to the input when everything would be dropped.
pub fn apply_std_dev_filter(samples: &[Sample]) -> Vec<Sample> {
    let values: Vec<f32> = samples.iter().map(|s| s.value).collect();
    let mean = mean(&values);
    let std_dev = std_dev(&values);
    let threshold = 2.0;

    let filtered: Vec<Sample> = samples
        .iter()
        .filter(|s| (s.value - mean).abs() <= threshold * std_dev)
        .copied()
        .collect();

    if filtered.is_empty() {
        samples.to_vec()
    } else {
        filtered
    }
}

pub fn analyze_data(samples: &[Sample]) -> CrossingStats {
    let filtered = apply_std_dev_filter(samples);

    if filtered.len() < 2 {
        return CrossingStats {
            average: 0.0,
            min: 0.0,
            max: 0.0,
            range: 0.0,
            crossings: Vec::new(),
        };
    }

    let values: Vec<f32> = filtered.iter().map(|s| s.value).collect();
    let average = mean(&values);
    let min = values.iter().fold(f32::INFINITY, |a, &b| a.min(b));
    let max = values.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));

    CrossingStats {
        average,
        min,
        max,
        range: max - min,
        crossings: get_average_crossings(&filtered, average),
    }
}

/// Samples where the signal has just dropped below `average`.
pub fn get_average_crossings(samples: &[Sample], average: f32) -> Vec<Sample> {
    samples
        .windows(2)
        .filter(|w| w[1].value < average && w[0].value > average)
        .map(|w| w[1])
        .collect()
}

/// BPM from the mean spacing of crossing timestamps.
pub fn calculate_bpm(crossings: &[Sample]) -> Option<f32> {
    let (first, last) = match crossings {
        [first, .., last] => (first, last),
        _ => return None,
    };

    let average_interval = (last.timestamp - first.timestamp) as f32 / (crossings.len() - 1) as f32;
    if average_interval <= 0.0 {
        return None;
    }
    Some(60_000.0 / average_interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sampled_sine(len: usize, sample_rate: f32, freq: f32, first_peak: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = (i as f32 - first_peak as f32) / sample_rate;
                (2.0 * PI * freq * t + PI / 2.0).sin()
            })
            .collect()
    }

    #[test]
    fn finds_sine_peaks() {
        // 1 Hz at 10 samples/s: maxima at 3, 13, 23, ...
        let data = sampled_sine(100, 10.0, 1.0, 3);
        let params = PeakParams {
            height: 0.5,
            ..PeakParams::default()
        };
        let peaks = find_peaks(&data, &params);
        let expected: Vec<usize> = (0..10).map(|k| 3 + 10 * k).collect();

        assert_eq!(peaks.len(), expected.len());
        for (found, want) in peaks.iter().zip(expected.iter()) {
            assert!(found.abs_diff(*want) <= 1, "peak {} vs {}", found, want);
        }
    }

    #[test]
    fn height_rejects_low_maxima() {
        let data = sampled_sine(100, 10.0, 1.0, 3);
        let params = PeakParams {
            height: 1.5,
            ..PeakParams::default()
        };
        assert!(find_peaks(&data, &params).is_empty());
    }

    #[test]
    fn prominence_rejects_shallow_bumps() {
        let data = [0.60, 0.61, 0.60, 0.59, 0.90, 0.59, 0.58, 0.57];
        let peaks = find_peaks(&data, &PeakParams::default());
        assert_eq!(peaks, vec![4]);
    }

    #[test]
    fn edge_windows_are_clipped() {
        let data = [0.1, 0.9, 0.1];
        assert_eq!(find_peaks(&data, &PeakParams::default()), vec![1]);
        assert!(find_peaks(&[0.9, 0.1], &PeakParams::default()).is_empty());
        assert!(find_peaks(&[], &PeakParams::default()).is_empty());
    }

    #[test]
    fn short_left_windows_still_test_prominence() {
        // i = 1 compares against s[0] alone
        assert_eq!(
            find_peaks(&[0.5, 0.8, 0.2, 0.1, 0.1], &PeakParams::default()),
            vec![1]
        );
        assert!(find_peaks(&[0.79, 0.8, 0.2, 0.1, 0.1], &PeakParams::default()).is_empty());

        // i = 2 compares against s[0..2], so a taller first sample rejects it
        assert!(find_peaks(&[0.9, 0.5, 0.8, 0.2, 0.1, 0.1], &PeakParams::default()).is_empty());
        assert_eq!(
            find_peaks(&[0.3, 0.5, 0.8, 0.2, 0.1, 0.1], &PeakParams::default()),
            vec![2]
        );
    }

    #[test]
    fn regular_peaks_give_sixty_bpm() {
        let rates = calculate_heart_rate(&[60, 120, 180], 60.0);
        assert_eq!(rates.len(), 2);
        for rate in &rates {
            assert!((rate - 60.0).abs() < 1e-3);
        }
        assert!((get_heart_rate(&rates) - 60.0).abs() < 1e-3);
    }

    #[test]
    fn fewer_than_two_peaks_has_no_rate() {
        assert!(calculate_heart_rate(&[42], 60.0).is_empty());
        assert!(calculate_heart_rate(&[], 60.0).is_empty());
        assert!(get_heart_rate(&[]).is_nan());
    }

    #[test]
    fn timestamp_rates_follow_capture_time() {
        // Frames arrive at ~50ms instead of the nominal 16.7ms
        let timestamps: Vec<i64> = (0..40).map(|i| 1_000 + i * 50).collect();
        let rates = calculate_heart_rate_from_timestamps(&[5, 25], &timestamps);
        assert_eq!(rates.len(), 1);
        assert!((rates[0] - 60.0).abs() < 1e-3);

        // Out of range peaks and repeated timestamps are skipped
        assert!(calculate_heart_rate_from_timestamps(&[5, 99], &timestamps).is_empty());
        assert!(calculate_heart_rate_from_timestamps(&[1, 2], &[0, 10, 10]).is_empty());
    }

    #[test]
    fn crossings_track_downward_mean_crossings() {
        // Square wave with a period of 1000ms
        let samples: Vec<Sample> = (0..40)
            .map(|i| {
                let value = if (i / 5) % 2 == 0 { 0.5 } else { 0.3 };
                Sample::new(value, i * 100)
            })
            .collect();

        let stats = analyze_data(&samples);
        assert!((stats.average - 0.4).abs() < 1e-5);
        assert!((stats.range - 0.2).abs() < 1e-6);
        let times: Vec<i64> = stats.crossings.iter().map(|s| s.timestamp).collect();
        assert_eq!(times, vec![500, 1500, 2500, 3500]);

        let bpm = calculate_bpm(&stats.crossings).unwrap();
        assert!((bpm - 60.0).abs() < 1e-3);
    }

    #[test]
    fn crossing_bpm_needs_two_crossings() {
        assert_eq!(calculate_bpm(&[]), None);
        assert_eq!(calculate_bpm(&[Sample::new(0.3, 10)]), None);
        assert_eq!(
            calculate_bpm(&[Sample::new(0.3, 10), Sample::new(0.3, 10)]),
            None
        );
    }

    #[test]
    fn std_dev_filter_keeps_everything_when_flat() {
        let samples = vec![Sample::new(0.4, 0), Sample::new(0.4, 16)];
        assert_eq!(apply_std_dev_filter(&samples), samples);

        let stats = analyze_data(&samples[..1]);
        assert_eq!(stats.average, 0.0);
        assert!(stats.crossings.is_empty());
    }

    #[test]
    fn std_dev_filter_drops_spikes() {
        let mut samples: Vec<Sample> = (0..20).map(|i| Sample::new(0.4, i)).collect();
        samples[10].value = 0.9;
        let filtered = apply_std_dev_filter(&samples);
        assert_eq!(filtered.len(), 19);
        assert!(filtered.iter().all(|s| s.value == 0.4));
    }
}
