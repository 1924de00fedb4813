pub mod buffer;
pub mod config;
pub mod data_loading;
pub mod heart_analysis;
pub mod output;
pub mod pipeline;
pub mod placement;
pub mod preprocessing;

use placement::FeedbackState;
use serde::{Deserialize, Serialize};

/// One brightness reading taken from a camera frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f32,
    /// Capture time in milliseconds since the epoch
    #[serde(rename = "time")]
    pub timestamp: i64,
}

impl Sample {
    pub fn new(value: f32, timestamp: i64) -> Self {
        Self { value, timestamp }
    }

    /// Build a sample from an RGBA pixel buffer using the red+green brightness reduction
    pub fn from_rgba(pixels: &[u8], timestamp: i64) -> Self {
        Self::new(data_loading::average_brightness(pixels), timestamp)
    }
}

/// Min/max of a series, used to scale the signal for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeStats {
    pub min: f32,
    pub max: f32,
}

impl RangeStats {
    /// An empty series yields `{ +inf, -inf }`, which reports as degenerate.
    pub fn of(series: &[f32]) -> Self {
        let min = series.iter().fold(f32::INFINITY, |a, &b| a.min(b));
        let max = series.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        Self { min, max }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.max > self.min)
    }

    /// Scale `value` into 0..1. Degenerate ranges map everything to mid-scale.
    pub fn normalize(&self, value: f32) -> f32 {
        if self.is_degenerate() {
            return 0.5;
        }
        (value - self.min) / (self.max - self.min)
    }

    pub fn normalize_series(&self, series: &[f32]) -> Vec<f32> {
        series.iter().map(|&v| self.normalize(v)).collect()
    }
}

/// Everything the renderer needs for one tick.
#[derive(Debug, Clone, Serialize)]
pub struct FrameResult {
    pub smoothed: Vec<f32>,
    pub peaks: Vec<usize>,
    /// `None` when there are not enough beats in the buffer to estimate a rate
    pub bpm: Option<f32>,
    pub range: RangeStats,
}

impl FrameResult {
    pub fn empty() -> Self {
        Self {
            smoothed: Vec::new(),
            peaks: Vec::new(),
            bpm: None,
            range: RangeStats::of(&[]),
        }
    }

    /// Smoothed series scaled into 0..1 for plotting
    pub fn normalized(&self) -> Vec<f32> {
        self.range.normalize_series(&self.smoothed)
    }
}

/// Output of a single pipeline tick: placement feedback plus the analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub sample: Sample,
    pub feedback: FeedbackState,
    pub result: FrameResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_of_constant_series_is_degenerate() {
        let range = RangeStats::of(&[0.4, 0.4, 0.4]);
        assert!(range.is_degenerate());
        assert_eq!(range.normalize(0.4), 0.5);
    }

    #[test]
    fn range_of_empty_series_is_degenerate() {
        let range = RangeStats::of(&[]);
        assert!(range.is_degenerate());
        assert_eq!(range.normalize(0.9), 0.5);
    }

    #[test]
    fn normalize_maps_range_onto_unit_interval() {
        let range = RangeStats::of(&[0.2, 0.6, 0.4]);
        assert_eq!(range.min, 0.2);
        assert_eq!(range.max, 0.6);
        let scaled = range.normalize_series(&[0.2, 0.4, 0.6]);
        assert!((scaled[0] - 0.0).abs() < 1e-6);
        assert!((scaled[1] - 0.5).abs() < 1e-6);
        assert!((scaled[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sample_serializes_timestamp_as_time() {
        let json = serde_json::to_string(&Sample::new(0.5, 1700000000000)).unwrap();
        assert_eq!(json, r#"{"value":0.5,"time":1700000000000}"#);
    }
}
