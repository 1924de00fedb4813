use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// Replaced-value rule for the IQR outlier filter
pub const OUTLIER_IQR_FACTOR: f32 = 1.5;
/// Moving average width applied after outlier replacement
pub const SMOOTHING_WINDOW: usize = 3;
pub const PEAK_HEIGHT: f32 = 0.55;
pub const PEAK_DISTANCE: usize = 3;
pub const PEAK_PROMINENCE: f32 = 0.02;
/// Assumed, not measured, capture rate
pub const NOMINAL_FRAME_RATE: f32 = 60.0;
pub const BUFFER_SECONDS: f32 = 5.0;
pub const BRIGHTNESS_WINDOW_SIZE: usize = 30; // About half a second at 60fps
pub const MIN_BRIGHTNESS: f32 = 0.1;
pub const MAX_BRIGHTNESS: f32 = 0.6;
pub const STABILITY_THRESHOLD: f32 = 0.02;
/// Time for the camera image to settle before samples are buffered. Exports
/// already start after it, so only raw captures need it skipped.
pub const CAMERA_SETTLE_MS: i64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BpmEstimator {
    #[default]
    PeakBased, // Peaks of the smoothed series (active path)
    CrossingBased, // Downward mean crossings of the raw buffer
}

impl FromStr for BpmEstimator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "peaks" | "peak" => Ok(BpmEstimator::PeakBased),
            "crossings" | "crossing" => Ok(BpmEstimator::CrossingBased),
            _ => Err(format!(
                "Invalid estimator: {}. Use 'peaks' (default) or 'crossings'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntervalTiming {
    #[default]
    Nominal, // index / frame rate
    Captured, // sample timestamps
}

impl FromStr for IntervalTiming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nominal" => Ok(IntervalTiming::Nominal),
            "captured" => Ok(IntervalTiming::Captured),
            _ => Err(format!(
                "Invalid timing: {}. Use 'nominal' (default) or 'captured'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakParams {
    pub height: f32,
    pub distance: usize,
    pub prominence: f32,
}

impl Default for PeakParams {
    fn default() -> Self {
        Self {
            height: PEAK_HEIGHT,
            distance: PEAK_DISTANCE,
            prominence: PEAK_PROMINENCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementThresholds {
    pub min_brightness: f32,
    pub max_brightness: f32,
    pub max_std_dev: f32,
    pub window_size: usize,
}

impl Default for PlacementThresholds {
    fn default() -> Self {
        Self {
            min_brightness: MIN_BRIGHTNESS,
            max_brightness: MAX_BRIGHTNESS,
            max_std_dev: STABILITY_THRESHOLD,
            window_size: BRIGHTNESS_WINDOW_SIZE,
        }
    }
}

/// Settings for one pipeline instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub outlier_factor: f32,
    pub smoothing_window: usize,
    pub peaks: PeakParams,
    pub frame_rate: f32,
    pub buffer_seconds: f32,
    pub placement: PlacementThresholds,
    pub estimator: BpmEstimator,
    pub timing: IntervalTiming,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            outlier_factor: OUTLIER_IQR_FACTOR,
            smoothing_window: SMOOTHING_WINDOW,
            peaks: PeakParams::default(),
            frame_rate: NOMINAL_FRAME_RATE,
            buffer_seconds: BUFFER_SECONDS,
            placement: PlacementThresholds::default(),
            estimator: BpmEstimator::default(),
            timing: IntervalTiming::default(),
        }
    }
}

impl PipelineConfig {
    pub fn max_samples(&self) -> usize {
        (self.buffer_seconds * self.frame_rate).round().max(0.0) as usize
    }
}

/// Replay PPG brightness recordings through the heart rate pipeline
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Recording file (.json export or .csv) or a directory of recordings
    #[arg(help = "Recording file (.json or .csv) or directory containing recordings")]
    pub input_path: PathBuf,

    /// BPM estimator (peaks [default] or crossings)
    #[arg(long, default_value = "peaks")]
    pub estimator: BpmEstimator,

    /// Interval timing (nominal [default] uses frame indices, captured uses sample timestamps)
    #[arg(long, default_value = "nominal")]
    pub timing: IntervalTiming,

    /// Nominal frame rate used to convert sample indices to seconds
    #[arg(long, default_value_t = NOMINAL_FRAME_RATE)]
    pub frame_rate: f32,

    /// Seconds of samples retained in the analysis buffer
    #[arg(long, default_value_t = BUFFER_SECONDS)]
    pub buffer_seconds: f32,

    /// Skip samples captured within this many milliseconds of the first one.
    /// Buffer exports are already settled; raw captures need 1500.
    #[arg(long, default_value_t = 0)]
    pub start_delay_ms: i64,

    /// CSV file receiving one row per replayed frame
    #[arg(long, env = "CSV_OUTPUT")]
    pub csv_output: Option<PathBuf>,

    /// Directory to export the final sample buffer to as JSON
    #[arg(long)]
    pub export_dir: Option<PathBuf>,
}

impl Args {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            frame_rate: self.frame_rate,
            buffer_seconds: self.buffer_seconds,
            estimator: self.estimator,
            timing: self.timing,
            ..PipelineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_buffer_holds_five_seconds_at_sixty_fps() {
        assert_eq!(PipelineConfig::default().max_samples(), 300);
    }

    #[test]
    fn parses_estimator_names() {
        assert_eq!("peaks".parse::<BpmEstimator>(), Ok(BpmEstimator::PeakBased));
        assert_eq!(
            "crossings".parse::<BpmEstimator>(),
            Ok(BpmEstimator::CrossingBased)
        );
        assert!("fft".parse::<BpmEstimator>().is_err());
    }

    #[test]
    fn args_override_rate_and_strategy() {
        let args = Args::parse_from([
            "ppg-decoder",
            "recording.json",
            "--estimator",
            "crossings",
            "--timing",
            "captured",
            "--frame-rate",
            "30",
        ]);
        let config = args.pipeline_config();
        assert_eq!(config.estimator, BpmEstimator::CrossingBased);
        assert_eq!(config.timing, IntervalTiming::Captured);
        assert_eq!(config.max_samples(), 150);
        assert_eq!(config.peaks, PeakParams::default());
    }

    #[test]
    fn replay_keeps_every_sample_by_default() {
        let args = Args::parse_from(["ppg-decoder", "recording.json"]);
        assert_eq!(args.start_delay_ms, 0);

        let args = Args::parse_from(["ppg-decoder", "raw.csv", "--start-delay-ms", "1500"]);
        assert_eq!(args.start_delay_ms, CAMERA_SETTLE_MS);
    }
}
