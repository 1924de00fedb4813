//! Per-frame heart rate pipeline.
//!
//! [`PipelineState`] owns the retained samples and the placement gate. Each
//! tick appends one sample and re-runs the whole chain over the buffer:
//! outlier replacement, smoothing, peak detection, interval timing and
//! averaging. Stages stay pure; diagnostics go through [`PipelineObserver`].

use crate::buffer::SampleBuffer;
use crate::config::{BpmEstimator, IntervalTiming, PipelineConfig};
use crate::heart_analysis::{self, CrossingStats};
use crate::placement::{FeedbackState, StabilityGate};
use crate::preprocessing::{filter_outliers, moving_average};
use crate::{Frame, FrameResult, RangeStats, Sample};
use log::{debug, info, trace};

/// Hook invoked by the orchestrator after each stage.
pub trait PipelineObserver {
    fn outliers_replaced(&mut self, _count: usize) {}
    fn peaks_detected(&mut self, _smoothed: &[f32], _peaks: &[usize]) {}
    fn heart_rates(&mut self, _rates: &[f32], _bpm: f32) {}
    fn crossings(&mut self, _stats: &CrossingStats, _bpm: Option<f32>) {}
    fn feedback(&mut self, _state: FeedbackState) {}
}

/// Discards all diagnostics.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Writes stage diagnostics to the `log` facade.
#[derive(Default)]
pub struct LogObserver {
    last_feedback: Option<FeedbackState>,
}

impl PipelineObserver for LogObserver {
    fn outliers_replaced(&mut self, count: usize) {
        debug!("Number of outliers removed: {}", count);
    }

    fn peaks_detected(&mut self, smoothed: &[f32], peaks: &[usize]) {
        trace!("{} peaks in {} smoothed samples", peaks.len(), smoothed.len());
    }

    fn heart_rates(&mut self, rates: &[f32], bpm: f32) {
        debug!("Detected heart rate: {:.2} BPM", bpm);
        for (i, rate) in rates.iter().enumerate() {
            trace!("Interval {}: {:.2} BPM", i + 1, rate);
        }
    }

    fn crossings(&mut self, stats: &CrossingStats, bpm: Option<f32>) {
        debug!(
            "{} mean crossings (average {:.3}, range {:.3}), bpm: {:?}",
            stats.crossings.len(),
            stats.average,
            stats.range,
            bpm
        );
    }

    fn feedback(&mut self, state: FeedbackState) {
        if self.last_feedback != Some(state) {
            info!("{}", state.message());
            self.last_feedback = Some(state);
        }
    }
}

/// Run the analysis chain over `samples` (oldest first).
///
/// Never fails: too few samples give an empty smoothed series and no BPM.
pub fn process_heart_rate_data(
    samples: &[Sample],
    config: &PipelineConfig,
    observer: &mut dyn PipelineObserver,
) -> FrameResult {
    let values: Vec<f32> = samples.iter().map(|s| s.value).collect();

    let (cleaned, replaced) = filter_outliers(&values, config.outlier_factor);
    observer.outliers_replaced(replaced);

    let smoothed = moving_average(&cleaned, config.smoothing_window);
    let peaks = heart_analysis::find_peaks(&smoothed, &config.peaks);
    observer.peaks_detected(&smoothed, &peaks);

    let bpm = match config.estimator {
        BpmEstimator::PeakBased => {
            let rates = match config.timing {
                IntervalTiming::Nominal => {
                    heart_analysis::calculate_heart_rate(&peaks, config.frame_rate)
                }
                IntervalTiming::Captured => {
                    // Smoothed index i averages samples i..i+w; time it by the window centre
                    let offset = config.smoothing_window.saturating_sub(1) / 2;
                    let timestamps: Vec<i64> =
                        samples.iter().skip(offset).map(|s| s.timestamp).collect();
                    heart_analysis::calculate_heart_rate_from_timestamps(&peaks, &timestamps)
                }
            };
            let bpm = heart_analysis::get_heart_rate(&rates);
            if !rates.is_empty() {
                observer.heart_rates(&rates, bpm);
            }
            bpm
        }
        BpmEstimator::CrossingBased => {
            let stats = heart_analysis::analyze_data(samples);
            let bpm = heart_analysis::calculate_bpm(&stats.crossings);
            observer.crossings(&stats, bpm);
            bpm.unwrap_or(f32::NAN)
        }
    };

    let range = RangeStats::of(&smoothed);

    FrameResult {
        smoothed,
        peaks,
        bpm: bpm.is_finite().then_some(bpm),
        range,
    }
}

/// Buffers and settings for one monitoring session.
pub struct PipelineState {
    config: PipelineConfig,
    samples: SampleBuffer,
    gate: StabilityGate,
}

impl PipelineState {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            samples: SampleBuffer::new(config.max_samples()),
            gate: StabilityGate::new(config.placement),
            config,
        }
    }

    /// Feed one sample: classify placement, retain it, then analyze the buffer.
    pub fn tick(&mut self, sample: Sample, observer: &mut dyn PipelineObserver) -> Frame {
        let feedback = self.gate.evaluate(sample.value);
        observer.feedback(feedback);

        self.samples.push(sample);
        let result = self.analyze(observer);

        Frame {
            sample,
            feedback,
            result,
        }
    }

    /// Analyze the current buffer without adding a sample.
    pub fn analyze(&self, observer: &mut dyn PipelineObserver) -> FrameResult {
        let samples = self.samples.to_vec();
        process_heart_rate_data(&samples, &self.config, observer)
    }

    /// Drop all retained samples and brightness history.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.gate.reset();
    }

    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn gate(&self) -> &StabilityGate {
        &self.gate
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
