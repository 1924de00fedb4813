use crate::buffer::BrightnessWindow;
use crate::config::PlacementThresholds;
use crate::preprocessing::std_dev;
use serde::Serialize;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize)]
pub enum FeedbackState {
    TooLight, // Too little light reaches the sensor: pressing too hard
    TooDark,  // Too much light: finger does not cover the camera
    Unstable,
    Good,
}

impl FeedbackState {
    pub fn message(&self) -> &'static str {
        match self {
            FeedbackState::TooLight => "Pressing too hard, lighten your touch.",
            FeedbackState::TooDark => "Cover the camera fully with your finger.",
            FeedbackState::Unstable => "Hold steady, finger is moving too much.",
            FeedbackState::Good => "Perfect! Hold steady for accurate readings.",
        }
    }
}

/// Classifies finger placement from a short history of raw brightness.
#[derive(Debug, Clone)]
pub struct StabilityGate {
    window: BrightnessWindow,
    thresholds: PlacementThresholds,
}

impl StabilityGate {
    pub fn new(thresholds: PlacementThresholds) -> Self {
        Self {
            window: BrightnessWindow::new(thresholds.window_size),
            thresholds,
        }
    }

    /// Record `brightness` and classify the current placement.
    ///
    /// Brightness bounds are checked on the latest value alone; stability
    /// looks at the whole window.
    pub fn evaluate(&mut self, brightness: f32) -> FeedbackState {
        self.window.push(brightness);

        if brightness < self.thresholds.min_brightness {
            FeedbackState::TooLight
        } else if brightness > self.thresholds.max_brightness {
            FeedbackState::TooDark
        } else if self.stability() > self.thresholds.max_std_dev {
            FeedbackState::Unstable
        } else {
            FeedbackState::Good
        }
    }

    /// Standard deviation of the brightness window
    pub fn stability(&self) -> f32 {
        std_dev(&self.window.to_vec())
    }

    pub fn window(&self) -> &BrightnessWindow {
        &self.window
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

impl Default for StabilityGate {
    fn default() -> Self {
        Self::new(PlacementThresholds::default())
    }
}
