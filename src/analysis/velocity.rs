use std::fmt;
use log::debug;
use serde::Serialize;
use crate::analysis::config::Calibration;
use crate::analysis::extrema::ExtremumPoint;
use crate::analysis::AnalysisError;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SlopeSign {
    /// Falling droplet: negative slope in pixel-vs-frame coordinates.
    Down,
    /// Rising droplet.
    Up,
}
impl fmt::Display for SlopeSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlopeSign::Down => f.write_str("downward"),
            SlopeSign::Up => f.write_str("upward"),
        }
    }
}
/// Falling and rising terminal speeds in m/s, both strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VelocityPair {
    v_down: f64,
    v_up: f64,
}
impl VelocityPair {
    pub fn new(v_down: f64, v_up: f64) -> Result<Self, AnalysisError> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(v_down) || !usable(v_up) {
            return Err(AnalysisError::InvalidVelocity { v_down, v_up });
        }
        Ok(Self { v_down, v_up })
    }
    pub fn v_down(&self) -> f64 {
        self.v_down
    }
    pub fn v_up(&self) -> f64 {
        self.v_up
    }
}
/// Median slopes of the rising and falling segments between extrema.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SlopeSummary {
    pub positive: Vec<f64>,
    pub negative: Vec<f64>,
    /// Consecutive extrema that shared a time index and were skipped.
    pub degenerate_segments: usize,
}
impl SlopeSummary {
    /// Median of the positive slopes, 0 when there are none.
    pub fn positive_median(&self) -> f64 {
        median(&self.positive).unwrap_or(0.0)
    }
    /// Median of the negative slopes, 0 when there are none.
    pub fn negative_median(&self) -> f64 {
        median(&self.negative).unwrap_or(0.0)
    }
}
pub struct VelocityEstimator {
    calibration: Calibration,
}
impl VelocityEstimator {
    pub fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }
    /// Slopes between chronologically consecutive extrema, split by sign.
    pub fn slopes(&self, peaks: &[ExtremumPoint], troughs: &[ExtremumPoint]) -> SlopeSummary {
        let mut points: Vec<&ExtremumPoint> = peaks.iter().chain(troughs).collect();
        points.sort_by_key(|p| p.time_index);
        let mut summary = SlopeSummary::default();
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.time_index == b.time_index {
                debug!(
                    "degenerate segment at index {}; skipping zero-width slope",
                    a.time_index
                );
                summary.degenerate_segments += 1;
                continue;
            }
            let slope = (b.value - a.value) / (b.time_index as f64 - a.time_index as f64);
            if slope > 0.0 {
                summary.positive.push(slope);
            } else if slope < 0.0 {
                summary.negative.push(slope);
            }
        }
        summary
    }
    /// Convert median slopes into the falling/rising velocity pair.
    ///
    /// A negative pixel slope is the falling leg, a positive one the rising
    /// leg. Missing either leg is reported as `EmptyExtremumSet`.
    pub fn process(
        &self,
        peaks: &[ExtremumPoint],
        troughs: &[ExtremumPoint],
    ) -> Result<VelocityPair, AnalysisError> {
        let summary = self.slopes(peaks, troughs);
        if summary.negative.is_empty() {
            return Err(AnalysisError::EmptyExtremumSet {
                missing: SlopeSign::Down,
            });
        }
        if summary.positive.is_empty() {
            return Err(AnalysisError::EmptyExtremumSet {
                missing: SlopeSign::Up,
            });
        }
        let (v_down, v_up) = self.convert(summary.negative_median(), summary.positive_median());
        VelocityPair::new(v_down, v_up)
    }
    /// Raw magnitude conversion; no validation.
    pub fn convert(&self, negative_slope: f64, positive_slope: f64) -> (f64, f64) {
        (
            self.calibration.slope_to_m_per_s(negative_slope),
            self.calibration.slope_to_m_per_s(positive_slope),
        )
    }
}
fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) * 0.5)
    }
}
