use crate::analysis::charge::{ChargeEstimate, ChargeModel};
use crate::analysis::config::SessionConfig;
use crate::analysis::error::AnalysisError;
use crate::analysis::extrema::{Extrema, ExtremumDetector};
use crate::analysis::session::AnalysisSession;
use crate::analysis::source::ObservationSource;
use crate::analysis::velocity::VelocityEstimator;
use crate::analysis::NormalizedSeries;
/// Result of running the stages once over the current series. The extrema are
/// kept even when no estimate could be formed so callers can still chart them.
#[derive(Debug)]
pub struct PipelineRun {
    pub extrema: Extrema,
    pub estimate: Result<ChargeEstimate, AnalysisError>,
}
/// Detector → velocity estimator → charge model, called in sequence.
pub struct ChargePipeline {
    detector: ExtremumDetector,
    estimator: VelocityEstimator,
    model: ChargeModel,
}
impl ChargePipeline {
    pub fn new(config: &SessionConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            detector: ExtremumDetector::new(config.detector),
            estimator: VelocityEstimator::new(config.calibration),
            model: ChargeModel::new(config.apparatus)?,
        })
    }
    pub fn detector(&self) -> &ExtremumDetector {
        &self.detector
    }
    pub fn estimator(&self) -> &VelocityEstimator {
        &self.estimator
    }
    pub fn model(&self) -> &ChargeModel {
        &self.model
    }
    pub fn process(&self, series: &NormalizedSeries) -> PipelineRun {
        let extrema = self.detector.process(series);
        let estimate = self
            .estimator
            .process(&extrema.peak_points(), &extrema.trough_points())
            .and_then(|velocities| self.model.process(velocities, series.len()));
        PipelineRun { extrema, estimate }
    }
}
/// What one pump of a [`Replay`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pumped {
    /// The observation was accepted but produced no new estimate.
    Sample,
    Estimate(ChargeEstimate),
}
/// Feeds a session from a source, one observation per pump, the way a
/// tracking loop would on each timer tick.
pub struct Replay<S: ObservationSource> {
    source: S,
    session: AnalysisSession,
}
impl<S: ObservationSource> Replay<S> {
    pub fn new(source: S, session: AnalysisSession) -> Self {
        Self { source, session }
    }
    pub fn pump_once(&mut self) -> Result<Option<Pumped>, AnalysisError> {
        let Some(observation) = self.source.next_observation()? else {
            return Ok(None);
        };
        let pumped = match self
            .session
            .push_observation(observation.frame_index, observation.y_pixel)?
        {
            Some(estimate) => Pumped::Estimate(estimate),
            None => Pumped::Sample,
        };
        Ok(Some(pumped))
    }
    /// Drain the source; returns every estimate produced along the way.
    pub fn run_to_end(&mut self) -> Result<Vec<ChargeEstimate>, AnalysisError> {
        let mut estimates = Vec::new();
        while let Some(pumped) = self.pump_once()? {
            if let Pumped::Estimate(estimate) = pumped {
                estimates.push(estimate);
            }
        }
        Ok(estimates)
    }
    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }
    pub fn session_mut(&mut self) -> &mut AnalysisSession {
        &mut self.session
    }
    pub fn into_session(self) -> AnalysisSession {
        self.session
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::source::ManualSource;
    use crate::analysis::Observation;
    fn triangle_px(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let phase = (i % 400) as f64;
                if phase < 200.0 {
                    100.0 + phase * 1.5
                } else {
                    100.0 + (400.0 - phase) * 1.5
                }
            })
            .collect()
    }
    fn series_of(px: &[f64]) -> NormalizedSeries {
        let obs: Vec<_> = px
            .iter()
            .enumerate()
            .map(|(i, &y)| Observation::new(i as u64 + 1, y))
            .collect();
        let mut series = NormalizedSeries::new();
        series.extend_normalized(&obs, 512.0);
        series
    }
    #[test]
    fn pipeline_runs_all_stages() {
        let pipeline = ChargePipeline::new(&SessionConfig::default()).unwrap();
        let run = pipeline.process(&series_of(&triangle_px(800)));
        assert_eq!(run.extrema.peaks, vec![200, 600]);
        let estimate = run.estimate.unwrap();
        let v = 1.5 * 30.0 / 414.20 * 1e-3;
        let (charge, _) = pipeline.model().charge_and_multiple(v, v).unwrap();
        assert!(((estimate.charge - charge) / charge).abs() < 1e-9);
        assert_eq!(estimate.series_len, 800);
    }
    #[test]
    fn short_series_keeps_extrema_without_estimate() {
        let pipeline = ChargePipeline::new(&SessionConfig::default()).unwrap();
        let run = pipeline.process(&series_of(&triangle_px(250)));
        assert!(run.extrema.troughs.contains(&0));
        assert!(run.estimate.unwrap_err().is_insufficient_data());
    }
    #[test]
    fn replay_pumps_source_into_session() {
        let source = ManualSource::from_positions(triangle_px(800));
        let session = AnalysisSession::new(SessionConfig::default()).unwrap();
        let mut replay = Replay::new(source, session);
        assert_eq!(replay.pump_once().unwrap(), Some(Pumped::Sample));
        let estimates = replay.run_to_end().unwrap();
        assert!(!estimates.is_empty());
        assert_eq!(replay.pump_once().unwrap(), None);
        let session = replay.into_session();
        assert_eq!(session.series().len(), 800);
        assert_eq!(session.history().len(), estimates.len());
    }
}
