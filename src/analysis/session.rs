use log::{debug, info, warn};
use crate::analysis::buffer::{NormalizedSeries, SampleBuffer};
use crate::analysis::charge::ChargeEstimate;
use crate::analysis::config::SessionConfig;
use crate::analysis::error::AnalysisError;
use crate::analysis::extrema::Extrema;
use crate::analysis::history::EstimateHistory;
use crate::analysis::pipeline::ChargePipeline;
use crate::analysis::source::Observation;
#[derive(Clone, Copy, Debug, PartialEq)]
enum Placement {
    /// Still in the sample buffer.
    Pending,
    /// Flushed into the normalized series. `recorded_estimate` marks the
    /// observation whose flush appended an estimate to the history.
    Committed { recorded_estimate: bool },
}
#[derive(Clone, Copy, Debug)]
struct LogEntry {
    observation: Observation,
    placement: Placement,
}
/// All state for one analysed video. Observations go in one at a time; every
/// full batch is flushed and the whole series re-analysed.
///
/// Each accepted observation leaves an entry in an undo log saying where it
/// ended up, so stepping backward is just popping that log.
pub struct AnalysisSession {
    config: SessionConfig,
    pipeline: ChargePipeline,
    buffer: SampleBuffer,
    series: NormalizedSeries,
    history: EstimateHistory,
    log: Vec<LogEntry>,
}
impl AnalysisSession {
    pub fn new(config: SessionConfig) -> Result<Self, AnalysisError> {
        let pipeline = ChargePipeline::new(&config)?;
        Ok(Self {
            buffer: SampleBuffer::with_batch_size(config.batch_size),
            pipeline,
            config,
            series: NormalizedSeries::new(),
            history: EstimateHistory::new(),
            log: Vec::new(),
        })
    }
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
    pub fn series(&self) -> &NormalizedSeries {
        &self.series
    }
    pub fn history(&self) -> &EstimateHistory {
        &self.history
    }
    pub fn latest_estimate(&self) -> Option<&ChargeEstimate> {
        self.history.latest()
    }
    /// Number of observations currently accepted (pending plus flushed).
    pub fn observation_count(&self) -> usize {
        self.log.len()
    }
    pub fn last_frame(&self) -> Option<u64> {
        self.log.last().map(|entry| entry.observation.frame_index)
    }
    /// Extrema of the current normalized series.
    pub fn extrema(&self) -> Extrema {
        self.pipeline.detector().process(&self.series)
    }
    /// Accept one tracked position. Returns the new estimate when this
    /// observation completed a batch and the series yielded one.
    pub fn push_observation(
        &mut self,
        frame_index: u64,
        y_pixel: f64,
    ) -> Result<Option<ChargeEstimate>, AnalysisError> {
        let observation = Observation::new(frame_index, y_pixel);
        if let Err(err) = self.check(&observation) {
            warn!("rejected observation: {err}");
            return Err(err);
        }
        self.buffer.add(observation);
        self.log.push(LogEntry {
            observation,
            placement: Placement::Pending,
        });
        if !self.buffer.is_full() {
            return Ok(None);
        }
        self.flush()
    }
    fn check(&self, observation: &Observation) -> Result<(), AnalysisError> {
        observation.validate()?;
        match self.last_frame() {
            Some(last) if observation.frame_index <= last => Err(AnalysisError::NonMonotonicFrame {
                last,
                got: observation.frame_index,
            }),
            _ => Ok(()),
        }
    }
    fn flush(&mut self) -> Result<Option<ChargeEstimate>, AnalysisError> {
        let flushed = self
            .buffer
            .drain_normalized(self.config.display_height, &mut self.series);
        let start = self.log.len() - flushed;
        for entry in &mut self.log[start..] {
            entry.placement = Placement::Committed {
                recorded_estimate: false,
            };
        }
        let run = self.pipeline.process(&self.series);
        match run.estimate {
            Ok(estimate) => {
                info!(
                    "frame {:?}: q = {:.3e} C ({:.2} e) from {} samples",
                    self.last_frame(),
                    estimate.charge,
                    estimate.electron_multiple,
                    estimate.series_len
                );
                self.history.push(estimate);
                if let Some(entry) = self.log.last_mut() {
                    entry.placement = Placement::Committed {
                        recorded_estimate: true,
                    };
                }
                Ok(Some(estimate))
            }
            Err(err) if err.is_insufficient_data() => {
                debug!(
                    "no estimate after {} samples ({} peaks, {} troughs): {err}",
                    self.series.len(),
                    run.extrema.peaks.len(),
                    run.extrema.troughs.len()
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
    /// Undo the most recent observation. Stepping back over the observation
    /// that completed a batch also drops the estimate that batch produced.
    pub fn pop_last(&mut self) -> Option<Observation> {
        let entry = self.log.pop()?;
        match entry.placement {
            Placement::Pending => {
                self.buffer.remove_last();
            }
            Placement::Committed { recorded_estimate } => {
                self.series.pop();
                if recorded_estimate {
                    self.history.pop();
                }
            }
        }
        Some(entry.observation)
    }
    /// Drop everything; used when a different source is selected.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.series.clear();
        self.history.clear();
        self.log.clear();
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
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
    fn session() -> AnalysisSession {
        AnalysisSession::new(SessionConfig::default()).unwrap()
    }
    fn feed(session: &mut AnalysisSession, px: &[f64]) -> Vec<ChargeEstimate> {
        let start = session.last_frame().unwrap_or(0) + 1;
        px.iter()
            .enumerate()
            .filter_map(|(i, &y)| session.push_observation(start + i as u64, y).unwrap())
            .collect()
    }
    #[test]
    fn push_then_pop_before_flush_restores_state() {
        let mut s = session();
        feed(&mut s, &triangle_px(120));
        let (pending, series_len) = (s.pending_len(), s.series().len());
        assert_eq!((pending, series_len), (20, 100));
        s.push_observation(121, 250.0).unwrap();
        assert_eq!(s.pop_last(), Some(Observation::new(121, 250.0)));
        assert_eq!(s.pending_len(), pending);
        assert_eq!(s.series().len(), series_len);
        assert_eq!(s.last_frame(), Some(120));
    }
    #[test]
    fn flush_happens_every_batch() {
        let mut s = session();
        feed(&mut s, &triangle_px(49));
        assert_eq!(s.series().len(), 0);
        feed(&mut s, &[200.0]);
        assert_eq!(s.series().len(), 50);
        assert_eq!(s.pending_len(), 0);
        assert_eq!(s.series().values()[0], 100.0 / 512.0);
    }
    #[test]
    fn estimates_appear_once_both_legs_are_seen() {
        let mut s = session();
        let estimates = feed(&mut s, &triangle_px(800));
        // first full rise and fall is visible at the 300-sample flush
        assert_eq!(estimates[0].series_len, 300);
        assert_eq!(s.history().len(), estimates.len());
        let last = s.latest_estimate().unwrap();
        assert_eq!(last.series_len, 800);
        assert!(s.history().electron_count().is_some());
    }
    #[test]
    fn stepping_back_over_a_batch_drops_its_estimate() {
        let mut s = session();
        feed(&mut s, &triangle_px(350));
        let produced = s.history().len();
        assert!(produced >= 2);
        // step back into the batch that ended at 350
        s.pop_last();
        assert_eq!(s.series().len(), 349);
        assert_eq!(s.history().len(), produced - 1);
        // further steps inside the same batch leave history alone
        for _ in 0..49 {
            s.pop_last();
        }
        assert_eq!(s.series().len(), 300);
        assert_eq!(s.history().len(), produced - 1);
        // crossing the next boundary drops the 300-sample estimate
        s.pop_last();
        assert_eq!(s.history().len(), produced - 2);
        assert_eq!(s.observation_count(), 299);
    }
    #[test]
    fn stepping_back_over_batches_without_estimates_keeps_history() {
        let mut s = session();
        let px = triangle_px(350);
        feed(&mut s, &px);
        let produced = s.history().len();
        for _ in 0..100 {
            s.pop_last();
        }
        assert_eq!(s.series().len(), 250);
        assert_eq!(s.history().len(), produced - 2);
        // batches ending at 250, 200, ... 50 flushed without an estimate
        for committed in (0..250).rev() {
            s.pop_last();
            assert_eq!(s.series().len(), committed);
            assert_eq!(s.history().len(), produced - 2);
        }
        assert_eq!(s.observation_count(), 0);
        let mut fresh = session();
        let replayed: Vec<_> = feed(&mut s, &px).iter().map(|e| e.series_len).collect();
        let expected: Vec<_> = feed(&mut fresh, &px).iter().map(|e| e.series_len).collect();
        assert_eq!(replayed, expected);
        assert_eq!(s.history().len(), produced - 2 + expected.len());
    }
    #[test]
    fn new_samples_after_rewind_fill_a_fresh_batch() {
        let mut s = session();
        feed(&mut s, &triangle_px(100));
        for _ in 0..10 {
            s.pop_last();
        }
        assert_eq!((s.pending_len(), s.series().len()), (0, 90));
        feed(&mut s, &triangle_px(49));
        assert_eq!(s.pending_len(), 49);
        feed(&mut s, &[120.0]);
        assert_eq!((s.pending_len(), s.series().len()), (0, 140));
    }
    #[test]
    fn out_of_order_frames_are_rejected_without_side_effects() {
        let mut s = session();
        s.push_observation(5, 100.0).unwrap();
        let err = s.push_observation(5, 101.0).unwrap_err();
        assert!(matches!(err, AnalysisError::NonMonotonicFrame { last: 5, got: 5 }));
        assert!(s.push_observation(6, f64::INFINITY).is_err());
        assert_eq!(s.observation_count(), 1);
        assert_eq!(s.pending_len(), 1);
    }
    #[test]
    fn reset_clears_everything() {
        let mut s = session();
        feed(&mut s, &triangle_px(420));
        s.reset();
        assert_eq!(s.pending_len(), 0);
        assert!(s.series().is_empty());
        assert!(s.history().is_empty());
        assert_eq!(s.pop_last(), None);
        assert!(s.push_observation(1, 100.0).unwrap().is_none());
    }
    #[test]
    fn noisy_trajectory_stays_close_to_clean_estimate() {
        let mut clean = session();
        feed(&mut clean, &triangle_px(1200));
        let reference = clean.latest_estimate().unwrap().electron_multiple;
        let mut rng = StdRng::seed_from_u64(7);
        let noisy_px: Vec<f64> = triangle_px(1200)
            .into_iter()
            .map(|y| y + rng.gen_range(-2.0..2.0))
            .collect();
        let mut noisy = session();
        feed(&mut noisy, &noisy_px);
        let estimate = noisy.latest_estimate().unwrap().electron_multiple;
        assert!(((estimate - reference) / reference).abs() < 0.05);
    }
}
