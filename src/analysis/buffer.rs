use crate::analysis::Observation;
/// Droplet heights as a fraction of the display height, one entry per flushed
/// observation in frame order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedSeries {
    values: Vec<f64>,
}
impl NormalizedSeries {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn values(&self) -> &[f64] {
        &self.values
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    /// Rescale a slice of observations and append them.
    pub fn extend_normalized(&mut self, batch: &[Observation], height: f64) {
        self.values.reserve(batch.len());
        self.values
            .extend(batch.iter().map(|obs| obs.y_pixel / height));
    }
    pub fn pop(&mut self) -> Option<f64> {
        self.values.pop()
    }
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
/// Pending observations waiting for the next flush.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    pending: Vec<Observation>,
    batch_size: usize,
}
impl SampleBuffer {
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            pending: Vec::with_capacity(batch_size),
            batch_size,
        }
    }
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
    pub fn pending(&self) -> &[Observation] {
        &self.pending
    }
    pub fn len(&self) -> usize {
        self.pending.len()
    }
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
    pub fn add(&mut self, observation: Observation) {
        self.pending.push(observation);
    }
    pub fn is_full(&self) -> bool {
        self.pending.len() >= self.batch_size
    }
    /// Move every pending observation into `series`, divided by `height`.
    /// Returns how many entries were appended.
    pub fn drain_normalized(&mut self, height: f64, series: &mut NormalizedSeries) -> usize {
        let count = self.pending.len();
        series.extend_normalized(&self.pending, height);
        self.pending.clear();
        count
    }
    pub fn remove_last(&mut self) -> Option<Observation> {
        self.pending.pop()
    }
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn fills_and_drains_one_batch() {
        let mut buffer = SampleBuffer::with_batch_size(3);
        let mut series = NormalizedSeries::new();
        for i in 0..3 {
            assert!(!buffer.is_full());
            buffer.add(Observation::new(i + 1, 256.0));
        }
        assert!(buffer.is_full());
        assert_eq!(buffer.drain_normalized(512.0, &mut series), 3);
        assert!(buffer.is_empty());
        assert_eq!(series.values(), &[0.5, 0.5, 0.5]);
    }
    #[test]
    fn remove_last_only_touches_pending() {
        let mut buffer = SampleBuffer::with_batch_size(4);
        buffer.add(Observation::new(1, 10.0));
        buffer.add(Observation::new(2, 20.0));
        assert_eq!(buffer.remove_last(), Some(Observation::new(2, 20.0)));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.batch_size(), 4);
        buffer.clear();
        assert_eq!(buffer.remove_last(), None);
    }
}
