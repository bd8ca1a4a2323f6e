use serde::Serialize;
use crate::analysis::ChargeEstimate;
const HISTOGRAM_BINS: usize = 10;
/// Equal-width histogram of electron multiples. Only built by
/// [`EstimateHistory::histogram`], so there is always one more edge than bins.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MultipleHistogram {
    edges: Vec<f64>,
    counts: Vec<usize>,
}
impl MultipleHistogram {
    /// Bin edges, ascending.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
    /// `(lower edge, upper edge, count)` per bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(pair, &count)| (pair[0], pair[1], count))
    }
    /// Index of the most populated bin; the first one on ties.
    pub fn mode_bin(&self) -> Option<usize> {
        let max = *self.counts.iter().max()?;
        self.counts.iter().position(|&c| c == max)
    }
    pub fn bin_center(&self, bin: usize) -> Option<f64> {
        let lo = self.edges.get(bin)?;
        let hi = self.edges.get(bin + 1)?;
        Some((lo + hi) / 2.0)
    }
}
/// Estimates retained for display, oldest first.
#[derive(Clone, Debug, Default)]
pub struct EstimateHistory {
    estimates: Vec<ChargeEstimate>,
}
impl EstimateHistory {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, estimate: ChargeEstimate) {
        self.estimates.push(estimate);
    }
    pub fn pop(&mut self) -> Option<ChargeEstimate> {
        self.estimates.pop()
    }
    pub fn clear(&mut self) {
        self.estimates.clear();
    }
    pub fn len(&self) -> usize {
        self.estimates.len()
    }
    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }
    pub fn latest(&self) -> Option<&ChargeEstimate> {
        self.estimates.last()
    }
    pub fn iter(&self) -> impl Iterator<Item = &ChargeEstimate> {
        self.estimates.iter()
    }
    pub fn multiples(&self) -> Vec<f64> {
        self.estimates.iter().map(|e| e.electron_multiple).collect()
    }
    /// Ten equal bins spanning min..=max of the recorded multiples. `None`
    /// when the range is empty or zero-width.
    pub fn histogram(&self) -> Option<MultipleHistogram> {
        let multiples = self.multiples();
        let min = multiples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = multiples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(min.is_finite() && max.is_finite()) || max <= min {
            return None;
        }
        let width = (max - min) / HISTOGRAM_BINS as f64;
        let edges: Vec<f64> = (0..=HISTOGRAM_BINS)
            .map(|i| {
                if i == HISTOGRAM_BINS {
                    max
                } else {
                    min + width * i as f64
                }
            })
            .collect();
        let mut counts = vec![0usize; HISTOGRAM_BINS];
        for m in multiples {
            // The last bin is closed on the right.
            let bin = edges[1..HISTOGRAM_BINS]
                .iter()
                .take_while(|&&edge| m >= edge)
                .count();
            counts[bin] += 1;
        }
        Some(MultipleHistogram { edges, counts })
    }
    /// Electron count read off the histogram: centre of the mode bin, rounded.
    pub fn electron_count(&self) -> Option<i64> {
        if let Some(histogram) = self.histogram() {
            let bin = histogram.mode_bin()?;
            return histogram.bin_center(bin).map(|centre| centre.round() as i64);
        }
        self.latest().map(|e| e.electron_multiple.round() as i64)
    }
}
