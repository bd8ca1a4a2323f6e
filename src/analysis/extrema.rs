//! Peak and trough detection over the whole droplet trajectory.
//!
//! Peak candidates are filtered in three steps:
//! - local maxima, with flat tops reported at their (rounded-down) midpoint;
//!   the first and last samples never qualify;
//! - a minimum separation, where taller peaks suppress shorter neighbours;
//! - a minimum prominence, measured against the higher of the two lowest
//!   points reached before the signal climbs above the peak on either side.
//!
//! Troughs run the same steps on the negated signal. Afterwards the boundary
//! policy classifies the first and last samples so every trajectory starts on
//! a trough and ends on whichever kind closes the last segment.
use ndarray::{Array1, ArrayView1};
use serde::Serialize;
use crate::analysis::config::DetectorConfig;
use crate::analysis::NormalizedSeries;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ExtremumKind {
    Peak,
    Trough,
}
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ExtremumPoint {
    pub time_index: usize,
    /// Height in detection pixels.
    pub value: f64,
    pub kind: ExtremumKind,
}
/// Detection result for one pass over the series.
#[derive(Clone, Debug, PartialEq)]
pub struct Extrema {
    /// The series in detection pixels.
    pub scaled: Array1<f64>,
    pub peaks: Vec<usize>,
    pub troughs: Vec<usize>,
}
impl Extrema {
    pub fn peak_points(&self) -> Vec<ExtremumPoint> {
        self.points(&self.peaks, ExtremumKind::Peak)
    }
    pub fn trough_points(&self) -> Vec<ExtremumPoint> {
        self.points(&self.troughs, ExtremumKind::Trough)
    }
    fn points(&self, indices: &[usize], kind: ExtremumKind) -> Vec<ExtremumPoint> {
        indices
            .iter()
            .map(|&i| ExtremumPoint {
                time_index: i,
                value: self.scaled[i],
                kind,
            })
            .collect()
    }
}
#[derive(Clone, Debug)]
pub struct ExtremumDetector {
    config: DetectorConfig,
}
impl ExtremumDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
    pub fn process(&self, series: &NormalizedSeries) -> Extrema {
        let scaled = Array1::from(series.values().to_vec()) * self.config.scale;
        let (peaks, troughs) = self.detect(scaled.view());
        Extrema {
            scaled,
            peaks,
            troughs,
        }
    }
    /// Peak and trough indices of `y`, boundary policy applied.
    pub fn detect(&self, y: ArrayView1<f64>) -> (Vec<usize>, Vec<usize>) {
        let n = y.len();
        if n == 0 {
            return (Vec::new(), Vec::new());
        }
        let mut peaks = find_peaks(y, self.config.min_distance, self.config.min_prominence);
        let negated = y.mapv(|v| -v);
        let mut troughs = find_peaks(
            negated.view(),
            self.config.min_distance,
            self.config.min_prominence,
        );
        if !troughs.contains(&0) {
            troughs.insert(0, 0);
        }
        let last = n - 1;
        let ends_falling = matches!(
            (peaks.last(), troughs.last()),
            (Some(p), Some(t)) if p > t
        );
        if ends_falling {
            if !troughs.contains(&last) {
                troughs.push(last);
            }
        } else if !peaks.contains(&last) && !troughs.contains(&last) {
            peaks.push(last);
        }
        (peaks, troughs)
    }
}
fn find_peaks(x: ArrayView1<f64>, distance: usize, min_prominence: f64) -> Vec<usize> {
    let candidates = local_maxima(x);
    let spaced = select_by_distance(x, &candidates, distance);
    spaced
        .into_iter()
        .filter(|&peak| prominence(x, peak) >= min_prominence)
        .collect()
}
fn local_maxima(x: ArrayView1<f64>) -> Vec<usize> {
    let mut maxima = Vec::new();
    if x.len() < 3 {
        return maxima;
    }
    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && x[i_ahead] == x[i] {
                i_ahead += 1;
            }
            if x[i_ahead] < x[i] {
                let left = i;
                let right = i_ahead - 1;
                maxima.push((left + right) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }
    maxima
}
fn select_by_distance(x: ArrayView1<f64>, peaks: &[usize], distance: usize) -> Vec<usize> {
    let mut keep = vec![true; peaks.len()];
    let mut priority: Vec<usize> = (0..peaks.len()).collect();
    priority.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));
    for &j in priority.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }
    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}
fn prominence(x: ArrayView1<f64>, peak: usize) -> f64 {
    let height = x[peak];
    let mut left_min = height;
    let mut i = peak;
    loop {
        if x[i] > height {
            break;
        }
        left_min = left_min.min(x[i]);
        if i == 0 {
            break;
        }
        i -= 1;
    }
    let mut right_min = height;
    for &v in x.iter().skip(peak) {
        if v > height {
            break;
        }
        right_min = right_min.min(v);
    }
    height - left_min.max(right_min)
}
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;
    fn unit_detector(min_distance: usize, min_prominence: f64) -> ExtremumDetector {
        ExtremumDetector::new(DetectorConfig {
            scale: 1.0,
            min_distance,
            min_prominence,
        })
    }
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
    fn normalized(px: &[f64], scale: f64) -> NormalizedSeries {
        let mut series = NormalizedSeries::new();
        let obs: Vec<_> = px
            .iter()
            .enumerate()
            .map(|(i, &y)| crate::analysis::Observation::new(i as u64, y))
            .collect();
        series.extend_normalized(&obs, scale);
        series
    }
    #[test]
    fn triangle_wave_segments_into_rises_and_falls() {
        let detector = ExtremumDetector::new(DetectorConfig::default());
        let extrema = detector.process(&normalized(&triangle_px(800), 512.0));
        assert_eq!(extrema.peaks, vec![200, 600]);
        assert_eq!(extrema.troughs, vec![0, 400, 799]);
        let peaks = extrema.peak_points();
        assert_eq!(peaks[0].value, 400.0);
        assert_eq!(peaks[0].kind, ExtremumKind::Peak);
    }
    #[test]
    fn flat_top_reports_midpoint() {
        let y = arr1(&[0.0, 1.0, 3.0, 3.0, 3.0, 1.0, 0.0]);
        let (peaks, troughs) = unit_detector(1, 0.0).detect(y.view());
        assert_eq!(peaks, vec![3]);
        assert_eq!(troughs, vec![0, 6]);
    }
    #[test]
    fn taller_peak_suppresses_close_neighbour() {
        let y = arr1(&[0.0, 5.0, 0.0, 9.0, 0.0, 0.0, 0.0]);
        let (peaks, _) = unit_detector(3, 0.0).detect(y.view());
        assert_eq!(peaks, vec![3]);
        let (peaks, _) = unit_detector(2, 0.0).detect(y.view());
        assert_eq!(peaks, vec![1, 3]);
    }
    #[test]
    fn shallow_bump_fails_prominence() {
        let y = arr1(&[0.0, 10.0, 8.0, 9.0, 0.0]);
        assert_eq!(prominence(y.view(), 3), 1.0);
        assert_eq!(prominence(y.view(), 1), 10.0);
        let (peaks, _) = unit_detector(1, 5.0).detect(y.view());
        assert_eq!(peaks, vec![1]);
    }
    #[test]
    fn monotonic_series_only_has_boundary_points() {
        let y = Array1::from_iter((0..300).map(|i| i as f64 * 2.0));
        let (peaks, troughs) = unit_detector(100, 100.0).detect(y.view());
        assert_eq!(troughs, vec![0]);
        assert_eq!(peaks, vec![299]);
    }
    #[test]
    fn boundaries_are_classified_exactly_once() {
        let detector = ExtremumDetector::new(DetectorConfig::default());
        for len in [1usize, 2, 3, 150, 399, 400, 401, 650, 1000] {
            let extrema = detector.process(&normalized(&triangle_px(len), 512.0));
            let last = len - 1;
            for idx in [0, last] {
                let in_peaks = extrema.peaks.contains(&idx);
                let in_troughs = extrema.troughs.contains(&idx);
                assert!(in_peaks ^ in_troughs, "len {len}: index {idx} misclassified");
            }
        }
    }
    #[test]
    fn repeated_detection_is_identical() {
        let detector = ExtremumDetector::new(DetectorConfig::default());
        let series = normalized(&triangle_px(1234), 512.0);
        let first = detector.process(&series);
        let second = detector.process(&series);
        assert_eq!(first, second);
    }
    #[test]
    fn empty_series_has_no_extrema() {
        let detector = ExtremumDetector::new(DetectorConfig::default());
        let extrema = detector.process(&NormalizedSeries::new());
        assert!(extrema.peaks.is_empty());
        assert!(extrema.troughs.is_empty());
    }
}
