use std::collections::VecDeque;
use std::io::BufRead;
use serde::{Deserialize, Serialize};
use crate::analysis::AnalysisError;
/// One tracked droplet position: the frame it was seen in and the vertical
/// centre of the tracking box in display pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub frame_index: u64,
    pub y_pixel: f64,
}
impl Observation {
    pub fn new(frame_index: u64, y_pixel: f64) -> Self {
        Self {
            frame_index,
            y_pixel,
        }
    }
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.y_pixel.is_finite() {
            return Err(AnalysisError::InvalidObservation {
                frame_index: self.frame_index,
            });
        }
        Ok(())
    }
}
/// Trait representing something that can yield observations on demand.
pub trait ObservationSource {
    fn next_observation(&mut self) -> Result<Option<Observation>, AnalysisError>;
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<Observation>,
}
impl ManualSource {
    pub fn new(observations: impl IntoIterator<Item = Observation>) -> Self {
        Self {
            queue: observations.into_iter().collect(),
        }
    }
    /// Frames numbered from 1, one per sample, like a tracker stepping a video.
    pub fn from_positions(positions: impl IntoIterator<Item = f64>) -> Self {
        Self::new(
            positions
                .into_iter()
                .enumerate()
                .map(|(i, y)| Observation::new(i as u64 + 1, y)),
        )
    }
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}
impl ObservationSource for ManualSource {
    fn next_observation(&mut self) -> Result<Option<Observation>, AnalysisError> {
        Ok(self.queue.pop_front())
    }
}
/// Reads `frame,y` lines. Blank lines, `#` comments and a non-numeric header
/// on the first line are skipped.
pub struct CsvSource<R: BufRead> {
    reader: R,
    line_number: usize,
    line: String,
}
impl<R: BufRead> CsvSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            line: String::new(),
        }
    }
}
impl<R: BufRead> ObservationSource for CsvSource<R> {
    fn next_observation(&mut self) -> Result<Option<Observation>, AnalysisError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let trimmed = self.line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match parse_line(trimmed) {
                Ok(observation) => return Ok(Some(observation)),
                Err(_) if self.line_number == 1 && is_header(trimmed) => continue,
                Err(message) => {
                    return Err(AnalysisError::Parse {
                        line: self.line_number,
                        message,
                    })
                }
            }
        }
    }
}
fn parse_line(line: &str) -> Result<Observation, String> {
    let mut fields = line.split(',').map(str::trim);
    let (Some(frame), Some(y), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(format!("expected `frame,y`, got `{line}`"));
    };
    let frame_index = frame
        .parse::<u64>()
        .map_err(|e| format!("bad frame index `{frame}`: {e}"))?;
    let y_pixel = y
        .parse::<f64>()
        .map_err(|e| format!("bad y position `{y}`: {e}"))?;
    Ok(Observation::new(frame_index, y_pixel))
}
fn is_header(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_alphabetic())
}
