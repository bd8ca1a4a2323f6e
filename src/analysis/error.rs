use thiserror::Error;
use crate::analysis::velocity::SlopeSign;
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid velocities: v_down={v_down}, v_up={v_up}; both must be greater than zero")]
    InvalidVelocity { v_down: f64, v_up: f64 },
    #[error("no {missing} segments detected yet")]
    EmptyExtremumSet { missing: SlopeSign },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("observation at frame {frame_index} has a non-finite y position")]
    InvalidObservation { frame_index: u64 },
    #[error("frame index must increase: last accepted {last}, got {got}")]
    NonMonotonicFrame { last: u64, got: u64 },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl AnalysisError {
    /// True for the batch-level failures that only mean "not enough data yet".
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidVelocity { .. } | AnalysisError::EmptyExtremumSet { .. }
        )
    }
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for AnalysisError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        AnalysisError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for AnalysisError {
    fn from(value: image::ImageError) -> Self {
        AnalysisError::Plot(value.to_string())
    }
}
