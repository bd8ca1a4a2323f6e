// src/analysis/mod.rs
pub mod buffer;
pub mod charge;
pub mod config;
pub mod error;
pub mod extrema;
pub mod history;
pub mod pipeline;
pub mod plot;
pub mod session;
pub mod source;
pub mod velocity;
// Re-exported so callers can reach the pipeline types from one place
pub use buffer::{NormalizedSeries, SampleBuffer};
pub use charge::{ChargeEstimate, ChargeModel, DropletProperties, ELEMENTARY_CHARGE};
pub use config::{ApparatusConstants, Calibration, DetectorConfig, SessionConfig};
pub use error::AnalysisError;
pub use extrema::{Extrema, ExtremumDetector, ExtremumKind, ExtremumPoint};
pub use history::{EstimateHistory, MultipleHistogram};
pub use pipeline::{ChargePipeline, PipelineRun, Pumped, Replay};
pub use plot::{render_histogram_png, render_trace_png, PlotStyle};
pub use session::AnalysisSession;
pub use source::{CsvSource, ManualSource, Observation, ObservationSource};
pub use velocity::{SlopeSign, SlopeSummary, VelocityEstimator, VelocityPair};
