//! Charge estimation for the Millikan oil-drop experiment.
//!
//! A tracker reports the droplet's vertical position once per video frame;
//! [`AnalysisSession`] batches those positions, segments the trajectory into
//! rises and falls, and turns the median rise/fall speeds into a charge and
//! its multiple of the elementary charge.
pub mod analysis;
pub use analysis::{AnalysisError, AnalysisSession, ChargeEstimate, SessionConfig};
