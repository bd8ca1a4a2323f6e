use serde::{Deserialize, Serialize};
use crate::analysis::AnalysisError;
/// Frame rate and pixel-to-length calibration of the recording.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub fps: f64,
    pub px_per_mm: f64,
}
impl Default for Calibration {
    fn default() -> Self {
        Self {
            fps: 30.0,
            px_per_mm: 414.20,
        }
    }
}
impl Calibration {
    /// Convert a slope in detection pixels per frame to a speed in m/s.
    pub fn slope_to_m_per_s(&self, slope_px_per_frame: f64) -> f64 {
        (slope_px_per_frame * self.fps / self.px_per_mm).abs() * 1e-3
    }
    fn validate(&self) -> Result<(), AnalysisError> {
        require_positive("calibration.fps", self.fps)?;
        require_positive("calibration.px_per_mm", self.px_per_mm)
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Factor applied to the normalized series before detection so the
    /// thresholds below are in pixels.
    pub scale: f64,
    /// Minimum index separation between two extrema of the same kind.
    pub min_distance: usize,
    pub min_prominence: f64,
}
impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scale: 512.0,
            min_distance: 100,
            min_prominence: 100.0,
        }
    }
}
impl DetectorConfig {
    fn validate(&self) -> Result<(), AnalysisError> {
        require_positive("detector.scale", self.scale)?;
        if self.min_distance == 0 {
            return Err(AnalysisError::InvalidConfig(
                "detector.min_distance must be at least 1".into(),
            ));
        }
        if !self.min_prominence.is_finite() || self.min_prominence < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "detector.min_prominence must be a non-negative number, got {}",
                self.min_prominence
            )));
        }
        Ok(())
    }
}
const ABSOLUTE_ZERO_C: f64 = -273.15;
/// Fixed properties of the oil-drop apparatus.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApparatusConstants {
    pub voltage_v: f64,
    pub plate_distance_mm: f64,
    pub room_temp_c: f64,
    pub oil_density_kg_m3: f64,
    pub gravity_m_s2: f64,
    pub pressure_torr: f64,
}
impl Default for ApparatusConstants {
    fn default() -> Self {
        Self {
            voltage_v: 500.0,
            plate_distance_mm: 4.902,
            room_temp_c: 20.0,
            oil_density_kg_m3: 0.861e3,
            gravity_m_s2: 9.81,
            pressure_torr: 760.0,
        }
    }
}
impl ApparatusConstants {
    pub fn plate_distance_m(&self) -> f64 {
        self.plate_distance_mm * 1e-3
    }
    pub fn field_strength(&self) -> f64 {
        self.voltage_v / self.plate_distance_m()
    }
    pub fn validate(&self) -> Result<(), AnalysisError> {
        require_positive("apparatus.voltage_v", self.voltage_v)?;
        require_positive("apparatus.plate_distance_mm", self.plate_distance_mm)?;
        require_positive("apparatus.oil_density_kg_m3", self.oil_density_kg_m3)?;
        require_positive("apparatus.gravity_m_s2", self.gravity_m_s2)?;
        require_positive("apparatus.pressure_torr", self.pressure_torr)?;
        if !(self.room_temp_c.is_finite() && self.room_temp_c > ABSOLUTE_ZERO_C) {
            return Err(AnalysisError::InvalidConfig(format!(
                "apparatus.room_temp_c must be above {ABSOLUTE_ZERO_C} °C, got {}",
                self.room_temp_c
            )));
        }
        Ok(())
    }
}
/// Everything fixed at session start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub batch_size: usize,
    /// Height of the display the tracker reports pixel positions in.
    pub display_height: f64,
    pub detector: DetectorConfig,
    pub calibration: Calibration,
    pub apparatus: ApparatusConstants,
}
impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            display_height: 512.0,
            detector: DetectorConfig::default(),
            calibration: Calibration::default(),
            apparatus: ApparatusConstants::default(),
        }
    }
}
impl SessionConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let config: SessionConfig = serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.batch_size == 0 {
            return Err(AnalysisError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        require_positive("display_height", self.display_height)?;
        self.detector.validate()?;
        self.calibration.validate()?;
        self.apparatus.validate()
    }
}
fn require_positive(name: &str, value: f64) -> Result<(), AnalysisError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfig(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}
