//! Stokes-law charge model for a droplet balanced between capacitor plates.
//!
//! The falling terminal velocity fixes the droplet radius (with the Cunningham
//! slip correction applied to the air viscosity), the radius fixes its mass, and
//! the rising velocity under the field adds the drag term:
//! `q = (m g + 6 pi eta r v_up) / E`.
use std::f64::consts::PI;
use serde::Serialize;
use crate::analysis::config::ApparatusConstants;
use crate::analysis::velocity::VelocityPair;
use crate::analysis::AnalysisError;
/// Elementary charge in coulombs.
pub const ELEMENTARY_CHARGE: f64 = 1.602176634e-19;
/// Air viscosity at 21 °C (Pa·s).
const VISCOSITY_AT_21C: f64 = 1.8228e-5;
/// Viscosity change per °C around 21 °C.
const VISCOSITY_PER_DEGREE: f64 = 4.790e-8;
/// Slip-correction constant (m·Torr).
const SLIP_CORRECTION: f64 = 5.908e-5;
/// Intermediate droplet quantities behind one charge value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DropletProperties {
    pub viscosity_uncorrected: f64,
    pub viscosity: f64,
    pub radius_m: f64,
    pub mass_kg: f64,
    pub field_v_per_m: f64,
}
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChargeEstimate {
    pub charge: f64,
    pub electron_multiple: f64,
    pub velocities: VelocityPair,
    /// Length of the normalized series this estimate was computed from.
    pub series_len: usize,
}
#[derive(Clone, Debug)]
pub struct ChargeModel {
    constants: ApparatusConstants,
}
impl ChargeModel {
    pub fn new(constants: ApparatusConstants) -> Result<Self, AnalysisError> {
        constants.validate()?;
        Ok(Self { constants })
    }
    pub fn constants(&self) -> &ApparatusConstants {
        &self.constants
    }
    fn check(v_up: f64, v_down: f64) -> Result<(), AnalysisError> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(v_down) || !usable(v_up) {
            return Err(AnalysisError::InvalidVelocity { v_down, v_up });
        }
        Ok(())
    }
    /// Air viscosity after the slip correction for a droplet falling at `v_down`.
    pub fn corrected_viscosity(&self, v_down: f64) -> Result<(f64, f64), AnalysisError> {
        if !(v_down.is_finite() && v_down > 0.0) {
            return Err(AnalysisError::InvalidVelocity {
                v_down,
                v_up: f64::NAN,
            });
        }
        let c = &self.constants;
        let eta_0 = VISCOSITY_AT_21C + VISCOSITY_PER_DEGREE * (c.room_temp_c - 21.0);
        let radius_uncorrected = self.radius(v_down, eta_0);
        let correction = 1.0 + SLIP_CORRECTION / (radius_uncorrected * c.pressure_torr);
        Ok((eta_0, eta_0 / correction))
    }
    fn radius(&self, v_down: f64, viscosity: f64) -> f64 {
        let c = &self.constants;
        ((9.0 * viscosity * v_down) / (2.0 * c.oil_density_kg_m3 * c.gravity_m_s2)).sqrt()
    }
    pub fn droplet(&self, v_up: f64, v_down: f64) -> Result<DropletProperties, AnalysisError> {
        Self::check(v_up, v_down)?;
        let (viscosity_uncorrected, viscosity) = self.corrected_viscosity(v_down)?;
        let radius_m = self.radius(v_down, viscosity);
        let mass_kg = self.constants.oil_density_kg_m3 * 4.0 * PI * radius_m.powi(3) / 3.0;
        Ok(DropletProperties {
            viscosity_uncorrected,
            viscosity,
            radius_m,
            mass_kg,
            field_v_per_m: self.constants.field_strength(),
        })
    }
    /// Net charge in coulombs and its ratio to the elementary charge.
    pub fn charge_and_multiple(&self, v_up: f64, v_down: f64) -> Result<(f64, f64), AnalysisError> {
        let d = self.droplet(v_up, v_down)?;
        let g = self.constants.gravity_m_s2;
        let charge =
            (d.mass_kg * g + 6.0 * PI * d.viscosity * d.radius_m * v_up) / d.field_v_per_m;
        if !charge.is_finite() {
            return Err(AnalysisError::InvalidVelocity { v_down, v_up });
        }
        Ok((charge, charge / ELEMENTARY_CHARGE))
    }
    pub fn process(
        &self,
        velocities: VelocityPair,
        series_len: usize,
    ) -> Result<ChargeEstimate, AnalysisError> {
        let (charge, electron_multiple) =
            self.charge_and_multiple(velocities.v_up(), velocities.v_down())?;
        Ok(ChargeEstimate {
            charge,
            electron_multiple,
            velocities,
            series_len,
        })
    }
}
