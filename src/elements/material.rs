//! Uniaxial material laws used by fiber sections

use serde::{Deserialize, Serialize};

use crate::error::{ElementError, ElementResult};

/// Uniaxial stress-strain law
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Material {
    /// Linear elastic
    Elastic {
        /// Modulus of elasticity in Pa
        e: f64,
    },
    /// Bilinear elastoplastic law with kinematic hardening
    Bilinear {
        /// Modulus of elasticity in Pa
        e: f64,
        /// Yield strength in Pa
        fy: f64,
        /// Strain-hardening ratio (post-yield tangent / E)
        b: f64,
    },
}

/// Strain, stress and history variables at one material point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialState {
    pub strain: f64,
    pub stress: f64,
    pub tangent: f64,
    /// Accumulated plastic strain
    pub plastic_strain: f64,
    /// Center of the elastic range
    pub back_stress: f64,
}

impl Material {
    /// Linear elastic material
    pub fn elastic(e: f64) -> ElementResult<Self> {
        let material = Self::Elastic { e };
        material.validate()?;
        Ok(material)
    }

    /// Bilinear material with kinematic hardening
    pub fn bilinear(e: f64, fy: f64, b: f64) -> ElementResult<Self> {
        let material = Self::Bilinear { e, fy, b };
        material.validate()?;
        Ok(material)
    }

    /// Create a standard steel material (A36, 1% hardening)
    pub fn steel() -> Self {
        Self::Bilinear {
            e: 200e9,    // 200 GPa
            fy: 250e6,   // 250 MPa
            b: 0.01,
        }
    }

    /// Check material parameters
    pub fn validate(&self) -> ElementResult<()> {
        match *self {
            Self::Elastic { e } => {
                if !(e > 0.0) {
                    return Err(ElementError::InvalidMaterial(format!(
                        "elastic modulus must be positive, got {e}"
                    )));
                }
            }
            Self::Bilinear { e, fy, b } => {
                if !(e > 0.0) || !(fy > 0.0) {
                    return Err(ElementError::InvalidMaterial(format!(
                        "bilinear material needs E > 0 and fy > 0, got E = {e}, fy = {fy}"
                    )));
                }
                if !(0.0..1.0).contains(&b) {
                    return Err(ElementError::InvalidMaterial(format!(
                        "hardening ratio must lie in [0, 1), got {b}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn initial_tangent(&self) -> f64 {
        match *self {
            Self::Elastic { e } | Self::Bilinear { e, .. } => e,
        }
    }

    /// Virgin state at zero strain
    pub fn initial_state(&self) -> MaterialState {
        MaterialState {
            strain: 0.0,
            stress: 0.0,
            tangent: self.initial_tangent(),
            plastic_strain: 0.0,
            back_stress: 0.0,
        }
    }

    /// Trial state for a total strain, starting from the committed history
    pub fn trial_state(&self, committed: &MaterialState, strain: f64) -> MaterialState {
        match *self {
            Self::Elastic { e } => MaterialState {
                strain,
                stress: e * strain,
                tangent: e,
                ..*committed
            },
            Self::Bilinear { e, fy, b } => {
                // Kinematic hardening modulus giving a post-yield tangent of b*E
                let h = b * e / (1.0 - b);

                let trial_stress = e * (strain - committed.plastic_strain);
                let xi = trial_stress - committed.back_stress;
                let f = xi.abs() - fy;

                if f <= 0.0 {
                    return MaterialState {
                        strain,
                        stress: trial_stress,
                        tangent: e,
                        ..*committed
                    };
                }

                // Radial return
                let sign = xi.signum();
                let d_gamma = f / (e + h);
                MaterialState {
                    strain,
                    stress: trial_stress - e * d_gamma * sign,
                    tangent: e * h / (e + h),
                    plastic_strain: committed.plastic_strain + d_gamma * sign,
                    back_stress: committed.back_stress + h * d_gamma * sign,
                }
            }
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::steel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_steel_properties() {
        let steel = Material::steel();
        assert_eq!(steel.initial_tangent(), 200e9);
        assert!(steel.validate().is_ok());
    }

    #[test]
    fn test_invalid_material() {
        assert!(Material::elastic(0.0).is_err());
        assert!(Material::bilinear(200e9, 250e6, 1.0).is_err());
        assert!(Material::bilinear(200e9, -1.0, 0.01).is_err());
    }

    #[test]
    fn test_bilinear_yield_and_hardening() {
        let steel = Material::bilinear(200.0, 1.0, 0.1).unwrap();
        let start = steel.initial_state();

        // Elastic below yield strain 0.005
        let s = steel.trial_state(&start, 0.004);
        assert_relative_eq!(s.stress, 0.8, epsilon = 1e-12);
        assert_relative_eq!(s.tangent, 200.0, epsilon = 1e-12);

        // Post-yield: σ = fy + bE(ε - εy)
        let s = steel.trial_state(&start, 0.015);
        assert_relative_eq!(s.stress, 1.0 + 20.0 * 0.01, epsilon = 1e-12);
        assert_relative_eq!(s.tangent, 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bilinear_unloading_is_elastic() {
        let steel = Material::bilinear(200.0, 1.0, 0.1).unwrap();
        let loaded = steel.trial_state(&steel.initial_state(), 0.015);

        // Unload from the committed plastic state
        let unloaded = steel.trial_state(&loaded, 0.014);
        assert_relative_eq!(unloaded.tangent, 200.0, epsilon = 1e-12);
        assert_relative_eq!(unloaded.stress, loaded.stress - 0.2, epsilon = 1e-12);
    }
}
