//! Kinematic matrices relating natural quantities to section quantities
//!
//! With ξ = x/L the transverse displacement field is the cubic Hermite
//! interpolation of the end rotations,
//!
//! w(ξ) = L(ξ - 2ξ² + ξ³)·v1 + L(ξ³ - ξ²)·v2,
//!
//! its slope is θ(ξ) = A(ξ)·v1 + B(ξ)·v2 and its curvature
//! κ(ξ) = E(ξ)·v1 + F(ξ)·v2. The axial strain adds the second-order term ½θ²
//! unless the element is geometrically linear. Section forces follow from
//! the natural forces q = [N, Mi, Mj] through M(ξ) = (ξ - 1)·Mi + ξ·Mj + N·w(ξ).

use crate::math::{Mat23, Mat3, Vec2, Vec3};

/// Shape-function values at one section
#[derive(Debug, Clone, Copy)]
struct Shape {
    xi: f64,
    /// Slope coefficients
    a: f64,
    b: f64,
    /// Curvature coefficients
    e: f64,
    f: f64,
    /// Transverse displacement coefficients
    w1: f64,
    w2: f64,
}

/// Kinematic matrices of one section for the current natural state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionKinematics {
    /// Compatibility: section deformation rate per natural displacement rate
    pub nld_hat: Mat23,
    /// Section deformation implied by the natural displacements
    pub d_hat: Vec2,
    /// Equilibrium: section forces from natural forces
    pub nd1: Mat23,
    /// Sensitivity of the section forces to the natural displacements
    pub nd2: Mat23,
}

impl SectionKinematics {
    pub fn zeros() -> Self {
        Self {
            nld_hat: Mat23::zeros(),
            d_hat: Vec2::zeros(),
            nd1: Mat23::zeros(),
            nd2: Mat23::zeros(),
        }
    }
}

/// Builds the kinematic matrices from the integration-point layout
///
/// Every method is a pure function of the section index, the natural
/// displacement estimate, the axial force and the length.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicBuilder {
    locations: Vec<f64>,
    weights: Vec<f64>,
    geom_linear: bool,
}

impl KinematicBuilder {
    /// # Arguments
    /// * `locations` - Section locations ξ in [0, 1]
    /// * `weights` - Section weights as fractions of the length
    /// * `geom_linear` - Drop all second-order terms
    pub fn new(locations: Vec<f64>, weights: Vec<f64>, geom_linear: bool) -> Self {
        Self {
            locations,
            weights,
            geom_linear,
        }
    }

    pub fn locations(&self) -> &[f64] {
        &self.locations
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn is_geom_linear(&self) -> bool {
        self.geom_linear
    }

    /// Integration weight of a section for an element of the given length
    pub fn weight(&self, sec: usize, length: f64) -> f64 {
        self.weights[sec] * length
    }

    fn shape(&self, sec: usize, length: f64) -> Shape {
        let xi = self.locations[sec];
        let xi2 = xi * xi;
        let xi3 = xi2 * xi;
        Shape {
            xi,
            a: 1.0 - 4.0 * xi + 3.0 * xi2,
            b: -2.0 * xi + 3.0 * xi2,
            e: (6.0 * xi - 4.0) / length,
            f: (6.0 * xi - 2.0) / length,
            w1: length * (xi - 2.0 * xi2 + xi3),
            w2: length * (xi3 - xi2),
        }
    }

    /// Linearized compatibility matrix ∂d_hat/∂v
    pub fn nld_hat(&self, sec: usize, v: &Vec3, length: f64) -> Mat23 {
        let s = self.shape(sec, length);
        let c = 1.0 / length;

        if self.geom_linear {
            return Mat23::new(c, 0.0, 0.0, 0.0, s.e, s.f);
        }

        let theta = s.a * v[1] + s.b * v[2];
        Mat23::new(c, s.a * theta, s.b * theta, 0.0, s.e, s.f)
    }

    /// Section deformation [ε, κ] implied by the natural displacements
    pub fn d_hat(&self, sec: usize, v: &Vec3, length: f64) -> Vec2 {
        let s = self.shape(sec, length);
        let curvature = s.e * v[1] + s.f * v[2];
        let mut strain = v[0] / length;

        if !self.geom_linear {
            let theta = s.a * v[1] + s.b * v[2];
            strain += 0.5 * theta * theta;
        }

        Vec2::new(strain, curvature)
    }

    /// Equilibrium interpolation of section forces from natural forces
    pub fn nd1(&self, sec: usize, v: &Vec3, length: f64) -> Mat23 {
        let s = self.shape(sec, length);
        let w = if self.geom_linear {
            0.0
        } else {
            s.w1 * v[1] + s.w2 * v[2]
        };
        Mat23::new(1.0, 0.0, 0.0, w, s.xi - 1.0, s.xi)
    }

    /// Change of the section moment with the natural displacements under axial force `p`
    pub fn nd2(&self, sec: usize, p: f64, length: f64) -> Mat23 {
        if self.geom_linear || p == 0.0 {
            return Mat23::zeros();
        }
        let s = self.shape(sec, length);
        Mat23::new(0.0, 0.0, 0.0, 0.0, p * s.w1, p * s.w2)
    }

    /// Geometric stiffness density P·[0, A, B]ᵀ[0, A, B] at a section
    pub fn kg(&self, sec: usize, p: f64, length: f64) -> Mat3 {
        if self.geom_linear || p == 0.0 {
            return Mat3::zeros();
        }
        let s = self.shape(sec, length);
        Mat3::new(
            0.0, 0.0, 0.0,
            0.0, p * s.a * s.a, p * s.a * s.b,
            0.0, p * s.a * s.b, p * s.b * s.b,
        )
    }

    /// Derivative of Nd1ᵀ·r with respect to v for a deformation residual r
    pub fn md(&self, sec: usize, residual: &Vec2, length: f64) -> Mat3 {
        if self.geom_linear {
            return Mat3::zeros();
        }
        let s = self.shape(sec, length);
        let r1 = residual[1];
        Mat3::new(
            0.0, r1 * s.w1, r1 * s.w2,
            0.0, 0.0, 0.0,
            0.0, 0.0, 0.0,
        )
    }

    /// All displacement-dependent matrices of a section at once
    pub fn section(&self, sec: usize, v: &Vec3, p: f64, length: f64) -> SectionKinematics {
        SectionKinematics {
            nld_hat: self.nld_hat(sec, v, length),
            d_hat: self.d_hat(sec, v, length),
            nd1: self.nd1(sec, v, length),
            nd2: self.nd2(sec, p, length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn builder(geom_linear: bool) -> KinematicBuilder {
        KinematicBuilder::new(vec![0.0, 0.3, 0.5, 1.0], vec![0.25; 4], geom_linear)
    }

    #[test]
    fn test_zero_axial_force_has_no_geometric_terms() {
        let kin = builder(false);
        for sec in 0..4 {
            assert_eq!(kin.nd2(sec, 0.0, 2.0), Mat23::zeros());
            assert_eq!(kin.kg(sec, 0.0, 2.0), Mat3::zeros());
        }
    }

    #[test]
    fn test_geom_linear_drops_second_order_terms() {
        let kin = builder(true);
        let v = Vec3::new(0.001, 0.02, -0.01);
        let lin = kin.nld_hat(1, &v, 2.0);
        assert_relative_eq!(lin[(0, 1)], 0.0);
        assert_relative_eq!(kin.nd1(1, &v, 2.0)[(1, 0)], 0.0);
        assert_eq!(kin.kg(1, 100.0, 2.0), Mat3::zeros());
        assert_relative_eq!(kin.d_hat(1, &v, 2.0)[0], 0.0005, epsilon = 1e-15);
    }

    #[test]
    fn test_end_curvatures_and_moments() {
        let kin = builder(true);
        let l = 2.0;
        // Double curvature θi = θj = θ gives κ = (12ξ - 6)θ/L
        let v = Vec3::new(0.0, 0.01, 0.01);
        assert_relative_eq!(kin.d_hat(0, &v, l)[1], -0.03, epsilon = 1e-15);
        assert_relative_eq!(kin.d_hat(3, &v, l)[1], 0.03, epsilon = 1e-15);

        // Moment at the ends equals -Mi and Mj
        let q = Vec3::new(0.0, 5.0, 7.0);
        assert_relative_eq!((kin.nd1(0, &v, l) * q)[1], -5.0, epsilon = 1e-15);
        assert_relative_eq!((kin.nd1(3, &v, l) * q)[1], 7.0, epsilon = 1e-15);
    }

    #[test]
    fn test_nld_hat_is_derivative_of_d_hat() {
        let kin = builder(false);
        let l = 3.0;
        let v = Vec3::new(0.002, 0.03, -0.015);
        let h = 1e-7;

        for sec in 0..4 {
            let jac = kin.nld_hat(sec, &v, l);
            for k in 0..3 {
                let mut vp = v;
                let mut vm = v;
                vp[k] += h;
                vm[k] -= h;
                let fd = (kin.d_hat(sec, &vp, l) - kin.d_hat(sec, &vm, l)) / (2.0 * h);
                assert_relative_eq!(jac[(0, k)], fd[0], epsilon = 1e-7);
                assert_relative_eq!(jac[(1, k)], fd[1], epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn test_nd2_is_derivative_of_section_force() {
        let kin = builder(false);
        let l = 3.0;
        let v = Vec3::new(0.0, 0.03, -0.015);
        let q = Vec3::new(-40.0, 3.0, 2.0);
        let h = 1e-6;

        let nd2 = kin.nd2(1, q[0], l);
        for k in 1..3 {
            let mut vp = v;
            vp[k] += h;
            let fd = (kin.nd1(1, &vp, l) * q - kin.nd1(1, &v, l) * q) / h;
            assert_relative_eq!(nd2[(1, k)], fd[1], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_integrated_kg_matches_consistent_geometric_stiffness() {
        // Five-point Lobatto integrates the quartic A² exactly: 2PL/15 on the diagonal
        let xi = vec![0.0, 0.5 - 21.0_f64.sqrt() / 14.0, 0.5, 0.5 + 21.0_f64.sqrt() / 14.0, 1.0];
        let w = vec![0.05, 49.0 / 180.0, 16.0 / 45.0, 49.0 / 180.0, 0.05];
        let kin = KinematicBuilder::new(xi, w, false);
        let (p, l) = (-10.0, 4.0);

        let mut kg = Mat3::zeros();
        for sec in 0..5 {
            kg += kin.kg(sec, p, l) * kin.weight(sec, l);
        }
        assert_relative_eq!(kg[(1, 1)], 2.0 * p * l / 15.0, epsilon = 1e-12);
        assert_relative_eq!(kg[(1, 2)], -p * l / 30.0, epsilon = 1e-12);
    }
}
