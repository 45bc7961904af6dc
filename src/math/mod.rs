//! Mathematical utilities for element state determination

use nalgebra::{Matrix2, Matrix3, Matrix6, SMatrix, Vector2, Vector3, Vector6};

/// Section force/deformation vector [N, M] / [axial strain, curvature]
pub type Vec2 = Vector2<f64>;
/// Section stiffness/flexibility
pub type Mat2 = Matrix2<f64>;
/// Natural (basic) displacement/force vector [u, θi, θj] / [N, Mi, Mj]
pub type Vec3 = Vector3<f64>;
/// Natural (basic) stiffness/flexibility
pub type Mat3 = Matrix3<f64>;
/// Element end displacement/force in local or global coordinates
pub type Vec6 = Vector6<f64>;
/// Element stiffness in local or global coordinates
pub type Mat6 = Matrix6<f64>;

/// 2x3 map from natural to section quantities
pub type Mat23 = SMatrix<f64, 2, 3>;
/// 3x6 compatibility matrix from local end displacements to natural displacements
pub type Mat36 = SMatrix<f64, 3, 6>;

/// Pivot threshold below which a matrix is treated as singular
pub const SINGULAR_TOL: f64 = 1e-300;

/// Invert a 2x2 section matrix, returning `None` when it is singular
///
/// Stiffness ↔ flexibility conversion of a section goes through here so that
/// a zero-stiffness section is caught before any division happens.
pub fn invert2(m: &Mat2) -> Option<Mat2> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() <= SINGULAR_TOL * m.norm().max(1.0) {
        return None;
    }
    m.try_inverse()
}

/// Invert a 3x3 natural matrix, returning `None` when it is singular
pub fn invert3(m: &Mat3) -> Option<Mat3> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() <= SINGULAR_TOL {
        return None;
    }
    m.try_inverse()
}

/// Build the 6x6 rotation from global to local end quantities
///
/// # Arguments
/// * `cos_x` - Direction cosine of the chord with global X
/// * `sin_x` - Direction cosine of the chord with global Y
pub fn rotation_matrix(cos_x: f64, sin_x: f64) -> Mat6 {
    let mut t = Mat6::zeros();

    // Fill the two 3x3 diagonal blocks
    for node in 0..2 {
        let o = node * 3;
        t[(o, o)] = cos_x;
        t[(o, o + 1)] = sin_x;
        t[(o + 1, o)] = -sin_x;
        t[(o + 1, o + 1)] = cos_x;
        t[(o + 2, o + 2)] = 1.0;
    }

    t
}

/// Compatibility matrix mapping local end displacements to natural displacements
///
/// v = [u_j - u_i, θ_i - (w_j - w_i)/L, θ_j - (w_j - w_i)/L]
pub fn basic_compatibility_matrix(length: f64) -> Mat36 {
    let one_over_l = 1.0 / length;

    #[rustfmt::skip]
    let data = [
        -1.0, 0.0,        0.0, 1.0, 0.0,         0.0,
         0.0, one_over_l, 1.0, 0.0, -one_over_l, 0.0,
         0.0, one_over_l, 0.0, 0.0, -one_over_l, 1.0,
    ];

    Mat36::from_row_slice(&data)
}

/// Relative asymmetry ‖K - Kᵀ‖ / ‖K‖ of a natural matrix
pub fn asymmetry(k: &Mat3) -> f64 {
    let norm = k.norm();
    if norm == 0.0 {
        return 0.0;
    }
    (k - k.transpose()).norm() / norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invert2_singular() {
        let zero = Mat2::zeros();
        assert!(invert2(&zero).is_none());

        let k = Mat2::new(4.0, 0.0, 0.0, 2.0);
        let f = invert2(&k).unwrap();
        assert_relative_eq!(f[(0, 0)], 0.25, epsilon = 1e-15);
        assert_relative_eq!(f[(1, 1)], 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_rotation_matrix_vertical() {
        let t = rotation_matrix(0.0, 1.0);
        let ug = Vec6::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let ul = t * ug;

        // Global X translation on a vertical member is a negative local transverse one
        assert_relative_eq!(ul[0], 0.0, epsilon = 1e-15);
        assert_relative_eq!(ul[1], -1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_compatibility_rigid_rotation_is_free() {
        let a = basic_compatibility_matrix(2.0);
        // Rigid rotation by 0.1 about node i
        let ul = Vec6::new(0.0, 0.0, 0.1, 0.0, 0.2, 0.1);
        let v = a * ul;
        assert_relative_eq!(v.norm(), 0.0, epsilon = 1e-15);
    }
}
