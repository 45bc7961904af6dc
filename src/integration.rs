//! Quadrature rules placing sections along the element
//!
//! Locations are returned as fractions ξ = x/L in [0, 1] and weights sum to
//! one; the element scales weights by its current length.

use std::f64::consts::PI;

/// Integration rule along the element axis
pub trait BeamIntegration: Send + Sync {
    /// Section locations ξ = x/L, ordered from node i to node j
    fn section_locations(&self, num_sections: usize, length: f64) -> Vec<f64>;

    /// Section weights (fractions of the length)
    fn section_weights(&self, num_sections: usize, length: f64) -> Vec<f64>;

    /// Rule name for summaries
    fn name(&self) -> &'static str;
}

/// Gauss-Lobatto rule (sections at both element ends)
#[derive(Debug, Clone, Copy, Default)]
pub struct Lobatto;

/// Gauss-Legendre rule (interior sections only)
#[derive(Debug, Clone, Copy, Default)]
pub struct Legendre;

impl BeamIntegration for Lobatto {
    fn section_locations(&self, num_sections: usize, _length: f64) -> Vec<f64> {
        gauss_lobatto(num_sections)
            .into_iter()
            .map(|(x, _)| 0.5 * (x + 1.0))
            .collect()
    }

    fn section_weights(&self, num_sections: usize, _length: f64) -> Vec<f64> {
        gauss_lobatto(num_sections)
            .into_iter()
            .map(|(_, w)| 0.5 * w)
            .collect()
    }

    fn name(&self) -> &'static str {
        "Lobatto"
    }
}

impl BeamIntegration for Legendre {
    fn section_locations(&self, num_sections: usize, _length: f64) -> Vec<f64> {
        gauss_legendre(num_sections)
            .into_iter()
            .map(|(x, _)| 0.5 * (x + 1.0))
            .collect()
    }

    fn section_weights(&self, num_sections: usize, _length: f64) -> Vec<f64> {
        gauss_legendre(num_sections)
            .into_iter()
            .map(|(_, w)| 0.5 * w)
            .collect()
    }

    fn name(&self) -> &'static str {
        "Legendre"
    }
}

const NEWTON_TOL: f64 = 1e-15;
const NEWTON_MAX_ITER: usize = 100;

/// Legendre polynomial P_m(x) and its predecessor P_{m-1}(x)
fn legendre_pair(m: usize, x: f64) -> (f64, f64) {
    let mut p_prev = 1.0;
    let mut p = x;
    if m == 0 {
        return (1.0, 0.0);
    }
    for k in 2..=m {
        let kf = k as f64;
        let p_next = ((2.0 * kf - 1.0) * x * p - (kf - 1.0) * p_prev) / kf;
        p_prev = p;
        p = p_next;
    }
    (p, p_prev)
}

/// First derivative of P_m for |x| < 1
fn legendre_derivative(m: usize, x: f64) -> f64 {
    let (p, p_prev) = legendre_pair(m, x);
    m as f64 * (x * p - p_prev) / (x * x - 1.0)
}

/// Gauss-Legendre points and weights on [-1, 1], ascending
fn gauss_legendre(n: usize) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        // Chebyshev-like initial guess, descending in i
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..NEWTON_MAX_ITER {
            let (p, _) = legendre_pair(n, x);
            let dx = p / legendre_derivative(n, x);
            x -= dx;
            if dx.abs() < NEWTON_TOL {
                break;
            }
        }
        let dp = legendre_derivative(n, x);
        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        points.push((x, w));
    }
    points.reverse();
    points
}

/// Gauss-Lobatto points and weights on [-1, 1], ascending
///
/// Needs at least two points; fewer yields an empty rule.
fn gauss_lobatto(n: usize) -> Vec<(f64, f64)> {
    if n < 2 {
        return Vec::new();
    }
    let m = n - 1;
    let nf = n as f64;
    let end_weight = 2.0 / (nf * (nf - 1.0));

    let mut points = Vec::with_capacity(n);
    points.push((-1.0, end_weight));

    // Interior points are the roots of P'_{n-1}
    for i in (1..m).rev() {
        let mut x = (PI * i as f64 / m as f64).cos();
        for _ in 0..NEWTON_MAX_ITER {
            let dp = legendre_derivative(m, x);
            let (p, _) = legendre_pair(m, x);
            // (1 - x²) P'' = 2x P' - m(m+1) P
            let d2p = (2.0 * x * dp - (m * (m + 1)) as f64 * p) / (1.0 - x * x);
            let dx = dp / d2p;
            x -= dx;
            if dx.abs() < NEWTON_TOL {
                break;
            }
        }
        let (p, _) = legendre_pair(m, x);
        points.push((x, end_weight / (p * p)));
    }

    points.push((1.0, end_weight));
    points
}
