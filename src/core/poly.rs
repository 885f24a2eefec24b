/*!
Polynomial primitives used by the projection model and grid metadata.

`Poly1D<V>` maps a scalar (usually time) to a scalar or `Vector3` value, e.g. the
aperture reference position. `Poly2D` maps an (x, y) pair, usually (row, col) in
meters from the scene center, to a scalar, e.g. time of center of aperture.
Coefficient `c[i][j]` multiplies `x^i y^j`.
*/

use crate::types::{SarError, SarResult};
use nalgebra::{DMatrix, DVector};
use ndarray::Array2;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Index, Mul, Sub};

/// Value types a polynomial can produce
pub trait PolyValue: Copy + Zero + Add<Output = Self> + Mul<f64, Output = Self> {}

impl<T> PolyValue for T where T: Copy + Zero + Add<Output = T> + Mul<f64, Output = T> {}

/// One-dimensional polynomial with scalar or vector coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Poly1DCoefficients<V>",
    bound(deserialize = "V: PolyValue + Deserialize<'de>")
)]
pub struct Poly1D<V> {
    coefficients: Vec<V>,
}

/// Serialized form of `Poly1D`, validated through `Poly1D::new`
#[derive(Deserialize)]
struct Poly1DCoefficients<V> {
    coefficients: Vec<V>,
}

impl<V: PolyValue> TryFrom<Poly1DCoefficients<V>> for Poly1D<V> {
    type Error = SarError;

    fn try_from(raw: Poly1DCoefficients<V>) -> SarResult<Self> {
        Self::new(raw.coefficients)
    }
}

/// Vector-valued polynomial in time, e.g. aperture position
pub type PolyXyz = Poly1D<crate::types::Vector3>;

impl<V: PolyValue> Poly1D<V> {
    /// Create a polynomial from coefficients ordered by increasing power
    pub fn new(coefficients: Vec<V>) -> SarResult<Self> {
        if coefficients.is_empty() {
            return Err(SarError::InvalidPolynomial(
                "polynomial requires at least one coefficient".to_string(),
            ));
        }
        Ok(Self { coefficients })
    }

    /// Polynomial of order zero
    pub fn constant(value: V) -> Self {
        Self {
            coefficients: vec![value],
        }
    }

    pub fn order(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn coefficients(&self) -> &[V] {
        &self.coefficients
    }

    /// Evaluate with Horner's scheme
    pub fn evaluate(&self, t: f64) -> V {
        self.coefficients
            .iter()
            .rev()
            .fold(V::zero(), |acc, &c| acc * t + c)
    }

    /// First derivative; the derivative of a constant is the zero constant
    pub fn derivative(&self) -> Self {
        if self.coefficients.len() == 1 {
            return Self::constant(V::zero());
        }
        let coefficients = self
            .coefficients
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &c)| c * i as f64)
            .collect();
        Self { coefficients }
    }
}

impl<V> Index<usize> for Poly1D<V> {
    type Output = V;

    fn index(&self, i: usize) -> &V {
        &self.coefficients[i]
    }
}

/// Two-dimensional scalar polynomial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Poly2DCoefficients")]
pub struct Poly2D {
    coefficients: Array2<f64>,
}

#[derive(Deserialize)]
struct Poly2DCoefficients {
    coefficients: Array2<f64>,
}

impl TryFrom<Poly2DCoefficients> for Poly2D {
    type Error = SarError;

    fn try_from(raw: Poly2DCoefficients) -> SarResult<Self> {
        Self::new(raw.coefficients)
    }
}

impl Poly2D {
    /// Create from an `(order_x + 1) x (order_y + 1)` coefficient array
    pub fn new(coefficients: Array2<f64>) -> SarResult<Self> {
        if coefficients.nrows() == 0 || coefficients.ncols() == 0 {
            return Err(SarError::InvalidPolynomial(
                "2-D polynomial requires a non-empty coefficient array".to_string(),
            ));
        }
        Ok(Self { coefficients })
    }

    pub fn constant(value: f64) -> Self {
        Self {
            coefficients: Array2::from_elem((1, 1), value),
        }
    }

    pub fn order_x(&self) -> usize {
        self.coefficients.nrows() - 1
    }

    pub fn order_y(&self) -> usize {
        self.coefficients.ncols() - 1
    }

    pub fn coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    /// Coefficient of `x^i y^j`, zero outside the stored shape
    pub fn coefficient(&self, i: usize, j: usize) -> f64 {
        self.coefficients.get((i, j)).copied().unwrap_or(0.0)
    }

    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        self.at_y(y).evaluate(x)
    }

    /// Collapse the y dimension at a fixed `y`, leaving a polynomial in x
    pub fn at_y(&self, y: f64) -> Poly1D<f64> {
        let coefficients = self
            .coefficients
            .rows()
            .into_iter()
            .map(|row| row.iter().rev().fold(0.0, |acc, &c| acc * y + c))
            .collect();
        Poly1D { coefficients }
    }

    pub fn derivative_x(&self) -> Self {
        if self.order_x() == 0 {
            return Self::constant(0.0);
        }
        let (nx, ny) = self.coefficients.dim();
        let coefficients =
            Array2::from_shape_fn((nx - 1, ny), |(i, j)| self.coefficients[[i + 1, j]] * (i + 1) as f64);
        Self { coefficients }
    }

    pub fn derivative_y(&self) -> Self {
        if self.order_y() == 0 {
            return Self::constant(0.0);
        }
        let (nx, ny) = self.coefficients.dim();
        let coefficients =
            Array2::from_shape_fn((nx, ny - 1), |(i, j)| self.coefficients[[i, j + 1]] * (j + 1) as f64);
        Self { coefficients }
    }

    /// True when every term except the constant is zero
    pub fn is_scalar(&self) -> bool {
        self.coefficients
            .indexed_iter()
            .all(|((i, j), &c)| (i == 0 && j == 0) || c == 0.0)
    }

    pub fn frobenius_norm(&self) -> f64 {
        self.coefficients.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    fn combine(&self, other: &Poly2D, op: impl Fn(f64, f64) -> f64) -> Poly2D {
        let nx = self.coefficients.nrows().max(other.coefficients.nrows());
        let ny = self.coefficients.ncols().max(other.coefficients.ncols());
        let coefficients = Array2::from_shape_fn((nx, ny), |(i, j)| {
            op(self.coefficient(i, j), other.coefficient(i, j))
        });
        Poly2D { coefficients }
    }

    /// Least-squares fit of a full `order_x` by `order_y` tensor basis.
    ///
    /// Inputs are scaled by their largest magnitude before the SVD solve and the
    /// coefficients are rescaled afterwards, which keeps the design matrix well
    /// conditioned when x and y are in pixels.
    pub fn fit(x: &[f64], y: &[f64], z: &[f64], order_x: usize, order_y: usize) -> SarResult<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(SarError::InvalidPolynomial(format!(
                "fit inputs differ in length: {} x, {} y, {} z",
                x.len(),
                y.len(),
                z.len()
            )));
        }
        let num_terms = (order_x + 1) * (order_y + 1);
        if x.len() < num_terms {
            return Err(SarError::InvalidPolynomial(format!(
                "{} samples cannot determine {} coefficients",
                x.len(),
                num_terms
            )));
        }

        let scale = |values: &[f64]| {
            let max = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            if max > 0.0 {
                max
            } else {
                1.0
            }
        };
        let sx = scale(x);
        let sy = scale(y);

        let mut a_mat = DMatrix::<f64>::zeros(x.len(), num_terms);
        let b_vec = DVector::<f64>::from_column_slice(z);
        for (row, (&xv, &yv)) in x.iter().zip(y.iter()).enumerate() {
            let xn = xv / sx;
            let yn = yv / sy;
            for i in 0..=order_x {
                for j in 0..=order_y {
                    a_mat[(row, i * (order_y + 1) + j)] = xn.powi(i as i32) * yn.powi(j as i32);
                }
            }
        }

        let svd = a_mat.svd(true, true);
        let solution = svd
            .solve(&b_vec, 1e-12)
            .map_err(|e| SarError::InvalidPolynomial(format!("least-squares solve failed: {}", e)))?;

        let coefficients = Array2::from_shape_fn((order_x + 1, order_y + 1), |(i, j)| {
            solution[i * (order_y + 1) + j] / (sx.powi(i as i32) * sy.powi(j as i32))
        });
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(SarError::InvalidPolynomial(
                "least-squares fit produced non-finite coefficients".to_string(),
            ));
        }
        Ok(Poly2D { coefficients })
    }
}

impl Add<&Poly2D> for &Poly2D {
    type Output = Poly2D;

    fn add(self, rhs: &Poly2D) -> Poly2D {
        self.combine(rhs, |a, b| a + b)
    }
}

impl Sub<&Poly2D> for &Poly2D {
    type Output = Poly2D;

    fn sub(self, rhs: &Poly2D) -> Poly2D {
        self.combine(rhs, |a, b| a - b)
    }
}

impl Mul<f64> for &Poly2D {
    type Output = Poly2D;

    fn mul(self, rhs: f64) -> Poly2D {
        Poly2D {
            coefficients: &self.coefficients * rhs,
        }
    }
}

impl Index<(usize, usize)> for Poly2D {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.coefficients[[index.0, index.1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vector3;
    use approx::assert_relative_eq;
    use ndarray::arr2;

    #[test]
    fn test_poly1d_evaluate_and_derivative() {
        let poly = Poly1D::new(vec![1.0, -2.0, 3.0]).unwrap();
        assert_relative_eq!(poly.evaluate(2.0), 1.0 - 4.0 + 12.0);
        let deriv = poly.derivative();
        assert_eq!(deriv.coefficients(), &[-2.0, 6.0]);
        assert_eq!(Poly1D::constant(5.0).derivative().evaluate(10.0), 0.0);
        assert!(Poly1D::<f64>::new(vec![]).is_err());
    }

    #[test]
    fn test_vector_polynomial() {
        let poly = PolyXyz::new(vec![Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 10.0, 0.0)]).unwrap();
        assert_eq!(poly.evaluate(2.0), Vector3::new(1.0, 22.0, 3.0));
        assert_eq!(poly.derivative().evaluate(7.0), Vector3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn test_poly2d_evaluate_and_at_y() {
        // 1 + 2y + 3x + 4xy
        let poly = Poly2D::new(arr2(&[[1.0, 2.0], [3.0, 4.0]])).unwrap();
        assert_relative_eq!(poly.evaluate(2.0, 3.0), 1.0 + 6.0 + 6.0 + 24.0);
        let at_y = poly.at_y(3.0);
        assert_eq!(at_y.coefficients(), &[7.0, 15.0]);
        assert_eq!(poly.order_x(), 1);
        assert_eq!(poly.order_y(), 1);
    }

    #[test]
    fn test_poly2d_derivatives() {
        let poly = Poly2D::new(arr2(&[[1.0, 2.0, 5.0], [3.0, 4.0, 0.0]])).unwrap();
        assert_relative_eq!(poly.derivative_x().evaluate(0.5, 2.0), 3.0 + 4.0 * 2.0);
        assert_relative_eq!(poly.derivative_y().evaluate(0.5, 2.0), 2.0 + 20.0 + 4.0 * 0.5);
    }

    #[test]
    fn test_poly2d_algebra_pads_shapes() {
        let a = Poly2D::new(arr2(&[[1.0, 2.0]])).unwrap();
        let b = Poly2D::new(arr2(&[[1.0], [5.0]])).unwrap();
        let diff = &a - &b;
        assert_eq!(diff.coefficients(), &arr2(&[[0.0, 2.0], [-5.0, 0.0]]));
        let sum = &a + &b;
        assert_relative_eq!(sum.evaluate(1.0, 1.0), 9.0);
        let scaled = &a * 2.0;
        assert_eq!(scaled[(0, 1)], 4.0);
    }

    #[test]
    fn test_is_scalar() {
        assert!(Poly2D::constant(3.0).is_scalar());
        assert!(Poly2D::new(arr2(&[[3.0, 0.0], [0.0, 0.0]])).unwrap().is_scalar());
        assert!(!Poly2D::new(arr2(&[[3.0, 0.0], [1e-9, 0.0]])).unwrap().is_scalar());
    }

    #[test]
    fn test_fit_recovers_exact_polynomial() {
        let truth = Poly2D::new(arr2(&[[10.0, 0.5, 1e-4], [-0.25, 2e-3, 0.0], [1e-5, 0.0, 0.0]])).unwrap();
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut z = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                let xv = i as f64 * 500.0 - 2000.0;
                let yv = j as f64 * 300.0 + 100.0;
                x.push(xv);
                y.push(yv);
                z.push(truth.evaluate(xv, yv));
            }
        }
        let fitted = Poly2D::fit(&x, &y, &z, 2, 2).unwrap();
        for (xv, yv) in [(0.0, 0.0), (1234.0, 987.0), (-2000.0, 2800.0)] {
            assert_relative_eq!(fitted.evaluate(xv, yv), truth.evaluate(xv, yv), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_fit_rejects_underdetermined() {
        let result = Poly2D::fit(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 2.0], 1, 1);
        assert!(matches!(result, Err(SarError::InvalidPolynomial(_))));
    }

    #[test]
    fn test_deserialize_rejects_empty_coefficients() {
        let empty_1d = serde_json::from_str::<Poly1D<f64>>(r#"{"coefficients":[]}"#);
        assert!(empty_1d.is_err());
        let empty_2d = format!(
            r#"{{"coefficients":{}}}"#,
            serde_json::to_string(&Array2::<f64>::zeros((0, 3))).unwrap()
        );
        assert!(serde_json::from_str::<Poly2D>(&empty_2d).is_err());
    }

    #[test]
    fn test_deserialize_valid_polynomials() {
        let poly = serde_json::from_str::<Poly1D<f64>>(r#"{"coefficients":[1.0,2.0]}"#).unwrap();
        assert_eq!(poly.order(), 1);
        assert_eq!(poly.evaluate(2.0), 5.0);

        let truth = Poly2D::new(arr2(&[[1.0, 0.5], [2.0, 0.0]])).unwrap();
        let json = serde_json::to_string(&truth).unwrap();
        let parsed: Poly2D = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, truth);
        assert_eq!(parsed.order_x(), 1);

        let xyz = PolyXyz::new(vec![Vector3::new(1.0, 2.0, 3.0)]).unwrap();
        let parsed: PolyXyz = serde_json::from_str(&serde_json::to_string(&xyz).unwrap()).unwrap();
        assert_eq!(parsed, xyz);
    }
}
