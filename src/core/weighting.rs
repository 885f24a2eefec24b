/*!
Aperture weighting windows.

A named window description (`WeightType`) resolves to a `WeightFunction` that
samples the window at any length. Taylor windows and recovering a window from
explicit samples are not supported.
*/

use crate::types::{SarError, SarResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Default raised cosine coefficient for a HAMMING window
pub const HAMMING_DEFAULT_COEFFICIENT: f64 = 0.54;

/// Window description parameter (name/value pair)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightParameter {
    pub name: String,
    pub value: String,
}

/// Named weighting window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightType {
    pub window_name: String,
    pub parameters: Vec<WeightParameter>,
}

impl WeightType {
    pub fn new(window_name: impl Into<String>) -> Self {
        Self {
            window_name: window_name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(WeightParameter {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.window_name.trim().eq_ignore_ascii_case(name)
    }

    /// First parameter value, `None` when absent or blank
    fn first_value(&self) -> Option<&str> {
        self.parameters
            .first()
            .map(|p| p.value.trim())
            .filter(|v| !v.is_empty())
    }

    fn parse_first(&self) -> SarResult<Option<f64>> {
        self.first_value()
            .map(|v| {
                v.parse::<f64>().map_err(|e| {
                    SarError::Metadata(format!(
                        "{} window parameter '{}' is not a number: {}",
                        self.window_name, v, e
                    ))
                })
            })
            .transpose()
    }

    /// Resolve the description to a sampler
    pub fn weight_function(&self) -> SarResult<WeightFunction> {
        let name = self.window_name.trim().to_ascii_uppercase();
        match name.as_str() {
            "UNIFORM" => Ok(WeightFunction::Uniform),
            "HAMMING" => {
                // Some products use HAMMING for a generalized raised cosine
                let coefficient = self.parse_first()?.unwrap_or(HAMMING_DEFAULT_COEFFICIENT);
                Ok(WeightFunction::RaisedCosine { coefficient })
            }
            "HANNING" => Ok(WeightFunction::RaisedCosine { coefficient: 0.5 }),
            "KAISER" => {
                let beta = self.parse_first()?.ok_or_else(|| {
                    SarError::Metadata("KAISER window requires a beta parameter".to_string())
                })?;
                Ok(WeightFunction::Kaiser { beta })
            }
            "TAYLOR" => Err(SarError::Unsupported(
                "TAYLOR window weights cannot be derived".to_string(),
            )),
            _ => Err(SarError::Unsupported(format!(
                "unrecognized weighting window '{}'",
                self.window_name
            ))),
        }
    }
}

/// Window sampler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeightFunction {
    Uniform,
    RaisedCosine { coefficient: f64 },
    Kaiser { beta: f64 },
}

impl WeightFunction {
    pub fn is_uniform(&self) -> bool {
        matches!(self, WeightFunction::Uniform)
    }

    /// Sample the window at `n` points spanning the aperture
    pub fn sample(&self, n: usize) -> Array1<f64> {
        if n == 1 {
            return Array1::ones(1);
        }
        let span = n.saturating_sub(1) as f64;
        match *self {
            WeightFunction::Uniform => Array1::ones(n),
            WeightFunction::RaisedCosine { coefficient } => Array1::from_shape_fn(n, |i| {
                coefficient - (1.0 - coefficient) * (2.0 * PI * i as f64 / span).cos()
            }),
            WeightFunction::Kaiser { beta } => {
                let norm = bessel_i0(beta);
                Array1::from_shape_fn(n, |i| {
                    let x = 2.0 * i as f64 / span - 1.0;
                    bessel_i0(beta * (1.0 - x * x).max(0.0).sqrt()) / norm
                })
            }
        }
    }
}

/// Modified Bessel function of the first kind, order zero (power series)
pub fn bessel_i0(x: f64) -> f64 {
    let half_sq = (x / 2.0) * (x / 2.0);
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..500 {
        term *= half_sq / (k as f64 * k as f64);
        sum += term;
        if term < sum * 1e-17 {
            break;
        }
    }
    sum
}
