use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// Cartesian 3-vector (ECEF position, velocity or unit direction)
pub type Vector3 = nalgebra::Vector3<f64>;

/// Speed of light in vacuum (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Pair of values indexed by image row and column
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RowCol<T> {
    pub row: T,
    pub col: T,
}

impl<T> RowCol<T> {
    pub fn new(row: T, col: T) -> Self {
        Self { row, col }
    }
}

impl<T: Add<Output = T>> Add for RowCol<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.row + rhs.row, self.col + rhs.col)
    }
}

impl<T: Sub<Output = T>> Sub for RowCol<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.row - rhs.row, self.col - rhs.col)
    }
}

// Component-wise scaling, e.g. pixels * sample spacing
impl Mul for RowCol<f64> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.row * rhs.row, self.col * rhs.col)
    }
}

impl Div for RowCol<f64> {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        Self::new(self.row / rhs.row, self.col / rhs.col)
    }
}

impl Mul<f64> for RowCol<f64> {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.row * rhs, self.col * rhs)
    }
}

impl From<RowCol<i64>> for RowCol<f64> {
    fn from(rc: RowCol<i64>) -> Self {
        Self::new(rc.row as f64, rc.col as f64)
    }
}

impl<T: std::fmt::Display> std::fmt::Display for RowCol<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Side of track the antenna looks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookDirection {
    Left,
    Right,
}

impl LookDirection {
    /// Signed multiplier used by the geometry: left is +1, right is -1
    pub fn sign(self) -> f64 {
        match self {
            LookDirection::Left => 1.0,
            LookDirection::Right => -1.0,
        }
    }
}

impl TryFrom<i32> for LookDirection {
    type Error = SarError;

    fn try_from(value: i32) -> SarResult<Self> {
        match value {
            1 => Ok(LookDirection::Left),
            -1 => Ok(LookDirection::Right),
            other => Err(SarError::InvalidGeometry(format!(
                "look direction must be +1 or -1, got {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for LookDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookDirection::Left => write!(f, "L"),
            LookDirection::Right => write!(f, "R"),
        }
    }
}

/// Sign of the exponent in the transform from image to spatial frequency domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FftSign {
    Negative,
    Positive,
}

impl TryFrom<i32> for FftSign {
    type Error = SarError;

    fn try_from(value: i32) -> SarResult<Self> {
        match value {
            -1 => Ok(FftSign::Negative),
            1 => Ok(FftSign::Positive),
            other => Err(SarError::Metadata(format!("invalid FFT sign {}", other))),
        }
    }
}

impl std::fmt::Display for FftSign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FftSign::Negative => write!(f, "-1"),
            FftSign::Positive => write!(f, "+1"),
        }
    }
}

/// Plane the image grid is defined in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImagePlaneType {
    Slant,
    Ground,
    Other,
}

impl std::fmt::Display for ImagePlaneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImagePlaneType::Slant => write!(f, "SLANT"),
            ImagePlaneType::Ground => write!(f, "GROUND"),
            ImagePlaneType::Other => write!(f, "OTHER"),
        }
    }
}

/// Coordinate convention of the image grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageGridType {
    RgAzim,
    RgZero,
    XrgYcr,
    XctYat,
    Plane,
}

impl std::fmt::Display for ImageGridType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageGridType::RgAzim => write!(f, "RGAZIM"),
            ImageGridType::RgZero => write!(f, "RGZERO"),
            ImageGridType::XrgYcr => write!(f, "XRGYCR"),
            ImageGridType::XctYat => write!(f, "XCTYAT"),
            ImageGridType::Plane => write!(f, "PLANE"),
        }
    }
}

/// Collection radar mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RadarMode {
    Spotlight,
    Stripmap,
    DynamicStripmap,
    Scansar,
}

impl std::fmt::Display for RadarMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RadarMode::Spotlight => write!(f, "SPOTLIGHT"),
            RadarMode::Stripmap => write!(f, "STRIPMAP"),
            RadarMode::DynamicStripmap => write!(f, "DYNAMIC STRIPMAP"),
            RadarMode::Scansar => write!(f, "SCANSAR"),
        }
    }
}

/// Error types for projection and metadata operations
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid polynomial: {0}")]
    InvalidPolynomial(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Missing precondition: {0}")]
    MissingPrecondition(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Result type for SAR operations
pub type SarResult<T> = Result<T, SarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_direction_from_sign() {
        assert_eq!(LookDirection::try_from(1).unwrap(), LookDirection::Left);
        assert_eq!(LookDirection::try_from(-1).unwrap(), LookDirection::Right);
        assert!(LookDirection::try_from(0).is_err());
        assert_eq!(LookDirection::Right.sign(), -1.0);
    }

    #[test]
    fn test_row_col_arithmetic() {
        let a = RowCol::new(4.0, 9.0);
        let b = RowCol::new(2.0, 3.0);
        assert_eq!(a - b, RowCol::new(2.0, 6.0));
        assert_eq!(a / b, RowCol::new(2.0, 3.0));
        assert_eq!(b * 0.5, RowCol::new(1.0, 1.5));
        assert_eq!(format!("{}", RowCol::new(1, 2)), "(1, 2)");
    }
}
