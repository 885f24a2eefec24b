//! Output grid geometries used when fitting projection polynomials

use crate::types::{RowCol, SarError, SarResult, Vector3};
use serde::{Deserialize, Serialize};

/// Maps output-grid offsets (meters from the output scene center) to ECEF
pub trait GridGeometry {
    fn row_col_to_ecef(&self, meters: RowCol<f64>) -> Vector3;
}

/// Planar output grid, e.g. a ground plane tangent at the scene center
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanarGridGeometry {
    row_unit: Vector3,
    col_unit: Vector3,
    reference_point: Vector3,
}

impl PlanarGridGeometry {
    pub fn new(row_unit: Vector3, col_unit: Vector3, reference_point: Vector3) -> SarResult<Self> {
        let row_unit = row_unit
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| SarError::InvalidGeometry("zero output row vector".to_string()))?;
        let col_unit = col_unit
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| SarError::InvalidGeometry("zero output column vector".to_string()))?;
        if row_unit.cross(&col_unit).norm() < 1e-9 {
            return Err(SarError::InvalidGeometry(
                "output row and column vectors are parallel".to_string(),
            ));
        }
        Ok(Self {
            row_unit,
            col_unit,
            reference_point,
        })
    }

    /// East-north grid in the plane tangent to the sphere at `reference_point`.
    /// Rows increase to the south and columns to the east, as in a north-up raster.
    pub fn north_up(reference_point: Vector3) -> SarResult<Self> {
        let up = reference_point
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| SarError::InvalidGeometry("reference point at the origin".to_string()))?;
        let east = Vector3::z().cross(&up);
        let east = east
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| SarError::InvalidGeometry("north-up grid undefined at the poles".to_string()))?;
        let north = up.cross(&east);
        Self::new(-north, east, reference_point)
    }

    pub fn reference_point(&self) -> &Vector3 {
        &self.reference_point
    }

    pub fn normal(&self) -> Vector3 {
        self.row_unit.cross(&self.col_unit).normalize()
    }
}

impl GridGeometry for PlanarGridGeometry {
    fn row_col_to_ecef(&self, meters: RowCol<f64>) -> Vector3 {
        self.reference_point + self.row_unit * meters.row + self.col_unit * meters.col
    }
}
