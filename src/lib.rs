//! sarscene: SAR image projection and grid metadata rules
//!
//! This library converts between complex SAR image grid locations and scene
//! (ECEF) points for the range/azimuth, range/zero-Doppler and planar image
//! grids, and derives and validates the grid metadata that ties an image to
//! the algorithm that formed it.

pub mod types;
pub mod metadata;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    FftSign, ImageGridType, ImagePlaneType, LookDirection, RadarMode, RowCol, SarError, SarResult, Vector3,
    SPEED_OF_LIGHT,
};

pub use crate::core::{
    ContourModel, DirectionParameters, Grid, PlanarGridGeometry, Poly1D, Poly2D, PolyXyz, ProjectionModel,
    ProjectionParams, ValidationReport,
};
