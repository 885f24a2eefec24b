//! Projection geometry and image grid rules

pub mod contour;
pub mod grid;
pub mod grid_geometry;
pub mod poly;
pub mod projection;
pub mod validation;
pub mod weighting;

// Re-export main types
pub use contour::{
    Contour, ContourEquation, ContourGeometry, ContourModel, PlaneContour, RangeAzimuthContour, RangeZeroContour,
    XctYatContour, XrgYcrContour,
};
pub use grid::{DirectionParameters, Grid};
pub use grid_geometry::{GridGeometry, PlanarGridGeometry};
pub use poly::{Poly1D, Poly2D, PolyXyz};
pub use projection::{
    AdjustableOffsets, ImageToScene, ProjectionConfig, ProjectionModel, ProjectionParams, ProjectionPolynomialParams,
    ProjectionPolynomials, SceneToImage,
};
pub use validation::{Diagnostic, Severity, ValidationReport};
pub use weighting::{WeightFunction, WeightParameter, WeightType};
