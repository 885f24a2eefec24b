/*!
R/Rdot contour equations, one per image formation algorithm.

A contour is the range and range rate from the aperture at time of center of
aperture to the scene point imaged at a given grid location. Grid locations are
(row, col) distances in meters from the scene center point along the image plane
unit vectors.
*/

use crate::core::poly::{Poly1D, Poly2D, PolyXyz};
use crate::types::{LookDirection, RowCol, SarError, SarResult, Vector3};
use serde::{Deserialize, Serialize};

/// Range and range rate at time of center of aperture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub r: f64,
    pub r_dot: f64,
}

/// Slant geometry shared by every contour variant
#[derive(Debug, Clone)]
pub struct ContourGeometry {
    /// Scene center point (ECEF)
    pub scp: Vector3,
    /// Unit vector of increasing image row in the image plane
    pub image_plane_row: Vector3,
    /// Unit vector of increasing image column in the image plane
    pub image_plane_col: Vector3,
    /// Aperture reference position versus time
    pub arp_poly: PolyXyz,
    /// Time derivative of `arp_poly`
    pub arp_vel_poly: PolyXyz,
    pub look: LookDirection,
}

impl ContourGeometry {
    /// Point in the image plane at `pixel` meters from the scene center
    pub fn image_plane_point(&self, pixel: RowCol<f64>) -> Vector3 {
        self.scp + self.image_plane_row * pixel.row + self.image_plane_col * pixel.col
    }
}

/// Algorithm-specific range/range-rate equation
pub trait ContourEquation {
    fn compute_contour(
        &self,
        geometry: &ContourGeometry,
        arp_coa: &Vector3,
        vel_coa: &Vector3,
        time_coa: f64,
        pixel: RowCol<f64>,
    ) -> Contour;

    /// Reject parameters that cannot produce a contour
    fn validate(&self) -> SarResult<()> {
        Ok(())
    }
}

/// Polar format (RGAZIM grid) contour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeAzimuthContour {
    polar_angle_poly: Poly1D<f64>,
    polar_angle_poly_prime: Poly1D<f64>,
    ksf_poly: Poly1D<f64>,
    ksf_poly_prime: Poly1D<f64>,
}

impl RangeAzimuthContour {
    /// `polar_angle_poly` maps time to polar angle (radians) and `ksf_poly`
    /// maps polar angle to the spatial frequency scale factor
    pub fn new(polar_angle_poly: Poly1D<f64>, ksf_poly: Poly1D<f64>) -> Self {
        Self {
            polar_angle_poly_prime: polar_angle_poly.derivative(),
            ksf_poly_prime: ksf_poly.derivative(),
            polar_angle_poly,
            ksf_poly,
        }
    }

    pub fn polar_angle_poly(&self) -> &Poly1D<f64> {
        &self.polar_angle_poly
    }

    pub fn ksf_poly(&self) -> &Poly1D<f64> {
        &self.ksf_poly
    }
}

impl ContourEquation for RangeAzimuthContour {
    fn compute_contour(
        &self,
        geometry: &ContourGeometry,
        arp_coa: &Vector3,
        vel_coa: &Vector3,
        time_coa: f64,
        pixel: RowCol<f64>,
    ) -> Contour {
        let arp_minus_scp = arp_coa - geometry.scp;
        let range_scp = arp_minus_scp.norm();
        let range_rate_scp = vel_coa.dot(&arp_minus_scp) / range_scp;

        let theta = self.polar_angle_poly.evaluate(time_coa);
        let d_theta_dt = self.polar_angle_poly_prime.evaluate(time_coa);
        let ksf = self.ksf_poly.evaluate(theta);
        let d_ksf_d_theta = self.ksf_poly_prime.evaluate(theta);

        let (sin_theta, cos_theta) = theta.sin_cos();
        let d_phi_d_ka = pixel.row * cos_theta + pixel.col * sin_theta;
        let d_phi_d_kc = -pixel.row * sin_theta + pixel.col * cos_theta;

        // Azimuth term follows the polar angle, whose sense is set by the side of track
        let delta_r = ksf * d_phi_d_ka;
        let delta_r_dot = (d_ksf_d_theta * d_phi_d_ka + ksf * d_phi_d_kc) * d_theta_dt;

        Contour {
            r: range_scp + delta_r,
            r_dot: range_rate_scp + delta_r_dot,
        }
    }
}

/// Range migration INCA (RGZERO grid) contour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeZeroContour {
    time_ca_poly: Poly1D<f64>,
    dsrf_poly: Poly2D,
    range_ca: f64,
}

impl RangeZeroContour {
    /// * `time_ca_poly` - time of closest approach versus column (meters)
    /// * `dsrf_poly` - Doppler rate scale factor versus (row, col)
    /// * `range_ca` - range at closest approach for the scene center point
    pub fn new(time_ca_poly: Poly1D<f64>, dsrf_poly: Poly2D, range_ca: f64) -> Self {
        Self {
            time_ca_poly,
            dsrf_poly,
            range_ca,
        }
    }

    pub fn time_ca_poly(&self) -> &Poly1D<f64> {
        &self.time_ca_poly
    }

    pub fn range_ca(&self) -> f64 {
        self.range_ca
    }
}

impl ContourEquation for RangeZeroContour {
    fn compute_contour(
        &self,
        geometry: &ContourGeometry,
        _arp_coa: &Vector3,
        _vel_coa: &Vector3,
        time_coa: f64,
        pixel: RowCol<f64>,
    ) -> Contour {
        let range_ca = self.range_ca + pixel.row;
        let time_ca = self.time_ca_poly.evaluate(pixel.col);
        let vel_ca = geometry.arp_vel_poly.evaluate(time_ca).norm();
        let dsrf = self.dsrf_poly.evaluate(pixel.row, pixel.col);

        let delta_t = time_coa - time_ca;
        let rate = dsrf * vel_ca * vel_ca * delta_t;
        let r = (range_ca * range_ca + rate * delta_t).sqrt();
        Contour { r, r_dot: rate / r }
    }

    fn validate(&self) -> SarResult<()> {
        if !self.range_ca.is_finite() || self.range_ca <= 0.0 {
            return Err(SarError::InvalidGeometry(format!(
                "range at closest approach must be positive, got {}",
                self.range_ca
            )));
        }
        Ok(())
    }
}

/// Planar grid contour, shared by the XRGYCR, XCTYAT and PLANE grid types
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlaneContour;

pub type XrgYcrContour = PlaneContour;
pub type XctYatContour = PlaneContour;

impl ContourEquation for PlaneContour {
    fn compute_contour(
        &self,
        geometry: &ContourGeometry,
        arp_coa: &Vector3,
        vel_coa: &Vector3,
        _time_coa: f64,
        pixel: RowCol<f64>,
    ) -> Contour {
        let arp_minus_ipp = arp_coa - geometry.image_plane_point(pixel);
        let r = arp_minus_ipp.norm();
        Contour {
            r,
            r_dot: vel_coa.dot(&arp_minus_ipp) / r,
        }
    }
}

/// Closed set of contour variants dispatched by the projection model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ContourModel {
    RangeAzimuth(RangeAzimuthContour),
    RangeZero(RangeZeroContour),
    Plane(PlaneContour),
}

impl ContourEquation for ContourModel {
    fn compute_contour(
        &self,
        geometry: &ContourGeometry,
        arp_coa: &Vector3,
        vel_coa: &Vector3,
        time_coa: f64,
        pixel: RowCol<f64>,
    ) -> Contour {
        match self {
            ContourModel::RangeAzimuth(c) => c.compute_contour(geometry, arp_coa, vel_coa, time_coa, pixel),
            ContourModel::RangeZero(c) => c.compute_contour(geometry, arp_coa, vel_coa, time_coa, pixel),
            ContourModel::Plane(c) => c.compute_contour(geometry, arp_coa, vel_coa, time_coa, pixel),
        }
    }

    fn validate(&self) -> SarResult<()> {
        match self {
            ContourModel::RangeAzimuth(c) => c.validate(),
            ContourModel::RangeZero(c) => c.validate(),
            ContourModel::Plane(c) => c.validate(),
        }
    }
}

impl std::fmt::Display for ContourModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContourModel::RangeAzimuth(_) => write!(f, "RangeAzimuth"),
            ContourModel::RangeZero(_) => write!(f, "RangeZero"),
            ContourModel::Plane(_) => write!(f, "Plane"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EARTH_RADIUS: f64 = 6_378_137.0;
    const SPEED: f64 = 7000.0;

    /// Straight-line pass along +z, looking right at a scene center on the x axis
    fn geometry() -> ContourGeometry {
        let scp = Vector3::new(EARTH_RADIUS, 0.0, 0.0);
        let arp0 = scp + Vector3::new(500e3, -300e3, 0.0);
        let arp_poly = PolyXyz::new(vec![arp0, Vector3::new(0.0, 0.0, SPEED)]).unwrap();
        let u_row = (scp - arp0).normalize();
        ContourGeometry {
            scp,
            image_plane_row: u_row,
            image_plane_col: Vector3::z(),
            arp_vel_poly: arp_poly.derivative(),
            arp_poly,
            look: LookDirection::Right,
        }
    }

    #[test]
    fn test_plane_contour_matches_geometry() {
        let geom = geometry();
        let arp = geom.arp_poly.evaluate(0.0);
        let vel = geom.arp_vel_poly.evaluate(0.0);
        let pixel = RowCol::new(120.0, -45.0);
        let contour = PlaneContour.compute_contour(&geom, &arp, &vel, 0.0, pixel);

        let point = geom.image_plane_point(pixel);
        assert_relative_eq!(contour.r, (arp - point).norm(), epsilon = 1e-6);
        assert_relative_eq!(contour.r_dot, vel.dot(&(arp - point)) / contour.r, epsilon = 1e-9);
        assert!(contour.r_dot > 0.0, "point behind the aperture opens range");
    }

    #[test]
    fn test_range_azimuth_contour_at_scene_center() {
        let geom = geometry();
        let arp = geom.arp_poly.evaluate(0.0);
        let vel = geom.arp_vel_poly.evaluate(0.0);
        let range = (arp - geom.scp).norm();
        let contour = RangeAzimuthContour::new(
            Poly1D::new(vec![0.0, -SPEED / range]).unwrap(),
            Poly1D::constant(1.0),
        );

        let at_scp = contour.compute_contour(&geom, &arp, &vel, 0.0, RowCol::new(0.0, 0.0));
        assert_relative_eq!(at_scp.r, range, epsilon = 1e-6);
        assert_relative_eq!(at_scp.r_dot, 0.0, epsilon = 1e-9);

        let offset = contour.compute_contour(&geom, &arp, &vel, 0.0, RowCol::new(10.0, 20.0));
        assert_relative_eq!(offset.r, range + 10.0, epsilon = 1e-6);
        assert_relative_eq!(offset.r_dot, -20.0 * SPEED / range, epsilon = 1e-9);
    }

    #[test]
    fn test_range_zero_contour_straight_line() {
        let geom = geometry();
        let range = (geom.arp_poly.evaluate(0.0) - geom.scp).norm();
        let contour = RangeZeroContour::new(
            Poly1D::new(vec![0.0, 1.0 / SPEED]).unwrap(),
            Poly2D::constant(1.0),
            range,
        );

        let pixel = RowCol::new(5.0, 700.0);
        let time_coa = 0.3;
        let arp = geom.arp_poly.evaluate(time_coa);
        let vel = geom.arp_vel_poly.evaluate(time_coa);
        let result = contour.compute_contour(&geom, &arp, &vel, time_coa, pixel);

        let along_track = SPEED * (time_coa - 0.1);
        let expected_r = ((range + 5.0).powi(2) + along_track.powi(2)).sqrt();
        assert_relative_eq!(result.r, expected_r, epsilon = 1e-6);
        assert_relative_eq!(result.r_dot, SPEED * along_track / expected_r, epsilon = 1e-9);
    }

    #[test]
    fn test_range_zero_rejects_bad_range() {
        let contour = ContourModel::RangeZero(RangeZeroContour::new(
            Poly1D::constant(0.0),
            Poly2D::constant(1.0),
            f64::NAN,
        ));
        assert!(contour.validate().is_err());
        assert!(ContourModel::Plane(PlaneContour).validate().is_ok());
    }

    #[test]
    fn test_aliases_share_plane_logic() {
        let geom = geometry();
        let arp = geom.arp_poly.evaluate(1.0);
        let vel = geom.arp_vel_poly.evaluate(1.0);
        let pixel = RowCol::new(-3.0, 8.0);
        let a: XrgYcrContour = PlaneContour;
        let b: XctYatContour = PlaneContour;
        assert_eq!(
            a.compute_contour(&geom, &arp, &vel, 1.0, pixel),
            b.compute_contour(&geom, &arp, &vel, 1.0, pixel)
        );
    }
}
