/*!
Image formation metadata consumed by the grid rules.

These structures arrive already parsed from the product metadata. Each image
formation algorithm also knows how to derive the grid unit vectors its geometry
implies.
*/

use crate::core::poly::{Poly1D, Poly2D, PolyXyz};
use crate::types::{LookDirection, RadarMode, RowCol, SarError, SarResult, Vector3};
use serde::{Deserialize, Serialize};

/// Image size and valid data region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    pub num_rows: usize,
    pub num_cols: usize,
    /// Scene center point pixel
    pub scp_pixel: RowCol<i64>,
    /// Valid data polygon vertices, empty when the whole image is valid
    pub valid_data: Vec<RowCol<i64>>,
}

impl ImageData {
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            scp_pixel: RowCol::new(num_rows as i64 / 2, num_cols as i64 / 2),
            valid_data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInformation {
    pub radar_mode: RadarMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarCollection {
    /// Set when frequencies are stored as offsets from a reference
    pub ref_frequency_index: Option<i32>,
}

/// Aperture state at the scene center point time of center of aperture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scpcoa {
    pub scp_time: f64,
    pub arp_pos: Vector3,
    pub arp_vel: Vector3,
    pub side_of_track: LookDirection,
}

impl Scpcoa {
    pub fn look(&self) -> f64 {
        self.side_of_track.sign()
    }

    /// Unit line of sight from the aperture to the scene center point
    pub fn u_los(&self, scp: &Vector3) -> Vector3 {
        (scp - self.arp_pos).normalize()
    }

    /// Slant plane unit normal, pointing away from the earth
    pub fn slant_plane_normal(&self, scp: &Vector3) -> Vector3 {
        (self.arp_vel.cross(&self.u_los(scp)) * self.look()).normalize()
    }
}

/// Geometry common to the RMAT and RMCR reference point definitions
fn reference_frame(pos_ref: &Vector3, vel_ref: &Vector3, scp: &Vector3) -> (Vector3, Vector3, f64, Vector3) {
    let u_los = (scp - pos_ref).normalize();
    let u_vel = vel_ref.normalize();
    let left = pos_ref.normalize().cross(&u_vel);
    let look = if left.dot(&u_los) < 0.0 { -1.0 } else { 1.0 };
    let u_spz = (vel_ref.cross(&u_los) * look).normalize();
    (u_los, u_vel, look, u_spz)
}

/// Range migration with a cross-track/along-track grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rmat {
    pub pos_ref: Vector3,
    pub vel_ref: Vector3,
    /// Doppler cone angle at the reference point (degrees)
    pub dop_cone_angle_ref: f64,
}

impl Rmat {
    pub fn u_xct(&self, scp: &Vector3) -> Vector3 {
        let (_, _, _, u_spz) = reference_frame(&self.pos_ref, &self.vel_ref, scp);
        self.u_yat(scp).cross(&u_spz)
    }

    pub fn u_yat(&self, scp: &Vector3) -> Vector3 {
        let (_, u_vel, look, _) = reference_frame(&self.pos_ref, &self.vel_ref, scp);
        u_vel * -look
    }
}

/// Range migration with a range/cross-range grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rmcr {
    pub pos_ref: Vector3,
    pub vel_ref: Vector3,
    pub dop_cone_angle_ref: f64,
}

impl Rmcr {
    pub fn u_xrg(&self, scp: &Vector3) -> Vector3 {
        let (u_los, _, _, _) = reference_frame(&self.pos_ref, &self.vel_ref, scp);
        u_los
    }

    pub fn u_ycr(&self, scp: &Vector3) -> Vector3 {
        let (u_los, _, _, u_spz) = reference_frame(&self.pos_ref, &self.vel_ref, scp);
        u_spz.cross(&u_los)
    }
}

/// Range migration INCA (imaging at closest approach)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inca {
    /// Time of closest approach versus column (meters)
    pub time_ca_poly: Poly1D<f64>,
    /// Range at closest approach for the scene center point
    pub r_ca_scp: f64,
    /// Reference frequency for the range/Doppler conversion (Hz)
    pub freq_zero: f64,
    /// Doppler rate scale factor versus (row, col)
    pub drate_sf_poly: Poly2D,
    pub doppler_centroid_poly: Option<Poly2D>,
    /// Set when the Doppler centroid was used as the center of aperture
    pub doppler_centroid_coa: bool,
}

impl Inca {
    fn time_ca(&self) -> f64 {
        self.time_ca_poly[0]
    }

    pub fn u_rg(&self, scp: &Vector3, arp_poly: &PolyXyz) -> Vector3 {
        (scp - arp_poly.evaluate(self.time_ca())).normalize()
    }

    /// Azimuth unit vector at the scene center point's closest approach
    pub fn u_az(&self, scp: &Vector3, arp_poly: &PolyXyz) -> Vector3 {
        let time_ca = self.time_ca();
        let arp = arp_poly.evaluate(time_ca);
        let vel = arp_poly.derivative().evaluate(time_ca);

        let u_rg = (scp - arp).normalize();
        let left = arp.normalize().cross(&vel.normalize());
        let look = if left.dot(&u_rg) < 0.0 { -1.0 } else { 1.0 };
        let u_spz = (vel.cross(&u_rg) * look).normalize();
        u_spz.cross(&u_rg)
    }
}

/// Which range migration grid was formed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rma {
    Rmat(Rmat),
    Rmcr(Rmcr),
    Inca(Inca),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlowTimeDeskew {
    pub applied: bool,
}

/// Polar format algorithm parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pfa {
    /// Polar angle versus time (radians)
    pub polar_angle_poly: Poly1D<f64>,
    /// Spatial frequency scale factor versus polar angle
    pub spatial_frequency_scale_factor_poly: Poly1D<f64>,
    /// Range spatial frequency support (cycles/meter)
    pub krg1: Option<f64>,
    pub krg2: Option<f64>,
    /// Azimuth spatial frequency support (cycles/meter)
    pub kaz1: Option<f64>,
    pub kaz2: Option<f64>,
    pub slow_time_deskew: SlowTimeDeskew,
}

/// Range/azimuth compensation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgAzComp {
    pub azimuth_scale_factor: f64,
    pub kaz_poly: Poly1D<f64>,
}

/// Image formation algorithm, exactly one per product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImageFormation {
    Rma(Rma),
    Pfa(Pfa),
    RgAzComp(RgAzComp),
}

impl std::fmt::Display for ImageFormation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageFormation::Rma(Rma::Rmat(_)) => write!(f, "RMA/RMAT"),
            ImageFormation::Rma(Rma::Rmcr(_)) => write!(f, "RMA/RMCR"),
            ImageFormation::Rma(Rma::Inca(_)) => write!(f, "RMA/INCA"),
            ImageFormation::Pfa(_) => write!(f, "PFA"),
            ImageFormation::RgAzComp(_) => write!(f, "RGAZCOMP"),
        }
    }
}

/// Product-level values the formation-specific grid rules draw on
#[derive(Debug, Clone, Default)]
pub struct FormationContext<'a> {
    /// Scene center point (ECEF)
    pub scp: Option<Vector3>,
    pub arp_poly: Option<&'a PolyXyz>,
    pub scpcoa: Option<&'a Scpcoa>,
    /// Center frequency of the collection (Hz)
    pub center_frequency: Option<f64>,
    pub radar_collection: Option<&'a RadarCollection>,
}

impl<'a> FormationContext<'a> {
    pub fn require_scp(&self) -> SarResult<Vector3> {
        self.scp.ok_or_else(|| SarError::MissingPrecondition("scene center point".to_string()))
    }

    pub fn require_arp_poly(&self) -> SarResult<&'a PolyXyz> {
        self.arp_poly
            .ok_or_else(|| SarError::MissingPrecondition("aperture position polynomial".to_string()))
    }

    pub fn require_scpcoa(&self) -> SarResult<&'a Scpcoa> {
        self.scpcoa
            .ok_or_else(|| SarError::MissingPrecondition("SCPCOA parameters".to_string()))
    }

    pub fn require_center_frequency(&self) -> SarResult<f64> {
        self.center_frequency
            .ok_or_else(|| SarError::MissingPrecondition("center frequency".to_string()))
    }
}
