/*!
Image grid metadata: derivation of unset fields and consistency validation.

`DirectionParameters` describes one grid direction (row or column): sampling,
spatial frequency support and weighting. `Grid` owns one of each and applies the
rules tying them to the image formation algorithm that produced the image.

Fill routines only set fields that are currently `None`. Row is filled before
column, and the `&mut self` receivers keep fills from overlapping validation.
Validation never fails for inconsistent metadata; it returns a
[`ValidationReport`]. An `Err` means a value a rule cannot do without was not
supplied by the caller.
*/

use crate::core::poly::Poly2D;
use crate::core::validation::ValidationReport;
use crate::core::weighting::{WeightFunction, WeightType};
use crate::metadata::{
    CollectionInformation, FormationContext, ImageData, ImageFormation, Inca, Pfa, Rma, Rmat, Scpcoa,
};
use crate::types::{
    FftSign, ImageGridType, ImagePlaneType, RadarMode, RowCol, SarError, SarResult, Vector3, SPEED_OF_LIGHT,
};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Unit vector agreement (norm of the difference)
pub const UVECT_TOL: f64 = 1e-3;
/// Relative agreement of spatial frequency centers
pub const WF_TOL: f64 = 1e-3;
/// Absolute agreement of weight samples
pub const WGT_TOL: f64 = 1e-3;
/// Relative agreement of stated and derived deltaK bounds
pub const DK_TOL: f64 = 1e-2;
/// Norm of the INCA Doppler centroid polynomial mismatch
pub const IFP_POLY_TOL: f64 = 1e-5;
/// Weight samples materialized from a window description
pub const DEFAULT_WEIGHT_SIZE: usize = 512;

const BOUNDS_ERROR: &str = "Violation of spatial frequency extent bounds";
const WF_INCONSISTENT: &str = "Waveform fields not consistent";

/// Wavenumber (cycles/meter) of a two-way path at frequency `fc`
pub fn two_way_wavenumber(fc: f64) -> f64 {
    fc * 2.0 / SPEED_OF_LIGHT
}

/// `|value / reference - 1|`, or `|value|` against a zero reference
fn relative_mismatch(value: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        value.abs()
    } else {
        (value / reference - 1.0).abs()
    }
}

fn require<T: Copy>(report: &mut ValidationReport, value: Option<T>, name: &str) -> Option<T> {
    if value.is_none() {
        report.error(format!("{} is undefined", name));
    }
    value
}

fn check_unit_vector(report: &mut ValidationReport, name: &str, stated: Option<Vector3>, derived: Vector3) {
    if let Some(stated) = require(report, stated, name) {
        if (stated - derived).norm() > UVECT_TOL {
            report.error(format!(
                "UVect fields inconsistent. {}: {:?}, derived: {:?}",
                name, stated, derived
            ));
        }
    }
}

/// Parameters of one grid direction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionParameters {
    pub unit_vector: Option<Vector3>,
    /// Sample spacing (meters)
    pub sample_spacing: Option<f64>,
    pub impulse_response_width: Option<f64>,
    pub sign: Option<FftSign>,
    /// Spatial frequency bandwidth (cycles/meter)
    pub impulse_response_bandwidth: Option<f64>,
    /// Center spatial frequency (cycles/meter)
    pub k_center: Option<f64>,
    pub delta_k1: Option<f64>,
    pub delta_k2: Option<f64>,
    /// Offset from `k_center` of the center of support versus (row, col)
    pub delta_kcoa_poly: Option<Poly2D>,
    pub weight_type: Option<WeightType>,
    /// Explicit weight samples, empty when not provided
    pub weights: Array1<f64>,
}

impl DirectionParameters {
    /// Valid data polygon, or the four image corners if none is declared
    pub fn calculate_image_vertices(&self, image_data: &ImageData) -> Vec<RowCol<f64>> {
        if !image_data.valid_data.is_empty() {
            return image_data.valid_data.iter().map(|&v| v.into()).collect();
        }
        let last_row = image_data.num_rows.saturating_sub(1) as f64;
        let last_col = image_data.num_cols.saturating_sub(1) as f64;
        vec![
            RowCol::new(0.0, 0.0),
            RowCol::new(0.0, last_col),
            RowCol::new(last_row, last_col),
            RowCol::new(last_row, 0.0),
        ]
    }

    /// Spatial frequency support implied by the centroid polynomial, bandwidth and
    /// sampling. Extremes are taken at the image vertices; support beyond Nyquist
    /// is clamped to `±1/(2 * sample_spacing)`.
    pub fn calculate_delta_ks(&self, image_data: &ImageData) -> SarResult<(f64, f64)> {
        let sample_spacing = self
            .sample_spacing
            .ok_or_else(|| SarError::MissingPrecondition("sample spacing".to_string()))?;
        let bandwidth = self
            .impulse_response_bandwidth
            .ok_or_else(|| SarError::MissingPrecondition("impulse response bandwidth".to_string()))?;

        let (mut min_dk, mut max_dk) = match &self.delta_kcoa_poly {
            Some(poly) => self
                .calculate_image_vertices(image_data)
                .iter()
                .map(|v| poly.evaluate(v.row, v.col))
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), dk| (lo.min(dk), hi.max(dk))),
            None => (0.0, 0.0),
        };
        min_dk -= bandwidth / 2.0;
        max_dk += bandwidth / 2.0;

        let nyquist = 1.0 / (2.0 * sample_spacing);
        if min_dk < -nyquist || max_dk > nyquist {
            min_dk = -nyquist;
            max_dk = nyquist;
        }
        Ok((min_dk, max_dk))
    }

    /// Sampler for the weighting description.
    ///
    /// `Ok(None)` when there is neither a description nor samples. Windows that
    /// cannot be derived (Taylor, unknown names, samples without a description)
    /// are `Unsupported`.
    pub fn calculate_weight_function(&self) -> SarResult<Option<WeightFunction>> {
        match &self.weight_type {
            Some(weight_type) => weight_type.weight_function().map(Some),
            None if self.weights.is_empty() => Ok(None),
            None => Err(SarError::Unsupported(
                "deriving a weight function from weight samples".to_string(),
            )),
        }
    }

    /// Fill deltaK bounds and weight samples when they are unset
    pub fn fill_derived_fields(&mut self, image_data: &ImageData) {
        if self.delta_kcoa_poly.is_some()
            && self.impulse_response_bandwidth.is_some()
            && self.sample_spacing.is_some()
            && self.delta_k1.is_none()
            && self.delta_k2.is_none()
        {
            if let Ok((dk1, dk2)) = self.calculate_delta_ks(image_data) {
                log::debug!("Derived deltaK support [{:.6}, {:.6}]", dk1, dk2);
                self.delta_k1 = Some(dk1);
                self.delta_k2 = Some(dk2);
            }
        }

        let wants_weights = self
            .weight_type
            .as_ref()
            .map_or(false, |w| !w.is_named("UNKNOWN"));
        if wants_weights && self.weights.is_empty() {
            match self.calculate_weight_function() {
                Ok(Some(function)) => self.weights = function.sample(DEFAULT_WEIGHT_SIZE),
                Ok(None) => {}
                Err(e) => log::debug!("Leaving weights unset: {}", e),
            }
        }
    }

    /// kCenter implied by a range/azimuth compensation offset
    pub fn derived_k_center(&self, offset: f64) -> f64 {
        match &self.delta_kcoa_poly {
            Some(poly) => offset - poly.coefficient(0, 0),
            None => offset,
        }
    }

    /// Single-term centroid polynomial implied by kCenter
    pub fn derived_kcoa_poly(&self, offset: f64) -> SarResult<Poly2D> {
        let k_center = self
            .k_center
            .ok_or_else(|| SarError::MissingPrecondition("kCenter".to_string()))?;
        Ok(Poly2D::constant(offset - k_center))
    }

    /// Derive kCenter and the centroid polynomial from each other for
    /// range/azimuth compensation, `offset` being the direction's reference wavenumber
    pub fn fill_derived_fields_rgazcomp(&mut self, offset: f64) {
        if self.k_center.is_none() {
            self.k_center = Some(self.derived_k_center(offset));
        }
        if self.delta_kcoa_poly.is_none() {
            if let Ok(poly) = self.derived_kcoa_poly(offset) {
                self.delta_kcoa_poly = Some(poly);
            }
        }
    }

    /// Check bounds, derived support and weighting of this direction
    pub fn validate(&self, image_data: &ImageData) -> ValidationReport {
        self.validate_labeled("Row/Col", image_data)
    }

    pub(crate) fn validate_labeled(&self, label: &str, image_data: &ImageData) -> ValidationReport {
        let mut report = ValidationReport::new();
        let delta_k1 = require(&mut report, self.delta_k1, &format!("Grid.{}.DeltaK1", label));
        let delta_k2 = require(&mut report, self.delta_k2, &format!("Grid.{}.DeltaK2", label));

        if let (Some(dk1), Some(dk2)) = (delta_k1, delta_k2) {
            if dk2 <= dk1 {
                report.error(format!(
                    "{}: Grid.{}.DeltaK1 {} is not below DeltaK2 {}",
                    BOUNDS_ERROR, label, dk1, dk2
                ));
            } else {
                if let Some(ss) = self.sample_spacing {
                    let nyquist = 1.0 / (2.0 * ss);
                    if dk2 > nyquist + f64::EPSILON {
                        report.error(format!(
                            "{}: Grid.{}.DeltaK2 {} exceeds 0.5/SampleSpacing {}",
                            BOUNDS_ERROR, label, dk2, nyquist
                        ));
                    }
                    if dk1 < -nyquist - f64::EPSILON {
                        report.error(format!(
                            "{}: Grid.{}.DeltaK1 {} is below -0.5/SampleSpacing {}",
                            BOUNDS_ERROR, label, dk1, -nyquist
                        ));
                    }
                }
                if let Some(bw) = self.impulse_response_bandwidth {
                    if bw > (dk2 - dk1) + f64::EPSILON {
                        report.error(format!(
                            "{}: Grid.{}.ImpRespBW {} exceeds DeltaK2 - DeltaK1 {}",
                            BOUNDS_ERROR,
                            label,
                            bw,
                            dk2 - dk1
                        ));
                    }
                }
            }

            match self.calculate_delta_ks(image_data) {
                Ok((min_dk, max_dk)) => {
                    if relative_mismatch(dk1, min_dk) > DK_TOL {
                        report.error(format!(
                            "{}: Grid.{}.DeltaK1 {}, derived {}",
                            BOUNDS_ERROR, label, dk1, min_dk
                        ));
                    }
                    if relative_mismatch(dk2, max_dk) > DK_TOL {
                        report.error(format!(
                            "{}: Grid.{}.DeltaK2 {}, derived {}",
                            BOUNDS_ERROR, label, dk2, max_dk
                        ));
                    }
                }
                Err(e) => report.error(format!("Cannot derive Grid.{} deltaK support: {}", label, e)),
            }
        }

        if let Some(weight_type) = &self.weight_type {
            match self.calculate_weight_function() {
                Ok(Some(function)) => {
                    if !self.weights.is_empty() {
                        report.merge(self.validate_weights(&function, label));
                    }
                }
                Ok(None) | Err(_) => report.warning(format!(
                    "Unrecognized weighting description. Grid.{}.WgtType.WindowName: {}",
                    label, weight_type.window_name
                )),
            }

            if !weight_type.is_named("UNIFORM") && !weight_type.is_named("UNKNOWN") && self.weights.is_empty() {
                report.advisory(format!(
                    "Non-uniform weighting, but no WgtFunct provided. Grid.{}.WgtType.WindowName: {}",
                    label, weight_type.window_name
                ));
            }
        }

        report
    }

    /// Compare explicit weights against the window they claim to sample
    pub fn validate_weights(&self, function: &WeightFunction, label: &str) -> ValidationReport {
        let mut report = ValidationReport::new();
        let consistent = if function.is_uniform() {
            let first = self.weights.first().copied().unwrap_or(0.0);
            self.weights.iter().all(|&w| w == first)
        } else {
            let expected = function.sample(self.weights.len());
            expected
                .iter()
                .zip(self.weights.iter())
                .all(|(e, w)| (e - w).abs() <= WGT_TOL)
        };

        if !consistent {
            let name = self
                .weight_type
                .as_ref()
                .map(|w| w.window_name.as_str())
                .unwrap_or("");
            report.warning(format!(
                "Grid.{} weights inconsistent with weightType. WindowName: {}",
                label, name
            ));
        }
        report
    }

    /// Range/azimuth compensation rules for kCenter and the centroid polynomial
    pub fn validate_rgazcomp(&self, offset: f64) -> ValidationReport {
        self.validate_rgazcomp_labeled("Row/Col", offset)
    }

    fn validate_rgazcomp_labeled(&self, label: &str, offset: f64) -> ValidationReport {
        let mut report = ValidationReport::new();
        if let Some(k_center) = require(&mut report, self.k_center, &format!("Grid.{}.KCtr", label)) {
            let derived = self.derived_k_center(offset);
            // Allows for rounding in offset - (offset - kCenter)
            let tolerance = 8.0 * f64::EPSILON * offset.abs().max(k_center.abs()).max(1.0);
            if (k_center - derived).abs() > tolerance {
                report.error(format!(
                    "Grid.{}.KCtr {} inconsistent with DeltaKCOAPoly; expected {}",
                    label, k_center, derived
                ));
            }
        }
        if let Some(poly) = &self.delta_kcoa_poly {
            if !poly.is_scalar() {
                report.error(format!(
                    "Grid.{}.DeltaKCOAPoly must be a single value for RGAZCOMP data",
                    label
                ));
            }
        }
        report
    }
}

/// Image grid description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub image_plane: Option<ImagePlaneType>,
    pub grid_type: Option<ImageGridType>,
    /// Time of center of aperture versus image grid (row, col) meters
    pub time_coa_poly: Option<Poly2D>,
    pub row: DirectionParameters,
    pub col: DirectionParameters,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spotlight collections have a constant time of center of aperture
    pub fn validate_time_coa_poly(&self, collection: &CollectionInformation) -> ValidationReport {
        let mut report = ValidationReport::new();
        let Some(poly) = &self.time_coa_poly else {
            report.error("Grid.TimeCOAPoly is undefined");
            return report;
        };

        let scalar = poly.is_scalar();
        if collection.radar_mode == RadarMode::Spotlight && !scalar {
            report.error("SPOTLIGHT data should only have scalar TimeCOAPoly.");
        }
        if collection.radar_mode != RadarMode::Spotlight && scalar {
            report.warning(
                "Non-SPOTLIGHT data will generally have more than one nonzero term in TimeCOAPoly \
                 unless \"formed as spotlight\".",
            );
        }
        report
    }

    pub fn validate_fft_signs(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let row = require(&mut report, self.row.sign, "Grid.Row.Sgn");
        let col = require(&mut report, self.col.sign, "Grid.Col.Sgn");
        if let (Some(row), Some(col)) = (row, col) {
            if row != col {
                report.error(format!(
                    "FFT signs in row and column direction should be the same. \
                     Grid.Row.Sgn: {}, Grid.Col.Sgn: {}",
                    row, col
                ));
            }
        }
        report
    }

    /// Time of center of aperture, FFT signs and both directions
    pub fn validate(&self, collection: &CollectionInformation, image_data: &ImageData) -> ValidationReport {
        let mut report = self.validate_time_coa_poly(collection);
        report.merge(self.validate_fft_signs());
        report.merge(self.row.validate_labeled("Row", image_data));
        report.merge(self.col.validate_labeled("Col", image_data));
        report
    }

    pub fn fill_derived_fields(
        &mut self,
        collection: &CollectionInformation,
        image_data: &ImageData,
        scpcoa: Option<&Scpcoa>,
    ) {
        if let Some(scpcoa) = scpcoa {
            if collection.radar_mode == RadarMode::Spotlight && self.time_coa_poly.is_none() {
                self.time_coa_poly = Some(Poly2D::constant(scpcoa.scp_time));
            }
        }
        self.row.fill_derived_fields(image_data);
        self.col.fill_derived_fields(image_data);
    }

    /// Grid type each range migration variant produces
    pub fn default_grid_type(rma: &Rma) -> ImageGridType {
        match rma {
            Rma::Rmat(_) => ImageGridType::XctYat,
            Rma::Rmcr(_) => ImageGridType::XrgYcr,
            Rma::Inca(_) => ImageGridType::RgZero,
        }
    }

    /// Image plane each range migration variant produces; INCA keeps the current plane
    pub fn default_plane_type(&self, rma: &Rma) -> Option<ImagePlaneType> {
        match rma {
            Rma::Rmat(_) | Rma::Rmcr(_) => Some(ImagePlaneType::Slant),
            Rma::Inca(_) => self.image_plane,
        }
    }

    /// Range/azimuth compensation row unit vector: the line of sight
    pub fn derived_row_unit_vector(scpcoa: &Scpcoa, scp: &Vector3) -> Vector3 {
        scpcoa.u_los(scp)
    }

    pub fn derived_col_unit_vector(scpcoa: &Scpcoa, scp: &Vector3) -> Vector3 {
        scpcoa.slant_plane_normal(scp).cross(&scpcoa.u_los(scp))
    }

    pub fn derived_row_k_center_rmat(rmat: &Rmat, fc: f64) -> f64 {
        two_way_wavenumber(fc) * rmat.dop_cone_angle_ref.to_radians().sin()
    }

    pub fn derived_col_k_center_rmat(rmat: &Rmat, fc: f64) -> f64 {
        two_way_wavenumber(fc) * rmat.dop_cone_angle_ref.to_radians().cos()
    }

    pub fn derived_row_k_center_inca(inca: &Inca) -> f64 {
        two_way_wavenumber(inca.freq_zero)
    }

    /// Fill the fields the image formation geometry determines
    pub fn fill_derived_formation_fields(
        &mut self,
        formation: &ImageFormation,
        context: &FormationContext<'_>,
    ) -> SarResult<()> {
        match formation {
            ImageFormation::Rma(Rma::Rmat(rmat)) => {
                let scp = context.require_scp()?;
                if self.row.unit_vector.is_none() && self.col.unit_vector.is_none() {
                    self.row.unit_vector = Some(rmat.u_xct(&scp));
                    self.col.unit_vector = Some(rmat.u_yat(&scp));
                }
            }
            ImageFormation::Rma(Rma::Rmcr(rmcr)) => {
                let scp = context.require_scp()?;
                if self.row.unit_vector.is_none() && self.col.unit_vector.is_none() {
                    self.row.unit_vector = Some(rmcr.u_xrg(&scp));
                    self.col.unit_vector = Some(rmcr.u_ycr(&scp));
                }
            }
            ImageFormation::Rma(Rma::Inca(inca)) => {
                if let Some(arp_poly) = context.arp_poly {
                    if self.row.unit_vector.is_none() && self.col.unit_vector.is_none() {
                        let scp = context.require_scp()?;
                        self.row.unit_vector = Some(inca.u_rg(&scp, arp_poly));
                        self.col.unit_vector = Some(inca.u_az(&scp, arp_poly));
                    }
                }
                if self.col.k_center.is_none() {
                    self.col.k_center = Some(0.0);
                }
                if self.row.k_center.is_none() {
                    self.row.k_center = Some(Self::derived_row_k_center_inca(inca));
                }
            }
            ImageFormation::Pfa(_) => {
                log::debug!("PFA grid has no geometry-derived fields");
            }
            ImageFormation::RgAzComp(_) => {
                let scp = context.require_scp()?;
                let scpcoa = context.require_scpcoa()?;
                let fc = context.require_center_frequency()?;

                if self.image_plane.is_none() {
                    self.image_plane = Some(ImagePlaneType::Slant);
                }
                if self.grid_type.is_none() {
                    self.grid_type = Some(ImageGridType::RgAzim);
                }
                if self.row.unit_vector.is_none() {
                    self.row.unit_vector = Some(Self::derived_row_unit_vector(scpcoa, &scp));
                }
                if self.col.unit_vector.is_none() {
                    self.col.unit_vector = Some(Self::derived_col_unit_vector(scpcoa, &scp));
                }
                self.row.fill_derived_fields_rgazcomp(two_way_wavenumber(fc));
                self.col.fill_derived_fields_rgazcomp(0.0);
            }
        }
        Ok(())
    }

    /// Fill conventional defaults for the image formation algorithm
    pub fn fill_default_fields(&mut self, formation: &ImageFormation, context: &FormationContext<'_>) {
        let fc = context.center_frequency;
        match formation {
            ImageFormation::Rma(rma) => {
                if self.image_plane.is_none() {
                    self.image_plane = self.default_plane_type(rma);
                }
                if self.grid_type.is_none() {
                    self.grid_type = Some(Self::default_grid_type(rma));
                }
                match (rma, fc) {
                    (Rma::Rmat(rmat), Some(fc)) => {
                        if self.row.k_center.is_none() {
                            self.row.k_center = Some(Self::derived_row_k_center_rmat(rmat, fc));
                        }
                        if self.col.k_center.is_none() {
                            self.col.k_center = Some(Self::derived_col_k_center_rmat(rmat, fc));
                        }
                    }
                    (Rma::Rmcr(_), Some(fc)) => {
                        if self.row.k_center.is_none() {
                            self.row.k_center = Some(two_way_wavenumber(fc));
                        }
                        if self.col.k_center.is_none() {
                            self.col.k_center = Some(0.0);
                        }
                    }
                    _ => {}
                }
            }
            ImageFormation::Pfa(pfa) => {
                if self.grid_type.is_none() {
                    self.grid_type = Some(ImageGridType::RgAzim);
                }
                if self.col.k_center.is_none() {
                    self.col.k_center = Some(0.0);
                }
                if self.row.k_center.is_none() {
                    self.row.k_center = match (pfa.krg1, pfa.krg2, fc) {
                        (Some(krg1), Some(krg2), _) => Some((krg1 + krg2) / 2.0),
                        // Ignores PFA rectangular inscription loss
                        (_, _, Some(fc)) => {
                            Some(two_way_wavenumber(fc) * pfa.spatial_frequency_scale_factor_poly[0])
                        }
                        _ => None,
                    };
                }
            }
            ImageFormation::RgAzComp(_) => {}
        }
    }

    /// Check the grid against the image formation algorithm
    pub fn validate_formation(
        &self,
        formation: &ImageFormation,
        context: &FormationContext<'_>,
    ) -> SarResult<ValidationReport> {
        log::debug!("Validating grid against {} image formation", formation);
        match formation {
            ImageFormation::Rma(rma) => self.validate_rma(rma, context),
            ImageFormation::Pfa(pfa) => Ok(self.validate_pfa(pfa, context)),
            ImageFormation::RgAzComp(_) => self.validate_rgazcomp(context),
        }
    }

    fn validate_rma(&self, rma: &Rma, context: &FormationContext<'_>) -> SarResult<ValidationReport> {
        let scp = context.require_scp()?;
        let mut report = ValidationReport::new();

        let expected = Self::default_grid_type(rma);
        if self.grid_type != Some(expected) {
            report.error(format!(
                "Given image formation algorithm expects {}. Found {}",
                expected,
                self.grid_type.map_or("undefined".to_string(), |t| t.to_string())
            ));
        }

        match rma {
            Rma::Rmat(rmat) => {
                let fc = context.require_center_frequency()?;
                check_unit_vector(&mut report, "Grid.Row.UVectECF", self.row.unit_vector, rmat.u_xct(&scp));
                check_unit_vector(&mut report, "Grid.Col.UVectECF", self.col.unit_vector, rmat.u_yat(&scp));

                let row_k = Self::derived_row_k_center_rmat(rmat, fc);
                if let Some(k) = require(&mut report, self.row.k_center, "Grid.Row.KCtr") {
                    if relative_mismatch(row_k, k) > WF_TOL {
                        report.warning(format!("{}. Grid.Row.KCtr: {}, derived: {}", WF_INCONSISTENT, k, row_k));
                    }
                }
                let col_k = Self::derived_col_k_center_rmat(rmat, fc);
                if let Some(k) = require(&mut report, self.col.k_center, "Grid.Col.KCtr") {
                    if relative_mismatch(col_k, k) > WF_TOL {
                        report.warning(format!("{}. Grid.Col.KCtr: {}, derived: {}", WF_INCONSISTENT, k, col_k));
                    }
                }
            }
            Rma::Rmcr(rmcr) => {
                check_unit_vector(&mut report, "Grid.Row.UVectECF", self.row.unit_vector, rmcr.u_xrg(&scp));
                check_unit_vector(&mut report, "Grid.Col.UVectECF", self.col.unit_vector, rmcr.u_ycr(&scp));

                if let Some(k) = require(&mut report, self.col.k_center, "Grid.Col.KCtr") {
                    if k != 0.0 {
                        report.error(format!("Grid.Col.KCtr must be zero for RMA/RMCR data. Found {}", k));
                    }
                }
                if let Some(fc) = context.center_frequency {
                    let row_k = two_way_wavenumber(fc);
                    if let Some(k) = require(&mut report, self.row.k_center, "Grid.Row.KCtr") {
                        if relative_mismatch(k, row_k) > WF_TOL {
                            report.warning(format!(
                                "{}. Grid.Row.KCtr: {}, center frequency * 2/c: {}",
                                WF_INCONSISTENT, k, row_k
                            ));
                        }
                    }
                }
            }
            Rma::Inca(inca) => {
                let arp_poly = context.require_arp_poly()?;
                self.check_inca_centroid(inca, &mut report);

                check_unit_vector(&mut report, "Grid.Row.UVectECF", self.row.unit_vector, inca.u_rg(&scp, arp_poly));
                check_unit_vector(&mut report, "Grid.Col.UVectECF", self.col.unit_vector, inca.u_az(&scp, arp_poly));

                if let Some(k) = require(&mut report, self.col.k_center, "Grid.Col.KCtr") {
                    if k != 0.0 {
                        report.error(format!("Grid.Col.KCtr must be zero for RMA/INCA data. Found {}", k));
                    }
                }
                let row_k = Self::derived_row_k_center_inca(inca);
                if let Some(k) = require(&mut report, self.row.k_center, "Grid.Row.KCtr") {
                    if relative_mismatch(k, row_k) > WF_TOL {
                        report.error(format!(
                            "{}. Grid.Row.KCtr: {}, RMA.INCA.FreqZero * 2/c: {}",
                            WF_INCONSISTENT, k, row_k
                        ));
                    }
                }
            }
        }
        Ok(report)
    }

    /// Column centroid polynomial must equal the Doppler centroid scaled by the
    /// closest approach time rate when the centroid defines center of aperture
    fn check_inca_centroid(&self, inca: &Inca, report: &mut ValidationReport) {
        let Some(centroid) = &inca.doppler_centroid_poly else {
            return;
        };
        if !inca.doppler_centroid_coa {
            return;
        }
        let Some(kcoa) = require(report, self.col.delta_kcoa_poly.as_ref(), "Grid.Col.DeltaKCOAPoly") else {
            return;
        };
        let time_ca_rate = inca.time_ca_poly.coefficients().get(1).copied().unwrap_or(0.0);
        let difference = kcoa - &(centroid * time_ca_rate);
        if difference.frobenius_norm() > IFP_POLY_TOL {
            report.error(
                "RMA.INCA fields inconsistent. Compare Grid.Col.DeltaKCOAPoly to \
                 RMA.INCA.DopCentroidPoly * RMA.INCA.TimeCAPoly[1]",
            );
        }
    }

    fn validate_pfa(&self, pfa: &Pfa, context: &FormationContext<'_>) -> ValidationReport {
        let mut report = ValidationReport::new();
        let eps = f64::EPSILON;

        if self.grid_type != Some(ImageGridType::RgAzim) {
            report.error(format!(
                "PFA image formation should result in a RGAZIM grid. Grid.Type: {}",
                self.grid_type.map_or("undefined".to_string(), |t| t.to_string())
            ));
        }

        let row_k = require(&mut report, self.row.k_center, "Grid.Row.KCtr");
        let col_k = require(&mut report, self.col.k_center, "Grid.Col.KCtr");
        let row_ss = require(&mut report, self.row.sample_spacing, "Grid.Row.SS");
        let col_ss = require(&mut report, self.col.sample_spacing, "Grid.Col.SS");
        let row_bw = require(&mut report, self.row.impulse_response_bandwidth, "Grid.Row.ImpRespBW");
        let col_bw = require(&mut report, self.col.impulse_response_bandwidth, "Grid.Col.ImpRespBW");
        let krg1 = require(&mut report, pfa.krg1, "PFA.Krg1");
        let krg2 = require(&mut report, pfa.krg2, "PFA.Krg2");
        let kaz1 = require(&mut report, pfa.kaz1, "PFA.Kaz1");
        let kaz2 = require(&mut report, pfa.kaz2, "PFA.Kaz2");

        let ref_frequency_index = context.radar_collection.and_then(|rc| rc.ref_frequency_index);
        if let (None, Some(fc), Some(row_k), Some(col_bw)) = (ref_frequency_index, context.center_frequency, row_k, col_bw)
        {
            let kap_ctr = two_way_wavenumber(fc) * pfa.spatial_frequency_scale_factor_poly[0];
            // Rectangular inscription in the polar annulus offsets kapCtr from Row.KCtr
            let theta = ((col_bw / 2.0) / row_k).atan();
            let tolerance = (1.0 - theta.cos()).max(0.01);
            if relative_mismatch(row_k, kap_ctr) > tolerance {
                report.error(format!(
                    "{}. Grid.Row.KCtr: {}, derived KapCtr: {}",
                    WF_INCONSISTENT, row_k, kap_ctr
                ));
            }
        }

        // Slow-time deskew compresses Kaz support, allowing it past 1/Col.SS
        if !pfa.slow_time_deskew.applied {
            if let (Some(kaz1), Some(kaz2), Some(col_k), Some(col_ss)) = (kaz1, kaz2, col_k, col_ss) {
                let nyquist = 1.0 / (2.0 * col_ss);
                if kaz2 - col_k > nyquist + eps {
                    report.error(format!(
                        "{}. PFA.Kaz2 - Grid.Col.KCtr: {}, 0.5/Grid.Col.SS: {}",
                        BOUNDS_ERROR,
                        kaz2 - col_k,
                        nyquist
                    ));
                }
                if kaz1 - col_k < -nyquist - eps {
                    report.error(format!(
                        "{}. PFA.Kaz1 - Grid.Col.KCtr: {}, -0.5/Grid.Col.SS: {}",
                        BOUNDS_ERROR,
                        kaz1 - col_k,
                        -nyquist
                    ));
                }
            }
        }

        if let (Some(krg1), Some(krg2), Some(row_k), Some(row_ss)) = (krg1, krg2, row_k, row_ss) {
            let nyquist = 1.0 / (2.0 * row_ss);
            if krg2 - row_k > nyquist + eps {
                report.error(format!(
                    "{}. PFA.Krg2 - Grid.Row.KCtr: {}, 0.5/Grid.Row.SS: {}",
                    BOUNDS_ERROR,
                    krg2 - row_k,
                    nyquist
                ));
            }
            if krg1 - row_k < -nyquist - eps {
                report.error(format!(
                    "{}. PFA.Krg1 - Grid.Row.KCtr: {}, -0.5/Grid.Row.SS: {}",
                    BOUNDS_ERROR,
                    krg1 - row_k,
                    -nyquist
                ));
            }
        }

        if let (Some(kaz1), Some(kaz2), Some(col_bw)) = (kaz1, kaz2, col_bw) {
            if col_bw > kaz2 - kaz1 + eps {
                report.error(format!(
                    "{}. Grid.Col.ImpRespBW: {}, PFA.Kaz2 - PFA.Kaz1: {}",
                    BOUNDS_ERROR,
                    col_bw,
                    kaz2 - kaz1
                ));
            }
        }
        if let (Some(krg1), Some(krg2), Some(row_bw)) = (krg1, krg2, row_bw) {
            if row_bw > krg2 - krg1 + eps {
                report.error(format!(
                    "{}. Grid.Row.ImpRespBW: {}, PFA.Krg2 - PFA.Krg1: {}",
                    BOUNDS_ERROR,
                    row_bw,
                    krg2 - krg1
                ));
            }
        }

        if let (Some(kaz1), Some(kaz2), Some(col_k)) = (kaz1, kaz2, col_k) {
            let mean_kaz = (kaz1 + kaz2) / 2.0;
            if col_k != 0.0 && (col_k - mean_kaz).abs() > 1e-5 {
                report.error(format!(
                    "{}. Grid.Col.KCtr: {}, mean(PFA.Kaz1, PFA.Kaz2): {}",
                    BOUNDS_ERROR, col_k, mean_kaz
                ));
            }
        }

        report
    }

    fn validate_rgazcomp(&self, context: &FormationContext<'_>) -> SarResult<ValidationReport> {
        let scp = context.require_scp()?;
        let scpcoa = context.require_scpcoa()?;
        let fc = context.require_center_frequency()?;
        let mut report = ValidationReport::new();

        if self.image_plane != Some(ImagePlaneType::Slant) {
            report.error(format!(
                "RGAZCOMP image formation should result in a SLANT plane image. Grid.ImagePlane: {}",
                self.image_plane.map_or("undefined".to_string(), |p| p.to_string())
            ));
        }
        if self.grid_type != Some(ImageGridType::RgAzim) {
            report.error(format!(
                "RGAZCOMP image formation should result in a RGAZIM grid. Grid.Type: {}",
                self.grid_type.map_or("undefined".to_string(), |t| t.to_string())
            ));
        }

        report.merge(self.col.validate_rgazcomp_labeled("Col", 0.0));
        report.merge(self.row.validate_rgazcomp_labeled("Row", two_way_wavenumber(fc)));

        check_unit_vector(
            &mut report,
            "Grid.Row.UVectECF",
            self.row.unit_vector,
            Self::derived_row_unit_vector(scpcoa, &scp),
        );
        check_unit_vector(
            &mut report,
            "Grid.Col.UVectECF",
            self.col.unit_vector,
            Self::derived_col_unit_vector(scpcoa, &scp),
        );
        Ok(report)
    }
}
