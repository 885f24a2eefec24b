/*!
Slant-plane projection model.

Converts between continuous image grid locations and scene (ECEF) points. Image
grid locations are (row, col) distances in meters from the scene center point
measured along the image plane unit vectors. The algorithm-specific part, the
R/Rdot contour, is delegated to [`ContourModel`].
*/

use crate::core::contour::{
    Contour, ContourEquation, ContourGeometry, ContourModel, PlaneContour, RangeAzimuthContour,
    RangeZeroContour,
};
use crate::core::grid_geometry::GridGeometry;
use crate::core::poly::{Poly1D, Poly2D, PolyXyz};
use crate::types::{LookDirection, RowCol, SarError, SarResult, Vector3};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Upper bound on contour evaluations in a scene to image solve
pub const MAX_ITER: usize = 50;

/// Ground plane distance (meters) below which the solve has converged
pub const DELTA_GP_MAX: f64 = 0.001;

/// Samples per dimension when fitting projection polynomials
pub const POLY_FIT_SAMPLES: usize = 10;

/// Iterative solver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Maximum contour evaluations, clamped to `MAX_ITER`
    pub max_iterations: usize,
    /// Convergence threshold on the ground plane update (meters)
    pub delta_gp_max: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITER,
            delta_gp_max: DELTA_GP_MAX,
        }
    }
}

/// Geometry shared by every projection model
#[derive(Debug, Clone)]
pub struct ProjectionParams {
    pub slant_plane_normal: Vector3,
    pub image_plane_row: Vector3,
    pub image_plane_col: Vector3,
    /// Scene center point (ECEF)
    pub scp: Vector3,
    /// Aperture reference position versus time
    pub arp_poly: PolyXyz,
    /// Time of center of aperture versus image grid (row, col) meters
    pub time_coa_poly: Poly2D,
    pub look: LookDirection,
}

/// Calibration adjustments applied on top of the fitted metadata
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustableOffsets {
    pub arp_position: Vector3,
    pub arp_velocity: Vector3,
    pub range_bias: f64,
}

impl Default for AdjustableOffsets {
    fn default() -> Self {
        Self {
            arp_position: Vector3::zeros(),
            arp_velocity: Vector3::zeros(),
            range_bias: 0.0,
        }
    }
}

/// Outcome of a scene to image solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneToImage {
    /// Continuous image grid location (meters from the scene center)
    pub image_point: RowCol<f64>,
    /// Time of center of aperture at `image_point`
    pub time_coa: f64,
    /// Contour evaluations performed
    pub iterations: usize,
    /// Magnitude of the last ground plane update (meters)
    pub residual: f64,
    pub converged: bool,
}

/// Outcome of an image to scene projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageToScene {
    pub scene_point: Vector3,
    pub time_coa: f64,
}

/// Inputs to [`ProjectionModel::compute_projection_polynomials`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionPolynomialParams {
    /// First slant pixel of the area of interest, zero for a full image
    pub in_pixel_start: RowCol<f64>,
    /// Slant image scene center pixel
    pub in_scene_center: RowCol<f64>,
    /// Slant image sample spacing (meters)
    pub in_sample_spacing: RowCol<f64>,
    /// Output image scene center pixel
    pub out_scene_center: RowCol<f64>,
    /// Output image sample spacing (meters)
    pub out_sample_spacing: RowCol<f64>,
    /// Output image size in pixels
    pub out_extent: RowCol<usize>,
    pub poly_order: usize,
}

/// Polynomials mapping output pixels to slant pixels and time of center of aperture
#[derive(Debug, Clone)]
pub struct ProjectionPolynomials {
    pub output_to_slant_row: Poly2D,
    pub output_to_slant_col: Poly2D,
    pub time_coa_poly: Poly2D,
    /// Mean squared fit residual (slant pixels squared)
    pub mean_residual_error_row: f64,
    pub mean_residual_error_col: f64,
    /// Mean squared fit residual (seconds squared)
    pub mean_residual_error_time_coa: f64,
}

/// Projection model for one image
#[derive(Debug, Clone)]
pub struct ProjectionModel {
    geometry: ContourGeometry,
    slant_plane_normal: Vector3,
    image_plane_normal: Vector3,
    /// Cosine between the slant and image plane normals
    scale_factor: f64,
    time_coa_poly: Poly2D,
    contour: ContourModel,
    offsets: AdjustableOffsets,
    config: ProjectionConfig,
}

fn unit(v: &Vector3, name: &str) -> SarResult<Vector3> {
    if !v.iter().all(|c| c.is_finite()) {
        return Err(SarError::InvalidGeometry(format!("{} is not finite: {:?}", name, v)));
    }
    v.try_normalize(f64::EPSILON)
        .ok_or_else(|| SarError::InvalidGeometry(format!("{} has zero length", name)))
}

impl ProjectionModel {
    /// Build a model from the shared geometry and an algorithm contour
    pub fn new(params: ProjectionParams, contour: ContourModel) -> SarResult<Self> {
        contour.validate()?;

        let slant_plane_normal = unit(&params.slant_plane_normal, "slant plane normal")?;
        let image_plane_row = unit(&params.image_plane_row, "image plane row vector")?;
        let image_plane_col = unit(&params.image_plane_col, "image plane column vector")?;
        let image_plane_normal = image_plane_row
            .cross(&image_plane_col)
            .try_normalize(1e-9)
            .ok_or_else(|| {
                SarError::InvalidGeometry("image plane row and column vectors are parallel".to_string())
            })?;
        if !params.scp.iter().all(|c| c.is_finite()) {
            return Err(SarError::InvalidGeometry("scene center point is not finite".to_string()));
        }

        let scale_factor = image_plane_normal.dot(&slant_plane_normal);
        if scale_factor.abs() < 1e-9 {
            return Err(SarError::InvalidGeometry(
                "slant plane normal lies in the image plane".to_string(),
            ));
        }

        log::debug!(
            "Projection model: {} contour, look {}, scale factor {:.6}",
            contour,
            params.look,
            scale_factor
        );

        let arp_vel_poly = params.arp_poly.derivative();
        Ok(Self {
            geometry: ContourGeometry {
                scp: params.scp,
                image_plane_row,
                image_plane_col,
                arp_poly: params.arp_poly,
                arp_vel_poly,
                look: params.look,
            },
            slant_plane_normal,
            image_plane_normal,
            scale_factor,
            time_coa_poly: params.time_coa_poly,
            contour,
            offsets: AdjustableOffsets::default(),
            config: ProjectionConfig::default(),
        })
    }

    /// Polar format model
    pub fn range_azimuth(
        params: ProjectionParams,
        polar_angle_poly: Poly1D<f64>,
        ksf_poly: Poly1D<f64>,
    ) -> SarResult<Self> {
        Self::new(
            params,
            ContourModel::RangeAzimuth(RangeAzimuthContour::new(polar_angle_poly, ksf_poly)),
        )
    }

    /// Range migration INCA model
    pub fn range_zero(
        params: ProjectionParams,
        time_ca_poly: Poly1D<f64>,
        dsrf_poly: Poly2D,
        range_ca: f64,
    ) -> SarResult<Self> {
        Self::new(
            params,
            ContourModel::RangeZero(RangeZeroContour::new(time_ca_poly, dsrf_poly, range_ca)),
        )
    }

    /// Planar grid model (XRGYCR, XCTYAT and PLANE grids)
    pub fn plane(params: ProjectionParams) -> SarResult<Self> {
        Self::new(params, ContourModel::Plane(PlaneContour))
    }

    pub fn with_config(mut self, config: ProjectionConfig) -> Self {
        self.config = ProjectionConfig {
            max_iterations: config.max_iterations.clamp(1, MAX_ITER),
            delta_gp_max: config.delta_gp_max,
        };
        self
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn contour_model(&self) -> &ContourModel {
        &self.contour
    }

    pub fn geometry(&self) -> &ContourGeometry {
        &self.geometry
    }

    pub fn slant_plane_normal(&self) -> &Vector3 {
        &self.slant_plane_normal
    }

    pub fn image_plane_normal(&self) -> &Vector3 {
        &self.image_plane_normal
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn look(&self) -> LookDirection {
        self.geometry.look
    }

    pub fn offsets(&self) -> &AdjustableOffsets {
        &self.offsets
    }

    pub fn set_arp_position_offset(&mut self, offset: Vector3) {
        self.offsets.arp_position = offset;
    }

    pub fn set_arp_velocity_offset(&mut self, offset: Vector3) {
        self.offsets.arp_velocity = offset;
    }

    pub fn set_range_bias_offset(&mut self, offset: f64) {
        self.offsets.range_bias = offset;
    }

    pub fn compute_image_time(&self, pixel: RowCol<f64>) -> f64 {
        self.time_coa_poly.evaluate(pixel.row, pixel.col)
    }

    pub fn compute_arp_position(&self, time: f64) -> Vector3 {
        self.geometry.arp_poly.evaluate(time)
    }

    pub fn compute_arp_velocity(&self, time: f64) -> Vector3 {
        self.geometry.arp_vel_poly.evaluate(time)
    }

    /// Image grid location of a point lying in the image plane
    pub fn compute_image_coordinates(&self, image_plane_point: &Vector3) -> RowCol<f64> {
        let delta = image_plane_point - self.geometry.scp;
        RowCol::new(
            delta.dot(&self.geometry.image_plane_row),
            delta.dot(&self.geometry.image_plane_col),
        )
    }

    pub fn compute_contour(
        &self,
        arp_coa: &Vector3,
        vel_coa: &Vector3,
        time_coa: f64,
        pixel: RowCol<f64>,
    ) -> Contour {
        self.contour
            .compute_contour(&self.geometry, arp_coa, vel_coa, time_coa, pixel)
    }

    /// Time, offset aperture state and offset contour at an image grid location
    fn contour_at(&self, pixel: RowCol<f64>) -> (f64, Vector3, Vector3, Contour) {
        let time_coa = self.compute_image_time(pixel);
        let arp = self.compute_arp_position(time_coa) + self.offsets.arp_position;
        let vel = self.compute_arp_velocity(time_coa) + self.offsets.arp_velocity;
        let mut contour = self.compute_contour(&arp, &vel, time_coa, pixel);
        contour.r += self.offsets.range_bias;
        (time_coa, arp, vel, contour)
    }

    /// Intersect an R/Rdot contour with the plane through `ground_ref_point`
    /// normal to `ground_plane_normal`.
    ///
    /// Of the two intersections the one on the side of track given by the look
    /// direction is returned. A range shorter than the aperture height collapses
    /// onto the point below the aperture and an infeasible range rate is clamped
    /// to the nearest azimuth. `time_coa` is the time of the aperture state;
    /// the intersection depends only on the state itself.
    pub fn contour_to_ground_plane(
        &self,
        r_coa: f64,
        r_dot_coa: f64,
        arp_coa: &Vector3,
        vel_coa: &Vector3,
        _time_coa: f64,
        ground_plane_normal: &Vector3,
        ground_ref_point: &Vector3,
    ) -> SarResult<Vector3> {
        let u_z = unit(ground_plane_normal, "ground plane normal")?;

        let arp_z = (arp_coa - ground_ref_point).dot(&u_z);
        let arp_ground = arp_coa - u_z * arp_z;

        let ground_sq = r_coa * r_coa - arp_z * arp_z;
        if ground_sq <= 0.0 {
            log::debug!(
                "Range {:.3} m does not reach the ground plane {:.3} m below the aperture",
                r_coa,
                arp_z
            );
            return Ok(arp_ground);
        }
        let ground_range = ground_sq.sqrt();
        let cos_graz = ground_range / r_coa;
        let sin_graz = arp_z / r_coa;

        let vel_z = vel_coa.dot(&u_z);
        let vel_x_sq = vel_coa.norm_squared() - vel_z * vel_z;
        if vel_x_sq <= 0.0 {
            return Err(SarError::InvalidGeometry(
                "aperture velocity is normal to the ground plane".to_string(),
            ));
        }
        let vel_x = vel_x_sq.sqrt();
        let u_x = (vel_coa - u_z * vel_z) / vel_x;
        let u_y = u_z.cross(&u_x);

        let mut cos_az = (-r_dot_coa + vel_z * sin_graz) / (vel_x * cos_graz);
        if cos_az.abs() > 1.0 {
            log::debug!("Clamping azimuth cosine {:.6} onto the contour", cos_az);
            cos_az = cos_az.clamp(-1.0, 1.0);
        }
        let sin_az = self.geometry.look.sign() * (1.0 - cos_az * cos_az).sqrt();

        Ok(arp_ground + (u_x * cos_az + u_y * sin_az) * ground_range)
    }

    /// Scene to image using the local ground plane at the scene point
    pub fn scene_to_image(&self, scene_point: &Vector3) -> SarResult<SceneToImage> {
        let ground_plane_normal = unit(scene_point, "scene point")?;
        self.scene_to_image_on_plane(scene_point, &ground_plane_normal)
    }

    /// Scene to image with an explicit ground plane normal at the scene point
    pub fn scene_to_image_on_plane(
        &self,
        scene_point: &Vector3,
        ground_plane_normal: &Vector3,
    ) -> SarResult<SceneToImage> {
        if !scene_point.iter().all(|c| c.is_finite()) {
            return Err(SarError::InvalidGeometry(format!(
                "scene point is not finite: {:?}",
                scene_point
            )));
        }
        let ground_plane_normal = unit(ground_plane_normal, "ground plane normal")?;
        let spn = self.slant_plane_normal;
        let ipn = self.image_plane_normal;

        // Project the scene point onto the image plane along the slant plane normal
        let mut image_plane_point = scene_point
            + spn * ((self.geometry.scp - scene_point).dot(&ipn) / self.scale_factor);

        let mut residual = f64::INFINITY;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            iterations += 1;

            let pixel = self.compute_image_coordinates(&image_plane_point);
            let (time_coa, arp, vel, contour) = self.contour_at(pixel);
            let ground_plane_point = self.contour_to_ground_plane(
                contour.r,
                contour.r_dot,
                &arp,
                &vel,
                time_coa,
                &ground_plane_normal,
                scene_point,
            )?;

            let delta_gp = scene_point - ground_plane_point;
            residual = delta_gp.norm();
            image_plane_point += delta_gp - spn * (delta_gp.dot(&ipn) / self.scale_factor);

            log::debug!(
                "Scene to image iteration {}: pixel {}, ground residual {:.6e} m",
                iterations,
                pixel,
                residual
            );

            if residual < self.config.delta_gp_max {
                converged = true;
                break;
            }
        }

        if !converged {
            log::warn!(
                "Scene to image did not converge after {} iterations (residual {:.6e} m)",
                iterations,
                residual
            );
        }

        let image_point = self.compute_image_coordinates(&image_plane_point);
        Ok(SceneToImage {
            image_point,
            time_coa: self.compute_image_time(image_point),
            iterations,
            residual,
            converged,
        })
    }

    /// Single pass projection of an image grid location onto a ground plane
    pub fn image_to_scene(
        &self,
        image_grid_point: RowCol<f64>,
        ground_ref_point: &Vector3,
        ground_plane_normal: &Vector3,
    ) -> SarResult<ImageToScene> {
        let (time_coa, arp, vel, contour) = self.contour_at(image_grid_point);
        let scene_point = self.contour_to_ground_plane(
            contour.r,
            contour.r_dot,
            &arp,
            &vel,
            time_coa,
            ground_plane_normal,
            ground_ref_point,
        )?;
        Ok(ImageToScene {
            scene_point,
            time_coa,
        })
    }

    /// Fit polynomials from output pixels to slant pixels and time of center
    /// of aperture over a 10 x 10 sampling of the output extent.
    pub fn compute_projection_polynomials<G>(
        &self,
        grid_geometry: &G,
        params: &ProjectionPolynomialParams,
    ) -> SarResult<ProjectionPolynomials>
    where
        G: GridGeometry + Sync + ?Sized,
    {
        if params.out_extent.row == 0 || params.out_extent.col == 0 {
            return Err(SarError::MissingPrecondition(format!(
                "output extent must be non-empty, got {}",
                params.out_extent
            )));
        }

        let axis = |extent: usize| -> Vec<f64> {
            let last = extent.saturating_sub(1) as f64;
            (0..POLY_FIT_SAMPLES)
                .map(|i| i as f64 * last / (POLY_FIT_SAMPLES - 1) as f64)
                .collect()
        };
        let rows = axis(params.out_extent.row);
        let cols = axis(params.out_extent.col);
        let out_pixels: Vec<RowCol<f64>> = rows
            .iter()
            .flat_map(|&r| cols.iter().map(move |&c| RowCol::new(r, c)))
            .collect();

        log::info!(
            "Fitting order {} projection polynomials over {}x{} output pixels",
            params.poly_order,
            params.out_extent.row,
            params.out_extent.col
        );

        let sample = |out_pixel: &RowCol<f64>| -> SarResult<(RowCol<f64>, f64)> {
            let meters = (*out_pixel - params.out_scene_center) * params.out_sample_spacing;
            let scene_point = grid_geometry.row_col_to_ecef(meters);
            let solved = self.scene_to_image(&scene_point)?;
            if !solved.converged {
                log::warn!("Output pixel {} did not converge; using best estimate", out_pixel);
            }
            let slant_pixel = solved.image_point / params.in_sample_spacing + params.in_scene_center
                - params.in_pixel_start;
            Ok((slant_pixel, solved.time_coa))
        };

        #[cfg(feature = "parallel")]
        let samples: Vec<(RowCol<f64>, f64)> = out_pixels.par_iter().map(sample).collect::<SarResult<_>>()?;
        #[cfg(not(feature = "parallel"))]
        let samples: Vec<(RowCol<f64>, f64)> = out_pixels.iter().map(sample).collect::<SarResult<_>>()?;

        let x: Vec<f64> = out_pixels.iter().map(|p| p.row).collect();
        let y: Vec<f64> = out_pixels.iter().map(|p| p.col).collect();
        let slant_rows: Vec<f64> = samples.iter().map(|(p, _)| p.row).collect();
        let slant_cols: Vec<f64> = samples.iter().map(|(p, _)| p.col).collect();
        let times: Vec<f64> = samples.iter().map(|(_, t)| *t).collect();

        let order = params.poly_order;
        let output_to_slant_row = Poly2D::fit(&x, &y, &slant_rows, order, order)?;
        let output_to_slant_col = Poly2D::fit(&x, &y, &slant_cols, order, order)?;
        let time_coa_poly = Poly2D::fit(&x, &y, &times, order, order)?;

        let mean_sq = |poly: &Poly2D, truth: &[f64]| -> f64 {
            let sum: f64 = x
                .iter()
                .zip(y.iter())
                .zip(truth.iter())
                .map(|((&xv, &yv), &t)| (poly.evaluate(xv, yv) - t).powi(2))
                .sum();
            sum / truth.len() as f64
        };

        let polys = ProjectionPolynomials {
            mean_residual_error_row: mean_sq(&output_to_slant_row, &slant_rows),
            mean_residual_error_col: mean_sq(&output_to_slant_col, &slant_cols),
            mean_residual_error_time_coa: mean_sq(&time_coa_poly, &times),
            output_to_slant_row,
            output_to_slant_col,
            time_coa_poly,
        };
        log::debug!(
            "Projection polynomial mean squared residuals: row {:.3e}, col {:.3e}, tcoa {:.3e}",
            polys.mean_residual_error_row,
            polys.mean_residual_error_col,
            polys.mean_residual_error_time_coa
        );
        Ok(polys)
    }
}
