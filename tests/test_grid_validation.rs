use approx::assert_relative_eq;
use sarscene::core::grid::{two_way_wavenumber, DEFAULT_WEIGHT_SIZE};
use sarscene::core::{Poly1D, Poly2D, PolyXyz, Severity, WeightType};
use sarscene::metadata::{
    CollectionInformation, FormationContext, ImageData, ImageFormation, Inca, Pfa, RadarCollection, RgAzComp, Rma,
    Rmat, Rmcr, Scpcoa, SlowTimeDeskew,
};
use sarscene::{DirectionParameters, FftSign, Grid, ImageGridType, ImagePlaneType, LookDirection, RadarMode, Vector3};

const SPEED: f64 = 7000.0;
const FC: f64 = 1e10;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scp() -> Vector3 {
    Vector3::new(6_378_137.0, 0.0, 0.0)
}

fn arp0() -> Vector3 {
    scp() + Vector3::new(500e3, -300e3, 0.0)
}

fn arp_poly() -> PolyXyz {
    PolyXyz::new(vec![arp0(), Vector3::new(0.0, 0.0, SPEED)]).unwrap()
}

fn scpcoa() -> Scpcoa {
    Scpcoa {
        scp_time: 0.0,
        arp_pos: arp0(),
        arp_vel: Vector3::new(0.0, 0.0, SPEED),
        side_of_track: LookDirection::Right,
    }
}

fn direction(ss: f64, bw: f64) -> DirectionParameters {
    DirectionParameters {
        sample_spacing: Some(ss),
        impulse_response_bandwidth: Some(bw),
        sign: Some(FftSign::Negative),
        delta_kcoa_poly: Some(Poly2D::constant(0.0)),
        ..Default::default()
    }
}

fn inca() -> Inca {
    Inca {
        time_ca_poly: Poly1D::new(vec![0.0, 1.0 / SPEED]).unwrap(),
        r_ca_scp: (arp0() - scp()).norm(),
        freq_zero: FC,
        drate_sf_poly: Poly2D::constant(1.0),
        doppler_centroid_poly: Some(Poly2D::constant(2.0)),
        doppler_centroid_coa: true,
    }
}

fn pfa() -> Pfa {
    Pfa {
        polar_angle_poly: Poly1D::new(vec![0.0, -0.012]).unwrap(),
        spatial_frequency_scale_factor_poly: Poly1D::constant(0.975),
        krg1: Some(60.0),
        krg2: Some(70.0),
        kaz1: Some(-2.0),
        kaz2: Some(2.0),
        slow_time_deskew: SlowTimeDeskew::default(),
    }
}

fn pfa_grid() -> Grid {
    let mut grid = Grid::new();
    grid.grid_type = Some(ImageGridType::RgAzim);
    grid.row = direction(0.05, 8.0);
    grid.row.k_center = Some(65.0);
    grid.col = direction(0.1, 3.0);
    grid.col.k_center = Some(0.0);
    grid
}

#[test]
fn test_spotlight_grid_fill_then_validate() {
    init_logging();
    let collection = CollectionInformation {
        radar_mode: RadarMode::Spotlight,
    };
    let image = ImageData::new(2000, 1500);
    let mut grid = Grid::new();
    grid.row = direction(0.5, 0.9);
    grid.row.weight_type = Some(WeightType::new("HAMMING"));
    grid.col = direction(0.6, 0.7);
    grid.col.weight_type = Some(WeightType::new("UNIFORM"));

    grid.fill_derived_fields(&collection, &image, Some(&scpcoa()));
    assert_eq!(grid.time_coa_poly, Some(Poly2D::constant(0.0)));
    assert_relative_eq!(grid.row.delta_k1.unwrap(), -0.45, epsilon = 1e-12);
    assert_relative_eq!(grid.col.delta_k2.unwrap(), 0.35, epsilon = 1e-12);
    assert_eq!(grid.row.weights.len(), DEFAULT_WEIGHT_SIZE);
    assert!(grid.col.weights.iter().all(|&w| w == 1.0));

    let report = grid.validate(&collection, &image);
    assert!(report.is_valid(), "{}", report);
}

#[test]
fn test_stripmap_scalar_time_coa_warns_and_signs_checked() {
    init_logging();
    let collection = CollectionInformation {
        radar_mode: RadarMode::Stripmap,
    };
    let image = ImageData::new(100, 100);
    let mut grid = Grid::new();
    grid.time_coa_poly = Some(Poly2D::constant(3.0));
    grid.row = direction(0.5, 1.0);
    grid.col = direction(0.5, 1.0);
    grid.col.sign = Some(FftSign::Positive);
    grid.fill_derived_fields(&collection, &image, None);

    let report = grid.validate(&collection, &image);
    assert!(!report.is_valid());
    assert_eq!(report.count(Severity::Warning), 1);
    assert_eq!(report.count(Severity::Error), 1);
    assert!(report.mentions("FFT signs"));
}

#[test]
fn test_rgazcomp_fill_then_validate() {
    init_logging();
    let scpcoa = scpcoa();
    let context = FormationContext {
        scp: Some(scp()),
        scpcoa: Some(&scpcoa),
        center_frequency: Some(FC),
        ..Default::default()
    };
    let formation = ImageFormation::RgAzComp(RgAzComp {
        azimuth_scale_factor: 1.0,
        kaz_poly: Poly1D::constant(0.0),
    });

    let mut grid = Grid::new();
    grid.fill_derived_formation_fields(&formation, &context).unwrap();
    assert_eq!(grid.image_plane, Some(ImagePlaneType::Slant));
    assert_eq!(grid.grid_type, Some(ImageGridType::RgAzim));
    assert_relative_eq!(grid.row.k_center.unwrap(), two_way_wavenumber(FC));
    assert_relative_eq!(grid.col.unit_vector.unwrap(), Vector3::z(), epsilon = 1e-12);

    let report = grid.validate_formation(&formation, &context).unwrap();
    assert!(report.is_valid(), "{}", report);

    grid.row.delta_kcoa_poly = Some(Poly2D::constant(0.5));
    let report = grid.validate_formation(&formation, &context).unwrap();
    assert!(!report.is_valid());
    assert!(report.mentions("Grid.Row.KCtr"));
}

#[test]
fn test_rmcr_fill_then_validate() {
    init_logging();
    let formation = ImageFormation::Rma(Rma::Rmcr(Rmcr {
        pos_ref: arp0(),
        vel_ref: Vector3::new(0.0, 0.0, SPEED),
        dop_cone_angle_ref: 90.0,
    }));
    let context = FormationContext {
        scp: Some(scp()),
        center_frequency: Some(FC),
        ..Default::default()
    };

    let mut grid = Grid::new();
    grid.fill_default_fields(&formation, &context);
    grid.fill_derived_formation_fields(&formation, &context).unwrap();
    assert_eq!(grid.grid_type, Some(ImageGridType::XrgYcr));
    assert!(grid.validate_formation(&formation, &context).unwrap().is_valid());

    grid.col.k_center = Some(0.1);
    let report = grid.validate_formation(&formation, &context).unwrap();
    assert_eq!(report.count(Severity::Error), 1);
}

#[test]
fn test_rmat_wrong_unit_vectors() {
    init_logging();
    let rmat = Rmat {
        pos_ref: arp0(),
        vel_ref: Vector3::new(0.0, 0.0, SPEED),
        dop_cone_angle_ref: 90.0,
    };
    let formation = ImageFormation::Rma(Rma::Rmat(rmat.clone()));
    let context = FormationContext {
        scp: Some(scp()),
        center_frequency: Some(FC),
        ..Default::default()
    };

    let mut grid = Grid::new();
    grid.fill_default_fields(&formation, &context);
    grid.fill_derived_formation_fields(&formation, &context).unwrap();
    assert_eq!(grid.grid_type, Some(ImageGridType::XctYat));
    assert!(grid.validate_formation(&formation, &context).unwrap().is_valid());

    grid.row.unit_vector = Some(rmat.u_yat(&scp()));
    let report = grid.validate_formation(&formation, &context).unwrap();
    assert!(report.mentions("UVect fields inconsistent"));
}

#[test]
fn test_inca_fill_then_validate() {
    init_logging();
    let arp_poly = arp_poly();
    let formation = ImageFormation::Rma(Rma::Inca(inca()));
    let context = FormationContext {
        scp: Some(scp()),
        arp_poly: Some(&arp_poly),
        center_frequency: Some(FC),
        ..Default::default()
    };

    let mut grid = Grid::new();
    grid.col.delta_kcoa_poly = Some(Poly2D::constant(2.0 / SPEED));
    grid.fill_default_fields(&formation, &context);
    grid.fill_derived_formation_fields(&formation, &context).unwrap();
    assert_eq!(grid.grid_type, Some(ImageGridType::RgZero));
    assert_eq!(grid.image_plane, None);
    assert_eq!(grid.col.k_center, Some(0.0));
    assert_relative_eq!(grid.col.unit_vector.unwrap(), Vector3::z(), epsilon = 1e-12);

    let report = grid.validate_formation(&formation, &context).unwrap();
    assert!(report.is_valid(), "{}", report);

    grid.col.delta_kcoa_poly = Some(Poly2D::constant(1e-3));
    let report = grid.validate_formation(&formation, &context).unwrap();
    assert!(report.mentions("RMA.INCA fields inconsistent"));

    grid.col.delta_kcoa_poly = Some(Poly2D::constant(2.0 / SPEED));
    grid.row.k_center = Some(two_way_wavenumber(FC) * 1.01);
    let report = grid.validate_formation(&formation, &context).unwrap();
    assert_eq!(report.count(Severity::Error), 1);
}

#[test]
fn test_inca_requires_arp_poly() {
    let formation = ImageFormation::Rma(Rma::Inca(inca()));
    let context = FormationContext {
        scp: Some(scp()),
        ..Default::default()
    };
    assert!(Grid::new().validate_formation(&formation, &context).is_err());
}

#[test]
fn test_pfa_bounds() {
    init_logging();
    let radar_collection = RadarCollection::default();
    let context = FormationContext {
        center_frequency: Some(FC),
        radar_collection: Some(&radar_collection),
        ..Default::default()
    };
    let grid = pfa_grid();
    let report = grid.validate_formation(&ImageFormation::Pfa(pfa()), &context).unwrap();
    assert!(report.is_valid(), "{}", report);

    let mut wide = pfa_grid();
    wide.col.impulse_response_bandwidth = Some(5.0);
    let report = wide.validate_formation(&ImageFormation::Pfa(pfa()), &context).unwrap();
    assert!(report.mentions("PFA.Kaz2 - PFA.Kaz1"));

    let mut off_center = pfa_grid();
    off_center.row.k_center = Some(60.0);
    let report = off_center.validate_formation(&ImageFormation::Pfa(pfa()), &context).unwrap();
    assert!(report.mentions("derived KapCtr"));
}

#[test]
fn test_pfa_deskew_relaxes_azimuth_bounds() {
    init_logging();
    let context = FormationContext {
        center_frequency: Some(FC),
        ..Default::default()
    };
    let mut pfa = pfa();
    pfa.kaz2 = Some(8.0);
    let grid = pfa_grid();

    let report = grid.validate_formation(&ImageFormation::Pfa(pfa.clone()), &context).unwrap();
    assert!(report.mentions("PFA.Kaz2 - Grid.Col.KCtr"));

    pfa.slow_time_deskew.applied = true;
    let report = grid.validate_formation(&ImageFormation::Pfa(pfa), &context).unwrap();
    assert!(report.is_valid(), "{}", report);
}

#[test]
fn test_pfa_reference_frequency_skips_kap_center() {
    let radar_collection = RadarCollection {
        ref_frequency_index: Some(0),
    };
    let context = FormationContext {
        center_frequency: Some(FC),
        radar_collection: Some(&radar_collection),
        ..Default::default()
    };
    let mut grid = pfa_grid();
    grid.row.k_center = Some(64.0);
    let mut pfa = pfa();
    pfa.krg1 = Some(59.0);
    pfa.krg2 = Some(69.0);
    let report = grid.validate_formation(&ImageFormation::Pfa(pfa), &context).unwrap();
    assert!(report.is_valid(), "{}", report);
}
