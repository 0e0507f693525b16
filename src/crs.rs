//! Coordinate reference systems and reprojection into the target grid.
//!
//! All region geometry and all point data must share one planar CRS before
//! classification: EPSG:27700 (British National Grid), which matches the
//! x/y columns of the inventory data. Source polygons arrive either as
//! geographic coordinates (EPSG:4326) or in the pan-European equal-area grid
//! (EPSG:3035) and are reprojected here.
//!
//! Transforms implemented directly from the published formulations:
//! Lambert azimuthal equal-area inverse (Snyder), a single Helmert
//! seven-parameter datum shift WGS84 -> OSGB36, and the OSGB Transverse
//! Mercator series on the Airy 1830 ellipsoid. The single Helmert step is
//! accurate to roughly 3 m against the national transformation, which is far
//! below region-polygon granularity.

use geo::{Coord, MapCoords, MultiPolygon};
use std::f64::consts::FRAC_PI_2;

use crate::error::{PrepError, Result};

/// The coordinate reference systems the assembler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// EPSG:4326 - WGS84 geographic longitude/latitude in degrees.
    Wgs84,
    /// EPSG:3035 - ETRS89-extended / LAEA Europe (GRS80).
    EuropeLaea,
    /// EPSG:27700 - OSGB36 / British National Grid. The fixed target CRS.
    BritishNationalGrid,
}

impl Crs {
    pub fn parse(code: &str) -> Result<Self> {
        match code.trim() {
            "EPSG:4326" => Ok(Crs::Wgs84),
            "EPSG:3035" => Ok(Crs::EuropeLaea),
            "EPSG:27700" => Ok(Crs::BritishNationalGrid),
            other => Err(PrepError::Configuration(format!(
                "unsupported coordinate reference system '{other}'"
            ))),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Crs::Wgs84 => "EPSG:4326",
            Crs::EuropeLaea => "EPSG:3035",
            Crs::BritishNationalGrid => "EPSG:27700",
        }
    }
}

/// Reproject a single coordinate pair into British National Grid.
///
/// For [`Crs::Wgs84`] the pair is (longitude, latitude) in degrees; for the
/// projected systems it is (easting, northing) in metres.
pub fn to_british_grid(from: Crs, x: f64, y: f64) -> (f64, f64) {
    match from {
        Crs::BritishNationalGrid => (x, y),
        Crs::Wgs84 => {
            let (lat, lon) = helmert_wgs84_to_osgb36(y.to_radians(), x.to_radians());
            tm_forward(lat, lon)
        }
        Crs::EuropeLaea => {
            // ETRS89 geographic coordinates are treated as WGS84; the datum
            // difference is centimetre-level.
            let (lon, lat) = laea_inverse(x, y);
            let (lat, lon) = helmert_wgs84_to_osgb36(lat, lon);
            tm_forward(lat, lon)
        }
    }
}

/// Reproject polygon geometry into British National Grid.
pub fn reproject(geometry: &MultiPolygon<f64>, from: Crs) -> MultiPolygon<f64> {
    if from == Crs::BritishNationalGrid {
        return geometry.clone();
    }
    geometry.map_coords(|coord: Coord<f64>| {
        let (x, y) = to_british_grid(from, coord.x, coord.y);
        Coord { x, y }
    })
}

#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    a: f64,
    b: f64,
}

impl Ellipsoid {
    const fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    fn e2(&self) -> f64 {
        (self.a * self.a - self.b * self.b) / (self.a * self.a)
    }
}

const AIRY_1830: Ellipsoid = Ellipsoid::new(6_377_563.396, 6_356_256.909);
const GRS80: Ellipsoid = Ellipsoid::new(6_378_137.0, 6_356_752.314_140);
const WGS84: Ellipsoid = Ellipsoid::new(6_378_137.0, 6_356_752.314_245);

// OSGB Transverse Mercator parameters (EPSG:27700).
const TM_SCALE: f64 = 0.999_601_271_7;
const TM_LAT0_DEG: f64 = 49.0;
const TM_LON0_DEG: f64 = -2.0;
const TM_E0: f64 = 400_000.0;
const TM_N0: f64 = -100_000.0;

/// OSGB36 geographic (radians) to British National Grid easting/northing.
///
/// OS series formulation; exact to sub-millimetre over the OSGB coverage.
fn tm_forward(lat: f64, lon: f64) -> (f64, f64) {
    let a = AIRY_1830.a * TM_SCALE;
    let b = AIRY_1830.b * TM_SCALE;
    let e2 = AIRY_1830.e2();
    let n = (AIRY_1830.a - AIRY_1830.b) / (AIRY_1830.a + AIRY_1830.b);

    let lat0 = TM_LAT0_DEG.to_radians();
    let lon0 = TM_LON0_DEG.to_radians();

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let nu = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let rho = a * (1.0 - e2) / (1.0 - e2 * sin_lat * sin_lat).powf(1.5);
    let eta2 = nu / rho - 1.0;

    let dlat = lat - lat0;
    let slat = lat + lat0;
    let m = b
        * ((1.0 + n + 1.25 * n * n + 1.25 * n * n * n) * dlat
            - (3.0 * n + 3.0 * n * n + 21.0 / 8.0 * n * n * n) * dlat.sin() * slat.cos()
            + (15.0 / 8.0 * (n * n + n * n * n)) * (2.0 * dlat).sin() * (2.0 * slat).cos()
            - (35.0 / 24.0 * n * n * n) * (3.0 * dlat).sin() * (3.0 * slat).cos());

    let i = m + TM_N0;
    let ii = nu / 2.0 * sin_lat * cos_lat;
    let iii = nu / 24.0 * sin_lat * cos_lat.powi(3) * (5.0 - tan_lat * tan_lat + 9.0 * eta2);
    let iiia = nu / 720.0
        * sin_lat
        * cos_lat.powi(5)
        * (61.0 - 58.0 * tan_lat * tan_lat + tan_lat.powi(4));
    let iv = nu * cos_lat;
    let v = nu / 6.0 * cos_lat.powi(3) * (nu / rho - tan_lat * tan_lat);
    let vi = nu / 120.0
        * cos_lat.powi(5)
        * (5.0 - 18.0 * tan_lat * tan_lat + tan_lat.powi(4) + 14.0 * eta2
            - 58.0 * tan_lat * tan_lat * eta2);

    let dlon = lon - lon0;
    let northing = i + ii * dlon.powi(2) + iii * dlon.powi(4) + iiia * dlon.powi(6);
    let easting = TM_E0 + iv * dlon + v * dlon.powi(3) + vi * dlon.powi(5);
    (easting, northing)
}

// Helmert seven-parameter transform WGS84 -> OSGB36 (OS published values).
const HELMERT_TX: f64 = -446.448;
const HELMERT_TY: f64 = 125.157;
const HELMERT_TZ: f64 = -542.060;
const HELMERT_RX_SEC: f64 = -0.1502;
const HELMERT_RY_SEC: f64 = -0.2470;
const HELMERT_RZ_SEC: f64 = -0.8421;
const HELMERT_S_PPM: f64 = 20.4894;

/// WGS84 geographic (radians) to OSGB36 geographic (radians).
fn helmert_wgs84_to_osgb36(lat: f64, lon: f64) -> (f64, f64) {
    let (x, y, z) = geodetic_to_cartesian(WGS84, lat, lon);

    let s = HELMERT_S_PPM * 1e-6;
    let rx = (HELMERT_RX_SEC / 3600.0).to_radians();
    let ry = (HELMERT_RY_SEC / 3600.0).to_radians();
    let rz = (HELMERT_RZ_SEC / 3600.0).to_radians();

    let x2 = HELMERT_TX + (1.0 + s) * x - rz * y + ry * z;
    let y2 = HELMERT_TY + rz * x + (1.0 + s) * y - rx * z;
    let z2 = HELMERT_TZ - ry * x + rx * y + (1.0 + s) * z;

    cartesian_to_geodetic(AIRY_1830, x2, y2, z2)
}

fn geodetic_to_cartesian(ell: Ellipsoid, lat: f64, lon: f64) -> (f64, f64, f64) {
    let e2 = ell.e2();
    let nu = ell.a / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();
    let x = nu * lat.cos() * lon.cos();
    let y = nu * lat.cos() * lon.sin();
    let z = (1.0 - e2) * nu * lat.sin();
    (x, y, z)
}

fn cartesian_to_geodetic(ell: Ellipsoid, x: f64, y: f64, z: f64) -> (f64, f64) {
    let e2 = ell.e2();
    let p = (x * x + y * y).sqrt();
    let mut lat = (z / (p * (1.0 - e2))).atan();
    // Converges in a handful of iterations for near-surface points.
    for _ in 0..10 {
        let nu = ell.a / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();
        let next = ((z + e2 * nu * lat.sin()) / p).atan();
        if (next - lat).abs() < 1e-12 {
            lat = next;
            break;
        }
        lat = next;
    }
    (lat, y.atan2(x))
}

// LAEA Europe parameters (EPSG:3035).
const LAEA_LAT0_DEG: f64 = 52.0;
const LAEA_LON0_DEG: f64 = 10.0;
const LAEA_FE: f64 = 4_321_000.0;
const LAEA_FN: f64 = 3_210_000.0;

fn laea_q(e: f64, lat: f64) -> f64 {
    let s = lat.sin();
    let es = e * s;
    (1.0 - e * e) * (s / (1.0 - es * es) - (1.0 / (2.0 * e)) * ((1.0 - es) / (1.0 + es)).ln())
}

struct LaeaConstants {
    e: f64,
    e2: f64,
    qp: f64,
    beta0: f64,
    rq: f64,
    d: f64,
    lat0: f64,
    lon0: f64,
}

fn laea_constants() -> LaeaConstants {
    let e2 = GRS80.e2();
    let e = e2.sqrt();
    let lat0 = LAEA_LAT0_DEG.to_radians();
    let lon0 = LAEA_LON0_DEG.to_radians();
    let qp = laea_q(e, FRAC_PI_2);
    let beta0 = (laea_q(e, lat0) / qp).asin();
    let rq = GRS80.a * (qp / 2.0).sqrt();
    let d = GRS80.a * lat0.cos() / ((1.0 - e2 * lat0.sin() * lat0.sin()).sqrt() * rq * beta0.cos());
    LaeaConstants {
        e,
        e2,
        qp,
        beta0,
        rq,
        d,
        lat0,
        lon0,
    }
}

/// EPSG:3035 easting/northing to ETRS89 geographic (radians, lon/lat).
fn laea_inverse(easting: f64, northing: f64) -> (f64, f64) {
    let c = laea_constants();
    let x = easting - LAEA_FE;
    let y = northing - LAEA_FN;

    let rho = ((x / c.d).powi(2) + (c.d * y).powi(2)).sqrt();
    if rho == 0.0 {
        return (c.lon0, c.lat0);
    }

    let ce = 2.0 * (rho / (2.0 * c.rq)).asin();
    let beta = (ce.cos() * c.beta0.sin() + c.d * y * ce.sin() * c.beta0.cos() / rho).asin();
    let lon = c.lon0
        + (x * ce.sin()).atan2(
            c.d * rho * c.beta0.cos() * ce.cos() - c.d * c.d * y * c.beta0.sin() * ce.sin(),
        );

    let e2 = c.e2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let lat = beta
        + (e2 / 3.0 + 31.0 * e4 / 180.0 + 517.0 * e6 / 5040.0) * (2.0 * beta).sin()
        + (23.0 * e4 / 360.0 + 251.0 * e6 / 3780.0) * (4.0 * beta).sin()
        + (761.0 * e6 / 45360.0) * (6.0 * beta).sin();

    (lon, lat)
}

/// Forward LAEA projection, the inverse of [`laea_inverse`].
#[cfg(test)]
fn laea_forward(lon: f64, lat: f64) -> (f64, f64) {
    let c = laea_constants();
    let q = laea_q(c.e, lat);
    let beta = (q / c.qp).asin();
    let dlon = lon - c.lon0;

    let b = c.rq
        * (2.0 / (1.0 + c.beta0.sin() * beta.sin() + c.beta0.cos() * beta.cos() * dlon.cos()))
            .sqrt();
    let x = LAEA_FE + b * c.d * beta.cos() * dlon.sin();
    let y = LAEA_FN
        + b / c.d * (c.beta0.cos() * beta.sin() - c.beta0.sin() * beta.cos() * dlon.cos());
    (x, y)
}
