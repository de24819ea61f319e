//! Sun direction helpers and the background colour derived from it.

use glam::{DVec3, Vec3};
use std::f64::consts::{PI, TAU};

/// Converts a south-referenced azimuth (0 = south, towards west) into the
/// north-referenced clockwise convention and applies the model's north offset.
pub fn north_referenced_azimuth(south_azimuth: f64, north_offset: f64) -> f64 {
    (south_azimuth + PI + north_offset).rem_euclid(TAU)
}

/// Scene-space sun position (y up) for a north-referenced azimuth and altitude.
pub fn sun_position(azimuth: f64, altitude: f64, distance: f64) -> Vec3 {
    let theta = PI / 2.0 - altitude;
    let phi = -azimuth;

    let x = phi.sin() * (-theta).sin() * distance;
    let y = theta.sin() * phi.cos() * distance;
    let z = theta.cos() * distance;

    DVec3::new(x, z, -y).as_vec3()
}

/// A sun lower than this is considered below the horizon of the model.
pub fn sun_is_up(position: Vec3) -> bool {
    position.y > 3.0
}

/// Azimuth (south-referenced) and altitude in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolarPosition {
    pub azimuth: f64,
    pub altitude: f64,
}

const RAD: f64 = PI / 180.0;
const DAY_MS: f64 = 1000.0 * 60.0 * 60.0 * 24.0;
const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;
const OBLIQUITY: f64 = RAD * 23.4397;

fn to_days(unix_millis: i64) -> f64 {
    unix_millis as f64 / DAY_MS - 0.5 + J1970 - J2000
}

fn right_ascension(l: f64, b: f64) -> f64 {
    (l.sin() * OBLIQUITY.cos() - b.tan() * OBLIQUITY.sin()).atan2(l.cos())
}

fn declination(l: f64, b: f64) -> f64 {
    (b.sin() * OBLIQUITY.cos() + b.cos() * OBLIQUITY.sin() * l.sin()).asin()
}

fn solar_mean_anomaly(d: f64) -> f64 {
    RAD * (357.5291 + 0.98560028 * d)
}

fn ecliptic_longitude(m: f64) -> f64 {
    let center = RAD * (1.9148 * m.sin() + 0.02 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin());
    let perihelion = RAD * 102.9372;
    m + center + perihelion + PI
}

/// Solar position for a unix timestamp, latitude and longitude in degrees.
pub fn solar_position(unix_millis: i64, latitude: f64, longitude: f64) -> SolarPosition {
    let lw = RAD * -longitude;
    let phi = RAD * latitude;
    let d = to_days(unix_millis);

    let l = ecliptic_longitude(solar_mean_anomaly(d));
    let dec = declination(l, 0.0);
    let ra = right_ascension(l, 0.0);
    let h = RAD * (280.16 + 360.9856235 * d) - lw - ra;

    SolarPosition {
        azimuth: h.sin().atan2(h.cos() * phi.sin() - dec.tan() * phi.cos()),
        altitude: (phi.sin() * dec.sin() + phi.cos() * dec.cos() * h.cos()).asin(),
    }
}

/// Scene-space sun position for a moment at a geographic location.
pub fn sun_position_at(
    unix_millis: i64,
    latitude: f64,
    longitude: f64,
    north_offset: f64,
    distance: f64,
) -> Vec3 {
    let solar = solar_position(unix_millis, latitude, longitude);
    let azimuth = north_referenced_azimuth(solar.azimuth, north_offset);
    sun_position(azimuth, solar.altitude, distance)
}

const DAY_CLEAR: [f64; 4] = [0.960784314, 0.976470588, 1.0, 1.0];

/// Background colour: daylight, or a tinted night sky when shadows are on
/// and the sun is below the horizon.
pub fn clear_color(sun_is_up: bool, shadows_enabled: bool) -> [f64; 4] {
    if sun_is_up || !shadows_enabled {
        return DAY_CLEAR;
    }
    let sky = [0.494, 0.753, 0.933];
    let custom = [159.0 / 255.0, 171.0 / 255.0, 168.0 / 255.0];
    let base = [245.0 / 255.0, 249.0 / 255.0, 1.0];
    let mix = 0.4;

    let mut out = [0.0, 0.0, 0.0, 1.0];
    for i in 0..3 {
        out[i] = (sky[i] * (1.0 - mix) + custom[i] * mix) * base[i];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn south_zero_is_north_pi() {
        assert!((north_referenced_azimuth(0.0, 0.0) - PI).abs() < 1e-12);
    }

    #[test]
    fn north_offset_wraps() {
        let az = north_referenced_azimuth(0.0, PI / 2.0);
        assert!((az - 3.0 * PI / 2.0).abs() < 1e-12);
        let wrapped = north_referenced_azimuth(PI, PI / 2.0);
        assert!((wrapped - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn zenith_sun_is_straight_up() {
        let p = sun_position(1.234, PI / 2.0, 40.0);
        assert!(p.x.abs() < 1e-4);
        assert!(p.z.abs() < 1e-4);
        assert!((p.y - 40.0).abs() < 1e-4);
        assert!(sun_is_up(p));
    }

    #[test]
    fn horizon_sun_is_not_up() {
        let p = sun_position(0.3, 0.0, 40.0);
        assert!(p.y.abs() < 1e-4);
        assert!((p.length() - 40.0).abs() < 1e-3);
        assert!(!sun_is_up(p));
    }

    #[test]
    fn noon_sun_in_berlin_is_high_in_summer() {
        // 2021-06-21T11:00:00Z, close to solar noon in Berlin.
        let pos = solar_position(1_624_273_200_000, 52.52, 13.40);
        assert!(pos.altitude.to_degrees() > 55.0);
        assert!(pos.azimuth.abs() < 0.3);
    }

    #[test]
    fn night_clear_color_is_tinted() {
        assert_eq!(clear_color(true, true), DAY_CLEAR);
        assert_eq!(clear_color(false, false), DAY_CLEAR);
        let night = clear_color(false, true);
        assert!(night[0] < DAY_CLEAR[0]);
        assert_eq!(night[3], 1.0);
    }
}
