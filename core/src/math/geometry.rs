use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Speed of light in vacuum, m/s.
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Primary reflector diameter used for the default beam estimate.
pub const DISH_DIAMETER_M: f64 = 25.0;

/// Rectangular RA/Dec region in radians used as a cheap catalog pre-filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
}

impl BoundingBox {
    pub fn new(ra_min: f64, ra_max: f64, dec_min: f64, dec_max: f64) -> Self {
        Self {
            ra_min,
            ra_max,
            dec_min,
            dec_max,
        }
    }

    fn full_ra(dec_min: f64, dec_max: f64) -> Self {
        Self::new(0.0, TAU, dec_min, dec_max)
    }

    pub fn to_degrees(&self) -> Self {
        Self::new(
            self.ra_min.to_degrees(),
            self.ra_max.to_degrees(),
            self.dec_min.to_degrees(),
            self.dec_max.to_degrees(),
        )
    }

    /// Inclusive containment test, in the box's own units.
    pub fn contains(&self, ra: f64, dec: f64) -> bool {
        ra >= self.ra_min && ra <= self.ra_max && dec >= self.dec_min && dec <= self.dec_max
    }
}

/// Field-of-view geometry for a circular primary beam.
pub struct GeometryEngine;

impl GeometryEngine {
    /// Beam radius in radians for the default 25 m reflector.
    pub fn beam_radius(center_frequency_mhz: f64) -> f64 {
        Self::beam_radius_for_dish(center_frequency_mhz, DISH_DIAMETER_M)
    }

    /// Diffraction-limited half-beam `0.5 * lambda / D`. The frequency must be positive.
    pub fn beam_radius_for_dish(center_frequency_mhz: f64, dish_diameter_m: f64) -> f64 {
        let wavelength_m = SPEED_OF_LIGHT_M_S / (center_frequency_mhz * 1e6);
        0.5 * wavelength_m / dish_diameter_m
    }

    /// Boxes covering the circle of radius `r` around `(ra, dec)`, all in radians.
    ///
    /// Returns two boxes when the circle straddles RA 0 and a single full-RA box
    /// when it reaches a pole. An empty result means no rectangular bound applies
    /// (radius not below pi/2 or non-finite input); callers must then scan the
    /// whole catalog.
    pub fn bounding_boxes(ra: f64, dec: f64, r: f64) -> Vec<BoundingBox> {
        if !(ra.is_finite() && dec.is_finite() && r.is_finite()) || !(0.0..FRAC_PI_2).contains(&r)
        {
            return Vec::new();
        }

        if dec + r >= FRAC_PI_2 {
            return vec![BoundingBox::full_ra(dec - r, FRAC_PI_2)];
        }
        if dec - r <= -FRAC_PI_2 {
            return vec![BoundingBox::full_ra(-FRAC_PI_2, dec + r)];
        }

        let dec_min = dec - r;
        let dec_max = dec + r;
        // Rounding can push the ratio just past 1 when the cap grazes a pole.
        let ra_offset = (r.sin() / dec.cos()).min(1.0).asin();
        let ra_min = ra - ra_offset;
        let ra_max = ra + ra_offset;

        if ra_min < 0.0 {
            vec![
                BoundingBox::new(TAU + ra_min, TAU, dec_min, dec_max),
                BoundingBox::new(0.0, ra_max, dec_min, dec_max),
            ]
        } else if ra_max > TAU {
            vec![
                BoundingBox::new(ra_min, TAU, dec_min, dec_max),
                BoundingBox::new(0.0, ra_max - TAU, dec_min, dec_max),
            ]
        } else {
            vec![BoundingBox::new(ra_min, ra_max, dec_min, dec_max)]
        }
    }

    /// Great-circle separation via the spherical law of cosines, in radians.
    pub fn angular_separation(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
        let cosine = dec1.sin() * dec2.sin() + dec1.cos() * dec2.cos() * (ra1 - ra2).cos();
        cosine.clamp(-1.0, 1.0).acos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    /// Point at angular distance `d` from `(ra, dec)` along bearing `bearing`.
    fn destination(ra: f64, dec: f64, d: f64, bearing: f64) -> (f64, f64) {
        let dec2 = (dec.sin() * d.cos() + dec.cos() * d.sin() * bearing.cos()).asin();
        let ra2 = ra
            + (bearing.sin() * d.sin() * dec.cos()).atan2(d.cos() - dec.sin() * dec2.sin());
        (ra2.rem_euclid(TAU), dec2)
    }

    #[test]
    fn beam_radius_matches_diffraction_estimate() {
        let r = GeometryEngine::beam_radius(1420.0);
        let expected = 0.5 * (SPEED_OF_LIGHT_M_S / 1.42e9) / 25.0;
        assert_close(r, expected);
        assert!(r.to_degrees() > 0.24 && r.to_degrees() < 0.25);
        assert_close(
            GeometryEngine::beam_radius_for_dish(1420.0, 12.5),
            2.0 * expected,
        );
    }

    #[test]
    fn interior_pointing_yields_single_box() {
        let (ra, dec, r) = (1.0_f64, 0.3_f64, 0.05_f64);
        let boxes = GeometryEngine::bounding_boxes(ra, dec, r);
        assert_eq!(boxes.len(), 1);
        let off = (r.sin() / dec.cos()).asin();
        assert_close(boxes[0].ra_min, ra - off);
        assert_close(boxes[0].ra_max, ra + off);
        assert_close(boxes[0].dec_min, dec - r);
        assert_close(boxes[0].dec_max, dec + r);
    }

    #[test]
    fn antimeridian_splits_into_two_boxes() {
        let boxes = GeometryEngine::bounding_boxes(
            1.0_f64.to_radians(),
            0.0,
            5.0_f64.to_radians(),
        );
        assert_eq!(boxes.len(), 2);
        let first = boxes[0].to_degrees();
        let second = boxes[1].to_degrees();
        assert!((first.ra_min - 356.0).abs() < 1e-9);
        assert!((first.ra_max - 360.0).abs() < 1e-9);
        assert!(second.ra_min.abs() < 1e-9);
        assert!((second.ra_max - 6.0).abs() < 1e-9);
        assert!((first.dec_min + 5.0).abs() < 1e-9);
        assert!((second.dec_max - 5.0).abs() < 1e-9);
    }

    #[test]
    fn wrap_past_two_pi_splits_into_two_boxes() {
        let boxes = GeometryEngine::bounding_boxes(
            359.0_f64.to_radians(),
            0.0,
            5.0_f64.to_radians(),
        );
        assert_eq!(boxes.len(), 2);
        let first = boxes[0].to_degrees();
        let second = boxes[1].to_degrees();
        assert!((first.ra_min - 354.0).abs() < 1e-9);
        assert!((first.ra_max - 360.0).abs() < 1e-9);
        assert!(second.ra_min.abs() < 1e-9);
        assert!((second.ra_max - 4.0).abs() < 1e-9);
    }

    #[test]
    fn north_pole_yields_full_ra_box() {
        let boxes = GeometryEngine::bounding_boxes(
            10.0_f64.to_radians(),
            89.0_f64.to_radians(),
            5.0_f64.to_radians(),
        );
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].ra_min, 0.0);
        assert_eq!(boxes[0].ra_max, TAU);
        assert_close(boxes[0].dec_max, FRAC_PI_2);
        assert_close(boxes[0].dec_min, 84.0_f64.to_radians());
    }

    #[test]
    fn south_pole_mirrors_north_pole() {
        let boxes = GeometryEngine::bounding_boxes(
            10.0_f64.to_radians(),
            (-89.0_f64).to_radians(),
            5.0_f64.to_radians(),
        );
        assert_eq!(boxes.len(), 1);
        assert!(boxes[0].dec_min < boxes[0].dec_max);
        assert_close(boxes[0].dec_min, -FRAC_PI_2);
        assert_close(boxes[0].dec_max, (-84.0_f64).to_radians());
        assert_eq!(boxes[0].ra_max, TAU);
    }

    #[test]
    fn oversized_or_invalid_radius_disables_prefilter() {
        assert!(GeometryEngine::bounding_boxes(0.0, 0.0, FRAC_PI_2).is_empty());
        assert!(GeometryEngine::bounding_boxes(0.0, 0.0, -0.1).is_empty());
        assert!(GeometryEngine::bounding_boxes(f64::NAN, 0.0, 0.1).is_empty());
    }

    #[test]
    fn boxes_cover_every_point_inside_the_circle() {
        let centers = [
            (0.0, 0.0),
            (1.0, 0.0),
            (200.0, 30.0),
            (359.5, -45.0),
            (90.0, 80.0),
            (270.0, -87.0),
            (0.2, 60.0),
        ];
        for &(ra_deg, dec_deg) in &centers {
            for &r_deg in &[0.25_f64, 2.0, 10.0, 30.0] {
                let (ra, dec, r) = (
                    f64::to_radians(ra_deg),
                    f64::to_radians(dec_deg),
                    r_deg.to_radians(),
                );
                let boxes = GeometryEngine::bounding_boxes(ra, dec, r);
                assert!(!boxes.is_empty());
                for step in 0..72 {
                    let bearing = step as f64 * TAU / 72.0;
                    for &fraction in &[0.5, 0.999] {
                        let (pra, pdec) = destination(ra, dec, r * fraction, bearing);
                        assert!(
                            boxes.iter().any(|b| b.contains(pra, pdec)),
                            "({ra_deg}, {dec_deg}) r={r_deg}: point ({pra}, {pdec}) not covered by {boxes:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn angular_separation_is_zero_at_center() {
        assert!(GeometryEngine::angular_separation(1.2, 0.4, 1.2, 0.4) < 1e-7);
        assert_close(
            GeometryEngine::angular_separation(0.0, 0.0, std::f64::consts::PI, 0.0),
            std::f64::consts::PI,
        );
    }
}
