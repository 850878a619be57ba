//! Landmark interpolation for the asset editor.
//!
//! The editor asks the user to place 8 key points on a face image and expands
//! them into the full 478-point landmark layout used by the morph pipeline.
//! The expansion is rule-based: small feature rings first, then bands and the
//! face contour, finally a grid fill for everything unnamed. Rule order
//! matters since the index ranges overlap; an index keeps the first value
//! assigned to it.

use std::f32::consts::{PI, TAU};

use crate::geom::Point;
use crate::landmark::NUM_LANDMARKS;

/// The 8 key points placed by the user, in editor order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPoints {
    pub left_eye: Point,
    pub right_eye: Point,
    pub nose: Point,
    pub mouth_left: Point,
    pub mouth_right: Point,
    pub chin: Point,
    pub left_cheek: Point,
    pub right_cheek: Point,
}

impl KeyPoints {
    /// Interprets an 8-element array in editor order.
    pub fn from_array(keys: &[Point; 8]) -> Self {
        let [left_eye, right_eye, nose, mouth_left, mouth_right, chin, left_cheek, right_cheek] =
            *keys;
        Self {
            left_eye,
            right_eye,
            nose,
            mouth_left,
            mouth_right,
            chin,
            left_cheek,
            right_cheek,
        }
    }
}

/// Expands 8 key points into the full 478-point landmark set.
///
/// All coordinates in the result are rounded to integers.
pub fn interpolate_478(keys: &KeyPoints) -> Vec<Point> {
    let k = *keys;
    let eye_center = k.left_eye.midpoint(k.right_eye);
    let eye_width = (k.right_eye.x - k.left_eye.x).abs();
    let face_width = (k.right_cheek.x - k.left_cheek.x).abs();
    let face_height = 2.0 * (k.chin.y - eye_center.y).abs();

    let mut points = vec![Point::new(0.0, 0.0); NUM_LANDMARKS];
    let mut assigned = [false; NUM_LANDMARKS];

    // First rule to claim an index wins; overlapping later rules skip it.
    fn set(points: &mut [Point], assigned: &mut [bool], idx: usize, p: Point) {
        if !assigned[idx] {
            points[idx] = p;
            assigned[idx] = true;
        }
    }

    // Feature rings.
    ring(33..=38, k.left_eye, 0.15 * eye_width, |idx, p| {
        set(&mut points, &mut assigned, idx, p)
    });
    ring(263..=268, k.right_eye, 0.15 * eye_width, |idx, p| {
        set(&mut points, &mut assigned, idx, p)
    });
    ring(1..=5, k.nose, 0.10 * face_width, |idx, p| {
        set(&mut points, &mut assigned, idx, p)
    });
    ring(61..=67, k.mouth_left, 0.05 * face_width, |idx, p| {
        set(&mut points, &mut assigned, idx, p)
    });
    ring(291..=297, k.mouth_right, 0.05 * face_width, |idx, p| {
        set(&mut points, &mut assigned, idx, p)
    });

    // Exact copies.
    set(&mut points, &mut assigned, 152, k.chin);
    set(&mut points, &mut assigned, 234, k.left_cheek);
    set(&mut points, &mut assigned, 454, k.right_cheek);

    // Forehead band, straight across the cheeks above the eye line.
    for (i, idx) in (0..=9).enumerate() {
        let t = i as f32 / 9.0;
        let x = lerp(k.left_cheek.x, k.right_cheek.x, t);
        let y = eye_center.y - 0.3 * face_height;
        set(&mut points, &mut assigned, idx, Point::new(x, y));
    }

    // Face contour: half ellipse from the left cheek to the right, via the
    // chin.
    for (i, idx) in (10..=152).enumerate() {
        let t = i as f32 / 142.0;
        let ang = PI * (1.0 - t);
        let x = eye_center.x + 0.5 * face_width * ang.cos();
        let y = eye_center.y + 0.5 * face_height * ang.sin();
        set(&mut points, &mut assigned, idx, Point::new(x, y));
    }

    // Nose bridge.
    for (i, idx) in (168..=175).enumerate() {
        let t = i as f32 / 7.0;
        let x = lerp(eye_center.x, k.nose.x, t);
        let y = lerp(eye_center.y, k.nose.y, t);
        set(&mut points, &mut assigned, idx, Point::new(x, y));
    }

    // Mouth band with a sinusoidal vertical perturbation.
    for (i, idx) in (61..=291).enumerate() {
        let t = i as f32 / 230.0;
        let x = lerp(k.mouth_left.x, k.mouth_right.x, t);
        let y = lerp(k.mouth_left.y, k.mouth_right.y, t)
            + 0.05 * face_height * (TAU * t).sin();
        set(&mut points, &mut assigned, idx, Point::new(x, y));
    }

    // Sinusoidal eye bands.
    for (i, idx) in (33..=133).enumerate() {
        let t = i as f32 / 100.0;
        set(
            &mut points,
            &mut assigned,
            idx,
            eye_band(k.left_eye, eye_width, t),
        );
    }
    for (i, idx) in (263..=362).enumerate() {
        let t = i as f32 / 99.0;
        set(
            &mut points,
            &mut assigned,
            idx,
            eye_band(k.right_eye, eye_width, t),
        );
    }

    // Grid fill across the face rectangle for everything else.
    for idx in 0..NUM_LANDMARKS {
        if assigned[idx] {
            continue;
        }
        let col = (idx % 20) as f32 / 19.0;
        let row = ((idx / 20) % 24) as f32 / 23.0;
        let x = lerp(k.left_cheek.x, k.right_cheek.x, col);
        let y = eye_center.y - 0.5 * face_height + face_height * row;
        set(&mut points, &mut assigned, idx, Point::new(x, y));
    }

    for p in &mut points {
        *p = Point::new(p.x.round(), p.y.round());
    }
    points
}

/// Evenly spaced points on a circle around `center`.
fn ring(
    indices: std::ops::RangeInclusive<usize>,
    center: Point,
    radius: f32,
    mut set: impl FnMut(usize, Point),
) {
    let count = indices.end() - indices.start() + 1;
    for (i, idx) in indices.enumerate() {
        let ang = TAU * i as f32 / count as f32;
        set(
            idx,
            Point::new(center.x + radius * ang.cos(), center.y + radius * ang.sin()),
        );
    }
}

fn eye_band(eye: Point, eye_width: f32, t: f32) -> Point {
    let x = lerp(eye.x - 0.5 * eye_width, eye.x + 0.5 * eye_width, t);
    let y = eye.y + 0.1 * eye_width * (TAU * t).sin();
    Point::new(x, y)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> KeyPoints {
        KeyPoints::from_array(&[
            Point::new(140.0, 160.0),
            Point::new(260.0, 160.0),
            Point::new(200.0, 220.0),
            Point::new(160.0, 280.0),
            Point::new(240.0, 280.0),
            Point::new(200.0, 360.0),
            Point::new(80.0, 220.0),
            Point::new(320.0, 220.0),
        ])
    }

    #[test]
    fn yields_exactly_478_integer_points() {
        let points = interpolate_478(&keys());
        assert_eq!(points.len(), 478);
        for p in &points {
            assert!(p.is_finite());
            assert_eq!(p.x, p.x.round());
            assert_eq!(p.y, p.y.round());
        }
    }

    #[test]
    fn anchor_indices_copy_their_key_points() {
        let k = keys();
        let points = interpolate_478(&k);
        assert_eq!(points[152], k.chin);
        assert_eq!(points[234], k.left_cheek);
        assert_eq!(points[454], k.right_cheek);
    }

    #[test]
    fn eye_rings_circle_their_eye() {
        let k = keys();
        let points = interpolate_478(&k);
        let radius = 0.15 * (k.right_eye.x - k.left_eye.x).abs();
        for idx in 33..=38 {
            let d = points[idx].distance(k.left_eye);
            assert!((d - radius).abs() <= 1.0, "ring radius off: {}", d);
        }
        for idx in 263..=268 {
            let d = points[idx].distance(k.right_eye);
            assert!((d - radius).abs() <= 1.0);
        }
    }

    #[test]
    fn forehead_beats_contour_on_shared_range() {
        let k = keys();
        let points = interpolate_478(&k);
        let eye_center_y = 160.0;
        let face_height = 2.0 * (360.0f32 - 160.0);
        // Index 0 is outer-lip in the mesh, but the editor's forehead rule
        // claims 0 and 6..=9 before anything else can.
        for idx in [0usize, 6, 7, 8, 9] {
            assert_eq!(points[idx].y, (eye_center_y - 0.3 * face_height).round());
        }
        // Contour rule owns the middle of its range: index 81 sits below the
        // eye line (the chin half of the ellipse).
        assert!(points[81].y > eye_center_y);
    }

    #[test]
    fn rings_survive_later_band_rules() {
        let k = keys();
        let points = interpolate_478(&k);
        // 61..=67 was assigned by the mouth-left ring; the mouth band must
        // not overwrite it.
        let radius = 0.05 * (k.right_cheek.x - k.left_cheek.x).abs();
        for idx in 61..=67 {
            let d = points[idx].distance(k.mouth_left);
            assert!((d - radius).abs() <= 1.0);
        }
    }
}
