//! End-to-end runs of the public API: editor output feeding the morph
//! pipeline and the overlay placer.

use omote::geom::Point;
use omote::image::{Color, Image};
use omote::interp::{interpolate_478, KeyPoints};
use omote::landmark::{Landmarks, FACE_HULL};
use omote::morph::Morpher;
use omote::overlay::{place_overlay, AddonKind};
use omote::resolution::Resolution;

fn gradient(size: u32) -> Image {
    let mut img = Image::new(size, size);
    for y in 0..size {
        for x in 0..size {
            img.set(
                x,
                y,
                Color::from_rgb8((x * 255 / size) as u8, (y * 255 / size) as u8, 60),
            );
        }
    }
    img
}

/// Editor key points for a face centered in a square frame of `size` pixels.
fn keys(size: u32) -> KeyPoints {
    let s = size as f32 / 100.0;
    KeyPoints::from_array(&[
        Point::new(35.0 * s, 40.0 * s),
        Point::new(65.0 * s, 40.0 * s),
        Point::new(50.0 * s, 55.0 * s),
        Point::new(40.0 * s, 70.0 * s),
        Point::new(60.0 * s, 70.0 * s),
        Point::new(50.0 * s, 90.0 * s),
        Point::new(20.0 * s, 55.0 * s),
        Point::new(80.0 * s, 55.0 * s),
    ])
}

/// Interpolated landmarks with the contour replaced by a clean ellipse, like
/// the editor's touch-up pass would produce.
fn landmarks(size: u32) -> Landmarks {
    let mut points = interpolate_478(&keys(size));
    let c = size as f32 / 2.0;
    for (k, idx) in FACE_HULL.iter().enumerate() {
        let ang = std::f32::consts::TAU * k as f32 / FACE_HULL.len() as f32;
        points[*idx] = Point::new(
            c + 0.3 * size as f32 * ang.cos(),
            c * 1.1 + 0.35 * size as f32 * ang.sin(),
        );
    }
    Landmarks::from_points(points)
}

#[test]
fn editor_output_feeds_the_morph_pipeline() {
    let size = 160u32;
    let res = Resolution::new(size, size);

    // Editor output serializes to landmark JSON and back without loss of
    // usable landmarks.
    let lm = landmarks(size);
    let json = lm.to_json_string().unwrap();
    let lm = Landmarks::from_json_slice(json.as_bytes()).unwrap();
    assert_eq!(lm.len(), 478);
    assert_eq!(lm.valid_count(), 478);

    let src = gradient(size);
    let mut tgt = gradient(size);
    // Make the target visually distinct.
    for b in tgt.data_mut().chunks_exact_mut(4) {
        b[2] = 220;
    }

    let mut out = Image::new(size, size);
    let mut morpher = Morpher::new();
    morpher
        .morph(&src, &tgt, &lm, &lm, 0.75, &mut out, false)
        .unwrap();
    assert_eq!(out.resolution(), res);
    assert!(morpher.triangles_warped() > 0);

    // Every output pixel is opaque; far corners are untouched source.
    for px in out.data().chunks_exact(4) {
        assert_eq!(px[3], 255);
    }
    assert_eq!(out.get(1, 1).0[..3], src.get(1, 1).0[..3]);
}

#[test]
fn overlay_draws_onto_morph_output() {
    let size = 160u32;
    let lm = landmarks(size);

    let mut frame = gradient(size);
    let before = frame.data().to_vec();

    let mut glasses = Image::new(20, 6);
    for b in glasses.data_mut().chunks_exact_mut(4) {
        b.copy_from_slice(&[10, 10, 10, 255]);
    }

    place_overlay(&mut frame, &glasses, AddonKind::Glasses, &lm).unwrap();
    assert_ne!(frame.data(), &before[..], "overlay must draw something");
}
