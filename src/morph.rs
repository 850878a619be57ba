//! The morph orchestrator.
//!
//! One [`Morpher::morph`] call runs the whole pipeline: validate inputs,
//! bring the target into source pixel space, triangulate the key landmarks of
//! the target configuration, warp the target triangle-by-triangle onto the
//! source geometry, then composite under the feathered hull mask with the
//! mouth interior restored.
//!
//! The triangulation is computed from the *target's* landmark configuration
//! and reused to index the source's landmarks; target landmarks are static
//! per asset, which keeps the mesh stable across camera frames.

use crate::color;
use crate::delaunay;
use crate::error::Error;
use crate::geom::Triangle;
use crate::image::Image;
use crate::landmark::{Landmarks, KEY_INDICES, MIN_LANDMARKS};
use crate::mask;
use crate::mouth;
use crate::resolution::Resolution;
use crate::warp;

/// Triangles with less area than this (in square pixels) are rejected.
const MIN_TRIANGLE_AREA: f32 = 1.0;

/// Blend factors below this skip the pixel entirely.
const MIN_BLEND: f32 = 0.01;

/// Face-morphing engine.
///
/// Holds scratch buffers that are reused across calls with the same source
/// resolution; a dimension change drops and reallocates them. A `Morpher`
/// carries no other state, so independent instances can run in parallel on
/// disjoint buffers.
#[derive(Default)]
pub struct Morpher {
    warped: Option<Image>,
    triangles_total: usize,
    triangles_warped: usize,
}

impl Morpher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mesh triangles produced by the last call.
    #[inline]
    pub fn triangles_total(&self) -> usize {
        self.triangles_total
    }

    /// Number of mesh triangles actually warped by the last call (the rest
    /// were degenerate or had absent vertices).
    #[inline]
    pub fn triangles_warped(&self) -> usize {
        self.triangles_warped
    }

    /// Morphs `tgt` onto `src`, writing the result to `out`.
    ///
    /// `alpha` is the blend strength in `[0, 1]`; `is_animal` switches to
    /// hard-edged blending for targets whose skin tones are too far from
    /// human for a graceful feather.
    ///
    /// On every recoverable error `out` holds an unmodified copy of `src`.
    /// [`Error::DimensionMismatch`] is fatal for the call and writes nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn morph(
        &mut self,
        src: &Image,
        tgt: &Image,
        src_lm: &Landmarks,
        tgt_lm: &Landmarks,
        alpha: f32,
        out: &mut Image,
        is_animal: bool,
    ) -> crate::Result<()> {
        let res = src.resolution();
        if out.resolution() != res {
            return Err(Error::DimensionMismatch {
                src: res,
                out: out.resolution(),
            });
        }
        out.copy_from(src);

        let found = src_lm.valid_count().min(tgt_lm.valid_count());
        if found < MIN_LANDMARKS {
            return Err(Error::InsufficientLandmarks { found });
        }

        let alpha = alpha.clamp(0.0, 1.0);

        // Target landmarks in source pixel space.
        let sx = res.width() as f32 / tgt.width() as f32;
        let sy = res.height() as f32 / tgt.height() as f32;
        let tgt_lm = tgt_lm.scaled(sx, sy);

        let triangles = self.triangulate_keys(&tgt_lm, src_lm, res);
        if triangles.is_empty() {
            return Err(Error::DegenerateMesh);
        }

        let mask = mask::hull_mask(src_lm, res)?;
        let mouth_mask = if is_animal {
            None
        } else {
            mouth::mouth_mask(src_lm, res)
        };

        let scaled_storage;
        let scaled_tgt = if tgt.resolution() == res {
            tgt
        } else {
            scaled_storage = tgt.resize_bilinear(res);
            &scaled_storage
        };

        let mut warped = match self.warped.take() {
            Some(mut img) if img.resolution() == res => {
                img.clear();
                img
            }
            _ => Image::new(res.width(), res.height()),
        };

        self.triangles_total = triangles.len();
        self.triangles_warped = 0;
        for &[i, j, k] in &triangles {
            let (s_tri, t_tri) = match (
                src_lm.get(i),
                src_lm.get(j),
                src_lm.get(k),
                tgt_lm.get(i),
                tgt_lm.get(j),
                tgt_lm.get(k),
            ) {
                (Some(s0), Some(s1), Some(s2), Some(t0), Some(t1), Some(t2)) => {
                    (Triangle([s0, s1, s2]), Triangle([t0, t1, t2]))
                }
                _ => continue,
            };
            if s_tri.area() < MIN_TRIANGLE_AREA || t_tri.area() < MIN_TRIANGLE_AREA {
                continue;
            }
            warp::warp_triangle(scaled_tgt, &mut warped, &t_tri, &s_tri);
            self.triangles_warped += 1;
        }
        log::debug!(
            "morph: warped {}/{} triangles at alpha {:.2}",
            self.triangles_warped,
            self.triangles_total,
            alpha
        );

        color::match_masked_means(&mut warped, src, &mask);

        composite(src, &warped, &mask, mouth_mask.as_ref(), alpha, is_animal, out);

        self.warped = Some(warped);
        Ok(())
    }

    /// Triangulates the key landmark subset of the target configuration and
    /// maps the triangles back to landmark indices.
    fn triangulate_keys(
        &self,
        tgt_lm: &Landmarks,
        src_lm: &Landmarks,
        res: Resolution,
    ) -> Vec<[usize; 3]> {
        let w = res.width() as f32;
        let h = res.height() as f32;

        let mut indices = Vec::with_capacity(KEY_INDICES.len());
        let mut points = Vec::with_capacity(KEY_INDICES.len());
        for &idx in KEY_INDICES.iter() {
            if let Some(p) = tgt_lm.get(idx) {
                if p.x >= 0.0 && p.x < w && p.y >= 0.0 && p.y < h {
                    indices.push(idx);
                    points.push(p);
                }
            }
        }

        delaunay::triangulate(&points, res)
            .into_iter()
            .map(|t| [indices[t[0]], indices[t[1]], indices[t[2]]])
            .filter(|t| {
                t.iter()
                    .all(|&i| i < src_lm.len() && i < tgt_lm.len())
            })
            .collect()
    }
}

/// Per-pixel composite of the corrected warp over the source.
fn composite(
    src: &Image,
    warped: &Image,
    mask: &mask::Mask,
    mouth_mask: Option<&mask::Mask>,
    alpha: f32,
    is_animal: bool,
    out: &mut Image,
) {
    let src_data = src.data();
    let warped_data = warped.data();
    let mask_data = mask.data();
    let mouth_data = mouth_mask.map(|m| m.data());
    let out_data = out.data_mut();

    for (i, &m) in mask_data.iter().enumerate() {
        let m = m as f32 / 255.0;
        let beta = if is_animal {
            // Non-human skin tones don't feather; hard mask edge.
            if m > 0.1 {
                alpha
            } else {
                0.0
            }
        } else if alpha > 0.95 {
            // Full strength widens the confident region, feather intact.
            m.sqrt() * alpha
        } else {
            m * alpha
        };

        let o = 4 * i;
        if warped_data[o + 3] > 0 && beta > MIN_BLEND {
            let mu = mouth_data.map(|d| d[i] as f32 / 255.0).unwrap_or(0.0);
            for ch in 0..3 {
                let s = src_data[o + ch] as f32;
                let w = warped_data[o + ch] as f32;
                let morphed = s * (1.0 - beta) + w * beta;
                out_data[o + ch] = (morphed * (1.0 - mu) + s * mu).round() as u8;
            }
        }
        out_data[o + 3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;
    use crate::test;

    fn init_logger() {
        env_logger::builder()
            .filter_module(env!("CARGO_CRATE_NAME"), log::LevelFilter::Debug)
            .is_test(true)
            .try_init()
            .ok();
    }

    #[test]
    fn alpha_zero_is_byte_exact_pass_through() {
        init_logger();
        let res = Resolution::new(128, 128);
        let src = test::gradient(128, 128);
        let tgt = test::checkerboard(128, 128, 16);
        let lm = test::face_landmarks(res);

        let mut out = Image::new(128, 128);
        Morpher::new()
            .morph(&src, &tgt, &lm, &lm, 0.0, &mut out, false)
            .unwrap();
        assert_eq!(out.data(), src.data());
    }

    #[test]
    fn identity_morph_stays_close_to_source() {
        init_logger();
        let res = Resolution::new(128, 128);
        let src = test::gradient(128, 128);
        let lm = test::face_landmarks(res);

        let mut out = Image::new(128, 128);
        let mut morpher = Morpher::new();
        morpher
            .morph(&src, &src, &lm, &lm, 1.0, &mut out, false)
            .unwrap();
        assert!(morpher.triangles_warped() > 100);

        for (o, s) in out.data().chunks_exact(4).zip(src.data().chunks_exact(4)) {
            for ch in 0..3 {
                let diff = (o[ch] as i16 - s[ch] as i16).abs();
                assert!(diff <= 1, "channel deviated by {}", diff);
            }
            assert_eq!(o[3], 255);
        }
    }

    #[test]
    fn insufficient_landmarks_recovers_with_source_copy() {
        let res = Resolution::new(128, 128);
        let src = test::gradient(128, 128);
        let tgt = test::checkerboard(128, 128, 16);
        let good = test::face_landmarks(res);
        let short = Landmarks::from_points((0..399).map(|i| Point::new(i as f32, 1.0)));

        let mut out = Image::new(128, 128);
        let result = Morpher::new().morph(&src, &tgt, &short, &good, 1.0, &mut out, false);
        match result {
            Err(Error::InsufficientLandmarks { found: 399 }) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert_eq!(out.data(), src.data());
    }

    #[test]
    fn dimension_mismatch_is_fatal_and_writes_nothing() {
        let res = Resolution::new(128, 128);
        let src = test::gradient(128, 128);
        let tgt = test::checkerboard(128, 128, 16);
        let lm = test::face_landmarks(res);

        let mut out = test::gradient(64, 64);
        let before = out.data().to_vec();
        let result = Morpher::new().morph(&src, &tgt, &lm, &lm, 1.0, &mut out, false);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
        assert_eq!(out.data(), &before[..]);
    }

    #[test]
    fn full_strength_transplants_target_in_mask_interior() {
        init_logger();
        let res = Resolution::new(400, 400);
        let src = test::checkerboard(400, 400, 40);
        let tgt = test::rotate90(&src);
        let lm = test::face_landmarks(res);

        let mut out = Image::new(400, 400);
        Morpher::new()
            .morph(&src, &tgt, &lm, &lm, 1.0, &mut out, false)
            .unwrap();

        // Inside the confidently masked interior the output must approximate
        // the target; allow the feather to dilute the outermost samples.
        let mask = mask::hull_mask(&lm, res).unwrap();
        let mut region = 0u64;
        let mut error = 0.0f64;
        for y in 0..400 {
            for x in 0..400 {
                if mask.get(x, y) >= 200 {
                    region += 1;
                    for ch in 0..3 {
                        let o = out.get(x, y).0[ch] as f64;
                        let t = tgt.get(x, y).0[ch] as f64;
                        error += (o - t).abs() / 255.0;
                    }
                }
            }
        }
        assert!(region > 1_000, "mask interior unexpectedly small: {}", region);
        let mean_err = error / (region as f64 * 3.0);
        assert!(mean_err <= 0.10, "mean normalized L1 error {}", mean_err);
    }

    #[test]
    fn open_mouth_interior_keeps_source_pixels() {
        init_logger();
        let res = Resolution::new(200, 200);
        let lm = test::open_mouth_landmarks(res);

        // Distinctive mouth interior on an otherwise neutral source.
        let mut src = test::gradient(200, 200);
        for y in 132..157 {
            for x in 80..121 {
                let dx = (x as f32 - 100.0) / 24.0;
                let dy = (y as f32 - 144.0) / 14.0;
                if dx * dx + dy * dy <= 0.8 * 0.8 {
                    src.set(x, y, crate::image::Color::MAGENTA);
                }
            }
        }
        let tgt = test::flat(200, 200, 128);

        let mut out = Image::new(200, 200);
        Morpher::new()
            .morph(&src, &tgt, &lm, &lm, 1.0, &mut out, false)
            .unwrap();

        // Deep inside the inner-lip polygon the source must survive.
        for (x, y) in [(100u32, 144u32), (95, 144), (105, 144), (100, 140), (100, 148)] {
            let o = out.get(x, y).0;
            let s = src.get(x, y).0;
            for ch in 0..3 {
                assert!(
                    (o[ch] as i16 - s[ch] as i16).abs() <= 10,
                    "mouth interior changed at ({}, {}): {:?} vs {:?}",
                    x,
                    y,
                    o,
                    s
                );
            }
        }
    }

    #[test]
    fn degenerate_mesh_recovers_with_source_copy() {
        let res = Resolution::new(128, 128);
        let src = test::gradient(128, 128);
        let tgt = test::checkerboard(128, 128, 16);
        let src_lm = test::face_landmarks(res);
        // Valid landmarks, but every key point is far outside the frame, so
        // no triangulation vertex survives the bounds filter.
        let tgt_lm = Landmarks::from_points(
            (0..478).map(|i| Point::new(5000.0 + i as f32, 5000.0)),
        );

        let mut out = Image::new(128, 128);
        let result = Morpher::new().morph(&src, &tgt, &src_lm, &tgt_lm, 1.0, &mut out, false);
        assert!(matches!(result, Err(Error::DegenerateMesh)));
        assert_eq!(out.data(), src.data());
    }

    #[test]
    fn animal_blend_hardens_the_mask_edge() {
        init_logger();
        let res = Resolution::new(400, 400);
        let src = test::gradient(400, 400);
        let tgt = test::flat(400, 400, 30);
        let lm = test::face_landmarks(res);

        let mut out = Image::new(400, 400);
        Morpher::new()
            .morph(&src, &tgt, &lm, &lm, 0.5, &mut out, true)
            .unwrap();

        let mask = mask::hull_mask(&lm, res).unwrap();
        // Center is confidently masked: half-blended toward the target.
        assert!(mask.get(200, 220) as f32 / 255.0 > 0.1);
        assert_ne!(out.get(200, 220).0[..3], src.get(200, 220).0[..3]);
        // Below the hard threshold nothing blends at all.
        assert!(mask.get(2, 2) as f32 / 255.0 <= 0.1);
        assert_eq!(out.get(2, 2).0[..3], src.get(2, 2).0[..3]);
    }

    #[test]
    fn scratch_buffer_survives_resolution_changes() {
        let mut morpher = Morpher::new();

        for size in [128u32, 128, 160] {
            let res = Resolution::new(size, size);
            let src = test::gradient(size, size);
            let lm = test::face_landmarks(res);
            let mut out = Image::new(size, size);
            morpher
                .morph(&src, &src, &lm, &lm, 0.5, &mut out, false)
                .unwrap();
            assert_eq!(out.resolution(), res);
        }
    }
}
