//! Mouth-openness detection and the inner-lip mask.
//!
//! When the mouth is open, the composite restores the source's inner-lip
//! pixels so the viewer keeps their own teeth. The restore is gated by an
//! openness score derived from the inner-lip extents.

use imageproc::filter::box_filter;

use crate::landmark::{LandmarkIdx, Landmarks, INNER_LIP};
use crate::mask::{rasterize_polygon, Mask};
use crate::resolution::Resolution;

/// Openness below this produces no mouth mask at all.
const OPEN_THRESHOLD: f32 = 0.15;

/// Blur radius for anti-aliased mask edges.
const EDGE_BLUR_RADIUS: u32 = 3;

/// Mouth-openness score in `[0, 1]`.
///
/// Computed from the vertical inner-lip gap relative to the mouth width.
/// Returns 0.0 when any of the required landmarks is absent.
pub fn openness(landmarks: &Landmarks) -> f32 {
    let (top, bottom, left, right) = match (
        landmarks.named(LandmarkIdx::MouthTop),
        landmarks.named(LandmarkIdx::MouthBottom),
        landmarks.named(LandmarkIdx::MouthLeft),
        landmarks.named(LandmarkIdx::MouthRight),
    ) {
        (Some(t), Some(b), Some(l), Some(r)) => (t, b, l, r),
        _ => return 0.0,
    };

    let ratio = (bottom.y - top.y).abs() / (right.x - left.x).abs().max(1.0);
    ((ratio - 0.08) / 0.25).clamp(0.0, 1.0)
}

/// Builds the inner-lip mask from the source landmarks.
///
/// Returns `None` when the mouth is too closed to matter, or when the
/// inner-lip polygon cannot be formed.
pub fn mouth_mask(landmarks: &Landmarks, res: Resolution) -> Option<Mask> {
    let score = openness(landmarks);
    if score < OPEN_THRESHOLD {
        return None;
    }

    let lip: Vec<_> = INNER_LIP.iter().filter_map(|&i| landmarks.get(i)).collect();
    let buf = rasterize_polygon(&lip, res).ok()?;
    let mut mask = Mask::from_buf(box_filter(&buf, EDGE_BLUR_RADIUS, EDGE_BLUR_RADIUS));
    mask.scale_values((1.5 * score).min(1.0));

    log::trace!("mouth mask with openness {:.2}", score);
    Some(mask)
}
