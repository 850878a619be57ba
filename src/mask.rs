//! Feathered face-hull mask construction.
//!
//! The mask drives the final composite: 255 means "fully morphed", 0 means
//! "untouched source". It is built by rasterizing the slightly eroded face
//! contour polygon and feathering it with a cascade of box-blur passes, which
//! together approximate a wide Gaussian falloff.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::filter::box_filter;
use imageproc::point::Point as PolyPoint;

use crate::error::Error;
use crate::geom::Point;
use crate::landmark::{Landmarks, FACE_HULL};
use crate::resolution::Resolution;

/// Blur radii of the feathering cascade, applied in order.
const FEATHER_RADII: [u32; 5] = [60, 50, 40, 25, 10];

/// Erosion factor pulling the hull polygon toward its centroid before
/// feathering.
const HULL_EROSION: f32 = 0.98;

/// A single-channel mask the size of an image; values are blend weights
/// scaled to `[0, 255]`.
#[derive(Clone)]
pub struct Mask {
    buf: GrayImage,
}

impl Mask {
    #[inline]
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    /// Mask value at the given pixel coordinates.
    ///
    /// # Panics
    ///
    /// This will panic if `(x, y)` is outside the bounds of the mask.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.buf.get_pixel(x, y).0[0]
    }

    /// Raw mask values, `width * height` bytes, row-major.
    #[inline]
    pub fn data(&self) -> &[u8] {
        self.buf.as_raw()
    }

    pub(crate) fn from_buf(buf: GrayImage) -> Self {
        Self { buf }
    }

    /// Scales every value by `factor`, saturating at 255.
    pub(crate) fn scale_values(&mut self, factor: f32) {
        for v in self.buf.iter_mut() {
            *v = (*v as f32 * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Builds the feathered hull mask from the source landmarks.
///
/// Fails with [`Error::MaskConstructionFailed`] when fewer than 3 hull
/// landmarks are usable.
pub fn hull_mask(landmarks: &Landmarks, res: Resolution) -> crate::Result<Mask> {
    let hull: Vec<Point> = FACE_HULL.iter().filter_map(|&i| landmarks.get(i)).collect();
    if hull.len() < 3 {
        return Err(Error::MaskConstructionFailed {
            hull_points: hull.len(),
        });
    }

    let inv = 1.0 / hull.len() as f32;
    let centroid = hull
        .iter()
        .fold(Point::new(0.0, 0.0), |acc, p| acc + *p * inv);
    let eroded: Vec<Point> = hull
        .iter()
        .map(|&p| centroid + (p - centroid) * HULL_EROSION)
        .collect();

    let mut buf = rasterize_polygon(&eroded, res)?;
    for radius in FEATHER_RADII {
        buf = box_filter(&buf, radius, radius);
    }

    log::trace!(
        "hull mask from {} points, centroid ({:.1}, {:.1})",
        hull.len(),
        centroid.x,
        centroid.y
    );
    Ok(Mask { buf })
}

/// Rasterizes a filled polygon: 255 inside, 0 outside.
///
/// Consecutive duplicate vertices (common after landmark rounding) are
/// dropped; fewer than 3 distinct vertices is a construction failure.
pub(crate) fn rasterize_polygon(points: &[Point], res: Resolution) -> crate::Result<GrayImage> {
    let mut poly: Vec<PolyPoint<i32>> = Vec::with_capacity(points.len());
    for p in points {
        let q = PolyPoint::new(p.x.round() as i32, p.y.round() as i32);
        if poly.last() != Some(&q) {
            poly.push(q);
        }
    }
    if poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() < 3 {
        return Err(Error::MaskConstructionFailed {
            hull_points: poly.len(),
        });
    }

    let mut buf = GrayImage::new(res.width(), res.height());
    draw_polygon_mut(&mut buf, &poly, Luma([255u8]));
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Landmarks whose hull indices trace a circle; everything else absent.
    fn circle_hull(res: Resolution, cx: f32, cy: f32, r: f32) -> Landmarks {
        let mut lm = Landmarks::new(vec![None; crate::landmark::NUM_LANDMARKS]);
        for (k, &idx) in FACE_HULL.iter().enumerate() {
            let ang = std::f32::consts::TAU * k as f32 / FACE_HULL.len() as f32;
            lm.set(idx, Point::new(cx + r * ang.cos(), cy + r * ang.sin()));
        }
        lm
    }

    #[test]
    fn fails_below_three_hull_points() {
        let mut lm = Landmarks::new(vec![None; crate::landmark::NUM_LANDMARKS]);
        lm.set(FACE_HULL[0], Point::new(10.0, 10.0));
        lm.set(FACE_HULL[1], Point::new(50.0, 10.0));

        match hull_mask(&lm, Resolution::new(100, 100)) {
            Err(Error::MaskConstructionFailed { hull_points: 2 }) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn monotone_falloff_from_centroid() {
        let res = Resolution::new(240, 240);
        let mask = hull_mask(&circle_hull(res, 120.0, 120.0, 70.0), res).unwrap();

        let center = mask.get(120, 120);
        assert!(center > 0);

        // Walking outward along a ray the response must not increase.
        let mut prev = center;
        for x in 120..240 {
            let v = mask.get(x, 120);
            assert!(
                v <= prev.saturating_add(1),
                "mask increased from {} to {} at x={}",
                prev,
                v,
                x
            );
            prev = prev.max(v);
        }
    }

    #[test]
    fn interior_brighter_than_exterior() {
        let res = Resolution::new(240, 240);
        let mask = hull_mask(&circle_hull(res, 120.0, 120.0, 70.0), res).unwrap();
        assert!(mask.get(120, 120) > mask.get(5, 5));
    }
}
