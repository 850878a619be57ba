//! Piecewise affine warping.
//!
//! Each triangle of the morph mesh is warped independently by inverse
//! mapping: for every destination pixel inside the destination triangle, the
//! inverse affine gives a fractional source position that is sampled
//! bilinearly. Pixels whose inverse sample falls outside the source image are
//! left untouched, as are pixels of degenerate triangles.

use crate::geom::{Affine, Triangle};
use crate::image::{Image, Rect};

/// Warps the contents of `src_tri` in `src` onto `dst_tri` in `dst`.
///
/// Every destination pixel whose center lies inside `dst_tri` (edges
/// included) receives the bilinearly sampled source color; its alpha is set
/// to 255. Anything outside the triangle, and any pixel whose inverse-mapped
/// sample would leave the source image, stays as it was.
pub fn warp_triangle(src: &Image, dst: &mut Image, src_tri: &Triangle, dst_tri: &Triangle) {
    let bounds = Rect::from_top_left(0, 0, dst.width(), dst.height());
    let corners = dst_tri
        .0
        .iter()
        .map(|p| (p.x.floor() as i32, p.y.ceil() as i32));
    let bbox = match Rect::bounding(corners).and_then(|b| b.intersection(&bounds)) {
        Some(b) => b,
        None => return,
    };

    // Inverse mapping: destination pixel -> source sample position.
    let inverse = match Affine::from_triangles(dst_tri, src_tri) {
        Some(m) => m,
        None => return,
    };

    let src_w = src.width() as f32;
    let src_h = src.height() as f32;

    for y in bbox.y()..=bbox.y_max() {
        for x in bbox.x()..=bbox.x_max() {
            let p = crate::geom::Point::new(x as f32, y as f32);
            if !dst_tri.contains(p) {
                continue;
            }

            let s = inverse.apply(p);
            if s.x < 0.0 || s.x >= src_w - 1.0 || s.y < 0.0 || s.y >= src_h - 1.0 {
                continue;
            }

            let sample = src.sample_bilinear(s.x, s.y);
            let o = 4 * (y as usize * dst.width() as usize + x as usize);
            let data = dst.data_mut();
            data[o] = sample[0].round() as u8;
            data[o + 1] = sample[1].round() as u8;
            data[o + 2] = sample[2].round() as u8;
            data[o + 3] = 255;
        }
    }
}
