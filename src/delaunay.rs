//! Bowyer–Watson Delaunay triangulation.
//!
//! The triangulator is seeded with a super-triangle enclosing the whole image,
//! inserts points one at a time by re-triangulating the cavity of triangles
//! whose circumcircle contains the new point, and finally discards every
//! triangle still touching a super-triangle vertex.
//!
//! With identical input ordering the output is identical, which the morph
//! pipeline relies on: overlapping triangles are warped in list order.

use crate::geom::{in_circumcircle, Point};
use crate::resolution::Resolution;

/// Margin factor for the super-triangle, relative to the larger image side.
///
/// Smaller margins risk circumcircle misclassification near the image corners.
const SUPER_MARGIN: f32 = 10.0;

/// Triangulates `points`, returning triangles as index triples into `points`.
///
/// Points outside `[0, width) x [0, height)` or with non-finite coordinates
/// are skipped; returned indices always refer to the original slice. Fewer
/// than 3 usable points yield an empty triangulation.
pub fn triangulate(points: &[Point], bounds: Resolution) -> Vec<[usize; 3]> {
    let w = bounds.width() as f32;
    let h = bounds.height() as f32;

    let mut remap = Vec::with_capacity(points.len());
    let mut verts = Vec::with_capacity(points.len() + 3);
    for (i, &p) in points.iter().enumerate() {
        if p.is_finite() && p.x >= 0.0 && p.x < w && p.y >= 0.0 && p.y < h {
            remap.push(i);
            verts.push(p);
        }
    }

    let n = verts.len();
    if n < 3 {
        return Vec::new();
    }

    let m = SUPER_MARGIN * w.max(h);
    verts.push(Point::new(-m, -m));
    verts.push(Point::new(w + 2.0 * m, -m));
    verts.push(Point::new(w / 2.0, h + 2.0 * m));

    let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];
    let mut bad = Vec::new();
    let mut boundary: Vec<(usize, usize)> = Vec::new();

    for i in 0..n {
        let p = verts[i];

        bad.clear();
        for (ti, t) in triangles.iter().enumerate() {
            if in_circumcircle(p, verts[t[0]], verts[t[1]], verts[t[2]]) {
                bad.push(ti);
            }
        }
        if bad.is_empty() {
            // Coincides with an existing vertex (circumcircles pass *through*
            // it, which counts as outside); nothing to re-triangulate.
            continue;
        }

        // An edge is on the cavity boundary iff no other bad triangle shares it.
        boundary.clear();
        for (bi, &ti) in bad.iter().enumerate() {
            let t = triangles[ti];
            for edge in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                let shared = bad.iter().enumerate().any(|(bj, &tj)| {
                    bj != bi && {
                        let o = triangles[tj];
                        [(o[0], o[1]), (o[1], o[2]), (o[2], o[0])]
                            .iter()
                            .any(|&(u, v)| (u, v) == edge || (v, u) == edge)
                    }
                });
                if !shared {
                    boundary.push(edge);
                }
            }
        }

        for (removed, &ti) in bad.iter().enumerate() {
            triangles.remove(ti - removed);
        }
        for &(u, v) in &boundary {
            triangles.push([u, v, i]);
        }
    }

    let result: Vec<[usize; 3]> = triangles
        .into_iter()
        .filter(|t| t.iter().all(|&v| v < n))
        .map(|t| [remap[t[0]], remap[t[1]], remap[t[2]]])
        .collect();

    log::trace!(
        "triangulated {} of {} points into {} triangles",
        n,
        points.len(),
        result.len()
    );
    result
}
