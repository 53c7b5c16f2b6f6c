//! Clip-space tests, run before the perspective divide. The clip volume follows the WebGPU
//! convention: `-w <= x, y <= w` and `0 <= z <= w`.

use smallvec::SmallVec;

use crate::{vec::Vec4, FragmentInput};

/// Smallest `w` a vertex may keep after clipping, so the divide never sees zero.
const W_EPSILON: f32 = 1e-6;

/// A triangle clipped against two planes has at most five vertices.
pub(super) type ClippedPolygon = SmallVec<[FragmentInput; 5]>;

/// The six planes of the clip volume as signed distances, positive inside.
fn plane_distances(p: Vec4) -> [f32; 6] {
    [p.w + p.x, p.w - p.x, p.w + p.y, p.w - p.y, p.z, p.w - p.z]
}

/// True when all three vertices are outside the same plane, which means no part of the triangle
/// can be visible. Triangles that straddle a corner of the volume are kept.
pub(super) fn is_trivially_outside(tri: [&FragmentInput; 3]) -> bool {
    let d = tri.map(|v| plane_distances(v.position));
    (0..6).any(|plane| d[0][plane] < 0. && d[1][plane] < 0. && d[2][plane] < 0.)
}

/// Cuts the triangle against the near plane (`z >= 0`) and against `w > 0`. Attributes of the new
/// vertices are interpolated linearly in clip space. Triangles that need no clipping come back
/// unchanged, bit for bit.
pub(super) fn clip_near(tri: [&FragmentInput; 3]) -> ClippedPolygon {
    let mut poly: ClippedPolygon = tri.into_iter().copied().collect();
    poly = clip_polygon(&poly, |p| p.w - W_EPSILON);
    clip_polygon(&poly, |p| p.z)
}

/// One Sutherland-Hodgman pass against the plane `distance(p) >= 0`.
fn clip_polygon(poly: &[FragmentInput], distance: impl Fn(Vec4) -> f32) -> ClippedPolygon {
    let mut out = ClippedPolygon::new();
    if poly.iter().all(|v| distance(v.position) >= 0.) {
        out.extend(poly.iter().copied());
        return out;
    }

    for (i, &curr) in poly.iter().enumerate() {
        let next = poly[(i + 1) % poly.len()];
        let d_curr = distance(curr.position);
        let d_next = distance(next.position);

        if d_curr >= 0. {
            out.push(curr);
        }
        if (d_curr >= 0.) != (d_next >= 0.) {
            let t = d_curr / (d_curr - d_next);
            out.push(lerp(curr, next, t));
        }
    }
    out
}

fn lerp(a: FragmentInput, b: FragmentInput, t: f32) -> FragmentInput {
    FragmentInput {
        position: a.position + (b.position - a.position) * t,
        color: a.color + (b.color - a.color) * t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vert(x: f32, y: f32, z: f32, w: f32) -> FragmentInput {
        FragmentInput {
            position: Vec4::from([x, y, z, w]),
            color: Vec4::from([1., 1., 1., 1.]),
        }
    }

    #[test]
    fn triangle_beyond_one_plane_is_outside() {
        let (a, b, c) = (vert(2., 0., 0.5, 1.), vert(3., 1., 0.5, 1.), vert(1.5, -1., 0.5, 1.));
        assert!(is_trivially_outside([&a, &b, &c]));
    }

    #[test]
    fn triangle_across_a_corner_is_kept() {
        // each vertex is outside a different plane
        let (a, b, c) = (vert(2., 0., 0.5, 1.), vert(0., 2., 0.5, 1.), vert(-2., -2., 0.5, 1.));
        assert!(!is_trivially_outside([&a, &b, &c]));
    }

    #[test]
    fn visible_triangle_is_untouched() {
        let (a, b, c) = (vert(-1., -1., 0., 1.), vert(0., 1., 0., 1.), vert(1., -1., 0., 1.));
        let poly = clip_near([&a, &b, &c]);
        assert_eq!(poly.as_slice(), [a, b, c]);
    }

    #[test]
    fn near_plane_cuts_off_a_corner() {
        let (a, b, c) = (vert(0., 0., -1., 1.), vert(1., 0., 1., 1.), vert(0., 1., 1., 1.));
        let poly = clip_near([&a, &b, &c]);
        assert_eq!(poly.len(), 4);
        assert!(poly.iter().all(|v| v.position.z >= 0.));
        assert_eq!(poly[0].position.to_array(), [0.5, 0., 0., 1.]);
    }

    #[test]
    fn triangle_behind_the_camera_vanishes() {
        let (a, b, c) = (vert(0., 0., -1., -1.), vert(1., 0., -1., -1.), vert(0., 1., -1., -1.));
        assert!(clip_near([&a, &b, &c]).is_empty());
    }
}
