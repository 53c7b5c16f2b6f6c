use crate::vec::{Num, Vec, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BBox<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl BBox<i32> {
    /// Smallest pixel box holding every point, clamped to `bounds`. `None` if nothing is left.
    pub fn covering(points: &[Vec2], bounds: Size<usize>) -> Option<Self> {
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let x0 = (min_x.floor().max(0.) as i64).min(bounds.width as i64);
        let y0 = (min_y.floor().max(0.) as i64).min(bounds.height as i64);
        let x1 = (max_x.ceil().max(0.) as i64).min(bounds.width as i64);
        let y1 = (max_y.ceil().max(0.) as i64).min(bounds.height as i64);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(BBox {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0) as i32,
            height: (y1 - y0) as i32,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub fn new(width: T, height: T) -> Self {
        Size { width, height }
    }
}

impl Size<usize> {
    pub fn to_f32(self) -> Size<f32> {
        Size::new(self.width as f32, self.height as f32)
    }

    pub fn aspect_ratio(self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Maps normalized device coordinates to viewport coordinates, with y pointing down.
pub fn ndc_to_viewport(ndc: Vec2, viewport: Size<f32>) -> Vec2 {
    Vec2::from([
        ndc.x * viewport.width / 2. + viewport.width / 2.,
        -ndc.y * viewport.height / 2. + viewport.height / 2.,
    ])
}

/// Returns the oriented area of the paralelogram formed by the points `from`, `to`, `p`, `from + (p - to)`. The sign
/// is positive if the points in the paralelogram wind counterclockwise (according to the order given prior) and
/// negative otherwise. In other words, if you were at `from` looking towards `to`, when `p` is to your left, the
/// value would be positive, and if it is to your right the value is negative.
///
/// ## Relationship with barycentric coordinates
///
/// This function's return value has a neat relationship with barycentric coordinates: for any triangle ABC, the barycentric
/// coordinate of a point P, named W has components:
///
/// - `W.x = orient_2d(B, C, P) / orient_2d(A, B, C)`
/// - `W.y = orient_2d(C, A, P) / orient_2d(A, B, C)`
/// - `W.z = orient_2d(A, B, P) / orient_2d(A, B, C)`
///
/// It's also worth noting that `orient_2d(A, B, C)` is twice the area of the triangle ABC.
pub fn orient_2d<T: Num>(from: Vec<T, 2>, to: Vec<T, 2>, p: Vec<T, 2>) -> T {
    let u = to - from;
    let v = p - from;
    u.x * v.y - u.y * v.x
}

/// Check if a give edge is top or left, for triangles with a positive [`orient_2d`] in viewport
/// space (y pointing down).
///
/// > Any pixel center which falls inside a triangle is drawn; a pixel is assumed to be inside if it
/// > passes the top-left rule. The top-left rule is that a pixel center is defined to lie inside of
/// > a triangle if it lies on the top edge or the left edge of a triangle.
///
/// ## Sources:
/// - [Rasterization Rules](https://learn.microsoft.com/en-us/windows/win32/direct3d11/d3d10-graphics-programming-guide-rasterizer-stage-rules)
/// - [Triangle Rasterization in Practice](https://fgiesen.wordpress.com/2013/02/08/triangle-rasterization-in-practice/)
pub fn is_top_left(from: Vec2, to: Vec2) -> bool {
    let edge = to - from;
    let is_top = edge.y == 0. && edge.x > 0.;
    let is_left = edge.y < 0.;
    is_top || is_left
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndc_corners_map_to_viewport_corners() {
        let viewport = Size::new(200., 100.);
        let top_left = ndc_to_viewport(Vec2::from([-1., 1.]), viewport);
        let bottom_right = ndc_to_viewport(Vec2::from([1., -1.]), viewport);
        assert_eq!(top_left.to_array(), [0., 0.]);
        assert_eq!(bottom_right.to_array(), [200., 100.]);
    }

    #[test]
    fn orientation_sign_follows_winding() {
        let a = Vec2::from([0., 0.]);
        let b = Vec2::from([1., 0.]);
        let c = Vec2::from([0., 1.]);
        assert_eq!(orient_2d(a, b, c), 1.);
        assert_eq!(orient_2d(a, c, b), -1.);
    }

    #[test]
    fn bbox_is_clamped_to_bounds() {
        let points = [
            Vec2::from([-5., 2.5]),
            Vec2::from([3.2, -1.]),
            Vec2::from([12., 4.]),
        ];
        let bbox = BBox::covering(&points, Size::new(8, 8)).unwrap();
        assert_eq!(bbox, BBox { x: 0, y: 0, width: 8, height: 4 });

        let outside = [Vec2::from([20., 20.]), Vec2::from([30., 25.])];
        assert_eq!(BBox::covering(&outside, Size::new(8, 8)), None);
    }
}
