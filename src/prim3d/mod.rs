mod clip;

use rayon::prelude::*;

use crate::{
    config::CullingMode,
    math::{is_top_left, ndc_to_viewport, orient_2d, BBox, Size},
    pipeline::Metrics,
    target::RenderTarget,
    triangles_iter,
    vec::{Vec2, Vec3, Vec4},
    FragmentInput, FragmentShader,
};

/// Fixed-function state applied to every triangle of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterState {
    pub culling: CullingMode,
    pub depth_test: bool,
}

/// A vertex after the perspective divide and the viewport transform.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    pos: Vec2,
    /// NDC depth, interpolated linearly in screen space.
    z: f32,
    inv_w: f32,
    color: Vec4,
}

impl ScreenVertex {
    fn new(v: &FragmentInput, viewport: Size<f32>) -> Self {
        let inv_w = 1. / v.position.w;
        let ndc = v.position.xyz() * inv_w;
        ScreenVertex {
            pos: ndc_to_viewport(ndc.xy(), viewport),
            z: ndc.z,
            inv_w,
            color: v.color,
        }
    }
}

/// A triangle ready for coverage tests, wound so that [`orient_2d`] of its vertices is positive.
#[derive(Debug, Clone, Copy)]
struct Triangle {
    v: [ScreenVertex; 3],
    /// Whether the edge opposite to each vertex is a top or left edge.
    top_left: [bool; 3],
}

impl Triangle {
    /// `None` for triangles with no area.
    fn new(mut v: [ScreenVertex; 3]) -> Option<Self> {
        let area = orient_2d(v[0].pos, v[1].pos, v[2].pos);
        if area == 0. || !area.is_finite() {
            return None;
        }
        if area < 0. {
            v.swap(1, 2);
        }
        let top_left = [
            is_top_left(v[1].pos, v[2].pos),
            is_top_left(v[2].pos, v[0].pos),
            is_top_left(v[0].pos, v[1].pos),
        ];
        Some(Triangle { v, top_left })
    }

    /// Edge functions of `p`, one per vertex. All three are non negative inside the triangle.
    #[inline(always)]
    fn edges(&self, p: Vec2) -> [f32; 3] {
        let [v0, v1, v2] = self.v;
        [
            orient_2d(v1.pos, v2.pos, p),
            orient_2d(v2.pos, v0.pos, p),
            orient_2d(v0.pos, v1.pos, p),
        ]
    }

    /// Coverage at pixel centers. Points exactly on an edge belong to the triangle only if the edge
    /// is a top or left edge, so triangles sharing an edge never shade the same pixel twice.
    #[inline(always)]
    fn covers_pixel(&self, w: [f32; 3]) -> bool {
        (0..3).all(|i| w[i] > 0. || (w[i] == 0. && self.top_left[i]))
    }

    /// Coverage of a continuous point, edges included.
    #[inline(always)]
    fn covers_point(&self, w: [f32; 3]) -> bool {
        w.iter().all(|&w| w >= 0.)
    }

    /// Depth and fragment input at a covered point with edge functions `w`.
    #[inline(always)]
    fn interpolate(&self, w: [f32; 3], p: Vec2) -> (f32, FragmentInput) {
        let [v0, v1, v2] = self.v;
        let bary = Vec3::from(w) / (w[0] + w[1] + w[2]);
        let z = bary.dot(Vec3::from([v0.z, v1.z, v2.z]));

        let persp = bary.element_mul(Vec3::from([v0.inv_w, v1.inv_w, v2.inv_w]));
        let inv_w = persp.x + persp.y + persp.z;
        // same summation order as `inv_w`, so a flat color divides back to itself
        let color = (v0.color * persp.x + v1.color * persp.y + v2.color * persp.z) / inv_w;

        let input = FragmentInput {
            position: Vec4::from([p.x, p.y, z, inv_w]),
            color,
        };
        (z, input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Facing {
    Front,
    Back,
}

enum Assembled {
    Outside,
    Culled,
    Degenerate,
    Visible(smallvec::SmallVec<[Triangle; 3]>),
}

/// Clips, projects and culls one input triangle. The near clip can split it into a fan of up to
/// three screen triangles.
fn assemble(tri: [&FragmentInput; 3], viewport: Size<f32>, culling: CullingMode) -> Assembled {
    if clip::is_trivially_outside(tri) {
        return Assembled::Outside;
    }
    let poly = clip::clip_near(tri);
    if poly.len() < 3 {
        return Assembled::Outside;
    }

    let screen: smallvec::SmallVec<[ScreenVertex; 5]> =
        poly.iter().map(|v| ScreenVertex::new(v, viewport)).collect();

    // Counter-clockwise in NDC is the front face. The viewport flips y, which flips the sign.
    let area: f32 = (1..screen.len() - 1)
        .map(|i| orient_2d(screen[0].pos, screen[i].pos, screen[i + 1].pos))
        .sum();
    let facing = if area < 0. {
        Facing::Front
    } else if area > 0. {
        Facing::Back
    } else {
        return Assembled::Degenerate;
    };

    let culled = match culling {
        CullingMode::BackFace => facing == Facing::Back,
        CullingMode::FrontFace => facing == Facing::Front,
        CullingMode::Disabled => false,
    };
    if culled {
        return Assembled::Culled;
    }

    let fan = (1..screen.len() - 1)
        .filter_map(|i| Triangle::new([screen[0], screen[i], screen[i + 1]]))
        .collect();
    Assembled::Visible(fan)
}

/// Rasterizes `vertices` as a triangle list into `target`, one triangle after the other. Within a
/// triangle the rows of the target are shaded in parallel.
pub fn draw_triangles<S>(
    vertices: &[FragmentInput],
    frag_shader: &S,
    target: &mut RenderTarget,
    state: RasterState,
    metrics: &mut Metrics,
) where
    S: FragmentShader + Sync,
{
    let viewport = target.size().to_f32();

    for tri in triangles_iter(vertices) {
        let fan = match assemble(tri, viewport, state.culling) {
            Assembled::Outside => {
                metrics.clipped += 1;
                continue;
            }
            Assembled::Culled => {
                metrics.backfaces_culled += 1;
                continue;
            }
            Assembled::Degenerate => continue,
            Assembled::Visible(fan) => fan,
        };

        for triangle in &fan {
            metrics.fragments_shaded +=
                draw_triangle(triangle, frag_shader, target, state.depth_test);
        }
        metrics.triangles_drawn += 1;
    }
}

/// Returns the number of fragments written.
fn draw_triangle<S>(
    tri: &Triangle,
    frag_shader: &S,
    target: &mut RenderTarget,
    depth_test: bool,
) -> usize
where
    S: FragmentShader + Sync,
{
    let size = target.size();
    let points = tri.v.map(|v| v.pos);
    let Some(bbox) = BBox::covering(&points, size) else {
        return 0;
    };

    let width = size.width;
    let (x0, y0) = (bbox.x as usize, bbox.y as usize);
    let (x1, y1) = (x0 + bbox.width as usize, y0 + bbox.height as usize);
    let rows = y0 * width..y1 * width;

    let (color, depth) = target.attachments_mut();
    color[rows.clone()]
        .par_chunks_mut(width)
        .zip(depth[rows].par_chunks_mut(width))
        .enumerate()
        .map(|(row, (color_row, depth_row))| {
            let py = (y0 + row) as f32 + 0.5;
            let mut written = 0;
            for x in x0..x1 {
                let p = Vec2::from([x as f32 + 0.5, py]);
                let w = tri.edges(p);
                if !tri.covers_pixel(w) {
                    continue;
                }

                let (z, input) = tri.interpolate(w, p);
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }
                if depth_test {
                    if z > depth_row[x] {
                        continue;
                    }
                    depth_row[x] = z;
                }
                color_row[x] = frag_shader.exec(input);
                written += 1;
            }
            written
        })
        .sum()
}

/// Color the draw would produce at a continuous point in normalized device coordinates, or `None`
/// if no triangle covers it. Points on a triangle's edges and vertices count as covered. Follows
/// the same clipping, culling and depth rules as [`draw_triangles`], without a target.
pub fn sample<S>(
    vertices: &[FragmentInput],
    frag_shader: &S,
    ndc: Vec2,
    state: RasterState,
) -> Option<Vec4>
where
    S: FragmentShader,
{
    // any viewport works, coverage and barycentrics do not depend on it
    let viewport = Size::new(2., 2.);
    let p = ndc_to_viewport(ndc, viewport);

    let mut nearest: Option<(f32, FragmentInput)> = None;
    for tri in triangles_iter(vertices) {
        let Assembled::Visible(fan) = assemble(tri, viewport, state.culling) else {
            continue;
        };
        for triangle in &fan {
            let w = triangle.edges(p);
            if !triangle.covers_point(w) {
                continue;
            }
            let (z, input) = triangle.interpolate(w, p);
            if !(0.0..=1.0).contains(&z) {
                continue;
            }
            let replaces = match nearest {
                Some((nearest_z, _)) if state.depth_test => z <= nearest_z,
                _ => true,
            };
            if replaces {
                nearest = Some((z, input));
            }
        }
    }
    nearest.map(|(_, input)| frag_shader.exec(input))
}
