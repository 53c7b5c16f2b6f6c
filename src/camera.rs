use crate::vec::{Mat4x4, Vec3};

/// Camera orbiting the origin. Angles are in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub radius: f32,
}

impl OrbitCamera {
    /// View matrix: rotate by yaw around y, then by pitch around x, then push the scene `radius`
    /// units down the negative z axis.
    pub fn matrix(&self) -> Mat4x4 {
        Vec3::from([0., 0., -self.radius]).to_translation()
            * Mat4x4::rotation_x(self.pitch)
            * Mat4x4::rotation_y(self.yaw)
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        OrbitCamera {
            yaw: 1.0,
            pitch: 0.5,
            radius: 4.0,
        }
    }
}

/// Right-handed perspective projection with `w_clip = -z_view`, depth mapped to `[-1, 1]`.
/// `fovy` is measured in degrees.
#[rustfmt::skip]
pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Mat4x4 {
    let tan_half_fovy = (0.5 * fovy.to_radians()).tan();
    let a = 1. / (aspect * tan_half_fovy);
    let b = 1. / tan_half_fovy;
    let c = -(far + near) / (far - near);
    let d = -2. * far * near / (far - near);
    Mat4x4::from([
        [ a,  0.,  0., 0.],
        [0.,   b,  0., 0.],
        [0.,  0.,   c,  d],
        [0.,  0., -1., 0.],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec::Vec4;

    #[test]
    fn camera_looks_at_origin_from_radius() {
        let camera = OrbitCamera {
            yaw: 0.,
            pitch: 0.,
            radius: 4.,
        };
        let origin = camera.matrix() * Vec4::from([0., 0., 0., 1.]);
        assert_eq!(origin.to_array(), [0., 0., -4., 1.]);
    }

    #[test]
    fn orbiting_keeps_distance() {
        let camera = OrbitCamera::default();
        let p = camera.matrix() * Vec4::from([0., 0., 0., 1.]);
        assert!((p.xyz().mag() - camera.radius).abs() < 1e-5);

        let corner = camera.matrix() * Vec4::from([1., 1., 1., 1.]);
        let eye_distance = (corner.xyz() - p.xyz()).mag();
        assert!((eye_distance - 3f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let proj = perspective(60., 1.5, 0.1, 100.);

        let near = proj * Vec4::from([0., 0., -0.1, 1.]);
        assert!((near.z / near.w + 1.).abs() < 1e-4);

        let far = proj * Vec4::from([0., 0., -100., 1.]);
        assert!((far.z / far.w - 1.).abs() < 1e-4);
        assert_eq!(far.w, 100.);
    }
}
