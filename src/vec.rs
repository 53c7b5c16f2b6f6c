use std::ops::{
    Add, AddAssign, Deref, DerefMut, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub,
    SubAssign,
};

pub type Mat4x4 = Mat<f32, 4, 4>;

/// Row-major `M x N` matrix. Vectors are column matrices, so transforms compose as `a * b * v`.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat<T, const M: usize, const N: usize>([[T; N]; M]);

impl<T: Num, const M: usize, const N: usize> Mat<T, M, N> {
    pub fn zero() -> Self {
        Mat([[T::zero(); N]; M])
    }

    pub fn one() -> Self {
        Mat([[T::one(); N]; M])
    }

    pub fn transpose(self) -> Mat<T, N, M> {
        let mut ret = Mat::zero();
        for i in 0..M {
            for j in 0..N {
                ret[(j, i)] = self[(i, j)];
            }
        }
        ret
    }
}

impl<T: Num, const N: usize> Mat<T, N, N> {
    pub fn identity() -> Self {
        let mut ret = Self::zero();
        for i in 0..N {
            ret[(i, i)] = T::one();
        }
        ret
    }
}

impl<T: Num> Mat<T, 4, 4> {
    #[rustfmt::skip]
    pub fn rotation_x(theta: T) -> Self {
        let o = T::one();
        let z = T::zero();
        let cos = theta.cos();
        let sin = theta.sin();
        Mat([[   o,   z,   z,   z],
             [   z, cos,-sin,   z],
             [   z, sin, cos,   z],
             [   z,   z,   z,   o]])
    }

    #[rustfmt::skip]
    pub fn rotation_y(theta: T) -> Self {
        let o = T::one();
        let z = T::zero();
        let cos = theta.cos();
        let sin = theta.sin();
        Mat([[ cos,   z, sin,   z],
             [   z,   o,   z,   z],
             [-sin,   z, cos,   z],
             [   z,   z,   z,   o]])
    }

    #[rustfmt::skip]
    pub fn rotation_z(theta: T) -> Self {
        let o = T::one();
        let z = T::zero();
        let cos = theta.cos();
        let sin = theta.sin();
        Mat([[ cos, -sin,   z,   z],
             [ sin,  cos,   z,   z],
             [   z,    z,   o,   z],
             [   z,    z,   z,   o]])
    }

    /// Builds a matrix from four columns, the layout WGSL's `mat4x4<f32>` uses in memory.
    pub fn from_cols_array(cols: [[T; 4]; 4]) -> Self {
        Mat(cols).transpose()
    }

    /// Inverse of [`Mat::from_cols_array`].
    pub fn to_cols_array(self) -> [[T; 4]; 4] {
        self.transpose().0
    }
}

impl<T, const M: usize, const N: usize> From<[[T; N]; M]> for Mat<T, M, N> {
    fn from(value: [[T; N]; M]) -> Self {
        Mat(value)
    }
}

pub type Vec<T, const N: usize> = Mat<T, N, 1>;
pub type Vec2 = Vec<f32, 2>;
pub type Vec3 = Vec<f32, 3>;
pub type Vec4 = Vec<f32, 4>;

impl<T: Num, const N: usize> Vec<T, N> {
    pub fn mag_sq(&self) -> T {
        self.0.iter().map(|&[coord]| coord * coord).sum()
    }

    pub fn mag(&self) -> T {
        self.mag_sq().sqrt()
    }

    pub fn dot(self, rhs: Self) -> T {
        self.0.iter().zip(rhs.0.iter()).map(|(&[a], &[b])| a * b).sum()
    }

    pub fn element_mul(self, rhs: Self) -> Self {
        let mut ret = self;
        for i in 0..N {
            ret[(i, 0)] *= rhs[(i, 0)];
        }
        ret
    }
}

impl<T: Copy, const N: usize> Vec<T, N> {
    pub fn to_array(self) -> [T; N] {
        self.0.map(|[el]| el)
    }
}

impl<T: Num> Vec<T, 3> {
    /// Extends a point to homogeneous coordinates (`w = 1`).
    pub fn extend(self, w: T) -> Vec<T, 4> {
        Vec::from([self.x, self.y, self.z, w])
    }

    pub fn to_translation(self) -> Mat<T, 4, 4> {
        let mut ret = Mat::identity();
        ret[(0, 3)] = self.x;
        ret[(1, 3)] = self.y;
        ret[(2, 3)] = self.z;
        ret
    }

    pub fn to_scale(self) -> Mat<T, 4, 4> {
        let mut ret = Mat::zero();
        ret[(0, 0)] = self.x;
        ret[(1, 1)] = self.y;
        ret[(2, 2)] = self.z;
        ret[(3, 3)] = T::one();
        ret
    }
}

impl<T, const N: usize> From<[T; N]> for Vec<T, N> {
    fn from(value: [T; N]) -> Self {
        Mat(value.map(|el| [el]))
    }
}

impl<T, const M: usize, const N: usize> Index<(usize, usize)> for Mat<T, M, N> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.0[i][j]
    }
}

impl<T, const M: usize, const N: usize> IndexMut<(usize, usize)> for Mat<T, M, N> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        &mut self.0[i][j]
    }
}

impl<T: Num, const M: usize, const N: usize> Add for Mat<T, M, N> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let mut ret = self;
        ret += rhs;
        ret
    }
}

impl<T: Num, const M: usize, const N: usize> AddAssign for Mat<T, M, N> {
    fn add_assign(&mut self, rhs: Self) {
        for i in 0..M {
            for j in 0..N {
                self[(i, j)] += rhs[(i, j)];
            }
        }
    }
}

impl<T: Num, const M: usize, const N: usize> Sub for Mat<T, M, N> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let mut ret = self;
        for i in 0..M {
            for j in 0..N {
                ret[(i, j)] -= rhs[(i, j)];
            }
        }
        ret
    }
}

impl<T: Num, const M: usize, const N: usize> Mul<T> for Mat<T, M, N> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        let mut ret = self;
        for i in 0..M {
            for j in 0..N {
                ret[(i, j)] *= rhs;
            }
        }
        ret
    }
}

impl<T: Num, const M: usize, const K: usize, const N: usize> Mul<Mat<T, K, N>> for Mat<T, M, K> {
    type Output = Mat<T, M, N>;

    fn mul(self, rhs: Mat<T, K, N>) -> Self::Output {
        let mut ret = Mat::zero();
        for i in 0..M {
            for j in 0..N {
                for k in 0..K {
                    ret[(i, j)] += self[(i, k)] * rhs[(k, j)];
                }
            }
        }
        ret
    }
}

impl<T: Num, const M: usize, const N: usize> Div<T> for Mat<T, M, N> {
    type Output = Self;

    fn div(self, rhs: T) -> Self {
        let mut ret = self;
        for i in 0..M {
            for j in 0..N {
                ret[(i, j)] /= rhs;
            }
        }
        ret
    }
}

// `Vec<T, N>` is `[[T; 1]; N]` behind a transparent wrapper, which has the same layout as the
// `repr(C)` swizzle structs below.

impl<T> Deref for Vec<T, 2> {
    type Target = XY<T>;

    fn deref(&self) -> &XY<T> {
        unsafe { &*(self as *const Self).cast::<XY<T>>() }
    }
}

impl<T> DerefMut for Vec<T, 2> {
    fn deref_mut(&mut self) -> &mut XY<T> {
        unsafe { &mut *(self as *mut Self).cast::<XY<T>>() }
    }
}

impl<T> Deref for Vec<T, 3> {
    type Target = XYZ<T>;

    fn deref(&self) -> &XYZ<T> {
        unsafe { &*(self as *const Self).cast::<XYZ<T>>() }
    }
}

impl<T> DerefMut for Vec<T, 3> {
    fn deref_mut(&mut self) -> &mut XYZ<T> {
        unsafe { &mut *(self as *mut Self).cast::<XYZ<T>>() }
    }
}

impl<T> Deref for Vec<T, 4> {
    type Target = XYZW<T>;

    fn deref(&self) -> &XYZW<T> {
        unsafe { &*(self as *const Self).cast::<XYZW<T>>() }
    }
}

impl<T> DerefMut for Vec<T, 4> {
    fn deref_mut(&mut self) -> &mut XYZW<T> {
        unsafe { &mut *(self as *mut Self).cast::<XYZW<T>>() }
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XY<T> {
    pub x: T,
    pub y: T,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XYZ<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Copy> XYZ<T> {
    pub fn xy(&self) -> Vec<T, 2> {
        Vec::from([self.x, self.y])
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XYZW<T> {
    pub x: T,
    pub y: T,
    pub z: T,
    pub w: T,
}

impl<T: Copy> XYZW<T> {
    pub fn xy(&self) -> Vec<T, 2> {
        Vec::from([self.x, self.y])
    }

    pub fn xyz(&self) -> Vec<T, 3> {
        Vec::from([self.x, self.y, self.z])
    }
}

pub trait Num:
    Copy
    + PartialOrd
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + SubAssign
    + Mul<Output = Self>
    + MulAssign
    + Div<Output = Self>
    + DivAssign
    + Neg<Output = Self>
    + std::iter::Sum
{
    fn zero() -> Self;
    fn one() -> Self;
    fn sqrt(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
}

impl Num for f32 {
    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    fn sin(self) -> Self {
        f32::sin(self)
    }

    fn cos(self) -> Self {
        f32::cos(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_major_round_trip_keeps_translation_in_last_column() {
        let m = Vec3::from([1., 2., 3.]).to_translation();
        let cols = m.to_cols_array();
        assert_eq!(cols[3], [1., 2., 3., 1.]);
        assert_eq!(Mat4x4::from_cols_array(cols), m);
    }

    #[test]
    fn matrix_vector_product_uses_column_vectors() {
        let p = Vec4::from([1., 1., 1., 1.]);
        let moved = Vec3::from([2., 0., -1.]).to_translation() * p;
        assert_eq!(moved.to_array(), [3., 1., 0., 1.]);

        let scaled = Vec3::from([2., 3., 4.]).to_scale() * p;
        assert_eq!(scaled.to_array(), [2., 3., 4., 1.]);
    }

    #[test]
    fn swizzles_alias_components() {
        let mut v = Vec4::from([1., 2., 3., 4.]);
        v.w = 8.;
        assert_eq!(v.xyz().to_array(), [1., 2., 3.]);
        assert_eq!(v.xy().to_array(), [1., 2.]);
        assert_eq!(v.to_array(), [1., 2., 3., 8.]);
    }
}
