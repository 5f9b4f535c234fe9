//! Vector and matrix math for the render pipeline
//!
//! All matrices are row-major and multiply column vectors on the right
//! (`m * v`), so `a * b * v` applies `b` first.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Index, IndexMut, Mul, Neg, Sub};

/// Determinant magnitude below which a matrix counts as singular
pub const SINGULAR_EPSILON: f32 = 1e-12;

macro_rules! impl_vector {
    ($name:ident, $($field:ident : $idx:literal),+) => {
        impl $name {
            pub const ZERO: $name = $name { $($field: 0.0),+ };

            pub fn new($($field: f32),+) -> Self {
                Self { $($field),+ }
            }

            pub fn dot(self, other: $name) -> f32 {
                0.0 $(+ self.$field * other.$field)+
            }

            pub fn len_sq(self) -> f32 {
                self.dot(self)
            }

            pub fn len(self) -> f32 {
                self.len_sq().sqrt()
            }

            /// Unit vector with the same direction. Length must be non-zero.
            pub fn normalize(self) -> $name {
                let l = self.len();
                debug_assert!(l > 0.0, concat!("normalize of a zero-length ", stringify!($name)));
                self / l
            }

            /// Like `normalize`, but `None` for zero or non-finite length
            pub fn try_normalize(self) -> Option<$name> {
                let l = self.len();
                if l > 0.0 && l.is_finite() {
                    Some(self / l)
                } else {
                    None
                }
            }

            pub fn scale(self, s: f32) -> $name {
                $name { $($field: self.$field * s),+ }
            }
        }

        impl Add for $name {
            type Output = $name;
            fn add(self, other: $name) -> $name {
                $name { $($field: self.$field + other.$field),+ }
            }
        }

        impl Add<f32> for $name {
            type Output = $name;
            fn add(self, s: f32) -> $name {
                $name { $($field: self.$field + s),+ }
            }
        }

        impl Sub for $name {
            type Output = $name;
            fn sub(self, other: $name) -> $name {
                $name { $($field: self.$field - other.$field),+ }
            }
        }

        impl Sub<f32> for $name {
            type Output = $name;
            fn sub(self, s: f32) -> $name {
                $name { $($field: self.$field - s),+ }
            }
        }

        impl Mul<f32> for $name {
            type Output = $name;
            fn mul(self, s: f32) -> $name {
                self.scale(s)
            }
        }

        impl Div<f32> for $name {
            type Output = $name;
            fn div(self, s: f32) -> $name {
                $name { $($field: self.$field / s),+ }
            }
        }

        impl Neg for $name {
            type Output = $name;
            fn neg(self) -> $name {
                $name { $($field: -self.$field),+ }
            }
        }

        impl Index<usize> for $name {
            type Output = f32;
            fn index(&self, i: usize) -> &f32 {
                match i {
                    $($idx => &self.$field,)+
                    _ => panic!("{} index {} out of range", stringify!($name), i),
                }
            }
        }

        impl IndexMut<usize> for $name {
            fn index_mut(&mut self, i: usize) -> &mut f32 {
                match i {
                    $($idx => &mut self.$field,)+
                    _ => panic!("{} index {} out of range", stringify!($name), i),
                }
            }
        }
    };
}

/// 2D Vector (texture coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Homogeneous 4D vector (clip space)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl_vector!(Vec2, x: 0, y: 1);
impl_vector!(Vec3, x: 0, y: 1, z: 2);
impl_vector!(Vec4, x: 0, y: 1, z: 2, w: 3);

impl Vec3 {
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Lift into homogeneous coordinates with the given w
    pub fn extend(self, w: f32) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, w)
    }

    /// Round x/y to the nearest integer screen position
    pub fn round_xy(self) -> IVec2 {
        IVec2::new(self.x.round() as i32, self.y.round() as i32)
    }
}

impl Vec4 {
    /// Perspective divide back to 3D. w must be non-zero.
    pub fn project(self) -> Vec3 {
        debug_assert!(self.w != 0.0, "project of a Vec4 with w == 0");
        Vec3::new(self.x / self.w, self.y / self.w, self.z / self.w)
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// Integer screen position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IVec2 {
    pub x: i32,
    pub y: i32,
}

impl IVec2 {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for IVec2 {
    type Output = IVec2;
    fn add(self, other: IVec2) -> IVec2 {
        IVec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for IVec2 {
    type Output = IVec2;
    fn sub(self, other: IVec2) -> IVec2 {
        IVec2::new(self.x - other.x, self.y - other.y)
    }
}

macro_rules! impl_matrix {
    ($name:ident, $vec:ident, $n:literal) => {
        impl $name {
            pub const ZERO: $name = $name { rows: [$vec::ZERO; $n] };

            pub fn new(rows: [$vec; $n]) -> Self {
                Self { rows }
            }

            pub fn from_array(values: [[f32; $n]; $n]) -> Self {
                let mut m = Self::ZERO;
                for (r, row) in values.iter().enumerate() {
                    for (c, v) in row.iter().enumerate() {
                        m.rows[r][c] = *v;
                    }
                }
                m
            }

            pub fn identity() -> Self {
                let mut m = Self::ZERO;
                for i in 0..$n {
                    m.rows[i][i] = 1.0;
                }
                m
            }

            pub fn transpose(&self) -> $name {
                let mut m = Self::ZERO;
                for r in 0..$n {
                    for c in 0..$n {
                        m.rows[r][c] = self.rows[c][r];
                    }
                }
                m
            }

            /// Sum of every element
            pub fn sum(&self) -> f32 {
                self.rows
                    .iter()
                    .map(|row| (0..$n).map(|c| row[c]).sum::<f32>())
                    .sum()
            }

            /// Inverse via the adjugate, or `None` if the determinant is ~0
            pub fn try_invert(&self) -> Option<$name> {
                let det = self.determinant();
                if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
                    return None;
                }
                Some(self.adjugate() * (1.0 / det))
            }

            /// Inverse of an invertible matrix. Panics when singular.
            pub fn invert(&self) -> $name {
                match self.try_invert() {
                    Some(inv) => inv,
                    None => panic!(
                        "invert of a singular {} (det = {})",
                        stringify!($name),
                        self.determinant()
                    ),
                }
            }
        }

        impl Mul for $name {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                let mut m = Self::ZERO;
                for r in 0..$n {
                    for c in 0..$n {
                        let mut sum = 0.0;
                        for i in 0..$n {
                            sum += self.rows[r][i] * rhs.rows[i][c];
                        }
                        m.rows[r][c] = sum;
                    }
                }
                m
            }
        }

        impl Mul<$vec> for $name {
            type Output = $vec;
            fn mul(self, v: $vec) -> $vec {
                let mut out = $vec::ZERO;
                for r in 0..$n {
                    out[r] = self.rows[r].dot(v);
                }
                out
            }
        }

        impl Mul<f32> for $name {
            type Output = $name;
            fn mul(self, s: f32) -> $name {
                let mut m = self;
                for row in m.rows.iter_mut() {
                    *row = *row * s;
                }
                m
            }
        }

        impl Index<usize> for $name {
            type Output = $vec;
            fn index(&self, r: usize) -> &$vec {
                &self.rows[r]
            }
        }

        impl IndexMut<usize> for $name {
            fn index_mut(&mut self, r: usize) -> &mut $vec {
                &mut self.rows[r]
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::identity()
            }
        }
    };
}

/// Cofactor expansion for matrices whose minors are one size smaller
macro_rules! impl_cofactor {
    ($name:ident, $minor:ident, $n:literal) => {
        impl $name {
            /// Matrix with `skip_row` and `skip_col` removed
            pub fn minor(&self, skip_row: usize, skip_col: usize) -> $minor {
                let mut out = $minor::ZERO;
                for r in (0..$n).filter(|&r| r != skip_row) {
                    let rr = if r > skip_row { r - 1 } else { r };
                    for c in (0..$n).filter(|&c| c != skip_col) {
                        let cc = if c > skip_col { c - 1 } else { c };
                        out.rows[rr][cc] = self.rows[r][c];
                    }
                }
                out
            }

            pub fn determinant(&self) -> f32 {
                (0..$n)
                    .map(|c| cofactor_sign(0, c) * self.rows[0][c] * self.minor(0, c).determinant())
                    .sum()
            }

            pub fn adjugate(&self) -> $name {
                let mut cofactors = Self::ZERO;
                for r in 0..$n {
                    for c in 0..$n {
                        cofactors.rows[r][c] = cofactor_sign(r, c) * self.minor(r, c).determinant();
                    }
                }
                cofactors.transpose()
            }
        }
    };
}

fn cofactor_sign(row: usize, col: usize) -> f32 {
    if (row + col) % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat2 {
    pub rows: [Vec2; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub rows: [Vec3; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub rows: [Vec4; 4],
}

impl_matrix!(Mat2, Vec2, 2);
impl_matrix!(Mat3, Vec3, 3);
impl_matrix!(Mat4, Vec4, 4);
impl_cofactor!(Mat3, Mat2, 3);
impl_cofactor!(Mat4, Mat3, 4);

impl Mat2 {
    pub fn determinant(&self) -> f32 {
        self.rows[0].x * self.rows[1].y - self.rows[0].y * self.rows[1].x
    }

    pub fn adjugate(&self) -> Mat2 {
        let [a, b] = [self.rows[0].x, self.rows[0].y];
        let [c, d] = [self.rows[1].x, self.rows[1].y];
        Mat2::from_array([[d, -b], [-c, a]])
    }
}

impl Mat4 {
    /// Upper-left 3x3 block (drops translation and projection terms)
    pub fn to_mat3(&self) -> Mat3 {
        Mat3::new([self.rows[0].xyz(), self.rows[1].xyz(), self.rows[2].xyz()])
    }
}

// ============================================================================
// Camera and transform builders
// ============================================================================

/// Model-view matrix looking from `eye` towards `center`
pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
    let z = (eye - center).normalize();
    let x = up.cross(z).normalize();
    let y = z.cross(x).normalize();

    Mat4::from_array([
        [x.x, x.y, x.z, -center.x],
        [y.x, y.y, y.z, -center.y],
        [z.x, z.y, z.z, -center.z],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Simple perspective projection driven only by the eye-center distance
pub fn projection(eye: Vec3, center: Vec3) -> Mat4 {
    let c = (eye - center).len();
    assert!(c != 0.0, "projection with eye == center");

    Mat4::from_array([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, -1.0 / c, 1.0],
    ])
}

/// Depth range the viewport maps NDC z into
pub const VIEWPORT_DEPTH: f32 = 255.0;

/// Maps NDC [-1, 1] onto the pixel rectangle at (x, y) of size w*h
pub fn viewport(x: f32, y: f32, w: f32, h: f32) -> Mat4 {
    Mat4::from_array([
        [w / 2.0, 0.0, 0.0, x + w / 2.0],
        [0.0, h / 2.0, 0.0, y + h / 2.0],
        [0.0, 0.0, VIEWPORT_DEPTH / 2.0, VIEWPORT_DEPTH / 2.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

pub fn rotation_x(deg: f32) -> Mat4 {
    let (s, c) = deg.to_radians().sin_cos();
    Mat4::from_array([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, c, -s, 0.0],
        [0.0, s, c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

pub fn rotation_y(deg: f32) -> Mat4 {
    let (s, c) = deg.to_radians().sin_cos();
    Mat4::from_array([
        [c, 0.0, s, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [-s, 0.0, c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

pub fn rotation_z(deg: f32) -> Mat4 {
    let (s, c) = deg.to_radians().sin_cos();
    Mat4::from_array([
        [c, -s, 0.0, 0.0],
        [s, c, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

pub fn translation(v: Vec3) -> Mat4 {
    Mat4::from_array([
        [1.0, 0.0, 0.0, v.x],
        [0.0, 1.0, 0.0, v.y],
        [0.0, 0.0, 1.0, v.z],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

pub fn scaling(v: Vec3) -> Mat4 {
    let mut m = Mat4::identity();
    m.rows[0].x = v.x;
    m.rows[1].y = v.y;
    m.rows[2].z = v.z;
    m
}
