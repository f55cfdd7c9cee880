// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Implementation of methods for three-dimensional vector.

use std::ops::{Deref, DerefMut};

use nalgebra::base::Vector3;

/// Describes length and orientation of a vector in space or a position of a point in space.
/// Implemented using `nalgebra`'s Vector3 in double precision.
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3D(pub(crate) Vector3<f64>);

impl From<[f64; 3]> for Vector3D {
    #[inline]
    fn from(arr: [f64; 3]) -> Self {
        Vector3D(Vector3::new(arr[0], arr[1], arr[2]))
    }
}

impl From<Vector3D> for [f64; 3] {
    #[inline]
    fn from(vec: Vector3D) -> Self {
        [vec.x, vec.y, vec.z]
    }
}

/// Allows accessing fields of `Vector3D` as `.x`, `.y`, and `.z`.
pub struct Vector3Raw {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Deref for Vector3D {
    type Target = Vector3Raw;

    #[inline]
    fn deref(&self) -> &Self::Target {
        unsafe { &*(self.0.as_ptr() as *const Vector3Raw) }
    }
}

impl DerefMut for Vector3D {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *(self.0.as_mut_ptr() as *mut Vector3Raw) }
    }
}

impl Vector3D {
    /// Create a new `Vector3D` structure.
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3D(Vector3::new(x, y, z))
    }

    /// Calculate length of the vector.
    ///
    /// ## Example
    /// ```
    /// # use dcd_tools::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let vector = Vector3D::new(1.0, 2.0, 3.0);
    /// assert_approx_eq!(f64, vector.len(), 3.7416573867739413);
    /// ```
    #[inline]
    pub fn len(&self) -> f64 {
        self.0.magnitude()
    }

    /// Calculate dot product of two vectors.
    #[inline]
    pub fn dot(&self, vector: &Vector3D) -> f64 {
        self.0.dot(&vector.0)
    }

    /// Calculate cross product of two vectors.
    ///
    /// ## Example
    /// ```
    /// # use dcd_tools::prelude::*;
    /// #
    /// let a = Vector3D::new(1.0, 0.0, 0.0);
    /// let b = Vector3D::new(0.0, 1.0, 0.0);
    /// assert_eq!(a.cross(&b), Vector3D::new(0.0, 0.0, 1.0));
    /// ```
    #[inline]
    pub fn cross(&self, vector: &Vector3D) -> Vector3D {
        Vector3D(self.0.cross(&vector.0))
    }

    /// Calculate angle between two vectors. Returns angle in radians.
    ///
    /// ## Notes
    /// - The cosine is clamped to [-1, 1] so that nearly (anti)parallel vectors
    ///   do not produce NaN.
    #[inline]
    pub fn angle(&self, vector: &Vector3D) -> f64 {
        (self.dot(vector) / (self.len() * vector.len()))
            .clamp(-1.0, 1.0)
            .acos()
    }

    /// Check whether all components of the vector are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Check whether the vector is a null vector.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

impl Default for Vector3D {
    /// Create a null vector.
    #[inline]
    fn default() -> Self {
        Vector3D(Vector3::zeros())
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
