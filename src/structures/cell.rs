// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Implementation of the CellMatrix structure and its methods.

use nalgebra::Matrix3;

use crate::{errors::CellError, structures::vector3d::Vector3D};

/// Simulation cell described by three cell vectors `a`, `b`, and `c`.
///
/// The cell matrix of a simulation is a 3x3 matrix whose columns are the cell vectors.
/// When such matrix is passed from C (`double cell_matrix[3][3]`), each row of the C array
/// corresponds to one cell vector.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellMatrix {
    a: Vector3D,
    b: Vector3D,
    c: Vector3D,
}

impl From<[[f64; 3]; 3]> for CellMatrix {
    /// Convert 3x3 array to `CellMatrix`. Each inner array is one cell vector.
    fn from(arr: [[f64; 3]; 3]) -> Self {
        CellMatrix {
            a: arr[0].into(),
            b: arr[1].into(),
            c: arr[2].into(),
        }
    }
}

impl From<Matrix3<f64>> for CellMatrix {
    /// Convert `nalgebra` matrix to `CellMatrix`. Columns of the matrix are the cell vectors.
    fn from(matrix: Matrix3<f64>) -> Self {
        CellMatrix {
            a: Vector3D(matrix.column(0).into_owned()),
            b: Vector3D(matrix.column(1).into_owned()),
            c: Vector3D(matrix.column(2).into_owned()),
        }
    }
}

impl From<CellMatrix> for Matrix3<f64> {
    fn from(cell: CellMatrix) -> Self {
        Matrix3::from_columns(&[cell.a.0, cell.b.0, cell.c.0])
    }
}

impl CellMatrix {
    /// Create new cell from three cell vectors.
    pub fn from_vectors(a: Vector3D, b: Vector3D, c: Vector3D) -> Self {
        CellMatrix { a, b, c }
    }

    /// Create new orthorhombic cell with the given box lengths.
    pub fn orthorhombic(lengths: [f64; 3]) -> Self {
        CellMatrix {
            a: Vector3D::new(lengths[0], 0.0, 0.0),
            b: Vector3D::new(0.0, lengths[1], 0.0),
            c: Vector3D::new(0.0, 0.0, lengths[2]),
        }
    }

    /// Create new cell from lengths and angles (`alpha`, `beta`, `gamma`; in degrees).
    ///
    /// The vector `a` is placed along the x-axis and the vector `b` in the xy-plane.
    ///
    /// ## Example
    /// ```
    /// # use dcd_tools::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let cell = CellMatrix::from_lengths_angles([5.297, 4.863, 2.976].into(), [120.0, 70.0, 80.0].into());
    /// let c = cell.get_c();
    ///
    /// assert_approx_eq!(f64, c.x, 1.0178519, epsilon = 1e-6);
    /// assert_approx_eq!(f64, c.y, -1.6904296, epsilon = 1e-6);
    /// assert_approx_eq!(f64, c.z, 2.2277795, epsilon = 1e-6);
    /// ```
    pub fn from_lengths_angles(lengths: Vector3D, angles: Vector3D) -> Self {
        if angles.x == 90.0 && angles.y == 90.0 && angles.z == 90.0 {
            return CellMatrix::orthorhombic([lengths.x, lengths.y, lengths.z]);
        }

        let alpha = angles.x.to_radians();
        let beta = angles.y.to_radians();
        let gamma = angles.z.to_radians();

        let a = Vector3D::new(lengths.x, 0.0, 0.0);
        let b = Vector3D::new(lengths.y * gamma.cos(), lengths.y * gamma.sin(), 0.0);

        let cx = lengths.z * beta.cos();
        let cy = lengths.z * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
        let cz = (lengths.z * lengths.z - cx * cx - cy * cy).sqrt();

        CellMatrix {
            a,
            b,
            c: Vector3D::new(cx, cy, cz),
        }
    }

    /// Get the first cell vector.
    #[inline(always)]
    pub fn get_a(&self) -> Vector3D {
        self.a
    }

    /// Get the second cell vector.
    #[inline(always)]
    pub fn get_b(&self) -> Vector3D {
        self.b
    }

    /// Get the third cell vector.
    #[inline(always)]
    pub fn get_c(&self) -> Vector3D {
        self.c
    }

    /// Get the cell vectors as a 3x3 array (one cell vector per inner array).
    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [self.a.into(), self.b.into(), self.c.into()]
    }

    /// Calculate cell lengths and angles.
    ///
    /// ## Returns
    /// (`lengths`, `angles`) of the cell. Angles (`alpha` = ∠bc, `beta` = ∠ac, `gamma` = ∠ab) are in degrees.
    ///
    /// ## Example
    /// ```
    /// # use dcd_tools::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let cell = CellMatrix::from([[11.0, 0.0, 0.0], [0.0, 12.0, 0.0], [0.0, 0.0, 13.0]]);
    /// let (lengths, angles) = cell.to_lengths_angles();
    ///
    /// assert_approx_eq!(f64, lengths.y, 12.0);
    /// assert_approx_eq!(f64, angles.z, 90.0);
    /// ```
    pub fn to_lengths_angles(&self) -> (Vector3D, Vector3D) {
        let lengths = Vector3D::new(self.a.len(), self.b.len(), self.c.len());

        let angles = Vector3D::new(
            self.b.angle(&self.c).to_degrees(),
            self.a.angle(&self.c).to_degrees(),
            self.a.angle(&self.b).to_degrees(),
        );

        (lengths, angles)
    }

    /// Calculate volume of the cell (scalar triple product `a · (b × c)`).
    pub fn volume(&self) -> f64 {
        self.a.dot(&self.b.cross(&self.c))
    }

    /// Check that all cell vectors are mutually orthogonal.
    pub fn is_orthogonal(&self) -> bool {
        self.a.dot(&self.b) == 0.0 && self.a.dot(&self.c) == 0.0 && self.b.dot(&self.c) == 0.0
    }

    /// Check that the cell can be written into a trajectory file.
    ///
    /// ## Returns
    /// - `Ok` if all components are finite and the cell has a positive volume.
    /// - `CellError::NotFinite` if any component is NaN or infinite.
    /// - `CellError::Degenerate` if the volume of the cell is not positive.
    pub fn validate(&self) -> Result<(), CellError> {
        if !(self.a.is_finite() && self.b.is_finite() && self.c.is_finite()) {
            return Err(CellError::NotFinite);
        }

        let volume = self.volume();
        if volume <= 0.0 {
            return Err(CellError::Degenerate(volume));
        }

        Ok(())
    }

    /// Convert the cell to the unit cell record of a CHARMM dcd file.
    ///
    /// ## Returns
    /// `[A, cos(gamma), B, cos(beta), cos(alpha), C]`.
    pub fn to_dcd_unitcell(&self) -> [f64; 6] {
        let lengths = [self.a.len(), self.b.len(), self.c.len()];

        let cosine = |u: &Vector3D, v: &Vector3D, lu: f64, lv: f64| -> f64 {
            (u.dot(v) / (lu * lv)).clamp(-1.0, 1.0)
        };

        [
            lengths[0],
            cosine(&self.a, &self.b, lengths[0], lengths[1]),
            lengths[1],
            cosine(&self.a, &self.c, lengths[0], lengths[2]),
            cosine(&self.b, &self.c, lengths[1], lengths[2]),
            lengths[2],
        ]
    }

    /// Construct the cell from the unit cell record of a dcd file.
    ///
    /// ## Notes
    /// - If all three angle fields lie in the interval [-1, 1], they are interpreted as cosines
    ///   (CHARMM and NAMD convention). Otherwise, they are interpreted as angles in degrees.
    pub fn from_dcd_unitcell(unitcell: [f64; 6]) -> Result<Self, CellError> {
        let [a, gamma, b, beta, alpha, c] = unitcell;

        let is_cosine = |x: f64| (-1.0..=1.0).contains(&x);

        let angles = if is_cosine(alpha) && is_cosine(beta) && is_cosine(gamma) {
            Vector3D::new(
                cosine_to_degrees(alpha),
                cosine_to_degrees(beta),
                cosine_to_degrees(gamma),
            )
        } else {
            Vector3D::new(alpha, beta, gamma)
        };

        let cell = CellMatrix::from_lengths_angles(Vector3D::new(a, b, c), angles);

        cell.validate()
            .map_err(|_| CellError::InvalidUnitCell(unitcell))?;

        Ok(cell)
    }
}

/// Convert cosine to angle in degrees. Exact zero is mapped to exactly 90 degrees.
#[inline]
fn cosine_to_degrees(cosine: f64) -> f64 {
    if cosine == 0.0 {
        90.0
    } else {
        cosine.acos().to_degrees()
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn assert_cells_eq(cell1: &CellMatrix, cell2: &CellMatrix, epsilon: f64) {
        for (v1, v2) in cell1.to_array().iter().zip(cell2.to_array().iter()) {
            for (x1, x2) in v1.iter().zip(v2.iter()) {
                assert_approx_eq!(f64, *x1, *x2, epsilon = epsilon);
            }
        }
    }

    #[test]
    fn from_array() {
        let cell = CellMatrix::from([[11.0, 0.0, 0.0], [1.0, 12.0, 0.0], [2.0, 3.0, 13.0]]);

        assert_eq!(cell.get_a(), Vector3D::new(11.0, 0.0, 0.0));
        assert_eq!(cell.get_b(), Vector3D::new(1.0, 12.0, 0.0));
        assert_eq!(cell.get_c(), Vector3D::new(2.0, 3.0, 13.0));
    }

    #[test]
    fn from_matrix_columns() {
        let matrix = Matrix3::new(11.0, 1.0, 2.0, 0.0, 12.0, 3.0, 0.0, 0.0, 13.0);
        let cell = CellMatrix::from(matrix);

        assert_eq!(cell.get_a(), Vector3D::new(11.0, 0.0, 0.0));
        assert_eq!(cell.get_b(), Vector3D::new(1.0, 12.0, 0.0));
        assert_eq!(cell.get_c(), Vector3D::new(2.0, 3.0, 13.0));

        let back: Matrix3<f64> = cell.into();
        assert_eq!(back, matrix);
    }

    #[test]
    fn from_lengths_angles_orthogonal() {
        let cell =
            CellMatrix::from_lengths_angles([5.297, 4.863, 2.976].into(), [90.0, 90.0, 90.0].into());

        assert_eq!(cell, CellMatrix::orthorhombic([5.297, 4.863, 2.976]));
        assert!(cell.is_orthogonal());
    }

    #[test]
    fn from_lengths_angles_triclinic() {
        let cell = CellMatrix::from_lengths_angles(
            [5.297, 4.863, 2.976].into(),
            [120.0, 70.0, 80.0].into(),
        );

        assert_approx_eq!(f64, cell.get_a().x, 5.297, epsilon = 1e-6);
        assert_approx_eq!(f64, cell.get_b().x, 0.8444511, epsilon = 1e-6);
        assert_approx_eq!(f64, cell.get_b().y, 4.7891201, epsilon = 1e-6);
        assert_approx_eq!(f64, cell.get_b().z, 0.0, epsilon = 1e-12);
        assert_approx_eq!(f64, cell.get_c().x, 1.0178519, epsilon = 1e-6);
        assert_approx_eq!(f64, cell.get_c().y, -1.6904296, epsilon = 1e-6);
        assert_approx_eq!(f64, cell.get_c().z, 2.2277795, epsilon = 1e-6);
        assert!(!cell.is_orthogonal());

        let (lengths, angles) = cell.to_lengths_angles();
        assert_approx_eq!(f64, lengths.x, 5.297, epsilon = 1e-9);
        assert_approx_eq!(f64, lengths.y, 4.863, epsilon = 1e-9);
        assert_approx_eq!(f64, lengths.z, 2.976, epsilon = 1e-9);
        assert_approx_eq!(f64, angles.x, 120.0, epsilon = 1e-6);
        assert_approx_eq!(f64, angles.y, 70.0, epsilon = 1e-6);
        assert_approx_eq!(f64, angles.z, 80.0, epsilon = 1e-6);
    }

    #[test]
    fn volume() {
        let cell = CellMatrix::orthorhombic([11.0, 12.0, 13.0]);
        assert_approx_eq!(f64, cell.volume(), 1716.0);

        let cell = CellMatrix::from_lengths_angles(
            [5.297, 4.863, 2.976].into(),
            [120.0, 70.0, 80.0].into(),
        );
        assert_approx_eq!(f64, cell.volume(), 56.5142407, epsilon = 1e-6);
    }

    #[test]
    fn validate() {
        assert!(CellMatrix::orthorhombic([11.0, 12.0, 13.0]).validate().is_ok());

        match CellMatrix::orthorhombic([11.0, 0.0, 13.0]).validate() {
            Err(CellError::Degenerate(v)) => assert_eq!(v, 0.0),
            Ok(_) => panic!("Validation should have failed."),
            Err(e) => panic!("Incorrect error type `{:?}` was returned.", e),
        }

        let planar = CellMatrix::from([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]);
        assert!(matches!(planar.validate(), Err(CellError::Degenerate(_))));

        let nan = CellMatrix::orthorhombic([f64::NAN, 12.0, 13.0]);
        assert_eq!(nan.validate(), Err(CellError::NotFinite));
    }

    #[test]
    fn dcd_unitcell_orthogonal() {
        let cell = CellMatrix::orthorhombic([11.0, 12.0, 13.0]);
        assert_eq!(cell.to_dcd_unitcell(), [11.0, 0.0, 12.0, 0.0, 0.0, 13.0]);

        let back = CellMatrix::from_dcd_unitcell(cell.to_dcd_unitcell()).unwrap();
        assert_eq!(back, cell);
    }

    #[test]
    fn dcd_unitcell_triclinic() {
        let cell = CellMatrix::from_lengths_angles(
            [5.297, 4.863, 2.976].into(),
            [120.0, 70.0, 80.0].into(),
        );

        let unitcell = cell.to_dcd_unitcell();
        assert_approx_eq!(f64, unitcell[0], 5.297, epsilon = 1e-9);
        assert_approx_eq!(f64, unitcell[1], 0.1736482, epsilon = 1e-6);
        assert_approx_eq!(f64, unitcell[2], 4.863, epsilon = 1e-9);
        assert_approx_eq!(f64, unitcell[3], 0.3420201, epsilon = 1e-6);
        assert_approx_eq!(f64, unitcell[4], -0.5, epsilon = 1e-9);
        assert_approx_eq!(f64, unitcell[5], 2.976, epsilon = 1e-9);

        let back = CellMatrix::from_dcd_unitcell(unitcell).unwrap();
        assert_cells_eq(&back, &cell, 1e-9);
    }

    #[test]
    fn dcd_unitcell_degrees() {
        let unitcell = [5.297, 80.0, 4.863, 70.0, 120.0, 2.976];
        let cell = CellMatrix::from_dcd_unitcell(unitcell).unwrap();

        let expected = CellMatrix::from_lengths_angles(
            [5.297, 4.863, 2.976].into(),
            [120.0, 70.0, 80.0].into(),
        );
        assert_cells_eq(&cell, &expected, 1e-12);
    }

    #[test]
    fn dcd_unitcell_invalid() {
        let unitcell = [0.0, 0.0, 12.0, 0.0, 0.0, 13.0];
        match CellMatrix::from_dcd_unitcell(unitcell) {
            Err(CellError::InvalidUnitCell(x)) => assert_eq!(x, unitcell),
            Ok(_) => panic!("Conversion should have failed."),
            Err(e) => panic!("Incorrect error type `{:?}` was returned.", e),
        }
    }
}
