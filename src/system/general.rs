// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Implementation of the `ChainSystem` structure and methods for constructing it and accessing its properties.

use ndarray::{Array3, ArrayView3, ArrayViewMut3};

use crate::config::VisConfig;
use crate::errors::ChainSystemError;
use crate::io::traj_write::SystemWriters;
use crate::structures::{cell::CellMatrix, vector3d::Vector3D};

/// System of `nchains` linear chain molecules, each consisting of `nbeads` beads.
#[derive(Debug)]
pub struct ChainSystem {
    /// Positions of the beads. Shape `[nchains, nbeads, 3]`.
    positions: Array3<f64>,
    /// Simulation cell.
    cell: Option<CellMatrix>,
    /// Parameters of the written files.
    config: VisConfig,
    /// Trajectory writers associated with the system.
    writers: SystemWriters,
}

/// ## Methods for creating `ChainSystem` structures and accessing their properties.
impl ChainSystem {
    /// Create a new `ChainSystem` with all beads placed at the origin, no cell, and default configuration.
    ///
    /// ## Returns
    /// `ChainSystem` or `ChainSystemError::EmptySystem` if `nchains` or `nbeads` is zero.
    /// Returns `ChainSystemError::TooLarge` if the positions could not be addressed in memory.
    ///
    /// ## Example
    /// ```
    /// # use dcd_tools::prelude::*;
    /// #
    /// let system = ChainSystem::new(10, 4).unwrap();
    /// assert_eq!(system.get_n_atoms(), 40);
    /// ```
    pub fn new(nchains: usize, nbeads: usize) -> Result<Self, ChainSystemError> {
        if nchains == 0 || nbeads == 0 {
            return Err(ChainSystemError::EmptySystem(nchains, nbeads));
        }

        let n_bytes = nchains
            .checked_mul(nbeads)
            .and_then(|x| x.checked_mul(3 * std::mem::size_of::<f64>()));
        if !matches!(n_bytes, Some(x) if x <= isize::MAX as usize) {
            return Err(ChainSystemError::TooLarge(nchains, nbeads));
        }

        Ok(ChainSystem {
            positions: Array3::zeros((nchains, nbeads, 3)),
            cell: None,
            config: VisConfig::default(),
            writers: SystemWriters::default(),
        })
    }

    /// Create a new `ChainSystem` from an array of positions of shape `[nchains, nbeads, 3]`.
    pub fn from_positions(positions: Array3<f64>) -> Result<Self, ChainSystemError> {
        let shape = positions.shape();
        if shape[2] != 3 {
            return Err(ChainSystemError::ShapeMismatch(
                shape.to_vec(),
                vec![shape[0], shape[1], 3],
            ));
        }

        if shape[0] == 0 || shape[1] == 0 {
            return Err(ChainSystemError::EmptySystem(shape[0], shape[1]));
        }

        Ok(ChainSystem {
            positions,
            cell: None,
            config: VisConfig::default(),
            writers: SystemWriters::default(),
        })
    }

    /// Create new `ChainSystem` with specific configuration.
    pub fn with_config(mut self, config: VisConfig) -> Self {
        self.config = config;
        self
    }

    /// Create new `ChainSystem` with specific simulation cell.
    pub fn with_cell(mut self, cell: CellMatrix) -> Self {
        self.cell = Some(cell);
        self
    }

    /// Get the number of chains in the system.
    #[inline(always)]
    pub fn get_n_chains(&self) -> usize {
        self.positions.shape()[0]
    }

    /// Get the number of beads in each chain.
    #[inline(always)]
    pub fn get_n_beads(&self) -> usize {
        self.positions.shape()[1]
    }

    /// Get the total number of beads in the system.
    #[inline(always)]
    pub fn get_n_atoms(&self) -> usize {
        self.get_n_chains() * self.get_n_beads()
    }

    /// Get the 1-based index of a bead as used in psf and dcd files.
    #[inline(always)]
    pub fn bead_index(&self, chain: usize, bead: usize) -> usize {
        chain * self.get_n_beads() + bead + 1
    }

    /// Get immutable view of all bead positions.
    #[inline(always)]
    pub fn get_positions(&self) -> ArrayView3<f64> {
        self.positions.view()
    }

    /// Get mutable view of all bead positions.
    #[inline(always)]
    pub fn get_positions_mut(&mut self) -> ArrayViewMut3<f64> {
        self.positions.view_mut()
    }

    /// Replace positions of all beads.
    ///
    /// ## Returns
    /// `Ok` or `ChainSystemError::ShapeMismatch` if the shape of `positions` is not `[nchains, nbeads, 3]`.
    /// In case of an error, the system is not changed.
    pub fn set_positions(&mut self, positions: ArrayView3<f64>) -> Result<(), ChainSystemError> {
        if positions.shape() != self.positions.shape() {
            return Err(ChainSystemError::ShapeMismatch(
                positions.shape().to_vec(),
                self.positions.shape().to_vec(),
            ));
        }

        self.positions.assign(&positions);
        Ok(())
    }

    /// Replace positions of all beads using a flat row-major buffer `[x1, y1, z1, x2, y2, z2, ...]`.
    ///
    /// ## Returns
    /// `Ok` or `ChainSystemError::ShapeMismatch` if the length of the buffer is not `3 * natoms`.
    pub fn set_positions_flat(&mut self, positions: &[f64]) -> Result<(), ChainSystemError> {
        let view = ArrayView3::from_shape(
            (self.get_n_chains(), self.get_n_beads(), 3),
            positions,
        )
        .map_err(|_| {
            ChainSystemError::ShapeMismatch(
                vec![positions.len()],
                self.positions.shape().to_vec(),
            )
        })?;

        self.positions.assign(&view);
        Ok(())
    }

    /// Get position of a specific bead. Returns `None` if the bead does not exist.
    pub fn get_bead_position(&self, chain: usize, bead: usize) -> Option<Vector3D> {
        if chain >= self.get_n_chains() || bead >= self.get_n_beads() {
            return None;
        }

        Some(Vector3D::new(
            self.positions[[chain, bead, 0]],
            self.positions[[chain, bead, 1]],
            self.positions[[chain, bead, 2]],
        ))
    }

    /// Set position of a specific bead.
    pub fn set_bead_position(
        &mut self,
        chain: usize,
        bead: usize,
        position: Vector3D,
    ) -> Result<(), ChainSystemError> {
        if chain >= self.get_n_chains() || bead >= self.get_n_beads() {
            return Err(ChainSystemError::BeadNotFound(chain, bead));
        }

        self.positions[[chain, bead, 0]] = position.x;
        self.positions[[chain, bead, 1]] = position.y;
        self.positions[[chain, bead, 2]] = position.z;
        Ok(())
    }

    /// Iterate over positions of all beads in the order in which they are written into files.
    pub fn beads_iter(&self) -> impl Iterator<Item = Vector3D> + '_ {
        self.positions
            .rows()
            .into_iter()
            .map(|bead| Vector3D::new(bead[0], bead[1], bead[2]))
    }

    /// Get the simulation cell of the system.
    #[inline(always)]
    pub fn get_cell(&self) -> Option<&CellMatrix> {
        self.cell.as_ref()
    }

    /// Set the simulation cell of the system.
    #[inline(always)]
    pub fn set_cell(&mut self, cell: CellMatrix) {
        self.cell = Some(cell);
    }

    /// Remove the simulation cell from the system.
    #[inline(always)]
    pub fn reset_cell(&mut self) {
        self.cell = None;
    }

    /// Get the configuration of the written files.
    #[inline(always)]
    pub fn get_config(&self) -> &VisConfig {
        &self.config
    }

    /// Replace the configuration of the written files.
    ///
    /// ## Notes
    /// - Trajectory writers that are already associated with the system keep the configuration
    ///   they were created with.
    #[inline(always)]
    pub fn set_config(&mut self, config: VisConfig) {
        self.config = config;
    }

    /// Get the number of trajectory writers associated with the system.
    #[inline(always)]
    pub fn get_n_writers(&self) -> usize {
        self.writers.len()
    }

    #[inline(always)]
    pub(crate) fn get_writers(&self) -> &SystemWriters {
        &self.writers
    }

    #[inline(always)]
    pub(crate) fn get_writers_mut(&mut self) -> &mut SystemWriters {
        &mut self.writers
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
