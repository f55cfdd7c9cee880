// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Implementation of the `DcdWriter` structure.

use ndarray::ArrayView3;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use super::{DcdHeader, NSET_OFFSET, TOTAL_SNAPSHOTS_OFFSET};
use crate::auxiliary::DCD_MAX_COORDINATE;
use crate::config::VisConfig;
use crate::errors::{WriteDcdError, WriteTrajError};
use crate::io::fortran::{self, ByteOrder};
use crate::io::traj_write::{PrivateTrajWrite, TrajWrite};
use crate::structures::cell::CellMatrix;
use crate::system::general::ChainSystem;

/// Writer of CHARMM dcd trajectories.
///
/// The header is written when the writer is created. Every written frame updates the frame
/// count stored in the header so the file is a complete dcd file after each frame.
/// If writing a frame fails, the file is truncated back to the last complete frame.
///
/// ## Example
/// ```no_run
/// use dcd_tools::prelude::*;
///
/// let mut system = ChainSystem::new(10, 4)
///     .unwrap()
///     .with_cell(CellMatrix::orthorhombic([11.0, 12.0, 13.0]));
///
/// let mut writer = DcdWriter::new(&system, "chain.dcd").unwrap();
/// for _ in 0..10 {
///     system.get_positions_mut().map_inplace(|x| *x += 0.1);
///     writer.write_frame(&system).unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct DcdWriter {
    writer: BufWriter<File>,
    n_atoms: usize,
    unit_cell: bool,
    byte_order: ByteOrder,
    n_frames: usize,
    /// Set if a failed frame could not be removed from the file.
    failed: bool,
}

impl DcdWriter {
    /// Create the dcd file and write its header for the system.
    ///
    /// Parameters of the header are taken from the configuration of the system.
    ///
    /// ## Returns
    /// `DcdWriter` or `WriteDcdError` if the configuration is invalid,
    /// the system is too large, or the file could not be created.
    pub fn new(system: &ChainSystem, filename: impl AsRef<Path>) -> Result<Self, WriteDcdError> {
        DcdWriter::create(filename, system.get_n_atoms(), system.get_config())
    }

    /// Create the dcd file and write its header for `n_atoms` atoms
    /// without constructing a `ChainSystem`.
    ///
    /// ## Returns
    /// `DcdWriter` or `WriteDcdError` if the configuration is invalid,
    /// `n_atoms` does not fit into the header, or the file could not be created.
    pub fn create(
        filename: impl AsRef<Path>,
        n_atoms: usize,
        config: &VisConfig,
    ) -> Result<Self, WriteDcdError> {
        config
            .validate()
            .map_err(|e| WriteDcdError::InvalidConfig(e.to_string()))?;

        // every coordinate record must also fit into a 32-bit record marker
        if n_atoms > i32::MAX as usize || n_atoms > (u32::MAX / 4) as usize {
            return Err(WriteDcdError::TooManyAtoms(n_atoms));
        }

        let header = DcdHeader::from_config(config, n_atoms);

        let file = File::create(&filename)
            .map_err(|_| WriteDcdError::CouldNotCreate(Box::from(filename.as_ref())))?;
        let mut writer = BufWriter::new(file);

        header
            .write(&mut writer)
            .map_err(|_| WriteDcdError::CouldNotWrite)?;
        writer.flush().map_err(|_| WriteDcdError::CouldNotWrite)?;

        Ok(DcdWriter {
            writer,
            n_atoms,
            unit_cell: header.has_unit_cell(),
            byte_order: header.byte_order(),
            n_frames: 0,
            failed: false,
        })
    }

    /// Write the current bead positions and cell of the system as a new frame.
    ///
    /// ## Returns
    /// `Ok` if the frame has been written. `WriteDcdError` otherwise.
    /// Nothing is written if the frame is rejected.
    pub fn write_frame(&mut self, system: &ChainSystem) -> Result<(), WriteDcdError> {
        if system.get_n_atoms() != self.n_atoms {
            return Err(WriteDcdError::AtomCountMismatch(
                system.get_n_atoms(),
                self.n_atoms,
            ));
        }

        self.write_positions(system.get_positions(), system.get_cell())
    }

    /// Write a frame from an array of positions of shape `[nchains, nbeads, 3]` and an optional cell.
    pub(crate) fn write_positions(
        &mut self,
        positions: ArrayView3<f64>,
        cell: Option<&CellMatrix>,
    ) -> Result<(), WriteDcdError> {
        if self.failed {
            return Err(WriteDcdError::WriterFailed);
        }

        let n_atoms = positions.len() / 3;
        if n_atoms != self.n_atoms || positions.shape()[2] != 3 {
            return Err(WriteDcdError::AtomCountMismatch(n_atoms, self.n_atoms));
        }

        if self.n_frames >= i32::MAX as usize {
            return Err(WriteDcdError::TooManyFrames(self.n_frames));
        }

        let unitcell = if self.unit_cell {
            let cell = cell.ok_or(WriteDcdError::MissingCell)?;
            cell.validate().map_err(WriteDcdError::InvalidCell)?;
            Some(cell.to_dcd_unitcell())
        } else {
            None
        };

        let order = self.byte_order;
        let mut coordinates = [
            Vec::with_capacity(4 * n_atoms),
            Vec::with_capacity(4 * n_atoms),
            Vec::with_capacity(4 * n_atoms),
        ];

        for (index, bead) in positions.rows().into_iter().enumerate() {
            for (dim, &value) in bead.iter().enumerate() {
                if !value.is_finite() || value.abs() > DCD_MAX_COORDINATE {
                    return Err(WriteDcdError::CoordinateOutOfRange(value, index + 1));
                }

                coordinates[dim].extend_from_slice(&order.f32_bytes(value as f32));
            }
        }

        let frame_start = self
            .writer
            .stream_position()
            .map_err(|_| WriteDcdError::CouldNotWrite)?;

        let written = match self.write_records(unitcell, &coordinates) {
            Ok(()) => {
                self.n_frames += 1;
                let updated = self.update_header();
                if updated.is_err() {
                    self.n_frames -= 1;
                }
                updated
            }
            Err(e) => Err(e),
        };

        if written.is_err() {
            if self.rollback(frame_start).is_err() {
                self.failed = true;
            }
            return Err(WriteDcdError::CouldNotWrite);
        }

        Ok(())
    }

    /// Append the records of a single frame.
    fn write_records(
        &mut self,
        unitcell: Option<[f64; 6]>,
        coordinates: &[Vec<u8>; 3],
    ) -> std::io::Result<()> {
        let order = self.byte_order;

        if let Some(unitcell) = unitcell {
            let bytes: Vec<u8> = unitcell
                .iter()
                .flat_map(|&x| order.f64_bytes(x))
                .collect();
            fortran::write_record(&mut self.writer, &bytes, order)?;
        }

        for dim in coordinates {
            fortran::write_record(&mut self.writer, dim, order)?;
        }

        Ok(())
    }

    /// Rewrite the number of frames stored in the header and return to the end of the file.
    fn update_header(&mut self) -> std::io::Result<()> {
        let n_frames = i32::try_from(self.n_frames)
            .map_err(|_| std::io::Error::from(std::io::ErrorKind::InvalidInput))?;
        let n_frames = self.byte_order.i32_bytes(n_frames);

        self.writer.seek(SeekFrom::Start(NSET_OFFSET))?;
        self.writer.write_all(&n_frames)?;
        self.writer.seek(SeekFrom::Start(TOTAL_SNAPSHOTS_OFFSET))?;
        self.writer.write_all(&n_frames)?;
        self.writer.seek(SeekFrom::End(0))?;
        self.writer.flush()
    }

    /// Remove everything written after `frame_start` and restore the frame count in the header.
    fn rollback(&mut self, frame_start: u64) -> std::io::Result<()> {
        // data still waiting in the buffer belongs to the failed frame and is discarded
        let file = self.writer.get_ref().try_clone()?;
        let (_, _) = std::mem::replace(&mut self.writer, BufWriter::new(file)).into_parts();

        self.writer.get_ref().set_len(frame_start)?;
        self.update_header()
    }

    /// Flush the buffered data into the file.
    pub fn flush(&mut self) -> Result<(), WriteDcdError> {
        self.writer.flush().map_err(|_| WriteDcdError::CouldNotWrite)
    }

    /// Get the number of frames written so far.
    #[inline(always)]
    pub fn get_n_frames(&self) -> usize {
        self.n_frames
    }

    /// Get the number of atoms in every frame.
    #[inline(always)]
    pub fn get_n_atoms(&self) -> usize {
        self.n_atoms
    }
}

impl Drop for DcdWriter {
    fn drop(&mut self) {
        if self.writer.flush().is_err() {
            eprintln!("warning: could not flush the dcd file");
        }
    }
}

impl TrajWrite for DcdWriter {}

impl PrivateTrajWrite for DcdWriter {
    fn new(system: &ChainSystem, filename: impl AsRef<Path>) -> Result<Self, WriteTrajError> {
        DcdWriter::new(system, filename).map_err(WriteTrajError::from)
    }

    fn write_frame(&mut self, system: &ChainSystem) -> Result<(), WriteTrajError> {
        DcdWriter::write_frame(self, system).map_err(WriteTrajError::from)
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
