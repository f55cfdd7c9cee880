// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Implementation of functions for reading and writing CHARMM dcd files.
//!
//! A dcd file is a sequence of Fortran unformatted records:
//! 1. `"CORD"` followed by 20 control integers (`ICNTRL`),
//! 2. the title block (number of 80-character lines followed by the lines),
//! 3. the number of atoms,
//! 4. for every frame, an optional unit cell record (6 doubles) followed by
//!    three records with all x, all y, and all z coordinates in single precision.

pub mod reader;
pub mod writer;

pub use reader::{DcdFrame, DcdReader};
pub use writer::DcdWriter;

use getset::{CopyGetters, Getters};
use std::fmt::Display;
use std::io::{Read, Write};
use std::path::Path;

use crate::auxiliary::{
    fixed_width_bytes, DCD_CHARMM_VERSION, DCD_HEADER_RECORD_LENGTH, DCD_MAGIC, DCD_TITLE_LENGTH,
};
use crate::config::VisConfig;
use crate::errors::ReadDcdError;
use crate::io::fortran::{self, ByteOrder, Marker, RecordError};
use crate::system::general::ChainSystem;

/// Byte offset of `ICNTRL[0]` (number of frames) in a dcd file.
pub(crate) const NSET_OFFSET: u64 = 8;
/// Byte offset of `ICNTRL[3]` (total number of snapshots) in a dcd file.
pub(crate) const TOTAL_SNAPSHOTS_OFFSET: u64 = 20;

/// Indices into the `ICNTRL` array.
const ICNTRL_NSET: usize = 0;
const ICNTRL_ISTART: usize = 1;
const ICNTRL_NSAVC: usize = 2;
const ICNTRL_TOTAL: usize = 3;
const ICNTRL_NAMNF: usize = 8;
const ICNTRL_DELTA: usize = 9;
const ICNTRL_UNIT_CELL: usize = 10;
const ICNTRL_4D: usize = 11;
const ICNTRL_VERSION: usize = 19;

/// Length of the unit cell record.
pub(crate) const DCD_UNIT_CELL_RECORD_LENGTH: u32 = 48;

/// Information stored in the header of a dcd file.
#[derive(Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct DcdHeader {
    /// Number of frames reported in the file (`NSET`).
    #[getset(get_copy = "pub")]
    n_frames: usize,
    /// Simulation step of the first frame (`ISTART`).
    #[getset(get_copy = "pub")]
    first_step: i32,
    /// Number of simulation steps between two frames (`NSAVC`).
    #[getset(get_copy = "pub")]
    save_frequency: i32,
    /// Total number of snapshots reported in the file.
    #[getset(get_copy = "pub")]
    total_snapshots: i32,
    /// Length of a simulation step.
    #[getset(get_copy = "pub")]
    timestep: f32,
    /// Do the frames contain unit cell records?
    #[getset(get_copy = "pub")]
    has_unit_cell: bool,
    /// CHARMM version number multiplied by 10. Zero for X-PLOR files.
    #[getset(get_copy = "pub")]
    charmm_version: i32,
    /// Title lines with trailing whitespace removed.
    #[getset(get = "pub")]
    titles: Vec<String>,
    /// Number of atoms in every frame.
    #[getset(get_copy = "pub")]
    n_atoms: usize,
    /// Byte order of the file.
    #[getset(get_copy = "pub")]
    byte_order: ByteOrder,
}

impl DcdHeader {
    /// Construct the header of a newly created dcd file containing no frames.
    pub(crate) fn from_config(config: &VisConfig, n_atoms: usize) -> Self {
        DcdHeader {
            n_frames: 0,
            first_step: config.first_step,
            save_frequency: config.save_frequency,
            total_snapshots: 0,
            timestep: config.timestep,
            has_unit_cell: config.unit_cell,
            charmm_version: DCD_CHARMM_VERSION,
            titles: vec![
                config.title.clone(),
                format!("REMARKS Created by dcd_tools {}", crate::DCD_TOOLS_VERSION),
            ],
            n_atoms,
            byte_order: config.byte_order.resolve(),
        }
    }

    /// Write the three header records.
    pub(crate) fn write(&self, writer: &mut impl Write) -> std::io::Result<()> {
        let order = self.byte_order;

        let mut icntrl = [0i32; 20];
        icntrl[ICNTRL_NSET] = self.n_frames as i32;
        icntrl[ICNTRL_ISTART] = self.first_step;
        icntrl[ICNTRL_NSAVC] = self.save_frequency;
        icntrl[ICNTRL_TOTAL] = self.total_snapshots;
        icntrl[ICNTRL_UNIT_CELL] = self.has_unit_cell as i32;
        icntrl[ICNTRL_VERSION] = self.charmm_version;

        let mut control = Vec::with_capacity(DCD_HEADER_RECORD_LENGTH as usize);
        control.extend_from_slice(DCD_MAGIC);
        for (i, value) in icntrl.iter().enumerate() {
            if i == ICNTRL_DELTA {
                control.extend_from_slice(&order.f32_bytes(self.timestep));
            } else {
                control.extend_from_slice(&order.i32_bytes(*value));
            }
        }
        fortran::write_record(writer, &control, order)?;

        let mut titles = Vec::with_capacity(4 + self.titles.len() * DCD_TITLE_LENGTH);
        titles.extend_from_slice(&order.i32_bytes(self.titles.len() as i32));
        for title in self.titles.iter() {
            titles.extend_from_slice(&fixed_width_bytes(title, DCD_TITLE_LENGTH));
        }
        fortran::write_record(writer, &titles, order)?;

        fortran::write_record(writer, &order.i32_bytes(self.n_atoms as i32), order)
    }

    /// Read the header of a dcd file. The byte order is detected from the first record marker.
    pub(crate) fn read(reader: &mut impl Read) -> Result<Self, ReadDcdError> {
        // markers are read as little endian first; a big endian file shows the swapped value
        let (order, length) = match fortran::read_marker(reader, ByteOrder::Little)
            .map_err(record_error)?
        {
            Marker::Eof => return Err(ReadDcdError::UnexpectedEof),
            Marker::Length(DCD_HEADER_RECORD_LENGTH) => {
                (ByteOrder::Little, DCD_HEADER_RECORD_LENGTH)
            }
            Marker::Length(x) if x.swap_bytes() == DCD_HEADER_RECORD_LENGTH => {
                (ByteOrder::Big, DCD_HEADER_RECORD_LENGTH)
            }
            Marker::Length(x) => return Err(ReadDcdError::NotDcd(x)),
        };

        let control = fortran::read_payload(reader, length, order).map_err(record_error)?;
        if &control[0..4] != DCD_MAGIC {
            return Err(ReadDcdError::InvalidMagic(
                String::from_utf8_lossy(&control[0..4]).into_owned(),
            ));
        }

        let icntrl: Vec<[u8; 4]> = control[4..]
            .chunks_exact(4)
            .map(|x| [x[0], x[1], x[2], x[3]])
            .collect();
        let int = |i: usize| order.read_i32(icntrl[i]);

        if int(ICNTRL_NAMNF) != 0 {
            return Err(ReadDcdError::Unsupported(format!(
                "{} fixed atoms",
                int(ICNTRL_NAMNF)
            )));
        }

        let charmm_version = int(ICNTRL_VERSION);
        if charmm_version != 0 && int(ICNTRL_4D) != 0 {
            return Err(ReadDcdError::Unsupported(String::from(
                "four-dimensional coordinates",
            )));
        }

        // X-PLOR files store the timestep as a double spanning two control integers
        let (timestep, has_unit_cell) = if charmm_version == 0 {
            let mut delta = [0u8; 8];
            delta[0..4].copy_from_slice(&icntrl[ICNTRL_DELTA]);
            delta[4..8].copy_from_slice(&icntrl[ICNTRL_DELTA + 1]);
            (order.read_f64(delta) as f32, false)
        } else {
            (
                order.read_f32(icntrl[ICNTRL_DELTA]),
                int(ICNTRL_UNIT_CELL) != 0,
            )
        };

        let titles = DcdHeader::read_titles(reader, order)?;

        let natom = DcdHeader::read_sized_record(reader, order, 4)?;
        let n_atoms = order.read_i32([natom[0], natom[1], natom[2], natom[3]]);
        // every coordinate record must be addressable by a 32-bit record marker
        if n_atoms < 0 || u32::try_from(4 * n_atoms as i64).is_err() {
            return Err(ReadDcdError::InvalidAtomCount(n_atoms));
        }

        Ok(DcdHeader {
            n_frames: int(ICNTRL_NSET).max(0) as usize,
            first_step: int(ICNTRL_ISTART),
            save_frequency: int(ICNTRL_NSAVC),
            total_snapshots: int(ICNTRL_TOTAL),
            timestep,
            has_unit_cell,
            charmm_version,
            titles,
            n_atoms: n_atoms as usize,
            byte_order: order,
        })
    }

    /// Read the title block.
    fn read_titles(reader: &mut impl Read, order: ByteOrder) -> Result<Vec<String>, ReadDcdError> {
        let record = fortran::read_record(reader, order)
            .map_err(record_error)?
            .ok_or(ReadDcdError::UnexpectedEof)?;

        if record.len() < 4 {
            return Err(ReadDcdError::UnexpectedRecordLength(record.len() as u32, 4));
        }

        let n_titles = order.read_i32([record[0], record[1], record[2], record[3]]).max(0) as usize;
        let expected = 4 + n_titles * DCD_TITLE_LENGTH;
        if record.len() != expected {
            return Err(ReadDcdError::UnexpectedRecordLength(
                record.len() as u32,
                expected as u32,
            ));
        }

        Ok(record[4..]
            .chunks_exact(DCD_TITLE_LENGTH)
            .map(|line| {
                String::from_utf8_lossy(line)
                    .trim_end_matches(|c: char| c == ' ' || c == '\0')
                    .to_owned()
            })
            .collect())
    }

    /// Read a record that must have exactly `length` bytes.
    fn read_sized_record(
        reader: &mut impl Read,
        order: ByteOrder,
        length: u32,
    ) -> Result<Vec<u8>, ReadDcdError> {
        let record = fortran::read_record(reader, order)
            .map_err(record_error)?
            .ok_or(ReadDcdError::UnexpectedEof)?;

        if record.len() != length as usize {
            return Err(ReadDcdError::UnexpectedRecordLength(
                record.len() as u32,
                length,
            ));
        }

        Ok(record)
    }

    /// Size of the header in bytes.
    pub(crate) fn size(&self) -> u64 {
        (4 + DCD_HEADER_RECORD_LENGTH as u64 + 4)
            + (4 + 4 + (self.titles.len() * DCD_TITLE_LENGTH) as u64 + 4)
            + (4 + 4 + 4)
    }

    /// Size of a single frame in bytes.
    pub(crate) fn frame_size(&self) -> u64 {
        let cell = if self.has_unit_cell {
            4 + DCD_UNIT_CELL_RECORD_LENGTH as u64 + 4
        } else {
            0
        };

        cell + 3 * (4 + 4 * self.n_atoms as u64 + 4)
    }
}

impl Display for DcdHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Number of snapshots reported in dcd file : {}", self.n_frames)?;
        writeln!(f, "Number of timesteps between snapshots    : {}", self.save_frequency)?;
        writeln!(f, "Total number of snapshots in dcd file    : {}", self.total_snapshots)?;
        writeln!(
            f,
            "DCD in format for Charmm version number  : {}",
            self.charmm_version as f64 / 10.0
        )?;
        writeln!(f, "Number of atoms                          : {}", self.n_atoms)?;
        if self.has_unit_cell {
            writeln!(f, "Header reports presence of unit cell information")?;
        }

        Ok(())
    }
}

/// Convert an error from the record layer into a dcd reading error.
pub(crate) fn record_error(e: RecordError) -> ReadDcdError {
    match e {
        RecordError::Truncated => ReadDcdError::UnexpectedEof,
        RecordError::SizeMismatch(leading, trailing) => {
            ReadDcdError::RecordSizeMismatch(leading, trailing)
        }
        RecordError::Io(_) => ReadDcdError::CouldNotRead,
    }
}

/// ## Methods for reading dcd files.
impl ChainSystem {
    /// Create a `DcdReader` structure which is an iterator over a dcd file.
    ///
    /// ## Returns
    /// `DcdReader` if the dcd file exists and contains the same number of atoms as the system.
    /// Else returns `ReadDcdError`.
    ///
    /// ## Example
    /// ```no_run
    /// # use dcd_tools::prelude::*;
    /// #
    /// let mut system = ChainSystem::new(10, 4).unwrap();
    ///
    /// for frame in system.dcd_iter("chain.dcd").unwrap() {
    ///     let frame = match frame {
    ///         Ok(x) => x,
    ///         Err(e) => {
    ///             eprintln!("{}", e);
    ///             return;
    ///         }
    ///     };
    ///
    ///     system.update_from_frame(&frame).unwrap();
    ///     println!("{:?}", system.get_bead_position(0, 0));
    /// }
    /// ```
    pub fn dcd_iter(&self, filename: impl AsRef<Path>) -> Result<DcdReader, ReadDcdError> {
        let reader = DcdReader::open(filename)?;

        if reader.get_header().n_atoms() != self.get_n_atoms() {
            return Err(ReadDcdError::AtomCountMismatch(
                reader.get_header().n_atoms(),
                self.get_n_atoms(),
            ));
        }

        Ok(reader)
    }

    /// Copy bead positions and the unit cell from a frame read from a dcd file.
    ///
    /// If the frame contains no unit cell, the cell of the system is left unchanged.
    ///
    /// ## Returns
    /// `Ok` or `ReadDcdError::AtomCountMismatch` if the frame contains a different number of atoms.
    /// In case of an error, the system is not changed.
    pub fn update_from_frame(&mut self, frame: &DcdFrame) -> Result<(), ReadDcdError> {
        if frame.positions.len() != self.get_n_atoms() {
            return Err(ReadDcdError::AtomCountMismatch(
                frame.positions.len(),
                self.get_n_atoms(),
            ));
        }

        for (mut bead, position) in self
            .get_positions_mut()
            .rows_mut()
            .into_iter()
            .zip(frame.positions.iter())
        {
            bead[0] = position.x;
            bead[1] = position.y;
            bead[2] = position.z;
        }

        if let Some(cell) = frame.cell {
            self.set_cell(cell);
        }

        Ok(())
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
