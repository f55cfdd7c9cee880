// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Implementation of the `DcdReader` structure iterating over frames of a dcd file.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;

use super::{record_error, DcdHeader, DCD_UNIT_CELL_RECORD_LENGTH};
use crate::errors::ReadDcdError;
use crate::io::fortran::{self, Marker};
use crate::progress::{ProgressPrinter, ProgressStatus};
use crate::structures::{cell::CellMatrix, vector3d::Vector3D};

/// A single frame read from a dcd file.
#[derive(Debug, Clone, PartialEq)]
pub struct DcdFrame {
    /// Raw unit cell record `[A, cos(gamma), B, cos(beta), cos(alpha), C]` if present.
    pub unitcell: Option<[f64; 6]>,
    /// Cell matrix constructed from the unit cell record.
    pub cell: Option<CellMatrix>,
    /// Positions of all atoms in the order in which they are stored in the file.
    pub positions: Vec<Vector3D>,
}

/// Iterator over frames of a dcd file.
///
/// ## Example
/// Printing the header of a dcd file and the position of the first atom in every tenth frame.
/// ```no_run
/// use dcd_tools::prelude::*;
///
/// let reader = match DcdReader::open("chain.dcd") {
///     Ok(x) => x,
///     Err(e) => {
///         eprintln!("{}", e);
///         return;
///     }
/// };
///
/// print!("{}", reader.get_header());
///
/// for frame in reader.with_step(10).unwrap() {
///     let frame = frame.unwrap();
///     println!("{:?}", frame.positions[0]);
/// }
/// ```
pub struct DcdReader {
    file: BufReader<File>,
    header: DcdHeader,
    /// Number of frames skipped after each read frame.
    skip: usize,
    /// Index of the next frame in the file.
    file_frame: usize,
    /// Number of frames yielded so far.
    frame_number: usize,
    progress_printer: Option<ProgressPrinter>,
}

impl DcdReader {
    /// Open a dcd file and read its header.
    ///
    /// ## Returns
    /// `DcdReader` positioned at the first frame or `ReadDcdError` if the file does not exist
    /// or its header is invalid.
    pub fn open(filename: impl AsRef<Path>) -> Result<Self, ReadDcdError> {
        let file = File::open(filename.as_ref())
            .map_err(|_| ReadDcdError::FileNotFound(Box::from(filename.as_ref())))?;
        let mut file = BufReader::new(file);

        let header = DcdHeader::read(&mut file)?;

        Ok(DcdReader {
            file,
            header,
            skip: 0,
            file_frame: 0,
            frame_number: 0,
            progress_printer: None,
        })
    }

    /// Get the header of the dcd file.
    #[inline(always)]
    pub fn get_header(&self) -> &DcdHeader {
        &self.header
    }

    /// Only read every `step`th frame of the file. Frames in between are skipped without being read.
    ///
    /// ## Returns
    /// `DcdReader` or `ReadDcdError::InvalidStep` if `step` is zero.
    pub fn with_step(mut self, step: usize) -> Result<Self, ReadDcdError> {
        if step == 0 {
            return Err(ReadDcdError::InvalidStep(step));
        }

        self.skip = step - 1;
        Ok(self)
    }

    /// Print progress of the reading using the provided `ProgressPrinter`.
    pub fn print_progress(mut self, printer: ProgressPrinter) -> Self {
        self.progress_printer = Some(printer);
        self
    }

    /// Read the next frame of the file.
    /// Returns `None` if the file ends exactly at a frame boundary.
    fn read_frame(&mut self) -> Option<Result<DcdFrame, ReadDcdError>> {
        let order = self.header.byte_order();

        let first = match fortran::read_marker(&mut self.file, order) {
            Ok(Marker::Eof) => return None,
            Ok(Marker::Length(x)) => x,
            Err(e) => return Some(Err(record_error(e))),
        };

        Some(self.read_frame_body(first))
    }

    /// Read the rest of a frame whose first record marker has the value `first`.
    fn read_frame_body(&mut self, first: u32) -> Result<DcdFrame, ReadDcdError> {
        let order = self.header.byte_order();
        let n_atoms = self.header.n_atoms();
        let coordinate_length = n_atoms
            .checked_mul(4)
            .and_then(|x| u32::try_from(x).ok())
            .ok_or(ReadDcdError::InvalidAtomCount(
                i32::try_from(n_atoms).unwrap_or(i32::MAX),
            ))?;

        let (unitcell, cell, x_length) = if self.header.has_unit_cell() {
            if first != DCD_UNIT_CELL_RECORD_LENGTH {
                return Err(ReadDcdError::UnexpectedRecordLength(
                    first,
                    DCD_UNIT_CELL_RECORD_LENGTH,
                ));
            }

            let payload = fortran::read_payload(&mut self.file, first, order).map_err(record_error)?;
            let mut unitcell = [0.0; 6];
            for (value, bytes) in unitcell.iter_mut().zip(payload.chunks_exact(8)) {
                let mut array = [0u8; 8];
                array.copy_from_slice(bytes);
                *value = order.read_f64(array);
            }

            let cell = CellMatrix::from_dcd_unitcell(unitcell).map_err(ReadDcdError::InvalidCell)?;

            let x_length = match fortran::read_marker(&mut self.file, order).map_err(record_error)? {
                Marker::Eof => return Err(ReadDcdError::UnexpectedEof),
                Marker::Length(x) => x,
            };

            (Some(unitcell), Some(cell), x_length)
        } else {
            (None, None, first)
        };

        let mut coordinates = Vec::with_capacity(3);
        for dim in 0..3 {
            let length = if dim == 0 {
                x_length
            } else {
                match fortran::read_marker(&mut self.file, order).map_err(record_error)? {
                    Marker::Eof => return Err(ReadDcdError::UnexpectedEof),
                    Marker::Length(x) => x,
                }
            };

            if length != coordinate_length {
                return Err(ReadDcdError::UnexpectedRecordLength(
                    length,
                    coordinate_length,
                ));
            }

            let payload = fortran::read_payload(&mut self.file, length, order).map_err(record_error)?;
            let values: Vec<f32> = payload
                .chunks_exact(4)
                .map(|x| order.read_f32([x[0], x[1], x[2], x[3]]))
                .collect();
            coordinates.push(values);
        }

        let positions = coordinates[0]
            .iter()
            .zip(coordinates[1].iter())
            .zip(coordinates[2].iter())
            .map(|((&x, &y), &z)| Vector3D::new(x as f64, y as f64, z as f64))
            .collect();

        Ok(DcdFrame {
            unitcell,
            cell,
            positions,
        })
    }

    /// Skip over frames without reading them.
    fn skip_frames(&mut self, n_frames: usize) -> Result<(), ReadDcdError> {
        if n_frames == 0 {
            return Ok(());
        }

        let offset = self.header.frame_size() * n_frames as u64;
        self.file
            .seek(SeekFrom::Current(offset as i64))
            .map_err(|_| ReadDcdError::CouldNotRead)?;
        self.file_frame += n_frames;

        Ok(())
    }

    /// Simulation step of the frame with the given index in the file.
    fn simulation_step(&self, file_frame: usize) -> i64 {
        self.header.first_step() as i64 + file_frame as i64 * self.header.save_frequency() as i64
    }

    /// Update the status of the progress printer based on the result of reading.
    fn progress_set(&mut self, result: &Option<Result<DcdFrame, ReadDcdError>>) {
        if let Some(printer) = self.progress_printer.as_mut() {
            match result {
                None => printer.set_status(ProgressStatus::Completed),
                Some(Err(_)) => printer.set_status(ProgressStatus::Failed),
                Some(Ok(_)) => (),
            }
        }
    }

    /// Print the current progress of the reading.
    fn progress_print(&mut self, file_frame: usize) {
        let step = self.simulation_step(file_frame);
        let frame_number = self.frame_number;

        if let Some(printer) = self.progress_printer.as_mut() {
            printer.print(frame_number, step)
        }
    }
}

/// Iterate the `DcdReader`.
impl Iterator for DcdReader {
    type Item = Result<DcdFrame, ReadDcdError>;

    /// Read the next frame in the dcd file.
    ///
    /// ## Returns
    /// - `Some(Ok(DcdFrame))` if the frame has been succesfully read.
    /// - `Some(Err(ReadDcdError))` if the frame could not be read.
    /// - `None` if the end of the dcd file has been reached.
    fn next(&mut self) -> Option<Self::Item> {
        let file_frame = self.file_frame;
        let result = self.read_frame();

        if let Some(Ok(_)) = result {
            self.file_frame += 1;
            if let Err(e) = self.skip_frames(self.skip) {
                return Some(Err(e));
            }
        }

        self.progress_set(&result);
        self.progress_print(file_frame);

        if result.is_some() {
            self.frame_number += 1;
        }

        result
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisConfig;
    use crate::errors::CellError;
    use crate::io::dcd_io::DcdWriter;
    use crate::io::fortran::ByteOrder;
    use crate::system::general::ChainSystem;
    use crate::test_utilities::utilities::{create_named_path, driver_positions};
    use float_cmp::assert_approx_eq;
    use rand::Rng;
    use std::fs::OpenOptions;
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn driver_system() -> ChainSystem {
        ChainSystem::from_positions(driver_positions(10, 4))
            .unwrap()
            .with_cell(CellMatrix::orthorhombic([11.0, 12.0, 13.0]))
    }

    /// Write `n_frames` frames, moving every bead by 1 along x after each frame.
    fn write_shifted(system: &mut ChainSystem, path: &Path, n_frames: usize) {
        let mut writer = DcdWriter::new(system, path).unwrap();
        for _ in 0..n_frames {
            writer.write_frame(system).unwrap();
            for mut bead in system.get_positions_mut().rows_mut() {
                bead[0] += 1.0;
            }
        }
    }

    #[test]
    fn read_driver_frame() {
        let system = driver_system();
        let (_file, path) = create_named_path(".dcd");

        let mut writer = DcdWriter::new(&system, &path).unwrap();
        writer.write_frame(&system).unwrap();
        drop(writer);

        let mut reader = DcdReader::open(&path).unwrap();
        let header = reader.get_header();
        assert_eq!(header.n_frames(), 1);
        assert_eq!(header.total_snapshots(), 1);
        assert_eq!(header.n_atoms(), 40);
        assert_eq!(header.save_frequency(), 1);
        assert_eq!(header.first_step(), 0);
        assert_eq!(header.charmm_version(), 24);
        assert!(header.has_unit_cell());
        assert_eq!(header.byte_order(), ByteOrder::Native.resolve());
        assert_eq!(
            header.titles()[0],
            "Linear chain molecules written by dcd_tools"
        );

        let frame = reader.next().unwrap().unwrap();
        assert_eq!(frame.unitcell, Some([11.0, 0.0, 12.0, 0.0, 0.0, 13.0]));
        assert_eq!(
            frame.cell,
            Some(CellMatrix::orthorhombic([11.0, 12.0, 13.0]))
        );
        assert_eq!(frame.positions.len(), 40);
        assert_eq!(frame.positions[0], Vector3D::new(1.0, 2.0, 3.0));
        assert_eq!(frame.positions[6], Vector3D::new(121.0, 122.0, 123.0));
        assert_eq!(frame.positions[39], Vector3D::new(931.0, 932.0, 933.0));

        assert!(reader.next().is_none());
    }

    #[test]
    fn read_random_frames() {
        let mut rng = rand::thread_rng();
        let mut system = ChainSystem::new(7, 5).unwrap().with_config(
            VisConfig::default()
                .with_byte_order(ByteOrder::Big)
                .with_save_frequency(250),
        );
        let (_file, path) = create_named_path(".dcd");

        let mut writer = DcdWriter::new(&system, &path).unwrap();
        let mut expected = Vec::new();
        for _ in 0..6 {
            system
                .get_positions_mut()
                .map_inplace(|x| *x = rng.gen_range(-50.0..50.0));
            let lengths = [
                rng.gen_range(5.0..20.0),
                rng.gen_range(5.0..20.0),
                rng.gen_range(5.0..20.0),
            ];
            system.set_cell(CellMatrix::orthorhombic(lengths));

            writer.write_frame(&system).unwrap();
            expected.push((system.get_positions().to_owned(), lengths));
        }
        drop(writer);

        let reader = DcdReader::open(&path).unwrap();
        assert_eq!(reader.get_header().byte_order(), ByteOrder::Big);
        assert_eq!(reader.get_header().n_frames(), 6);

        let mut n_read = 0;
        for (frame, (positions, lengths)) in reader.zip(expected.iter()) {
            let frame = frame.unwrap();

            for (read, written) in frame.positions.iter().zip(positions.rows()) {
                assert_approx_eq!(f64, read.x, written[0] as f32 as f64);
                assert_approx_eq!(f64, read.y, written[1] as f32 as f64);
                assert_approx_eq!(f64, read.z, written[2] as f32 as f64);
            }

            let unitcell = frame.unitcell.unwrap();
            assert_approx_eq!(f64, unitcell[0], lengths[0]);
            assert_approx_eq!(f64, unitcell[2], lengths[1]);
            assert_approx_eq!(f64, unitcell[5], lengths[2]);
            n_read += 1;
        }

        assert_eq!(n_read, 6);
    }

    #[test]
    fn read_no_unit_cell() {
        let mut system = ChainSystem::from_positions(driver_positions(3, 2))
            .unwrap()
            .with_config(VisConfig::default().with_unit_cell(false));
        let (_file, path) = create_named_path(".dcd");
        write_shifted(&mut system, &path, 3);

        let frames: Vec<DcdFrame> = DcdReader::open(&path)
            .unwrap()
            .map(|frame| frame.unwrap())
            .collect();

        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert!(frame.unitcell.is_none());
            assert!(frame.cell.is_none());
            assert_approx_eq!(f64, frame.positions[0].x, 1.0 + i as f64);
        }
    }

    #[test]
    fn with_step() {
        let mut system = driver_system();
        let (_file, path) = create_named_path(".dcd");
        write_shifted(&mut system, &path, 10);

        let xs: Vec<f64> = DcdReader::open(&path)
            .unwrap()
            .with_step(3)
            .unwrap()
            .map(|frame| frame.unwrap().positions[0].x)
            .collect();

        assert_eq!(xs, vec![1.0, 4.0, 7.0, 10.0]);
    }

    #[test]
    fn with_step_zero() {
        let system = driver_system();
        let (_file, path) = create_named_path(".dcd");
        DcdWriter::new(&system, &path).unwrap();

        assert!(matches!(
            DcdReader::open(&path).unwrap().with_step(0),
            Err(ReadDcdError::InvalidStep(0))
        ));
    }

    #[test]
    fn truncated_frame() {
        let mut system = driver_system();
        let (_file, path) = create_named_path(".dcd");
        write_shifted(&mut system, &path, 2);

        let length = std::fs::metadata(&path).unwrap().len();
        OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(length - 100)
            .unwrap();

        let mut reader = DcdReader::open(&path).unwrap();
        assert!(reader.next().unwrap().is_ok());
        assert_eq!(reader.next(), Some(Err(ReadDcdError::UnexpectedEof)));
    }

    #[test]
    fn degenerate_unit_cell() {
        let system = driver_system();
        let (_file, path) = create_named_path(".dcd");
        DcdWriter::new(&system, &path)
            .unwrap()
            .write_frame(&system)
            .unwrap();

        // set length A of the unit cell of the first frame to zero
        let mut bytes = std::fs::read(&path).unwrap();
        let first_frame = 92 + 172 + 12;
        bytes[first_frame + 4..first_frame + 12].copy_from_slice(&0.0f64.to_ne_bytes());
        std::fs::write(&path, bytes).unwrap();

        let mut reader = DcdReader::open(&path).unwrap();
        match reader.next() {
            Some(Err(ReadDcdError::InvalidCell(CellError::InvalidUnitCell(unitcell)))) => {
                assert_eq!(unitcell, [0.0, 0.0, 12.0, 0.0, 0.0, 13.0])
            }
            Some(Ok(_)) => panic!("Reading should have failed."),
            Some(Err(e)) => panic!("Incorrect error type `{:?}` was returned.", e),
            None => panic!("Frame is missing."),
        }
    }

    #[test]
    fn oversized_atom_count() {
        let order = ByteOrder::Native;
        let (_file, path) = create_named_path(".dcd");

        let mut header = DcdHeader::from_config(&VisConfig::default().with_unit_cell(false), 0);
        header.n_atoms = 1 << 30;

        // header claiming 2^30 atoms followed by three empty coordinate records
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        for _ in 0..3 {
            fortran::write_record(&mut bytes, &[], order).unwrap();
        }
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            DcdReader::open(&path),
            Err(ReadDcdError::InvalidAtomCount(n)) if n == 1 << 30
        ));
    }

    #[test]
    fn open_nonexistent() {
        match DcdReader::open("Xhfguiaghqueiowhd/nonexistent.dcd") {
            Err(ReadDcdError::FileNotFound(path)) => assert_eq!(
                path,
                Box::from(Path::new("Xhfguiaghqueiowhd/nonexistent.dcd"))
            ),
            Ok(_) => panic!("Opening should have failed."),
            Err(e) => panic!("Incorrect error type `{:?}` was returned.", e),
        }
    }

    #[test]
    fn system_dcd_iter() {
        let mut system = driver_system();
        let (_file, path) = create_named_path(".dcd");
        write_shifted(&mut system, &path, 4);

        let mut target = ChainSystem::new(10, 4).unwrap();
        for frame in target.dcd_iter(&path).unwrap().collect::<Vec<_>>() {
            target.update_from_frame(&frame.unwrap()).unwrap();
        }

        assert_eq!(
            target.get_bead_position(9, 3).unwrap(),
            Vector3D::new(934.0, 932.0, 933.0)
        );
        assert_eq!(
            target.get_cell(),
            Some(&CellMatrix::orthorhombic([11.0, 12.0, 13.0]))
        );

        let other = ChainSystem::new(5, 4).unwrap();
        assert!(matches!(
            other.dcd_iter(&path),
            Err(ReadDcdError::AtomCountMismatch(40, 20))
        ));
    }

    #[test]
    fn print_progress() {
        let mut system = driver_system()
            .with_config(VisConfig::default().with_first_step(100).with_save_frequency(10));
        let (_file, path) = create_named_path(".dcd");
        write_shifted(&mut system, &path, 3);

        let output = NamedTempFile::new().unwrap();
        let printer = ProgressPrinter::new()
            .with_output(Box::from(output.reopen().unwrap()))
            .with_colored(false)
            .with_print_freq(1)
            .with_terminating("\n");

        let n_frames = DcdReader::open(&path)
            .unwrap()
            .print_progress(printer)
            .count();
        assert_eq!(n_frames, 3);

        let mut content = String::new();
        File::open(output.path())
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();

        let expected = format!(
            "[ RUNNING ]   Frame {:12} | Step {:12}\n\
             [ RUNNING ]   Frame {:12} | Step {:12}\n\
             [ RUNNING ]   Frame {:12} | Step {:12}\n\
             [COMPLETED]   Frame {:12} | Step {:12}\n\n",
            0, 100, 1, 110, 2, 120, 3, 130
        );
        assert_eq!(content, expected);
    }
}
