// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Traits and structures for writing trajectory files.

/**************************/
/*  WRITING TRAJECTORIES  */
/**************************/

use crate::files::FileType;
use crate::{errors::WriteTrajError, system::general::ChainSystem};
use hashbrown::HashMap;
use std::fmt::Debug;
use std::path::Path;

#[cfg(feature = "parallel")]
pub(crate) use multi_threaded::SystemWriters;
#[cfg(not(feature = "parallel"))]
pub(crate) use single_threaded::SystemWriters;

use super::dcd_io::DcdWriter;

/// ## Associating trajectory writers with ChainSystem.
impl ChainSystem {
    /// Initializes a file for trajectory writing and associates the resulting writer with `ChainSystem`.
    ///
    /// ## Parameters
    /// - `filename`: The path to the output file that should be opened.
    /// - `Writer`: A type implementing `TrajWrite`, determining the output format and behavior.
    ///
    /// ## Returns
    /// - `Ok` if the trajectory writer is successfully created and associated with the `ChainSystem`.
    /// - `WriteTrajError` if an error occurs, such as if a writer for the same file already exists.
    ///
    /// ## Examples
    /// To start writing trajectories, initialize a trajectory writer:
    /// ```no_run
    /// # use dcd_tools::prelude::*;
    /// #
    /// let mut system = ChainSystem::new(10, 4).unwrap()
    ///     .with_cell(CellMatrix::orthorhombic([11.0, 12.0, 13.0]));
    /// system.traj_writer_init::<DcdWriter>("chain.dcd").unwrap();
    /// ```
    ///
    /// Additional trajectory writers can be attached to the same system:
    /// ```no_run
    /// # use dcd_tools::prelude::*;
    /// # let mut system = ChainSystem::new(10, 4).unwrap();
    /// #
    /// system.traj_writer_init::<DcdWriter>("copy.dcd").unwrap();
    /// ```
    ///
    /// To write the current system state into each writer:
    /// ```no_run
    /// # use dcd_tools::prelude::*;
    /// # let mut system = ChainSystem::new(10, 4).unwrap();
    /// # system.traj_writer_init::<DcdWriter>("chain.dcd").unwrap();
    /// #
    /// system.traj_write_frame().unwrap();
    /// ```
    ///
    /// To write the current system state to a specific writer, specify the writer’s filename:
    /// ```no_run
    /// # use dcd_tools::prelude::*;
    /// # let mut system = ChainSystem::new(10, 4).unwrap();
    /// # system.traj_writer_init::<DcdWriter>("chain.dcd").unwrap();
    /// #
    /// system.traj_write_frame_to_file("chain.dcd").unwrap();
    /// ```
    ///
    /// Trajectory files close automatically when the `ChainSystem` goes out of scope. To manually close all writers:
    /// ```no_run
    /// # use dcd_tools::prelude::*;
    /// # let mut system = ChainSystem::new(10, 4).unwrap();
    /// # system.traj_writer_init::<DcdWriter>("chain.dcd").unwrap();
    /// #
    /// system.traj_close();
    /// ```
    ///
    /// To close a specific writer by its filename:
    /// ```no_run
    /// # use dcd_tools::prelude::*;
    /// # let mut system = ChainSystem::new(10, 4).unwrap();
    /// # system.traj_writer_init::<DcdWriter>("chain.dcd").unwrap();
    /// #
    /// system.traj_close_file("chain.dcd").unwrap();
    /// ```
    ///
    /// ## Notes
    /// - Multiple writers can be associated with the same system.
    /// - Each writer has a unique name based on the output file path. Attempting to add a writer for the same
    ///   file will result in an error.
    /// - See also [ChainSystem::traj_writer_auto_init] and [ChainSystem::dcd_writer_init].
    pub fn traj_writer_init<Writer>(
        &mut self,
        filename: impl AsRef<Path>,
    ) -> Result<(), WriteTrajError>
    where
        Writer: TrajWrite + 'static,
    {
        let mut writers = std::mem::take(self.get_writers_mut());
        let result = writers.try_insert::<Writer>(self, filename);
        *self.get_writers_mut() = writers;

        result
    }

    /// Initializes a dcd trajectory writer and associates it with `ChainSystem`.
    /// Equivalent to `ChainSystem::traj_writer_init::<DcdWriter>`.
    #[inline(always)]
    pub fn dcd_writer_init(&mut self, filename: impl AsRef<Path>) -> Result<(), WriteTrajError> {
        self.traj_writer_init::<DcdWriter>(filename)
    }

    /// Automatically initializes a trajectory writer based on the output file
    /// extension and associates it with `ChainSystem`.
    ///
    /// Only the `dcd` extension is currently recognized.
    /// Returns an error if the extension is unknown or unsupported.
    #[inline]
    pub fn traj_writer_auto_init(
        &mut self,
        filename: impl AsRef<Path>,
    ) -> Result<(), WriteTrajError> {
        match FileType::from_name(&filename) {
            FileType::DCD => self.traj_writer_init::<DcdWriter>(filename),
            _ => Err(WriteTrajError::UnknownExtension(Box::from(
                filename.as_ref(),
            ))),
        }
    }

    /// Writes a single frame to a specified trajectory writer identified by its filename.
    ///
    /// If no writer matches `name`, an error is returned.
    /// For examples, see [`ChainSystem::traj_writer_init`].
    #[inline(always)]
    pub fn traj_write_frame_to_file(
        &mut self,
        name: impl AsRef<Path>,
    ) -> Result<(), WriteTrajError> {
        let writer_name = crate::auxiliary::path2string(&name);
        self.get_writers().select_and_write(self, &writer_name)
    }

    /// Writes a single frame to all associated trajectory writers.
    ///
    /// Writing stops at the first writer that fails.
    /// For examples, see [`ChainSystem::traj_writer_init`].
    #[inline(always)]
    pub fn traj_write_frame(&mut self) -> Result<(), WriteTrajError> {
        self.get_writers().write_all(self)
    }

    /// Closes a specific trajectory writer identified by its filename.
    ///
    /// If no writer matches `name`, an error is returned.
    /// For examples, see [`ChainSystem::traj_writer_init`].
    #[inline(always)]
    pub fn traj_close_file(&mut self, name: impl AsRef<Path>) -> Result<(), WriteTrajError> {
        let writer_name = crate::auxiliary::path2string(&name);
        self.get_writers_mut().select_and_close(&writer_name)
    }

    /// Closes all trajectory writers associated with the `ChainSystem`.
    /// For examples, see [`ChainSystem::traj_writer_init`].
    #[inline(always)]
    pub fn traj_close(&mut self) {
        self.get_writers_mut().close_all()
    }
}

#[cfg(not(feature = "parallel"))]
mod single_threaded {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[derive(Clone, Default)]
    pub(crate) struct SystemWriters(HashMap<String, Rc<RefCell<dyn TrajWrite>>>);

    impl SystemWriters {
        /// Select a writer associated with the system and write the current frame of the system into it.
        pub(crate) fn select_and_write(
            &self,
            system: &ChainSystem,
            name: &str,
        ) -> Result<(), WriteTrajError> {
            let mut writer = match self.0.get(name) {
                Some(x) => x.borrow_mut(),
                None => return Err(WriteTrajError::WriterNotFound(name.to_owned())),
            };

            writer.write_frame(system)
        }

        /// Select a writer associated with the system and close it.
        /// Returns an error if the writer does not exist.
        pub(crate) fn select_and_close(&mut self, name: &str) -> Result<(), WriteTrajError> {
            self.0
                .remove(name)
                .ok_or_else(|| WriteTrajError::WriterNotFound(name.to_owned()))
                .map(|_| ())
        }

        /// Write the current frame of the system using all the writers associated with the system.
        pub(crate) fn write_all(&self, system: &ChainSystem) -> Result<(), WriteTrajError> {
            for writer in self.0.values() {
                writer.borrow_mut().write_frame(system)?;
            }

            Ok(())
        }

        /// Close all writers associated with this system.
        pub(crate) fn close_all(&mut self) {
            self.0.clear()
        }

        /// Open a new file and add the corresponding trajectory writer into `SystemWriters`.
        ///
        /// If a writer for the same file is already associated with the system,
        /// the file is not reopened and an error is returned.
        pub(super) fn try_insert<Writer>(
            &mut self,
            system: &ChainSystem,
            filename: impl AsRef<Path>,
        ) -> Result<(), WriteTrajError>
        where
            Writer: TrajWrite + 'static,
        {
            let name = crate::auxiliary::path2string(&filename);

            if self.0.contains_key(&name) {
                return Err(WriteTrajError::WriterAlreadyExists(name));
            }

            let writer = Writer::new(system, &filename)?;
            self.0.insert(name, Rc::new(RefCell::new(writer)));

            Ok(())
        }

        pub(crate) fn len(&self) -> usize {
            self.0.len()
        }
    }

    impl Debug for SystemWriters {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(
                f,
                "{} associated thread-unsafe trajectory writer(s)",
                self.0.len()
            )
        }
    }
}

#[cfg(feature = "parallel")]
mod multi_threaded {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub(crate) struct SystemWriters(HashMap<String, Arc<Mutex<dyn TrajWrite>>>);

    impl SystemWriters {
        /// Select a writer associated with the system and write the current frame of the system into it.
        pub(crate) fn select_and_write(
            &self,
            system: &ChainSystem,
            name: &str,
        ) -> Result<(), WriteTrajError> {
            let mut writer = match self.0.get(name) {
                Some(x) => x.lock(),
                None => return Err(WriteTrajError::WriterNotFound(name.to_owned())),
            };

            writer.write_frame(system)
        }

        /// Select a writer associated with the system and close it.
        /// Returns an error if the writer does not exist.
        pub(crate) fn select_and_close(&mut self, name: &str) -> Result<(), WriteTrajError> {
            self.0
                .remove(name)
                .ok_or_else(|| WriteTrajError::WriterNotFound(name.to_owned()))
                .map(|_| ())
        }

        /// Write the current frame of the system using all the writers associated with the system.
        pub(crate) fn write_all(&self, system: &ChainSystem) -> Result<(), WriteTrajError> {
            for writer in self.0.values() {
                writer.lock().write_frame(system)?;
            }

            Ok(())
        }

        /// Close all writers associated with this system.
        pub(crate) fn close_all(&mut self) {
            self.0.clear()
        }

        /// Open a new file and add the corresponding trajectory writer into `SystemWriters`.
        ///
        /// If a writer for the same file is already associated with the system,
        /// the file is not reopened and an error is returned.
        pub(super) fn try_insert<Writer>(
            &mut self,
            system: &ChainSystem,
            filename: impl AsRef<Path>,
        ) -> Result<(), WriteTrajError>
        where
            Writer: TrajWrite + 'static,
        {
            let name = crate::auxiliary::path2string(&filename);

            if self.0.contains_key(&name) {
                return Err(WriteTrajError::WriterAlreadyExists(name));
            }

            let writer = Writer::new(system, &filename)?;
            self.0.insert(name, Arc::new(Mutex::new(writer)));

            Ok(())
        }

        pub(crate) fn len(&self) -> usize {
            self.0.len()
        }
    }

    impl Debug for SystemWriters {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(
                f,
                "{} associated thread-safe trajectory writer(s)",
                self.0.len()
            )
        }
    }
}

/// Any structure implementing the `TrajWrite` trait can be used as a trajectory writer.
#[allow(private_bounds)]
pub trait TrajWrite: PrivateTrajWrite + Send {}

/// Trait containing private methods implemented by all trajectory writers.
pub(crate) trait PrivateTrajWrite {
    /// Create a new trajectory writer and write the header of the file.
    fn new(system: &ChainSystem, filename: impl AsRef<Path>) -> Result<Self, WriteTrajError>
    where
        Self: Sized;

    /// Write the current state of the system into an open trajectory file.
    fn write_frame(&mut self, system: &ChainSystem) -> Result<(), WriteTrajError>;
}

/******************************/
/*         UNIT TESTS         */
/******************************/
