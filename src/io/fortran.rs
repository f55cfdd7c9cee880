// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Reading and writing Fortran unformatted sequential records.
//!
//! Each record consists of a 32-bit length marker, the payload, and the same length marker again.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Byte order of the binary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    Little,
    Big,
    /// Byte order of the machine running the code.
    #[default]
    Native,
}

impl ByteOrder {
    /// Resolve `ByteOrder::Native` into the concrete byte order of the current machine.
    pub fn resolve(self) -> ByteOrder {
        match self {
            ByteOrder::Native if cfg!(target_endian = "big") => ByteOrder::Big,
            ByteOrder::Native => ByteOrder::Little,
            x => x,
        }
    }

    #[inline]
    pub(crate) fn i32_bytes(self, value: i32) -> [u8; 4] {
        match self.resolve() {
            ByteOrder::Big => value.to_be_bytes(),
            _ => value.to_le_bytes(),
        }
    }

    #[inline]
    pub(crate) fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self.resolve() {
            ByteOrder::Big => value.to_be_bytes(),
            _ => value.to_le_bytes(),
        }
    }

    #[inline]
    pub(crate) fn f32_bytes(self, value: f32) -> [u8; 4] {
        match self.resolve() {
            ByteOrder::Big => value.to_be_bytes(),
            _ => value.to_le_bytes(),
        }
    }

    #[inline]
    pub(crate) fn f64_bytes(self, value: f64) -> [u8; 8] {
        match self.resolve() {
            ByteOrder::Big => value.to_be_bytes(),
            _ => value.to_le_bytes(),
        }
    }

    #[inline]
    pub(crate) fn read_i32(self, bytes: [u8; 4]) -> i32 {
        match self.resolve() {
            ByteOrder::Big => i32::from_be_bytes(bytes),
            _ => i32::from_le_bytes(bytes),
        }
    }

    #[inline]
    pub(crate) fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self.resolve() {
            ByteOrder::Big => u32::from_be_bytes(bytes),
            _ => u32::from_le_bytes(bytes),
        }
    }

    #[inline]
    pub(crate) fn read_f32(self, bytes: [u8; 4]) -> f32 {
        match self.resolve() {
            ByteOrder::Big => f32::from_be_bytes(bytes),
            _ => f32::from_le_bytes(bytes),
        }
    }

    #[inline]
    pub(crate) fn read_f64(self, bytes: [u8; 8]) -> f64 {
        match self.resolve() {
            ByteOrder::Big => f64::from_be_bytes(bytes),
            _ => f64::from_le_bytes(bytes),
        }
    }
}

/// Outcome of reading a record marker.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Marker {
    /// Marker was read successfully.
    Length(u32),
    /// No bytes were available: the stream ended exactly at a record boundary.
    Eof,
}

/// Errors that can occur when reading a Fortran record.
#[derive(Debug)]
pub(crate) enum RecordError {
    /// Stream ended inside a record.
    Truncated,
    /// Leading and trailing markers differ.
    SizeMismatch(u32, u32),
    /// Any other I/O error.
    Io(std::io::Error),
}

/// Write a single record (length marker, payload, length marker).
pub(crate) fn write_record(
    writer: &mut impl Write,
    payload: &[u8],
    order: ByteOrder,
) -> std::io::Result<()> {
    let marker = order.u32_bytes(payload.len() as u32);
    writer.write_all(&marker)?;
    writer.write_all(payload)?;
    writer.write_all(&marker)
}

/// Read a record marker. Distinguishes a clean end of stream from a truncated marker.
pub(crate) fn read_marker(reader: &mut impl Read, order: ByteOrder) -> Result<Marker, RecordError> {
    let mut buffer = [0u8; 4];
    let mut filled = 0;

    while filled < 4 {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) if filled == 0 => return Ok(Marker::Eof),
            Ok(0) => return Err(RecordError::Truncated),
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(RecordError::Io(e)),
        }
    }

    Ok(Marker::Length(order.read_u32(buffer)))
}

/// Read the payload and the trailing marker of a record whose leading marker has already been read.
pub(crate) fn read_payload(
    reader: &mut impl Read,
    length: u32,
    order: ByteOrder,
) -> Result<Vec<u8>, RecordError> {
    // the buffer grows with the data actually present so a corrupted marker can not force a huge allocation
    let mut payload = Vec::new();
    reader
        .by_ref()
        .take(length as u64)
        .read_to_end(&mut payload)
        .map_err(RecordError::Io)?;
    if payload.len() != length as usize {
        return Err(RecordError::Truncated);
    }

    let mut trailing = [0u8; 4];
    reader.read_exact(&mut trailing).map_err(map_eof)?;
    let trailing = order.read_u32(trailing);

    if trailing != length {
        return Err(RecordError::SizeMismatch(length, trailing));
    }

    Ok(payload)
}

/// Read a complete record. Returns `None` if the stream ended exactly at a record boundary.
pub(crate) fn read_record(
    reader: &mut impl Read,
    order: ByteOrder,
) -> Result<Option<Vec<u8>>, RecordError> {
    match read_marker(reader, order)? {
        Marker::Eof => Ok(None),
        Marker::Length(length) => read_payload(reader, length, order).map(Some),
    }
}

#[inline]
fn map_eof(e: std::io::Error) -> RecordError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        RecordError::Truncated
    } else {
        RecordError::Io(e)
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
