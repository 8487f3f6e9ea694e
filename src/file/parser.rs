//! Low-level byte stream parser for module image decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary
//! data parser for reading the compact module image format. It offers bounds-checked
//! access to binary data with support for the little-endian primitives, ECMA-335
//! compressed integers, and length-prefixed UTF-8 strings the container is built from.
//!
//! # Usage Examples
//!
//! ```rust
//! use cilpatch::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04];
//! let mut parser = Parser::new(&data);
//!
//! let value = parser.read_le::<u16>()?;
//! assert_eq!(value, 0x0201);
//! # Ok::<(), cilpatch::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, CilIO},
    Error::OutOfBounds,
    Result,
};

/// A cursor-based parser over a byte slice.
///
/// Maintains a position within the data and advances it with every successful read.
/// All operations validate data availability before reading; a failed read leaves the
/// position untouched.
pub struct Parser<'a> {
    /// The raw data this `Parser` operates on
    data: &'a [u8],
    /// The current position of the cursor
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new `Parser` instance.
    ///
    /// # Arguments
    /// * `data` - The byte slice to parse
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// `true` if at least one more byte can be read.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Amount of bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by `step` would exceed the
    /// data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        let Some(end) = self.position.checked_add(step) else {
            return Err(OutOfBounds);
        };

        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        self.position = end;
        Ok(())
    }

    /// Read a value of type `T` in little-endian format, advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at(self.data, &mut self.position)
    }

    /// Read `length` raw bytes, advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let Some(end) = self.position.checked_add(length) else {
            return Err(OutOfBounds);
        };

        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Read an ECMA-335 compressed unsigned integer.
    ///
    /// One byte for values up to `0x7F`, two bytes up to `0x3FFF`, four bytes up to
    /// `0x1FFF_FFFF`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the encoding runs past the data end, or
    /// [`crate::Error::Malformed`] if the lead byte is not a valid encoding marker.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            let value = ((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte);
            return Ok(value);
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_le::<u8>()?);
            let b2 = u32::from(self.read_le::<u8>()?);
            let b3 = u32::from(self.read_le::<u8>()?);
            let value = ((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3;
            return Ok(value);
        }

        Err(malformed_error!("Invalid compressed uint - {}", first_byte))
    }

    /// Read a compressed-length-prefixed UTF-8 string.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the declared length runs past the data
    /// end, or [`crate::Error::Malformed`] if the bytes are not valid UTF-8.
    pub fn read_prefixed_string_utf8(&mut self) -> Result<String> {
        let length = self.read_compressed_uint()? as usize;
        let start = self.position;
        let bytes = self.read_bytes(length)?;

        String::from_utf8(bytes.to_vec()).map_err(|e| {
            malformed_error!(
                "Invalid UTF-8 string at offset {}-{}: {}",
                start,
                start + length,
                e.utf8_error()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn read_compressed_uint_formats() {
        let test_cases = vec![
            (vec![0x03], 3),                             // 1-byte format
            (vec![0x7F], 0x7F),                          // 1-byte format, max value
            (vec![0x80, 0x80], 0x80),                    // 2-byte format, min value
            (vec![0xBF, 0xFF], 0x3FFF),                  // 2-byte format, max value
            (vec![0xC0, 0x00, 0x00, 0x00], 0x00),        // 4-byte format, min value
            (vec![0xDF, 0xFF, 0xFF, 0xFF], 0x1FFF_FFFF), // 4-byte format, max value
        ];

        for (input, expected) in test_cases {
            let mut parser = Parser::new(&input);
            assert_eq!(parser.read_compressed_uint().unwrap(), expected);
        }

        let mut parser = Parser::new(&[]);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(Error::OutOfBounds)
        ));

        // 111xxxxx is not a valid lead byte
        let mut parser = Parser::new(&[0xE0]);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn read_prefixed_string() {
        let test_cases = vec![
            (vec![0x03, 0x61, 0x62, 0x63], "abc"),
            (vec![0x00], ""),
            (vec![0x06, 0xE4, 0xB8, 0xAD, 0xE6, 0x96, 0x87], "中文"),
        ];

        for (input, expected) in test_cases {
            let mut parser = Parser::new(&input);
            assert_eq!(parser.read_prefixed_string_utf8().unwrap(), expected);
        }
    }

    #[test]
    fn read_prefixed_string_truncated() {
        let mut parser = Parser::new(&[0x05, 0x61]);
        assert!(matches!(
            parser.read_prefixed_string_utf8(),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn read_prefixed_string_invalid_utf8() {
        let mut parser = Parser::new(&[0x02, 0xFF, 0xFE]);
        assert!(matches!(
            parser.read_prefixed_string_utf8(),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn advance_and_remaining() {
        let data = [0u8; 4];
        let mut parser = Parser::new(&data);

        assert!(parser.has_more_data());
        parser.advance_by(3).unwrap();
        assert_eq!(parser.remaining(), 1);
        assert!(parser.advance_by(2).is_err());
        assert_eq!(parser.pos(), 3);
    }
}
