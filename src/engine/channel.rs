//! The random-access I/O abstraction the engine reads records from and
//! writes fields to.

use std::io::{Read, Seek, Write};

/// A positional I/O channel. Blanket-implemented for anything that is
/// `Read + Write + Seek`: a `std::fs::File` in production, or an
/// in-memory `std::io::Cursor<Vec<u8>>` in tests.
pub trait Channel: Read + Write + Seek {}

impl<T: Read + Write + Seek> Channel for T {}
