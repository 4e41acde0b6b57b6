//! The ZIP offset walker: the subsystem that drives the binary pattern
//! engine (`crate::engine`) over the structural records defined by the
//! ZIP and ZIP64 file format (APPNOTE.TXT 6.3.x).

pub mod records;
pub mod walker;

pub use walker::walk;
