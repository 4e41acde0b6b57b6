//! # zip-prefixer: rewrite ZIP offsets in place, without rebuilding the archive
//!
//! `zip-prefixer` prepends arbitrary byte content (a "prefix", also called a
//! preamble) to an existing ZIP-format archive without rebuilding it and
//! without touching any bytes except the small set of on-disk offset fields
//! that would otherwise become stale. The motivating use case is producing
//! self-extracting or self-executing archives — for instance a shell stub or
//! launcher concatenated in front of a JAR — where the original archive must
//! remain readable by standard ZIP tools after prefixing.
//!
//! The crate is built from two cooperating layers: a declarative
//! [`engine`] that knows how to read and stage writes for fixed-layout
//! binary records, and a [`zip`] walker that drives the engine over the
//! structural records defined by APPNOTE.TXT 6.3.x (the End of Central
//! Directory Record, its optional ZIP64 locator and record, each Central
//! File Header, and each entry's optional ZIP64 extended-information
//! field). The walker never reads or writes bytes directly; the engine
//! never knows about ZIP.
//!
//! ## Quick Start
//!
//! ```no_run
//! use zip_prefixer::{adjust_offsets, validate_offsets};
//!
//! // Confirm an archive's offsets are internally consistent.
//! validate_offsets("archive.zip")?;
//!
//! // Shift every offset by 10 bytes, e.g. after prepending a 10-byte stub.
//! adjust_offsets("archive.zip", 10)?;
//! # Ok::<(), zip_prefixer::ZipOffsetError>(())
//! ```
//!
//! To actually prepend bytes and adjust offsets in one step, see
//! [`apply_prefixes_to_zip`].

pub mod config;
pub mod engine;
pub mod error;
pub mod prefix;
pub mod zip;

pub use config::ScanOptions;
pub use error::{Result, ZipOffsetError};
pub use prefix::{apply_prefixes_to_zip, apply_prefixes_to_zip_with_options, Prefix};

use std::fs::{File, OpenOptions};
use std::path::Path;

/// Validate a ZIP archive's offsets with the default [`ScanOptions`].
///
/// Runs the walker in validate mode (displacement `0`): every structural
/// cross-check described in the crate docs still runs, but no byte of the
/// file is touched. Returns `Ok(())` if every offset-bearing record is
/// where the archive claims it is.
pub fn validate_offsets<P: AsRef<Path>>(path: P) -> Result<()> {
    validate_offsets_with_options(path, &ScanOptions::default())
}

/// Like [`validate_offsets`], with explicit scan/search limits.
pub fn validate_offsets_with_options<P: AsRef<Path>>(path: P, options: &ScanOptions) -> Result<()> {
    adjust_offsets_with_options(path, 0, options)
}

/// Shift every ZIP structural offset in `path` by `displacement` bytes,
/// using the default [`ScanOptions`].
///
/// `displacement == 0` is equivalent to [`validate_offsets`]: the walker
/// still performs its full read-phase traversal, but produces no writes.
/// For `displacement != 0`, the read phase fully precedes the write phase —
/// no byte is written until every offset has been located and checked — so
/// a structural or overflow failure always leaves the file untouched.
pub fn adjust_offsets<P: AsRef<Path>>(path: P, displacement: i64) -> Result<()> {
    adjust_offsets_with_options(path, displacement, &ScanOptions::default())
}

/// Like [`adjust_offsets`], with explicit scan/search limits.
pub fn adjust_offsets_with_options<P: AsRef<Path>>(
    path: P,
    displacement: i64,
    options: &ScanOptions,
) -> Result<()> {
    let path = path.as_ref();

    let queue = {
        let mut reader = File::open(path)?;
        zip::walk(&mut reader, displacement, options)?
    };

    if displacement != 0 && !queue.is_empty() {
        let mut writer = OpenOptions::new().write(true).open(path)?;
        engine::apply_writes(&queue, &mut writer)?;
    }

    Ok(())
}
