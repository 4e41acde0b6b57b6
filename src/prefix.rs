//! `apply_prefixes_to_zip`: the external collaborator that actually grows
//! the file. It streams one or more prefixes followed by the original
//! archive into a sibling temporary file, invokes the walker ([`crate::zip`])
//! on that temporary with the total prefix length as displacement, then
//! atomically renames the temporary over the original. On any failure the
//! temporary is removed and the original file is left untouched.

use crate::config::ScanOptions;
use crate::error::Result;
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

/// A single piece of content to prepend: either bytes already in memory, or
/// a file whose contents are streamed in without loading it whole.
#[derive(Debug, Clone)]
pub enum Prefix {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl Prefix {
    fn len(&self) -> io::Result<u64> {
        match self {
            Prefix::Bytes(bytes) => Ok(bytes.len() as u64),
            Prefix::Path(path) => Ok(fs::metadata(path)?.len()),
        }
    }

    fn stream_into<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self {
            Prefix::Bytes(bytes) => out.write_all(bytes),
            Prefix::Path(path) => {
                let mut reader = BufReader::new(File::open(path)?);
                io::copy(&mut reader, out)?;
                Ok(())
            }
        }
    }
}

impl From<Vec<u8>> for Prefix {
    fn from(bytes: Vec<u8>) -> Self {
        Prefix::Bytes(bytes)
    }
}

impl From<&[u8]> for Prefix {
    fn from(bytes: &[u8]) -> Self {
        Prefix::Bytes(bytes.to_vec())
    }
}

impl From<PathBuf> for Prefix {
    fn from(path: PathBuf) -> Self {
        Prefix::Path(path)
    }
}

impl From<&Path> for Prefix {
    fn from(path: &Path) -> Self {
        Prefix::Path(path.to_path_buf())
    }
}

/// Prepend `prefixes` (in order) to the ZIP archive at `path`, rewriting
/// its structural offsets so the result stays readable by standard ZIP
/// tools. Validates the source first, then streams every prefix followed
/// by the original file into a sibling temporary, adjusts the temporary's
/// offsets by the total prefix length, and atomically renames it over
/// `path`. The original is never modified in place: a failure at any step
/// removes the temporary and leaves `path` exactly as it was.
pub fn apply_prefixes_to_zip<P: AsRef<Path>>(path: P, prefixes: &[Prefix]) -> Result<()> {
    apply_prefixes_to_zip_with_options(path, prefixes, &ScanOptions::default())
}

/// Like [`apply_prefixes_to_zip`], with explicit scan/search limits passed
/// through to the underlying `adjust_offsets_with_options` call.
pub fn apply_prefixes_to_zip_with_options<P: AsRef<Path>>(
    path: P,
    prefixes: &[Prefix],
    options: &ScanOptions,
) -> Result<()> {
    let path = path.as_ref();
    crate::validate_offsets_with_options(path, options)?;

    let mut total_len: u64 = 0;
    for prefix in prefixes {
        total_len += prefix.len()?;
    }

    let tmp_path = sibling_temp_path(path);
    debug!(
        "staging {} prefix(es), {} bytes total, into {}",
        prefixes.len(),
        total_len,
        tmp_path.display()
    );

    let result = write_staged_copy(path, &tmp_path, prefixes)
        .map_err(crate::error::ZipOffsetError::from)
        .and_then(|()| {
            crate::adjust_offsets_with_options(&tmp_path, total_len as i64, options)
        })
        .and_then(|()| fs::rename(&tmp_path, path).map_err(crate::error::ZipOffsetError::from));

    if let Err(ref err) = result {
        warn!(
            "apply_prefixes_to_zip failed ({}), removing staged copy {}",
            err,
            tmp_path.display()
        );
        let _ = fs::remove_file(&tmp_path);
    }

    result
}

fn write_staged_copy(source: &Path, tmp_path: &Path, prefixes: &[Prefix]) -> io::Result<()> {
    let mut out = File::create(tmp_path)?;
    for prefix in prefixes {
        prefix.stream_into(&mut out)?;
    }
    let mut source_reader = BufReader::new(File::open(source)?);
    io::copy(&mut source_reader, &mut out)?;
    out.flush()
}

/// A unique path in the same directory as `path`, so the final rename is
/// guaranteed to be on the same filesystem (and therefore atomic).
fn sibling_temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let pid = std::process::id();
    let unique = format!(".{}.{}.zip-prefixer-tmp", file_name, pid);
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(unique),
        _ => PathBuf::from(unique),
    }
}
