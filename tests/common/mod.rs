//! Test-only ZIP fixture construction and an independent reference reader,
//! used to build archives with exactly the structural edge cases the
//! library's own walker has to handle (sentinel placement, ZIP64 extended
//! information presence, oversize offsets without actually writing
//! gigabytes of payload) and to confirm, after a prefix/adjust round trip,
//! that the archive is still readable by code that shares no logic with
//! the library's own walker.
//!
//! This module never ships in the library; it exists only under `tests/`.

#![allow(dead_code)]

use crc32fast::Hasher as Crc32;
use flate2::write::DeflateEncoder;
use flate2::Compression as DeflateLevel;
use std::io::Write;

const LFH_SIG: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const CFH_SIG: [u8; 4] = [0x50, 0x4B, 0x01, 0x02];
const EOCDR_SIG: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
const ZIP64_EOCDR_SIG: [u8; 4] = [0x50, 0x4B, 0x06, 0x06];
const ZIP64_EOCDL_SIG: [u8; 4] = [0x50, 0x4B, 0x06, 0x07];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Stored,
    Deflate,
}

impl Method {
    fn code(self) -> u16 {
        match self {
            Method::Stored => 0,
            Method::Deflate => 8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FixtureEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub method: Method,
}

impl FixtureEntry {
    pub fn stored(name: &str, data: &[u8]) -> Self {
        FixtureEntry {
            name: name.to_string(),
            data: data.to_vec(),
            method: Method::Stored,
        }
    }

    pub fn deflated(name: &str, data: &[u8]) -> Self {
        FixtureEntry {
            name: name.to_string(),
            data: data.to_vec(),
            method: Method::Deflate,
        }
    }

    fn encode(&self) -> (Vec<u8>, u32) {
        let crc = crc32fast::hash(&self.data);
        match self.method {
            Method::Stored => (self.data.clone(), crc),
            Method::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), DeflateLevel::default());
                encoder.write_all(&self.data).unwrap();
                (encoder.finish().unwrap(), crc)
            }
        }
    }
}

/// Build a plain (non-ZIP64) archive: one Local File Header, payload, and
/// Central File Header per entry, followed by a classic EOCDR. Matches
/// scenario 1/2/6 in the testable-properties section: the everyday archive
/// `validate_offsets`/`adjust_offsets` are exercised against.
pub fn build_plain_zip(entries: &[FixtureEntry]) -> Vec<u8> {
    build_zip(entries, Zip64Mode::Never)
}

/// Build an archive that forces every offset-bearing field the walker
/// touches into its ZIP64 escape: the CFH's `relativeOffsetOfLocalHeader`
/// and the EOCDR's `offsetOfStartOfCD`/entry count are all the all-ones
/// sentinel, the real values living in a ZIP64 EIEF and ZIP64
/// EOCDR/locator respectively — regardless of how small the entries
/// actually are. This is what lets scenario 3/4 (ZIP64 offsets) run
/// without writing a multi-gigabyte fixture.
pub fn build_zip64_zip(entries: &[FixtureEntry]) -> Vec<u8> {
    build_zip(entries, Zip64Mode::Forced)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Zip64Mode {
    Never,
    Forced,
}

struct WrittenEntry {
    name: String,
    local_header_offset: u64,
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
    method: Method,
}

fn build_zip(entries: &[FixtureEntry], zip64: Zip64Mode) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut written = Vec::with_capacity(entries.len());

    for entry in entries {
        let local_header_offset = buf.len() as u64;
        let (payload, crc) = entry.encode();

        buf.extend_from_slice(&LFH_SIG);
        buf.extend_from_slice(&20u16.to_le_bytes()); // version needed
        buf.extend_from_slice(&0u16.to_le_bytes()); // general purpose bit flag
        buf.extend_from_slice(&entry.method.code().to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod time
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod date
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // extra field length
        buf.extend_from_slice(entry.name.as_bytes());
        buf.extend_from_slice(&payload);

        written.push(WrittenEntry {
            name: entry.name.clone(),
            local_header_offset,
            crc32: crc,
            compressed_size: payload.len() as u64,
            uncompressed_size: entry.data.len() as u64,
            method: entry.method,
        });
    }

    let cd_offset = buf.len() as u64;
    let force_zip64 = zip64 == Zip64Mode::Forced;

    for entry in &written {
        buf.extend_from_slice(&CFH_SIG);
        buf.extend_from_slice(&20u16.to_le_bytes()); // version made by
        buf.extend_from_slice(&20u16.to_le_bytes()); // version needed
        buf.extend_from_slice(&0u16.to_le_bytes()); // general purpose bit flag
        buf.extend_from_slice(&entry.method.code().to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod time
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod date
        buf.extend_from_slice(&entry.crc32.to_le_bytes());

        // sizes: sentinel-escaped only when force_zip64 is set
        if force_zip64 {
            buf.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
            buf.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        } else {
            buf.extend_from_slice(&(entry.compressed_size as u32).to_le_bytes());
            buf.extend_from_slice(&(entry.uncompressed_size as u32).to_le_bytes());
        }

        buf.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());

        let mut extra = Vec::new();
        if force_zip64 {
            // ZIP64 EIEF: header id, size, uncompressed, compressed, offset.
            let mut data = Vec::new();
            data.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            data.extend_from_slice(&entry.compressed_size.to_le_bytes());
            data.extend_from_slice(&entry.local_header_offset.to_le_bytes());
            extra.extend_from_slice(&0x0001u16.to_le_bytes());
            extra.extend_from_slice(&(data.len() as u16).to_le_bytes());
            extra.extend_from_slice(&data);
        }
        buf.extend_from_slice(&(extra.len() as u16).to_le_bytes()); // extra field length
        buf.extend_from_slice(&0u16.to_le_bytes()); // file comment length
        buf.extend_from_slice(&0u16.to_le_bytes()); // disk number start
        buf.extend_from_slice(&0u16.to_le_bytes()); // internal file attributes
        buf.extend_from_slice(&0u32.to_le_bytes()); // external file attributes

        if force_zip64 {
            buf.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        } else {
            buf.extend_from_slice(&(entry.local_header_offset as u32).to_le_bytes());
        }

        buf.extend_from_slice(entry.name.as_bytes());
        buf.extend_from_slice(&extra);
    }

    let cd_size = buf.len() as u64 - cd_offset;

    if force_zip64 {
        let zip64_eocdr_offset = buf.len() as u64;
        buf.extend_from_slice(&ZIP64_EOCDR_SIG);
        buf.extend_from_slice(&44u64.to_le_bytes()); // size of remaining record
        buf.extend_from_slice(&20u16.to_le_bytes()); // version made by
        buf.extend_from_slice(&20u16.to_le_bytes()); // version needed
        buf.extend_from_slice(&0u32.to_le_bytes()); // disk number
        buf.extend_from_slice(&0u32.to_le_bytes()); // disk with start of CD
        buf.extend_from_slice(&(written.len() as u64).to_le_bytes());
        buf.extend_from_slice(&(written.len() as u64).to_le_bytes());
        buf.extend_from_slice(&cd_size.to_le_bytes());
        buf.extend_from_slice(&cd_offset.to_le_bytes());

        buf.extend_from_slice(&ZIP64_EOCDL_SIG);
        buf.extend_from_slice(&0u32.to_le_bytes()); // disk with ZIP64 EOCDR
        buf.extend_from_slice(&zip64_eocdr_offset.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes()); // total number of disks
    }

    buf.extend_from_slice(&EOCDR_SIG);
    buf.extend_from_slice(&0u16.to_le_bytes()); // disk number
    buf.extend_from_slice(&0u16.to_le_bytes()); // disk with CD
    if force_zip64 {
        buf.extend_from_slice(&0xFFFFu16.to_le_bytes());
        buf.extend_from_slice(&0xFFFFu16.to_le_bytes());
        buf.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes()); // cd size sentinel
        buf.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes()); // cd offset sentinel
    } else {
        buf.extend_from_slice(&(written.len() as u16).to_le_bytes());
        buf.extend_from_slice(&(written.len() as u16).to_le_bytes());
        buf.extend_from_slice(&(cd_size as u32).to_le_bytes());
        buf.extend_from_slice(&(cd_offset as u32).to_le_bytes());
    }
    buf.extend_from_slice(&0u16.to_le_bytes()); // comment length

    buf
}

/// A minimal "archive" consisting of nothing but an EOCDR declaring
/// `cd_offset` and `entry_count`, with no actual central directory bytes
/// present. The overflow guard in `adjust_offsets` rejects a displaced
/// 32-bit `offsetOfStartOfCD` before the walker ever tries to read the
/// central directory it names, so this is sufficient to exercise the
/// overflow path without writing a multi-gigabyte fixture.
pub fn synthetic_eocdr_only(cd_offset: u32, entry_count: u16) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&EOCDR_SIG);
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&entry_count.to_le_bytes());
    buf.extend_from_slice(&entry_count.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // central directory size, unchecked here
    buf.extend_from_slice(&cd_offset.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // comment length
    buf
}

/// An entry recovered by [`read_entries`]: enough to confirm the archive
/// is still readable by code that shares no logic with the library's own
/// walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// A from-scratch ZIP reader used only in tests, deliberately independent
/// of `crate::zip::walker`, to check the "cross-tool readability" testable
/// property: that a file this crate has adjusted can still be read back
/// correctly by someone else's code.
pub fn read_entries(bytes: &[u8]) -> Vec<ReadEntry> {
    let eocdr_pos = find_signature_backward(bytes, &EOCDR_SIG).expect("no EOCDR in fixture");
    let cd_offset_32 = u32::from_le_bytes(bytes[eocdr_pos + 16..eocdr_pos + 20].try_into().unwrap());
    let entry_count_16 = u16::from_le_bytes(bytes[eocdr_pos + 10..eocdr_pos + 12].try_into().unwrap());

    let (mut cd_offset, mut entry_count) = (cd_offset_32 as u64, entry_count_16 as u64);

    if cd_offset_32 == 0xFFFF_FFFF || entry_count_16 == 0xFFFF {
        let locator_pos = eocdr_pos - 20;
        assert_eq!(&bytes[locator_pos..locator_pos + 4], &ZIP64_EOCDL_SIG);
        let zip64_eocdr_pos =
            u64::from_le_bytes(bytes[locator_pos + 8..locator_pos + 16].try_into().unwrap()) as usize;
        assert_eq!(&bytes[zip64_eocdr_pos..zip64_eocdr_pos + 4], &ZIP64_EOCDR_SIG);
        cd_offset = u64::from_le_bytes(
            bytes[zip64_eocdr_pos + 48..zip64_eocdr_pos + 56]
                .try_into()
                .unwrap(),
        );
        entry_count = u64::from_le_bytes(
            bytes[zip64_eocdr_pos + 32..zip64_eocdr_pos + 40]
                .try_into()
                .unwrap(),
        );
    }

    let mut out = Vec::with_capacity(entry_count as usize);
    let mut cursor = cd_offset as usize;

    for _ in 0..entry_count {
        assert_eq!(&bytes[cursor..cursor + 4], &CFH_SIG, "CFH signature mismatch");
        let method = u16::from_le_bytes(bytes[cursor + 10..cursor + 12].try_into().unwrap());
        let compressed_size_32 = u32::from_le_bytes(bytes[cursor + 20..cursor + 24].try_into().unwrap());
        let uncompressed_size_32 = u32::from_le_bytes(bytes[cursor + 24..cursor + 28].try_into().unwrap());
        let name_len = u16::from_le_bytes(bytes[cursor + 28..cursor + 30].try_into().unwrap()) as usize;
        let extra_len = u16::from_le_bytes(bytes[cursor + 30..cursor + 32].try_into().unwrap()) as usize;
        let comment_len = u16::from_le_bytes(bytes[cursor + 32..cursor + 34].try_into().unwrap()) as usize;
        let lfh_offset_32 = u32::from_le_bytes(bytes[cursor + 42..cursor + 46].try_into().unwrap());

        let name_start = cursor + 46;
        let name = String::from_utf8(bytes[name_start..name_start + name_len].to_vec()).unwrap();
        let extra_start = name_start + name_len;
        let extra = &bytes[extra_start..extra_start + extra_len];

        let mut lfh_offset = lfh_offset_32 as u64;
        let mut compressed_size = compressed_size_32 as u64;
        let mut uncompressed_size = uncompressed_size_32 as u64;

        if lfh_offset_32 == 0xFFFF_FFFF
            || compressed_size_32 == 0xFFFF_FFFF
            || uncompressed_size_32 == 0xFFFF_FFFF
        {
            let mut i = 0;
            while i + 4 <= extra.len() {
                let id = u16::from_le_bytes(extra[i..i + 2].try_into().unwrap());
                let size = u16::from_le_bytes(extra[i + 2..i + 4].try_into().unwrap()) as usize;
                if id == 0x0001 {
                    let mut field = &extra[i + 4..i + 4 + size];
                    if uncompressed_size_32 == 0xFFFF_FFFF {
                        uncompressed_size = u64::from_le_bytes(field[0..8].try_into().unwrap());
                        field = &field[8..];
                    }
                    if compressed_size_32 == 0xFFFF_FFFF {
                        compressed_size = u64::from_le_bytes(field[0..8].try_into().unwrap());
                        field = &field[8..];
                    }
                    if lfh_offset_32 == 0xFFFF_FFFF {
                        lfh_offset = u64::from_le_bytes(field[0..8].try_into().unwrap());
                    }
                    break;
                }
                i += 4 + size;
            }
        }

        let lfh_pos = lfh_offset as usize;
        assert_eq!(&bytes[lfh_pos..lfh_pos + 4], &LFH_SIG, "LFH signature mismatch");
        let lfh_name_len = u16::from_le_bytes(bytes[lfh_pos + 26..lfh_pos + 28].try_into().unwrap()) as usize;
        let lfh_extra_len = u16::from_le_bytes(bytes[lfh_pos + 28..lfh_pos + 30].try_into().unwrap()) as usize;
        let data_start = lfh_pos + 30 + lfh_name_len + lfh_extra_len;
        let compressed = &bytes[data_start..data_start + compressed_size as usize];

        let data = match method {
            0 => compressed.to_vec(),
            8 => {
                use std::io::Read;
                let mut decoder = flate2::read::DeflateDecoder::new(compressed);
                let mut decompressed = Vec::with_capacity(uncompressed_size as usize);
                decoder.read_to_end(&mut decompressed).unwrap();
                decompressed
            }
            other => panic!("unsupported compression method in test fixture: {}", other),
        };

        out.push(ReadEntry { name, data });
        cursor += 46 + name_len + extra_len + comment_len;
    }

    out
}

fn find_signature_backward(bytes: &[u8], signature: &[u8; 4]) -> Option<usize> {
    if bytes.len() < 4 {
        return None;
    }
    let mut pos = bytes.len() - 4;
    loop {
        if &bytes[pos..pos + 4] == signature {
            return Some(pos);
        }
        if pos == 0 {
            return None;
        }
        pos -= 1;
    }
}

/// CRC32 of `data`, exposed so tests can sanity-check fixture construction
/// without depending on any particular entry's internals.
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(data);
    hasher.finalize()
}
