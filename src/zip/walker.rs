//! The ZIP offset walker: locates the EOCDR, decides whether ZIP64 is in
//! play, walks the central directory cross-checking each entry's Local
//! File Header, and accumulates the offset displacement as a batch of
//! pending writes. The walker drives the engine; it never reads or writes
//! bytes directly.

use crate::config::ScanOptions;
use crate::engine::channel::Channel;
use crate::engine::record::RecordInstance;
use crate::engine::writes::WriteQueue;
use crate::engine::{self, Direction};
use crate::error::{Result, ZipOffsetError};
use crate::zip::records::{self, Zip64EiefLayout, SENTINEL_U16, SENTINEL_U32};
use log::{debug, trace, warn};
use std::io::SeekFrom;

/// A 32-bit offset must remain strictly below this after displacement, or
/// the archive would need to transition to ZIP64 to represent it. The
/// sentinel value itself (`0xFFFF_FFFF`) is the only value excluded; the
/// largest valid displaced offset is `0xFFFF_FFFE` (2^32 - 2).
const ZIP64_TRANSITION_THRESHOLD: u64 = u32::MAX as u64;

/// Runs the walker. `displacement == 0` is validate mode: every structural
/// cross-check still runs, but the returned queue is always empty.
/// `displacement != 0` is adjust mode: the returned queue holds every
/// pending write needed to shift all offsets by `displacement`.
pub fn walk<C: Channel>(
    channel: &mut C,
    displacement: i64,
    options: &ScanOptions,
) -> Result<WriteQueue> {
    let mut queue = WriteQueue::new();

    let eocdr = locate_eocdr(channel, options)?;
    debug!("located EOCDR at {}", eocdr.position());

    let (cd_offset, cd_entry_count) =
        resolve_central_directory_location(channel, &eocdr, displacement, &mut queue)?;

    walk_central_directory(channel, cd_offset, cd_entry_count, displacement, &mut queue)?;

    Ok(queue)
}

/// Phase 1: search backwards from end of file for the EOCDR magic, bounded
/// by `options.eocdr_search_window`.
fn locate_eocdr<C: Channel>(channel: &mut C, options: &ScanOptions) -> Result<RecordInstance> {
    let spec = records::eocdr_spec();
    let channel_len = channel.seek(SeekFrom::End(0))?;
    if (spec.size() as u64) > channel_len {
        return Err(ZipOffsetError::NotAZip);
    }

    let start = channel_len - spec.size() as u64;
    let search_floor = channel_len.saturating_sub(options.eocdr_search_window);
    let max_distance = start.saturating_sub(search_floor);

    if !options.strict_comment_length {
        return engine::seek(&spec, channel, start, Direction::Backward, Some(max_distance))?
            .ok_or(ZipOffsetError::NotAZip);
    }

    // Strict mode: a magic match is only accepted if its declared
    // commentLength reaches exactly end-of-file, guarding against a false
    // positive signature embedded in an earlier comment.
    let mut pos = start;
    let mut steps = 0u64;
    loop {
        if steps > max_distance {
            return Err(ZipOffsetError::NotAZip);
        }
        if let Some(instance) = engine::read(&spec, channel, pos)? {
            let comment_length = instance.read_u16("commentLength") as u64;
            if instance.position() + spec.size() as u64 + comment_length == channel_len {
                return Ok(instance);
            }
            trace!(
                "EOCDR candidate at {} rejected: commentLength {} does not reach EOF",
                pos,
                comment_length
            );
        }
        if pos == 0 {
            return Err(ZipOffsetError::NotAZip);
        }
        pos -= 1;
        steps += 1;
    }
}

/// Phase 2: decide whether ZIP64 is in play, and resolve the authoritative
/// central-directory offset and entry count.
fn resolve_central_directory_location<C: Channel>(
    channel: &mut C,
    eocdr: &RecordInstance,
    displacement: i64,
    queue: &mut WriteQueue,
) -> Result<(u64, u64)> {
    let eocdr_cd_offset = eocdr.read_u32("offsetOfStartOfCD");
    let eocdr_entry_count = eocdr.read_u16("numberOfEntriesInCDOnThisDisk");
    let requires_zip64 = eocdr_cd_offset == SENTINEL_U32 || eocdr_entry_count == SENTINEL_U16;

    if displacement != 0 && eocdr_cd_offset != SENTINEL_U32 {
        queue.push(eocdr.write_u32(
            "offsetOfStartOfCD",
            checked_displace_u32(eocdr_cd_offset, displacement)?,
        ));
    }

    let locator_spec = records::zip64_eocdl_spec();
    let locator_size = locator_spec.size() as u64;
    let locator = if eocdr.position() >= locator_size {
        engine::read(&locator_spec, channel, eocdr.position() - locator_size)?
    } else {
        None
    };

    match locator {
        None => {
            if requires_zip64 {
                warn!("EOCDR requires ZIP64 but no ZIP64 EOCDL precedes it");
                return Err(ZipOffsetError::StructuralZip(
                    "archive lacks a ZIP64 EOCDL that is required".to_string(),
                ));
            }
            debug!("plain-ZIP path: central directory at {}", eocdr_cd_offset);
            Ok((eocdr_cd_offset as u64, eocdr_entry_count as u64))
        }
        Some(locator) => {
            let zip64_eocdr_offset = locator.read_u64("relativeOffsetOfZip64EOCDR");
            let zip64_eocdr = engine::read(&records::zip64_eocdr_spec(), channel, zip64_eocdr_offset)?
                .ok_or_else(|| {
                    ZipOffsetError::StructuralZip(format!(
                        "ZIP64 end of central directory record not found at offset {}",
                        zip64_eocdr_offset
                    ))
                })?;
            debug!("ZIP64 path: ZIP64 EOCDR at {}", zip64_eocdr.position());

            if displacement != 0 {
                queue.push(locator.write_u64(
                    "relativeOffsetOfZip64EOCDR",
                    displace_u64(zip64_eocdr_offset, displacement),
                ));
                queue.push(zip64_eocdr.write_u64(
                    "offsetOfStartOfCD",
                    displace_u64(zip64_eocdr.read_u64("offsetOfStartOfCD"), displacement),
                ));
            }

            let cd_offset = zip64_eocdr.read_u64("offsetOfStartOfCD");
            let cd_entry_count = zip64_eocdr.read_u64("totalEntriesOnThisDisk");
            Ok((cd_offset, cd_entry_count))
        }
    }
}

/// Phase 3: walk the central directory, cross-checking each entry's LFH.
fn walk_central_directory<C: Channel>(
    channel: &mut C,
    cd_offset: u64,
    entry_count: u64,
    displacement: i64,
    queue: &mut WriteQueue,
) -> Result<()> {
    debug!(
        "walking {} central directory entries starting at {}",
        entry_count, cd_offset
    );
    let cfh_spec = records::cfh_spec();
    let lfh_spec = records::lfh_spec();
    let mut cursor = cd_offset;

    for index in 0..entry_count {
        let cfh = engine::read(&cfh_spec, channel, cursor)?.ok_or_else(|| {
            ZipOffsetError::StructuralZip(format!(
                "central file header not where it should be (entry {}, expected at {})",
                index, cursor
            ))
        })?;

        let file_name_length = cfh.read_u16("fileNameLength") as u64;
        let extra_field_length = cfh.read_u16("extraFieldLength") as u64;
        let file_comment_length = cfh.read_u16("fileCommentLength") as u64;
        let cfh_lfh_offset = cfh.read_u32("relativeOffsetOfLocalHeader");

        trace!(
            "CFH #{} at {}: nameLen={} extraLen={} rawOffset=0x{:x}",
            index,
            cursor,
            file_name_length,
            extra_field_length,
            cfh_lfh_offset
        );

        let lfh_offset = if cfh_lfh_offset != SENTINEL_U32 {
            if displacement != 0 {
                queue.push(cfh.write_u32(
                    "relativeOffsetOfLocalHeader",
                    checked_displace_u32(cfh_lfh_offset, displacement)?,
                ));
            }
            cfh_lfh_offset as u64
        } else {
            let extra_field_start = cursor + cfh_spec.size() as u64 + file_name_length;
            let (eief, resolved_offset) =
                locate_zip64_eief(channel, &cfh, extra_field_start, extra_field_length)?;
            if displacement != 0 {
                queue.push(eief.write_u64(
                    "relativeOffsetOfLocalHeader",
                    displace_u64(resolved_offset, displacement),
                ));
            }
            resolved_offset
        };

        engine::read(&lfh_spec, channel, lfh_offset)?.ok_or_else(|| {
            ZipOffsetError::StructuralZip(format!(
                "local file header not where it should be (entry {}, expected at {})",
                index, lfh_offset
            ))
        })?;

        cursor +=
            cfh_spec.size() as u64 + file_name_length + extra_field_length + file_comment_length;
    }

    debug!("central directory walk complete, cursor ended at {}", cursor);
    Ok(())
}

/// Scan a CFH's extra-field region for the ZIP64 EIEF sub-record, and
/// return it along with the authoritative LFH offset it carries.
fn locate_zip64_eief<C: Channel>(
    channel: &mut C,
    cfh: &RecordInstance,
    extra_field_start: u64,
    extra_field_length: u64,
) -> Result<(RecordInstance, u64)> {
    let layout = Zip64EiefLayout {
        has_uncompressed_size: cfh.read_u32("uncompressedSize") == SENTINEL_U32,
        has_compressed_size: cfh.read_u32("compressedSize") == SENTINEL_U32,
    };
    let header_spec = records::extra_subrecord_header_spec();
    let extra_field_end = extra_field_start + extra_field_length;

    let header = engine::seek_with_step(
        &header_spec,
        channel,
        extra_field_start,
        |candidate| 4 + candidate.read_u16("size") as u64,
        extra_field_start,
        extra_field_end,
    )?
    .ok_or_else(|| {
        ZipOffsetError::StructuralZip(format!(
            "ZIP64 extended information extra field not found in CFH extra field region \
             (entry at {})",
            cfh.position()
        ))
    })?;

    let eief_spec = records::zip64_eief_spec(&layout);
    let eief = engine::read_unvalidated(&eief_spec, channel, header.position())?;

    let declared_size = eief.read_u16("size") as u64;
    let data_field_count = (eief_spec.fields.len() - 2) as u64;
    let min_size = 8 * data_field_count;
    if declared_size < min_size {
        return Err(ZipOffsetError::StructuralZip(format!(
            "ZIP64 extra fields too small: declared size {} but needs at least {} (entry at {})",
            declared_size,
            min_size,
            cfh.position()
        )));
    }

    let resolved_offset = eief.read_u64("relativeOffsetOfLocalHeader");
    Ok((eief, resolved_offset))
}

fn checked_displace_u32(value: u32, displacement: i64) -> Result<u32> {
    let displaced = value as i64 + displacement;
    if displaced < 0 || displaced as u64 >= ZIP64_TRANSITION_THRESHOLD {
        return Err(ZipOffsetError::Overflow {
            offset: value as u64,
            displacement,
        });
    }
    Ok(displaced as u32)
}

fn displace_u64(value: u64, displacement: i64) -> u64 {
    (value as i64 + displacement) as u64
}
