//! The binary pattern engine: a declarative description of fixed-layout
//! record formats, random-access reads of a record at a given file
//! position, and staged writes of individual fields. The engine never
//! knows about ZIP; see `crate::zip` for the walker that drives it.

pub mod channel;
pub mod field;
pub mod record;
pub mod writes;

use self::channel::Channel;
use self::record::{validate_magic, RecordInstance, RecordSpec};
use self::writes::WriteQueue;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Direction for the simple start/±1/±2/… scan used to locate the EOCDR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Read exactly `spec.size()` bytes at `position`, without checking magic.
pub fn read_unvalidated<C: Channel>(
    spec: &RecordSpec,
    channel: &mut C,
    position: u64,
) -> io::Result<RecordInstance> {
    channel.seek(SeekFrom::Start(position))?;
    let mut buf = vec![0u8; spec.size()];
    channel.read_exact(&mut buf)?;
    Ok(RecordInstance::new(spec.clone(), position, buf))
}

/// Read a record at `position` and return it only if every field with a
/// declared magic matches its bytes exactly. A short read (the position
/// doesn't leave room for a full record) is treated the same as a magic
/// mismatch: `Ok(None)`, not an error.
pub fn read<C: Channel>(
    spec: &RecordSpec,
    channel: &mut C,
    position: u64,
) -> io::Result<Option<RecordInstance>> {
    match read_unvalidated(spec, channel, position) {
        Ok(instance) => {
            if validate_magic(&instance) {
                Ok(Some(instance))
            } else {
                Ok(None)
            }
        }
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e),
    }
}

/// Attempt reads at `start`, `start ± 1`, `start ± 2`, … in `direction`,
/// returning the first instance whose magic matches. Terminates when the
/// position leaves `[0, channel_len - spec.size()]`, or after
/// `max_distance` steps if supplied.
pub fn seek<C: Channel>(
    spec: &RecordSpec,
    channel: &mut C,
    start: u64,
    direction: Direction,
    max_distance: Option<u64>,
) -> io::Result<Option<RecordInstance>> {
    let channel_len = channel.seek(SeekFrom::End(0))?;
    let size = spec.size() as u64;
    if size > channel_len {
        return Ok(None);
    }
    let max_pos = channel_len - size;
    let mut pos = start.min(max_pos);
    let mut steps = 0u64;

    loop {
        if let Some(instance) = read(spec, channel, pos)? {
            return Ok(Some(instance));
        }
        steps += 1;
        if let Some(max) = max_distance {
            if steps > max {
                return Ok(None);
            }
        }
        match direction {
            Direction::Backward => {
                if pos == 0 {
                    return Ok(None);
                }
                pos -= 1;
            }
            Direction::Forward => {
                if pos >= max_pos {
                    return Ok(None);
                }
                pos += 1;
            }
        }
    }
}

/// Generalised seek where, after a non-matching read, the caller decides
/// how many bytes to advance for the next attempt (`0` terminates). Used
/// to walk the variable-length extra-field area of a CFH, where each
/// sub-record is prefixed by `header-id (2) | size (2)` and the next
/// sub-record starts at `current + 4 + size`.
pub fn seek_with_step<C, F>(
    spec: &RecordSpec,
    channel: &mut C,
    start: u64,
    mut step_supplier: F,
    min: u64,
    max: u64,
) -> io::Result<Option<RecordInstance>>
where
    C: Channel,
    F: FnMut(&RecordInstance) -> u64,
{
    let size = spec.size() as u64;
    let mut pos = start;
    loop {
        if pos < min || pos + size > max {
            return Ok(None);
        }
        let instance = read_unvalidated(spec, channel, pos)?;
        if validate_magic(&instance) {
            return Ok(Some(instance));
        }
        let step = step_supplier(&instance);
        if step == 0 {
            return Ok(None);
        }
        pos += step;
    }
}

/// Commit pending writes in ascending position order.
pub fn apply_writes<C: Channel>(queue: &WriteQueue, channel: &mut C) -> io::Result<()> {
    for write in queue.ordered() {
        channel.seek(SeekFrom::Start(write.position))?;
        channel.write_all(&write.bytes)?;
    }
    channel.flush()
}
