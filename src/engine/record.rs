//! Record descriptors and instances: random-access reads and staged writes
//! of the fixed-layout ZIP structural records.

use super::field::{FieldSpec, Width};
use super::writes::PendingWrite;

/// An ordered sequence of field descriptors, little-endian, whose total
/// size is the sum of the field widths. Each field's offset within the
/// record is implied by its position in `fields`.
#[derive(Debug, Clone)]
pub struct RecordSpec {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl RecordSpec {
    /// Total size of the record in bytes.
    pub fn size(&self) -> usize {
        self.fields.iter().map(|f| f.width.bytes()).sum()
    }

    fn field(&self, name: &str) -> &FieldSpec {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("unknown field {:?} in record {:?}", name, self.name))
    }

    fn offset_of(&self, name: &str) -> usize {
        let mut offset = 0usize;
        for f in &self.fields {
            if f.name == name {
                return offset;
            }
            offset += f.width.bytes();
        }
        panic!("unknown field {:?} in record {:?}", name, self.name);
    }
}

/// A record descriptor together with its absolute file position and a
/// private copy of the bytes read from that position. Field reads decode
/// slices of this buffer; writes produce [`PendingWrite`]s positioned
/// relative to `position`, they never mutate `buf` in place.
#[derive(Debug, Clone)]
pub struct RecordInstance {
    spec: RecordSpec,
    position: u64,
    buf: Vec<u8>,
}

impl RecordInstance {
    pub(crate) fn new(spec: RecordSpec, position: u64, buf: Vec<u8>) -> Self {
        debug_assert_eq!(buf.len(), spec.size());
        RecordInstance { spec, position, buf }
    }

    pub fn spec(&self) -> &RecordSpec {
        &self.spec
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    fn field_slice(&self, name: &str) -> &[u8] {
        let offset = self.spec.offset_of(name);
        let width = self.spec.field(name).width.bytes();
        &self.buf[offset..offset + width]
    }

    /// Raw bytes of a field, in file order (little-endian).
    pub fn read_bytes(&self, name: &str) -> &[u8] {
        self.field_slice(name)
    }

    pub fn read_u8(&self, name: &str) -> u8 {
        let s = self.field_slice(name);
        assert_eq!(s.len(), 1, "field {:?} is not 1 byte wide", name);
        s[0]
    }

    pub fn read_u16(&self, name: &str) -> u16 {
        let s = self.field_slice(name);
        assert_eq!(s.len(), 2, "field {:?} is not 2 bytes wide", name);
        u16::from_le_bytes([s[0], s[1]])
    }

    pub fn read_u32(&self, name: &str) -> u32 {
        let s = self.field_slice(name);
        assert_eq!(s.len(), 4, "field {:?} is not 4 bytes wide", name);
        u32::from_le_bytes(s.try_into().unwrap())
    }

    pub fn read_u64(&self, name: &str) -> u64 {
        let s = self.field_slice(name);
        assert_eq!(s.len(), 8, "field {:?} is not 8 bytes wide", name);
        u64::from_le_bytes(s.try_into().unwrap())
    }

    pub fn read_i8(&self, name: &str) -> i8 {
        self.read_u8(name) as i8
    }

    pub fn read_i16(&self, name: &str) -> i16 {
        self.read_u16(name) as i16
    }

    pub fn read_i32(&self, name: &str) -> i32 {
        self.read_u32(name) as i32
    }

    pub fn read_i64(&self, name: &str) -> i64 {
        self.read_u64(name) as i64
    }

    /// An unsigned 16-bit field widened to the next larger signed integer,
    /// so the full unsigned range is representable without sign-extension.
    pub fn read_u16_widened(&self, name: &str) -> i32 {
        self.read_u16(name) as i32
    }

    /// An unsigned 32-bit field widened to the next larger signed integer.
    pub fn read_u32_widened(&self, name: &str) -> i64 {
        self.read_u32(name) as i64
    }

    pub fn write_u8(&self, name: &str, value: u8) -> PendingWrite {
        self.write_bytes_checked(name, &[value])
    }

    pub fn write_u16(&self, name: &str, value: u16) -> PendingWrite {
        self.write_bytes_checked(name, &value.to_le_bytes())
    }

    pub fn write_u32(&self, name: &str, value: u32) -> PendingWrite {
        self.write_bytes_checked(name, &value.to_le_bytes())
    }

    pub fn write_u64(&self, name: &str, value: u64) -> PendingWrite {
        self.write_bytes_checked(name, &value.to_le_bytes())
    }

    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> PendingWrite {
        self.write_bytes_checked(name, bytes)
    }

    fn write_bytes_checked(&self, name: &str, bytes: &[u8]) -> PendingWrite {
        let offset = self.spec.offset_of(name);
        let width = self.spec.field(name).width.bytes();
        assert_eq!(
            bytes.len(),
            width,
            "write to field {:?} supplied {} bytes, field is {} bytes wide",
            name,
            bytes.len(),
            width
        );
        PendingWrite::new(self.position + offset as u64, bytes.to_vec())
    }
}

/// `true` iff every field with a declared magic matches its bytes exactly.
pub fn validate_magic(instance: &RecordInstance) -> bool {
    instance
        .spec
        .fields
        .iter()
        .all(|f| match &f.magic {
            Some(magic) => instance.field_slice(f.name) == magic.as_slice(),
            None => true,
        })
}
