/// Big-endian field accessors over a single record.
///
/// Offsets are relative to the start of the record, so offset `0` is the
/// command byte. Older captures write shorter records for the same command;
/// any field that runs off the end of the record reads as `None` rather than
/// failing the whole decode.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Record<'a>(&'a [u8]);

impl<'a> Record<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    fn array<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        self.0.get(offset..offset.checked_add(N)?)?.try_into().ok()
    }

    pub(crate) fn u8(&self, offset: usize) -> Option<u8> {
        self.0.get(offset).copied()
    }

    pub(crate) fn i8(&self, offset: usize) -> Option<i8> {
        self.array(offset).map(i8::from_be_bytes)
    }

    pub(crate) fn bool(&self, offset: usize) -> Option<bool> {
        self.u8(offset).map(|value| value != 0)
    }

    pub(crate) fn u16(&self, offset: usize) -> Option<u16> {
        self.array(offset).map(u16::from_be_bytes)
    }

    pub(crate) fn u32(&self, offset: usize) -> Option<u32> {
        self.array(offset).map(u32::from_be_bytes)
    }

    pub(crate) fn i32(&self, offset: usize) -> Option<i32> {
        self.array(offset).map(i32::from_be_bytes)
    }

    pub(crate) fn f32(&self, offset: usize) -> Option<f32> {
        self.array(offset).map(f32::from_be_bytes)
    }

    /// Everything after the command byte.
    pub(crate) fn payload(&self) -> &'a [u8] {
        self.0.get(1..).unwrap_or_default()
    }
}
