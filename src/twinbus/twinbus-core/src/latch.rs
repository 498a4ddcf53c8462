// DICR bit layout
const FORCE_BIT: u32 = 15;
const MASKS_SHIFT: u32 = 16;
const MASTER_ENABLE_BIT: u32 = 23;
const FLAGS_SHIFT: u32 = 24;
const MASTER_FLAG_BIT: u32 = 31;

const STORED_MASK: u32 = 0x00FF_FFFF;
const FIELD_MASK: u32 = 0x7F;

/// Flag/mask interrupt latch shared by both halves of the IOP DMAC (DICR, DICR2).
///
/// The low 24 bits are stored as written. Flags are sticky and cleared by
/// writing a one to their bit in the top byte; the master flag is derived.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterruptLatch {
    value: u32,
    flags: u32,
    master_flag: bool,
}

impl InterruptLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn force(&self) -> bool {
        (self.value >> FORCE_BIT) & 1 != 0
    }

    pub fn masks(&self) -> u32 {
        (self.value >> MASKS_SHIFT) & FIELD_MASK
    }

    pub fn master_enable(&self) -> bool {
        (self.value >> MASTER_ENABLE_BIT) & 1 != 0
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn master_flag(&self) -> bool {
        self.master_flag
    }

    /// True when any raised flag is also unmasked
    pub fn pending(&self) -> bool {
        self.flags & self.masks() != 0
    }

    pub fn read(&self) -> u32 {
        self.value | (self.flags << FLAGS_SHIFT) | ((self.master_flag as u32) << MASTER_FLAG_BIT)
    }

    pub fn write(&mut self, data: u32) {
        self.value = data & STORED_MASK;
        self.flags &= !((data >> FLAGS_SHIFT) & FIELD_MASK);
        self.update();
    }

    /// Raises the flag for channel slot `bit` (0..7) and recomputes the master flag
    pub fn raise(&mut self, bit: usize) {
        debug_assert!(bit < 7, "latch flag {} out of range", bit);
        self.flags |= 1 << bit;
        self.update();
    }

    pub fn update(&mut self) {
        self.master_flag = self.force() || (self.master_enable() && self.pending());
    }
}
