use log::{debug, trace};
use twinbus_core::memory::periph::{InterruptController, InterruptSource};

// Register offsets from 0x1F801070
const I_STAT: u32 = 0x0;
const I_MASK: u32 = 0x4;
const I_CTRL: u32 = 0x8;

/// IOP interrupt controller (I_STAT / I_MASK / I_CTRL)
#[derive(Debug, Default, Clone)]
pub struct IopIntc {
    stat: u32,
    mask: u32,
    ctrl: u32,
}

impl IopIntc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn stat(&self) -> u32 {
        self.stat
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Whether the IOP core should take an interrupt
    pub fn is_interrupt(&self) -> bool {
        self.ctrl & 1 != 0 && self.stat & self.mask != 0
    }
}

impl InterruptController for IopIntc {
    fn request(&mut self, source: InterruptSource) {
        debug!("[IopIntc] request {:?}", source);
        self.stat |= source.bit();
    }

    fn read_register(&mut self, offset: u32) -> u32 {
        match offset {
            I_STAT => self.stat,
            I_MASK => self.mask,
            I_CTRL => {
                // Reading I_CTRL disables interrupts
                let value = self.ctrl;
                self.ctrl = 0;
                value
            }
            _ => 0,
        }
    }

    fn write_register(&mut self, offset: u32, value: u32) {
        trace!("[IopIntc] {:x} = {:08x}", offset, value);
        match offset {
            // Acknowledge by writing zeroes
            I_STAT => self.stat &= value,
            I_MASK => self.mask = value,
            I_CTRL => self.ctrl = value & 1,
            _ => {}
        }
    }
}
