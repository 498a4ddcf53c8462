use log::{debug, trace};
use std::collections::HashMap;
use twinbus_core::memory::periph::AudioPeriph;

const CORES: usize = 2;

// Per-core register stride inside the SPU2 window
const CORE_STRIDE: u32 = 0x400;
const CORE1_BASE: u32 = 0x1F90_0400;

// STATX, one per core; bit 7 reports the DMA FIFO as drained
const STATX_CORE0: u32 = 0x1F90_0344;
const STATX_DMA_READY: u16 = 1 << 7;

/// SPU2 stand-in: a 16-bit register latch that acknowledges DMA completion
#[derive(Debug, Default, Clone)]
pub struct Spu2 {
    registers: HashMap<u32, u16>,
    completions: [u64; CORES],
}

impl Spu2 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// DMA transfers finished on `core`
    pub fn completions(&self, core: usize) -> u64 {
        self.completions[core]
    }

    fn statx(core: usize) -> u32 {
        STATX_CORE0 + core as u32 * CORE_STRIDE
    }
}

impl AudioPeriph for Spu2 {
    fn read_register(&mut self, addr: u32) -> u16 {
        self.registers.get(&addr).copied().unwrap_or(0)
    }

    fn write_register(&mut self, addr: u32, value: u16) {
        let core = usize::from(addr >= CORE1_BASE);
        trace!("[Spu2] core{} {:08x} = {:04x}", core, addr, value);
        self.registers.insert(addr, value);
    }

    fn dma_complete(&mut self, core: usize) {
        debug!("[Spu2] core{} DMA complete", core);
        self.completions[core] += 1;
        let statx = self.registers.entry(Self::statx(core)).or_insert(0);
        *statx |= STATX_DMA_READY;
    }
}
