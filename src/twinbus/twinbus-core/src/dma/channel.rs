use crate::constants::iop_dma::*;

// CHCR transfer start/busy bit
pub const CONTROL_BUSY: u32 = 1 << 24;

pub const CHANNEL_NAMES: [&str; CHANNEL_COUNT] = [
    "MDECin", "MDECout", "SIF2", "CDVD", "SPU2core0", "PIO", "OTC", "SPU2core1", "DEV9", "SIF0",
    "SIF1", "SIO2in", "SIO2out",
];

/// How a channel moves data when stepped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// SPU2 streaming; carries the audio core it feeds
    Audio(usize),
    /// IOP memory to SIF0, tag chain read from IOP memory
    Sif0,
    /// SIF1 to IOP memory, tags read from the FIFO
    Sif1,
    Unimplemented,
}

impl ChannelKind {
    pub fn of(index: usize) -> Self {
        match index {
            CHANNEL_SPU2_CORE0 => ChannelKind::Audio(0),
            CHANNEL_SPU2_CORE1 => ChannelKind::Audio(1),
            CHANNEL_SIF0 => ChannelKind::Sif0,
            CHANNEL_SIF1 => ChannelKind::Sif1,
            _ => ChannelKind::Unimplemented,
        }
    }
}

/// One IOP DMA channel: MADR, BCR, CHCR, TADR plus the latched end-of-chain state
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub(crate) base_address: u32,
    pub(crate) block_size: u32,
    pub(crate) block_count: u32,
    pub(crate) control: u32,
    pub(crate) tag_address: u32,
    pub(crate) end_transfer: bool,
}

impl Channel {
    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    pub fn control(&self) -> u32 {
        self.control
    }

    pub fn tag_address(&self) -> u32 {
        self.tag_address
    }

    pub fn end_transfer(&self) -> bool {
        self.end_transfer
    }

    pub fn is_busy(&self) -> bool {
        self.control & CONTROL_BUSY != 0
    }

    /// Block register as read back: count in the high half, size in the low half
    pub fn block(&self) -> u32 {
        ((self.block_count & 0xFFFF) << 16) | (self.block_size & 0xFFFF)
    }

    /// Advances the data pointer by one word and consumes one unit of count
    pub(crate) fn advance(&mut self) {
        self.base_address = self.base_address.wrapping_add(4);
        self.block_count -= 1;
    }
}
