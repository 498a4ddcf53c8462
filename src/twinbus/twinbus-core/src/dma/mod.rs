mod channel;

pub use channel::{Channel, ChannelKind, CHANNEL_NAMES, CONTROL_BUSY};

use crate::constants::iop_dma::*;
use crate::latch::InterruptLatch;
use crate::memory::periph::{AudioPeriph, InterruptController, InterruptSource};
use crate::memory::Memory;
use crate::sif::Sif;
use crate::utils::round_up_quad;
use log::{debug, info, trace, warn};

// Channels 0..7 live in DPCR/DICR, 7..13 in DPCR2/DICR2
const CHANNELS_PER_BANK: usize = 7;

/// Collaborators a transfer step may touch
pub struct DmaBus<'a> {
    pub memory: &'a mut Memory,
    pub sif: &'a mut Sif,
    pub intc: &'a mut dyn InterruptController,
    pub spu2: &'a mut dyn AudioPeriph,
}

/// IOP DMA controller: 13 channels, two priority/enable words, two interrupt latches
pub struct IopDmac {
    channels: [Channel; CHANNEL_COUNT],
    dpcr: u32,
    dpcr2: u32,
    dicr: InterruptLatch,
    dicr2: InterruptLatch,
    global_enable: bool,
    global_interrupt_control: bool,
    cycles: u64,
}

impl Default for IopDmac {
    fn default() -> Self {
        Self::new()
    }
}

impl IopDmac {
    pub fn new() -> Self {
        let mut dmac = Self {
            channels: [Channel::default(); CHANNEL_COUNT],
            dpcr: 0,
            dpcr2: 0,
            dicr: InterruptLatch::new(),
            dicr2: InterruptLatch::new(),
            global_enable: false,
            global_interrupt_control: false,
            cycles: 0,
        };
        dmac.reset();
        dmac
    }

    pub fn reset(&mut self) {
        self.channels = [Channel::default(); CHANNEL_COUNT];
        self.dpcr = DPCR_RESET;
        self.dpcr2 = DPCR_RESET;
        self.dicr.reset();
        self.dicr2.reset();
        self.global_enable = false;
        self.global_interrupt_control = false;
        self.cycles = 0;
    }

    pub fn channel(&self, index: usize) -> &Channel {
        &self.channels[index]
    }

    pub fn dpcr(&self) -> u32 {
        self.dpcr
    }

    pub fn dpcr2(&self) -> u32 {
        self.dpcr2
    }

    pub fn dicr(&self) -> &InterruptLatch {
        &self.dicr
    }

    pub fn dicr2(&self) -> &InterruptLatch {
        &self.dicr2
    }

    pub fn global_enable(&self) -> bool {
        self.global_enable
    }

    pub fn global_interrupt_control(&self) -> bool {
        self.global_interrupt_control
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Maps the second address nibble to a channel: 0x8..0xF -> 0..7, 0x0..0x7 -> 7..15
    pub fn channel_index(addr: u32) -> usize {
        let slot = ((addr >> 4) & 0xF) as usize;
        if slot >= 8 {
            slot - 8
        } else {
            slot + CHANNELS_PER_BANK
        }
    }

    fn checked_index(addr: u32) -> usize {
        let index = Self::channel_index(addr);
        if index >= CHANNEL_COUNT {
            panic!(
                "IOP DMA access at {:08x} decodes to channel {}, only {} exist",
                addr, index, CHANNEL_COUNT
            );
        }
        index
    }

    /// DPCR enable bit for `index`
    pub fn channel_enabled(&self, index: usize) -> bool {
        let (word, slot) = if index < CHANNELS_PER_BANK {
            (self.dpcr, index)
        } else {
            (self.dpcr2, index - CHANNELS_PER_BANK)
        };
        (word >> (slot * 4 + 3)) & 1 != 0
    }

    /// Steps every running channel once, lowest index first
    pub fn run(&mut self, cycles: u32, bus: &mut DmaBus<'_>) {
        self.cycles += cycles as u64;

        for index in 0..CHANNEL_COUNT {
            if self.channel_enabled(index) && self.channels[index].is_busy() {
                self.step(index, bus);
            }
        }
    }

    fn step(&mut self, index: usize, bus: &mut DmaBus<'_>) {
        match ChannelKind::of(index) {
            ChannelKind::Audio(core) => self.audio_step(index, core, bus),
            ChannelKind::Sif0 => self.sif0_step(bus),
            ChannelKind::Sif1 => self.sif1_step(bus),
            ChannelKind::Unimplemented => {
                warn!("[IopDmac] {} transfers are not implemented", CHANNEL_NAMES[index]);
                self.end_transfer(index, bus);
            }
        }
    }

    // Chain mode on the SPU2 channels stays a flat counter
    fn audio_step(&mut self, index: usize, core: usize, bus: &mut DmaBus<'_>) {
        let channel = &mut self.channels[index];
        if channel.block_count > 0 {
            channel.block_count -= 1;
        }

        if channel.block_count == 0 {
            self.end_transfer(index, bus);
            bus.spu2.dma_complete(core);
        }
    }

    fn sif0_step(&mut self, bus: &mut DmaBus<'_>) {
        let channel = &mut self.channels[CHANNEL_SIF0];

        if channel.block_count > 0 {
            let data = bus.memory.iop_dma_read(channel.base_address);
            bus.sif.write_sif0_fifo(data);
            channel.advance();
        } else if channel.end_transfer {
            self.end_transfer(CHANNEL_SIF0, bus);
        } else {
            let tag = channel.tag_address;
            let lo = bus.memory.iop_dma_read(tag);
            let hi = bus.memory.iop_dma_read(tag.wrapping_add(4));

            channel.base_address = lo & ADDRESS_MASK;
            channel.block_count = round_up_quad(hi & ADDRESS_MASK);

            // The EE side expects the tag's upper quadword half ahead of the payload
            bus.sif.write_sif0_fifo(bus.memory.iop_dma_read(tag.wrapping_add(8)));
            bus.sif.write_sif0_fifo(bus.memory.iop_dma_read(tag.wrapping_add(12)));

            channel.tag_address = tag.wrapping_add(16);
            if lo & (TAG_IRQ | TAG_END) != 0 {
                channel.end_transfer = true;
            }

            debug!(
                "[IopDmac] SIF0 tag {:08x}: base {:08x} count {} end {}",
                tag, channel.base_address, channel.block_count, channel.end_transfer
            );
        }
    }

    fn sif1_step(&mut self, bus: &mut DmaBus<'_>) {
        let channel = &mut self.channels[CHANNEL_SIF1];

        if channel.block_count > 0 {
            if bus.sif.sif1_fifo_size() > 0 {
                let data = bus.sif.read_sif1_fifo();
                bus.memory.iop_dma_write(channel.base_address, data);
                channel.advance();
            }
        } else if channel.end_transfer {
            self.end_transfer(CHANNEL_SIF1, bus);
        } else if bus.sif.sif1_fifo_size() >= 4 {
            let lo = bus.sif.read_sif1_fifo();
            let hi = bus.sif.read_sif1_fifo();
            // Padding half of the 128-bit tag
            bus.sif.read_sif1_fifo();
            bus.sif.read_sif1_fifo();

            channel.base_address = lo & ADDRESS_MASK;
            channel.block_count = hi;
            if lo & (TAG_IRQ | TAG_END) != 0 {
                channel.end_transfer = true;
            }

            debug!(
                "[IopDmac] SIF1 tag: base {:08x} count {} end {}",
                channel.base_address, channel.block_count, channel.end_transfer
            );
        }
    }

    fn end_transfer(&mut self, index: usize, bus: &mut DmaBus<'_>) {
        let channel = &mut self.channels[index];
        channel.control &= !CONTROL_BUSY;
        channel.end_transfer = false;

        let (latch, bit) = if index < CHANNELS_PER_BANK {
            (&mut self.dicr, index)
        } else {
            (&mut self.dicr2, index - CHANNELS_PER_BANK)
        };
        latch.raise(bit);

        info!("[IopDmac] {} transfer ended", CHANNEL_NAMES[index]);
        if latch.pending() {
            bus.intc.request(InterruptSource::Dma);
        }
    }

    pub fn read_register(&self, addr: u32) -> u32 {
        match addr {
            DPCR => self.dpcr,
            DICR => self.dicr.read(),
            DPCR2 => self.dpcr2,
            DICR2 => self.dicr2.read(),
            GLOBAL_ENABLE => self.global_enable as u32,
            GLOBAL_INTERRUPT_CONTROL => self.global_interrupt_control as u32,
            _ => self.read_channel(addr),
        }
    }

    pub fn write_register(&mut self, addr: u32, data: u32) {
        trace!("[IopDmac] {:08x} = {:08x}", addr, data);
        match addr {
            DPCR => self.dpcr = data,
            DICR => self.dicr.write(data),
            DPCR2 => self.dpcr2 = data,
            DICR2 => self.dicr2.write(data),
            GLOBAL_ENABLE => self.global_enable = data & 1 != 0,
            GLOBAL_INTERRUPT_CONTROL => self.global_interrupt_control = data & 1 != 0,
            _ => self.write_channel(addr, data),
        }
    }

    pub fn read_channel(&self, addr: u32) -> u32 {
        let channel = &self.channels[Self::checked_index(addr)];
        match addr & 0xF {
            CHANNEL_ADDRESS => channel.base_address,
            CHANNEL_BLOCK => channel.block(),
            CHANNEL_BLOCK_COUNT => channel.block_count & 0xFFFF,
            CHANNEL_CONTROL => channel.control,
            CHANNEL_TAG_ADDRESS => channel.tag_address,
            offset => panic!("IOP DMA read of undefined channel register {:02x} ({:08x})", offset, addr),
        }
    }

    pub fn write_channel(&mut self, addr: u32, data: u32) {
        let index = Self::checked_index(addr);
        let channel = &mut self.channels[index];
        match addr & 0xF {
            CHANNEL_ADDRESS => channel.base_address = data & ADDRESS_MASK,
            CHANNEL_BLOCK => {
                channel.block_size = data & 0xFFFF;
                channel.block_count = data >> 16;
            }
            CHANNEL_BLOCK_COUNT => channel.block_count = data & 0xFFFF,
            CHANNEL_CONTROL => {
                let starting = !channel.is_busy() && data & CONTROL_BUSY != 0;
                channel.control = data;
                if starting {
                    channel.end_transfer = false;
                    info!(
                        "[IopDmac] {} transfer started (base {:08x} size {} count {} tag {:08x})",
                        CHANNEL_NAMES[index],
                        channel.base_address,
                        channel.block_size,
                        channel.block_count,
                        channel.tag_address
                    );
                }
            }
            CHANNEL_TAG_ADDRESS => channel.tag_address = data,
            offset => panic!("IOP DMA write of undefined channel register {:02x} ({:08x})", offset, addr),
        }
    }
}

#[cfg(test)]
mod dma_tests {
    use super::*;
    use crate::memory::Domain;
    use crate::testing::{memory, RecordingAudio, RecordingIntc};

    // Channel register bases
    const SIF0_BASE: u32 = 0x1F80_1520;
    const SIF1_BASE: u32 = 0x1F80_1530;
    const SPU2_CORE0_BASE: u32 = 0x1F80_10C0;
    const CDVD_BASE: u32 = 0x1F80_10B0;

    struct Rig {
        dmac: IopDmac,
        memory: Memory,
        sif: Sif,
        intc: RecordingIntc,
        spu2: RecordingAudio,
    }

    impl Rig {
        fn new() -> Self {
            let mut dmac = IopDmac::new();
            // Enable every channel in both banks
            dmac.write_register(DPCR, 0x0888_8888);
            dmac.write_register(DPCR2, 0x0888_8888);
            Self {
                dmac,
                memory: memory(),
                sif: Sif::new(),
                intc: RecordingIntc::default(),
                spu2: RecordingAudio::default(),
            }
        }

        fn run(&mut self) {
            let mut bus = DmaBus {
                memory: &mut self.memory,
                sif: &mut self.sif,
                intc: &mut self.intc,
                spu2: &mut self.spu2,
            };
            self.dmac.run(8, &mut bus);
        }

        fn poke(&mut self, addr: u32, value: u32) {
            assert!(self.memory.write_direct(Domain::Iop, addr, value));
        }

        fn peek(&self, addr: u32) -> u32 {
            self.memory.read_direct(Domain::Iop, addr).unwrap_or(0)
        }
    }

    #[test]
    fn test_channel_index_remap() {
        for slot in 0..16u32 {
            let expected = (if slot >= 8 { slot - 8 } else { slot + 7 }) as usize;
            assert_eq!(IopDmac::channel_index(0x1F80_1000 | (slot << 4)), expected);
        }
        assert_eq!(IopDmac::channel_index(SIF0_BASE), 9);
        assert_eq!(IopDmac::channel_index(SPU2_CORE0_BASE), 4);
    }

    #[test]
    fn test_reset_state() {
        let mut dmac = IopDmac::new();
        assert_eq!(dmac.read_register(DPCR), 0x0777_7777);
        assert_eq!(dmac.read_register(DPCR2), 0x0777_7777);
        assert!((0..CHANNEL_COUNT).all(|c| !dmac.channel_enabled(c)));

        dmac.write_register(SIF0_BASE, 0x1234);
        dmac.write_register(DICR, 1 << 23);
        dmac.write_register(GLOBAL_ENABLE, 1);
        dmac.reset();
        let once = (dmac.dpcr(), dmac.dpcr2(), *dmac.dicr(), *dmac.dicr2(), dmac.global_enable());
        let channels_once = dmac.channels;
        dmac.reset();
        assert_eq!(
            once,
            (dmac.dpcr(), dmac.dpcr2(), *dmac.dicr(), *dmac.dicr2(), dmac.global_enable())
        );
        assert_eq!(channels_once, dmac.channels);
        assert_eq!(dmac.channel(9).base_address(), 0);
    }

    #[test]
    fn test_dpcr_enable_bits() {
        let mut dmac = IopDmac::new();
        dmac.write_register(DPCR, 1 << (4 * 4 + 3));
        dmac.write_register(DPCR2, 1 << ((9 - 7) * 4 + 3));
        assert!(dmac.channel_enabled(4));
        assert!(dmac.channel_enabled(9));
        assert!(!dmac.channel_enabled(10));
        assert!(!dmac.channel_enabled(2));
    }

    #[test]
    fn test_channel_registers() {
        let mut dmac = IopDmac::new();
        dmac.write_register(SIF1_BASE, 0xFF12_3456);
        dmac.write_register(SIF1_BASE + 4, 0x0003_0010);
        dmac.write_register(SIF1_BASE + 0xC, 0x0000_8000);

        assert_eq!(dmac.read_register(SIF1_BASE), 0x0012_3456);
        assert_eq!(dmac.read_register(SIF1_BASE + 4), 0x0003_0010);
        assert_eq!(dmac.read_register(SIF1_BASE + 6), 3);
        assert_eq!(dmac.read_register(SIF1_BASE + 0xC), 0x8000);

        dmac.write_register(SIF1_BASE + 6, 7);
        assert_eq!(dmac.channel(10).block_count(), 7);
        assert_eq!(dmac.channel(10).block_size(), 0x10);
    }

    #[test]
    #[should_panic(expected = "undefined channel register")]
    fn test_undefined_offset_is_fatal() {
        let mut dmac = IopDmac::new();
        dmac.write_register(SIF0_BASE + 2, 0);
    }

    #[test]
    #[should_panic(expected = "only 13 exist")]
    fn test_channel_past_twelve_is_fatal() {
        let dmac = IopDmac::new();
        dmac.read_register(0x1F80_1060);
    }

    #[test]
    fn test_disabled_channel_does_not_run() {
        let mut rig = Rig::new();
        rig.dmac.write_register(DPCR2, 0);
        rig.dmac.write_register(SIF0_BASE + 8, CONTROL_BUSY);
        rig.run();
        assert!(rig.dmac.channel(9).is_busy());
        assert_eq!(rig.sif.sif0_fifo_size(), 0);
    }

    #[test]
    fn test_sif0_tag_chain() {
        let mut rig = Rig::new();
        let tag = 0x2000;
        rig.poke(tag, 0x10);
        rig.poke(tag + 4, 2);
        rig.poke(tag + 8, 0xAAAA);
        rig.poke(tag + 12, 0xBBBB);
        for (i, word) in [0x11, 0x22, 0x33, 0x44].iter().enumerate() {
            rig.poke(0x10 + 4 * i as u32, *word);
        }
        rig.poke(tag + 16, 0x8000_0100);
        rig.poke(tag + 20, 1);
        rig.poke(0x100, 0x55);

        rig.dmac.write_register(SIF0_BASE + 0xC, tag);
        rig.dmac.write_register(SIF0_BASE + 8, CONTROL_BUSY);

        rig.run();
        let channel = *rig.dmac.channel(9);
        assert_eq!(channel.base_address(), 0x10);
        assert_eq!(channel.block_count(), 4);
        assert_eq!(channel.tag_address(), tag + 16);
        assert!(!channel.end_transfer());
        assert_eq!(rig.sif.read_sif0_fifo(), 0xAAAA);
        assert_eq!(rig.sif.read_sif0_fifo(), 0xBBBB);

        for _ in 0..4 {
            rig.run();
        }
        assert_eq!(rig.dmac.channel(9).block_count(), 0);
        let drained: Vec<u32> = (0..4).map(|_| rig.sif.read_sif0_fifo()).collect();
        assert_eq!(drained, vec![0x11, 0x22, 0x33, 0x44]);

        // Second tag carries the end bit
        rig.run();
        assert!(rig.dmac.channel(9).end_transfer());
        assert_eq!(rig.dmac.channel(9).block_count(), 4);
        for _ in 0..4 {
            rig.run();
        }
        assert!(rig.dmac.channel(9).is_busy());

        rig.run();
        assert!(!rig.dmac.channel(9).is_busy());
        assert!(!rig.dmac.channel(9).end_transfer());
        assert_eq!(rig.dmac.dicr2().flags(), 1 << 2);
    }

    #[test]
    fn test_sif1_inbound_tag() {
        let mut rig = Rig::new();
        rig.sif.write_sif1_fifo(0x1000u64 | (3u64 << 32));
        rig.sif.write_sif1_fifo(0xDEADu32);
        rig.sif.write_sif1_fifo(0xBEEFu32);
        rig.sif.write_sif1_fifo(0x0A0A_0A0Au32);
        rig.dmac.write_register(SIF1_BASE + 8, CONTROL_BUSY);

        rig.run();
        let channel = *rig.dmac.channel(10);
        assert_eq!(channel.base_address(), 0x1000);
        assert_eq!(channel.block_count(), 3);
        assert_eq!(rig.sif.sif1_fifo_size(), 1);

        rig.run();
        assert_eq!(rig.peek(0x1000), 0x0A0A_0A0A);
        assert_eq!(rig.dmac.channel(10).block_count(), 2);

        // Empty FIFO stalls the channel
        rig.run();
        assert_eq!(rig.dmac.channel(10).block_count(), 2);
        assert_eq!(rig.dmac.channel(10).base_address(), 0x1004);
    }

    #[test]
    fn test_sif1_waits_for_whole_tag() {
        let mut rig = Rig::new();
        rig.sif.write_sif1_fifo(0x1000u64 | (3u64 << 32));
        rig.sif.write_sif1_fifo(0u32);
        rig.dmac.write_register(SIF1_BASE + 8, CONTROL_BUSY);

        rig.run();
        assert_eq!(rig.sif.sif1_fifo_size(), 3);
        assert_eq!(rig.dmac.channel(10).block_count(), 0);

        rig.sif.write_sif1_fifo(0u32);
        rig.run();
        assert_eq!(rig.dmac.channel(10).block_count(), 3);
        assert_eq!(rig.sif.sif1_fifo_size(), 0);
    }

    #[test]
    fn test_sif1_end_bit_finishes_after_payload() {
        let mut rig = Rig::new();
        rig.sif.write_sif1_fifo(0x8000_0040u64 | (1u64 << 32));
        rig.sif.write_sif1_fifo(0u64);
        rig.sif.write_sif1_fifo(0x77u32);
        rig.dmac.write_register(SIF1_BASE + 8, CONTROL_BUSY);

        rig.run();
        rig.run();
        assert_eq!(rig.peek(0x40), 0x77);
        assert!(rig.dmac.channel(10).is_busy());

        rig.run();
        assert!(!rig.dmac.channel(10).is_busy());
        assert_eq!(rig.dmac.dicr2().flags(), 1 << 3);
    }

    #[test]
    fn test_sif0_irq_bit_ends_chain() {
        let mut rig = Rig::new();
        let tag = 0x3000;
        rig.poke(tag, 0x4000_0040);
        rig.poke(tag + 4, 1);
        rig.dmac.write_register(SIF0_BASE + 0xC, tag);
        rig.dmac.write_register(SIF0_BASE + 8, CONTROL_BUSY);

        rig.run();
        let channel = *rig.dmac.channel(9);
        assert!(channel.end_transfer());
        assert_eq!(channel.base_address(), 0x40);
        assert_eq!(channel.block_count(), 4);

        for _ in 0..4 {
            rig.run();
        }
        assert!(rig.dmac.channel(9).is_busy());

        rig.run();
        assert!(!rig.dmac.channel(9).is_busy());
        assert_eq!(rig.dmac.dicr2().flags(), 1 << 2);
    }

    #[test]
    fn test_sif1_irq_bit_ends_chain() {
        let mut rig = Rig::new();
        rig.sif.write_sif1_fifo(0x4000_0040u64 | (1u64 << 32));
        rig.sif.write_sif1_fifo(0u64);
        rig.sif.write_sif1_fifo(0x99u32);
        rig.dmac.write_register(SIF1_BASE + 8, CONTROL_BUSY);

        rig.run();
        assert!(rig.dmac.channel(10).end_transfer());
        assert_eq!(rig.dmac.channel(10).block_count(), 1);

        rig.run();
        assert_eq!(rig.peek(0x40), 0x99);
        assert!(rig.dmac.channel(10).is_busy());

        rig.run();
        assert!(!rig.dmac.channel(10).is_busy());
        assert_eq!(rig.dmac.dicr2().flags(), 1 << 3);
    }

    #[test]
    fn test_audio_channel_counts_down() {
        let mut rig = Rig::new();
        rig.dmac.write_register(SPU2_CORE0_BASE + 4, 0x0002_0010);
        rig.dmac.write_register(SPU2_CORE0_BASE + 8, CONTROL_BUSY);

        rig.run();
        assert_eq!(rig.dmac.channel(4).block_count(), 1);
        assert!(rig.spu2.completed.is_empty());

        rig.run();
        assert!(!rig.dmac.channel(4).is_busy());
        assert_eq!(rig.spu2.completed, vec![0]);
        assert_eq!(rig.dmac.dicr().flags(), 1 << 4);
    }

    #[test]
    fn test_end_transfer_interrupt_needs_mask() {
        let mut rig = Rig::new();
        rig.dmac.write_register(CDVD_BASE + 8, CONTROL_BUSY);
        rig.run();
        assert!(rig.intc.requests.is_empty());
        assert!(!rig.dmac.dicr().master_flag());

        rig.dmac.write_register(DICR, (1 << (16 + 3)) | (1 << 23));
        rig.dmac.write_register(CDVD_BASE + 8, CONTROL_BUSY);
        rig.run();
        assert_eq!(rig.intc.requests, vec![InterruptSource::Dma]);
        assert!(rig.dmac.dicr().master_flag());

        // Acknowledge
        rig.dmac.write_register(DICR, (1 << (16 + 3)) | (1 << 23) | (1 << (24 + 3)));
        assert_eq!(rig.dmac.dicr().flags(), 0);
        assert!(!rig.dmac.dicr().master_flag());
    }

    #[test]
    fn test_restart_while_busy_keeps_state() {
        let mut rig = Rig::new();
        rig.sif.write_sif1_fifo(0x8000_0000u64);
        rig.sif.write_sif1_fifo(0u64);
        rig.dmac.write_register(SIF1_BASE + 8, CONTROL_BUSY);
        rig.run();
        assert!(rig.dmac.channel(10).end_transfer());

        rig.dmac.write_register(SIF1_BASE + 8, CONTROL_BUSY | 0x200);
        assert!(rig.dmac.channel(10).end_transfer());
        assert_eq!(rig.dmac.read_register(SIF1_BASE + 8), CONTROL_BUSY | 0x200);
    }

    #[test]
    fn test_run_accumulates_cycles() {
        let mut rig = Rig::new();
        rig.run();
        rig.run();
        assert_eq!(rig.dmac.cycles(), 16);
    }
}
