// Page granularity shared by both address spaces
pub const PAGE_SHIFT: u32 = 12;
pub const PAGE_SIZE: u32 = 1 << PAGE_SHIFT;
pub const PAGE_MASK: u32 = PAGE_SIZE - 1;
pub const PAGE_COUNT: usize = 1 << (32 - PAGE_SHIFT);

// Maximum number of MMIO windows per access direction
pub const MAX_WINDOWS: usize = 32;

pub mod address_space {
    // Physical alias masks
    pub const PHYSICAL_MASK: u32 = 0x1FFF_FFFF;
    pub const UNCACHED_ACCELERATED_MASK: u32 = 0x01FF_FFFF;

    // Main RAM (EE)
    pub const RDRAM_BASE: u32 = 0x0000_0000;
    pub const RDRAM_SIZE: u32 = 0x0200_0000;
    pub const RDRAM_MASK: u32 = RDRAM_SIZE - 1;

    // IOP RAM, visible to the EE at 0x1C000000
    pub const IOP_RAM_BASE: u32 = 0x0000_0000;
    pub const IOP_RAM_SIZE: u32 = 0x0020_0000;
    pub const IOP_RAM_MASK: u32 = IOP_RAM_SIZE - 1;
    pub const EE_IOP_RAM_BASE: u32 = 0x1C00_0000;

    // Boot ROM, identical in both domains
    pub const BIOS_BASE: u32 = 0x1FC0_0000;
    pub const BIOS_SIZE: u32 = 0x0040_0000;
    pub const BIOS_MASK: u32 = BIOS_SIZE - 1;

    // Scratchpad, only reachable through its virtual window
    pub const SCRATCHPAD_BASE: u32 = 0x7000_0000;
    pub const SCRATCHPAD_SIZE: u32 = 0x4000;
    pub const SCRATCHPAD_MASK: u32 = SCRATCHPAD_SIZE - 1;

    // Uncached accelerated mirror of main RAM
    pub const UNCACHED_ACCELERATED_START: u32 = 0x3010_0000;
    pub const UNCACHED_ACCELERATED_END: u32 = 0x3200_0000;
}

pub mod ee_io {
    // Whole I/O windows routed through the handler path
    pub const IO_START: u32 = 0x1000_0000;
    pub const IO_END: u32 = 0x1001_0000;
    pub const GS_PRIVILEGED_START: u32 = 0x1200_0000;
    pub const GS_PRIVILEGED_END: u32 = 0x1200_2000;

    pub const TIMERS_START: u32 = 0x1000_0000;
    pub const TIMERS_END: u32 = 0x1000_2000;

    pub const IPU_START: u32 = 0x1000_2000;
    pub const IPU_END: u32 = 0x1000_3000;
    pub const IPU_COMMAND: u32 = 0x1000_2000;
    pub const IPU_CONTROL: u32 = 0x1000_2010;

    pub const GIF_START: u32 = 0x1000_3000;
    pub const GIF_END: u32 = 0x1000_3800;
    pub const GIF_CTRL: u32 = 0x1000_3000;
    pub const GIF_STAT: u32 = 0x1000_3020;

    pub const VIF0_START: u32 = 0x1000_3800;
    pub const VIF0_END: u32 = 0x1000_3C00;
    pub const VIF0_FBRST: u32 = 0x1000_3810;
    pub const VIF0_ERR: u32 = 0x1000_3820;
    pub const VIF0_MARK: u32 = 0x1000_3830;

    pub const VIF1_START: u32 = 0x1000_3C00;
    pub const VIF1_END: u32 = 0x1000_4000;
    pub const VIF1_STAT: u32 = 0x1000_3C00;
    pub const VIF1_FBRST: u32 = 0x1000_3C10;

    pub const DMAC_CHANNELS_START: u32 = 0x1000_8000;
    pub const DMAC_CHANNELS_END: u32 = 0x1000_E000;
    pub const DMAC_CONTROL_START: u32 = 0x1000_E000;
    pub const DMAC_CONTROL_END: u32 = 0x1000_E070;
    pub const DMAC_CTRL: u32 = 0x1000_E000;
    pub const DMAC_STAT: u32 = 0x1000_E010;
    pub const DMAC_PCR: u32 = 0x1000_E020;
    pub const DMAC_SQWC: u32 = 0x1000_E030;
    pub const DMAC_ENABLE_START: u32 = 0x1000_F500;
    pub const DMAC_ENABLE_END: u32 = 0x1000_F600;
    pub const DMAC_ENABLER: u32 = 0x1000_F520;
    pub const DMAC_ENABLEW: u32 = 0x1000_F590;

    pub const INTC_START: u32 = 0x1000_F000;
    pub const INTC_END: u32 = 0x1000_F100;
    pub const INTC_STAT: u32 = 0x1000_F000;
    pub const INTC_MASK: u32 = 0x1000_F010;

    pub const MISC_START: u32 = 0x1000_F100;
    pub const MISC_END: u32 = 0x1000_F200;
    pub const MISC_F130: u32 = 0x1000_F130;
    pub const KPUTCHAR: u32 = 0x1000_F180;

    pub const SIF_START: u32 = 0x1000_F200;
    pub const SIF_END: u32 = 0x1000_F300;
    pub const SIF_MSCOM: u32 = 0x1000_F200;
    pub const SIF_SMCOM: u32 = 0x1000_F210;
    pub const SIF_MSFLAG: u32 = 0x1000_F220;
    pub const SIF_SMFLAG: u32 = 0x1000_F230;
    pub const SIF_CTRL: u32 = 0x1000_F240;
    pub const SIF_BD6: u32 = 0x1000_F260;

    pub const MCH_START: u32 = 0x1000_F400;
    pub const MCH_END: u32 = 0x1000_F500;
    pub const MCH_RICM: u32 = 0x1000_F430;
    pub const MCH_DRD: u32 = 0x1000_F440;
}

pub mod iop_io {
    pub const SIF_START: u32 = 0x1D00_0000;
    pub const SIF_END: u32 = 0x1D00_0070;
    pub const SIF_MSCOM: u32 = 0x1D00_0000;
    pub const SIF_SMCOM: u32 = 0x1D00_0010;
    pub const SIF_MSFLAG: u32 = 0x1D00_0020;
    pub const SIF_SMFLAG: u32 = 0x1D00_0030;
    pub const SIF_CTRL: u32 = 0x1D00_0040;
    pub const SIF_BD6: u32 = 0x1D00_0060;

    pub const EXPANSION_START: u32 = 0x1E00_0000;
    pub const EXPANSION_END: u32 = 0x1F00_0000;

    pub const CDVD_START: u32 = 0x1F40_2000;
    pub const CDVD_END: u32 = 0x1F40_2100;
    pub const CDVD_N_STATUS: u32 = 0x1F40_2005;

    pub const SSBUS_START: u32 = 0x1F80_1000;
    pub const SSBUS_END: u32 = 0x1F80_1064;
    pub const SSBUS2_START: u32 = 0x1F80_1400;
    pub const SSBUS2_END: u32 = 0x1F80_1424;
    pub const SSBUS3_START: u32 = 0x1F80_1450;
    pub const SSBUS3_END: u32 = 0x1F80_1454;
    pub const SSBUS4_START: u32 = 0x1F80_1560;
    pub const SSBUS4_END: u32 = 0x1F80_156C;
    pub const SSBUS5_START: u32 = 0x1F80_15F0;
    pub const SSBUS5_END: u32 = 0x1F80_15F4;

    pub const INTC_START: u32 = 0x1F80_1070;
    pub const INTC_END: u32 = 0x1F80_1080;

    pub const DMA_REGION1_START: u32 = 0x1F80_1080;
    pub const DMA_REGION1_END: u32 = 0x1F80_1100;
    pub const DMA_REGION2_START: u32 = 0x1F80_1500;
    pub const DMA_REGION2_END: u32 = 0x1F80_1560;
    pub const DMA_REGION3_START: u32 = 0x1F80_1570;
    pub const DMA_REGION3_END: u32 = 0x1F80_1580;

    pub const TIMERS_REGION1_START: u32 = 0x1F80_1100;
    pub const TIMERS_REGION1_END: u32 = 0x1F80_1130;
    pub const TIMERS_REGION2_START: u32 = 0x1F80_1480;
    pub const TIMERS_REGION2_END: u32 = 0x1F80_14B0;

    pub const SPU_START: u32 = 0x1F80_1C00;
    pub const SPU_END: u32 = 0x1F80_1E00;

    pub const POST_START: u32 = 0x1F80_2070;
    pub const POST_END: u32 = 0x1F80_2074;

    pub const SPU2_START: u32 = 0x1F90_0000;
    pub const SPU2_END: u32 = 0x1F90_0800;
}

pub mod iop_dma {
    pub const CHANNEL_COUNT: usize = 13;

    // Controller-wide registers
    pub const DPCR: u32 = 0x1F80_10F0;
    pub const DICR: u32 = 0x1F80_10F4;
    pub const DPCR2: u32 = 0x1F80_1570;
    pub const DICR2: u32 = 0x1F80_1574;
    pub const GLOBAL_ENABLE: u32 = 0x1F80_1578;
    pub const GLOBAL_INTERRUPT_CONTROL: u32 = 0x1F80_157C;

    pub const DPCR_RESET: u32 = 0x0777_7777;

    // Channel register offsets
    pub const CHANNEL_ADDRESS: u32 = 0x0;
    pub const CHANNEL_BLOCK: u32 = 0x4;
    pub const CHANNEL_BLOCK_COUNT: u32 = 0x6;
    pub const CHANNEL_CONTROL: u32 = 0x8;
    pub const CHANNEL_TAG_ADDRESS: u32 = 0xC;

    pub const ADDRESS_MASK: u32 = 0x00FF_FFFF;

    // Channels with transfer logic
    pub const CHANNEL_SPU2_CORE0: usize = 4;
    pub const CHANNEL_SPU2_CORE1: usize = 7;
    pub const CHANNEL_SIF0: usize = 9;
    pub const CHANNEL_SIF1: usize = 10;

    // Tag descriptor bits
    pub const TAG_IRQ: u32 = 1 << 30;
    pub const TAG_END: u32 = 1 << 31;
}
