use super::space::AddressSpace;
use crate::constants::{ee_io, iop_io};
use crate::error::MemoryError;

/// Outcome of an MMIO handler; `Unhandled` falls back to the default value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<T> {
    Handled(T),
    Unhandled,
}

/// Peripheral block an MMIO window routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoTarget {
    // EE
    EeTimers,
    Ipu,
    Gif,
    Vif0,
    Vif1,
    EeDmac,
    EeIntc,
    EeMisc,
    EeSif,
    Mch,
    Gs,

    // IOP
    IopSif,
    Expansion,
    Cdvd,
    Ssbus,
    IopIntc,
    IopDmac,
    IopTimers,
    Spu,
    Post,
    Spu2,
}

const EE_WINDOWS: &[(u32, u32, IoTarget)] = &[
    (ee_io::TIMERS_START, ee_io::TIMERS_END, IoTarget::EeTimers),
    (ee_io::IPU_START, ee_io::IPU_END, IoTarget::Ipu),
    (ee_io::GIF_START, ee_io::GIF_END, IoTarget::Gif),
    (ee_io::VIF0_START, ee_io::VIF0_END, IoTarget::Vif0),
    (ee_io::VIF1_START, ee_io::VIF1_END, IoTarget::Vif1),
    (ee_io::DMAC_CHANNELS_START, ee_io::DMAC_CHANNELS_END, IoTarget::EeDmac),
    (ee_io::DMAC_CONTROL_START, ee_io::DMAC_CONTROL_END, IoTarget::EeDmac),
    (ee_io::INTC_START, ee_io::INTC_END, IoTarget::EeIntc),
    (ee_io::MISC_START, ee_io::MISC_END, IoTarget::EeMisc),
    (ee_io::SIF_START, ee_io::SIF_END, IoTarget::EeSif),
    (ee_io::MCH_START, ee_io::MCH_END, IoTarget::Mch),
    (ee_io::DMAC_ENABLE_START, ee_io::DMAC_ENABLE_END, IoTarget::EeDmac),
    (ee_io::GS_PRIVILEGED_START, ee_io::GS_PRIVILEGED_END, IoTarget::Gs),
];

const IOP_WINDOWS: &[(u32, u32, IoTarget)] = &[
    (iop_io::SIF_START, iop_io::SIF_END, IoTarget::IopSif),
    (iop_io::EXPANSION_START, iop_io::EXPANSION_END, IoTarget::Expansion),
    (iop_io::CDVD_START, iop_io::CDVD_END, IoTarget::Cdvd),
    (iop_io::SSBUS_START, iop_io::SSBUS_END, IoTarget::Ssbus),
    (iop_io::INTC_START, iop_io::INTC_END, IoTarget::IopIntc),
    (iop_io::DMA_REGION1_START, iop_io::DMA_REGION1_END, IoTarget::IopDmac),
    (iop_io::TIMERS_REGION1_START, iop_io::TIMERS_REGION1_END, IoTarget::IopTimers),
    (iop_io::SSBUS2_START, iop_io::SSBUS2_END, IoTarget::Ssbus),
    (iop_io::SSBUS3_START, iop_io::SSBUS3_END, IoTarget::Ssbus),
    (iop_io::TIMERS_REGION2_START, iop_io::TIMERS_REGION2_END, IoTarget::IopTimers),
    (iop_io::DMA_REGION2_START, iop_io::DMA_REGION2_END, IoTarget::IopDmac),
    (iop_io::SSBUS4_START, iop_io::SSBUS4_END, IoTarget::Ssbus),
    (iop_io::DMA_REGION3_START, iop_io::DMA_REGION3_END, IoTarget::IopDmac),
    (iop_io::SSBUS5_START, iop_io::SSBUS5_END, IoTarget::Ssbus),
    (iop_io::SPU_START, iop_io::SPU_END, IoTarget::Spu),
    (iop_io::POST_START, iop_io::POST_END, IoTarget::Post),
    (iop_io::SPU2_START, iop_io::SPU2_END, IoTarget::Spu2),
];

fn map_windows(
    space: &mut AddressSpace<IoTarget>,
    windows: &[(u32, u32, IoTarget)],
) -> Result<(), MemoryError> {
    for &(start, end, target) in windows {
        space.register_read_handler(start, end, target)?;
        space.register_write_handler(start, end, target)?;
    }
    Ok(())
}

pub(crate) fn map_ee_windows(space: &mut AddressSpace<IoTarget>) -> Result<(), MemoryError> {
    map_windows(space, EE_WINDOWS)
}

pub(crate) fn map_iop_windows(space: &mut AddressSpace<IoTarget>) -> Result<(), MemoryError> {
    map_windows(space, IOP_WINDOWS)
}
