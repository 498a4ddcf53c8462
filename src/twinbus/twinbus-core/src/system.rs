use crate::console::Console;
use crate::constants::{ee_io, iop_io};
use crate::dma::{DmaBus, IopDmac};
use crate::error::MemoryError;
use crate::memory::periph::{
    AudioPeriph, DiagnosticSink, InterruptController, RegisterPeriph, UnhandledAccess,
};
use crate::memory::{
    Access, BiosImage, Domain, IoTarget, Memory, Primitive, RdramController, SsbusRegisters, Width,
};
use crate::sif::Sif;
use crate::utils::{in_range, quad_from_words, quad_to_words};
use log::{debug, trace};

/// Collaborators reached through MMIO dispatch, wired once at assembly
pub struct Peripherals<'a> {
    pub ee_timers: &'a mut dyn RegisterPeriph,
    pub ee_dmac: &'a mut dyn RegisterPeriph,
    pub ee_intc: &'a mut dyn RegisterPeriph,
    pub gs: &'a mut dyn RegisterPeriph,
    pub ipu: &'a mut dyn RegisterPeriph,
    pub gif: &'a mut dyn RegisterPeriph,
    pub vif0: &'a mut dyn RegisterPeriph,
    pub vif1: &'a mut dyn RegisterPeriph,
    pub iop_timers: &'a mut dyn RegisterPeriph,
    pub iop_intc: &'a mut dyn InterruptController,
    pub spu: &'a mut dyn RegisterPeriph,
    pub spu2: &'a mut dyn AudioPeriph,
    pub diagnostics: &'a mut dyn DiagnosticSink,
}

/// The memory and communication fabric between the EE and the IOP.
///
/// CPU interpreters call the `ee_*`/`iop_*` entry points with virtual
/// addresses. Each access is translated, served from a backing store when a
/// page maps it, and otherwise dispatched to the peripheral owning the MMIO
/// window. Anything left over reads as zero, drops the write, and is
/// reported to the diagnostic sink.
pub struct System<'a> {
    memory: Memory,
    sif: Sif,
    iop_dmac: IopDmac,
    mch: RdramController,
    ssbus: SsbusRegisters,
    console: Console,
    peripherals: Peripherals<'a>,
}

impl<'a> System<'a> {
    pub fn new(bios: &BiosImage, peripherals: Peripherals<'a>) -> Result<Self, MemoryError> {
        let system = Self {
            memory: Memory::new(bios)?,
            sif: Sif::new(),
            iop_dmac: IopDmac::new(),
            mch: RdramController::new(),
            ssbus: SsbusRegisters::new(),
            console: Console::new(),
            peripherals,
        };
        debug!("[System] assembled");
        Ok(system)
    }

    pub fn reset(&mut self) {
        self.memory.reset();
        self.sif.reset();
        self.iop_dmac.reset();
        self.mch.reset();
        self.ssbus.reset();
        self.console.flush();
    }

    /// Drives the IOP DMA controller for one scheduling quantum
    pub fn run(&mut self, cycles: u32) {
        let peripherals = &mut self.peripherals;
        let mut bus = DmaBus {
            memory: &mut self.memory,
            sif: &mut self.sif,
            intc: &mut *peripherals.iop_intc,
            spu2: &mut *peripherals.spu2,
        };
        self.iop_dmac.run(cycles, &mut bus);
    }

    /// Emits any partial console line
    pub fn flush_console(&mut self) {
        self.console.flush();
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn sif(&self) -> &Sif {
        &self.sif
    }

    pub fn sif_mut(&mut self) -> &mut Sif {
        &mut self.sif
    }

    pub fn iop_dmac(&self) -> &IopDmac {
        &self.iop_dmac
    }

    pub fn iop_dmac_mut(&mut self) -> &mut IopDmac {
        &mut self.iop_dmac
    }

    pub fn valid_ee_code_region(&self, vaddr: u32) -> bool {
        Memory::valid_ee_code_region(vaddr)
    }

    pub fn valid_iop_code_region(&self, vaddr: u32) -> bool {
        Memory::valid_iop_code_region(vaddr)
    }

    pub fn ee_read_byte(&mut self, vaddr: u32) -> u8 {
        self.ee_read(vaddr)
    }

    pub fn ee_read_half(&mut self, vaddr: u32) -> u16 {
        self.ee_read(vaddr)
    }

    pub fn ee_read_word(&mut self, vaddr: u32) -> u32 {
        self.ee_read(vaddr)
    }

    pub fn ee_read_double(&mut self, vaddr: u32) -> u64 {
        let lo = self.ee_read::<u32>(vaddr) as u64;
        let hi = self.ee_read::<u32>(vaddr.wrapping_add(4)) as u64;
        lo | (hi << 32)
    }

    pub fn ee_read_quad(&mut self, vaddr: u32) -> u128 {
        let mut words = [0u32; 4];
        for (i, word) in words.iter_mut().enumerate() {
            *word = self.ee_read(vaddr.wrapping_add(4 * i as u32));
        }
        quad_from_words(words)
    }

    pub fn ee_write_byte(&mut self, vaddr: u32, value: u8) {
        self.ee_write(vaddr, value)
    }

    pub fn ee_write_half(&mut self, vaddr: u32, value: u16) {
        self.ee_write(vaddr, value)
    }

    pub fn ee_write_word(&mut self, vaddr: u32, value: u32) {
        self.ee_write(vaddr, value)
    }

    pub fn ee_write_double(&mut self, vaddr: u32, value: u64) {
        self.ee_write(vaddr, value as u32);
        self.ee_write(vaddr.wrapping_add(4), (value >> 32) as u32);
    }

    pub fn ee_write_quad(&mut self, vaddr: u32, value: u128) {
        for (i, word) in quad_to_words(value).iter().enumerate() {
            self.ee_write(vaddr.wrapping_add(4 * i as u32), *word);
        }
    }

    pub fn iop_read_byte(&mut self, vaddr: u32) -> u8 {
        self.iop_read(vaddr)
    }

    pub fn iop_read_half(&mut self, vaddr: u32) -> u16 {
        self.iop_read(vaddr)
    }

    pub fn iop_read_word(&mut self, vaddr: u32) -> u32 {
        self.iop_read(vaddr)
    }

    pub fn iop_write_byte(&mut self, vaddr: u32, value: u8) {
        self.iop_write(vaddr, value)
    }

    pub fn iop_write_half(&mut self, vaddr: u32, value: u16) {
        self.iop_write(vaddr, value)
    }

    pub fn iop_write_word(&mut self, vaddr: u32, value: u32) {
        self.iop_write(vaddr, value)
    }

    #[inline(always)]
    fn ee_read<T: Primitive>(&mut self, vaddr: u32) -> T {
        let addr = Memory::translate_ee(vaddr);
        if let Some(value) = self.memory.read_direct(Domain::Ee, addr) {
            return value;
        }

        let access = match self.memory.space(Domain::Ee).read_target(addr) {
            Some(target) => self.ee_read_io(target, addr),
            None => Access::Unhandled,
        };
        self.finish_read(Domain::Ee, T::WIDTH, addr, access)
    }

    #[inline(always)]
    fn ee_write<T: Primitive>(&mut self, vaddr: u32, value: T) {
        let addr = Memory::translate_ee(vaddr);
        if self.memory.write_direct(Domain::Ee, addr, value) {
            return;
        }

        let access = match self.memory.space(Domain::Ee).write_target(addr) {
            Some(target) => self.ee_write_io(target, addr, value.to_bus()),
            None => Access::Unhandled,
        };
        self.finish_write(Domain::Ee, T::WIDTH, addr, value.to_bus(), access)
    }

    #[inline(always)]
    fn iop_read<T: Primitive>(&mut self, vaddr: u32) -> T {
        let addr = Memory::translate_iop(vaddr);
        if let Some(value) = self.memory.read_direct(Domain::Iop, addr) {
            return value;
        }

        let access = match self.memory.space(Domain::Iop).read_target(addr) {
            Some(target) => self.iop_read_io(target, T::WIDTH, addr),
            None => Access::Unhandled,
        };
        self.finish_read(Domain::Iop, T::WIDTH, addr, access)
    }

    #[inline(always)]
    fn iop_write<T: Primitive>(&mut self, vaddr: u32, value: T) {
        let addr = Memory::translate_iop(vaddr);
        if self.memory.write_direct(Domain::Iop, addr, value) {
            return;
        }

        let access = match self.memory.space(Domain::Iop).write_target(addr) {
            Some(target) => self.iop_write_io(target, T::WIDTH, addr, value.to_bus()),
            None => Access::Unhandled,
        };
        self.finish_write(Domain::Iop, T::WIDTH, addr, value.to_bus(), access)
    }

    fn finish_read<T: Primitive>(&mut self, domain: Domain, width: Width, addr: u32, access: Access<u32>) -> T {
        match access {
            Access::Handled(value) => T::from_bus(value),
            Access::Unhandled => {
                self.peripherals
                    .diagnostics
                    .unhandled(UnhandledAccess::read(domain, width, addr));
                T::default()
            }
        }
    }

    fn finish_write(&mut self, domain: Domain, width: Width, addr: u32, value: u32, access: Access<()>) {
        if let Access::Unhandled = access {
            self.peripherals
                .diagnostics
                .unhandled(UnhandledAccess::write(domain, width, addr, value));
        }
    }

    fn ee_read_io(&mut self, target: IoTarget, addr: u32) -> Access<u32> {
        let p = &mut self.peripherals;
        let value = match (target, addr) {
            (IoTarget::EeTimers, _) => p.ee_timers.read_register(addr),
            (IoTarget::Ipu, ee_io::IPU_CONTROL) => p.ipu.read_register(addr),
            (IoTarget::Gif, ee_io::GIF_STAT) => p.gif.read_register(addr),
            (IoTarget::EeDmac, _) if in_range(ee_io::DMAC_CHANNELS_START, ee_io::DMAC_CHANNELS_END, addr) => {
                p.ee_dmac.read_register(addr)
            }
            (IoTarget::EeDmac, ee_io::DMAC_CTRL)
            | (IoTarget::EeDmac, ee_io::DMAC_STAT)
            | (IoTarget::EeDmac, ee_io::DMAC_PCR)
            | (IoTarget::EeDmac, ee_io::DMAC_SQWC)
            | (IoTarget::EeDmac, ee_io::DMAC_ENABLER) => p.ee_dmac.read_register(addr),
            (IoTarget::EeIntc, ee_io::INTC_STAT) | (IoTarget::EeIntc, ee_io::INTC_MASK) => {
                p.ee_intc.read_register(addr)
            }
            (IoTarget::EeMisc, ee_io::MISC_F130) => 0,
            (IoTarget::EeSif, _) => return self.sif.read_register(Domain::Ee, addr),
            (IoTarget::Mch, ee_io::MCH_DRD) => self.mch.read_drd(),
            (IoTarget::Gs, _) => p.gs.read_register(addr),
            _ => return Access::Unhandled,
        };
        Access::Handled(value)
    }

    fn ee_write_io(&mut self, target: IoTarget, addr: u32, value: u32) -> Access<()> {
        let p = &mut self.peripherals;
        match (target, addr) {
            (IoTarget::EeTimers, _) => p.ee_timers.write_register(addr, value),
            (IoTarget::Gs, _) => p.gs.write_register(addr, value),
            (IoTarget::EeDmac, _) => p.ee_dmac.write_register(addr, value),
            (IoTarget::Ipu, ee_io::IPU_COMMAND) | (IoTarget::Ipu, ee_io::IPU_CONTROL) => {
                p.ipu.write_register(addr, value)
            }
            (IoTarget::Gif, ee_io::GIF_CTRL) => p.gif.write_register(addr, value),
            (IoTarget::Vif0, ee_io::VIF0_FBRST)
            | (IoTarget::Vif0, ee_io::VIF0_ERR)
            | (IoTarget::Vif0, ee_io::VIF0_MARK) => p.vif0.write_register(addr, value),
            (IoTarget::Vif1, ee_io::VIF1_STAT) | (IoTarget::Vif1, ee_io::VIF1_FBRST) => {
                p.vif1.write_register(addr, value)
            }
            (IoTarget::EeIntc, ee_io::INTC_STAT) | (IoTarget::EeIntc, ee_io::INTC_MASK) => {
                p.ee_intc.write_register(addr, value)
            }
            (IoTarget::EeMisc, ee_io::KPUTCHAR) => {
                self.console.put(value as u8);
            }
            (IoTarget::EeSif, _) => return self.sif.write_register(Domain::Ee, addr, value),
            (IoTarget::Mch, ee_io::MCH_RICM) => self.mch.write_ricm(value),
            (IoTarget::Mch, ee_io::MCH_DRD) => self.mch.write_drd(value),
            _ => return Access::Unhandled,
        }
        Access::Handled(())
    }

    fn iop_read_io(&mut self, target: IoTarget, width: Width, addr: u32) -> Access<u32> {
        let p = &mut self.peripherals;
        let value = match (target, width) {
            (IoTarget::IopDmac, Width::Word) => self.iop_dmac.read_register(addr),
            (IoTarget::IopTimers, Width::Half) | (IoTarget::IopTimers, Width::Word) => {
                p.iop_timers.read_register(addr)
            }
            (IoTarget::Expansion, _) => 0,
            (IoTarget::IopSif, Width::Word) => return self.sif.read_register(Domain::Iop, addr),
            (IoTarget::Ssbus, Width::Word) => self.ssbus.read(addr),
            (IoTarget::IopIntc, Width::Word) => match intc_offset(addr) {
                Some(offset) => p.iop_intc.read_register(offset),
                None => return Access::Unhandled,
            },
            (IoTarget::Cdvd, Width::Byte) if addr == iop_io::CDVD_N_STATUS => 0,
            (IoTarget::Spu, Width::Half) => 0,
            (IoTarget::Spu2, Width::Half) => p.spu2.read_register(addr) as u32,
            _ => return Access::Unhandled,
        };
        Access::Handled(value)
    }

    fn iop_write_io(&mut self, target: IoTarget, width: Width, addr: u32, value: u32) -> Access<()> {
        let p = &mut self.peripherals;
        match (target, width) {
            (IoTarget::IopDmac, Width::Half) | (IoTarget::IopDmac, Width::Word) => {
                self.iop_dmac.write_register(addr, value)
            }
            (IoTarget::IopTimers, Width::Half) | (IoTarget::IopTimers, Width::Word) => {
                p.iop_timers.write_register(addr, value)
            }
            (IoTarget::Spu, Width::Half) => p.spu.write_register(addr, value),
            (IoTarget::Spu2, Width::Half) => p.spu2.write_register(addr, value as u16),
            (IoTarget::IopSif, Width::Word) => {
                return self.sif.write_register(Domain::Iop, addr, value)
            }
            (IoTarget::Ssbus, Width::Word) => self.ssbus.write(addr, value),
            (IoTarget::IopIntc, Width::Word) => match intc_offset(addr) {
                Some(offset) => p.iop_intc.write_register(offset, value),
                None => return Access::Unhandled,
            },
            (IoTarget::Post, Width::Byte) | (IoTarget::Post, Width::Word) => {
                trace!("[Post] {:02x}", value & 0xFF)
            }
            _ => return Access::Unhandled,
        }
        Access::Handled(())
    }
}

// I_STAT, I_MASK, I_CTRL
fn intc_offset(addr: u32) -> Option<u32> {
    match addr - iop_io::INTC_START {
        offset @ (0x0 | 0x4 | 0x8) => Some(offset),
        _ => None,
    }
}
