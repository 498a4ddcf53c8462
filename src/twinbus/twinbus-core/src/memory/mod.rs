pub mod io;
pub mod periph;
mod rdram;
pub mod rom;
pub mod space;
mod ssbus;
pub mod store;

pub use io::{Access, IoTarget};
pub use rdram::RdramController;
pub use rom::BiosImage;
pub use space::{AddressSpace, Primitive, Width};
pub use ssbus::SsbusRegisters;
pub use store::{BackingStore, StoreArena, StoreId};

use crate::constants::address_space::*;
use crate::error::MemoryError;
use crate::utils::in_range;
use core::fmt;
use log::{debug, warn};

/// One of the two CPU execution contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Ee,
    Iop,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Ee => write!(f, "EE"),
            Domain::Iop => write!(f, "IOP"),
        }
    }
}

/// Owns the backing stores and both domains' translation tables
pub struct Memory {
    stores: StoreArena,
    ee: AddressSpace<IoTarget>,
    iop: AddressSpace<IoTarget>,
    rdram: StoreId,
    iop_ram: StoreId,
    bios: StoreId,
    scratchpad: StoreId,
}

impl Memory {
    /// Allocates every store, loads the boot ROM and maps both address spaces
    pub fn new(bios: &BiosImage) -> Result<Self, MemoryError> {
        let mut stores = StoreArena::new();
        let rdram = stores.allocate(BackingStore::new("rdram", RDRAM_SIZE as usize, false));
        let iop_ram = stores.allocate(BackingStore::new("iop_ram", IOP_RAM_SIZE as usize, false));
        let bios_id = stores.allocate(BackingStore::new("bios", BIOS_SIZE as usize, true));
        let scratchpad =
            stores.allocate(BackingStore::new("scratchpad", SCRATCHPAD_SIZE as usize, false));

        let mut memory = Self {
            stores,
            ee: AddressSpace::new("EE"),
            iop: AddressSpace::new("IOP"),
            rdram,
            iop_ram,
            bios: bios_id,
            scratchpad,
        };

        memory.load_bios(bios);
        memory.map_regions()?;
        Ok(memory)
    }

    fn map_regions(&mut self) -> Result<(), MemoryError> {
        let (rdram, iop_ram, bios, scratchpad) = (self.rdram, self.iop_ram, self.bios, self.scratchpad);

        self.register_region(Domain::Ee, RDRAM_BASE, RDRAM_BASE + RDRAM_SIZE, RDRAM_MASK, rdram)?;
        self.register_region(
            Domain::Ee,
            EE_IOP_RAM_BASE,
            EE_IOP_RAM_BASE + IOP_RAM_SIZE,
            IOP_RAM_MASK,
            iop_ram,
        )?;
        self.register_region(Domain::Ee, BIOS_BASE, BIOS_BASE + BIOS_SIZE, BIOS_MASK, bios)?;
        self.register_region(
            Domain::Ee,
            SCRATCHPAD_BASE,
            SCRATCHPAD_BASE + SCRATCHPAD_SIZE,
            SCRATCHPAD_MASK,
            scratchpad,
        )?;

        self.register_region(Domain::Iop, BIOS_BASE, BIOS_BASE + BIOS_SIZE, BIOS_MASK, bios)?;
        self.register_region(Domain::Iop, IOP_RAM_BASE, IOP_RAM_BASE + IOP_RAM_SIZE, IOP_RAM_MASK, iop_ram)?;

        io::map_ee_windows(&mut self.ee)?;
        io::map_iop_windows(&mut self.iop)?;
        debug!("[Memory] address spaces mapped");
        Ok(())
    }

    /// Clears RAM and scratchpad; the boot ROM and the tables are kept
    pub fn reset(&mut self) {
        self.stores.get_mut(self.rdram).clear();
        self.stores.get_mut(self.iop_ram).clear();
        self.stores.get_mut(self.scratchpad).clear();
    }

    pub fn load_bios(&mut self, image: &BiosImage) {
        self.stores
            .get_mut(self.bios)
            .bytes_mut()
            .copy_from_slice(image.bytes());
    }

    pub fn register_region(
        &mut self,
        domain: Domain,
        start: u32,
        end: u32,
        mask: u32,
        store: StoreId,
    ) -> Result<(), MemoryError> {
        match domain {
            Domain::Ee => self.ee.register_region(start, end, mask, store, &self.stores),
            Domain::Iop => self.iop.register_region(start, end, mask, store, &self.stores),
        }
    }

    pub fn register_read_handler(
        &mut self,
        domain: Domain,
        start: u32,
        end: u32,
        target: IoTarget,
    ) -> Result<(), MemoryError> {
        self.space_mut(domain).register_read_handler(start, end, target)
    }

    pub fn register_write_handler(
        &mut self,
        domain: Domain,
        start: u32,
        end: u32,
        target: IoTarget,
    ) -> Result<(), MemoryError> {
        self.space_mut(domain).register_write_handler(start, end, target)
    }

    pub fn space(&self, domain: Domain) -> &AddressSpace<IoTarget> {
        match domain {
            Domain::Ee => &self.ee,
            Domain::Iop => &self.iop,
        }
    }

    fn space_mut(&mut self, domain: Domain) -> &mut AddressSpace<IoTarget> {
        match domain {
            Domain::Ee => &mut self.ee,
            Domain::Iop => &mut self.iop,
        }
    }

    pub fn scratchpad(&self) -> &[u8] {
        self.stores.get(self.scratchpad).bytes()
    }

    /// EE translation: the scratchpad is only reachable through its virtual
    /// window, so it is kept out of the physical alias
    #[inline(always)]
    pub fn translate_ee(vaddr: u32) -> u32 {
        if in_range(SCRATCHPAD_BASE, SCRATCHPAD_BASE + SCRATCHPAD_SIZE, vaddr) {
            vaddr
        } else if in_range(UNCACHED_ACCELERATED_START, UNCACHED_ACCELERATED_END, vaddr) {
            vaddr & UNCACHED_ACCELERATED_MASK
        } else {
            vaddr & PHYSICAL_MASK
        }
    }

    #[inline(always)]
    pub fn translate_iop(vaddr: u32) -> u32 {
        vaddr & PHYSICAL_MASK
    }

    #[inline(always)]
    pub fn translate(domain: Domain, vaddr: u32) -> u32 {
        match domain {
            Domain::Ee => Self::translate_ee(vaddr),
            Domain::Iop => Self::translate_iop(vaddr),
        }
    }

    /// Whether instruction fetch at `vaddr` lands in RAM or the boot ROM
    pub fn valid_code_region(domain: Domain, vaddr: u32) -> bool {
        let addr = Self::translate(domain, vaddr);
        let in_bios = in_range(BIOS_BASE, BIOS_BASE + BIOS_SIZE, addr);
        match domain {
            Domain::Ee => in_range(RDRAM_BASE, RDRAM_BASE + RDRAM_SIZE, addr) || in_bios,
            Domain::Iop => in_range(IOP_RAM_BASE, IOP_RAM_BASE + IOP_RAM_SIZE, addr) || in_bios,
        }
    }

    pub fn valid_ee_code_region(vaddr: u32) -> bool {
        Self::valid_code_region(Domain::Ee, vaddr)
    }

    pub fn valid_iop_code_region(vaddr: u32) -> bool {
        Self::valid_code_region(Domain::Iop, vaddr)
    }

    /// Fast path read of an already translated address
    #[inline(always)]
    pub fn read_direct<T: Primitive>(&self, domain: Domain, addr: u32) -> Option<T> {
        self.space(domain).read(&self.stores, addr)
    }

    /// Fast path write of an already translated address
    #[inline(always)]
    pub fn write_direct<T: Primitive>(&mut self, domain: Domain, addr: u32, value: T) -> bool {
        match domain {
            Domain::Ee => self.ee.write(&mut self.stores, addr, value),
            Domain::Iop => self.iop.write(&mut self.stores, addr, value),
        }
    }

    /// IOP word read on behalf of a DMA channel; DMA never touches MMIO
    pub fn iop_dma_read(&self, addr: u32) -> u32 {
        let addr = Self::translate_iop(addr);
        match self.read_direct::<u32>(Domain::Iop, addr) {
            Some(value) => value,
            None => {
                warn!("[Memory] IOP DMA read from unbacked address {:08x}", addr);
                0
            }
        }
    }

    /// IOP word write on behalf of a DMA channel
    pub fn iop_dma_write(&mut self, addr: u32, value: u32) {
        let addr = Self::translate_iop(addr);
        if !self.write_direct(Domain::Iop, addr, value) {
            warn!(
                "[Memory] IOP DMA write to unbacked address {:08x} = {:08x}",
                addr, value
            );
        }
    }
}
