use super::store::{StoreArena, StoreId};
use crate::constants::{MAX_WINDOWS, PAGE_COUNT, PAGE_MASK, PAGE_SHIFT, PAGE_SIZE};
use crate::error::MemoryError;
use log::warn;

/// Access width as seen on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    Byte,
    Half,
    Word,
    Double,
}

impl Width {
    pub const fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Half => 2,
            Width::Word => 4,
            Width::Double => 8,
        }
    }
}

/// Integer types that can travel over the fast path or an MMIO handler.
/// Handlers always exchange 32-bit values; narrower accesses are truncated.
pub trait Primitive: Copy + Default + core::fmt::LowerHex {
    const WIDTH: Width;

    fn from_le_slice(bytes: &[u8]) -> Self;
    fn write_le_slice(self, out: &mut [u8]);
    fn from_bus(value: u32) -> Self;
    fn to_bus(self) -> u32;
}

macro_rules! impl_primitive {
    ($ty:ty, $width:expr) => {
        impl Primitive for $ty {
            const WIDTH: Width = $width;

            #[inline(always)]
            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; core::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_le_bytes(raw)
            }

            #[inline(always)]
            fn write_le_slice(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_le_bytes());
            }

            #[inline(always)]
            fn from_bus(value: u32) -> Self {
                value as $ty
            }

            #[inline(always)]
            fn to_bus(self) -> u32 {
                self as u32
            }
        }
    };
}

impl_primitive!(u8, Width::Byte);
impl_primitive!(u16, Width::Half);
impl_primitive!(u32, Width::Word);
impl_primitive!(u64, Width::Double);

/// Page-table entry: which store backs the page and where the page starts in it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef {
    base: u32,
    store: StoreId,
    writable: bool,
}

/// MMIO window routed to a handler target
#[derive(Debug, Clone, Copy)]
pub struct Window<H> {
    pub start: u32,
    pub end: u32,
    pub target: H,
}

/// Per-domain translation tables: direct pages first, handler windows second
pub struct AddressSpace<H> {
    name: &'static str,
    page_table: Vec<Option<PageRef>>,
    read_handlers: heapless::Vec<Window<H>, MAX_WINDOWS>,
    write_handlers: heapless::Vec<Window<H>, MAX_WINDOWS>,
}

impl<H: Copy> AddressSpace<H> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            page_table: vec![None; PAGE_COUNT],
            read_handlers: heapless::Vec::new(),
            write_handlers: heapless::Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Installs direct entries for every page of [start, end), each pointing
    /// at `store[page & mask]`
    pub fn register_region(
        &mut self,
        start: u32,
        end: u32,
        mask: u32,
        store: StoreId,
        stores: &StoreArena,
    ) -> Result<(), MemoryError> {
        if start & PAGE_MASK != 0 || end & PAGE_MASK != 0 || start >= end {
            return Err(MemoryError::UnalignedRegion { start, end });
        }

        let backing = stores.get(store);
        let fits = (start..end)
            .step_by(PAGE_SIZE as usize)
            .all(|page| ((page & mask) + PAGE_SIZE) as usize <= backing.len());
        if !fits {
            return Err(MemoryError::RegionOutOfBounds {
                start,
                end,
                store: backing.name(),
                size: backing.len(),
            });
        }

        if let Some(page) = (start..end)
            .step_by(PAGE_SIZE as usize)
            .find(|&page| self.page(page).is_some())
        {
            return Err(MemoryError::OverlappingRegion { start, end, page });
        }

        let writable = !backing.is_read_only();
        for page in (start..end).step_by(PAGE_SIZE as usize) {
            self.page_table[(page >> PAGE_SHIFT) as usize] = Some(PageRef {
                base: page & mask,
                store,
                writable,
            });
        }
        Ok(())
    }

    pub fn register_read_handler(&mut self, start: u32, end: u32, target: H) -> Result<(), MemoryError> {
        insert_window(&mut self.read_handlers, start, end, target)
    }

    pub fn register_write_handler(&mut self, start: u32, end: u32, target: H) -> Result<(), MemoryError> {
        insert_window(&mut self.write_handlers, start, end, target)
    }

    #[inline(always)]
    pub fn page(&self, addr: u32) -> Option<PageRef> {
        self.page_table[(addr >> PAGE_SHIFT) as usize]
    }

    pub fn read_target(&self, addr: u32) -> Option<H> {
        lookup_window(&self.read_handlers, addr)
    }

    pub fn write_target(&self, addr: u32) -> Option<H> {
        lookup_window(&self.write_handlers, addr)
    }

    /// Fast path read; None when no page backs the address
    #[inline(always)]
    pub fn read<T: Primitive>(&self, stores: &StoreArena, addr: u32) -> Option<T> {
        let page = self.page(addr)?;
        let offset = (page.base + (addr & PAGE_MASK)) as usize;
        stores
            .get(page.store)
            .slice(offset..offset + T::WIDTH.bytes())
            .map(T::from_le_slice)
    }

    /// Fast path write; false when no page backs the address.
    /// Writes landing on a read-only page are consumed and dropped.
    #[inline(always)]
    pub fn write<T: Primitive>(&self, stores: &mut StoreArena, addr: u32, value: T) -> bool {
        let page = match self.page(addr) {
            Some(page) => page,
            None => return false,
        };

        if !page.writable {
            warn!(
                "[{}] write to read-only {} dropped (0x{:08x} = 0x{:x})",
                self.name,
                stores.get(page.store).name(),
                addr,
                value
            );
            return true;
        }

        let offset = (page.base + (addr & PAGE_MASK)) as usize;
        if let Some(out) = stores
            .get_mut(page.store)
            .slice_mut(offset..offset + T::WIDTH.bytes())
        {
            value.write_le_slice(out);
        }
        true
    }
}

fn insert_window<H: Copy>(
    windows: &mut heapless::Vec<Window<H>, MAX_WINDOWS>,
    start: u32,
    end: u32,
    target: H,
) -> Result<(), MemoryError> {
    if start >= end {
        return Err(MemoryError::EmptyWindow { start, end });
    }
    if windows.iter().any(|w| w.start < end && start < w.end) {
        return Err(MemoryError::OverlappingWindow { start, end });
    }
    windows
        .push(Window { start, end, target })
        .map_err(|_| MemoryError::WindowTableFull(MAX_WINDOWS))?;

    // Kept sorted so lookups can binary search
    windows.sort_unstable_by_key(|w| w.start);
    Ok(())
}

#[inline]
fn lookup_window<H: Copy>(windows: &[Window<H>], addr: u32) -> Option<H> {
    let idx = windows.partition_point(|w| w.start <= addr);
    if idx == 0 {
        return None;
    }
    let window = &windows[idx - 1];
    if addr < window.end {
        Some(window.target)
    } else {
        None
    }
}
