use thiserror::Error;

/// Configuration errors raised while assembling an address space
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("region 0x{start:08x}..0x{end:08x} is not page aligned")]
    UnalignedRegion { start: u32, end: u32 },

    #[error("region 0x{start:08x}..0x{end:08x} does not fit inside store `{store}` ({size} bytes)")]
    RegionOutOfBounds {
        start: u32,
        end: u32,
        store: &'static str,
        size: usize,
    },

    #[error("region 0x{start:08x}..0x{end:08x} overlaps a mapped page at 0x{page:08x}")]
    OverlappingRegion { start: u32, end: u32, page: u32 },

    #[error("handler window 0x{start:08x}..0x{end:08x} overlaps an existing window")]
    OverlappingWindow { start: u32, end: u32 },

    #[error("handler window 0x{start:08x}..0x{end:08x} is empty")]
    EmptyWindow { start: u32, end: u32 },

    #[error("handler table is full ({0} windows)")]
    WindowTableFull(usize),

    #[error("boot ROM image is {size} bytes, at most {max} are supported")]
    BiosTooLarge { size: usize, max: usize },
}
