pub mod console;
pub mod constants;
pub mod dma;
pub mod error;
pub mod latch;
pub mod memory;
pub mod sif;
pub mod system;
pub mod utils;

#[cfg(test)]
mod testing;

pub use error::MemoryError;
pub use system::{Peripherals, System};
