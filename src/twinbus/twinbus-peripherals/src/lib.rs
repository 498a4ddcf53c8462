pub mod intc;
pub mod registers;
pub mod spu2;

#[cfg(feature = "channel-diagnostics")]
pub mod diagnostics;

pub use intc::IopIntc;
pub use registers::LatchBank;
pub use spu2::Spu2;
