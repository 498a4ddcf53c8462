use log::trace;
use std::collections::HashMap;
use twinbus_core::memory::periph::RegisterPeriph;

/// Register block that latches every write and reads it back.
/// Stands in for peripherals whose behaviour lives outside the bus.
#[derive(Debug, Default, Clone)]
pub struct LatchBank {
    name: &'static str,
    registers: HashMap<u32, u32>,
    writes: u64,
}

impl LatchBank {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Total writes seen since construction
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn reset(&mut self) {
        self.registers.clear();
    }
}

impl RegisterPeriph for LatchBank {
    fn read_register(&mut self, addr: u32) -> u32 {
        self.registers.get(&addr).copied().unwrap_or(0)
    }

    fn write_register(&mut self, addr: u32, value: u32) {
        trace!("[{}] {:08x} = {:08x}", self.name, addr, value);
        self.writes += 1;
        self.registers.insert(addr, value);
    }
}

#[cfg(test)]
mod registers_tests {
    use super::*;

    #[test]
    fn test_latches_writes() {
        let mut bank = LatchBank::new("gs");
        assert_eq!(bank.read_register(0x1200_1000), 0);
        bank.write_register(0x1200_1000, 0x1234);
        bank.write_register(0x1200_1000, 0x5678);
        assert_eq!(bank.read_register(0x1200_1000), 0x5678);
        assert_eq!(bank.writes(), 2);

        bank.reset();
        assert_eq!(bank.read_register(0x1200_1000), 0);
        assert_eq!(bank.name(), "gs");
    }
}
