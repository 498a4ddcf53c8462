use heapless::FnvIndexMap;
use log::{trace, warn};

const SSBUS_SLOTS: usize = 64;

/// IOP SSBUS / memory-control configuration words.
/// The boot ROM programs delays and base addresses here; nothing downstream
/// consumes them, so each word simply reads back what was last written.
#[derive(Default)]
pub struct SsbusRegisters {
    registers: FnvIndexMap<u32, u32, SSBUS_SLOTS>,
}

impl SsbusRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.registers.clear();
    }

    pub fn read(&self, addr: u32) -> u32 {
        self.registers.get(&addr).copied().unwrap_or(0)
    }

    pub fn write(&mut self, addr: u32, value: u32) {
        trace!("[Ssbus] {:08x} = {:08x}", addr, value);
        if self.registers.insert(addr, value).is_err() {
            warn!("[Ssbus] register table full, dropping {:08x} = {:08x}", addr, value);
        }
    }
}

#[cfg(test)]
mod ssbus_tests {
    use super::*;

    #[test]
    fn test_reads_back_last_write() {
        let mut ssbus = SsbusRegisters::new();
        assert_eq!(ssbus.read(0x1F80_1010), 0);
        ssbus.write(0x1F80_1010, 0x001F_0000);
        ssbus.write(0x1F80_1010, 0x0013_243F);
        assert_eq!(ssbus.read(0x1F80_1010), 0x0013_243F);

        ssbus.reset();
        assert_eq!(ssbus.read(0x1F80_1010), 0);
    }
}
