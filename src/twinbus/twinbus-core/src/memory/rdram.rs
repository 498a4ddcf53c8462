use log::trace;

// RICM command field values issued by the boot ROM
const COMMAND_SDEVID: u32 = 0x21;
const COMMAND_DEVID_23: u32 = 0x23;
const COMMAND_DEVID_24: u32 = 0x24;
const COMMAND_RDREG: u32 = 0x40;

// Two RDRAM devices answer the SDEVID enumeration
const RDRAM_DEVICES: u32 = 2;

/// Memory controller hub registers driving the boot ROM's RDRAM enumeration
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RdramController {
    ricm: u32,
    drd: u32,
    sdevid: u32,
}

impl RdramController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn command(value: u32) -> u32 {
        (value >> 16) & 0xFFF
    }

    fn subcommand(value: u32) -> u32 {
        (value >> 6) & 0xF
    }

    /// MCH_RICM write (0x1000F430)
    pub fn write_ricm(&mut self, value: u32) {
        if Self::command(value) == COMMAND_SDEVID
            && Self::subcommand(value) == 1
            && (self.drd >> 7) & 1 == 0
        {
            self.sdevid = 0;
        }
        self.ricm = value & !0x8000_0000;
        trace!("[Mch] ricm = {:08x}", self.ricm);
    }

    /// MCH_DRD write (0x1000F440)
    pub fn write_drd(&mut self, value: u32) {
        self.drd = value;
    }

    /// MCH_DRD read (0x1000F440): answers the command last issued through RICM
    pub fn read_drd(&mut self) -> u32 {
        if Self::subcommand(self.ricm) != 0 {
            return 0;
        }

        match Self::command(self.ricm) {
            COMMAND_SDEVID => {
                if self.sdevid < RDRAM_DEVICES {
                    self.sdevid += 1;
                    0x1F
                } else {
                    0
                }
            }
            COMMAND_DEVID_23 => 0x0D0D,
            COMMAND_DEVID_24 => 0x0090,
            COMMAND_RDREG => self.ricm & 0x1F,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod rdram_tests {
    use super::*;

    #[test]
    fn test_sdevid_enumerates_two_devices() {
        let mut mch = RdramController::new();
        mch.write_ricm(0x0021_0040);
        mch.write_ricm(0x0021_0000);

        assert_eq!(mch.read_drd(), 0x1F);
        assert_eq!(mch.read_drd(), 0x1F);
        assert_eq!(mch.read_drd(), 0);

        // Re-arming the enumeration restarts the count
        mch.write_ricm(0x0021_0040);
        mch.write_ricm(0x0021_0000);
        assert_eq!(mch.read_drd(), 0x1F);
    }

    #[test]
    fn test_rearm_blocked_by_drd_bit7() {
        let mut mch = RdramController::new();
        mch.write_ricm(0x0021_0040);
        mch.write_ricm(0x0021_0000);
        mch.read_drd();
        mch.read_drd();

        mch.write_drd(0x80);
        mch.write_ricm(0x0021_0040);
        mch.write_ricm(0x0021_0000);
        assert_eq!(mch.read_drd(), 0);
    }

    #[test]
    fn test_fixed_answers() {
        let mut mch = RdramController::new();
        mch.write_ricm(0x8023_0000);
        assert_eq!(mch.read_drd(), 0x0D0D);
        mch.write_ricm(0x0024_0000);
        assert_eq!(mch.read_drd(), 0x0090);
        mch.write_ricm(0x0040_0015);
        assert_eq!(mch.read_drd(), 0x15);
        // Non-zero subcommand answers nothing
        mch.write_ricm(0x0023_0080);
        assert_eq!(mch.read_drd(), 0);
    }
}
