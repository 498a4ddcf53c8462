use crate::constants::{ee_io, iop_io};
use crate::memory::{Access, Domain};
use crate::utils::quad_to_words;
use log::trace;
use std::collections::VecDeque;

// SIF control bits
const CONTROL_EE_READY: u32 = 1 << 8;
const CONTROL_IOP_RESET_TRIGGER: u32 = 0xA0;
const CONTROL_IOP_TOGGLE: u32 = 0xF0;
const CONTROL_IOP_STATE: u32 = 0xF000;
const CONTROL_IOP_STATE_RESET: u32 = 0x2000;

/// Values that can be pushed into a SIF FIFO; wide values go in low word first
pub trait SifPayload {
    fn push_into(self, fifo: &mut VecDeque<u32>);
}

impl SifPayload for u32 {
    fn push_into(self, fifo: &mut VecDeque<u32>) {
        fifo.push_back(self);
    }
}

impl SifPayload for u64 {
    fn push_into(self, fifo: &mut VecDeque<u32>) {
        fifo.push_back(self as u32);
        fifo.push_back((self >> 32) as u32);
    }
}

impl SifPayload for u128 {
    fn push_into(self, fifo: &mut VecDeque<u32>) {
        fifo.extend(quad_to_words(self));
    }
}

/// EE/IOP bridge: two word FIFOs (SIF0 IOP->EE, SIF1 EE->IOP) and the handshake registers
#[derive(Debug, Default, Clone)]
pub struct Sif {
    control: u32,
    bd6: u32,
    mscom: u32,
    smcom: u32,
    msflag: u32,
    smflag: u32,
    sif0: VecDeque<u32>,
    sif1: VecDeque<u32>,
}

impl Sif {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.control = 0;
        self.bd6 = 0;
        self.mscom = 0;
        self.smcom = 0;
        self.msflag = 0;
        self.smflag = 0;
        self.sif0.clear();
        self.sif1.clear();
    }

    pub fn control(&self) -> u32 {
        self.control
    }

    pub fn bd6(&self) -> u32 {
        self.bd6
    }

    pub fn mscom(&self) -> u32 {
        self.mscom
    }

    pub fn smcom(&self) -> u32 {
        self.smcom
    }

    pub fn msflag(&self) -> u32 {
        self.msflag
    }

    pub fn smflag(&self) -> u32 {
        self.smflag
    }

    pub fn write_ee_control(&mut self, data: u32) {
        if data & CONTROL_EE_READY != 0 {
            self.control |= CONTROL_EE_READY;
        } else {
            self.control &= !CONTROL_EE_READY;
        }
    }

    pub fn write_iop_control(&mut self, data: u32) {
        if data & CONTROL_IOP_RESET_TRIGGER != 0 {
            self.control = (self.control & !CONTROL_IOP_STATE) | CONTROL_IOP_STATE_RESET;
        }

        let toggle = data & CONTROL_IOP_TOGGLE;
        if self.control & toggle != 0 {
            self.control &= !toggle;
        } else {
            self.control |= toggle;
        }
    }

    pub fn write_bd6(&mut self, data: u32) {
        self.bd6 = data;
    }

    /// Master-to-slave command word; only the EE may write it
    pub fn write_mscom(&mut self, side: Domain, data: u32) {
        match side {
            Domain::Ee => self.mscom = data,
            Domain::Iop => trace!("[Sif] IOP write to MSCOM ignored ({:08x})", data),
        }
    }

    /// Slave-to-master command word; only the IOP may write it
    pub fn write_smcom(&mut self, side: Domain, data: u32) {
        match side {
            Domain::Iop => self.smcom = data,
            Domain::Ee => trace!("[Sif] EE write to SMCOM ignored ({:08x})", data),
        }
    }

    pub fn set_msflag(&mut self, data: u32) {
        self.msflag |= data;
    }

    pub fn reset_msflag(&mut self, data: u32) {
        self.msflag &= !data;
    }

    pub fn set_smflag(&mut self, data: u32) {
        self.smflag |= data;
    }

    pub fn reset_smflag(&mut self, data: u32) {
        self.smflag &= !data;
    }

    pub fn write_sif0_fifo(&mut self, data: u32) {
        self.sif0.push_back(data);
    }

    pub fn write_sif1_fifo<P: SifPayload>(&mut self, data: P) {
        data.push_into(&mut self.sif1);
    }

    pub fn read_sif0_fifo(&mut self) -> u32 {
        pop(&mut self.sif0, "SIF0")
    }

    pub fn read_sif1_fifo(&mut self) -> u32 {
        pop(&mut self.sif1, "SIF1")
    }

    pub fn sif0_fifo_size(&self) -> usize {
        self.sif0.len()
    }

    pub fn sif1_fifo_size(&self) -> usize {
        self.sif1.len()
    }

    /// Register read through either domain's SIF window
    pub fn read_register(&self, side: Domain, addr: u32) -> Access<u32> {
        let value = match (side, addr) {
            (Domain::Ee, ee_io::SIF_MSCOM) | (Domain::Iop, iop_io::SIF_MSCOM) => self.mscom,
            (Domain::Ee, ee_io::SIF_SMCOM) | (Domain::Iop, iop_io::SIF_SMCOM) => self.smcom,
            (Domain::Ee, ee_io::SIF_MSFLAG) | (Domain::Iop, iop_io::SIF_MSFLAG) => self.msflag,
            (Domain::Ee, ee_io::SIF_SMFLAG) | (Domain::Iop, iop_io::SIF_SMFLAG) => self.smflag,
            (Domain::Ee, ee_io::SIF_CTRL) | (Domain::Iop, iop_io::SIF_CTRL) => self.control,
            (Domain::Ee, ee_io::SIF_BD6) | (Domain::Iop, iop_io::SIF_BD6) => self.bd6,
            _ => return Access::Unhandled,
        };
        Access::Handled(value)
    }

    /// Register write through either domain's SIF window.
    /// Each side sets the flag it owns and clears the flag the other side raised.
    pub fn write_register(&mut self, side: Domain, addr: u32, data: u32) -> Access<()> {
        trace!("[Sif] {} write {:08x} = {:08x}", side, addr, data);
        match (side, addr) {
            (Domain::Ee, ee_io::SIF_MSCOM) | (Domain::Iop, iop_io::SIF_MSCOM) => {
                self.write_mscom(side, data)
            }
            (Domain::Ee, ee_io::SIF_SMCOM) | (Domain::Iop, iop_io::SIF_SMCOM) => {
                self.write_smcom(side, data)
            }
            (Domain::Ee, ee_io::SIF_MSFLAG) => self.set_msflag(data),
            (Domain::Ee, ee_io::SIF_SMFLAG) => self.reset_smflag(data),
            (Domain::Iop, iop_io::SIF_MSFLAG) => self.reset_msflag(data),
            (Domain::Iop, iop_io::SIF_SMFLAG) => self.set_smflag(data),
            (Domain::Ee, ee_io::SIF_CTRL) => self.write_ee_control(data),
            (Domain::Iop, iop_io::SIF_CTRL) => self.write_iop_control(data),
            (Domain::Ee, ee_io::SIF_BD6) | (Domain::Iop, iop_io::SIF_BD6) => self.write_bd6(data),
            _ => return Access::Unhandled,
        }
        Access::Handled(())
    }
}

fn pop(fifo: &mut VecDeque<u32>, name: &str) -> u32 {
    match fifo.pop_front() {
        Some(word) => word,
        None => {
            debug_assert!(false, "{} FIFO read while empty", name);
            0
        }
    }
}

#[cfg(test)]
mod sif_tests {
    use super::*;

    #[test]
    fn test_fifos_drain_in_push_order() {
        let mut sif = Sif::new();
        sif.write_sif0_fifo(1);
        sif.write_sif0_fifo(2);
        sif.write_sif0_fifo(3);
        assert_eq!(sif.sif0_fifo_size(), 3);
        assert_eq!(sif.read_sif0_fifo(), 1);
        assert_eq!(sif.read_sif0_fifo(), 2);
        assert_eq!(sif.read_sif0_fifo(), 3);
        assert_eq!(sif.sif0_fifo_size(), 0);
    }

    #[test]
    fn test_wide_sif1_writes_low_word_first() {
        let mut sif = Sif::new();
        sif.write_sif1_fifo(0x2222_2222_1111_1111u64);
        sif.write_sif1_fifo(0x6666_6666_5555_5555_4444_4444_3333_3333u128);
        assert_eq!(sif.sif1_fifo_size(), 6);

        let words: Vec<u32> = (0..6).map(|_| sif.read_sif1_fifo()).collect();
        assert_eq!(
            words,
            vec![0x1111_1111, 0x2222_2222, 0x3333_3333, 0x4444_4444, 0x5555_5555, 0x6666_6666]
        );
    }

    #[test]
    #[should_panic(expected = "SIF1 FIFO read while empty")]
    #[cfg(debug_assertions)]
    fn test_empty_pop_fails_in_debug() {
        let mut sif = Sif::new();
        sif.read_sif1_fifo();
    }

    #[test]
    fn test_command_words_are_single_writer() {
        let mut sif = Sif::new();
        sif.write_mscom(Domain::Ee, 0x1234);
        sif.write_mscom(Domain::Iop, 0xFFFF);
        sif.write_smcom(Domain::Iop, 0x5678);
        sif.write_smcom(Domain::Ee, 0xFFFF);
        assert_eq!(sif.mscom(), 0x1234);
        assert_eq!(sif.smcom(), 0x5678);
    }

    #[test]
    fn test_flag_handshake() {
        let mut sif = Sif::new();

        sif.write_register(Domain::Ee, ee_io::SIF_MSFLAG, 0x1_0000);
        assert_eq!(sif.read_register(Domain::Iop, iop_io::SIF_MSFLAG), Access::Handled(0x1_0000));
        sif.write_register(Domain::Iop, iop_io::SIF_MSFLAG, 0x1_0000);
        assert_eq!(sif.msflag(), 0);

        sif.write_register(Domain::Iop, iop_io::SIF_SMFLAG, 0x5);
        assert_eq!(sif.read_register(Domain::Ee, ee_io::SIF_SMFLAG), Access::Handled(0x5));
        sif.write_register(Domain::Ee, ee_io::SIF_SMFLAG, 0x1);
        assert_eq!(sif.smflag(), 0x4);
    }

    #[test]
    fn test_control_handshake() {
        let mut sif = Sif::new();
        sif.write_ee_control(0x100);
        assert_eq!(sif.control(), 0x100);
        sif.write_ee_control(0);
        assert_eq!(sif.control(), 0);

        sif.write_iop_control(0xF0);
        assert_eq!(sif.control(), 0x2000 | 0xF0);
        sif.write_iop_control(0x10);
        assert_eq!(sif.control(), 0x2000 | 0xE0);

        sif.write_ee_control(0x100);
        sif.write_iop_control(0x40);
        assert_eq!(sif.control(), 0x2000 | 0x100 | 0xA0);
    }

    #[test]
    fn test_unknown_register_unhandled() {
        let mut sif = Sif::new();
        assert_eq!(sif.read_register(Domain::Ee, 0x1000_F250), Access::Unhandled);
        assert_eq!(sif.write_register(Domain::Iop, 0x1D00_0050, 1), Access::Unhandled);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut sif = Sif::new();
        sif.write_sif0_fifo(1);
        sif.write_sif1_fifo(2u32);
        sif.write_bd6(3);
        sif.reset();
        assert_eq!(sif.sif0_fifo_size(), 0);
        assert_eq!(sif.sif1_fifo_size(), 0);
        assert_eq!(sif.bd6(), 0);
    }
}
