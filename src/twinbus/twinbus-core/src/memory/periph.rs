use super::space::Width;
use super::Domain;
use core::fmt;
use log::warn;

/// Register block reached through MMIO dispatch (timers, GS, IPU, GIF, VIF, EE DMAC, ...)
pub trait RegisterPeriph {
    fn read_register(&mut self, addr: u32) -> u32;
    fn write_register(&mut self, addr: u32, value: u32);
}

/// IOP interrupt sources, numbered by their I_STAT bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InterruptSource {
    Vblank = 0,
    Gpu = 1,
    Cdvd = 2,
    Dma = 3,
    Timer0 = 4,
    Timer1 = 5,
    Timer2 = 6,
    Sio0 = 7,
    Sio1 = 8,
    Spu2 = 9,
    Pio = 10,
    VblankEnd = 11,
    Dvd = 12,
    Pcmcia = 13,
    Timer3 = 14,
    Timer4 = 15,
    Timer5 = 16,
    Sio2 = 17,
}

impl InterruptSource {
    pub fn bit(self) -> u32 {
        1 << self as u32
    }
}

/// Interrupt controller owned by a CPU domain
pub trait InterruptController {
    /// Assert an interrupt line
    fn request(&mut self, source: InterruptSource);

    /// Register access by offset from the controller base (0x0 stat, 0x4 mask, 0x8 ctrl)
    fn read_register(&mut self, offset: u32) -> u32;
    fn write_register(&mut self, offset: u32, value: u32);
}

/// Audio unit fed by the IOP DMA audio channels
pub trait AudioPeriph {
    fn read_register(&mut self, addr: u32) -> u16;
    fn write_register(&mut self, addr: u32, value: u16);

    /// Called when the DMA channel feeding `core` finishes a transfer
    fn dma_complete(&mut self, core: usize);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Read,
    Write,
}

/// An access that reached neither a page nor a handler willing to serve it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnhandledAccess {
    pub domain: Domain,
    pub kind: AccessKind,
    pub width: Width,
    pub address: u32,
    pub value: u32,
}

impl UnhandledAccess {
    pub fn read(domain: Domain, width: Width, address: u32) -> Self {
        Self {
            domain,
            kind: AccessKind::Read,
            width,
            address,
            value: 0,
        }
    }

    pub fn write(domain: Domain, width: Width, address: u32, value: u32) -> Self {
        Self {
            domain,
            kind: AccessKind::Write,
            width,
            address,
            value,
        }
    }
}

impl fmt::Display for UnhandledAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = match self.width {
            Width::Byte => "byte",
            Width::Half => "half",
            Width::Word => "word",
            Width::Double => "double",
        };
        match self.kind {
            AccessKind::Read => write!(f, "[{}] unhandled {} read 0x{:08x}", self.domain, width, self.address),
            AccessKind::Write => write!(
                f,
                "[{}] unhandled {} write 0x{:08x} = 0x{:08x}",
                self.domain, width, self.address, self.value
            ),
        }
    }
}

/// Receives unhandled-access notifications for development visibility
pub trait DiagnosticSink {
    fn unhandled(&mut self, access: UnhandledAccess);
}

/// Reports every unhandled access through the logger
#[derive(Default)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn unhandled(&mut self, access: UnhandledAccess) {
        warn!("{}", access);
    }
}

#[cfg(test)]
mod periph_tests {
    use super::*;

    #[test]
    fn test_unhandled_access_display() {
        let read = UnhandledAccess::read(Domain::Iop, Width::Word, 0x1F80_1234);
        assert_eq!(read.to_string(), "[IOP] unhandled word read 0x1f801234");

        let write = UnhandledAccess::write(Domain::Ee, Width::Half, 0x1000_F300, 0xBEEF);
        assert_eq!(
            write.to_string(),
            "[EE] unhandled half write 0x1000f300 = 0x0000beef"
        );
    }

    #[test]
    fn test_log_sink_accepts_reports() {
        let mut sink = LogDiagnostics;
        let sink: &mut dyn DiagnosticSink = &mut sink;
        sink.unhandled(UnhandledAccess::read(Domain::Ee, Width::Double, 0x1000_F300));
        sink.unhandled(UnhandledAccess::write(Domain::Iop, Width::Byte, 0x1F40_2004, 0x12));
    }

    #[test]
    fn test_interrupt_source_bits() {
        assert_eq!(InterruptSource::Vblank.bit(), 1);
        assert_eq!(InterruptSource::Dma.bit(), 1 << 3);
        assert_eq!(InterruptSource::Spu2.bit(), 1 << 9);
    }
}
