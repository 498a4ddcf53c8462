//! Recording stand-ins for the collaborators the bus calls out to

use crate::memory::periph::{
    AudioPeriph, DiagnosticSink, InterruptController, InterruptSource, RegisterPeriph,
    UnhandledAccess,
};
use crate::memory::{BiosImage, Memory};

pub fn memory() -> Memory {
    match Memory::new(&BiosImage::blank()) {
        Ok(memory) => memory,
        Err(err) => panic!("memory assembly failed: {}", err),
    }
}

#[derive(Default)]
pub struct RecordingIntc {
    pub requests: Vec<InterruptSource>,
    pub registers: [u32; 3],
}

impl InterruptController for RecordingIntc {
    fn request(&mut self, source: InterruptSource) {
        self.requests.push(source);
    }

    fn read_register(&mut self, offset: u32) -> u32 {
        self.registers[(offset as usize / 4) % 3]
    }

    fn write_register(&mut self, offset: u32, value: u32) {
        self.registers[(offset as usize / 4) % 3] = value;
    }
}

#[derive(Default)]
pub struct RecordingAudio {
    pub completed: Vec<usize>,
    pub writes: Vec<(u32, u16)>,
    pub read_value: u16,
}

impl AudioPeriph for RecordingAudio {
    fn read_register(&mut self, _addr: u32) -> u16 {
        self.read_value
    }

    fn write_register(&mut self, addr: u32, value: u16) {
        self.writes.push((addr, value));
    }

    fn dma_complete(&mut self, core: usize) {
        self.completed.push(core);
    }
}

#[derive(Default)]
pub struct RecordingPeriph {
    pub reads: Vec<u32>,
    pub writes: Vec<(u32, u32)>,
    pub read_value: u32,
}

impl RegisterPeriph for RecordingPeriph {
    fn read_register(&mut self, addr: u32) -> u32 {
        self.reads.push(addr);
        self.read_value
    }

    fn write_register(&mut self, addr: u32, value: u32) {
        self.writes.push((addr, value));
    }
}

#[derive(Default)]
pub struct RecordingDiagnostics {
    pub accesses: Vec<UnhandledAccess>,
}

impl DiagnosticSink for RecordingDiagnostics {
    fn unhandled(&mut self, access: UnhandledAccess) {
        self.accesses.push(access);
    }
}
