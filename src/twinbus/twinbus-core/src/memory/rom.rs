use crate::constants::address_space::BIOS_SIZE;
use crate::error::MemoryError;
use log::debug;

/// Raw boot ROM contents, zero padded to the full ROM size
pub struct BiosImage {
    data: Vec<u8>,
}

impl BiosImage {
    /// Wraps a boot image supplied by the loader; shorter images are padded
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MemoryError> {
        let max = BIOS_SIZE as usize;
        if bytes.len() > max {
            return Err(MemoryError::BiosTooLarge {
                size: bytes.len(),
                max,
            });
        }

        let mut data = vec![0u8; max];
        data[..bytes.len()].copy_from_slice(bytes);
        debug!("[Rom] boot image accepted ({} bytes)", bytes.len());
        Ok(Self { data })
    }

    /// An all-zero ROM, for running without firmware
    pub fn blank() -> Self {
        Self {
            data: vec![0u8; BIOS_SIZE as usize],
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}
