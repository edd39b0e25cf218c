//! In-memory NOR flash implementation

use crate::constants::flash::{FLASH_ERASED_BYTE, FLASH_ERASE_SIZE};
use crate::devices::flash::{FlashDevice, FlashError};
use core::result::Result;

/// Flash part simulated over a caller-provided byte slice.
///
/// Follows NOR semantics: programming ANDs the new bytes into the cells,
/// so only an erase can bring bits back to 1.
pub struct MemoryFlash<'a> {
    /// Backing cells, one per flash byte
    cells: &'a mut [u8],

    /// Completed erase operations
    erase_count: usize,

    /// Completed program operations
    program_count: usize,
}

impl<'a> MemoryFlash<'a> {
    /// Creates a freshly erased part over `cells`
    pub fn new(cells: &'a mut [u8]) -> Self {
        cells.fill(FLASH_ERASED_BYTE);
        Self::with_contents(cells)
    }

    /// Creates a part that keeps whatever `cells` already holds,
    /// as after a power cycle
    pub fn with_contents(cells: &'a mut [u8]) -> Self {
        Self {
            cells,
            erase_count: 0,
            program_count: 0,
        }
    }

    pub fn erase_count(&self) -> usize {
        self.erase_count
    }

    pub fn program_count(&self) -> usize {
        self.program_count
    }

    /// Erases plus programs issued so far
    pub fn mutation_count(&self) -> usize {
        self.erase_count + self.program_count
    }

    /// Raw view of the cells
    pub fn contents(&self) -> &[u8] {
        &*self.cells
    }

    /// Raw mutable view of the cells, bypassing NOR rules
    pub fn contents_mut(&mut self) -> &mut [u8] {
        &mut *self.cells
    }

    /// Validates the range lies inside the part
    fn validate_range(&self, addr: u32, len: usize) -> Result<core::ops::Range<usize>, FlashError> {
        let start = addr as usize;
        let end = start.checked_add(len).ok_or(FlashError::OutOfBounds)?;
        if end > self.cells.len() {
            return Err(FlashError::OutOfBounds);
        }
        Ok(start..end)
    }
}

impl FlashDevice for MemoryFlash<'_> {
    fn capacity(&self) -> u32 {
        self.cells.len() as u32
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        let range = self.validate_range(addr, buf.len())?;
        buf.copy_from_slice(&self.cells[range]);
        Ok(())
    }

    fn program(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        let range = self.validate_range(addr, data.len())?;
        for (cell, &byte) in self.cells[range].iter_mut().zip(data) {
            *cell &= byte;
        }
        self.program_count += 1;
        Ok(())
    }

    fn erase_sector(&mut self, addr: u32) -> Result<(), FlashError> {
        if addr as usize % FLASH_ERASE_SIZE != 0 {
            return Err(FlashError::Misaligned);
        }
        let range = self.validate_range(addr, FLASH_ERASE_SIZE)?;
        self.cells[range].fill(FLASH_ERASED_BYTE);
        self.erase_count += 1;
        Ok(())
    }

    fn is_busy(&mut self) -> bool {
        false
    }

    fn system_reset(&mut self) -> ! {
        panic!("system reset requested by filesystem");
    }
}
