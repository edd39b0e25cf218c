//! NOR flash collaborator interface.
//!
//! The raw part can only clear bits when programming; erase (one
//! `FLASH_ERASE_SIZE` unit at a time) is the only way back to 0xFF. The
//! helpers here wrap the raw driver calls with range checks and a bounded
//! busy-wait, and implement the read-modify-erase-write cycle needed to
//! persist a single sector.

use crate::constants::flash::{FLASH_BUSY_MAX_POLLS, FLASH_ERASE_SIZE};
use crate::constants::volume::SECTOR_SIZE;
use thiserror::Error;

#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum FlashError {
    #[error("Address out of bounds")]
    OutOfBounds,
    #[error("Address not aligned to the erase unit")]
    Misaligned,
    #[error("Flash device fault")]
    Device,
}

/// Raw flash driver, implemented by the chip driver (or a simulator).
pub trait FlashDevice {
    /// Number of addressable bytes
    fn capacity(&self) -> u32;

    /// Reads `buf.len()` bytes starting at `addr`.
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Starts programming `data` at `addr`.
    ///
    /// Only meaningful inside an already-erased region: programming can
    /// clear bits but never set them.
    fn program(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError>;

    /// Starts erasing the erase unit beginning at `addr`.
    fn erase_sector(&mut self, addr: u32) -> Result<(), FlashError>;

    /// Whether an erase or program is still in progress
    fn is_busy(&mut self) -> bool;

    /// Hard system reset, used when the part stops responding.
    fn system_reset(&mut self) -> !;
}

impl<F: FlashDevice + ?Sized> FlashDevice for &mut F {
    fn capacity(&self) -> u32 {
        (**self).capacity()
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        (**self).read(addr, buf)
    }

    fn program(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        (**self).program(addr, data)
    }

    fn erase_sector(&mut self, addr: u32) -> Result<(), FlashError> {
        (**self).erase_sector(addr)
    }

    fn is_busy(&mut self) -> bool {
        (**self).is_busy()
    }

    fn system_reset(&mut self) -> ! {
        (**self).system_reset()
    }
}

fn check_range<F: FlashDevice + ?Sized>(flash: &F, addr: u32, len: usize) -> Result<(), FlashError> {
    let end = u64::from(addr) + len as u64;
    if end > u64::from(flash.capacity()) {
        return Err(FlashError::OutOfBounds);
    }
    Ok(())
}

/// Polls the part until idle. A part that stays busy for
/// `FLASH_BUSY_MAX_POLLS` polls is treated as hung and the system is reset.
pub fn wait_ready<F: FlashDevice + ?Sized>(flash: &mut F) {
    for _ in 0..FLASH_BUSY_MAX_POLLS {
        if !flash.is_busy() {
            return;
        }
        core::hint::spin_loop();
    }
    log::error!("[FLASH] Busy after {} polls, resetting", FLASH_BUSY_MAX_POLLS);
    flash.system_reset()
}

/// Reads `buf.len()` bytes at `addr` once the part is idle.
pub fn read<F: FlashDevice + ?Sized>(
    flash: &mut F,
    addr: u32,
    buf: &mut [u8],
) -> Result<(), FlashError> {
    check_range(flash, addr, buf.len())?;
    wait_ready(flash);
    flash.read(addr, buf)
}

/// Programs `data` at `addr` and waits for completion.
pub fn program<F: FlashDevice + ?Sized>(
    flash: &mut F,
    addr: u32,
    data: &[u8],
) -> Result<(), FlashError> {
    check_range(flash, addr, data.len())?;
    if data.is_empty() {
        return Ok(());
    }
    flash.program(addr, data)?;
    wait_ready(flash);
    Ok(())
}

/// Erases the erase unit at `addr` and waits for completion.
pub fn erase<F: FlashDevice + ?Sized>(flash: &mut F, addr: u32) -> Result<(), FlashError> {
    if addr as usize % FLASH_ERASE_SIZE != 0 {
        return Err(FlashError::Misaligned);
    }
    check_range(flash, addr, FLASH_ERASE_SIZE)?;
    flash.erase_sector(addr)?;
    wait_ready(flash);
    Ok(())
}

/// Persists one sector at `addr`.
///
/// Identical content is left alone and content that only clears bits is
/// programmed in place. Anything else stages the surrounding erase unit in
/// `scratch`, patches it, erases and reprograms the whole unit.
pub fn rewrite_sector<F: FlashDevice + ?Sized>(
    flash: &mut F,
    addr: u32,
    data: &[u8; SECTOR_SIZE],
    scratch: &mut [u8; FLASH_ERASE_SIZE],
) -> Result<(), FlashError> {
    if addr as usize % SECTOR_SIZE != 0 {
        return Err(FlashError::Misaligned);
    }

    let mut current = [0u8; SECTOR_SIZE];
    read(flash, addr, &mut current)?;

    if current == *data {
        return Ok(());
    }

    let programmable = current.iter().zip(data.iter()).all(|(&c, &d)| c & d == d);
    if programmable {
        return program(flash, addr, data);
    }

    let block = addr & !(FLASH_ERASE_SIZE as u32 - 1);
    let offset = (addr - block) as usize;

    read(flash, block, scratch)?;
    scratch[offset..offset + SECTOR_SIZE].copy_from_slice(data);
    erase(flash, block)?;
    program(flash, block, scratch)
}
