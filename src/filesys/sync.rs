//! Serialized access for a volume shared between the USB transport and
//! application code.

use super::fat16::Fat16;
use super::FsError;
use crate::devices::flash::FlashDevice;
use spin::{Mutex, MutexGuard};

/// Lock attempts before a contended volume is reported busy
pub const LOCK_MAX_SPINS: usize = 100_000;

/// A volume behind a spinlock
pub struct SharedVolume<F: FlashDevice> {
    inner: Mutex<Fat16<F>>,
}

impl<F: FlashDevice> SharedVolume<F> {
    pub fn new(fs: Fat16<F>) -> Self {
        Self {
            inner: Mutex::new(fs),
        }
    }

    /// Takes the volume, giving up with `FsError::Busy` instead of spinning
    /// forever when another context holds it.
    pub fn lock(&self) -> Result<MutexGuard<'_, Fat16<F>>, FsError> {
        for _ in 0..LOCK_MAX_SPINS {
            if let Some(guard) = self.inner.try_lock() {
                return Ok(guard);
            }
            core::hint::spin_loop();
        }
        log::warn!("[FAT16] Volume busy after {} attempts", LOCK_MAX_SPINS);
        Err(FsError::Busy)
    }

    /// Runs `f` with exclusive access to the volume
    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut Fat16<F>) -> Result<R, FsError>,
    ) -> Result<R, FsError> {
        let mut fs = self.lock()?;
        f(&mut fs)
    }

    pub fn into_inner(self) -> Fat16<F> {
        self.inner.into_inner()
    }
}
