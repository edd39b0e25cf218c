#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod constants;
pub mod devices;
pub mod filesys;
pub mod logging;

pub use devices::flash::{FlashDevice, FlashError};
pub use filesys::block::MemoryFlash;
pub use filesys::fat16::{Fat16, FileHandle, FileInfo, SectorBuf, ShortName};
pub use filesys::sync::SharedVolume;
pub use filesys::{BlockDevice, FsError};

pub mod prelude {
    pub use crate::filesys::fat16::{DisplayName, FatTimestamp};
    pub use crate::{BlockDevice, Fat16, FileInfo, FlashDevice, FsError, ShortName};
}
