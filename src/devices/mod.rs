//! Hardware collaborators the filesystem is layered on.

pub mod flash;
