//! FAT16 file allocation table entry

use super::constants::{FAT_BAD_CLUSTER, FAT_END_OF_CHAIN, FAT_END_OF_CHAIN_MIN, FAT_FREE};
use crate::constants::volume::{CLUSTER_LIMIT, FIRST_CLUSTER};

/// Represents a 16-bit FAT entry pointing to the next cluster in a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatEntry {
    /// Cluster number or special value (0=free, >=0xFFF8=end)
    pub cluster: u16,
}

impl FatEntry {
    pub const FREE: Self = Self { cluster: FAT_FREE };
    pub const END_OF_CHAIN: Self = Self {
        cluster: FAT_END_OF_CHAIN,
    };

    /// Entry linking to `cluster`
    pub const fn link(cluster: u16) -> Self {
        Self { cluster }
    }

    /// Returns true if this entry marks the end of a cluster chain
    pub fn is_end_of_chain(&self) -> bool {
        self.cluster >= FAT_END_OF_CHAIN_MIN
    }

    /// Returns true if this cluster is unused/free
    pub fn is_free(&self) -> bool {
        self.cluster == FAT_FREE
    }

    pub fn is_bad(&self) -> bool {
        self.cluster == FAT_BAD_CLUSTER
    }

    /// The next cluster, if this entry links to an allocatable cluster
    pub fn next_cluster(&self) -> Option<u16> {
        is_data_cluster(self.cluster).then_some(self.cluster)
    }
}

/// Whether `cluster` indexes a cluster of the data region
pub fn is_data_cluster(cluster: u16) -> bool {
    (FIRST_CLUSTER..CLUSTER_LIMIT).contains(&cluster)
}
