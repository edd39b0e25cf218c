#![allow(dead_code)]

use flashfat::constants::flash::FLASH_SIZE;
use flashfat::{Fat16, MemoryFlash};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// Cells for a blank 2 MiB part
pub fn blank_cells() -> Vec<u8> {
    vec![0xFF; FLASH_SIZE as usize]
}

/// Mounts (and formats) a volume over `cells`
pub fn mount(cells: &mut [u8]) -> Fat16<MemoryFlash<'_>> {
    Fat16::mount(MemoryFlash::with_contents(cells)).unwrap()
}

/// Reproducible pseudo-random payload
pub fn payload(len: usize, seed: u64) -> Vec<u8> {
    let mut data = vec![0u8; len];
    SmallRng::seed_from_u64(seed).fill_bytes(&mut data);
    data
}

/// Clusters of the chain starting at `first`, in order
pub fn chain(fs: &mut Fat16<MemoryFlash<'_>>, first: u16) -> Vec<u16> {
    let mut clusters = Vec::new();
    if first == 0 {
        return clusters;
    }
    let mut cluster = first;
    loop {
        clusters.push(cluster);
        match fs.next_in_chain(cluster).unwrap() {
            Some(next) => cluster = next,
            None => return clusters,
        }
    }
}
