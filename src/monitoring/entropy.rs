//! Shannon entropy of file content.
//!
//! Plain text sits around 3-5 bits per byte. Encrypted or compressed output sits
//! close to the 8.0 maximum, which is what a file rewritten by ransomware looks like.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes read from the head of a file for sampling.
pub const SAMPLE_BYTES: usize = 4096;

/// Entropy above which content is treated as ciphertext.
pub const HIGH_ENTROPY_THRESHOLD: f64 = 7.5;

/// Shannon entropy in bits per byte, in `[0.0, 8.0]`. Empty input is `0.0`.
pub fn entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut frequency = [0u64; 256];
    for &byte in data {
        frequency[byte as usize] += 1;
    }

    let len = data.len() as f64;
    let mut entropy = 0.0;
    for &count in &frequency {
        if count > 0 {
            let p = count as f64 / len;
            entropy -= p * p.log2();
        }
    }
    entropy
}

/// Reads at most [`SAMPLE_BYTES`] from the start of a regular file.
pub fn read_sample(path: &Path) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    if !file.metadata()?.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        ));
    }

    let mut sample = Vec::with_capacity(SAMPLE_BYTES);
    file.take(SAMPLE_BYTES as u64).read_to_end(&mut sample)?;
    Ok(sample)
}

pub fn sample_entropy(path: &Path) -> io::Result<f64> {
    read_sample(path).map(|sample| entropy(&sample))
}

/// Whether the head of `path` looks encrypted. Unreadable files are reported as
/// not high-entropy.
pub fn is_high_entropy(path: &Path) -> bool {
    match sample_entropy(path) {
        Ok(value) => value > HIGH_ENTROPY_THRESHOLD,
        Err(e) => {
            log::debug!("Entropy sample skipped for {}: {}", path.display(), e);
            false
        }
    }
}
