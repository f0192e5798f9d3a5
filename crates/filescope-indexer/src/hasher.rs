//! Content fingerprints for change detection
//!
//! Only the first [`FINGERPRINT_BYTES`] of a file are hashed. Edits beyond
//! that point that keep the leading bytes intact are invisible to the
//! fingerprint; the modification time check still catches most of them.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Number of leading bytes that contribute to a fingerprint (1 MiB)
pub const FINGERPRINT_BYTES: u64 = 1024 * 1024;

const CHUNK_SIZE: usize = 8192;

/// SHA-256 (lowercase hex) of the first 1 MiB of a file
pub fn fingerprint(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    fingerprint_reader(file)
}

/// SHA-256 (lowercase hex) of the first 1 MiB produced by `reader`
pub fn fingerprint_reader<R: Read>(reader: R) -> io::Result<String> {
    let mut reader = reader.take(FINGERPRINT_BYTES);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
