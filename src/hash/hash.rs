// Content fingerprinting
// Streams a file through a digest in fixed-size chunks

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use blake3::Hasher as Blake3Hasher;
use md5::Md5;
use sha2::{Digest, Sha256};

use crate::error::{Result, SyncError};

/// Files are read in chunks of this size, never buffered whole.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Trait for hash algorithm implementations
pub trait Hasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash and return the digest bytes
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

pub struct Md5Wrapper(Md5);

impl Hasher for Md5Wrapper {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Digest::finalize(self.0).to_vec()
    }
}

pub struct Sha256Wrapper(Sha256);

impl Hasher for Sha256Wrapper {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Digest::finalize(self.0).to_vec()
    }
}

pub struct Blake3Wrapper(Blake3Hasher);

impl Hasher for Blake3Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }
}

/// Supported fingerprint algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    /// Digest length in bytes.
    pub fn output_size(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha256 | HashAlgorithm::Blake3 => 32,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "blake3" => Ok(HashAlgorithm::Blake3),
            _ => Err(SyncError::UnsupportedAlgorithm {
                algorithm: s.to_string(),
            }),
        }
    }
}

/// Registry for hash algorithms
pub struct HashRegistry;

impl HashRegistry {
    /// Get a fresh hasher for the given algorithm
    pub fn get_hasher(algorithm: HashAlgorithm) -> Box<dyn Hasher> {
        match algorithm {
            HashAlgorithm::Md5 => Box::new(Md5Wrapper(Md5::new())),
            HashAlgorithm::Sha256 => Box::new(Sha256Wrapper(Sha256::new())),
            HashAlgorithm::Blake3 => Box::new(Blake3Wrapper(Blake3Hasher::new())),
        }
    }

    pub fn list_algorithms() -> [HashAlgorithm; 3] {
        [HashAlgorithm::Md5, HashAlgorithm::Sha256, HashAlgorithm::Blake3]
    }
}

/// Content digest of one file.
///
/// Two files with equal fingerprints are treated as identical. The size is
/// kept alongside the digest so a length change never compares equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub algorithm: HashAlgorithm,
    /// Hex-encoded digest
    pub digest: String,
    pub size: u64,
}

/// Streams files through the configured digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fingerprinter {
    algorithm: HashAlgorithm,
}

impl Fingerprinter {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Fingerprint the file at `path`.
    ///
    /// Fails with `NotFound` / `PermissionDenied` / `Io` if the file cannot be
    /// opened or read to the end, including when it vanishes mid-read.
    pub fn fingerprint(&self, path: &Path) -> Result<Fingerprint> {
        let file = File::open(path).map_err(|e| SyncError::from_io_error(e, "fingerprinting", path))?;
        self.fingerprint_reader(file)
            .map_err(|e| SyncError::from_io_error(e, "fingerprinting", path))
    }

    /// Fingerprint any byte stream, reading `CHUNK_SIZE` bytes at a time.
    pub fn fingerprint_reader<R: Read>(&self, mut reader: R) -> std::io::Result<Fingerprint> {
        let mut hasher = HashRegistry::get_hasher(self.algorithm);
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut size = 0u64;

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
            size += bytes_read as u64;
        }

        Ok(Fingerprint {
            algorithm: self.algorithm,
            digest: bytes_to_hex(&hasher.finalize()),
            size,
        })
    }
}

/// Convert bytes to hexadecimal string
fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
