// Hash module
// Content fingerprints used as the equality test between source and replica

pub mod hash;

pub use hash::{Fingerprint, Fingerprinter, HashAlgorithm, HashRegistry, Hasher, CHUNK_SIZE};
