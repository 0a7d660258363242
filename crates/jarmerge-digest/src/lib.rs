//! Content digests for jarmerge.
//!
//! Provides domain-separated BLAKE3 hashing and a [`HashingReader`] that
//! digests entry content incrementally while it is being copied, so content
//! never has to be buffered to be hashed.

pub mod hasher;
pub mod reader;

pub use hasher::ContentHasher;
pub use reader::HashingReader;
