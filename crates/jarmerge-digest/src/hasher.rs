use std::io::Read;

use jarmerge_types::ContentDigest;

use crate::reader::HashingReader;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so digests from different uses never collide.
#[derive(Clone, Copy, Debug)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for archive entry content.
    pub const ENTRY: Self = Self {
        domain: "jarmerge-entry-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentDigest {
        let mut hasher = self.start();
        hasher.update(data);
        ContentDigest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected digest.
    pub fn verify(&self, data: &[u8], expected: &ContentDigest) -> bool {
        self.hash(data) == *expected
    }

    /// Wrap a reader so everything read through it is digested.
    pub fn reader<R: Read>(&self, inner: R) -> HashingReader<R> {
        HashingReader::new(inner, self.start())
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }

    fn start(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }
}
