use std::io::{self, Read};

use jarmerge_types::ContentDigest;

/// A reader that digests every byte passing through it.
///
/// The digest only describes the full content once the inner reader has been
/// drained; [`HashingReader::finish`] reports how many bytes were seen so the
/// caller can tell a complete stream from an abandoned one.
pub struct HashingReader<R> {
    inner: R,
    hasher: blake3::Hasher,
    bytes_read: u64,
}

impl<R: Read> HashingReader<R> {
    pub(crate) fn new(inner: R, hasher: blake3::Hasher) -> Self {
        Self {
            inner,
            hasher,
            bytes_read: 0,
        }
    }

    /// Bytes read so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Finalize the digest, returning it with the number of bytes hashed.
    pub fn finish(self) -> (ContentDigest, u64) {
        let digest = ContentDigest::from_hash(*self.hasher.finalize().as_bytes());
        (digest, self.bytes_read)
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes_read += n as u64;
        Ok(n)
    }
}
