use std::io::{self, ErrorKind, Read, Write};

/// Upper bound of the transfer buffer used to stream entry content.
pub const TRANSFER_CAP: usize = 64 * 1024;

/// Which side of a copy failed.
#[derive(Debug)]
pub enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

/// Size of the transfer buffer for an entry that declares `declared` bytes:
/// the smaller of [`TRANSFER_CAP`] and the declared size, never zero.
pub fn transfer_size(declared: u64) -> usize {
    usize::try_from(declared)
        .unwrap_or(TRANSFER_CAP)
        .clamp(1, TRANSFER_CAP)
}

/// Stream `reader` into `writer` through a bounded buffer.
///
/// Returns the number of bytes copied. The declared size only sizes the
/// buffer; the reader is always drained to its end.
pub fn copy_bounded<R, W>(reader: &mut R, writer: &mut W, declared: u64) -> Result<u64, CopyError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; transfer_size(declared)];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
        total += n as u64;
    }
}

/// Drain `reader` without keeping its bytes.
pub fn drain<R: Read + ?Sized>(reader: &mut R, declared: u64) -> io::Result<u64> {
    copy_bounded(reader, &mut io::sink(), declared).map_err(|e| match e {
        CopyError::Read(e) | CopyError::Write(e) => e,
    })
}
