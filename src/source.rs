//! Byte sources feeding the parser.
//!
//! A [`ByteSource`] hands out bytes from a file, a mapping, or memory. Views
//! handed out by [`ByteSource::read_view`] promise `pad` accessible slack
//! bytes past their end so that SIMD-accelerated consumers may over-read.

use std::fs;
use std::path::Path;

use crate::Error;

/// A positioned stream of bytes with known total size.
pub trait ByteSource {
    /// Total bytes available.
    fn total_size(&self) -> usize;

    /// Bytes consumed so far.
    fn bytes_read(&self) -> usize;

    /// Copies the next `buf.len()` bytes into `buf` and advances.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<(), Error>;

    /// Borrows the next `count` bytes and advances. At least `pad` bytes
    /// past the view's end stay accessible for over-reading.
    fn read_view(&mut self, count: usize, pad: usize) -> Result<&[u8], Error>;

    /// Returns the cursor to the start.
    fn reset(&mut self);

    /// Bytes left to read.
    fn remaining(&self) -> usize {
        self.total_size() - self.bytes_read()
    }
}

/// A source borrowing a caller-owned slice.
///
/// The caller guarantees any padding requirement: views are sub-slices, so
/// slack past the logical end must live in the underlying allocation.
#[derive(Clone, Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    fn total_size(&self) -> usize {
        self.data.len()
    }

    fn bytes_read(&self) -> usize {
        self.pos
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let end = self.pos + buf.len();
        let src = self.data.get(self.pos..end).ok_or(Error::InvalidFileData)?;
        buf.copy_from_slice(src);
        self.pos = end;
        Ok(())
    }

    fn read_view(&mut self, count: usize, _pad: usize) -> Result<&[u8], Error> {
        let end = self.pos + count;
        let view = self.data.get(self.pos..end).ok_or(Error::InvalidFileData)?;
        self.pos = end;
        Ok(view)
    }

    fn reset(&mut self) {
        self.pos = 0;
    }
}

/// A source owning its bytes, over-allocated by the requested padding.
#[derive(Clone, Debug)]
pub struct VecSource {
    data: Vec<u8>,
    /// Logical length; `data` extends `pad` zero bytes beyond it.
    len: usize,
    pos: usize,
}

impl VecSource {
    /// Takes ownership of `data`, appending `pad` zero bytes of slack.
    pub fn new(mut data: Vec<u8>, pad: usize) -> Self {
        let len = data.len();
        data.resize(len + pad, 0);
        Self { data, len, pos: 0 }
    }

    /// Reads a whole file into an owned source.
    pub fn from_file<P: AsRef<Path>>(path: P, pad: usize) -> Result<Self, Error> {
        let data = fs::read(path).map_err(|_| Error::InvalidPath)?;
        Ok(Self::new(data, pad))
    }
}

impl ByteSource for VecSource {
    fn total_size(&self) -> usize {
        self.len
    }

    fn bytes_read(&self) -> usize {
        self.pos
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let end = self.pos + buf.len();
        if end > self.len {
            return Err(Error::InvalidFileData);
        }
        buf.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    fn read_view(&mut self, count: usize, _pad: usize) -> Result<&[u8], Error> {
        let end = self.pos + count;
        if end > self.len {
            return Err(Error::InvalidFileData);
        }
        let view = &self.data[self.pos..end];
        self.pos = end;
        Ok(view)
    }

    fn reset(&mut self) {
        self.pos = 0;
    }
}

/// A memory-mapped file source.
///
/// The mapping's final partial page is zero-filled by the kernel, which
/// covers the padding requirement for page-sized pads.
#[derive(Debug)]
pub struct MappedFileSource {
    map: memmap2::Mmap,
    pos: usize,
}

impl MappedFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = fs::File::open(path).map_err(|_| Error::InvalidPath)?;
        // Safety: the mapping is read-only and lives as long as the source.
        let map = unsafe { memmap2::Mmap::map(&file) }.map_err(|_| Error::InvalidFileData)?;
        Ok(Self { map, pos: 0 })
    }
}

impl ByteSource for MappedFileSource {
    fn total_size(&self) -> usize {
        self.map.len()
    }

    fn bytes_read(&self) -> usize {
        self.pos
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let end = self.pos + buf.len();
        let src = self.map.get(self.pos..end).ok_or(Error::InvalidFileData)?;
        buf.copy_from_slice(src);
        self.pos = end;
        Ok(())
    }

    fn read_view(&mut self, count: usize, _pad: usize) -> Result<&[u8], Error> {
        let end = self.pos + count;
        let view = self.map.get(self.pos..end).ok_or(Error::InvalidFileData)?;
        self.pos = end;
        Ok(view)
    }

    fn reset(&mut self) {
        self.pos = 0;
    }
}
