//! Binary glTF (GLB) container framing.
//!
//! A GLB file is a 12-byte header followed by chunks, each with an 8-byte
//! header. All integer fields are little-endian regardless of host. There is
//! at most one JSON and one BIN chunk, JSON first; JSON payloads are padded
//! to four bytes with spaces, BIN payloads with zeros.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;

use crate::Error;

/// `"glTF"` interpreted as a little-endian u32.
pub const MAGIC: u32 = 0x4654_6C67;

/// `"JSON"` chunk type.
pub const CHUNK_TYPE_JSON: u32 = 0x4E4F_534A;

/// `"BIN\0"` chunk type.
pub const CHUNK_TYPE_BIN: u32 = 0x004E_4942;

/// The container format of a byte stream, determined by peeking.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GltfType {
    /// A JSON text document.
    Gltf,
    /// A binary container.
    Glb,
    /// Neither.
    Invalid,
}

/// Classifies a byte stream without consuming it.
pub fn determine_type(data: &[u8]) -> GltfType {
    if data.len() >= 4 {
        let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if magic == MAGIC {
            return GltfType::Glb;
        }
    }
    match data.iter().find(|c| !c.is_ascii_whitespace()) {
        Some(b'{') => GltfType::Gltf,
        _ => GltfType::Invalid,
    }
}

/// The 12-byte header of a GLB file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Header {
    /// Always [`MAGIC`].
    pub magic: u32,
    /// Always `2`.
    pub version: u32,
    /// Total file length in bytes, header included.
    pub length: u32,
}

impl Header {
    pub const SIZE: usize = 12;

    fn from_reader<R: io::Read>(mut reader: R) -> Result<Self, Error> {
        let magic = reader
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::InvalidGLB)?;
        if magic != MAGIC {
            return Err(Error::InvalidGLB);
        }
        let version = reader
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::InvalidGLB)?;
        if version != 2 {
            return Err(Error::UnsupportedVersion);
        }
        let length = reader
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::InvalidGLB)?;
        Ok(Self {
            magic,
            version,
            length,
        })
    }
}

#[derive(Clone, Copy, Debug)]
struct ChunkHeader {
    length: u32,
    ty: u32,
}

impl ChunkHeader {
    const SIZE: usize = 8;

    fn from_reader<R: io::Read>(mut reader: R) -> Result<Self, Error> {
        let length = reader
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::InvalidGLB)?;
        let ty = reader
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::InvalidGLB)?;
        Ok(Self { length, ty })
    }
}

/// The BIN chunk payload plus its position in the file, so that deferred
/// loaders can read it back without re-parsing the container.
#[derive(Clone, Copy, Debug)]
pub struct BinChunk<'a> {
    /// Byte offset of the payload from the start of the file.
    pub file_offset: u64,
    pub data: &'a [u8],
}

/// A split binary glTF container.
#[derive(Clone, Debug)]
pub struct Glb<'a> {
    pub header: Header,
    /// The JSON chunk payload, padding included.
    pub json: &'a [u8],
    /// The optional BIN chunk payload.
    pub bin: Option<BinChunk<'a>>,
}

fn align_to_multiple_of_four(n: &mut usize) {
    *n = (*n + 3) & !3;
}

impl<'a> Glb<'a> {
    /// Splits a loaded GLB into its header, JSON chunk and optional BIN
    /// chunk. Chunk payloads whose declared length is unpadded are accepted;
    /// the cursor realigns to four bytes between chunks.
    pub fn from_slice(data: &'a [u8]) -> Result<Self, Error> {
        let mut reader = data;
        let header = Header::from_reader(&mut reader)?;
        if header.length as usize > data.len() {
            return Err(Error::InvalidGLB);
        }

        let mut pos = Header::SIZE;
        let json_header = ChunkHeader::from_reader(&mut reader)?;
        pos += ChunkHeader::SIZE;
        if json_header.ty != CHUNK_TYPE_JSON {
            return Err(Error::InvalidGLB);
        }
        let json_end = pos + json_header.length as usize;
        let json = data.get(pos..json_end).ok_or(Error::InvalidGLB)?;
        pos = json_end;
        align_to_multiple_of_four(&mut pos);
        pos = pos.min(data.len());

        let bin = if pos + ChunkHeader::SIZE <= data.len() {
            let mut reader = &data[pos..];
            let bin_header = ChunkHeader::from_reader(&mut reader)?;
            pos += ChunkHeader::SIZE;
            if bin_header.ty != CHUNK_TYPE_BIN {
                return Err(Error::InvalidGLB);
            }
            let bin_end = pos + bin_header.length as usize;
            let payload = data.get(pos..bin_end).ok_or(Error::InvalidGLB)?;
            if bin_header.length > 0 {
                Some(BinChunk {
                    file_offset: pos as u64,
                    data: payload,
                })
            } else {
                None
            }
        } else {
            None
        };

        Ok(Self { header, json, bin })
    }

    /// Writes binary glTF to a writer, padding the JSON chunk with spaces
    /// and the BIN chunk with zeros.
    pub fn to_writer<W: io::Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut json_length = self.json.len();
        align_to_multiple_of_four(&mut json_length);
        let json_padding = json_length - self.json.len();

        let mut total = Header::SIZE + ChunkHeader::SIZE + json_length;
        let mut bin_padding = 0;
        if let Some(bin) = self.bin.as_ref() {
            let mut bin_length = bin.data.len();
            align_to_multiple_of_four(&mut bin_length);
            bin_padding = bin_length - bin.data.len();
            total += ChunkHeader::SIZE + bin_length;
        }
        let total = u32::try_from(total).map_err(|_| Error::InvalidGLB)?;

        let io_err = |_| Error::FailedWritingFiles;
        writer.write_u32::<LittleEndian>(MAGIC).map_err(io_err)?;
        writer.write_u32::<LittleEndian>(2).map_err(io_err)?;
        writer.write_u32::<LittleEndian>(total).map_err(io_err)?;

        writer
            .write_u32::<LittleEndian>(json_length as u32)
            .map_err(io_err)?;
        writer
            .write_u32::<LittleEndian>(CHUNK_TYPE_JSON)
            .map_err(io_err)?;
        writer.write_all(self.json).map_err(io_err)?;
        for _ in 0..json_padding {
            writer.write_u8(0x20).map_err(io_err)?;
        }

        if let Some(bin) = self.bin.as_ref() {
            let padded = bin.data.len() + bin_padding;
            writer
                .write_u32::<LittleEndian>(padded as u32)
                .map_err(io_err)?;
            writer
                .write_u32::<LittleEndian>(CHUNK_TYPE_BIN)
                .map_err(io_err)?;
            writer.write_all(bin.data).map_err(io_err)?;
            for _ in 0..bin_padding {
                writer.write_u8(0).map_err(io_err)?;
            }
        }

        Ok(())
    }

    /// Writes binary glTF to a byte vector.
    pub fn to_vec(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(self.header.length as usize);
        self.to_writer(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_glb() -> Vec<u8> {
        // Header + a "{}" JSON chunk padded with two spaces.
        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&24u32.to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
        data.extend_from_slice(b"{}  ");
        data
    }

    #[test]
    fn reads_minimal_container() {
        let data = minimal_glb();
        let glb = Glb::from_slice(&data).unwrap();
        assert_eq!(glb.header.version, 2);
        assert_eq!(glb.json, b"{}  ");
        assert!(glb.bin.is_none());
    }

    #[test]
    fn accepts_unpadded_chunk_length() {
        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&24u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
        data.extend_from_slice(b"{}  ");
        let glb = Glb::from_slice(&data).unwrap();
        assert_eq!(glb.json, b"{}");
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = minimal_glb();
        data[0] = b'x';
        assert!(matches!(Glb::from_slice(&data), Err(Error::InvalidGLB)));
    }

    #[test]
    fn rejects_bad_version() {
        let mut data = minimal_glb();
        data[4] = 1;
        assert!(matches!(
            Glb::from_slice(&data),
            Err(Error::UnsupportedVersion)
        ));
    }

    #[test]
    fn rejects_overlong_declared_length() {
        let mut data = minimal_glb();
        data[8..12].copy_from_slice(&100u32.to_le_bytes());
        assert!(matches!(Glb::from_slice(&data), Err(Error::InvalidGLB)));
    }

    #[test]
    fn splits_bin_chunk() {
        let mut data = minimal_glb();
        let bin = [7u8, 7, 7, 7];
        data[8..12].copy_from_slice(&((24 + 8 + 4) as u32).to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&CHUNK_TYPE_BIN.to_le_bytes());
        data.extend_from_slice(&bin);
        let glb = Glb::from_slice(&data).unwrap();
        let chunk = glb.bin.unwrap();
        assert_eq!(chunk.data, &bin);
        assert_eq!(chunk.file_offset, 32);
    }

    #[test]
    fn round_trips_through_writer() {
        let data = minimal_glb();
        let glb = Glb::from_slice(&data).unwrap();
        assert_eq!(glb.to_vec().unwrap(), data);
    }

    #[test]
    fn type_determination_peeks() {
        assert_eq!(determine_type(&minimal_glb()), GltfType::Glb);
        assert_eq!(determine_type(b"  {\"asset\":{}}"), GltfType::Gltf);
        assert_eq!(determine_type(b"hello"), GltfType::Invalid);
        assert_eq!(determine_type(b""), GltfType::Invalid);
    }
}
