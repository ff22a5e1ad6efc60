use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::LoadError;

/// Program image: an origin address and the words to place there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub origin: u16,
    pub words: Vec<u16>,
}

impl Image {
    /// Parse big-endian 16-bit words. The first word is the origin.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() % 2 != 0 {
            return Err(LoadError::Misaligned { len: bytes.len() });
        }
        let mut words = bytes
            .chunks_exact(2)
            .map(|word| u16::from_be_bytes([word[0], word[1]]));
        let origin = words.next().ok_or(LoadError::Empty)?;
        Ok(Self {
            origin,
            words: words.collect(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .map_err(|source| LoadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_bytes(&buffer)
    }

    /// Image bytes as they would be stored on disk.
    pub fn to_bytes(&self) -> Vec<u8> {
        std::iter::once(self.origin)
            .chain(self.words.iter().copied())
            .flat_map(u16::to_be_bytes)
            .collect()
    }
}
