// Reference image handling: loading, the embedded version string, and
// generating fresh test images to burn into a ROM.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use rand::{Rng, RngCore};

use crate::region::MemoryRegion;

/// Byte offset of the version string inside an image.
pub const VERSION_OFFSET: usize = 4;

/// Size of the version field, NUL padded.
pub const VERSION_LEN: usize = 11;

/// Longest version string the generator embeds; the last byte always stays NUL.
pub const VERSION_MAX_CHARS: usize = VERSION_LEN - 1;

/// Leading bytes a generated image keeps at zero.
const ZEROED_PREFIX: usize = 4;

#[derive(Debug)]
pub enum LoadError {
    /// The file does not exist or could not be opened.
    Open { path: PathBuf, source: io::Error },
    Read { path: PathBuf, source: io::Error },
    WrongSize { path: PathBuf, expected: usize, actual: u64 },
    Allocation { size: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Open { path, source } => {
                write!(f, "{} not found or not readable: {}", path.display(), source)
            }
            LoadError::Read { path, source } => {
                write!(f, "error reading {}: {}", path.display(), source)
            }
            LoadError::WrongSize { path, expected, actual } => write!(
                f,
                "{} must be {}KB, found {} bytes",
                path.display(),
                expected / 1024,
                actual
            ),
            LoadError::Allocation { size } => {
                write!(f, "failed to allocate {} bytes for the image", size)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Open { source, .. } | LoadError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Reads an image of exactly `expected` bytes.
pub fn load_image(path: &Path, expected: usize) -> Result<Vec<u8>, LoadError> {
    let mut file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let actual = file
        .metadata()
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if actual != expected as u64 {
        return Err(LoadError::WrongSize {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }

    let mut data = Vec::new();
    data.try_reserve_exact(expected)
        .map_err(|_| LoadError::Allocation { size: expected })?;

    file.read_to_end(&mut data).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // The file may have changed size between stat and read.
    if data.len() != expected {
        return Err(LoadError::WrongSize {
            path: path.to_path_buf(),
            expected,
            actual: data.len() as u64,
        });
    }

    Ok(data)
}

/// Raw version field as stored in a region.
pub fn read_version_field(region: &dyn MemoryRegion) -> [u8; VERSION_LEN] {
    let mut field = [0u8; VERSION_LEN];
    for (i, byte) in field.iter_mut().enumerate() {
        *byte = region.read_u8(VERSION_OFFSET + i);
    }
    field
}

/// The version string up to the first NUL.
pub fn decode_version(field: &[u8; VERSION_LEN]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(VERSION_LEN);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Checks that `version` survives a trip through the version field unchanged.
pub fn validate_version(version: &str) -> Result<(), String> {
    if version.len() > VERSION_MAX_CHARS {
        return Err(format!(
            "version '{}' is {} bytes long, the ROM header holds at most {}",
            version,
            version.len(),
            VERSION_MAX_CHARS
        ));
    }
    if version.trim() != version || version.contains('\0') {
        return Err(format!("version '{}' has padding or NUL bytes", version.escape_debug()));
    }
    Ok(())
}

pub fn encode_version(version: &str) -> [u8; VERSION_LEN] {
    let mut field = [0u8; VERSION_LEN];
    let bytes = version.trim().as_bytes();
    let take = bytes.len().min(VERSION_MAX_CHARS);
    field[..take].copy_from_slice(&bytes[..take]);
    field
}

/// Builds a test image: random payload, a zeroed header and the version string.
pub fn generate_image<R: RngCore>(size: usize, version: &str, rng: &mut R) -> Vec<u8> {
    let mut data: Vec<u8> = (0..size).map(|_| rng.gen::<u8>()).collect();
    data[..ZEROED_PREFIX].fill(0);
    data[VERSION_OFFSET..VERSION_OFFSET + VERSION_LEN].copy_from_slice(&encode_version(version));
    data
}

pub fn write_image(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, data)
}
