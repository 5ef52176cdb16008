use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{trace, warn};

use crate::errors::{TreeError, TreeResult};

const BUFFER_CAPACITY: usize = 65536;
pub(crate) const SMALL_FILE_THRESHOLD: u64 = 32 * 1024; // 32KB
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// How document bytes that are not valid UTF-8 are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Fail the read with [`TreeError::Encoding`]
    #[default]
    FailFast,
    /// Replace invalid sequences with U+FFFD and log a warning
    Lossy,
}

/// Which read strategy served a document, chosen by file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPath {
    Small,
    Buffered,
    Mapped,
}

impl ReadPath {
    pub(crate) fn for_size(size: u64) -> Self {
        if size < SMALL_FILE_THRESHOLD {
            ReadPath::Small
        } else if size >= LARGE_FILE_THRESHOLD {
            ReadPath::Mapped
        } else {
            ReadPath::Buffered
        }
    }
}

fn decode_bytes(bytes: &[u8], path: &Path, encoding_mode: EncodingMode) -> TreeResult<String> {
    match encoding_mode {
        EncodingMode::FailFast => match std::str::from_utf8(bytes) {
            Ok(valid) => Ok(valid.to_owned()),
            Err(_) => {
                // Rebuild the error through String so the caller gets a FromUtf8Error
                let err = match String::from_utf8(bytes.to_vec()) {
                    Ok(_) => unreachable!("bytes were already rejected as UTF-8"),
                    Err(e) => e,
                };
                Err(TreeError::encoding(path, err))
            }
        },
        EncodingMode::Lossy => {
            let cow = String::from_utf8_lossy(bytes);
            if let std::borrow::Cow::Owned(_) = cow {
                warn!("Invalid UTF-8 replaced in document: {}", path.display());
            }
            Ok(cow.into_owned())
        }
    }
}

/// Reads a document's text, picking the read path from its size
pub(crate) fn read_text(path: &Path, encoding_mode: EncodingMode) -> TreeResult<(String, ReadPath)> {
    let file = File::open(path).map_err(|e| TreeError::from_io(path, e))?;
    let size = file
        .metadata()
        .map_err(|e| TreeError::from_io(path, e))?
        .len();

    let read_path = ReadPath::for_size(size);
    trace!("Reading {} ({} bytes, {:?})", path.display(), size, read_path);

    let text = match read_path {
        ReadPath::Small => {
            let mut bytes = Vec::with_capacity(size as usize);
            let mut file = file;
            file.read_to_end(&mut bytes)
                .map_err(|e| TreeError::from_io(path, e))?;
            decode_bytes(&bytes, path, encoding_mode)?
        }
        ReadPath::Buffered => {
            let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
            let mut bytes = Vec::with_capacity(size as usize);
            reader
                .read_to_end(&mut bytes)
                .map_err(|e| TreeError::from_io(path, e))?;
            decode_bytes(&bytes, path, encoding_mode)?
        }
        ReadPath::Mapped => {
            // The map is dropped before returning; the decoded copy outlives it.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| TreeError::from_io(path, e))?;
            decode_bytes(&mmap, path, encoding_mode)?
        }
    };

    Ok((text, read_path))
}
