use super::{InputError, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read as ioRead};
use std::path::Path;

/// Default upper bound on the (decompressed) size of an uploaded variant file.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".gzip")
}

fn open_reader(path: &Path) -> Result<Box<dyn ioRead>> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(Box::new(gz_decoder))
        } else {
            Err(format!("Invalid gzip header: {}", path.to_string_lossy()))
        }
    } else {
        Ok(Box::new(file))
    }
}

/// Opens a knowledge-base table, transparently decompressing `.gz` files.
pub fn open_table_reader(path: &Path) -> Result<BufReader<Box<dyn ioRead>>> {
    Ok(BufReader::new(open_reader(path)?))
}

/// Checks the size bounds of an in-memory variant file.
///
/// Only a zero-length upload is rejected as empty; whitespace-only content is
/// passed on so that the parser can report it as a failed parse.
pub fn check_variant_bytes(bytes: &[u8], max_bytes: u64) -> std::result::Result<(), InputError> {
    if bytes.is_empty() {
        return Err(InputError::EmptyFile);
    }
    let size = bytes.len() as u64;
    if size > max_bytes {
        return Err(InputError::FileTooLarge {
            size,
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Reads a variant file into memory without ever buffering more than
/// `max_bytes + 1` bytes.
pub fn read_variant_file(path: &Path, max_bytes: u64) -> std::result::Result<Vec<u8>, InputError> {
    let unreadable = |message: String| InputError::Unreadable {
        path: path.display().to_string(),
        message,
    };

    if !is_gzipped(path) {
        let size = std::fs::metadata(path)
            .map_err(|e| unreadable(e.to_string()))?
            .len();
        if size > max_bytes {
            return Err(InputError::FileTooLarge {
                size,
                limit: max_bytes,
            });
        }
    }

    let reader = open_reader(path).map_err(unreadable)?;
    let mut bytes = Vec::new();
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| unreadable(e.to_string()))?;

    check_variant_bytes(&bytes, max_bytes)?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}
