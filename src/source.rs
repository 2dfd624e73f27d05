#[cfg(not(target_arch = "wasm32"))]
use memmap::Mmap;
#[cfg(not(target_arch = "wasm32"))]
use std::fs::File;
use std::io;
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;
use std::str::Utf8Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open source file {0}: {1}")]
    FileOpen(String, #[source] io::Error),
    #[error("failed to map source file {0} into memory: {1}")]
    MemoryMap(String, #[source] io::Error),
    #[error("source file {0} is not valid UTF-8: {1}")]
    Encoding(String, #[source] Utf8Error),
}

/// Reads a program from disk through a read-only memory map.
#[cfg(not(target_arch = "wasm32"))]
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String, SourceError> {
    let name = path.as_ref().display().to_string();
    let file = File::open(&path).map_err(|err| SourceError::FileOpen(name.clone(), err))?;
    let len = file
        .metadata()
        .map_err(|err| SourceError::FileOpen(name.clone(), err))?
        .len();
    // zero-length files cannot be mapped
    if len == 0 {
        return Ok(String::new());
    }

    let source = unsafe { Mmap::map(&file) }
        .map_err(|err| SourceError::MemoryMap(name.clone(), err))?;
    let text = std::str::from_utf8(&source).map_err(|err| SourceError::Encoding(name, err))?;
    log::debug!("read {} byte(s) from {}", len, path.as_ref().display());

    Ok(text.to_string())
}
