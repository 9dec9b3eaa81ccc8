//! Memory-image files: a flat stream of 16-bit words.
//!
//! Input images are big-endian unless told otherwise; core dumps are
//! always big-endian, two bytes per word.

use std::fs;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::cpu::{Dcpu, RAM_WORDS};

/// Core dumps land here, in the working directory.
pub const COREFILE_NAME: &str = "core.img";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("error reading image '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("error writing image '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Load an image into RAM starting at word 0. Short files are fine:
/// the rest of RAM stays zeroed. At most [`RAM_WORDS`] words are used;
/// anything beyond is ignored. Returns the number of words loaded.
pub fn load(cpu: &mut Dcpu, path: &Path, big_endian: bool) -> Result<usize, ImageError> {
    let bytes = fs::read(path).map_err(|source| ImageError::Read {
        path: path.display().to_string(),
        source,
    })?;

    if bytes.len() % 2 != 0 {
        log::warn!(
            "image '{}' has an odd byte count; ignoring the trailing byte",
            path.display()
        );
    }

    let mut words = 0;
    for (i, pair) in bytes.chunks_exact(2).take(RAM_WORDS).enumerate() {
        let word = [pair[0], pair[1]];
        cpu.ram[i] = if big_endian {
            u16::from_be_bytes(word)
        } else {
            u16::from_le_bytes(word)
        };
        words += 1;
    }

    log::info!("loaded image from {}: 0x{words:05x} words", path.display());
    Ok(words)
}

/// Dump the first `limit` words of RAM (all of it when `limit` is 0)
/// to [`COREFILE_NAME`], big-endian.
pub fn core_dump(cpu: &Dcpu, limit: u32) -> Result<(), ImageError> {
    let limit = if limit == 0 {
        RAM_WORDS
    } else {
        (limit as usize).min(RAM_WORDS)
    };

    let write_err = |source| ImageError::Write {
        path: COREFILE_NAME.into(),
        source,
    };

    let mut out = Vec::with_capacity(limit * 2);
    for &word in &cpu.ram[..limit] {
        out.extend_from_slice(&word.to_be_bytes());
    }

    let mut file = fs::File::create(COREFILE_NAME).map_err(write_err)?;
    file.write_all(&out).map_err(write_err)?;
    Ok(())
}
