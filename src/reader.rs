//! Encoding-resilient text file reading.
//!
//! Source files are expected to be UTF-8, but libraries assembled by hand
//! often contain GBK, Big5 or Shift_JIS files, and editors on Windows save
//! UTF-16 with a byte order mark. A BOM always decides the encoding. Otherwise
//! UTF-8 is tried first and, when it fails, the encoding is guessed with
//! `chardetng` and decoded with `encoding_rs`.

use crate::error::ReadError;
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use std::path::Path;

/// A decoded text file together with its raw bytes.
#[derive(Debug, Clone)]
pub struct SourceText {
    /// Bytes exactly as stored on disk (used for fingerprinting).
    pub raw: Vec<u8>,
    /// Decoded text.
    pub text: String,
    /// Name of the encoding the text was decoded with.
    pub encoding: &'static str,
}

/// Reads and decodes a text file.
pub fn read_text(path: &Path) -> Result<SourceText, ReadError> {
    let raw = std::fs::read(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (text, encoding) = decode(&raw).ok_or_else(|| ReadError::Decode {
        path: path.to_path_buf(),
        encoding: guess(&raw).name(),
    })?;

    if encoding != UTF_8 {
        tracing::debug!(
            path = %path.display(),
            encoding = encoding.name(),
            "Decoded with detected encoding"
        );
    }

    Ok(SourceText {
        raw,
        text,
        encoding: encoding.name(),
    })
}

/// Decodes bytes as UTF-8, falling back to the detected encoding.
///
/// A UTF-8 or UTF-16 byte order mark selects the encoding outright and is
/// stripped. Returns `None` if decoding fails.
pub fn decode(raw: &[u8]) -> Option<(String, &'static Encoding)> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(raw) {
        return encoding
            .decode_without_bom_handling_and_without_replacement(&raw[bom_len..])
            .map(|text| (text.into_owned(), encoding));
    }

    if let Ok(text) = std::str::from_utf8(raw) {
        return Some((text.to_string(), UTF_8));
    }

    let encoding = detect(raw);
    encoding
        .decode_without_bom_handling_and_without_replacement(raw)
        .map(|text| (text.into_owned(), encoding))
}

/// The encoding `decode` would use for these bytes.
fn guess(raw: &[u8]) -> &'static Encoding {
    match Encoding::for_bom(raw) {
        Some((encoding, _)) => encoding,
        None => detect(raw),
    }
}

/// Guesses the encoding of a byte stream.
fn detect(raw: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(raw, true);
    detector.guess(None, true)
}
