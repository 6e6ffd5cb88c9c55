use std::fs;
use std::path::Path;

use crate::error::Result;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Read a text file, stripping a UTF-8 BOM and falling back to Latin-1
/// when the bytes are not valid UTF-8.
pub fn load_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(decode_text(&bytes))
}

pub fn decode_text(bytes: &[u8]) -> String {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => {
            tracing::debug!("input is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}
