// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS wire protocol helpers: word length prefixes and word codec

use crate::error::{ClientError, Result};

/// Largest word length representable by the supported prefix forms
pub const MAX_WORD_LEN: usize = 0x001F_FFFF;

// RouterOS protocol length encoding - intentional truncation is part of the wire format
#[allow(clippy::cast_possible_truncation)]
pub fn encode_length(len: usize) -> Result<Vec<u8>> {
    if len < 0x80 {
        Ok(vec![len as u8])
    } else if len < 0x4000 {
        Ok(vec![((len >> 8) as u8) | 0x80, (len & 0xFF) as u8])
    } else if len <= MAX_WORD_LEN {
        Ok(vec![
            ((len >> 16) as u8) | 0xC0,
            ((len >> 8) & 0xFF) as u8,
            (len & 0xFF) as u8,
        ])
    } else {
        Err(ClientError::Protocol(format!("word too long ({len} bytes)")))
    }
}

/// Decodes a length prefix from the start of `buf`.
///
/// Returns `(length, prefix_size)`, or `None` when the prefix itself has not
/// fully arrived yet.
pub fn decode_length(buf: &[u8]) -> Result<Option<(usize, usize)>> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };
    if first & 0x80 == 0 {
        Ok(Some((first as usize, 1)))
    } else if first & 0xC0 == 0x80 {
        if buf.len() < 2 {
            return Ok(None);
        }
        Ok(Some(((((first & 0x3F) as usize) << 8) + buf[1] as usize, 2)))
    } else if first & 0xE0 == 0xC0 {
        if buf.len() < 3 {
            return Ok(None);
        }
        let len = (((first & 0x1F) as usize) << 16) + ((buf[1] as usize) << 8) + buf[2] as usize;
        Ok(Some((len, 3)))
    } else {
        Err(ClientError::Protocol(format!(
            "unsupported length prefix 0x{first:02X}"
        )))
    }
}

/// Encodes a single word: length prefix followed by its UTF-8 bytes
pub fn encode_word(word: &str) -> Result<Vec<u8>> {
    let bytes = word.as_bytes();
    let mut out = encode_length(bytes.len())?;
    out.extend_from_slice(bytes);
    Ok(out)
}

/// Decodes one word from the start of `buf`.
///
/// Returns the word and the total bytes consumed (prefix + content), or
/// `None` if `buf` does not hold a complete word yet.
pub fn decode_word(buf: &[u8]) -> Result<Option<(String, usize)>> {
    let Some((len, prefix)) = decode_length(buf)? else {
        return Ok(None);
    };
    let end = prefix + len;
    if buf.len() < end {
        return Ok(None);
    }
    let word = String::from_utf8_lossy(&buf[prefix..end]).into_owned();
    Ok(Some((word, end)))
}
