// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS sentence framing
//!
//! A sentence is a run of length-prefixed words terminated by an empty word:
//!
//! ```text
//! word1 word2 ... wordN .tag=<n> 0x00
//! ```

use std::collections::HashMap;

use super::protocol::{decode_word, encode_word};
use crate::error::Result;

/// Attribute map built from `=key=value` words
pub type Attributes = HashMap<String, String>;

const TAG_PREFIX: &str = ".tag=";

/// Kind of a received sentence, taken from its first word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// `!done`, terminates a tagged command successfully
    Done,
    /// `!trap`, terminates a tagged command with a device error
    Trap,
    /// `!fatal`, the device is closing the connection
    Fatal,
    /// `!re` or any other leading word
    Row,
}

impl ReplyKind {
    fn classify(first: Option<&str>) -> Self {
        match first {
            Some(w) if w.starts_with("!done") => Self::Done,
            Some(w) if w.starts_with("!trap") => Self::Trap,
            Some(w) if w.starts_with("!fatal") => Self::Fatal,
            _ => Self::Row,
        }
    }
}

/// One decoded sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub tag: Option<u64>,
    pub kind: ReplyKind,
    /// Every word except `.tag=`, in wire order
    pub words: Vec<String>,
    pub attributes: Attributes,
}

impl Sentence {
    fn from_words(raw: Vec<String>) -> Self {
        let mut tag = None;
        let mut words = Vec::with_capacity(raw.len());
        let mut attributes = HashMap::new();
        for word in raw {
            if let Some(value) = word.strip_prefix(TAG_PREFIX) {
                tag = value.parse().ok();
                continue;
            }
            if let Some(stripped) = word.strip_prefix('=') {
                if let Some((k, v)) = stripped.split_once('=') {
                    attributes.insert(k.to_string(), v.to_string());
                }
            }
            words.push(word);
        }
        let kind = ReplyKind::classify(words.first().map(String::as_str));
        Self {
            tag,
            kind,
            words,
            attributes,
        }
    }

    /// Error text of a `!trap` or `!fatal` sentence
    #[must_use]
    pub fn error_message(&self) -> String {
        if let Some(msg) = self.attributes.get("message") {
            return msg.clone();
        }
        // !fatal carries its reason as a bare word
        self.words
            .iter()
            .skip(1)
            .find(|w| !w.starts_with('=') && !w.starts_with('.'))
            .cloned()
            .unwrap_or_else(|| "trap".to_string())
    }
}

/// Encodes `words` followed by `.tag=<tag>` and the zero-length terminator
pub fn encode_sentence<S: AsRef<str>>(words: &[S], tag: u64) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for w in words {
        out.extend(encode_word(w.as_ref())?);
    }
    out.extend(encode_word(&format!("{TAG_PREFIX}{tag}"))?);
    out.push(0);
    Ok(out)
}

/// Decodes one sentence from the start of `buf`.
///
/// Returns the sentence and the number of bytes it occupied, or `None` when
/// `buf` ends before the terminating empty word.
pub fn decode_sentence(buf: &[u8]) -> Result<Option<(Sentence, usize)>> {
    let mut offset = 0;
    let mut raw = Vec::new();
    loop {
        let Some((word, used)) = decode_word(&buf[offset..])? else {
            return Ok(None);
        };
        offset += used;
        if word.is_empty() {
            break;
        }
        raw.push(word);
    }
    Ok(Some((Sentence::from_words(raw), offset)))
}

/// Buffers partial reads and yields complete sentences
#[derive(Debug, Default)]
pub struct SentenceDecoder {
    buffer: Vec<u8>,
}

impl SentenceDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Next complete sentence, trimming its bytes from the buffer
    pub fn next_sentence(&mut self) -> Result<Option<Sentence>> {
        match decode_sentence(&self.buffer)? {
            Some((sentence, used)) => {
                self.buffer.drain(..used);
                Ok(Some(sentence))
            }
            None => Ok(None),
        }
    }

    /// Bytes still waiting for the rest of their sentence
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_sentence_layout() {
        let bytes = encode_sentence(&["/quit"], 2).unwrap();
        let mut expected = vec![5];
        expected.extend_from_slice(b"/quit");
        expected.push(6);
        expected.extend_from_slice(b".tag=2");
        expected.push(0);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_decode_done_with_ret() {
        let bytes = encode_sentence(&["!done", "=ret=*1A"], 4).unwrap();
        let (s, used) = decode_sentence(&bytes).unwrap().unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(s.tag, Some(4));
        assert_eq!(s.kind, ReplyKind::Done);
        assert_eq!(s.attributes.get("ret").map(String::as_str), Some("*1A"));
    }

    #[test]
    fn test_decode_trap_message() {
        let bytes = encode_sentence(
            &["!trap", "=category=1", "=message=already have such entry"],
            9,
        )
        .unwrap();
        let (s, _) = decode_sentence(&bytes).unwrap().unwrap();
        assert_eq!(s.kind, ReplyKind::Trap);
        assert_eq!(s.error_message(), "already have such entry");
    }

    #[test]
    fn test_fatal_reason_word() {
        let mut bytes = encode_word("!fatal").unwrap();
        bytes.extend(encode_word("session terminated on request").unwrap());
        bytes.push(0);
        let (s, _) = decode_sentence(&bytes).unwrap().unwrap();
        assert_eq!(s.kind, ReplyKind::Fatal);
        assert_eq!(s.tag, None);
        assert_eq!(s.error_message(), "session terminated on request");
    }

    #[test]
    fn test_attribute_value_with_equals() {
        let bytes = encode_sentence(&["!re", "=comment=a=b=c"], 1).unwrap();
        let (s, _) = decode_sentence(&bytes).unwrap().unwrap();
        assert_eq!(s.kind, ReplyKind::Row);
        assert_eq!(s.attributes.get("comment").map(String::as_str), Some("a=b=c"));
    }

    #[test]
    fn test_decoder_across_chunks() {
        let mut stream = encode_sentence(&["!re", "=.id=*1"], 3).unwrap();
        stream.extend(encode_sentence(&["!done"], 3).unwrap());

        let mut decoder = SentenceDecoder::new();
        let (head, tail) = stream.split_at(5);
        decoder.extend(head);
        assert!(decoder.next_sentence().unwrap().is_none());
        assert_eq!(decoder.buffered(), 5);

        decoder.extend(tail);
        let first = decoder.next_sentence().unwrap().unwrap();
        assert_eq!(first.kind, ReplyKind::Row);
        let second = decoder.next_sentence().unwrap().unwrap();
        assert_eq!(second.kind, ReplyKind::Done);
        assert!(decoder.next_sentence().unwrap().is_none());
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_invalid_tag_is_untagged() {
        let bytes = encode_sentence(&["!done"], 1).unwrap();
        let mut raw = bytes.clone();
        // ".tag=1" -> ".tag=x"
        let pos = raw.iter().rposition(|b| *b == b'1').unwrap();
        raw[pos] = b'x';
        let (s, _) = decode_sentence(&raw).unwrap().unwrap();
        assert_eq!(s.tag, None);
    }
}
