//! Card metadata stored in PNG `tEXt` chunks. Values are base64 so any
//! UTF-8 survives the Latin-1 chunk encoding.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use crc32fast::Hasher;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const CHUNK_OVERHEAD: usize = 12;
const MAX_KEYWORD_LEN: usize = 79;

#[derive(Debug, PartialEq, Eq)]
pub enum PngTextError {
    InvalidSignature,
    TruncatedChunk,
    InvalidCrc { chunk_type: [u8; 4] },
    MissingHeader,
    InvalidKeyword(String),
    MalformedText(&'static str),
    MissingKeyword(String),
}

impl fmt::Display for PngTextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PngTextError::InvalidSignature => write!(f, "data is not a PNG image"),
            PngTextError::TruncatedChunk => write!(f, "PNG data ends inside a chunk"),
            PngTextError::InvalidCrc { chunk_type } => write!(
                f,
                "chunk {} has a bad checksum",
                printable_chunk_type(chunk_type)
            ),
            PngTextError::MissingHeader => write!(f, "PNG has no IHDR chunk"),
            PngTextError::InvalidKeyword(keyword) => {
                write!(f, "'{}' is not a valid tEXt keyword", keyword)
            }
            PngTextError::MalformedText(reason) => write!(f, "bad tEXt chunk: {}", reason),
            PngTextError::MissingKeyword(keyword) => {
                write!(f, "no '{}' metadata in image", keyword)
            }
        }
    }
}

impl std::error::Error for PngTextError {}

struct Chunk<'a> {
    kind: [u8; 4],
    data: &'a [u8],
    /// Offset just past the CRC.
    end: usize,
}

fn read_u32(bytes: &[u8]) -> Option<u32> {
    Some(u32::from_be_bytes(bytes.get(..4)?.try_into().ok()?))
}

fn chunk_crc(kind: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    hasher.finalize()
}

/// Walk the chunks after the signature, validating lengths and CRCs.
fn chunks(png: &[u8]) -> Result<Vec<Chunk<'_>>, PngTextError> {
    if png.len() < PNG_SIGNATURE.len() || png[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(PngTextError::InvalidSignature);
    }
    let mut out = Vec::new();
    let mut offset = PNG_SIGNATURE.len();
    while offset < png.len() {
        let rest = &png[offset..];
        if rest.len() < CHUNK_OVERHEAD {
            return Err(PngTextError::TruncatedChunk);
        }
        let length = read_u32(rest).ok_or(PngTextError::TruncatedChunk)? as usize;
        let mut kind = [0u8; 4];
        kind.copy_from_slice(&rest[4..8]);
        let data_end = length
            .checked_add(8)
            .filter(|end| end + 4 <= rest.len())
            .ok_or(PngTextError::TruncatedChunk)?;
        let data = &rest[8..data_end];
        let stored = read_u32(&rest[data_end..]).ok_or(PngTextError::TruncatedChunk)?;
        if stored != chunk_crc(&kind, data) {
            return Err(PngTextError::InvalidCrc { chunk_type: kind });
        }
        offset += data_end + 4;
        out.push(Chunk {
            kind,
            data,
            end: offset,
        });
        if &kind == b"IEND" {
            break;
        }
    }
    Ok(out)
}

fn encode_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(CHUNK_OVERHEAD + data.len());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(kind, data).to_be_bytes());
    out
}

/// Copy of `png` with a `tEXt` chunk for `keyword` right after IHDR. Any
/// earlier chunk with the same keyword is dropped.
pub fn insert_text(png: &[u8], keyword: &str, value: &str) -> Result<Vec<u8>, PngTextError> {
    if keyword.is_empty()
        || keyword.len() > MAX_KEYWORD_LEN
        || !keyword.bytes().all(|b| (32..=126).contains(&b))
    {
        return Err(PngTextError::InvalidKeyword(keyword.to_string()));
    }
    let parsed = chunks(png)?;
    if parsed.first().map(|c| &c.kind) != Some(b"IHDR") {
        return Err(PngTextError::MissingHeader);
    }

    let mut payload = Vec::with_capacity(keyword.len() + 1 + value.len() * 4 / 3 + 4);
    payload.extend_from_slice(keyword.as_bytes());
    payload.push(0);
    payload.extend_from_slice(STANDARD.encode(value).as_bytes());
    let text_chunk = encode_chunk(b"tEXt", &payload);

    let mut out = Vec::with_capacity(png.len() + text_chunk.len());
    out.extend_from_slice(&PNG_SIGNATURE);
    let mut start = PNG_SIGNATURE.len();
    for (index, chunk) in parsed.iter().enumerate() {
        let same_keyword = &chunk.kind == b"tEXt" && text_keyword(chunk.data) == Some(keyword);
        if !same_keyword {
            out.extend_from_slice(&png[start..chunk.end]);
        }
        if index == 0 {
            out.extend_from_slice(&text_chunk);
        }
        start = chunk.end;
    }
    Ok(out)
}

fn text_keyword(data: &[u8]) -> Option<&str> {
    let nul = data.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&data[..nul]).ok()
}

/// Decoded value of the `tEXt` chunk named `keyword`.
pub fn extract_text(png: &[u8], keyword: &str) -> Result<String, PngTextError> {
    for chunk in chunks(png)? {
        if &chunk.kind != b"tEXt" {
            continue;
        }
        let Some(nul) = chunk.data.iter().position(|&b| b == 0) else {
            return Err(PngTextError::MalformedText("keyword is not terminated"));
        };
        if &chunk.data[..nul] != keyword.as_bytes() {
            continue;
        }
        let decoded = STANDARD
            .decode(&chunk.data[nul + 1..])
            .map_err(|_| PngTextError::MalformedText("value is not base64"))?;
        return String::from_utf8(decoded)
            .map_err(|_| PngTextError::MalformedText("value is not UTF-8"));
    }
    Err(PngTextError::MissingKeyword(keyword.to_string()))
}

fn printable_chunk_type(kind: &[u8; 4]) -> String {
    kind.iter()
        .map(|&b| if (32..=126).contains(&b) { b as char } else { '?' })
        .collect()
}
