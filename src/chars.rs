// Copyright 2023 Datafuse Labs.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Code-point encoding used inside JBON string payloads.
//!
//! - `U+0000..=U+007F`: one byte, the ASCII value.
//! - `U+0080..=U+407F`: two bytes, `0x80 | v >> 8` then `v & 0xFF`, with `v = cp - 0x80`.
//! - everything else: three bytes, `0xC0 | cp >> 16` then the low 16 bits big-endian.

use std::borrow::Cow;

use crate::constants::*;
use crate::error::Error;
use crate::error::Result;

/// Number of payload bytes `s` takes once encoded.
pub(crate) fn encoded_len(s: &str) -> usize {
    s.chars().map(char_len).sum()
}

#[inline]
fn char_len(c: char) -> usize {
    let cp = c as u32;
    if cp < 0x80 {
        1
    } else if cp <= TWO_BYTE_CHAR_MAX {
        2
    } else {
        3
    }
}

pub(crate) fn encode_into(buf: &mut Vec<u8>, s: &str) {
    if s.is_ascii() {
        buf.extend_from_slice(s.as_bytes());
        return;
    }
    for c in s.chars() {
        let cp = c as u32;
        if cp < 0x80 {
            buf.push(cp as u8);
        } else if cp <= TWO_BYTE_CHAR_MAX {
            let v = cp - TWO_BYTE_CHAR_BIAS;
            buf.push(TWO_BYTE_CHAR_FLAG | (v >> 8) as u8);
            buf.push(v as u8);
        } else {
            buf.push(THREE_BYTE_CHAR_FLAG | (cp >> 16) as u8);
            buf.extend_from_slice(&(cp as u16).to_be_bytes());
        }
    }
}

/// Decodes a string payload, borrowing it when every byte is ASCII.
pub(crate) fn decode(data: &[u8]) -> Result<Cow<'_, str>> {
    if data.is_ascii() {
        // ASCII is valid UTF-8
        let s = std::str::from_utf8(data).map_err(|_| Error::InvalidString)?;
        return Ok(Cow::Borrowed(s));
    }
    let mut out = String::with_capacity(data.len());
    let mut idx = 0;
    while idx < data.len() {
        let b0 = data[idx];
        let cp = if b0 < 0x80 {
            idx += 1;
            b0 as u32
        } else if b0 & CHAR_CLASS_MASK == TWO_BYTE_CHAR_FLAG {
            let b1 = *data.get(idx + 1).ok_or(Error::InvalidString)?;
            idx += 2;
            ((((b0 & 0x3F) as u32) << 8) | b1 as u32) + TWO_BYTE_CHAR_BIAS
        } else {
            let low = data.get(idx + 1..idx + 3).ok_or(Error::InvalidString)?;
            idx += 3;
            (((b0 & 0x3F) as u32) << 16) | ((low[0] as u32) << 8) | low[1] as u32
        };
        out.push(char::from_u32(cp).ok_or(Error::InvalidString)?);
    }
    Ok(Cow::Owned(out))
}
