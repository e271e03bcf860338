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

#![allow(clippy::uninlined_format_args)]

//! `jbon` is a compact binary encoding for the properties of geographic
//! features, designed to be read in place without deserialization.
//!
//! ## Features
//!
//! - Compact: small integers, short strings and dictionary references take a single byte.
//! - Zero-copy: a [`Reader`] navigates the encoded bytes directly and borrows strings from them.
//! - Shared vocabularies: property names and words can be stored once in a local dictionary
//!   embedded in each feature, or in a global dictionary registered with a [`DictionaryManager`].
//!
//! ## Encoding format
//!
//! A JBON buffer is a sequence of units. Each unit starts with a one-byte lead-in that identifies
//! its type, optionally followed by a little-endian size field, followed by the payload.
//!
//! - `0x00..=0x1F`: integer `-16..=15` embedded in the lead-in.
//! - `0x20..=0x3F` / `0x40..=0x5F`: literal string / tokenized text up to 31 bytes, length in the lead-in.
//! - `0x60..=0x63`: `null`, `undefined`, `false`, `true`.
//! - `0x64..=0x6A`: int8, int16, int32, int64, float32, float64, timestamp.
//! - `0x6B..=0x70`: literal string / tokenized text with a u8, u16 or u32 size field.
//! - `0x80..=0xA5`: global and local dictionary references.
//! - `0xC0..=0xCF`: containers, `0xC0 | kind << 2 | size class`, for maps, arrays, features and
//!   dictionaries.
//!
//! #### An encoding example
//!
//! ```text
//! // value
//! {"lanes":2,"name":"Main St"}
//!
//! // JBON encoding
//! 0xC0 0x14            map, payload of 20 bytes
//! 0x25 lanes           key, 5 byte literal string
//! 0x02                 embedded integer 2
//! 0x24 name            key, 4 byte literal string
//! 0x27 Main St         7 byte literal string
//! ```
//!
//! ## Example
//!
//! ```rust
//! use jbon::Builder;
//! use jbon::EncodeOptions;
//! use jbon::Feature;
//!
//! let json: serde_json::Value = serde_json::from_str(r#"{"name":"Main St","lanes":2}"#).unwrap();
//!
//! let mut builder = Builder::new();
//! builder.write_json(&json, &EncodeOptions::default()).unwrap();
//! let bytes = builder.build_feature(Some("way/42"), 0).unwrap();
//!
//! let feature = Feature::from_bytes(&bytes, None).unwrap();
//! assert_eq!(feature.id(), Some("way/42"));
//! let mut properties = feature.reader().as_map().unwrap();
//! let lanes = properties.get("lanes").unwrap().unwrap();
//! assert_eq!(lanes.read_int32(0), 2);
//! ```

mod builder;
mod chars;
mod constants;
mod cursor;
mod dict;
mod error;
mod feature;
mod from;
mod manager;
mod options;
mod reader;
mod unit;
mod value;
mod view;

use std::sync::Arc;

use unit::UnitHeader;

pub use builder::Builder;
pub use cursor::ArrayCursor;
pub use cursor::MapCursor;
pub use cursor::Position;
pub use dict::JbDict;
pub use dict::WordList;
pub use error::Error;
pub use error::Result;
pub use feature::Feature;
pub use manager::DictionaryManager;
pub use options::EncodeOptions;
pub use reader::Reader;
pub use unit::RefScope;
pub use unit::Reference;
pub use unit::UnitType;
pub use value::DictionaryValue;
pub use value::FeatureValue;
pub use value::Object;
pub use value::Value;
pub use view::ByteView;
pub use view::ByteViewMut;

/// Encodes `value` as a standalone unit. Keys and strings are written
/// literally so the result decodes without any dictionary.
pub fn encode_value(value: &Value<'_>) -> Result<Vec<u8>> {
    let mut builder = Builder::new();
    builder.write_value(value, &EncodeOptions::literal())?;
    Ok(builder.as_bytes().to_vec())
}

/// Encodes `value` as the payload of a feature unit, with its local
/// dictionary embedded.
pub fn encode_feature(
    value: &Value<'_>,
    id: Option<&str>,
    options: &EncodeOptions,
) -> Result<Vec<u8>> {
    let mut builder = Builder::new();
    builder.write_value(value, options)?;
    builder.build_feature(id, options.variant)
}

/// Decodes the unit at the start of `buf`.
pub fn from_slice(buf: &[u8]) -> Result<Value<'_>> {
    let reader = Reader::new(buf);
    if !reader.ok() {
        // a known lead-in whose unit does not fit is a truncation
        let padded = buf.first().map(|lead| [*lead, 0, 0, 0, 0]);
        return Err(match padded {
            Some(header) if UnitHeader::decode(&ByteView::new(&header), 0).is_some() => {
                Error::InvalidEOF
            }
            Some(header) => Error::InvalidLeadIn(header[0]),
            None => Error::InvalidEOF,
        });
    }
    reader.read_value()
}

/// Decodes a feature unit; global references resolve through `manager`.
pub fn decode_feature<'a>(
    buf: &'a [u8],
    manager: Option<Arc<DictionaryManager>>,
) -> Result<FeatureValue<'a>> {
    let feature = Feature::from_bytes(buf, manager)?;
    Ok(FeatureValue {
        id: feature.id().map(str::to_string),
        global_dict_id: feature.global_dict_id().map(str::to_string),
        variant: feature.variant(),
        value: feature.value()?,
    })
}
