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

use std::borrow::Cow;
use std::sync::Arc;

use crate::chars;
use crate::constants::*;
use crate::cursor::ArrayCursor;
use crate::cursor::MapCursor;
use crate::dict::JbDict;
use crate::error::Error;
use crate::error::Result;
use crate::feature::Feature;
use crate::manager::DictionaryManager;
use crate::unit::RefScope;
use crate::unit::Reference;
use crate::unit::UnitHeader;
use crate::unit::UnitType;
use crate::value::DictionaryValue;
use crate::value::Object;
use crate::value::Value;
use crate::view::ByteView;

/// A zero-copy decoding cursor over a range of JBON bytes.
///
/// Offsets are absolute positions in the backing buffer. Every unit the
/// reader looks at must end before `end()`; anything at or past the end, a
/// truncated header or an unknown lead-in reads as `undefined` and makes the
/// value accessors return their defaults. The only decode error surfaced by
/// accessors is a dictionary reference that cannot be resolved.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    view: ByteView<'a>,
    offset: usize,
    local_dict: Option<Arc<JbDict<'a>>>,
    global_dict: Option<Arc<JbDict<'static>>>,
    manager: Option<Arc<DictionaryManager>>,
}

impl<'a> Reader<'a> {
    /// Creates a reader positioned at the first byte of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::from_view(ByteView::new(bytes), 0)
    }

    /// Creates a reader over `view`, positioned `offset` bytes after its start.
    pub fn from_view(view: ByteView<'a>, offset: usize) -> Self {
        Self {
            offset: view.start() + offset,
            view,
            local_dict: None,
            global_dict: None,
            manager: None,
        }
    }

    /// Rebinds the reader to `view` without touching the attached dictionaries.
    pub fn map_view(&mut self, view: ByteView<'a>, offset: usize) {
        self.offset = view.start() + offset;
        self.view = view;
    }

    /// Rebinds the reader to `bytes[offset..offset + length]`, clamped to the buffer.
    pub fn map_bytes(&mut self, bytes: &'a [u8], offset: usize, length: Option<usize>) {
        let start = offset.min(bytes.len());
        let end = match length {
            Some(length) => start.saturating_add(length).min(bytes.len()),
            None => bytes.len(),
        };
        self.view = ByteView::with_range(bytes, start, end).unwrap_or_else(|_| ByteView::new(bytes));
        self.offset = start;
    }

    pub fn view(&self) -> ByteView<'a> {
        self.view
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn start(&self) -> usize {
        self.view.start()
    }

    pub fn end(&self) -> usize {
        self.view.end()
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn add_offset(&mut self, n: usize) {
        self.offset = self.offset.saturating_add(n);
    }

    /// Moves the exclusive end bound, clamped to `[start, buffer length]`.
    pub fn set_end(&mut self, end: usize) {
        let buf = self.view.buffer();
        let end = end.clamp(self.view.start(), buf.len());
        if let Ok(view) = ByteView::with_range(buf, self.view.start(), end) {
            self.view = view;
        }
    }

    /// Moves back to the start of the mapped range.
    pub fn reset(&mut self) {
        self.offset = self.view.start();
    }

    pub fn local_dict(&self) -> Option<&Arc<JbDict<'a>>> {
        self.local_dict.as_ref()
    }

    pub fn set_local_dict(&mut self, dict: Option<Arc<JbDict<'a>>>) {
        self.local_dict = dict;
    }

    pub fn global_dict(&self) -> Option<&Arc<JbDict<'static>>> {
        self.global_dict.as_ref()
    }

    pub fn set_global_dict(&mut self, dict: Option<Arc<JbDict<'static>>>) {
        self.global_dict = dict;
    }

    pub fn dictionary_manager(&self) -> Option<&Arc<DictionaryManager>> {
        self.manager.as_ref()
    }

    pub fn set_dictionary_manager(&mut self, manager: Option<Arc<DictionaryManager>>) {
        self.manager = manager;
    }

    #[inline]
    pub(crate) fn header(&self) -> Option<UnitHeader> {
        if self.offset >= self.view.end() {
            return None;
        }
        let header = UnitHeader::decode(&self.view, self.offset)?;
        if self.offset + header.unit_size() > self.view.end() {
            return None;
        }
        Some(header)
    }

    /// True while the cursor sits on a structurally decodable unit.
    pub fn ok(&self) -> bool {
        self.header().is_some()
    }

    pub fn eof(&self) -> bool {
        self.offset >= self.view.end()
    }

    pub fn unit_type(&self) -> UnitType {
        self.header()
            .map(|h| h.unit_type)
            .unwrap_or(UnitType::Undefined)
    }

    pub fn unit_size(&self) -> usize {
        self.header().map(|h| h.unit_size()).unwrap_or(0)
    }

    pub fn unit_header_size(&self) -> usize {
        self.header().map(|h| h.header_size).unwrap_or(0)
    }

    pub fn unit_payload_size(&self) -> usize {
        self.header().map(|h| h.payload_size).unwrap_or(0)
    }

    /// Skips the current unit. Returns `false`, leaving the cursor at the end
    /// bound, when the next position would be at or past the end.
    pub fn next_unit(&mut self) -> bool {
        match self.header() {
            Some(header) => {
                let next = self.offset + header.unit_size();
                if next >= self.view.end() {
                    self.offset = self.view.end();
                    false
                } else {
                    self.offset = next;
                    true
                }
            }
            None => {
                self.offset = self.view.end();
                false
            }
        }
    }

    #[inline]
    fn lead(&self) -> Option<u8> {
        self.header().map(|h| h.lead)
    }

    pub fn is_null(&self) -> bool {
        self.lead() == Some(NULL_TAG)
    }

    pub fn is_undefined(&self) -> bool {
        self.unit_type() == UnitType::Undefined
    }

    pub fn is_bool(&self) -> bool {
        self.unit_type() == UnitType::Bool
    }

    pub fn is_int(&self) -> bool {
        self.unit_type() == UnitType::Int
    }

    /// True for integers stored in a size class of at most 32 bits.
    pub fn is_int32(&self) -> bool {
        self.is_int() && self.lead() != Some(INT64_TAG)
    }

    pub fn is_float32(&self) -> bool {
        self.unit_type() == UnitType::Float32
    }

    pub fn is_float64(&self) -> bool {
        self.unit_type() == UnitType::Float64
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self.unit_type(),
            UnitType::Int | UnitType::Float32 | UnitType::Float64
        )
    }

    pub fn is_timestamp(&self) -> bool {
        self.unit_type() == UnitType::Timestamp
    }

    /// True for literal strings and tokenized text.
    pub fn is_string(&self) -> bool {
        self.unit_type() == UnitType::Str
    }

    pub fn is_text(&self) -> bool {
        self.header().map(|h| h.is_text()).unwrap_or(false)
    }

    pub fn is_ref(&self) -> bool {
        self.unit_type() == UnitType::Ref
    }

    pub fn is_global_ref(&self) -> bool {
        self.header().and_then(|h| h.ref_scope()) == Some(RefScope::Global)
    }

    pub fn is_local_ref(&self) -> bool {
        self.header().and_then(|h| h.ref_scope()) == Some(RefScope::Local)
    }

    pub fn is_map(&self) -> bool {
        self.unit_type() == UnitType::Map
    }

    pub fn is_array(&self) -> bool {
        self.unit_type() == UnitType::Array
    }

    pub fn is_feature(&self) -> bool {
        self.unit_type() == UnitType::Feature
    }

    pub fn is_dictionary(&self) -> bool {
        self.unit_type() == UnitType::Dictionary
    }

    pub fn read_boolean(&self, default: bool) -> bool {
        match self.lead() {
            Some(TRUE_TAG) => true,
            Some(FALSE_TAG) => false,
            _ => default,
        }
    }

    /// Reads an integer stored in a 32-bit or smaller size class.
    pub fn read_int32(&self, default: i32) -> i32 {
        match self.header() {
            Some(h) if h.unit_type == UnitType::Int && h.lead != INT64_TAG => {
                self.int_value(&h).map(|v| v as i32).unwrap_or(default)
            }
            _ => default,
        }
    }

    pub fn read_int64(&self, default: i64) -> i64 {
        match self.header() {
            Some(h) if h.unit_type == UnitType::Int => self.int_value(&h).unwrap_or(default),
            _ => default,
        }
    }

    /// Reads any number as `f32`. With `strict`, a value that cannot be
    /// represented exactly reads as `NaN`.
    pub fn read_float32(&self, default: f32, strict: bool) -> f32 {
        let Some(h) = self.header() else {
            return default;
        };
        let pos = self.offset + h.header_size;
        match h.unit_type {
            UnitType::Float32 => self.view.get_f32(pos, LE).unwrap_or(default),
            UnitType::Float64 => match self.view.get_f64(pos, LE) {
                Ok(v) => {
                    let narrowed = v as f32;
                    if strict && !v.is_nan() && narrowed as f64 != v {
                        f32::NAN
                    } else {
                        narrowed
                    }
                }
                Err(_) => default,
            },
            UnitType::Int => match self.int_value(&h) {
                Some(v) => {
                    let narrowed = v as f32;
                    if strict && narrowed as i128 != v as i128 {
                        f32::NAN
                    } else {
                        narrowed
                    }
                }
                None => default,
            },
            _ => default,
        }
    }

    /// Reads any number as `f64`. With `strict`, a 64-bit integer that cannot
    /// be represented exactly reads as `NaN`.
    pub fn read_float64(&self, default: f64, strict: bool) -> f64 {
        let Some(h) = self.header() else {
            return default;
        };
        let pos = self.offset + h.header_size;
        match h.unit_type {
            UnitType::Float32 => self.view.get_f32(pos, LE).map(|v| v as f64).unwrap_or(default),
            UnitType::Float64 => self.view.get_f64(pos, LE).unwrap_or(default),
            UnitType::Int => match self.int_value(&h) {
                Some(v) => {
                    let widened = v as f64;
                    if strict && widened as i128 != v as i128 {
                        f64::NAN
                    } else {
                        widened
                    }
                }
                None => default,
            },
            _ => default,
        }
    }

    /// Reads a timestamp in milliseconds since the Unix epoch.
    pub fn read_timestamp(&self, default: i64) -> i64 {
        match self.header() {
            Some(h) if h.unit_type == UnitType::Timestamp => self
                .view
                .get_i64(self.offset + h.header_size, LE)
                .unwrap_or(default),
            _ => default,
        }
    }

    pub fn read_ref(&self) -> Option<Reference> {
        let h = self.header()?;
        let scope = h.ref_scope()?;
        let pos = self.offset + h.header_size;
        let index = match h.lead {
            0x80..=0x9F => Some((h.lead & EMBEDDED_REF_INDEX_MASK) as u32),
            0xA0 | 0xA1 => None,
            0xA2 | 0xA3 => Some(self.view.get_u16(pos, LE).ok()? as u32 + REF16_BIAS),
            _ => Some(self.view.get_u32(pos, LE).ok()?),
        };
        Some(Reference { scope, index })
    }

    /// Reads a literal string, tokenized text or a resolved reference.
    ///
    /// Returns `Ok(None)` for any other unit and for null references, and an
    /// error when a reference has no dictionary to resolve against.
    pub fn read_string(&self) -> Result<Option<Cow<'a, str>>> {
        let Some(h) = self.header() else {
            return Ok(None);
        };
        match h.unit_type {
            UnitType::Str => {
                let payload = self.payload(&h)?;
                if h.is_text() {
                    self.decode_text(payload).map(|s| Some(Cow::Owned(s)))
                } else {
                    chars::decode(payload).map(Some)
                }
            }
            UnitType::Ref => match self.read_ref() {
                Some(reference) => self.resolve(reference),
                None => Ok(None),
            },
            _ => Ok(None),
        }
    }

    /// Looks up the string a reference stands for.
    pub fn resolve(&self, reference: Reference) -> Result<Option<Cow<'a, str>>> {
        let Some(index) = reference.index else {
            return Ok(None);
        };
        let unresolved = Error::UnresolvedReference {
            scope: reference.scope,
            index,
        };
        let word = match reference.scope {
            RefScope::Local => match &self.local_dict {
                Some(dict) => dict.get(index as usize)?.map(|w| w.to_string()),
                None => None,
            },
            RefScope::Global => match &self.global_dict {
                Some(dict) => dict.get(index as usize)?.map(|w| w.to_string()),
                None => None,
            },
        };
        match word {
            Some(word) => Ok(Some(Cow::Owned(word))),
            None => Err(unresolved),
        }
    }

    /// Decodes the current unit and everything nested in it.
    ///
    /// References are resolved into strings; a null reference reads as `Null`.
    pub fn read_value(&self) -> Result<Value<'a>> {
        let Some(h) = self.header() else {
            return Ok(Value::Undefined);
        };
        let value = match h.unit_type {
            UnitType::Null => Value::Null,
            UnitType::Undefined => Value::Undefined,
            UnitType::Bool => Value::Bool(self.read_boolean(false)),
            UnitType::Int => Value::Int(self.int_value(&h).ok_or(Error::InvalidUnit)?),
            UnitType::Float32 => Value::Float32(self.read_float32(f32::NAN, false)),
            UnitType::Float64 => Value::Float64(self.read_float64(f64::NAN, false)),
            UnitType::Timestamp => Value::Timestamp(self.read_timestamp(0)),
            UnitType::Str | UnitType::Ref => match self.read_string()? {
                Some(s) => Value::Str(s),
                None => Value::Null,
            },
            UnitType::Map => {
                let mut object = Object::new();
                if let Some(mut cursor) = self.as_map() {
                    while cursor.next() {
                        let key = cursor.key()?.ok_or(Error::InvalidUnit)?;
                        let value = cursor.value().read_value()?;
                        object.insert(key.into_owned(), value);
                    }
                }
                Value::Map(object)
            }
            UnitType::Array => {
                let mut items = Vec::new();
                if let Some(mut cursor) = self.as_array() {
                    items.reserve(cursor.length());
                    while cursor.next() {
                        items.push(cursor.value().read_value()?);
                    }
                }
                Value::Array(items)
            }
            UnitType::Feature => {
                let feature = Feature::from_reader(self)?;
                feature.to_value()?
            }
            UnitType::Dictionary => {
                let dict = JbDict::from_view(self.view, self.offset)?;
                Value::Dictionary(DictionaryValue {
                    id: dict.id().map(|id| id.to_string()),
                    words: dict.words()?.to_vec(),
                })
            }
        };
        Ok(value)
    }

    pub fn as_map(&self) -> Option<MapCursor<'a>> {
        if !self.is_map() {
            return None;
        }
        self.children().map(MapCursor::new)
    }

    pub fn as_array(&self) -> Option<ArrayCursor<'a>> {
        if !self.is_array() {
            return None;
        }
        self.children().map(ArrayCursor::new)
    }

    /// A reader bound to the payload of the current container unit, sharing
    /// this reader's dictionaries.
    pub(crate) fn children(&self) -> Option<Reader<'a>> {
        let h = self.header()?;
        let start = self.offset + h.header_size;
        let end = self.offset + h.unit_size();
        let view = ByteView::with_range(self.view.buffer(), start, end).ok()?;
        let mut reader = self.clone();
        reader.map_view(view, 0);
        Some(reader)
    }

    fn payload(&self, h: &UnitHeader) -> Result<&'a [u8]> {
        let start = self.offset + h.header_size;
        self.view.slice(start..start + h.payload_size)
    }

    fn int_value(&self, h: &UnitHeader) -> Option<i64> {
        let pos = self.offset + h.header_size;
        match h.lead {
            0x00..=0x1F => Some((((h.lead << 3) as i8) >> 3) as i64),
            INT8_TAG => self.view.get_i8(pos).ok().map(|v| v as i64),
            INT16_TAG => self.view.get_i16(pos, LE).ok().map(|v| v as i64),
            INT32_TAG => self.view.get_i32(pos, LE).ok().map(|v| v as i64),
            INT64_TAG => self.view.get_i64(pos, LE).ok(),
            _ => None,
        }
    }

    fn decode_text(&self, payload: &[u8]) -> Result<String> {
        if payload.len() % TEXT_REF_SIZE != 0 {
            return Err(Error::InvalidString);
        }
        let mut text = String::new();
        for (i, chunk) in payload.chunks_exact(TEXT_REF_SIZE).enumerate() {
            let index = u16::from_le_bytes([chunk[0], chunk[1]]) as u32;
            let word = self.resolve(Reference {
                scope: RefScope::Local,
                index: Some(index),
            })?;
            if i > 0 {
                text.push(TEXT_WORD_SEPARATOR);
            }
            if let Some(word) = word {
                text.push_str(&word);
            }
        }
        Ok(text)
    }
}
