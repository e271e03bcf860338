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

use std::collections::HashSet;
use std::sync::Arc;

use byteorder::LittleEndian;
use byteorder::WriteBytesExt;
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::chars;
use crate::constants::*;
use crate::dict::JbDict;
use crate::dict::WordList;
use crate::error::Error;
use crate::error::Result;
use crate::options::EncodeOptions;
use crate::reader::Reader;
use crate::unit::container_lead;
use crate::unit::size_class;
use crate::unit::RefScope;
use crate::value::Value;
use crate::view::ByteViewMut;

/// Append-only JBON encoder.
///
/// Every `write_*` call appends one unit and returns the offset it starts at.
/// Containers are opened with `start_map`/`start_array` and closed with the
/// matching `end_*` call; the header is reserved at its widest size and
/// compacted on close, which moves the container's children.
#[derive(Debug, Default)]
pub struct Builder {
    buf: Vec<u8>,
    local_dict: WordList,
    global_dict: Option<Arc<JbDict<'static>>>,
    open: Vec<usize>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    /// Keys found in `dict` are written as global references and the
    /// dictionary id is recorded in built features.
    pub fn with_global_dict(mut self, dict: Arc<JbDict<'static>>) -> Self {
        self.global_dict = Some(dict);
        self
    }

    pub fn set_global_dict(&mut self, dict: Option<Arc<JbDict<'static>>>) {
        self.global_dict = dict;
    }

    pub fn global_dict(&self) -> Option<&Arc<JbDict<'static>>> {
        self.global_dict.as_ref()
    }

    pub fn local_dict(&self) -> &WordList {
        &self.local_dict
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Empties the buffer and the local dictionary, keeping their allocations.
    /// Returns the number of bytes discarded.
    pub fn clear(&mut self) -> usize {
        let written = self.buf.len();
        self.buf.clear();
        self.local_dict.clear();
        self.open.clear();
        written
    }

    /// Like [`Builder::clear`], and also detaches the global dictionary.
    pub fn reset(&mut self) -> usize {
        self.global_dict = None;
        self.clear()
    }

    pub fn write_null(&mut self) -> Result<usize> {
        self.write_tag(NULL_TAG)
    }

    pub fn write_undefined(&mut self) -> Result<usize> {
        self.write_tag(UNDEFINED_TAG)
    }

    pub fn write_bool(&mut self, v: bool) -> Result<usize> {
        self.write_tag(if v { TRUE_TAG } else { FALSE_TAG })
    }

    pub fn write_int(&mut self, v: i32) -> Result<usize> {
        self.write_int64(v as i64)
    }

    /// Writes `v` in the smallest integer size class that holds it.
    pub fn write_int64(&mut self, v: i64) -> Result<usize> {
        if (EMBEDDED_INT_MIN..=EMBEDDED_INT_MAX).contains(&v) {
            return self.write_embedded_int(v);
        }
        let start = self.buf.len();
        if let Ok(v) = i8::try_from(v) {
            self.buf.push(INT8_TAG);
            self.buf.write_i8(v)?;
        } else if let Ok(v) = i16::try_from(v) {
            self.buf.push(INT16_TAG);
            self.buf.write_i16::<LittleEndian>(v)?;
        } else if let Ok(v) = i32::try_from(v) {
            self.buf.push(INT32_TAG);
            self.buf.write_i32::<LittleEndian>(v)?;
        } else {
            self.buf.push(INT64_TAG);
            self.buf.write_i64::<LittleEndian>(v)?;
        }
        Ok(start)
    }

    /// Writes a one-byte integer; fails for values outside `[-16, 15]`.
    pub fn write_embedded_int(&mut self, v: i64) -> Result<usize> {
        if !(EMBEDDED_INT_MIN..=EMBEDDED_INT_MAX).contains(&v) {
            return Err(Error::ValueOutOfRange {
                value: v,
                min: EMBEDDED_INT_MIN,
                max: EMBEDDED_INT_MAX,
            });
        }
        self.write_tag(EMBEDDED_INT_TAG | (v as u8 & INLINE_VALUE_MASK))
    }

    pub fn write_float(&mut self, v: f32) -> Result<usize> {
        if let Some(i) = embeddable_integral(v as f64) {
            return self.write_embedded_int(i);
        }
        let start = self.buf.len();
        self.buf.push(FLOAT32_TAG);
        self.buf.write_f32::<LittleEndian>(v)?;
        Ok(start)
    }

    pub fn write_double(&mut self, v: f64) -> Result<usize> {
        if let Some(i) = embeddable_integral(v) {
            return self.write_embedded_int(i);
        }
        let start = self.buf.len();
        self.buf.push(FLOAT64_TAG);
        self.buf.write_f64::<LittleEndian>(v)?;
        Ok(start)
    }

    /// Writes a timestamp in milliseconds since the Unix epoch.
    pub fn write_timestamp(&mut self, millis: i64) -> Result<usize> {
        let start = self.buf.len();
        self.buf.push(TIMESTAMP_TAG);
        self.buf.write_i64::<LittleEndian>(millis)?;
        Ok(start)
    }

    /// Writes a dictionary reference; `None` is the null reference.
    pub fn write_ref(&mut self, index: Option<u32>, scope: RefScope) -> Result<usize> {
        let local = scope == RefScope::Local;
        let sized_flag = if local { SIZED_REF_LOCAL_FLAG } else { 0 };
        let Some(index) = index else {
            return self.write_tag(NULL_REF_TAG | sized_flag);
        };
        if index <= EMBEDDED_REF_MAX {
            return self.write_embedded_ref(index, scope);
        }
        let start = self.buf.len();
        if index <= REF16_MAX {
            self.buf.push(REF16_TAG | sized_flag);
            self.buf
                .write_u16::<LittleEndian>((index - REF16_BIAS) as u16)?;
        } else {
            self.buf.push(REF32_TAG | sized_flag);
            self.buf.write_u32::<LittleEndian>(index)?;
        }
        Ok(start)
    }

    /// Writes a one-byte reference; fails for indices above 15.
    pub fn write_embedded_ref(&mut self, index: u32, scope: RefScope) -> Result<usize> {
        if index > EMBEDDED_REF_MAX {
            return Err(Error::ValueOutOfRange {
                value: index as i64,
                min: 0,
                max: EMBEDDED_REF_MAX as i64,
            });
        }
        let flag = match scope {
            RefScope::Local => EMBEDDED_REF_LOCAL_FLAG,
            RefScope::Global => 0,
        };
        self.write_tag(EMBEDDED_REF_TAG | flag | index as u8)
    }

    /// Writes `s` verbatim.
    pub fn write_string(&mut self, s: &str) -> Result<usize> {
        let start = self.buf.len();
        encode_string(&mut self.buf, s)?;
        Ok(start)
    }

    /// Writes `s` as space-separated words, each stored as a two-byte
    /// reference into the local dictionary.
    pub fn write_text(&mut self, s: &str) -> Result<usize> {
        let words: Vec<&str> = if s.is_empty() {
            Vec::new()
        } else {
            s.split(TEXT_WORD_SEPARATOR).collect()
        };
        let mut added = HashSet::new();
        for word in words.iter() {
            if self.local_dict.index_of(word).is_none() {
                added.insert(*word);
            }
        }
        // every word must stay addressable by a u16 before anything is interned
        let entries = self.local_dict.len() + added.len();
        if entries > u16::MAX as usize + 1 {
            return Err(Error::DictionaryOverflow(entries));
        }
        let mut refs = Vec::with_capacity(words.len());
        for word in words {
            refs.push(self.add_to_local_dictionary(word) as u16);
        }
        let start = self.buf.len();
        let len = refs.len() * TEXT_REF_SIZE;
        write_sized_header(&mut self.buf, SHORT_TEXT_TAG, TEXT8_TAG, len)?;
        for index in refs {
            self.buf.write_u16::<LittleEndian>(index)?;
        }
        Ok(start)
    }

    /// Writes a map key: a local reference when the key is interned, a global
    /// reference when the attached global dictionary has it, else a literal.
    pub fn write_key(&mut self, name: &str) -> Result<usize> {
        if let Some(index) = self.local_dict.index_of(name) {
            return self.write_ref(Some(index as u32), RefScope::Local);
        }
        if let Some(dict) = &self.global_dict {
            if let Some(index) = dict.index_of(name)? {
                return self.write_ref(Some(index as u32), RefScope::Global);
            }
        }
        self.write_string(name)
    }

    /// Interns `word` and returns its stable local index.
    pub fn add_to_local_dictionary(&mut self, word: &str) -> usize {
        self.local_dict.insert(word)
    }

    pub fn start_map(&mut self) -> usize {
        self.start_container(MAP_KIND)
    }

    pub fn end_map(&mut self, start: usize) -> Result<usize> {
        self.end_container(MAP_KIND, start)
    }

    pub fn start_array(&mut self) -> usize {
        self.start_container(ARRAY_KIND)
    }

    pub fn end_array(&mut self, start: usize) -> Result<usize> {
        self.end_container(ARRAY_KIND, start)
    }

    fn start_container(&mut self, kind: u8) -> usize {
        let start = self.buf.len();
        self.buf.push(container_lead(kind, SIZE_CLASS_U32));
        self.buf.extend_from_slice(&[0; RESERVED_HEADER_SIZE - 1]);
        self.open.push(start);
        start
    }

    fn end_container(&mut self, kind: u8, start: usize) -> Result<usize> {
        if self.open.last() != Some(&start)
            || self.buf[start] != container_lead(kind, SIZE_CLASS_U32)
        {
            return Err(Error::UnbalancedContainer(start));
        }
        self.open.pop();

        let payload_start = start + RESERVED_HEADER_SIZE;
        let len = self.buf.len() - payload_start;
        let (class, width) = size_class(len).ok_or(Error::PayloadTooLarge(len))?;
        let mut header = ByteViewMut::with_range(&mut self.buf, start, payload_start)?;
        header.set_u8(start, container_lead(kind, class))?;
        match class {
            SIZE_CLASS_U8 => header.set_u8(start + 1, len as u8)?,
            SIZE_CLASS_U16 => header.set_u16(start + 1, len as u16, LE)?,
            _ => header.set_u32(start + 1, len as u32, LE)?,
        }
        let header_size = 1 + width;
        if header_size < RESERVED_HEADER_SIZE {
            self.buf.copy_within(payload_start.., start + header_size);
            self.buf.truncate(start + header_size + len);
        }
        Ok(start)
    }

    /// Encodes a whole value tree.
    pub fn write_value(&mut self, value: &Value<'_>, options: &EncodeOptions) -> Result<usize> {
        match value {
            Value::Null => self.write_null(),
            Value::Undefined => self.write_undefined(),
            Value::Bool(v) => self.write_bool(*v),
            Value::Int(v) => self.write_int64(*v),
            Value::Float32(v) => self.write_float(*v),
            Value::Float64(v) => self.write_double(*v),
            Value::Timestamp(v) => self.write_timestamp(*v),
            Value::Str(s) => self.write_str_with(s, options),
            Value::Ref(r) => self.write_ref(r.index, r.scope),
            Value::Map(object) => {
                let start = self.start_map();
                for (key, val) in object.iter() {
                    self.write_key_with(key, options)?;
                    self.write_value(val, options)?;
                }
                self.end_map(start)
            }
            Value::Array(items) => {
                let start = self.start_array();
                for item in items.iter() {
                    self.write_value(item, options)?;
                }
                self.end_array(start)
            }
            Value::Feature(feature) => {
                let mut inner = Builder::new();
                inner.set_global_dict(self.global_dict.clone());
                inner.write_value(&feature.value, options)?;
                let bytes = inner.build_feature(feature.id.as_deref(), feature.variant)?;
                let start = self.buf.len();
                self.buf.extend_from_slice(&bytes);
                Ok(start)
            }
            Value::Dictionary(dict) => {
                let start = self.buf.len();
                encode_dictionary(&mut self.buf, dict.id.as_deref(), &dict.words)?;
                Ok(start)
            }
        }
    }

    /// Encodes a parsed JSON document.
    ///
    /// Integers outside the `i64` range are stored as `float64`.
    pub fn write_json(&mut self, value: &JsonValue, options: &EncodeOptions) -> Result<usize> {
        match value {
            JsonValue::Null => self.write_null(),
            JsonValue::Bool(v) => self.write_bool(*v),
            JsonValue::Number(n) => match n.as_i64() {
                Some(v) => self.write_int64(v),
                None => self.write_double(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => self.write_str_with(s, options),
            JsonValue::Array(items) => {
                let start = self.start_array();
                for item in items.iter() {
                    self.write_json(item, options)?;
                }
                self.end_array(start)
            }
            JsonValue::Object(object) => {
                let start = self.start_map();
                for (key, val) in object.iter() {
                    self.write_key_with(key, options)?;
                    self.write_json(val, options)?;
                }
                self.end_map(start)
            }
        }
    }

    fn write_key_with(&mut self, key: &str, options: &EncodeOptions) -> Result<usize> {
        if options.intern_keys && !self.in_global_dict(key)? {
            self.add_to_local_dictionary(key);
        }
        self.write_key(key)
    }

    fn in_global_dict(&self, key: &str) -> Result<bool> {
        match &self.global_dict {
            Some(dict) => Ok(dict.index_of(key)?.is_some()),
            None => Ok(false),
        }
    }

    fn write_str_with(&mut self, s: &str, options: &EncodeOptions) -> Result<usize> {
        if options.should_tokenize(s) {
            self.write_text(s)
        } else {
            self.write_string(s)
        }
    }

    /// Serializes the local dictionary as a standalone dictionary unit.
    pub fn build_dictionary(&self, id: Option<&str>) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        encode_dictionary(&mut out, id, self.local_dict.words())?;
        trace!(
            entries = self.local_dict.len(),
            bytes = out.len(),
            "built dictionary"
        );
        Ok(out)
    }

    /// Wraps everything written so far into a feature unit, preceded by the
    /// global dictionary id, `id` and the local dictionary when it is non-empty
    /// or the payload starts with a dictionary unit.
    pub fn build_feature(&self, id: Option<&str>, variant: u8) -> Result<Vec<u8>> {
        if let Some(start) = self.open.last() {
            return Err(Error::UnbalancedContainer(*start));
        }
        let mut body = Vec::with_capacity(self.buf.len() + 16);
        body.push(variant);
        encode_optional_string(&mut body, self.global_dict.as_ref().and_then(|d| d.id()))?;
        encode_optional_string(&mut body, id)?;
        // a payload that is itself a dictionary needs the local slot filled,
        // even when empty, so readers do not take it for the local dictionary
        if !self.local_dict.is_empty() || self.payload_is_dictionary() {
            encode_dictionary(&mut body, None, self.local_dict.words())?;
        }
        if self.buf.is_empty() {
            body.push(UNDEFINED_TAG);
        } else {
            body.extend_from_slice(&self.buf);
        }

        let mut out = Vec::with_capacity(body.len() + RESERVED_HEADER_SIZE);
        encode_container(&mut out, FEATURE_KIND, &body)?;
        trace!(
            id = ?id,
            variant,
            dictionary_entries = self.local_dict.len(),
            bytes = out.len(),
            "built feature"
        );
        Ok(out)
    }

    fn payload_is_dictionary(&self) -> bool {
        Reader::new(&self.buf).is_dictionary()
    }

        fn write_tag(&mut self, tag: u8) -> Result<usize> {
        let start = self.buf.len();
        self.buf.push(tag);
        Ok(start)
    }
}

fn embeddable_integral(v: f64) -> Option<i64> {
    let integral = v.fract() == 0.0
        && v >= EMBEDDED_INT_MIN as f64
        && v <= EMBEDDED_INT_MAX as f64
        && !(v == 0.0 && v.is_sign_negative());
    if integral {
        Some(v as i64)
    } else {
        None
    }
}

/// Writes a string-like header: the inline form up to 31 bytes, else the
/// sized tag (`sized_tag`, `+1`, `+2` for u8/u16/u32 size fields).
fn write_sized_header(buf: &mut Vec<u8>, short_tag: u8, sized_tag: u8, len: usize) -> Result<()> {
    if len <= SHORT_LEN_MAX {
        buf.push(short_tag | len as u8);
        return Ok(());
    }
    let (class, _) = size_class(len).ok_or(Error::PayloadTooLarge(len))?;
    match class {
        SIZE_CLASS_U8 => {
            buf.push(sized_tag);
            buf.write_u8(len as u8)?;
        }
        SIZE_CLASS_U16 => {
            buf.push(sized_tag + 1);
            buf.write_u16::<LittleEndian>(len as u16)?;
        }
        _ => {
            buf.push(sized_tag + 2);
            buf.write_u32::<LittleEndian>(len as u32)?;
        }
    }
    Ok(())
}

pub(crate) fn encode_string(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    let len = chars::encoded_len(s);
    write_sized_header(buf, SHORT_STR_TAG, STR8_TAG, len)?;
    chars::encode_into(buf, s);
    Ok(())
}

fn encode_optional_string(buf: &mut Vec<u8>, s: Option<&str>) -> Result<()> {
    match s {
        Some(s) => encode_string(buf, s),
        None => {
            buf.push(NULL_TAG);
            Ok(())
        }
    }
}

fn encode_container(buf: &mut Vec<u8>, kind: u8, payload: &[u8]) -> Result<()> {
    let len = payload.len();
    let (class, width) = size_class(len).ok_or(Error::PayloadTooLarge(len))?;
    buf.push(container_lead(kind, class));
    buf.extend_from_slice(&(len as u32).to_le_bytes()[..width]);
    buf.extend_from_slice(payload);
    Ok(())
}

pub(crate) fn encode_dictionary<S: AsRef<str>>(
    buf: &mut Vec<u8>,
    id: Option<&str>,
    words: &[S],
) -> Result<()> {
    let mut payload = Vec::new();
    encode_optional_string(&mut payload, id)?;
    for word in words {
        encode_string(&mut payload, word.as_ref())?;
    }
    encode_container(buf, DICTIONARY_KIND, &payload)
}
