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
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::ser::SerializeMap;
use serde::ser::SerializeSeq;
use serde::Serialize;
use serde::Serializer;

use crate::constants::*;
use crate::unit::Reference;

pub type Object<'a> = BTreeMap<String, Value<'a>>;

/// An owned or borrowed tree of JBON values.
///
/// Strings decoded from a buffer borrow from it when they need no
/// transcoding; `into_owned` detaches the whole tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value<'a> {
    #[default]
    Null,
    Undefined,
    Bool(bool),
    Int(i64),
    Float32(f32),
    Float64(f64),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Str(Cow<'a, str>),
    /// A dictionary reference that was not resolved.
    Ref(Reference),
    Map(Object<'a>),
    Array(Vec<Value<'a>>),
    Feature(Box<FeatureValue<'a>>),
    Dictionary(DictionaryValue),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureValue<'a> {
    pub id: Option<String>,
    pub global_dict_id: Option<String>,
    pub variant: u8,
    pub value: Value<'a>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryValue {
    pub id: Option<String>,
    pub words: Vec<String>,
}

impl<'a> Value<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float32(_) | Value::Float64(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float32(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Object<'a>> {
        match self {
            Value::Map(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value<'a>>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_feature(&self) -> Option<&FeatureValue<'a>> {
        match self {
            Value::Feature(feature) => Some(feature),
            _ => None,
        }
    }

    /// Looks up `key` in a map value.
    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.as_map().and_then(|object| object.get(key))
    }

    /// Detaches every borrowed string from the source buffer.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Null => Value::Null,
            Value::Undefined => Value::Undefined,
            Value::Bool(v) => Value::Bool(v),
            Value::Int(v) => Value::Int(v),
            Value::Float32(v) => Value::Float32(v),
            Value::Float64(v) => Value::Float64(v),
            Value::Timestamp(v) => Value::Timestamp(v),
            Value::Str(s) => Value::Str(Cow::Owned(s.into_owned())),
            Value::Ref(r) => Value::Ref(r),
            Value::Map(object) => Value::Map(
                object
                    .into_iter()
                    .map(|(k, v)| (k, v.into_owned()))
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::into_owned).collect())
            }
            Value::Feature(feature) => {
                let FeatureValue {
                    id,
                    global_dict_id,
                    variant,
                    value,
                } = *feature;
                Value::Feature(Box::new(FeatureValue {
                    id,
                    global_dict_id,
                    variant,
                    value: value.into_owned(),
                }))
            }
            Value::Dictionary(dict) => Value::Dictionary(dict),
        }
    }
}

fn write_json_str(f: &mut Formatter<'_>, s: &str) -> std::fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            BS => write!(f, "\\\\")?,
            QU => write!(f, "\\\"")?,
            BB => write!(f, "\\b")?,
            FF => write!(f, "\\f")?,
            NN => write!(f, "\\n")?,
            RR => write!(f, "\\r")?,
            TT => write!(f, "\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

fn write_float(f: &mut Formatter<'_>, v: f64) -> std::fmt::Result {
    if v.is_finite() {
        let mut buffer = ryu::Buffer::new();
        write!(f, "{}", buffer.format(v))
    } else {
        write!(f, "null")
    }
}

/// Renders the value as JSON text. `undefined` prints as `null`, unresolved
/// references as their index, and features and dictionaries as their payload.
impl Display for Value<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null | Value::Undefined => write!(f, "null"),
            Value::Bool(v) => {
                if *v {
                    write!(f, "true")
                } else {
                    write!(f, "false")
                }
            }
            Value::Int(v) | Value::Timestamp(v) => {
                let mut buffer = itoa::Buffer::new();
                write!(f, "{}", buffer.format(*v))
            }
            Value::Float32(v) if v.is_finite() => {
                let mut buffer = ryu::Buffer::new();
                write!(f, "{}", buffer.format(*v))
            }
            Value::Float32(_) => write!(f, "null"),
            Value::Float64(v) => write_float(f, *v),
            Value::Str(s) => write_json_str(f, s),
            Value::Ref(r) => match r.index {
                Some(index) => {
                    let mut buffer = itoa::Buffer::new();
                    write!(f, "{}", buffer.format(index))
                }
                None => write!(f, "null"),
            },
            Value::Map(object) => {
                write!(f, "{{")?;
                for (i, (k, v)) in object.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write_json_str(f, k)?;
                    write!(f, ":{v}")?;
                }
                write!(f, "}}")
            }
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Feature(feature) => write!(f, "{}", feature.value),
            Value::Dictionary(dict) => {
                write!(f, "[")?;
                for (i, word) in dict.words.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write_json_str(f, word)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Serializes to the same JSON projection as `Display`.
impl Serialize for Value<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null | Value::Undefined => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) | Value::Timestamp(v) => serializer.serialize_i64(*v),
            Value::Float32(v) => serializer.serialize_f32(*v),
            Value::Float64(v) => serializer.serialize_f64(*v),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Ref(Reference { index, .. }) => match index {
                Some(index) => serializer.serialize_u32(*index),
                None => serializer.serialize_unit(),
            },
            Value::Map(object) => {
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (k, v) in object.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Feature(feature) => feature.value.serialize(serializer),
            Value::Dictionary(dict) => dict.words.serialize(serializer),
        }
    }
}
