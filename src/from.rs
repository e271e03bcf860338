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

use core::iter::FromIterator;
use std::borrow::Cow;

use serde_json::Map as JsonMap;
use serde_json::Number as JsonNumber;
use serde_json::Value as JsonValue;

use crate::value::Object;
use crate::value::Value;

macro_rules! from_signed_integer {
    ($($ty:ident)*) => {
        $(
            impl<'a> From<$ty> for Value<'a> {
                fn from(n: $ty) -> Self {
                    Value::Int(n as i64)
                }
            }
        )*
    };
}

macro_rules! from_unsigned_integer {
    ($($ty:ident)*) => {
        $(
            impl<'a> From<$ty> for Value<'a> {
                fn from(n: $ty) -> Self {
                    Value::Int(n as i64)
                }
            }
        )*
    };
}

from_signed_integer! {
    i8 i16 i32 i64
}

from_unsigned_integer! {
    u8 u16 u32
}

/// Values above `i64::MAX` become `Float64`.
impl From<u64> for Value<'_> {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Float64(n as f64),
        }
    }
}

impl From<f32> for Value<'_> {
    fn from(f: f32) -> Self {
        Value::Float32(f)
    }
}

impl From<f64> for Value<'_> {
    fn from(f: f64) -> Self {
        Value::Float64(f)
    }
}

impl From<bool> for Value<'_> {
    fn from(f: bool) -> Self {
        Value::Bool(f)
    }
}

impl From<String> for Value<'_> {
    fn from(f: String) -> Self {
        Value::Str(f.into())
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(f: &'a str) -> Self {
        Value::Str(Cow::from(f))
    }
}

impl<'a> From<Cow<'a, str>> for Value<'a> {
    fn from(f: Cow<'a, str>) -> Self {
        Value::Str(f)
    }
}

impl<'a> From<Object<'a>> for Value<'a> {
    fn from(o: Object<'a>) -> Self {
        Value::Map(o)
    }
}

impl<'a, T: Into<Value<'a>>> From<Vec<T>> for Value<'a> {
    fn from(f: Vec<T>) -> Self {
        Value::Array(f.into_iter().map(Into::into).collect())
    }
}

impl<'a, T: Into<Value<'a>>> FromIterator<T> for Value<'a> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Array(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a, K: Into<String>, V: Into<Value<'a>>> FromIterator<(K, V)> for Value<'a> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<()> for Value<'_> {
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl From<&JsonValue> for Value<'_> {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(v) => Value::Bool(*v),
            JsonValue::Number(v) => {
                if let Some(n) = v.as_i64() {
                    Value::Int(n)
                } else if let Some(n) = v.as_f64() {
                    Value::Float64(n)
                } else {
                    Value::Null
                }
            }
            JsonValue::String(v) => Value::Str(v.clone().into()),
            JsonValue::Array(arr) => Value::Array(arr.iter().map(Value::from).collect()),
            JsonValue::Object(obj) => Value::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<JsonValue> for Value<'_> {
    fn from(value: JsonValue) -> Self {
        (&value).into()
    }
}

/// Non-finite floats have no JSON form and become `null`, as do `undefined`
/// and null references. Features and dictionaries convert to their payload.
impl<'a> From<Value<'a>> for JsonValue {
    fn from(value: Value<'a>) -> Self {
        match value {
            Value::Null | Value::Undefined => JsonValue::Null,
            Value::Bool(v) => JsonValue::Bool(v),
            Value::Int(v) | Value::Timestamp(v) => JsonValue::Number(v.into()),
            Value::Float32(v) => JsonNumber::from_f64(v as f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Float64(v) => JsonNumber::from_f64(v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Str(s) => JsonValue::String(s.into_owned()),
            Value::Ref(r) => match r.index {
                Some(index) => JsonValue::Number(index.into()),
                None => JsonValue::Null,
            },
            Value::Map(obj) => {
                let mut map = JsonMap::with_capacity(obj.len());
                for (k, v) in obj {
                    map.insert(k, v.into());
                }
                JsonValue::Object(map)
            }
            Value::Array(arr) => JsonValue::Array(arr.into_iter().map(Into::into).collect()),
            Value::Feature(feature) => feature.value.into(),
            Value::Dictionary(dict) => {
                JsonValue::Array(dict.words.into_iter().map(JsonValue::String).collect())
            }
        }
    }
}
