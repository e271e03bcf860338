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

use jbon::from_slice;
use jbon::Builder;
use jbon::EncodeOptions;
use jbon::Error;
use jbon::Reader;
use jbon::RefScope;
use jbon::Reference;
use jbon::UnitType;
use jbon::Value;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

#[test]
fn test_decode_scalars() {
    let mut builder = Builder::new();
    builder.write_null().unwrap();
    builder.write_bool(true).unwrap();
    builder.write_int(-7).unwrap();
    builder.write_int64(1 << 40).unwrap();
    builder.write_double(2.5).unwrap();
    builder.write_timestamp(1_234).unwrap();

    let mut reader = Reader::new(builder.as_bytes());
    assert!(reader.is_null());
    assert!(reader.next_unit());
    assert!(reader.is_bool());
    assert!(reader.read_boolean(false));
    assert!(reader.next_unit());
    assert!(reader.is_int32());
    assert_eq!(reader.read_int32(0), -7);
    assert!(reader.next_unit());
    assert!(reader.is_int());
    assert!(!reader.is_int32());
    assert_eq!(reader.read_int32(99), 99);
    assert_eq!(reader.read_int64(0), 1 << 40);
    assert!(reader.next_unit());
    assert!(reader.is_float64());
    assert!(reader.is_number());
    assert_eq!(reader.read_float64(0.0, true), 2.5);
    assert_eq!(reader.read_float32(0.0, true), 2.5);
    assert!(reader.next_unit());
    assert!(reader.is_timestamp());
    assert_eq!(reader.read_timestamp(0), 1_234);
    assert!(!reader.next_unit());
    assert!(reader.eof());
}

#[test]
fn test_decode_int_boundaries() {
    let boundaries = [
        -16,
        15,
        -17,
        16,
        -129,
        128,
        -32769,
        32768,
        i32::MIN as i64,
        i32::MAX as i64,
        i64::MIN,
        i64::MAX,
    ];
    let mut builder = Builder::new();
    for v in boundaries {
        builder.write_int64(v).unwrap();
    }
    builder.write_double(f64::MAX).unwrap();
    builder.write_double(f64::MIN_POSITIVE).unwrap();
    builder.write_float(f32::MAX).unwrap();

    let mut reader = Reader::new(builder.as_bytes());
    for v in boundaries {
        assert_eq!(reader.read_int64(0), v);
        assert_eq!(reader.read_int32(0) as i64 == v, i32::try_from(v).is_ok());
        reader.next_unit();
    }
    assert_eq!(reader.read_float64(0.0, true), f64::MAX);
    assert!(reader.read_float32(0.0, true).is_nan());
    reader.next_unit();
    assert_eq!(reader.read_float64(0.0, true), f64::MIN_POSITIVE);
    reader.next_unit();
    assert!(reader.is_float32());
    assert_eq!(reader.read_float32(0.0, true), f32::MAX);
    assert_eq!(reader.read_float64(0.0, true), f32::MAX as f64);
}

#[test]
fn test_decode_mismatched_type_returns_default() {
    let mut builder = Builder::new();
    builder.write_string("abc").unwrap();
    let reader = Reader::new(builder.as_bytes());
    assert_eq!(reader.read_int32(-1), -1);
    assert!(reader.read_boolean(true));
    assert_eq!(reader.read_timestamp(5), 5);
    assert!(reader.read_ref().is_none());
    assert_eq!(reader.read_string().unwrap().as_deref(), Some("abc"));
}

#[test]
fn test_decode_strict_float() {
    let mut builder = Builder::new();
    builder.write_double(0.1).unwrap();
    builder.write_int64(16_777_217).unwrap();
    builder.write_int64(16_777_216).unwrap();
    builder.write_int64((1 << 53) + 1).unwrap();

    let mut reader = Reader::new(builder.as_bytes());
    assert!(reader.read_float32(0.0, true).is_nan());
    assert_eq!(reader.read_float32(0.0, false), 0.1_f32);
    assert_eq!(reader.read_float64(0.0, true), 0.1);
    reader.next_unit();
    assert!(reader.read_float32(0.0, true).is_nan());
    assert_eq!(reader.read_float64(0.0, true), 16_777_217.0);
    reader.next_unit();
    assert_eq!(reader.read_float32(0.0, true), 16_777_216.0);
    reader.next_unit();
    assert!(reader.read_float64(0.0, true).is_nan());
}

#[test]
fn test_decode_small_integral_floats_as_int() {
    // the embedded form carries no float flag
    let bytes = jbon::encode_value(&Value::Float64(3.0)).unwrap();
    assert_eq!(bytes, b"\x03");
    assert_eq!(from_slice(&bytes).unwrap(), Value::Int(3));
    assert_eq!(Reader::new(&bytes).read_float64(0.0, true), 3.0);

    for value in [Value::Float64(16.0), Value::Float64(-0.0), Value::Float32(2.5)] {
        let bytes = jbon::encode_value(&value).unwrap();
        assert_eq!(from_slice(&bytes).unwrap(), value);
    }

    let json: serde_json::Value = serde_json::from_str(r#"{"x":1.0,"y":1.5}"#).unwrap();
    let mut builder = Builder::new();
    builder.write_json(&json, &EncodeOptions::literal()).unwrap();
    let decoded = from_slice(builder.as_bytes()).unwrap();
    assert_eq!(decoded.get("x"), Some(&Value::Int(1)));
    assert_eq!(decoded.to_string(), r#"{"x":1,"y":1.5}"#);
}

#[test]
fn test_decode_strings_borrow_ascii() {
    let mut builder = Builder::new();
    builder.write_string("Main St").unwrap();
    builder.write_string("Straße").unwrap();

    let mut reader = Reader::new(builder.as_bytes());
    assert!(matches!(
        reader.read_string().unwrap(),
        Some(Cow::Borrowed("Main St"))
    ));
    reader.next_unit();
    let s = reader.read_string().unwrap().unwrap();
    assert!(matches!(s, Cow::Owned(_)));
    assert_eq!(s, "Straße");
}

#[test]
fn test_decode_refs() {
    let mut builder = Builder::new();
    builder.write_ref(Some(3), RefScope::Local).unwrap();
    builder.write_ref(Some(70_000), RefScope::Global).unwrap();
    builder.write_ref(None, RefScope::Local).unwrap();

    let mut reader = Reader::new(builder.as_bytes());
    assert!(reader.is_local_ref());
    assert_eq!(reader.read_ref(), Some(Reference::local(3)));
    assert!(matches!(
        reader.read_string(),
        Err(Error::UnresolvedReference {
            scope: RefScope::Local,
            index: 3
        })
    ));
    reader.next_unit();
    assert!(reader.is_global_ref());
    assert_eq!(reader.read_ref(), Some(Reference::global(70_000)));
    reader.next_unit();
    assert_eq!(
        reader.read_ref(),
        Some(Reference {
            scope: RefScope::Local,
            index: None
        })
    );
    assert_eq!(reader.read_string().unwrap(), None);
    assert_eq!(reader.read_value().unwrap(), Value::Null);
}

#[test]
fn test_decode_truncated_input_is_lenient() {
    // int32 with only one payload byte
    let reader = Reader::new(b"\x66\x01");
    assert!(!reader.ok());
    assert_eq!(reader.unit_type(), UnitType::Undefined);
    assert_eq!(reader.read_int32(-1), -1);
    assert_eq!(reader.unit_size(), 0);

    let reader = Reader::new(b"\x71");
    assert!(!reader.ok());
    assert!(!reader.eof());

    assert!(matches!(from_slice(b"\x66\x01"), Err(Error::InvalidEOF)));
    assert!(matches!(from_slice(b"\x71"), Err(Error::InvalidLeadIn(0x71))));
    assert!(matches!(from_slice(b""), Err(Error::InvalidEOF)));
}

#[test]
fn test_decode_end_bound() {
    let mut builder = Builder::new();
    builder.write_int(1).unwrap();
    builder.write_string("abc").unwrap();
    let bytes = builder.as_bytes();

    let mut reader = Reader::new(bytes);
    reader.set_end(3);
    assert_eq!(reader.read_int32(0), 1);
    assert!(reader.next_unit());
    // the string needs bytes up to 5
    assert_eq!(reader.unit_type(), UnitType::Undefined);
    assert_eq!(reader.read_string().unwrap(), None);
    assert!(!reader.next_unit());
    assert!(reader.eof());
    assert_eq!(reader.offset(), 3);

    reader.set_end(usize::MAX);
    assert_eq!(reader.end(), bytes.len());
    reader.set_offset(1);
    assert_eq!(reader.read_string().unwrap().as_deref(), Some("abc"));
}

#[test]
fn test_decode_skip_visits_every_unit() {
    let json: serde_json::Value = serde_json::from_str(
        r#"{"a":[1,2,{"b":"c","d":[true,null]}],"e":"some longer string value here ok","f":1.5}"#,
    )
    .unwrap();
    let mut builder = Builder::new();
    builder.write_json(&json, &EncodeOptions::literal()).unwrap();
    builder.write_int(300).unwrap();
    builder.write_json(&json, &EncodeOptions::literal()).unwrap();
    let bytes = builder.as_bytes();

    let mut reader = Reader::new(bytes);
    let mut offsets = vec![reader.offset()];
    let mut total = reader.unit_size();
    while reader.next_unit() {
        offsets.push(reader.offset());
        total += reader.unit_size();
    }
    assert_eq!(offsets.len(), 3);
    assert_eq!(total, bytes.len());
    assert!(reader.eof());

    let value = from_slice(bytes).unwrap();
    assert_eq!(value, Value::from(&json));
}

#[test]
fn test_decode_value_round_trip() {
    let json: serde_json::Value = serde_json::from_str(
        r#"{"name":"Rue de la Paix","tags":["a","b"],"ref":null,"maxspeed":50,"é":"ü"}"#,
    )
    .unwrap();
    let value = Value::from(&json);
    let bytes = jbon::encode_value(&value).unwrap();
    let decoded = from_slice(&bytes).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(decoded.to_string(), serde_json::to_string(&json).unwrap());
}

#[test]
fn test_decode_random_numbers() {
    let mut rng = SmallRng::seed_from_u64(0x5EED);
    let mut ints = Vec::new();
    let mut doubles = Vec::new();
    let mut builder = Builder::new();
    for _ in 0..500 {
        let shift = rng.random_range(0..64);
        let v = rng.random::<i64>() >> shift;
        builder.write_int64(v).unwrap();
        ints.push(v);
    }
    for _ in 0..500 {
        let v: f64 = rng.random_range(-1.0e6..1.0e6);
        builder.write_double(v).unwrap();
        doubles.push(v);
    }

    let mut reader = Reader::new(builder.as_bytes());
    for v in ints {
        assert_eq!(reader.read_int64(0), v);
        reader.next_unit();
    }
    for v in doubles {
        assert_eq!(reader.read_float64(f64::NAN, false), v);
        reader.next_unit();
    }
    assert!(reader.eof());
}
