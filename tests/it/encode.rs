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

use std::sync::Arc;

use jbon::Builder;
use jbon::EncodeOptions;
use jbon::Error;
use jbon::JbDict;
use jbon::Object;
use jbon::Reader;
use jbon::RefScope;
use jbon::Reference;
use jbon::Value;

fn int_size(v: i64) -> usize {
    let mut builder = Builder::new();
    builder.write_int64(v).unwrap();
    builder.len()
}

#[test]
fn test_encode_scalars() {
    let mut builder = Builder::new();
    assert_eq!(builder.write_null().unwrap(), 0);
    assert_eq!(builder.write_undefined().unwrap(), 1);
    assert_eq!(builder.write_bool(false).unwrap(), 2);
    assert_eq!(builder.write_bool(true).unwrap(), 3);
    assert_eq!(builder.write_int(-1).unwrap(), 4);
    assert_eq!(builder.as_bytes(), b"\x60\x61\x62\x63\x1F");
}

#[test]
fn test_encode_int_size_classes() {
    assert_eq!(int_size(0), 1);
    assert_eq!(int_size(15), 1);
    assert_eq!(int_size(-16), 1);
    assert_eq!(int_size(16), 2);
    assert_eq!(int_size(-17), 2);
    assert_eq!(int_size(127), 2);
    assert_eq!(int_size(-128), 2);
    assert_eq!(int_size(128), 3);
    assert_eq!(int_size(-129), 3);
    assert_eq!(int_size(32767), 3);
    assert_eq!(int_size(32768), 5);
    assert_eq!(int_size(-32769), 5);
    assert_eq!(int_size(i32::MIN as i64), 5);
    assert_eq!(int_size(i32::MAX as i64 + 1), 9);
    assert_eq!(int_size(i64::MIN), 9);

    let mut builder = Builder::new();
    builder.write_int(1000).unwrap();
    assert_eq!(builder.as_bytes(), b"\x65\xE8\x03");
}

#[test]
fn test_encode_embedded_int_range() {
    let mut builder = Builder::new();
    builder.write_embedded_int(-16).unwrap();
    builder.write_embedded_int(15).unwrap();
    assert_eq!(builder.as_bytes(), b"\x10\x0F");

    let err = builder.write_embedded_int(16).unwrap_err();
    assert!(matches!(
        err,
        Error::ValueOutOfRange {
            value: 16,
            min: -16,
            max: 15
        }
    ));
    assert_eq!(builder.len(), 2);
}

#[test]
fn test_encode_floats() {
    let mut builder = Builder::new();
    builder.write_double(3.0).unwrap();
    builder.write_float(-16.0).unwrap();
    assert_eq!(builder.as_bytes(), b"\x03\x10");

    let mut builder = Builder::new();
    builder.write_double(-0.0).unwrap();
    assert_eq!(builder.len(), 9);
    builder.clear();
    builder.write_double(16.0).unwrap();
    assert_eq!(builder.len(), 9);
    builder.clear();
    builder.write_float(1.5).unwrap();
    assert_eq!(builder.as_bytes(), b"\x68\x00\x00\xC0\x3F");
}

#[test]
fn test_encode_timestamp() {
    let mut builder = Builder::new();
    builder.write_timestamp(1_700_000_000_000).unwrap();
    assert_eq!(builder.len(), 9);
    assert_eq!(builder.as_bytes()[0], 0x6A);
}

#[test]
fn test_encode_refs() {
    let mut builder = Builder::new();
    builder.write_ref(None, RefScope::Global).unwrap();
    assert_eq!(builder.len(), 1);
    builder.write_ref(Some(0), RefScope::Global).unwrap();
    assert_eq!(builder.len(), 2);
    builder.write_ref(Some(15), RefScope::Local).unwrap();
    assert_eq!(builder.as_bytes(), b"\xA0\x80\x9F");

    let mut reader = Reader::new(builder.as_bytes());
    assert!(reader.is_global_ref());
    assert_eq!(reader.read_ref(), Some(Reference {
            scope: RefScope::Global,
            index: None
        }));
    assert!(reader.next_unit());
    assert!(reader.is_global_ref());
    assert_eq!(reader.read_ref(), Some(Reference::global(0)));
    assert!(reader.next_unit());
    assert!(reader.is_local_ref());
    assert!(!reader.is_global_ref());

    builder.clear();
    builder.write_ref(Some(16), RefScope::Local).unwrap();
    assert_eq!(builder.as_bytes(), b"\xA3\x00\x00");

    builder.clear();
    builder.write_ref(Some(65551), RefScope::Local).unwrap();
    assert_eq!(builder.len(), 3);

    builder.clear();
    builder.write_ref(Some(65552), RefScope::Local).unwrap();
    assert_eq!(builder.len(), 5);
    assert_eq!(builder.as_bytes()[0], 0xA5);

    assert!(builder.write_embedded_ref(16, RefScope::Global).is_err());
}

#[test]
fn test_encode_strings() {
    let mut builder = Builder::new();
    builder.write_string("Hello World!").unwrap();
    assert_eq!(builder.len(), 13);
    assert_eq!(builder.as_bytes()[0], 0x2C);

    builder.clear();
    builder.write_string(&"a".repeat(31)).unwrap();
    assert_eq!(builder.len(), 32);
    assert_eq!(builder.as_bytes()[0], 0x3F);

    builder.clear();
    builder.write_string(&"a".repeat(61)).unwrap();
    assert_eq!(builder.len(), 63);
    assert_eq!(&builder.as_bytes()[..2], b"\x6B\x3D");

    builder.clear();
    builder.write_string(&"b".repeat(300)).unwrap();
    assert_eq!(&builder.as_bytes()[..3], b"\x6C\x2C\x01");
}

#[test]
fn test_encode_non_ascii_strings() {
    let mut builder = Builder::new();
    // U+00E9 takes two bytes, U+4E2D three
    builder.write_string("é中").unwrap();
    assert_eq!(builder.as_bytes(), b"\x25\x80\x69\xC0\x4E\x2D");
}

#[test]
fn test_encode_text() {
    let mut builder = Builder::new();
    builder.write_text("Hello World Hello Again").unwrap();
    assert_eq!(builder.len(), 9);
    assert_eq!(builder.local_dict().len(), 3);
    assert_eq!(
        builder.as_bytes(),
        b"\x48\x00\x00\x01\x00\x00\x00\x02\x00"
    );

    builder.clear();
    builder.write_text("").unwrap();
    assert_eq!(builder.as_bytes(), b"\x40");
}

#[test]
fn test_encode_key_prefers_local_dictionary() {
    let mut builder = Builder::new();
    builder.write_key("name").unwrap();
    assert_eq!(builder.as_bytes(), b"\x24name");

    builder.clear();
    builder.add_to_local_dictionary("highway");
    builder.add_to_local_dictionary("name");
    builder.write_key("name").unwrap();
    assert_eq!(builder.as_bytes(), b"\x91");
}

#[test]
fn test_encode_text_overflow_leaves_dictionary_untouched() {
    let mut builder = Builder::new();
    for i in 0..=u16::MAX as usize {
        builder.add_to_local_dictionary(&format!("w{i}"));
    }
    assert_eq!(builder.local_dict().len(), 65536);

    // "w0" is known, "fresh" would need index 65536
    assert!(matches!(
        builder.write_text("w0 fresh"),
        Err(Error::DictionaryOverflow(65537))
    ));
    assert_eq!(builder.local_dict().len(), 65536);
    assert!(builder.local_dict().index_of("fresh").is_none());
    assert!(builder.is_empty());

    builder.write_text("w65535 w0").unwrap();
    assert_eq!(builder.as_bytes(), b"\x44\xFF\xFF\x00\x00");
}

#[test]
fn test_encode_json_keys_use_global_dictionary() {
    let global = Arc::new(JbDict::from_words(Some("osm".to_string()), ["highway"]));
    let json: serde_json::Value = serde_json::from_str(r#"{"highway":1,"name":2}"#).unwrap();
    let mut builder = Builder::new().with_global_dict(global);
    builder.write_json(&json, &EncodeOptions::default()).unwrap();

    assert_eq!(builder.local_dict().words(), &["name"]);
    assert_eq!(builder.as_bytes(), b"\xC0\x04\x80\x01\x90\x02");
}

#[test]
fn test_encode_value_with_options() {
    let mut object = Object::new();
    object.insert("b".to_string(), Value::Int(2));
    object.insert("a".to_string(), Value::from("x y"));
    let value = Value::Map(object);

    let literal = jbon::encode_value(&value).unwrap();
    assert_eq!(literal, b"\xC0\x09\x21a\x23x y\x21b\x02");

    let mut builder = Builder::new();
    let options = EncodeOptions::default().with_tokenize_text(true);
    builder.write_value(&value, &options).unwrap();
    // keys "a", "b" and words "x", "y"
    assert_eq!(builder.local_dict().words(), &["a", "x", "y", "b"]);
    assert_eq!(builder.as_bytes(), b"\xC0\x08\x90\x44\x01\x00\x02\x00\x93\x02");
}

#[test]
fn test_encode_json() {
    let json: serde_json::Value =
        serde_json::from_str(r#"{"lanes":2,"name":"Main St","oneway":null}"#).unwrap();
    let mut builder = Builder::new();
    builder.write_json(&json, &EncodeOptions::literal()).unwrap();
    assert_eq!(
        builder.as_bytes(),
        b"\xC0\x1C\x25lanes\x02\x24name\x27Main St\x26oneway\x60"
    );
}

#[test]
fn test_clear_and_reset() {
    let mut builder = Builder::new();
    builder.add_to_local_dictionary("w");
    builder.write_string("abc").unwrap();
    assert_eq!(builder.clear(), 4);
    assert!(builder.is_empty());
    assert!(builder.local_dict().is_empty());
    assert_eq!(builder.reset(), 0);
}
