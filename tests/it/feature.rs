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

use jbon::decode_feature;
use jbon::encode_feature;
use jbon::Builder;
use jbon::DictionaryManager;
use jbon::DictionaryValue;
use jbon::EncodeOptions;
use jbon::Error;
use jbon::Feature;
use jbon::FeatureValue;
use jbon::JbDict;
use jbon::RefScope;
use jbon::Value;

#[test]
fn test_feature_layout() {
    let mut builder = Builder::new();
    let start = builder.start_map();
    builder.add_to_local_dictionary("name");
    builder.write_key("name").unwrap();
    builder.write_string("A").unwrap();
    builder.end_map(start).unwrap();

    let bytes = builder.build_feature(Some("f1"), 3).unwrap();
    assert_eq!(
        bytes,
        b"\xC8\x12\x03\x60\x22f1\xCC\x06\x60\x24name\xC0\x03\x90\x21A"
    );

    let feature = Feature::from_bytes(&bytes, None).unwrap();
    assert_eq!(feature.id(), Some("f1"));
    assert_eq!(feature.variant(), 3);
    assert_eq!(feature.global_dict_id(), None);
    let dict = feature.local_dict().unwrap();
    assert_eq!(dict.get(0).unwrap(), Some("name"));
    assert_eq!(
        feature.value().unwrap(),
        [("name", "A")].into_iter().collect::<Value>()
    );
}

#[test]
fn test_feature_without_dictionary_or_payload() {
    let builder = Builder::new();
    let bytes = builder.build_feature(None, 0).unwrap();
    assert_eq!(bytes, b"\xC8\x04\x00\x60\x60\x61");

    let feature = Feature::from_bytes(&bytes, None).unwrap();
    assert_eq!(feature.id(), None);
    assert!(feature.local_dict().is_none());
    assert!(feature.reader().is_undefined());
    assert_eq!(feature.value().unwrap(), Value::Undefined);
}

#[test]
fn test_feature_rejects_other_units() {
    assert!(matches!(
        Feature::from_bytes(b"\xC0\x00", None),
        Err(Error::UnexpectedType)
    ));
    assert!(matches!(
        Feature::from_bytes(b"\xC8\x10\x00", None),
        Err(Error::InvalidUnit)
    ));
}

#[test]
fn test_feature_text_round_trip() {
    let json: serde_json::Value = serde_json::from_str(
        r#"{"name":"Hello World Hello Again","note":"single","odd":"a  b ","empty":""}"#,
    )
    .unwrap();
    let options = EncodeOptions::default().with_tokenize_text(true);
    let value = Value::from(&json);
    let bytes = encode_feature(&value, Some("n/1"), &options).unwrap();

    let feature = Feature::from_bytes(&bytes, None).unwrap();
    let mut map = feature.reader().as_map().unwrap();
    let name = map.get("name").unwrap().unwrap();
    assert!(name.is_text());
    assert_eq!(name.unit_size(), 9);
    assert!(!map.get("note").unwrap().unwrap().is_text());
    assert!(map.get("odd").unwrap().unwrap().is_text());

    assert_eq!(feature.value().unwrap(), value);
}

#[test]
fn test_feature_with_global_dictionary() {
    let manager = Arc::new(DictionaryManager::new());
    let global = manager
        .put(JbDict::from_words(
            Some("osm".to_string()),
            ["highway", "name", "primary"],
        ))
        .unwrap();

    let mut builder = Builder::new().with_global_dict(global);
    let start = builder.start_map();
    builder.write_key("highway").unwrap();
    builder.write_ref(Some(2), RefScope::Global).unwrap();
    builder.write_key("lanes").unwrap();
    builder.write_int(2).unwrap();
    builder.end_map(start).unwrap();
    let bytes = builder.build_feature(Some("w/7"), 0).unwrap();

    let feature = Feature::from_bytes(&bytes, Some(manager.clone())).unwrap();
    assert_eq!(feature.global_dict_id(), Some("osm"));
    let mut map = feature.reader().as_map().unwrap();
    assert!(map.first());
    assert!(map.value().is_global_ref());
    assert_eq!(
        map.value().read_string().unwrap().as_deref(),
        Some("primary")
    );

    let decoded = decode_feature(&bytes, Some(manager)).unwrap();
    assert_eq!(
        decoded,
        FeatureValue {
            id: Some("w/7".to_string()),
            global_dict_id: Some("osm".to_string()),
            variant: 0,
            value: [("highway", Value::from("primary")), ("lanes", Value::Int(2))]
                .into_iter()
                .collect(),
        }
    );

    // without the manager the global references cannot be resolved
    let unresolved = Feature::from_bytes(&bytes, None).unwrap();
    assert!(matches!(
        unresolved.value(),
        Err(Error::UnresolvedReference {
            scope: RefScope::Global,
            index: 0
        })
    ));
    assert!(matches!(
        decode_feature(&bytes, Some(Arc::new(DictionaryManager::new()))),
        Err(Error::UnresolvedReference { .. })
    ));
}

#[test]
fn test_nested_feature_value() {
    let inner = Value::Feature(Box::new(FeatureValue {
        id: Some("child".to_string()),
        global_dict_id: None,
        variant: 1,
        value: [("k", "v")].into_iter().collect(),
    }));
    let outer: Value = vec![Value::Int(1), inner.clone()].into();

    let bytes = encode_feature(&outer, None, &EncodeOptions::default()).unwrap();
    let decoded = decode_feature(&bytes, None).unwrap();
    assert_eq!(decoded.value, outer);
    // the child carries its own dictionary
    let child = &decoded.value.as_array().unwrap()[1];
    assert_eq!(child.as_feature().map(|f| f.variant), Some(1));
}

#[test]
fn test_feature_reader_shares_local_dictionary() {
    let json: serde_json::Value = serde_json::from_str(r#"{"a":{"a":1}}"#).unwrap();
    let mut builder = Builder::new();
    builder.write_json(&json, &EncodeOptions::default()).unwrap();
    let bytes = builder.build_feature(None, 0).unwrap();

    let feature = Feature::from_bytes(&bytes, None).unwrap();
    let mut map = feature.reader().as_map().unwrap();
    let inner = map.get("a").unwrap().unwrap();
    assert!(Arc::ptr_eq(
        inner.local_dict().unwrap(),
        feature.local_dict().unwrap()
    ));
    assert_eq!(inner.as_map().unwrap().get("a").unwrap().unwrap().read_int32(0), 1);
}

#[test]
fn test_feature_with_dictionary_payload() {
    let value = Value::Dictionary(DictionaryValue {
        id: Some("d".to_string()),
        words: vec!["x".to_string(), "y".to_string()],
    });
    let bytes = encode_feature(&value, Some("f"), &EncodeOptions::default()).unwrap();
    // an empty local dictionary precedes the payload
    assert_eq!(
        bytes,
        b"\xC8\x0F\x00\x60\x21f\xCC\x01\x60\xCC\x06\x21d\x21x\x21y"
    );

    let feature = Feature::from_bytes(&bytes, None).unwrap();
    assert!(feature.local_dict().unwrap().words().unwrap().is_empty());
    assert!(feature.reader().is_dictionary());

    let decoded = decode_feature(&bytes, None).unwrap();
    assert_eq!(decoded.id.as_deref(), Some("f"));
    assert_eq!(decoded.value, value);

    // a dictionary nested below the root needs no placeholder
    let nested: Value = vec![value.clone()].into();
    let bytes = encode_feature(&nested, None, &EncodeOptions::default()).unwrap();
    assert!(Feature::from_bytes(&bytes, None).unwrap().local_dict().is_none());
    assert_eq!(decode_feature(&bytes, None).unwrap().value, nested);
}
