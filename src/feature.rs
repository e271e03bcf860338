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

use tracing::debug;
use tracing::trace;

use crate::dict::JbDict;
use crate::error::Error;
use crate::error::Result;
use crate::manager::DictionaryManager;
use crate::reader::Reader;
use crate::unit::UnitType;
use crate::value::FeatureValue;
use crate::value::Value;
use crate::view::ByteView;

/// A decoded feature header with a reader positioned at its payload unit.
///
/// Layout of the feature payload:
///
/// ```text
/// [variant u8][global dictionary id: str | null][feature id: str | null]
/// [local dictionary unit, only when non-empty][value unit]
/// ```
#[derive(Debug, Clone)]
pub struct Feature<'a> {
    variant: u8,
    id: Option<String>,
    global_dict_id: Option<String>,
    reader: Reader<'a>,
}

impl<'a> Feature<'a> {
    /// An unmapped feature; global references resolve through `manager`.
    pub fn new(manager: Option<Arc<DictionaryManager>>) -> Self {
        let mut reader = Reader::new(&[]);
        reader.set_dictionary_manager(manager);
        Self {
            variant: 0,
            id: None,
            global_dict_id: None,
            reader,
        }
    }

    pub fn from_bytes(
        bytes: &'a [u8],
        manager: Option<Arc<DictionaryManager>>,
    ) -> Result<Feature<'a>> {
        let mut feature = Feature::new(manager);
        feature.map_bytes(bytes)?;
        Ok(feature)
    }

    /// Maps the feature unit `reader` is positioned at, inheriting its
    /// dictionary manager.
    pub(crate) fn from_reader(reader: &Reader<'a>) -> Result<Feature<'a>> {
        let mut feature = Feature::new(reader.dictionary_manager().cloned());
        feature.map_view(reader.view(), reader.offset() - reader.start())?;
        Ok(feature)
    }

    pub fn map_bytes(&mut self, bytes: &'a [u8]) -> Result<()> {
        self.map_view(ByteView::new(bytes), 0)
    }

    /// Maps the feature unit found `offset` bytes after the start of `view`.
    pub fn map_view(&mut self, view: ByteView<'a>, offset: usize) -> Result<()> {
        let mut reader = Reader::from_view(view, offset);
        reader.set_dictionary_manager(self.reader.dictionary_manager().cloned());
        if reader.unit_type() != UnitType::Feature {
            return Err(if reader.ok() {
                Error::UnexpectedType
            } else {
                Error::InvalidUnit
            });
        }
        let mut body = reader.children().ok_or(Error::InvalidUnit)?;

        let variant = body.view().get_u8(body.offset())?;
        body.add_offset(1);
        let global_dict_id = read_optional_id(&mut body)?;
        let id = read_optional_id(&mut body)?;

        let local_dict = if body.is_dictionary() {
            let dict = JbDict::from_view(body.view(), body.offset())?;
            let _ = body.next_unit();
            Some(Arc::new(dict))
        } else {
            None
        };

        let global_dict = match (&global_dict_id, body.dictionary_manager()) {
            (Some(dict_id), Some(manager)) => {
                let dict = manager.get(dict_id);
                if dict.is_none() {
                    debug!(dict_id = %dict_id, "global dictionary is not registered");
                }
                dict
            }
            _ => None,
        };
        trace!(
            id = ?id,
            global_dict_id = ?global_dict_id,
            has_local_dict = local_dict.is_some(),
            "mapped feature"
        );

        body.set_local_dict(local_dict);
        body.set_global_dict(global_dict);
        self.variant = variant;
        self.id = id;
        self.global_dict_id = global_dict_id;
        self.reader = body;
        Ok(())
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn variant(&self) -> u8 {
        self.variant
    }

    pub fn global_dict_id(&self) -> Option<&str> {
        self.global_dict_id.as_deref()
    }

    /// The embedded dictionary, shared with every reader derived from this feature.
    pub fn local_dict(&self) -> Option<&Arc<JbDict<'a>>> {
        self.reader.local_dict()
    }

    /// Reader positioned at the payload unit.
    pub fn reader(&self) -> &Reader<'a> {
        &self.reader
    }

    /// Decodes the payload unit.
    pub fn value(&self) -> Result<Value<'a>> {
        self.reader.read_value()
    }

    /// Decodes the feature header and payload into a `Value::Feature`.
    pub fn to_value(&self) -> Result<Value<'a>> {
        Ok(Value::Feature(Box::new(FeatureValue {
            id: self.id.clone(),
            global_dict_id: self.global_dict_id.clone(),
            variant: self.variant,
            value: self.value()?,
        })))
    }
}

impl Default for Feature<'_> {
    fn default() -> Self {
        Feature::new(None)
    }
}

fn read_optional_id(reader: &mut Reader<'_>) -> Result<Option<String>> {
    let id = match reader.unit_type() {
        UnitType::Null => None,
        UnitType::Str if !reader.is_text() => reader.read_string()?.map(|s| s.into_owned()),
        _ => return Err(Error::InvalidUnit),
    };
    let _ = reader.next_unit();
    Ok(id)
}
