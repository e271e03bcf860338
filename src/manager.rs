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

//! Registry of global dictionaries shared by many decode operations.
//!
//! ## Concurrency
//!
//! Lookups take a shared lock and clone an `Arc`. A dictionary is fully
//! materialized before it is inserted, and is immutable afterwards. Inserts
//! are insert-if-absent: when two decoders race to publish the same id, the
//! first one wins and the loser gets the published instance back.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;

use crate::dict::JbDict;
use crate::error::Error;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct DictionaryManager {
    dicts: RwLock<HashMap<String, Arc<JbDict<'static>>>>,
}

impl DictionaryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Arc<JbDict<'static>>> {
        self.dicts.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.dicts.read().contains_key(id)
    }

    /// Publishes `dict` under its id unless that id is already taken, and
    /// returns whichever instance is published.
    pub fn put(&self, dict: JbDict<'static>) -> Result<Arc<JbDict<'static>>> {
        let id = dict.id().ok_or(Error::MissingDictionaryId)?.to_string();
        dict.load_all()?;

        let mut dicts = self.dicts.write();
        if let Some(existing) = dicts.get(&id) {
            trace!(dict_id = %id, "global dictionary already published");
            return Ok(existing.clone());
        }
        debug!(dict_id = %id, entries = ?dict.len(), "publishing global dictionary");
        let dict = Arc::new(dict);
        dicts.insert(id, dict.clone());
        Ok(dict)
    }

    /// Parses a dictionary unit and publishes it.
    pub fn load(&self, bytes: &[u8]) -> Result<Arc<JbDict<'static>>> {
        let dict = JbDict::from_bytes(bytes)?;
        let id = dict.id().ok_or(Error::MissingDictionaryId)?;
        if let Some(existing) = self.get(id) {
            return Ok(existing);
        }
        self.put(dict.into_owned()?)
    }

    pub fn remove(&self, id: &str) -> Option<Arc<JbDict<'static>>> {
        let removed = self.dicts.write().remove(id);
        if removed.is_some() {
            debug!(dict_id = %id, "removed global dictionary");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.dicts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dicts.read().is_empty()
    }

    /// Drops every published dictionary. Readers holding an `Arc` keep theirs.
    pub fn clear(&self) {
        self.dicts.write().clear();
    }
}
