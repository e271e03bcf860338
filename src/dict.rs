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

use std::collections::HashMap;

use once_cell::sync::OnceCell;

use crate::error::Error;
use crate::error::Result;
use crate::reader::Reader;
use crate::unit::UnitHeader;
use crate::unit::UnitType;
use crate::view::ByteView;

/// An ordered, append-only word table with a reverse index.
///
/// Indices are assigned on first insertion and never change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordList {
    words: Vec<String>,
    index: HashMap<String, usize>,
}

impl WordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `word` if absent and returns its stable index.
    pub fn insert(&mut self, word: &str) -> usize {
        if let Some(idx) = self.index.get(word) {
            return *idx;
        }
        let idx = self.words.len();
        self.words.push(word.to_string());
        self.index.insert(word.to_string(), idx);
        idx
    }

    /// Appends `word` at the next index even when it is already present.
    /// Reverse lookups keep resolving to the first occurrence.
    pub(crate) fn push(&mut self, word: String) {
        let idx = self.words.len();
        self.index.entry(word.clone()).or_insert(idx);
        self.words.push(word);
    }

    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(|w| w.as_str())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.index.clear();
    }
}

impl<S: AsRef<str>> FromIterator<S> for WordList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = WordList::new();
        for word in iter {
            list.push(word.as_ref().to_string());
        }
        list
    }
}

/// A dictionary unit: an optional id followed by its entries in index order.
///
/// A `JbDict` mapped over encoded bytes only decodes its id up front; the
/// entries are materialized on the first lookup or on [`JbDict::load_all`],
/// exactly once, even when the dictionary is shared between threads.
#[derive(Debug)]
pub struct JbDict<'a> {
    id: Option<String>,
    entries: Option<ByteView<'a>>,
    words: OnceCell<WordList>,
}

impl<'a> JbDict<'a> {
    /// Maps a dictionary unit starting at the first byte of `bytes`.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<JbDict<'a>> {
        Self::from_view(ByteView::new(bytes), 0)
    }

    /// Maps the dictionary unit at absolute position `offset` of `view`.
    pub fn from_view(view: ByteView<'a>, offset: usize) -> Result<JbDict<'a>> {
        let header = UnitHeader::decode(&view, offset).ok_or(Error::InvalidUnit)?;
        if header.unit_type != UnitType::Dictionary {
            return Err(Error::UnexpectedType);
        }
        let payload_start = offset + header.header_size;
        let payload_end = offset + header.unit_size();
        if payload_end > view.end() {
            return Err(Error::InvalidEOF);
        }
        let payload = ByteView::with_range(view.buffer(), payload_start, payload_end)?;

        let mut reader = Reader::from_view(payload, 0);
        let id = match reader.unit_type() {
            UnitType::Null => None,
            UnitType::Str => reader.read_string()?.map(|s| s.into_owned()),
            UnitType::Undefined if reader.eof() => None,
            _ => return Err(Error::InvalidUnit),
        };
        let entries_start = if reader.eof() {
            payload_end
        } else {
            payload_start + reader.unit_size()
        };
        let entries = ByteView::with_range(view.buffer(), entries_start, payload_end)?;
        Ok(JbDict {
            id,
            entries: Some(entries),
            words: OnceCell::new(),
        })
    }

    /// Builds an already materialized dictionary.
    pub fn from_words<I, S>(id: Option<String>, words: I) -> JbDict<'static>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cell = OnceCell::new();
        let _ = cell.set(words.into_iter().collect::<WordList>());
        JbDict {
            id,
            entries: None,
            words: cell,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.words.get().is_some()
    }

    /// Number of entries, or `None` while the entries are not loaded yet.
    pub fn len(&self) -> Option<usize> {
        self.words.get().map(|w| w.len())
    }

    pub fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }

    /// Decodes every entry. Later calls return the cached table.
    pub fn load_all(&self) -> Result<&WordList> {
        self.words.get_or_try_init(|| {
            let mut words = WordList::new();
            let Some(entries) = self.entries else {
                return Ok(words);
            };
            if entries.size() == 0 {
                return Ok(words);
            }
            let mut reader = Reader::from_view(entries, 0);
            loop {
                if reader.unit_type() != UnitType::Str || reader.is_text() {
                    return Err(Error::InvalidUnit);
                }
                let word = reader.read_string()?.ok_or(Error::InvalidUnit)?;
                words.push(word.into_owned());
                if !reader.next_unit() {
                    break;
                }
            }
            Ok(words)
        })
    }

    pub fn words(&self) -> Result<&[String]> {
        self.load_all().map(|w| w.words())
    }

    pub fn get(&self, index: usize) -> Result<Option<&str>> {
        Ok(self.load_all()?.get(index))
    }

    /// Index of `word` among the entries. The dictionary id is not an entry.
    pub fn index_of(&self, word: &str) -> Result<Option<usize>> {
        Ok(self.load_all()?.index_of(word))
    }

    /// Materializes the entries and detaches the dictionary from the mapped bytes.
    pub fn into_owned(self) -> Result<JbDict<'static>> {
        let words = self.load_all()?.clone();
        let cell = OnceCell::new();
        let _ = cell.set(words);
        Ok(JbDict {
            id: self.id,
            entries: None,
            words: cell,
        })
    }
}
