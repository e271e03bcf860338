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

use crate::constants::TEXT_WORD_SEPARATOR;

/// Controls how whole values are turned into JBON units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Intern map keys into the local dictionary and write them as references.
    pub intern_keys: bool,
    /// Write strings made of several words as tokenized text.
    pub tokenize_text: bool,
    /// Minimum number of space-separated words before a string is tokenized.
    pub min_text_words: usize,
    /// Variant byte stored in feature headers.
    pub variant: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            intern_keys: true,
            tokenize_text: false,
            min_text_words: 2,
            variant: 0,
        }
    }
}

impl EncodeOptions {
    /// Writes every key and string literally; the output needs no dictionary.
    pub fn literal() -> Self {
        Self {
            intern_keys: false,
            tokenize_text: false,
            ..Default::default()
        }
    }

    pub fn with_intern_keys(mut self, intern_keys: bool) -> Self {
        self.intern_keys = intern_keys;
        self
    }

    pub fn with_tokenize_text(mut self, tokenize_text: bool) -> Self {
        self.tokenize_text = tokenize_text;
        self
    }

    pub fn with_min_text_words(mut self, min_text_words: usize) -> Self {
        self.min_text_words = min_text_words;
        self
    }

    pub fn with_variant(mut self, variant: u8) -> Self {
        self.variant = variant;
        self
    }

    pub(crate) fn should_tokenize(&self, s: &str) -> bool {
        self.tokenize_text && s.split(TEXT_WORD_SEPARATOR).count() >= self.min_text_words.max(1)
    }
}
