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

use std::fmt::Display;
use std::fmt::Formatter;

use crate::constants::*;
use crate::view::ByteView;

/// The kind of an encoded JBON unit.
///
/// `Undefined` is both a storable value and the type reported for any
/// position that cannot be decoded (past the end bound, truncated header,
/// unknown lead-in).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitType {
    Null,
    Undefined,
    Bool,
    Int,
    Float32,
    Float64,
    Timestamp,
    /// A literal or tokenized string.
    Str,
    Ref,
    Map,
    Array,
    Feature,
    Dictionary,
}

impl UnitType {
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            UnitType::Map | UnitType::Array | UnitType::Feature | UnitType::Dictionary
        )
    }
}

/// Which dictionary a reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefScope {
    /// The cross-record dictionary resolved through a `DictionaryManager`.
    Global,
    /// The dictionary embedded in the enclosing feature.
    Local,
}

impl Display for RefScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RefScope::Global => write!(f, "global"),
            RefScope::Local => write!(f, "local"),
        }
    }
}

/// A dictionary reference; `index == None` is the null reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    pub scope: RefScope,
    pub index: Option<u32>,
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.scope {
            RefScope::Global => 'g',
            RefScope::Local => 'l',
        };
        match self.index {
            Some(index) => write!(f, "{prefix}{index}"),
            None => write!(f, "{prefix}null"),
        }
    }
}

impl Reference {
    pub fn local(index: u32) -> Self {
        Self {
            scope: RefScope::Local,
            index: Some(index),
        }
    }

    pub fn global(index: u32) -> Self {
        Self {
            scope: RefScope::Global,
            index: Some(index),
        }
    }
}

/// Structural facts about one unit, decoded from its lead-in and header
/// extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UnitHeader {
    pub(crate) lead: u8,
    pub(crate) unit_type: UnitType,
    pub(crate) header_size: usize,
    pub(crate) payload_size: usize,
}

impl UnitHeader {
    /// Decodes the header at `offset`, or `None` when the lead-in is unknown or
    /// the header extension runs past the view.
    pub(crate) fn decode(view: &ByteView<'_>, offset: usize) -> Option<UnitHeader> {
        let lead = view.get_u8(offset).ok()?;
        let (unit_type, header_size, payload_size) = match lead {
            0x00..=0x1F => (UnitType::Int, 1, 0),
            0x20..=0x5F => (UnitType::Str, 1, (lead & INLINE_VALUE_MASK) as usize),
            NULL_TAG => (UnitType::Null, 1, 0),
            UNDEFINED_TAG => (UnitType::Undefined, 1, 0),
            FALSE_TAG | TRUE_TAG => (UnitType::Bool, 1, 0),
            INT8_TAG => (UnitType::Int, 1, 1),
            INT16_TAG => (UnitType::Int, 1, 2),
            INT32_TAG => (UnitType::Int, 1, 4),
            INT64_TAG => (UnitType::Int, 1, 8),
            FLOAT32_TAG => (UnitType::Float32, 1, 4),
            FLOAT64_TAG => (UnitType::Float64, 1, 8),
            TIMESTAMP_TAG => (UnitType::Timestamp, 1, 8),
            STR8_TAG | TEXT8_TAG => {
                let size = view.get_u8(offset + 1).ok()?;
                (UnitType::Str, 2, size as usize)
            }
            STR16_TAG | TEXT16_TAG => {
                let size = view.get_u16(offset + 1, LE).ok()?;
                (UnitType::Str, 3, size as usize)
            }
            STR32_TAG | TEXT32_TAG => {
                let size = view.get_u32(offset + 1, LE).ok()?;
                (UnitType::Str, 5, size as usize)
            }
            0x80..=0xA1 => (UnitType::Ref, 1, 0),
            REF16_TAG | 0xA3 => (UnitType::Ref, 1, 2),
            REF32_TAG | 0xA5 => (UnitType::Ref, 1, 4),
            0xC0..=0xCF => {
                let unit_type = match (lead >> CONTAINER_KIND_SHIFT) & 0x03 {
                    MAP_KIND => UnitType::Map,
                    ARRAY_KIND => UnitType::Array,
                    FEATURE_KIND => UnitType::Feature,
                    _ => UnitType::Dictionary,
                };
                let (header_size, payload_size) = match lead & CONTAINER_CLASS_MASK {
                    SIZE_CLASS_U8 => (2, view.get_u8(offset + 1).ok()? as usize),
                    SIZE_CLASS_U16 => (3, view.get_u16(offset + 1, LE).ok()? as usize),
                    SIZE_CLASS_U32 => (5, view.get_u32(offset + 1, LE).ok()? as usize),
                    _ => return None,
                };
                (unit_type, header_size, payload_size)
            }
            _ => return None,
        };
        Some(UnitHeader {
            lead,
            unit_type,
            header_size,
            payload_size,
        })
    }

    #[inline]
    pub(crate) fn unit_size(&self) -> usize {
        self.header_size + self.payload_size
    }

    pub(crate) fn is_text(&self) -> bool {
        self.lead & INLINE_TAG_MASK == SHORT_TEXT_TAG
            || matches!(self.lead, TEXT8_TAG | TEXT16_TAG | TEXT32_TAG)
    }

    pub(crate) fn ref_scope(&self) -> Option<RefScope> {
        let local = match self.lead {
            0x80..=0x9F => self.lead & EMBEDDED_REF_LOCAL_FLAG != 0,
            0xA0..=0xA5 => self.lead & SIZED_REF_LOCAL_FLAG != 0,
            _ => return None,
        };
        if local {
            Some(RefScope::Local)
        } else {
            Some(RefScope::Global)
        }
    }
}

/// Picks the smallest size class able to describe `len`, returning the class
/// and the width of its size field.
pub(crate) fn size_class(len: usize) -> Option<(u8, usize)> {
    if len <= u8::MAX as usize {
        Some((SIZE_CLASS_U8, 1))
    } else if len <= u16::MAX as usize {
        Some((SIZE_CLASS_U16, 2))
    } else if len <= u32::MAX as usize {
        Some((SIZE_CLASS_U32, 4))
    } else {
        None
    }
}

#[inline]
pub(crate) fn container_lead(kind: u8, class: u8) -> u8 {
    CONTAINER_TAG | (kind << CONTAINER_KIND_SHIFT) | class
}
