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

// JBON multi-byte fields are little-endian.
pub(crate) const LE: bool = true;

// Lead-in ranges with inline bits
pub(crate) const EMBEDDED_INT_TAG: u8 = 0x00;
pub(crate) const SHORT_STR_TAG: u8 = 0x20;
pub(crate) const SHORT_TEXT_TAG: u8 = 0x40;
pub(crate) const INLINE_TAG_MASK: u8 = 0xE0;
pub(crate) const INLINE_VALUE_MASK: u8 = 0x1F;

pub(crate) const EMBEDDED_INT_MIN: i64 = -16;
pub(crate) const EMBEDDED_INT_MAX: i64 = 15;
pub(crate) const SHORT_LEN_MAX: usize = 31;

// Fixed lead-ins
pub(crate) const NULL_TAG: u8 = 0x60;
pub(crate) const UNDEFINED_TAG: u8 = 0x61;
pub(crate) const FALSE_TAG: u8 = 0x62;
pub(crate) const TRUE_TAG: u8 = 0x63;
pub(crate) const INT8_TAG: u8 = 0x64;
pub(crate) const INT16_TAG: u8 = 0x65;
pub(crate) const INT32_TAG: u8 = 0x66;
pub(crate) const INT64_TAG: u8 = 0x67;
pub(crate) const FLOAT32_TAG: u8 = 0x68;
pub(crate) const FLOAT64_TAG: u8 = 0x69;
pub(crate) const TIMESTAMP_TAG: u8 = 0x6A;
pub(crate) const STR8_TAG: u8 = 0x6B;
pub(crate) const STR16_TAG: u8 = 0x6C;
pub(crate) const STR32_TAG: u8 = 0x6D;
pub(crate) const TEXT8_TAG: u8 = 0x6E;
pub(crate) const TEXT16_TAG: u8 = 0x6F;
pub(crate) const TEXT32_TAG: u8 = 0x70;

// References. Bit 4 of an embedded ref and bit 0 of a sized ref mark local scope.
pub(crate) const EMBEDDED_REF_TAG: u8 = 0x80;
pub(crate) const EMBEDDED_REF_LOCAL_FLAG: u8 = 0x10;
pub(crate) const EMBEDDED_REF_INDEX_MASK: u8 = 0x0F;
pub(crate) const NULL_REF_TAG: u8 = 0xA0;
pub(crate) const REF16_TAG: u8 = 0xA2;
pub(crate) const REF32_TAG: u8 = 0xA4;
pub(crate) const SIZED_REF_LOCAL_FLAG: u8 = 0x01;

pub(crate) const EMBEDDED_REF_MAX: u32 = 15;
pub(crate) const REF16_BIAS: u32 = 16;
pub(crate) const REF16_MAX: u32 = u16::MAX as u32 + REF16_BIAS;

// Containers: 0xC0 | kind << 2 | size class
pub(crate) const CONTAINER_TAG: u8 = 0xC0;
pub(crate) const CONTAINER_KIND_SHIFT: u8 = 2;
pub(crate) const CONTAINER_CLASS_MASK: u8 = 0x03;

pub(crate) const MAP_KIND: u8 = 0;
pub(crate) const ARRAY_KIND: u8 = 1;
pub(crate) const FEATURE_KIND: u8 = 2;
pub(crate) const DICTIONARY_KIND: u8 = 3;

pub(crate) const SIZE_CLASS_U8: u8 = 0;
pub(crate) const SIZE_CLASS_U16: u8 = 1;
pub(crate) const SIZE_CLASS_U32: u8 = 2;

// Builders reserve the widest container header and compact it when the container closes.
pub(crate) const RESERVED_HEADER_SIZE: usize = 5;

// Tokenized text stores every word as a fixed-width local reference.
pub(crate) const TEXT_REF_SIZE: usize = 2;
pub(crate) const TEXT_WORD_SEPARATOR: char = ' ';

// String code-point classes
pub(crate) const TWO_BYTE_CHAR_FLAG: u8 = 0x80;
pub(crate) const THREE_BYTE_CHAR_FLAG: u8 = 0xC0;
pub(crate) const CHAR_CLASS_MASK: u8 = 0xC0;
pub(crate) const TWO_BYTE_CHAR_BIAS: u32 = 0x80;
pub(crate) const TWO_BYTE_CHAR_MAX: u32 = 0x407F;

// JSON text escape characters constants
pub(crate) const BS: char = '\x5C'; // \\ Backslash
pub(crate) const QU: char = '\x22'; // \" Double quotation mark
pub(crate) const BB: char = '\x08'; // \b Backspace
pub(crate) const FF: char = '\x0C'; // \f Formfeed Page Break
pub(crate) const NN: char = '\x0A'; // \n Newline
pub(crate) const RR: char = '\x0D'; // \r Carriage Return
pub(crate) const TT: char = '\x09'; // \t Horizontal Tab
