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

use thiserror::Error;

use crate::unit::RefScope;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("unexpected end of JBON buffer")]
    InvalidEOF,
    #[error("invalid JBON lead-in byte 0x{0:02X}")]
    InvalidLeadIn(u8),
    #[error("invalid JBON unit")]
    InvalidUnit,
    #[error("invalid JBON string payload")]
    InvalidString,
    #[error("unexpected JBON unit type")]
    UnexpectedType,
    #[error("value {value} is out of range [{min}, {max}]")]
    ValueOutOfRange { value: i64, min: i64, max: i64 },
    #[error("payload of {0} bytes is too large")]
    PayloadTooLarge(usize),
    #[error("dictionary of {0} entries cannot be addressed by fixed-width references")]
    DictionaryOverflow(usize),
    #[error("unresolved {scope} reference {index}")]
    UnresolvedReference { scope: RefScope, index: u32 },
    #[error("dictionary has no id")]
    MissingDictionaryId,
    #[error("no open container starts at offset {0}")]
    UnbalancedContainer(usize),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
