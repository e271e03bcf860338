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

use crate::error::Result;
use crate::reader::Reader;

/// Position of a typed cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Position {
    /// Not positioned yet; `next()` moves to the first element.
    #[default]
    Unset,
    At(usize),
    /// Moved past the last element or sought out of bounds.
    Invalid,
}

impl Position {
    pub fn seek(index: usize, length: usize) -> Position {
        if index < length {
            Position::At(index)
        } else {
            Position::Invalid
        }
    }

    pub fn first(length: usize) -> Position {
        Position::seek(0, length)
    }

    pub fn next(self, length: usize) -> Position {
        match self {
            Position::Unset => Position::first(length),
            Position::At(index) => Position::seek(index + 1, length),
            Position::Invalid => Position::Invalid,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Position::At(index) => Some(*index),
            _ => None,
        }
    }

    /// The current index, or `-1` when not positioned on an element.
    pub fn pos(&self) -> isize {
        match self {
            Position::At(index) => *index as isize,
            _ => -1,
        }
    }
}

/// Walks the payload of a container unit one element at a time, where an
/// element is `stride` consecutive units.
#[derive(Debug, Clone)]
struct ElementWalker<'a> {
    items: Reader<'a>,
    stride: usize,
    length: usize,
    position: Position,
    current: usize,
}

impl<'a> ElementWalker<'a> {
    fn new(items: Reader<'a>, stride: usize) -> Self {
        let mut probe = items.clone();
        let mut units = 0;
        while probe.ok() {
            units += 1;
            let _ = probe.next_unit();
        }
        let current = items.start();
        Self {
            items,
            stride,
            length: units / stride,
            position: Position::Unset,
            current,
        }
    }

    fn seek(&mut self, index: usize) -> bool {
        let target = Position::seek(index, self.length);
        let Position::At(index) = target else {
            self.position = Position::Invalid;
            return false;
        };
        let (mut at, mut offset) = match self.position {
            Position::At(current) if current <= index => (current, self.current),
            _ => (0, self.items.start()),
        };
        let mut probe = self.items.clone();
        while at < index {
            probe.set_offset(offset);
            for _ in 0..self.stride {
                let _ = probe.next_unit();
            }
            offset = probe.offset();
            at += 1;
        }
        self.current = offset;
        self.position = target;
        true
    }

    fn next(&mut self) -> bool {
        match self.position.next(self.length) {
            Position::At(index) => self.seek(index),
            _ => {
                self.position = Position::Invalid;
                false
            }
        }
    }

    fn reset(&mut self) {
        self.position = Position::Unset;
        self.current = self.items.start();
    }

    /// Reader at unit `unit` of the current element, or at the end bound when
    /// the cursor is not positioned.
    fn unit(&self, unit: usize) -> Reader<'a> {
        let mut reader = self.items.clone();
        match self.position {
            Position::At(_) => {
                reader.set_offset(self.current);
                for _ in 0..unit {
                    let _ = reader.next_unit();
                }
            }
            _ => reader.set_offset(reader.end()),
        }
        reader
    }
}

/// Indexed access to the elements of an array unit.
#[derive(Debug, Clone)]
pub struct ArrayCursor<'a> {
    walker: ElementWalker<'a>,
}

impl<'a> ArrayCursor<'a> {
    /// `items` must be bound to the payload of the array unit.
    pub(crate) fn new(items: Reader<'a>) -> Self {
        Self {
            walker: ElementWalker::new(items, 1),
        }
    }

    pub fn length(&self) -> usize {
        self.walker.length
    }

    pub fn position(&self) -> Position {
        self.walker.position
    }

    pub fn pos(&self) -> isize {
        self.walker.position.pos()
    }

    pub fn seek(&mut self, index: usize) -> bool {
        self.walker.seek(index)
    }

    pub fn first(&mut self) -> bool {
        self.walker.seek(0)
    }

    pub fn next(&mut self) -> bool {
        self.walker.next()
    }

    pub fn reset(&mut self) {
        self.walker.reset()
    }

    /// Reader positioned at the current element.
    pub fn value(&self) -> Reader<'a> {
        self.walker.unit(0)
    }
}

/// Keyed access to the entries of a map unit.
#[derive(Debug, Clone)]
pub struct MapCursor<'a> {
    walker: ElementWalker<'a>,
}

impl<'a> MapCursor<'a> {
    /// `items` must be bound to the payload of the map unit.
    pub(crate) fn new(items: Reader<'a>) -> Self {
        Self {
            walker: ElementWalker::new(items, 2),
        }
    }

    pub fn length(&self) -> usize {
        self.walker.length
    }

    pub fn position(&self) -> Position {
        self.walker.position
    }

    pub fn pos(&self) -> isize {
        self.walker.position.pos()
    }

    pub fn seek(&mut self, index: usize) -> bool {
        self.walker.seek(index)
    }

    pub fn first(&mut self) -> bool {
        self.walker.seek(0)
    }

    pub fn next(&mut self) -> bool {
        self.walker.next()
    }

    pub fn reset(&mut self) {
        self.walker.reset()
    }

    /// The current key; dictionary references are resolved.
    pub fn key(&self) -> Result<Option<Cow<'a, str>>> {
        self.walker.unit(0).read_string()
    }

    /// Reader positioned at the current value.
    pub fn value(&self) -> Reader<'a> {
        self.walker.unit(1)
    }

    /// Scans from the first entry and stops on the first key equal to `name`.
    /// When nothing matches the cursor is left `Invalid`.
    pub fn select_key(&mut self, name: &str) -> Result<bool> {
        self.reset();
        while self.next() {
            if self.key()?.as_deref() == Some(name) {
                return Ok(true);
            }
        }
        self.walker.position = Position::Invalid;
        Ok(false)
    }

    /// Reader at the value stored under `name`.
    pub fn get(&mut self, name: &str) -> Result<Option<Reader<'a>>> {
        if self.select_key(name)? {
            Ok(Some(self.value()))
        } else {
            Ok(None)
        }
    }
}
