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

use core::ops::Range;

use byteorder::BigEndian;
use byteorder::ByteOrder;
use byteorder::LittleEndian;

use crate::error::Error;
use crate::error::Result;

/// A bounds-checked, endianness-aware window over a borrowed byte buffer.
///
/// Positions passed to the getters are absolute offsets into the backing
/// buffer and must fall inside `[start, end)`. The view never copies the
/// buffer, so it is `Copy` and cheap to hand to readers and cursors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ByteView<'a> {
    buf: &'a [u8],
    start: usize,
    end: usize,
}

macro_rules! get_number {
    ($($name:ident, $ty:ty, $size:expr, $read:ident;)*) => {
        $(
            #[inline]
            pub fn $name(&self, pos: usize, little_endian: bool) -> Result<$ty> {
                let bytes = self.bytes(pos, $size)?;
                if little_endian {
                    Ok(LittleEndian::$read(bytes))
                } else {
                    Ok(BigEndian::$read(bytes))
                }
            }
        )*
    };
}

impl<'a> ByteView<'a> {
    /// Creates a view over the whole buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            start: 0,
            end: buf.len(),
        }
    }

    /// Creates a view over `buf[start..end]`.
    pub fn with_range(buf: &'a [u8], start: usize, end: usize) -> Result<Self> {
        if start > end || end > buf.len() {
            return Err(Error::InvalidEOF);
        }
        Ok(Self { buf, start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn size(&self) -> usize {
        self.end - self.start
    }

    /// The whole backing buffer, ignoring the view bounds.
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    #[inline]
    pub fn get_u8(&self, pos: usize) -> Result<u8> {
        if pos < self.start || pos >= self.end {
            return Err(Error::InvalidEOF);
        }
        Ok(self.buf[pos])
    }

    #[inline]
    pub fn get_i8(&self, pos: usize) -> Result<i8> {
        self.get_u8(pos).map(|b| b as i8)
    }

    get_number! {
        get_i16, i16, 2, read_i16;
        get_u16, u16, 2, read_u16;
        get_i32, i32, 4, read_i32;
        get_u32, u32, 4, read_u32;
        get_i64, i64, 8, read_i64;
        get_f32, f32, 4, read_f32;
        get_f64, f64, 8, read_f64;
    }

    /// Borrows `range` from the backing buffer; the range must stay inside the view.
    pub fn slice(&self, range: Range<usize>) -> Result<&'a [u8]> {
        if range.start < self.start || range.start > range.end || range.end > self.end {
            return Err(Error::InvalidEOF);
        }
        Ok(&self.buf[range])
    }

    #[inline]
    fn bytes(&self, pos: usize, len: usize) -> Result<&'a [u8]> {
        let end = pos.checked_add(len).ok_or(Error::InvalidEOF)?;
        self.slice(pos..end)
    }
}

impl<'a> From<&'a [u8]> for ByteView<'a> {
    fn from(buf: &'a [u8]) -> Self {
        ByteView::new(buf)
    }
}

impl AsRef<[u8]> for ByteView<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }
}

/// The writable counterpart of [`ByteView`], used to patch fields in place.
#[derive(Debug)]
pub struct ByteViewMut<'a> {
    buf: &'a mut [u8],
    start: usize,
    end: usize,
}

macro_rules! set_number {
    ($($name:ident, $ty:ty, $size:expr, $write:ident;)*) => {
        $(
            #[inline]
            pub fn $name(&mut self, pos: usize, value: $ty, little_endian: bool) -> Result<()> {
                let bytes = self.bytes_mut(pos, $size)?;
                if little_endian {
                    LittleEndian::$write(bytes, value);
                } else {
                    BigEndian::$write(bytes, value);
                }
                Ok(())
            }
        )*
    };
}

impl<'a> ByteViewMut<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        let end = buf.len();
        Self { buf, start: 0, end }
    }

    pub fn with_range(buf: &'a mut [u8], start: usize, end: usize) -> Result<Self> {
        if start > end || end > buf.len() {
            return Err(Error::InvalidEOF);
        }
        Ok(Self { buf, start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn size(&self) -> usize {
        self.end - self.start
    }

    /// A read-only view over the same range.
    pub fn as_view(&self) -> ByteView<'_> {
        ByteView {
            buf: &*self.buf,
            start: self.start,
            end: self.end,
        }
    }

    #[inline]
    pub fn set_u8(&mut self, pos: usize, value: u8) -> Result<()> {
        *self.bytes_mut(pos, 1)?.first_mut().ok_or(Error::InvalidEOF)? = value;
        Ok(())
    }

    #[inline]
    pub fn set_i8(&mut self, pos: usize, value: i8) -> Result<()> {
        self.set_u8(pos, value as u8)
    }

    set_number! {
        set_i16, i16, 2, write_i16;
        set_u16, u16, 2, write_u16;
        set_i32, i32, 4, write_i32;
        set_u32, u32, 4, write_u32;
        set_i64, i64, 8, write_i64;
        set_f32, f32, 4, write_f32;
        set_f64, f64, 8, write_f64;
    }

    #[inline]
    fn bytes_mut(&mut self, pos: usize, len: usize) -> Result<&mut [u8]> {
        let end = pos.checked_add(len).ok_or(Error::InvalidEOF)?;
        if pos < self.start || end > self.end {
            return Err(Error::InvalidEOF);
        }
        Ok(&mut self.buf[pos..end])
    }
}
