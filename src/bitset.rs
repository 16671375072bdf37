//! Fixed-width bit vector used to represent the X/Y membership of a vertex
//! subset.
//!
//! The layout is fixed by the wire format (`u32` size in bits, followed by
//! `ceil(size/32)` `u32` words, one bit per vertex, packed low-to-high
//! within each word) so it is hand-rolled here rather than routed through a
//! generic bitset crate whose internal word width is not under our control.

use std::fmt;

/// A fixed-width bit vector, one bit per vertex.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitset {
    size: usize,
    words: Vec<u32>,
}

impl Bitset {
    /// Creates a new, all-zero bitset of `size` bits.
    pub fn new(size: usize) -> Self {
        Bitset {
            size,
            words: vec![0; Self::word_count(size)],
        }
    }

    fn word_count(size: usize) -> usize {
        (size + 31) / 32
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.size, "bitset index out of range");
        (self.words[index / 32] >> (index % 32)) & 1 == 1
    }

    pub fn set(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.size, "bitset index out of range");
        let word = &mut self.words[index / 32];
        if value {
            *word |= 1 << (index % 32);
        } else {
            *word &= !(1 << (index % 32));
        }
    }

    /// Number of `u32` bytes this bitset needs when serialized, excluding
    /// the leading size field.
    fn payload_words(&self) -> usize {
        Self::word_count(self.size)
    }

    pub fn serialize_size(&self) -> usize {
        4 + 4 * self.payload_words()
    }

    pub fn serialize(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.size as u32).to_le_bytes());
        for word in &self.words {
            buf.extend_from_slice(&word.to_le_bytes());
        }
    }

    pub fn deserialize(buf: &[u8], pos: &mut usize) -> Result<Self, crate::error::Error> {
        let size = read_u32(buf, pos)? as usize;
        let nwords = Self::word_count(size);
        let mut words = Vec::with_capacity(nwords);
        for _ in 0..nwords {
            words.push(read_u32(buf, pos)?);
        }
        Ok(Bitset { size, words })
    }
}

fn read_u32(buf: &[u8], pos: &mut usize) -> Result<u32, crate::error::Error> {
    let end = *pos + 4;
    let bytes = buf
        .get(*pos..end)
        .ok_or(crate::error::Error::Truncated)?;
    let mut arr = [0u8; 4];
    arr.copy_from_slice(bytes);
    *pos = end;
    Ok(u32::from_le_bytes(arr))
}

impl fmt::Debug for Bitset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitset(")?;
        for i in 0..self.size {
            write!(f, "{}", if self.get(i) { '1' } else { '0' })?;
        }
        write!(f, ")")
    }
}
