//! DFS stack element: a partial cut `(sigma, weight, next, fresh)`.
//! Serialized as `i32 fresh, i32 weight, u32 next, bitset(sigma)`.

use crate::bitset::Bitset;
use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackElem {
    pub sigma: Bitset,
    pub weight: i32,
    pub next: u32,
    pub fresh: bool,
}

impl StackElem {
    /// The root element: nobody decided yet, `next` points at vertex 1
    /// (index 0 is never flipped, per the invariant `sigma[0] = 0`).
    pub fn root(n: usize) -> Self {
        StackElem {
            sigma: Bitset::new(n),
            weight: 0,
            next: 1,
            fresh: true,
        }
    }

    /// The initial value of the global best bound before any cut has been
    /// found: an unreachable weight so the first refresh always improves on it.
    pub fn worst(n: usize) -> Self {
        StackElem {
            sigma: Bitset::new(n),
            weight: i32::MAX,
            next: 0,
            fresh: true,
        }
    }

    pub fn serialize_size(&self) -> usize {
        4 + 4 + 4 + self.sigma.serialize_size()
    }

    pub fn serialize(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.fresh as i32).to_le_bytes());
        buf.extend_from_slice(&self.weight.to_le_bytes());
        buf.extend_from_slice(&self.next.to_le_bytes());
        self.sigma.serialize(buf);
    }

    pub fn deserialize(buf: &[u8], pos: &mut usize) -> Result<Self, Error> {
        let fresh = read_i32(buf, pos)? != 0;
        let weight = read_i32(buf, pos)?;
        let next = read_u32(buf, pos)?;
        let sigma = Bitset::deserialize(buf, pos)?;
        Ok(StackElem {
            sigma,
            weight,
            next,
            fresh,
        })
    }
}

fn read_i32(buf: &[u8], pos: &mut usize) -> Result<i32, Error> {
    let end = *pos + 4;
    let bytes = buf.get(*pos..end).ok_or(Error::Truncated)?;
    let mut arr = [0u8; 4];
    arr.copy_from_slice(bytes);
    *pos = end;
    Ok(i32::from_le_bytes(arr))
}

fn read_u32(buf: &[u8], pos: &mut usize) -> Result<u32, Error> {
    let end = *pos + 4;
    let bytes = buf.get(*pos..end).ok_or(Error::Truncated)?;
    let mut arr = [0u8; 4];
    arr.copy_from_slice(bytes);
    *pos = end;
    Ok(u32::from_le_bytes(arr))
}
