//! Typed message envelope codec. Every message exchanged between
//! processes is a flat `Vec<u8>` whose first byte is a type tag;
//! everything after that is the payload for that tag. This module owns
//! packing and unpacking so no other module touches raw bytes.

use crate::error::Error;
use crate::stack_elem::StackElem;

/// MPI tag used for control-plane / work-stealing traffic, matching the
/// value of `TAG_NEEDS_ATTENTION` in the program this protocol is based on.
pub const TAG_URGENT: i32 = 20;
/// MPI tag used for best-bound diffusion traffic (`TAG_CAN_WAIT`).
pub const TAG_DEFERRABLE: i32 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// "Give me some stack elements."
    Req,
    /// "I have nothing / am also idle."
    Deny,
    /// "Name a donor for me." (sent only to rank 0)
    Dreq,
    /// "Try rank r."
    Donor(i32),
    /// One serialized stack element, handed from donor to seeker.
    StkElem(StackElem),
    /// "No more elements are coming."
    Eoe,
    /// A full stack element carried for best-bound diffusion.
    Best(StackElem),
    /// Just the integer bound.
    BWeight(i32),
    /// Token-ring message.
    Token(Color),
    /// End of computation: rank 0 has declared the search complete.
    Eoc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

impl Message {
    /// Which of the two MPI tags this message travels on.
    pub fn tag(&self) -> i32 {
        match self {
            Message::Best(_) | Message::BWeight(_) => TAG_DEFERRABLE,
            _ => TAG_URGENT,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Message::Req => {
                buf.push(b'M');
                buf.push(b'R');
            }
            Message::Deny => {
                buf.push(b'M');
                buf.push(b'D');
            }
            Message::Dreq => {
                buf.push(b'M');
                buf.push(b'O');
            }
            Message::Eoe => {
                buf.push(b'M');
                buf.push(b'F');
            }
            Message::Eoc => {
                buf.push(b'M');
                buf.push(b'E');
            }
            Message::Donor(rank) => {
                buf.push(b'D');
                buf.push(*rank as i8 as u8);
            }
            Message::StkElem(e) => {
                buf.push(b'S');
                e.serialize(&mut buf);
            }
            Message::Best(e) => {
                buf.push(b'B');
                e.serialize(&mut buf);
            }
            Message::BWeight(w) => {
                buf.push(b'C');
                buf.extend_from_slice(&w.to_le_bytes());
            }
            Message::Token(color) => {
                buf.push(b'T');
                buf.push(match color {
                    Color::White => b'W',
                    Color::Black => b'B',
                });
            }
        }
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let mut pos = 0usize;
        let tag = *buf.first().ok_or(Error::Truncated)?;
        pos += 1;
        match tag {
            b'M' => {
                let sub = *buf.get(pos).ok_or(Error::Truncated)?;
                match sub {
                    b'R' => Ok(Message::Req),
                    b'D' => Ok(Message::Deny),
                    b'O' => Ok(Message::Dreq),
                    b'F' => Ok(Message::Eoe),
                    b'E' => Ok(Message::Eoc),
                    other => Err(Error::UnknownTag(other)),
                }
            }
            b'D' => {
                let raw = *buf.get(pos).ok_or(Error::Truncated)?;
                Ok(Message::Donor(raw as i8 as i32))
            }
            b'S' => {
                let e = StackElem::deserialize(buf, &mut pos)?;
                Ok(Message::StkElem(e))
            }
            b'B' => {
                let e = StackElem::deserialize(buf, &mut pos)?;
                Ok(Message::Best(e))
            }
            b'C' => {
                let end = pos + 4;
                let bytes = buf.get(pos..end).ok_or(Error::Truncated)?;
                let mut arr = [0u8; 4];
                arr.copy_from_slice(bytes);
                Ok(Message::BWeight(i32::from_le_bytes(arr)))
            }
            b'T' => {
                let sub = *buf.get(pos).ok_or(Error::Truncated)?;
                match sub {
                    b'W' => Ok(Message::Token(Color::White)),
                    b'B' => Ok(Message::Token(Color::Black)),
                    other => Err(Error::UnknownTag(other)),
                }
            }
            other => Err(Error::UnknownTag(other)),
        }
    }
}
