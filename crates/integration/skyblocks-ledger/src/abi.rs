//! Contract ABI encoding for the three calls the client makes
//!
//! ```solidity
//! function getAllFloors() view returns (Floor[] memory);
//! function cost() view returns (uint256);
//! function buildFloor(string _message, string _twitter, uint256 _themeId) payable;
//! ```
//!
//! Only the shapes above are supported. Decoding is bounds-checked against
//! the returned bytes; a malformed response is a [`Error::Decode`], never a panic.

use crate::{Error, Result};
use ethereum_types::{Address, U256};
use sha3::{Digest, Keccak256};

pub const GET_ALL_FLOORS: &str = "getAllFloors()";
pub const COST: &str = "cost()";
pub const BUILD_FLOOR: &str = "buildFloor(string,string,uint256)";

const WORD: usize = 32;

/// Head words of one `Floor` tuple: builder, message, handle, themeId, timestamp
const FLOOR_HEAD: usize = 5 * WORD;

/// First four bytes of `keccak256(signature)`
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for a call without arguments
pub fn encode_call(signature: &str) -> Vec<u8> {
    selector(signature).to_vec()
}

/// Calldata for `buildFloor(message, twitterHandle, themeId)`
pub fn encode_build_floor(message: &str, twitter_handle: &str, theme_id: U256) -> Vec<u8> {
    let message_tail = encode_bytes(message.as_bytes());
    let handle_tail = encode_bytes(twitter_handle.as_bytes());
    let head_len = 3 * WORD;

    let mut out = Vec::with_capacity(4 + head_len + message_tail.len() + handle_tail.len());
    out.extend_from_slice(&selector(BUILD_FLOOR));
    out.extend_from_slice(&uint_word(U256::from(head_len)));
    out.extend_from_slice(&uint_word(U256::from(head_len + message_tail.len())));
    out.extend_from_slice(&uint_word(theme_id));
    out.extend_from_slice(&message_tail);
    out.extend_from_slice(&handle_tail);
    out
}

/// One `Floor` tuple exactly as the contract returns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFloor {
    pub builder: Address,
    pub message: String,
    pub twitter_handle: String,
    pub theme_id: U256,
    pub timestamp: U256,
}

/// Decode the `Floor[]` returned by `getAllFloors()`, in ledger order
pub fn decode_floors(data: &[u8]) -> Result<Vec<RawFloor>> {
    let d = Decoder { data };
    let array = d.offset_at(0)?;
    let count = d.offset_at(array)?;
    let base = array + WORD;

    // every element needs at least its offset word
    if count > (data.len() - base) / WORD {
        return Err(decode_err(format!("array length {count} exceeds response size")));
    }

    (0..count)
        .map(|i| {
            let tuple = base
                .checked_add(d.offset_at(base + i * WORD)?)
                .ok_or_else(|| decode_err("tuple offset overflow"))?;
            d.floor_at(tuple)
        })
        .collect()
}

/// Decode a single `uint256` return value
pub fn decode_uint(data: &[u8]) -> Result<U256> {
    Decoder { data }.uint_at(0)
}

struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    fn word_at(&self, pos: usize) -> Result<&'a [u8]> {
        pos.checked_add(WORD)
            .and_then(|end| self.data.get(pos..end))
            .ok_or_else(|| decode_err(format!("word at {pos} is past end ({} bytes)", self.data.len())))
    }

    fn uint_at(&self, pos: usize) -> Result<U256> {
        Ok(U256::from_big_endian(self.word_at(pos)?))
    }

    /// A length or offset; must point inside the response
    fn offset_at(&self, pos: usize) -> Result<usize> {
        let value = self.uint_at(pos)?;
        if value > U256::from(self.data.len()) {
            return Err(decode_err(format!("offset {value} at {pos} out of range")));
        }
        Ok(value.low_u64() as usize)
    }

    fn address_at(&self, pos: usize) -> Result<Address> {
        let word = self.word_at(pos)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(decode_err(format!("dirty address padding at {pos}")));
        }
        Ok(Address::from_slice(&word[12..]))
    }

    fn string_at(&self, pos: usize) -> Result<String> {
        let len = self.offset_at(pos)?;
        let start = pos + WORD;
        let bytes = start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| decode_err(format!("string at {pos} runs past end")))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| decode_err(format!("string at {pos} is not UTF-8: {e}")))
    }

    fn floor_at(&self, tuple: usize) -> Result<RawFloor> {
        // head must be present before following its offsets
        self.word_at(tuple + FLOOR_HEAD - WORD)?;
        let message = self.string_at(tuple + self.offset_at(tuple + WORD)?)?;
        let twitter_handle = self.string_at(tuple + self.offset_at(tuple + 2 * WORD)?)?;
        Ok(RawFloor {
            builder: self.address_at(tuple)?,
            message,
            twitter_handle,
            theme_id: self.uint_at(tuple + 3 * WORD)?,
            timestamp: self.uint_at(tuple + 4 * WORD)?,
        })
    }
}

fn decode_err(msg: impl Into<String>) -> Error {
    Error::Decode(msg.into())
}

pub(crate) fn uint_word(value: U256) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    word
}

/// Length word followed by the bytes, zero-padded to a word boundary
fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&uint_word(U256::from(bytes.len())));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded, 0);
    out
}

/// Encode a `getAllFloors()` return value. Used by the test doubles.
#[cfg(any(test, feature = "testing"))]
pub fn encode_floors(floors: &[RawFloor]) -> Vec<u8> {
    let tuples: Vec<Vec<u8>> = floors
        .iter()
        .map(|f| {
            let message_tail = encode_bytes(f.message.as_bytes());
            let handle_tail = encode_bytes(f.twitter_handle.as_bytes());
            let mut t = Vec::new();
            let mut builder = [0u8; WORD];
            builder[12..].copy_from_slice(f.builder.as_bytes());
            t.extend_from_slice(&builder);
            t.extend_from_slice(&uint_word(U256::from(FLOOR_HEAD)));
            t.extend_from_slice(&uint_word(U256::from(FLOOR_HEAD + message_tail.len())));
            t.extend_from_slice(&uint_word(f.theme_id));
            t.extend_from_slice(&uint_word(f.timestamp));
            t.extend_from_slice(&message_tail);
            t.extend_from_slice(&handle_tail);
            t
        })
        .collect();

    let mut out = Vec::new();
    out.extend_from_slice(&uint_word(U256::from(WORD)));
    out.extend_from_slice(&uint_word(U256::from(floors.len())));
    let mut offset = floors.len() * WORD;
    for t in &tuples {
        out.extend_from_slice(&uint_word(U256::from(offset)));
        offset += t.len();
    }
    for t in tuples {
        out.extend_from_slice(&t);
    }
    out
}
