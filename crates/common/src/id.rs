//! Monotonic, time-ordered, globally unique identifiers.
//!
//! 128 bits: a 48-bit millisecond Unix timestamp in the high bits and 80 bits
//! of randomness in the low bits, encoded the way a ULID is (Crockford
//! base32, lexicographically sortable). A per-process monotonic counter is
//! folded into the randomness whenever two calls land in the same
//! millisecond, so identifiers generated back-to-back on one process never
//! collide and never sort out of creation order.

use std::{
    fmt,
    str::FromStr,
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use rand::RngCore;
use serde::{Deserialize, Serialize};

const ENCODED_LEN: usize = 26;
const CROCKFORD: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// A 128-bit, time-ordered identifier.
///
/// `Ord` on `Identifier` matches creation order; the `Display`/`FromStr`
/// string form preserves that ordering lexicographically, which is what
/// lets a stream's events sort correctly as plain strings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Identifier(u128);

impl Identifier {
    /// The "empty" identifier: sorts before every generated value, used as
    /// the initial cursor and as a sentinel for "no events yet".
    pub const NIL: Identifier = Identifier(0);

    /// Generate a fresh identifier ordered after any previously generated
    /// one on this process (to millisecond granularity).
    #[must_use]
    pub fn new() -> Self {
        GENERATOR.with_next()
    }

    #[must_use]
    pub fn is_nil(self) -> bool {
        self.0 == 0
    }

    fn from_parts(millis: u64, entropy: u128) -> Self {
        let millis = u128::from(millis & 0xFFFF_FFFF_FFFF);
        Identifier((millis << 80) | (entropy & 0xFFFF_FFFF_FFFF_FFFF_FFFF))
    }

    fn encode(self) -> [u8; ENCODED_LEN] {
        let mut out = [0u8; ENCODED_LEN];
        let mut value = self.0;
        for slot in out.iter_mut().rev() {
            *slot = CROCKFORD[(value & 0x1F) as usize];
            value >>= 5;
        }
        out
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self::NIL
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY-free: every byte written by `encode` comes from `CROCKFORD`, valid ASCII.
        let bytes = self.encode();
        f.write_str(std::str::from_utf8(&bytes).unwrap_or_default())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({self})")
    }
}

/// Error returned when parsing a malformed identifier string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid identifier: {0:?}")]
pub struct ParseIdentifierError(String);

impl FromStr for Identifier {
    type Err = ParseIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != ENCODED_LEN {
            return Err(ParseIdentifierError(s.to_string()));
        }
        let mut value: u128 = 0;
        for &b in bytes {
            let digit = CROCKFORD
                .iter()
                .position(|&c| c == b.to_ascii_uppercase())
                .ok_or_else(|| ParseIdentifierError(s.to_string()))?;
            value = (value << 5) | digit as u128;
        }
        Ok(Identifier(value))
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for Identifier {
    type Error = ParseIdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

struct MonotonicGenerator {
    state: Mutex<(u64, u128)>,
}

impl MonotonicGenerator {
    const fn new() -> Self {
        Self {
            state: Mutex::new((0, 0)),
        }
    }

    fn with_next(&self) -> Identifier {
        let millis = now_millis();
        let mut rng = rand::rng();
        let mut entropy = rng.next_u64() as u128 | ((rng.next_u64() as u128) << 64);

        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        let (last_millis, last_entropy) = *guard;
        if millis <= last_millis {
            // Same (or, under clock skew, earlier) millisecond as the last
            // call on this process: bump the previous entropy by one so
            // ordering within the millisecond still matches call order.
            entropy = last_entropy.wrapping_add(1);
            *guard = (last_millis, entropy);
            return Identifier::from_parts(last_millis, entropy);
        }
        *guard = (millis, entropy);
        Identifier::from_parts(millis, entropy)
    }
}

static GENERATOR: MonotonicGenerator = MonotonicGenerator::new();

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
