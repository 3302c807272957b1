//! Deterministic Outcome Generator.
//!
//! Provably-fair draws derived from HMAC-SHA256 over a (server seed, client
//! seed, nonce) triple. Each nonce yields an effectively infinite byte
//! stream addressed by a cursor: bytes 0..31 come from
//! `HMAC(server_seed, "client:nonce:0")`, bytes 32..63 from round 1, and so
//! on. A draw consumes 4 consecutive bytes and weights them positionally to
//! form a float in `[0, 1)`.
//!
//! For fixed inputs the output is bit-identical across runs and
//! implementations — that is the whole point. Verifiers can replay any bet
//! from the revealed seeds.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::error::EngineError;

type HmacSha256 = Hmac<Sha256>;

/// Bytes per HMAC block.
const BLOCK_LEN: u64 = 32;

/// Bytes consumed per draw.
const DRAW_LEN: usize = 4;

/// Character set for client seeds (matches the casino's own generator).
const CLIENT_SEED_CHARS: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const HEX_CHARS: &[u8] = b"0123456789abcdef";

// ---------------------------------------------------------------------------
// Seed triple
// ---------------------------------------------------------------------------

/// The seed material for one game session.
///
/// Immutable per session except for `nonce`, which advances once per
/// logical betting round. Multiple draws within one round (dealing several
/// cards, flipping several coins) reuse the nonce and advance the cursor
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SeedTriple {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
}

impl SeedTriple {
    /// Build a seed triple, failing fast on malformed input rather than
    /// silently hashing an empty seed.
    pub fn new(
        server_seed: impl Into<String>,
        client_seed: impl Into<String>,
        nonce: u64,
    ) -> Result<Self, EngineError> {
        let server_seed = server_seed.into();
        let client_seed = client_seed.into();
        if server_seed.is_empty() {
            return Err(EngineError::InvalidSeed("server seed is empty".into()));
        }
        if client_seed.is_empty() {
            return Err(EngineError::InvalidSeed("client seed is empty".into()));
        }
        Ok(Self {
            server_seed,
            client_seed,
            nonce,
        })
    }

    /// Fresh random seeds: 64 hex chars server-side, 10 alphanumeric
    /// client-side, nonce starting at 1.
    pub fn generated() -> Self {
        Self {
            server_seed: generate_server_seed(64),
            client_seed: generate_client_seed(10),
            nonce: 1,
        }
    }

    /// Advance to the next betting round.
    pub fn advance_nonce(&mut self) {
        self.nonce += 1;
    }
}

// ---------------------------------------------------------------------------
// Byte stream
// ---------------------------------------------------------------------------

/// One 32-byte block of the stream for a given nonce and round index.
fn block(seeds: &SeedTriple, round: u64) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(seeds.server_seed.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{}:{}:{}", seeds.client_seed, seeds.nonce, round).as_bytes());
    mac.finalize().into_bytes().into()
}

/// Fill `out` with stream bytes starting at `cursor`, recomputing blocks as
/// the read crosses 32-byte boundaries.
fn stream_bytes(seeds: &SeedTriple, cursor: u64, out: &mut [u8]) {
    let mut round = cursor / BLOCK_LEN;
    let mut offset = (cursor % BLOCK_LEN) as usize;
    let mut buf = block(seeds, round);

    for byte in out.iter_mut() {
        if offset == BLOCK_LEN as usize {
            round += 1;
            offset = 0;
            buf = block(seeds, round);
        }
        *byte = buf[offset];
        offset += 1;
    }
}

// ---------------------------------------------------------------------------
// Draws
// ---------------------------------------------------------------------------

/// One draw in `[0, 1)`: four stream bytes starting at `cursor`, weighted
/// big-endian as `Σ b_i / 256^(i+1)`.
pub fn draw_unit(seeds: &SeedTriple, cursor: u64) -> f64 {
    let mut bytes = [0u8; DRAW_LEN];
    stream_bytes(seeds, cursor, &mut bytes);
    bytes
        .iter()
        .enumerate()
        .map(|(i, &b)| f64::from(b) / 256f64.powi(i as i32 + 1))
        .sum()
}

/// One dice roll in `[0.00, 100.00]` with 2-decimal granularity, the scale
/// the payout table is published against.
pub fn draw_roll(seeds: &SeedTriple, cursor: u64) -> f64 {
    (draw_unit(seeds, cursor) * 10001.0).floor() / 100.0
}

// ---------------------------------------------------------------------------
// Seed generation
// ---------------------------------------------------------------------------

/// Random lowercase-hex server seed.
pub fn generate_server_seed(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| HEX_CHARS[rng.gen_range(0..HEX_CHARS.len())] as char)
        .collect()
}

/// Random alphanumeric client seed.
pub fn generate_client_seed(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CLIENT_SEED_CHARS[rng.gen_range(0..CLIENT_SEED_CHARS.len())] as char)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
