//! Identifier generation
//!
//! Session and event ids are 128-bit random values rendered as 32 lowercase
//! hex characters, matching the wire format Unreal clients expect from the
//! stock replay server.

use std::fmt::Write;

use rand::RngCore;

/// Generate a fresh 128-bit hex identifier
pub fn random_hex_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);

    let mut out = String::with_capacity(32);
    for b in bytes {
        // Writing to a String cannot fail
        let _ = write!(out, "{:02x}", b);
    }
    out
}
