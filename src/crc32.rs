//! CRC-32C (Castagnoli) hashing.
//!
//! Field names in glTF JSON are dispatched on their CRC-32C rather than
//! compared as strings. The table kernel below is a `const fn`, so every
//! `match` arm in the decoder hashes its key at compile time; runtime hashing
//! of incoming keys goes through [`hash`], which installs a hardware kernel
//! (SSE4.2 or ARMv8 CRC) on first use when the CPU supports one.

/// The Castagnoli polynomial, reversed bit order.
const POLYNOMIAL: u32 = 0x82F6_3B78;

const fn make_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLYNOMIAL
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const TABLE: [u32; 256] = make_table();

/// Table-driven CRC-32C, one byte per iteration.
///
/// This is the normative kernel; the hardware paths must agree with it
/// bit-for-bit. Usable in constant context so that key dispatch compiles to
/// an integer `match`.
pub const fn crc32c(bytes: &[u8]) -> u32 {
    let mut crc = 0u32;
    let mut i = 0;
    while i < bytes.len() {
        crc = (crc >> 8) ^ TABLE[((crc ^ bytes[i] as u32) & 0xFF) as usize];
        i += 1;
    }
    crc
}

fn table_crc32c(bytes: &[u8]) -> u32 {
    let mut crc = 0u32;
    for &byte in bytes {
        crc = (crc >> 8) ^ TABLE[((crc ^ byte as u32) & 0xFF) as usize];
    }
    crc
}

/// Hashes with the SSE4.2 `crc32` instruction, consuming 4-byte words and
/// then the 2- and 1-byte residues.
///
/// # Safety
///
/// The caller must ensure SSE4.2 is available.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse4.2")]
unsafe fn sse_crc32c(bytes: &[u8]) -> u32 {
    use std::arch::x86_64::{_mm_crc32_u16, _mm_crc32_u32, _mm_crc32_u8};

    let mut crc = 0u32;
    let mut chunks = bytes.chunks_exact(4);
    for chunk in &mut chunks {
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        crc = _mm_crc32_u32(crc, word);
    }
    let mut rest = chunks.remainder();
    if rest.len() >= 2 {
        let half = u16::from_le_bytes([rest[0], rest[1]]);
        crc = _mm_crc32_u16(crc, half);
        rest = &rest[2..];
    }
    if let Some(&byte) = rest.first() {
        crc = _mm_crc32_u8(crc, byte);
    }
    crc
}

#[cfg(target_arch = "x86_64")]
fn sse_crc32c_dispatch(bytes: &[u8]) -> u32 {
    // Selected only after the feature probe succeeded.
    unsafe { sse_crc32c(bytes) }
}

/// Hashes with the ARMv8 CRC extension, consuming 8-byte words and then the
/// 4-, 2- and 1-byte residues.
///
/// # Safety
///
/// The caller must ensure the `crc` target feature is available.
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "crc")]
unsafe fn armv8_crc32c(bytes: &[u8]) -> u32 {
    use std::arch::aarch64::{__crc32cb, __crc32cd, __crc32ch, __crc32cw};

    let mut crc = 0u32;
    let mut chunks = bytes.chunks_exact(8);
    for chunk in &mut chunks {
        let word = u64::from_le_bytes([
            chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
        ]);
        crc = __crc32cd(crc, word);
    }
    let mut rest = chunks.remainder();
    if rest.len() >= 4 {
        let word = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
        crc = __crc32cw(crc, word);
        rest = &rest[4..];
    }
    if rest.len() >= 2 {
        let half = u16::from_le_bytes([rest[0], rest[1]]);
        crc = __crc32ch(crc, half);
        rest = &rest[2..];
    }
    if let Some(&byte) = rest.first() {
        crc = __crc32cb(crc, byte);
    }
    crc
}

#[cfg(target_arch = "aarch64")]
fn armv8_crc32c_dispatch(bytes: &[u8]) -> u32 {
    unsafe { armv8_crc32c(bytes) }
}

fn probe() -> fn(&[u8]) -> u32 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("sse4.2") {
            return sse_crc32c_dispatch;
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("crc") {
            return armv8_crc32c_dispatch;
        }
    }
    table_crc32c
}

lazy_static::lazy_static! {
    static ref HASH_FN: fn(&[u8]) -> u32 = probe();
}

/// Hashes `bytes` with the kernel installed on first use.
pub fn hash(bytes: &[u8]) -> u32 {
    (*HASH_FN)(bytes)
}

/// Hashes a field name.
pub fn hash_str(key: &str) -> u32 {
    hash(key.as_bytes())
}
