//! Base64 decoding for embedded (`data:`) buffer and image payloads.
//!
//! Four kernels produce byte-identical output: a portable table-driven
//! fallback (the normative reference) and AVX2 / SSE4.1 / NEON fast paths
//! selected once at runtime. The vector kernels are ports of the pshufb
//! lookup technique described at <http://0x80.pl/notesen/2016-01-17-sse-base64-decoding.html>.
//!
//! Inputs must be canonical base64: length a multiple of four, padded with
//! at most two trailing `=`.

/// Host override for base64 decoding, e.g. to split large payloads across a
/// thread pool. Arguments: the encoded string, the exact-size output buffer
/// and the number of trailing padding characters.
pub type DecodeCallback = dyn Fn(&str, &mut [u8], usize) + Send + Sync;

const fn make_lut() -> [u8; 256] {
    let mut lut = [0u8; 256];
    let mut i = 0u16;
    while i < 256 {
        let c = i as u8;
        lut[i as usize] = match c {
            b'A'..=b'Z' => c - b'A',
            b'a'..=b'z' => c - b'a' + 26,
            b'0'..=b'9' => c - b'0' + 52,
            b'+' => 62,
            b'/' => 63,
            _ => 0,
        };
        i += 1;
    }
    lut
}

const LUT: [u8; 256] = make_lut();

/// Number of trailing `=` characters, at most two.
pub fn padding_of(encoded: &str) -> usize {
    encoded
        .as_bytes()
        .iter()
        .rev()
        .take(2)
        .take_while(|&&c| c == b'=')
        .count()
}

/// Exact decoded size of a canonical base64 string.
pub fn decoded_size(encoded: &str) -> usize {
    assert_eq!(encoded.len() % 4, 0);
    (encoded.len() / 4) * 3 - padding_of(encoded)
}

fn decode_quad(quad: &[u8]) -> [u8; 3] {
    let a = LUT[quad[0] as usize];
    let b = LUT[quad[1] as usize];
    let c = LUT[quad[2] as usize];
    let d = LUT[quad[3] as usize];
    [
        (a << 2) | ((b & 0x30) >> 4),
        ((b & 0x0F) << 4) | ((c & 0x3C) >> 2),
        ((c & 0x03) << 6) | d,
    ]
}

/// Portable reference decoder.
pub fn fallback_decode(encoded: &str) -> Vec<u8> {
    let mut out = vec![0u8; decoded_size(encoded)];
    fallback_decode_inplace(encoded, &mut out);
    out
}

/// Portable reference decoder writing into an exact-size buffer.
pub fn fallback_decode_inplace(encoded: &str, out: &mut [u8]) {
    assert_eq!(out.len(), decoded_size(encoded));
    let mut written = 0;
    for quad in encoded.as_bytes().chunks_exact(4) {
        let bytes = decode_quad(quad);
        let take = 3.min(out.len() - written);
        out[written..written + take].copy_from_slice(&bytes[..take]);
        written += take;
    }
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use std::arch::x86_64::*;

    /// Maps 32 ASCII base64 characters to their 6-bit values.
    #[target_feature(enable = "avx2")]
    unsafe fn lookup_pshufb_bitmask(input: __m256i) -> __m256i {
        let higher_nibble = _mm256_and_si256(_mm256_srli_epi32::<4>(input), _mm256_set1_epi8(0x0F));
        #[rustfmt::skip]
        let shift_lut = _mm256_setr_epi8(
            0, 0, 19, 4, -65, -65, -71, -71,
            0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 19, 4, -65, -65, -71, -71,
            0, 0, 0, 0, 0, 0, 0, 0,
        );
        let sh = _mm256_shuffle_epi8(shift_lut, higher_nibble);
        let eq_2f = _mm256_cmpeq_epi8(input, _mm256_set1_epi8(0x2F));
        let shift = _mm256_blendv_epi8(sh, _mm256_set1_epi8(16), eq_2f);
        _mm256_add_epi8(input, shift)
    }

    /// Packs four 6-bit values per 32-bit lane into a 24-bit value.
    #[target_feature(enable = "avx2")]
    unsafe fn pack_ints(input: __m256i) -> __m256i {
        let merge = _mm256_maddubs_epi16(input, _mm256_set1_epi32(0x0140_0140));
        _mm256_madd_epi16(merge, _mm256_set1_epi32(0x0001_1000))
    }

    /// Decodes full 32-character blocks; returns the number of input
    /// characters consumed. The caller finishes the tail with the fallback.
    #[target_feature(enable = "avx2")]
    pub unsafe fn avx2_decode_blocks(encoded: &[u8], out: &mut [u8]) -> (usize, usize) {
        #[rustfmt::skip]
        let shuf = _mm256_setr_epi8(
            2, 1, 0, 6, 5, 4, 10, 9, 8, 14, 13, 12, -1, -1, -1, -1,
            2, 1, 0, 6, 5, 4, 10, 9, 8, 14, 13, 12, -1, -1, -1, -1,
        );
        let mut pos = 0;
        let mut written = 0;
        // Each iteration stores two 16-byte lanes at written and written+12,
        // touching 28 bytes while producing 24; keep that slack in bounds.
        while pos + 32 <= encoded.len() && written + 28 <= out.len() {
            let input = _mm256_loadu_si256(encoded.as_ptr().add(pos) as *const __m256i);
            let values = lookup_pshufb_bitmask(input);
            let merged = pack_ints(values);
            let shuffled = _mm256_shuffle_epi8(merged, shuf);
            _mm_storeu_si128(
                out.as_mut_ptr().add(written) as *mut __m128i,
                _mm256_extracti128_si256::<0>(shuffled),
            );
            _mm_storeu_si128(
                out.as_mut_ptr().add(written + 12) as *mut __m128i,
                _mm256_extracti128_si256::<1>(shuffled),
            );
            pos += 32;
            written += 24;
        }
        (pos, written)
    }

    #[target_feature(enable = "sse4.1")]
    unsafe fn sse4_lookup_pshufb_bitmask(input: __m128i) -> __m128i {
        let higher_nibble = _mm_and_si128(_mm_srli_epi32::<4>(input), _mm_set1_epi8(0x0F));
        #[rustfmt::skip]
        let shift_lut = _mm_setr_epi8(
            0, 0, 19, 4, -65, -65, -71, -71,
            0, 0, 0, 0, 0, 0, 0, 0,
        );
        let sh = _mm_shuffle_epi8(shift_lut, higher_nibble);
        let eq_2f = _mm_cmpeq_epi8(input, _mm_set1_epi8(0x2F));
        let shift = _mm_blendv_epi8(sh, _mm_set1_epi8(16), eq_2f);
        _mm_add_epi8(input, shift)
    }

    #[target_feature(enable = "sse4.1")]
    unsafe fn sse4_pack_ints(input: __m128i) -> __m128i {
        let merge = _mm_maddubs_epi16(input, _mm_set1_epi32(0x0140_0140));
        _mm_madd_epi16(merge, _mm_set1_epi32(0x0001_1000))
    }

    /// Decodes full 16-character blocks; see [`avx2_decode_blocks`].
    #[target_feature(enable = "sse4.1")]
    pub unsafe fn sse4_decode_blocks(encoded: &[u8], out: &mut [u8]) -> (usize, usize) {
        #[rustfmt::skip]
        let shuf = _mm_setr_epi8(2, 1, 0, 6, 5, 4, 10, 9, 8, 14, 13, 12, -1, -1, -1, -1);
        let mut pos = 0;
        let mut written = 0;
        // One 16-byte store produces 12 payload bytes.
        while pos + 16 <= encoded.len() && written + 16 <= out.len() {
            let input = _mm_loadu_si128(encoded.as_ptr().add(pos) as *const __m128i);
            let values = sse4_lookup_pshufb_bitmask(input);
            let merged = sse4_pack_ints(values);
            let shuffled = _mm_shuffle_epi8(merged, shuf);
            _mm_storeu_si128(out.as_mut_ptr().add(written) as *mut __m128i, shuffled);
            pos += 16;
            written += 12;
        }
        (pos, written)
    }
}

#[cfg(target_arch = "aarch64")]
mod arm {
    use std::arch::aarch64::*;

    /// Decodes full 16-character blocks; the caller finishes the tail with
    /// the fallback.
    #[target_feature(enable = "neon")]
    pub unsafe fn neon_decode_blocks(encoded: &[u8], out: &mut [u8]) -> (usize, usize) {
        let shift_lut_bytes: [u8; 16] = [
            0, 0, 19, 4, 191, 191, 185, 185, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        let shift_lut = vld1q_u8(shift_lut_bytes.as_ptr());
        let shuf_bytes: [u8; 16] = [2, 1, 0, 6, 5, 4, 10, 9, 8, 14, 13, 12, 255, 255, 255, 255];
        let shuf = vld1q_u8(shuf_bytes.as_ptr());

        let mut pos = 0;
        let mut written = 0;
        while pos + 16 <= encoded.len() && written + 16 <= out.len() {
            let input = vld1q_u8(encoded.as_ptr().add(pos));
            let higher_nibble = vshrq_n_u8::<4>(input);
            let sh = vqtbl1q_u8(shift_lut, higher_nibble);
            let eq_2f = vceqq_u8(input, vdupq_n_u8(0x2F));
            let shift = vbslq_u8(eq_2f, vdupq_n_u8(16), sh);
            let values = vaddq_u8(input, shift);

            // Pack each group of four 6-bit values into a 24-bit lane value.
            let x = vreinterpretq_u32_u8(values);
            let c0 = vshlq_n_u32::<18>(vandq_u32(x, vdupq_n_u32(0x0000_003F)));
            let c1 = vshlq_n_u32::<4>(vandq_u32(x, vdupq_n_u32(0x0000_3F00)));
            let c2 = vshrq_n_u32::<10>(vandq_u32(x, vdupq_n_u32(0x003F_0000)));
            let c3 = vshrq_n_u32::<24>(vandq_u32(x, vdupq_n_u32(0x3F00_0000)));
            let packed = vorrq_u32(vorrq_u32(c0, c1), vorrq_u32(c2, c3));

            let shuffled = vqtbl1q_u8(vreinterpretq_u8_u32(packed), shuf);
            vst1q_u8(out.as_mut_ptr().add(written), shuffled);
            pos += 16;
            written += 12;
        }
        (pos, written)
    }
}

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
fn decode_with<B>(encoded: &str, out: &mut [u8], blocks: B)
where
    B: Fn(&[u8], &mut [u8]) -> (usize, usize),
{
    let (consumed, written) = blocks(encoded.as_bytes(), out);
    let tail = &encoded[consumed..];
    if !tail.is_empty() {
        fallback_decode_inplace(tail, &mut out[written..]);
    }
}

/// AVX2 decoder writing into an exact-size buffer.
#[cfg(target_arch = "x86_64")]
pub fn avx2_decode_inplace(encoded: &str, out: &mut [u8]) {
    assert_eq!(out.len(), decoded_size(encoded));
    decode_with(encoded, out, |bytes, out| unsafe {
        x86::avx2_decode_blocks(bytes, out)
    });
}

/// Allocating AVX2 decoder.
#[cfg(target_arch = "x86_64")]
pub fn avx2_decode(encoded: &str) -> Vec<u8> {
    let mut out = vec![0u8; decoded_size(encoded)];
    avx2_decode_inplace(encoded, &mut out);
    out
}

/// SSE4.1 decoder writing into an exact-size buffer.
#[cfg(target_arch = "x86_64")]
pub fn sse4_decode_inplace(encoded: &str, out: &mut [u8]) {
    assert_eq!(out.len(), decoded_size(encoded));
    decode_with(encoded, out, |bytes, out| unsafe {
        x86::sse4_decode_blocks(bytes, out)
    });
}

/// Allocating SSE4.1 decoder.
#[cfg(target_arch = "x86_64")]
pub fn sse4_decode(encoded: &str) -> Vec<u8> {
    let mut out = vec![0u8; decoded_size(encoded)];
    sse4_decode_inplace(encoded, &mut out);
    out
}

/// NEON decoder writing into an exact-size buffer.
#[cfg(target_arch = "aarch64")]
pub fn neon_decode_inplace(encoded: &str, out: &mut [u8]) {
    assert_eq!(out.len(), decoded_size(encoded));
    decode_with(encoded, out, |bytes, out| unsafe {
        arm::neon_decode_blocks(bytes, out)
    });
}

/// Allocating NEON decoder.
#[cfg(target_arch = "aarch64")]
pub fn neon_decode(encoded: &str) -> Vec<u8> {
    let mut out = vec![0u8; decoded_size(encoded)];
    neon_decode_inplace(encoded, &mut out);
    out
}

fn probe() -> fn(&str, &mut [u8]) {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return avx2_decode_inplace;
        }
        if is_x86_feature_detected!("sse4.1") {
            return sse4_decode_inplace;
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            return neon_decode_inplace;
        }
    }
    fallback_decode_inplace
}

lazy_static::lazy_static! {
    static ref DECODE_FN: fn(&str, &mut [u8]) = probe();
}

/// Decodes into an exact-size caller-supplied buffer with the kernel
/// installed on first use.
pub fn decode_inplace(encoded: &str, out: &mut [u8]) {
    (*DECODE_FN)(encoded, out)
}

/// Allocating decode with the kernel installed on first use.
pub fn decode(encoded: &str) -> Vec<u8> {
    let mut out = vec![0u8; decoded_size(encoded)];
    decode_inplace(encoded, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "SGVsbG8gV29ybGQuIEhlbGxvIFdvcmxkLg==";

    #[test]
    fn hello_world_fallback() {
        assert_eq!(fallback_decode(HELLO), b"Hello World. Hello World.");
        assert_eq!(decoded_size(HELLO), 25);
    }

    #[test]
    fn hello_world_dispatched() {
        assert_eq!(decode(HELLO), b"Hello World. Hello World.");
    }

    #[test]
    fn empty_input() {
        assert_eq!(decode(""), Vec::<u8>::new());
    }

    #[test]
    fn padding() {
        assert_eq!(padding_of("AAAA"), 0);
        assert_eq!(padding_of("AAA="), 1);
        assert_eq!(padding_of("AA=="), 2);
    }

    #[test]
    fn matches_reference_implementation() {
        let payloads: &[&[u8]] = &[
            b"f",
            b"fo",
            b"foo",
            b"foob",
            b"fooba",
            b"foobar",
            &[0u8; 100],
            &[0xFFu8; 97],
            b"A somewhat longer payload exercising the vector kernels, \
              spanning more than a single 32-character block of input.",
        ];
        for payload in payloads {
            let encoded = base64::encode(payload);
            assert_eq!(fallback_decode(&encoded), *payload);
            assert_eq!(decode(&encoded), *payload);
        }
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn simd_variants_agree() {
        if !is_x86_feature_detected!("sse4.1") {
            return;
        }
        let payload: Vec<u8> = (0..=255u8).cycle().take(1021).collect();
        let encoded = base64::encode(&payload);
        assert_eq!(sse4_decode(&encoded), fallback_decode(&encoded));
        if is_x86_feature_detected!("avx2") {
            assert_eq!(avx2_decode(&encoded), fallback_decode(&encoded));
        }
    }

    #[cfg(target_arch = "aarch64")]
    #[test]
    fn simd_variants_agree() {
        if !std::arch::is_aarch64_feature_detected!("neon") {
            return;
        }
        let payload: Vec<u8> = (0..=255u8).cycle().take(1021).collect();
        let encoded = base64::encode(&payload);
        assert_eq!(neon_decode(&encoded), fallback_decode(&encoded));
    }
}
