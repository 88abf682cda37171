//! ASCII case folding with SIMD acceleration.
//!
//! Provides AVX2 and SSE2 (x86_64) and NEON (aarch64) implementations that
//! fold `A`..=`Z` to lowercase sixteen or thirty-two bytes at a time. Every
//! other byte, including all bytes >= 0x80, is left untouched. Tails shorter
//! than a vector, and unsupported targets, go through the scalar loop; the
//! result is byte-identical on every path.

/// Fold ASCII uppercase letters to lowercase in place.
#[inline]
pub fn fold_ascii_lowercase(bytes: &mut [u8]) {
    let done = fold_accelerated(bytes);
    fold_ascii_lowercase_scalar(&mut bytes[done..]);
}

/// Reference implementation, one byte at a time.
#[inline]
pub fn fold_ascii_lowercase_scalar(bytes: &mut [u8]) {
    for b in bytes.iter_mut() {
        if b.is_ascii_uppercase() {
            *b += 32;
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Folds as many whole vectors as the target supports and returns the number
/// of leading bytes processed.
#[cfg(target_arch = "x86_64")]
#[inline]
fn fold_accelerated(bytes: &mut [u8]) -> usize {
    if std::arch::is_x86_feature_detected!("avx2") {
        let done = unsafe { avx2_fold(bytes) };
        return done + unsafe { sse2_fold(&mut bytes[done..]) };
    }
    unsafe { sse2_fold(bytes) }
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn fold_accelerated(bytes: &mut [u8]) -> usize {
    unsafe { neon_fold(bytes) }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline]
fn fold_accelerated(_bytes: &mut [u8]) -> usize {
    0
}

// ============================================================================
// x86_64
// ============================================================================

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn avx2_fold(bytes: &mut [u8]) -> usize {
    use std::arch::x86_64::*;

    let len = bytes.len();
    let ptr = bytes.as_mut_ptr();

    // Signed compares: bytes >= 0x80 are negative and never fall in range.
    let below_a = _mm256_set1_epi8((b'A' - 1) as i8);
    let above_z = _mm256_set1_epi8((b'Z' + 1) as i8);
    let diff = _mm256_set1_epi8(32);

    let mut i = 0;
    while i + 32 <= len {
        let v = _mm256_loadu_si256(ptr.add(i) as *const __m256i);
        let ge_a = _mm256_cmpgt_epi8(v, below_a);
        let le_z = _mm256_cmpgt_epi8(above_z, v);
        let mask = _mm256_and_si256(ge_a, le_z);
        let folded = _mm256_add_epi8(v, _mm256_and_si256(mask, diff));
        _mm256_storeu_si256(ptr.add(i) as *mut __m256i, folded);
        i += 32;
    }
    i
}

#[cfg(target_arch = "x86_64")]
unsafe fn sse2_fold(bytes: &mut [u8]) -> usize {
    use std::arch::x86_64::*;

    let len = bytes.len();
    let ptr = bytes.as_mut_ptr();

    let below_a = _mm_set1_epi8((b'A' - 1) as i8);
    let above_z = _mm_set1_epi8((b'Z' + 1) as i8);
    let diff = _mm_set1_epi8(32);

    let mut i = 0;
    while i + 16 <= len {
        let v = _mm_loadu_si128(ptr.add(i) as *const __m128i);
        let ge_a = _mm_cmpgt_epi8(v, below_a);
        let le_z = _mm_cmpgt_epi8(above_z, v);
        let mask = _mm_and_si128(ge_a, le_z);
        let folded = _mm_add_epi8(v, _mm_and_si128(mask, diff));
        _mm_storeu_si128(ptr.add(i) as *mut __m128i, folded);
        i += 16;
    }
    i
}

// ============================================================================
// aarch64
// ============================================================================

#[cfg(target_arch = "aarch64")]
unsafe fn neon_fold(bytes: &mut [u8]) -> usize {
    use std::arch::aarch64::*;

    let len = bytes.len();
    let ptr = bytes.as_mut_ptr();

    let upper_a = vdupq_n_u8(b'A');
    let upper_z = vdupq_n_u8(b'Z');
    let diff = vdupq_n_u8(32);

    let mut i = 0;
    while i + 16 <= len {
        let v = vld1q_u8(ptr.add(i));
        let mask = vandq_u8(vcgeq_u8(v, upper_a), vcleq_u8(v, upper_z));
        let folded = vaddq_u8(v, vandq_u8(mask, diff));
        vst1q_u8(ptr.add(i), folded);
        i += 16;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (state >> 33) as u8
            })
            .collect()
    }

    #[test]
    fn test_scalar_fold() {
        let mut bytes = b"Hello, WORLD! 123 Zebra@[`{".to_vec();
        fold_ascii_lowercase_scalar(&mut bytes);
        assert_eq!(&bytes, b"hello, world! 123 zebra@[`{");
    }

    #[test]
    fn test_fold_leaves_non_ascii_untouched() {
        let mut bytes = "ÄÖÜ Straße ÉCOLE".as_bytes().to_vec();
        let original = bytes.clone();
        fold_ascii_lowercase(&mut bytes);

        for (folded, orig) in bytes.iter().zip(&original) {
            if *orig >= 0x80 {
                assert_eq!(folded, orig);
            }
        }
        assert_eq!(String::from_utf8(bytes).unwrap(), "ÄÖÜ straße École");
    }

    #[test]
    fn test_accelerated_matches_scalar() {
        for (seed, len) in [0usize, 1, 15, 16, 17, 31, 32, 33, 64, 100, 1000]
            .into_iter()
            .enumerate()
        {
            let input = pseudo_random_bytes(len, seed as u64);
            let mut fast = input.clone();
            let mut slow = input;
            fold_ascii_lowercase(&mut fast);
            fold_ascii_lowercase_scalar(&mut slow);
            assert_eq!(fast, slow, "mismatch for len {}", len);
        }
    }

    #[test]
    fn test_range_boundaries_in_vector_body() {
        // 64 bytes so the boundaries land inside full vectors
        let mut bytes: Vec<u8> = b"@AZ[`az{".iter().copied().cycle().take(64).collect();
        fold_ascii_lowercase(&mut bytes);
        let expected: Vec<u8> = b"@az[`az{".iter().copied().cycle().take(64).collect();
        assert_eq!(bytes, expected);
    }
}
