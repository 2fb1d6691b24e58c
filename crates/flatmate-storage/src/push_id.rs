// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chronologically sortable child keys.
//!
//! A key is 8 characters of millisecond timestamp followed by 12 random
//! characters, all drawn from an alphabet whose ASCII order matches its
//! digit order. Keys minted in the same millisecond reuse the previous
//! random tail incremented by one, so byte order equals creation order.

use std::sync::Mutex;

use rand::Rng;

const ALPHABET: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

#[derive(Debug, Default)]
struct State {
    last_millis: i64,
    last_random: [u8; RANDOM_CHARS],
}

/// Generator for push keys. One per store instance.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<State>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a key for the current time.
    pub fn next(&self) -> String {
        self.next_at(flatmate_core::now_millis())
    }

    /// Mint a key for an explicit timestamp.
    pub fn next_at(&self, now: i64) -> String {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if now == state.last_millis {
            increment(&mut state.last_random);
        } else {
            let mut rng = rand::thread_rng();
            for digit in state.last_random.iter_mut() {
                *digit = rng.gen_range(0..64);
            }
            state.last_millis = now;
        }

        let mut key = Vec::with_capacity(TIME_CHARS + RANDOM_CHARS);
        let mut millis = now.max(0);
        let mut time = [0u8; TIME_CHARS];
        for slot in time.iter_mut().rev() {
            *slot = ALPHABET[(millis % 64) as usize];
            millis /= 64;
        }
        key.extend_from_slice(&time);
        key.extend(state.last_random.iter().map(|d| ALPHABET[*d as usize]));

        String::from_utf8_lossy(&key).into_owned()
    }
}

/// Add one to a base-64 digit string, carrying leftwards.
fn increment(digits: &mut [u8; RANDOM_CHARS]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_have_fixed_shape() {
        let key = PushIdGenerator::new().next();
        assert_eq!(key.len(), 20);
        assert!(key.bytes().all(|b| ALPHABET.contains(&b)));
        assert!(flatmate_core::path::validate_segment(&key).is_ok());
    }

    #[test]
    fn same_millisecond_keys_are_strictly_increasing() {
        let ids = PushIdGenerator::new();
        let keys: Vec<String> = (0..500).map(|_| ids.next_at(1_700_000_000_000)).collect();
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn later_timestamps_sort_later() {
        let ids = PushIdGenerator::new();
        let a = ids.next_at(1_000);
        let b = ids.next_at(1_001);
        let c = ids.next_at(64 * 64);
        assert!(a < b && b < c);
    }

    #[test]
    fn increment_carries() {
        let mut digits = [0u8; RANDOM_CHARS];
        digits[RANDOM_CHARS - 1] = 63;
        increment(&mut digits);
        assert_eq!(digits[RANDOM_CHARS - 1], 0);
        assert_eq!(digits[RANDOM_CHARS - 2], 1);
    }
}
