//! Time-ordered 20 character keys in the Realtime Database push-id format.
//!
//! A push id is 8 characters of millisecond timestamp followed by 12
//! characters of randomness, both written in a 64 character alphabet whose
//! ASCII order matches its numeric order. Keys therefore sort
//! lexicographically in creation order.
//!
//! Within a single millisecond the random suffix is incremented instead of
//! re-drawn, so keys minted by one generator are strictly increasing even
//! when the clock stalls or steps backwards.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use synced_todo_core::environment::Clock;

/// Push-id alphabet, in ascending ASCII order.
pub const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Length of every generated key.
pub const PUSH_ID_LEN: usize = 20;

const TIMESTAMP_LEN: usize = 8;
const RANDOM_LEN: usize = 12;

#[derive(Debug)]
struct GeneratorState {
    last_millis: u64,
    last_random: [u8; RANDOM_LEN],
    rng: StdRng,
}

/// Generates push ids from an injected [`Clock`].
pub struct PushIdGenerator {
    clock: Arc<dyn Clock>,
    state: Mutex<GeneratorState>,
}

impl std::fmt::Debug for PushIdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushIdGenerator").finish_non_exhaustive()
    }
}

impl PushIdGenerator {
    /// Create a generator seeded from OS entropy.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(clock, StdRng::from_entropy())
    }

    /// Create a generator with a fixed seed, for reproducible keys.
    #[must_use]
    pub fn with_seed(clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self::with_rng(clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        Self {
            clock,
            state: Mutex::new(GeneratorState {
                last_millis: 0,
                last_random: [0; RANDOM_LEN],
                rng,
            }),
        }
    }

    /// Mint the next key.
    pub fn next_id(&self) -> String {
        let now = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);

        // A poisoned lock still holds a consistent state: every write below
        // completes before the guard is released.
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let millis = if now > state.last_millis {
            state.last_random = fresh_random(&mut state.rng);
            now
        } else if increment(&mut state.last_random) {
            state.last_millis
        } else {
            // Random space for this millisecond is exhausted.
            state.last_random = fresh_random(&mut state.rng);
            state.last_millis + 1
        };
        state.last_millis = millis;

        let mut id = String::with_capacity(PUSH_ID_LEN);
        id.push_str(&encode_timestamp(millis));
        id.extend(
            state
                .last_random
                .iter()
                .map(|&digit| char::from(PUSH_CHARS[usize::from(digit)])),
        );
        id
    }
}

fn fresh_random(rng: &mut StdRng) -> [u8; RANDOM_LEN] {
    let mut digits = [0; RANDOM_LEN];
    for digit in &mut digits {
        *digit = rng.gen_range(0..64);
    }
    digits
}

/// Add one to a base-64 digit string; `false` on overflow.
fn increment(digits: &mut [u8; RANDOM_LEN]) -> bool {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return true;
        }
    }
    false
}

fn encode_timestamp(mut millis: u64) -> String {
    let mut chars = [b'-'; TIMESTAMP_LEN];
    for slot in chars.iter_mut().rev() {
        // Masked to 0..64, always a valid index.
        #[allow(clippy::cast_possible_truncation)]
        let index = (millis % 64) as usize;
        *slot = PUSH_CHARS[index];
        millis /= 64;
    }
    chars.iter().map(|&b| char::from(b)).collect()
}
