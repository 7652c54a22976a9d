//! Todo id generation.

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use reactive_atoms_core::environment::{Clock, IdGenerator, SystemClock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Process-wide sequence mixed into fallback ids
static FALLBACK_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Random UUID v4 ids drawn from the OS random source
///
/// Falls back to [`TimestampIds`] when the random source fails.
#[derive(Debug, Default)]
pub struct RandomIds<R = OsRng, C = SystemClock> {
    source: Mutex<R>,
    fallback: TimestampIds<C>,
}

impl RandomIds {
    /// Creates a new `RandomIds`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: RngCore, C: Clock> RandomIds<R, C> {
    /// Ids drawn from `source`, falling back to `fallback` when it fails
    #[must_use]
    pub const fn with_source(source: R, fallback: TimestampIds<C>) -> Self {
        Self {
            source: Mutex::new(source),
            fallback,
        }
    }
}

impl<R: RngCore + Send, C: Clock> IdGenerator for RandomIds<R, C> {
    fn next_id(&self) -> String {
        let mut bytes = [0_u8; 16];
        let filled = self
            .source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_fill_bytes(&mut bytes);

        match filled {
            Ok(()) => uuid::Builder::from_random_bytes(bytes).into_uuid().to_string(),
            Err(error) => {
                tracing::warn!(%error, "Random source unavailable, using fallback id");
                self.fallback.next_id()
            },
        }
    }
}

/// `<millis base36>-<random base36>` ids
///
/// The random part comes from a generator seeded with the clock and a
/// process-wide sequence, so it needs no OS entropy.
#[derive(Debug, Default)]
pub struct TimestampIds<C = SystemClock> {
    clock: C,
}

impl<C: Clock> TimestampIds<C> {
    /// Ids stamped with `clock`
    #[must_use]
    pub const fn with_clock(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for TimestampIds<C> {
    fn next_id(&self) -> String {
        let now = self.clock.now();
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
        let sequence = FALLBACK_SEQUENCE.fetch_add(1, Ordering::Relaxed);

        let seed = millis
            ^ u64::from(now.timestamp_subsec_nanos()).rotate_left(32)
            ^ sequence.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let random: u64 = StdRng::seed_from_u64(seed).r#gen();

        format!("{}-{}", base36(millis), base36(random ^ sequence))
    }
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut out = Vec::with_capacity(13);
    loop {
        // n % 36 < 36
        #[allow(clippy::cast_possible_truncation)]
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}
