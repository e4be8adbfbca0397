// src/infrastructure/rate_limiter.rs
//
// Token bucket for the metadata API fallback.
//
// RULES:
// - Tokens refill continuously at capacity per minute
// - A waiter reserves its token under the lock and sleeps after releasing it
// - Reservations are served in arrival order
// - A caller never sleeps past its own deadline

use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("No rate limit token available before the deadline (next token in {wait:?})")]
pub struct RateLimitExceeded {
    pub wait: Duration,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// A full bucket holding `per_minute` tokens. Zero disables limiting.
    pub fn per_minute(per_minute: u32) -> Self {
        let capacity = f64::from(per_minute);
        Self {
            capacity,
            refill_per_sec: capacity / 60.0,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.capacity <= 0.0
    }

    /// Takes one token, waiting for a refill if needed.
    ///
    /// Fails without waiting when the next token would arrive after `deadline`.
    pub async fn acquire(&self, deadline: Instant) -> Result<(), RateLimitExceeded> {
        if self.is_unlimited() {
            return Ok(());
        }

        let ready_at = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            self.refill(&mut state, now);

            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                return Ok(());
            }

            // Tokens below zero are reservations held by earlier waiters
            let wait = Duration::from_secs_f64((1.0 - state.tokens) / self.refill_per_sec);
            let ready_at = now + wait;
            if ready_at > deadline {
                log::warn!("Rate limit token due in {:?}, past request deadline", wait);
                return Err(RateLimitExceeded { wait });
            }
            state.tokens -= 1.0;
            log::debug!("Rate limited, waiting {:?} for a reserved token", wait);
            ready_at
        };

        tokio::time::sleep_until(ready_at).await;
        Ok(())
    }

    /// Tokens currently available, after refill
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state, Instant::now());
        state.tokens.max(0.0)
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }
}
