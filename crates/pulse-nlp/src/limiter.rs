//! Credential rotation for a rate-limited service.
//!
//! Every credential gets exactly one attempt per cycle: the attempt budget
//! starts at the pool size, drops by one on each rate-limit signal and is
//! refilled by any success.

use std::future::Future;

use crate::error::NlpError;
use crate::pool::{token_hint, TokenPool};

#[derive(Debug)]
pub struct RateLimiter {
    pool: TokenPool,
    remaining: usize,
}

impl RateLimiter {
    #[must_use]
    pub fn new(pool: TokenPool) -> Self {
        let remaining = pool.len();
        Self { pool, remaining }
    }

    #[must_use]
    pub fn pool(&self) -> &TokenPool {
        &self.pool
    }

    /// Attempts left before the pool counts as exhausted.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Run `capability` with the active credential, rotating on
    /// [`NlpError::RateLimited`] and retrying the same call.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::PoolExhausted`] once every credential has been
    /// rate limited since the last success. Any other error is returned as is.
    pub async fn call<T, F, Fut>(&mut self, mut capability: F) -> Result<T, NlpError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, NlpError>>,
    {
        loop {
            match capability(self.pool.head().to_owned()).await {
                Ok(value) => {
                    self.remaining = self.pool.len();
                    return Ok(value);
                }
                Err(NlpError::RateLimited { status }) => {
                    self.remaining = self.remaining.saturating_sub(1);
                    if self.remaining == 0 {
                        tracing::error!(pool = self.pool.name(), "all credentials rate limited");
                        return Err(NlpError::PoolExhausted {
                            pool: self.pool.name().to_owned(),
                        });
                    }
                    let head = token_hint(self.pool.rotate());
                    tracing::warn!(
                        pool = self.pool.name(),
                        status,
                        token = %head,
                        remaining = self.remaining,
                        "rate limited; rotating to next credential"
                    );
                }
                Err(other) => return Err(other),
            }
        }
    }
}
