use std::collections::VecDeque;

use crate::error::NlpError;

/// Ordered API credentials. The head is the active one.
pub struct TokenPool {
    name: String,
    tokens: VecDeque<String>,
}

impl TokenPool {
    /// # Errors
    ///
    /// Returns [`NlpError::EmptyPool`] when `tokens` is empty.
    pub fn new(name: impl Into<String>, tokens: Vec<String>) -> Result<Self, NlpError> {
        let name = name.into();
        if tokens.is_empty() {
            return Err(NlpError::EmptyPool(name));
        }
        Ok(Self {
            name,
            tokens: tokens.into(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The active credential.
    #[must_use]
    pub fn head(&self) -> &str {
        self.tokens.front().map_or("", String::as_str)
    }

    /// Move the head to the tail and return the new head.
    pub fn rotate(&mut self) -> &str {
        self.tokens.rotate_left(1);
        self.head()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl std::fmt::Debug for TokenPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPool")
            .field("name", &self.name)
            .field("tokens", &format!("[{} redacted]", self.tokens.len()))
            .finish()
    }
}

/// First characters of a credential, enough to tell tokens apart in logs.
#[must_use]
pub fn token_hint(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{prefix}…")
}
