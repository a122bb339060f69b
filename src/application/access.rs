//! Staff PIN gate.
//!
//! A single shared numeric code keeps the tool closed to walk-in clients. This
//! is a counter-side affordance, not authentication: no hashing, no lockout.

/// Longest PIN the entry field accepts.
pub const MAX_PIN_LEN: usize = 6;

pub const WRONG_PIN_MESSAGE: &str = "Wrong PIN. Try again.";

#[derive(Clone)]
pub struct AccessGate {
    pin: String,
    unlocked: bool,
    error: bool,
}

impl AccessGate {
    pub fn new(pin: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            unlocked: false,
            error: false,
        }
    }

    /// Keep only ASCII digits, truncated to [`MAX_PIN_LEN`].
    pub fn sanitize(input: &str) -> String {
        input
            .chars()
            .filter(char::is_ascii_digit)
            .take(MAX_PIN_LEN)
            .collect()
    }

    /// Called whenever the entry field changes; clears a previous error.
    pub fn edit(&mut self) {
        self.error = false;
    }

    pub fn unlock(&mut self, candidate: &str) -> bool {
        if candidate == self.pin {
            self.unlocked = true;
            self.error = false;
        } else {
            self.error = true;
        }
        self.unlocked && !self.error
    }

    pub fn lock(&mut self) {
        self.unlocked = false;
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Message to show under the entry field, if any.
    pub fn error(&self) -> Option<&'static str> {
        self.error.then_some(WRONG_PIN_MESSAGE)
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("unlocked", &self.unlocked)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
