//! Level-triggered request fields.
//!
//! A request only holds for the tick it was asserted before. The owning
//! machine calls [`Level::take`] once at the start of its tick, which hands
//! over the value and resets the field to its default, so "nothing asked"
//! always resolves to the safe default.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level<T: Default> {
    value: T,
}

impl<T: Default> Level<T> {
    pub fn new() -> Self {
        Self {
            value: T::default(),
        }
    }

    /// Assert the request for the next tick.
    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    /// Read without consuming.
    pub fn peek(&self) -> &T {
        &self.value
    }

    /// Consume the request and reset it to the default.
    pub fn take(&mut self) -> T {
        std::mem::take(&mut self.value)
    }
}
