use std::time::Duration;

/// Source of key presses polled between loop iterations.
pub trait StopControl: Send {
    /// Waits up to `delay` for a key. `None` when nothing was pressed.
    fn wait_key(&mut self, delay: Duration) -> Option<char>;
}
