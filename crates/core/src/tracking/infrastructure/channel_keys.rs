use std::io::BufRead;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::tracking::stop_control::StopControl;

/// Key presses delivered over a channel.
///
/// A closed channel reads as "no key" so losing the feeder (e.g. stdin at
/// EOF) never stops the loop by itself.
pub struct ChannelKeys {
    rx: Receiver<char>,
}

impl ChannelKeys {
    pub fn new(rx: Receiver<char>) -> Self {
        Self { rx }
    }

    /// Channel pair for feeding keys from another thread.
    pub fn channel() -> (Sender<char>, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (tx, Self::new(rx))
    }

    /// Spawns a reader thread that sends the first character of every
    /// non-empty line. Typing `q` then Enter on a terminal sends `'q'`.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, keys) = Self::channel();
        thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if let Some(key) = line.trim().chars().next() {
                    if tx.send(key).is_err() {
                        break;
                    }
                }
            }
            log::debug!("Key reader finished");
        });
        keys
    }
}

impl StopControl for ChannelKeys {
    fn wait_key(&mut self, delay: Duration) -> Option<char> {
        match self.rx.recv_timeout(delay) {
            Ok(key) => Some(key),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
