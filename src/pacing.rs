use std::thread;
use std::time::Duration;

/// Blocking wait between requests. Swapped out in tests so nothing sleeps.
pub trait Pacer {
    fn pause(&mut self, delay: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}
