//! Frame ticker
//!
//! The host drives frames; the ticker only decides whether a requested frame
//! still belongs to the current run. Every start and stop bumps a generation
//! counter, and a [`FrameToken`] from an older generation is rejected. A stop
//! or restart therefore invalidates every frame callback scheduled before it.

/// Identifies the run a frame was requested for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

/// Longest frame delta fed to animations, so a backgrounded tab does not jump
pub const MAX_FRAME_DELTA_MS: f64 = 100.0;

#[derive(Debug, Default)]
pub struct FrameTicker {
    generation: u64,
    running: bool,
    last: Option<f64>,
}

impl FrameTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new run. Tokens from earlier runs become stale.
    pub fn start(&mut self) -> FrameToken {
        self.generation += 1;
        self.running = true;
        self.last = None;
        FrameToken(self.generation)
    }

    /// End the current run. Every outstanding token becomes stale.
    pub fn stop(&mut self) {
        if self.running {
            self.generation += 1;
        }
        self.running = false;
        self.last = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Token for the current run, if one is active
    pub fn token(&self) -> Option<FrameToken> {
        self.running.then_some(FrameToken(self.generation))
    }

    /// Whether a frame scheduled with `token` should still run
    pub fn accept(&self, token: FrameToken) -> bool {
        self.running && token.0 == self.generation
    }

    /// Milliseconds since the previous frame of this run, clamped.
    ///
    /// The first frame of a run reports zero.
    pub fn delta(&mut self, now: f64) -> f64 {
        let dt = match self.last {
            Some(last) => (now - last).clamp(0.0, MAX_FRAME_DELTA_MS),
            None => 0.0,
        };
        self.last = Some(now);
        dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_invalidates_tokens() {
        let mut ticker = FrameTicker::new();
        let token = ticker.start();
        assert!(ticker.accept(token));

        ticker.stop();
        assert!(!ticker.accept(token));
        assert_eq!(ticker.token(), None);

        let restarted = ticker.start();
        assert!(!ticker.accept(token));
        assert!(ticker.accept(restarted));
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut ticker = FrameTicker::new();
        ticker.start();
        assert_eq!(ticker.delta(1000.0), 0.0);
        assert_eq!(ticker.delta(1016.0), 16.0);
        assert_eq!(ticker.delta(5000.0), MAX_FRAME_DELTA_MS);
        assert_eq!(ticker.delta(4000.0), 0.0);
    }
}
