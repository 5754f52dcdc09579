/// A point on the session clock, in seconds since session start.
///
/// The replication core never reads a wall clock of its own: every call that
/// needs time takes a `GameTime` supplied by the host's tick loop. This keeps
/// the whole subsystem deterministic under test and immune to wall-clock
/// jumps.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct GameTime(f64);

impl GameTime {
    pub const ZERO: GameTime = GameTime(0.0);

    pub fn from_seconds(seconds: f64) -> Self {
        GameTime(seconds)
    }

    pub fn as_seconds(&self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `earlier`. Negative if `earlier` is in the
    /// future; callers that only care about age should clamp.
    pub fn seconds_since(&self, earlier: GameTime) -> f64 {
        self.0 - earlier.0
    }

    pub fn plus_seconds(&self, seconds: f64) -> GameTime {
        GameTime(self.0 + seconds)
    }
}

#[cfg(test)]
mod game_time_tests {
    use super::GameTime;

    #[test]
    fn elapsed_is_directional() {
        let start = GameTime::from_seconds(10.0);
        let later = start.plus_seconds(2.5);

        assert_eq!(later.seconds_since(start), 2.5);
        assert_eq!(start.seconds_since(later), -2.5);
    }
}
