//! Timing configuration for the session lifecycle.

use std::time::Duration;

/// Every timing knob the lifecycle layer uses.
///
/// Defaults match the production cadence; tests swap in millisecond-scale
/// values so nothing ever sleeps for real.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long an unstarted lobby lives before it is cancelled.
    pub lobby_ttl: Duration,

    /// The countdown number shown to clients when both players ready up.
    pub countdown: u32,

    /// Wall time between "both ready" and play actually starting
    /// (the 3-2-1-GO animation on the client side).
    pub start_delay: Duration,

    /// How long a disconnected player has to rejoin before forfeiting.
    pub disconnect_grace: Duration,

    /// Fixed tick period for the maze race (50 ms ⇒ 20 steps/second).
    pub tick_period: Duration,

    /// How long a terminal session lingers — still answering views and
    /// rejoins for the results screen — before its actor retires and the
    /// registry forgets it.
    pub retire_linger: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lobby_ttl: Duration::from_secs(10 * 60),
            countdown: 3,
            start_delay: Duration::from_secs(4),
            disconnect_grace: Duration::from_secs(30),
            tick_period: Duration::from_millis(50),
            retire_linger: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_production_cadence() {
        let config = SessionConfig::default();
        assert_eq!(config.lobby_ttl, Duration::from_secs(600));
        assert_eq!(config.countdown, 3);
        assert_eq!(config.start_delay, Duration::from_secs(4));
        assert_eq!(config.disconnect_grace, Duration::from_secs(30));
        assert_eq!(config.tick_period, Duration::from_millis(50));
    }
}
