//! Fixed game parameters.

use std::time::Duration;

/// Tiles on the 4×4 board.
pub const BOARD_SIZE: usize = 16;

/// Countdown units granted at the start of the local participant's turn.
pub const TURN_COUNTDOWN: u32 = 4;

/// Length of one countdown unit.
pub const TICK: Duration = Duration::from_secs(1);

/// How long a transient notification stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(2);

/// Delay between the `blocked` notice and the forced end of the session.
pub const BLOCKED_EXIT_DELAY: Duration = Duration::from_secs(3);

/// Magnitude of every placeholder tile shown while the real board loads.
pub const PLACEHOLDER_VALUE: i64 = 15_000;
