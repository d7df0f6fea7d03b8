use std::sync::{Mutex, MutexGuard};

use crate::pattern::{Pattern, PatternCommand};

/// A message received within this window means the link is alive.
pub const CONNECTION_TIMEOUT_MS: u64 = 5000;

/// Snapshot of link health and the active command, for status reporting.
#[derive(Clone, Copy, Debug)]
pub struct LinkStatus {
    pub connected: bool,
    pub message_count: u32,
    pub last_receive_ms: Option<u64>,
    pub command: PatternCommand,
}

struct ArbiterState {
    active: PatternCommand,
    // Bumped exactly when `active` changes value. Readers compare epochs
    // to decide whether to restart their animation.
    epoch: u64,
    message_count: u32,
    last_receive_ms: Option<u64>,
}

/// Owns the single active command. Written by the ingestion thread,
/// read by the render loop and the status server. The lock is only ever
/// held for the duration of a struct copy, never across rendering or
/// decoding work, so neither side can stall the other.
pub struct CommandArbiter {
    state: Mutex<ArbiterState>,
}

impl CommandArbiter {
    pub fn new() -> CommandArbiter {
        let state = ArbiterState {
            active: Pattern::Idle.default_command(),
            epoch: 0,
            message_count: 0,
            last_receive_ms: None,
        };
        return CommandArbiter {
            state: Mutex::new(state),
        };
    }

    fn locked(&self) -> MutexGuard<'_, ArbiterState> {
        // Critical sections only do field stores and copies, so a
        // poisoned lock still holds consistent state.
        return self.state.lock().unwrap_or_else(|err| err.into_inner());
    }

    /// Make `command` the active command. Re-adopting a command equal to
    /// the active one refreshes the link bookkeeping but keeps the epoch,
    /// leaving the renderer's animation phase alone.
    pub fn adopt(&self, command: PatternCommand, now_ms: u64) {
        let mut state = self.locked();
        state.last_receive_ms = Some(now_ms);
        state.message_count = state.message_count.wrapping_add(1);
        if command != state.active {
            state.active = command;
            state.epoch += 1;
        }
    }

    /// The active command and its epoch. Before any adoption this is the
    /// IDLE default at epoch 0.
    pub fn current(&self) -> (PatternCommand, u64) {
        let state = self.locked();
        return (state.active, state.epoch);
    }

    /// Whether a command arrived within the last `CONNECTION_TIMEOUT_MS`.
    /// Always false until the first adoption.
    pub fn is_connected(&self, now_ms: u64) -> bool {
        let state = self.locked();
        return match state.last_receive_ms {
            Some(at) => now_ms.saturating_sub(at) < CONNECTION_TIMEOUT_MS,
            None => false,
        };
    }

    pub fn status(&self, now_ms: u64) -> LinkStatus {
        let state = self.locked();
        let connected = match state.last_receive_ms {
            Some(at) => now_ms.saturating_sub(at) < CONNECTION_TIMEOUT_MS,
            None => false,
        };
        return LinkStatus {
            connected,
            message_count: state.message_count,
            last_receive_ms: state.last_receive_ms,
            command: state.active,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::LedColor;

    #[test]
    fn starts_disconnected_with_idle_default() {
        let arbiter = CommandArbiter::new();
        assert!(!arbiter.is_connected(0));
        assert!(!arbiter.is_connected(u64::MAX));
        let (command, epoch) = arbiter.current();
        assert_eq!(command, Pattern::Idle.default_command());
        assert_eq!(epoch, 0);
        assert_eq!(arbiter.status(0).message_count, 0);
    }

    #[test]
    fn connectivity_window_is_five_seconds() {
        let arbiter = CommandArbiter::new();
        arbiter.adopt(Pattern::Flying.default_command(), 1000);
        assert!(arbiter.is_connected(1000));
        assert!(arbiter.is_connected(5999));
        assert!(!arbiter.is_connected(6000));
        assert!(!arbiter.is_connected(60000));
    }

    #[test]
    fn adoption_counts_messages_and_stamps_time() {
        let arbiter = CommandArbiter::new();
        arbiter.adopt(Pattern::Flying.default_command(), 10);
        arbiter.adopt(Pattern::Landing.default_command(), 20);
        let status = arbiter.status(25);
        assert_eq!(status.message_count, 2);
        assert_eq!(status.last_receive_ms, Some(20));
        assert!(status.connected);
        assert_eq!(status.command.pattern, Pattern::Landing);
    }

    #[test]
    fn identical_readoption_keeps_epoch() {
        let arbiter = CommandArbiter::new();
        arbiter.adopt(Pattern::Hovering.default_command(), 0);
        let (_, epoch) = arbiter.current();
        arbiter.adopt(Pattern::Hovering.default_command(), 3000);
        let (command, same_epoch) = arbiter.current();
        assert_eq!(same_epoch, epoch);
        assert_eq!(command.pattern, Pattern::Hovering);
        // The link bookkeeping still moved.
        let status = arbiter.status(3000);
        assert_eq!(status.message_count, 2);
        assert_eq!(status.last_receive_ms, Some(3000));
    }

    #[test]
    fn any_field_change_bumps_epoch() {
        let arbiter = CommandArbiter::new();
        arbiter.adopt(Pattern::Hovering.default_command(), 0);
        let (_, epoch) = arbiter.current();

        let mut recolored = Pattern::Hovering.default_command();
        recolored.color = LedColor::new(1, 2, 3);
        arbiter.adopt(recolored, 10);
        let (_, epoch2) = arbiter.current();
        assert_eq!(epoch2, epoch + 1);

        let mut slowed = recolored;
        slowed.speed = 9999;
        arbiter.adopt(slowed, 20);
        let (_, epoch3) = arbiter.current();
        assert_eq!(epoch3, epoch + 2);
    }

    #[test]
    fn adopting_the_idle_default_first_keeps_epoch_zero() {
        let arbiter = CommandArbiter::new();
        arbiter.adopt(Pattern::Idle.default_command(), 5);
        let (_, epoch) = arbiter.current();
        assert_eq!(epoch, 0);
        assert!(arbiter.is_connected(5));
    }
}
