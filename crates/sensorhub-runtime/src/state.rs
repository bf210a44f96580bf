use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};

use crate::control::ApCommand;

/// Reset and recovery bookkeeping for one session.
///
/// The last-state slots are written by the command path and only read back
/// when a recovery succeeds. Zero means nothing recorded.
#[derive(Debug, Default)]
pub struct ResetState {
    reset_count: AtomicU64,
    timeout_count: AtomicU32,
    last_ap_state: AtomicU8,
    last_resume_state: AtomicU8,
}

impl ResetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_count(&self) -> u64 {
        self.reset_count.load(Ordering::Acquire)
    }

    /// Count a recovery attempt and return the new total.
    pub fn begin_attempt(&self) -> u64 {
        self.reset_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn timeout_count(&self) -> u32 {
        self.timeout_count.load(Ordering::Acquire)
    }

    /// Count a transport timeout and return the new total.
    pub fn record_timeout(&self) -> u32 {
        self.timeout_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn clear_timeouts(&self) {
        self.timeout_count.store(0, Ordering::Release);
    }

    /// Remember a command the host sent so recovery can replay it.
    pub fn record_command(&self, command: ApCommand) {
        if command.is_ap_state() {
            self.last_ap_state.store(command.code(), Ordering::Release);
        } else if command.is_resume_state() {
            self.last_resume_state.store(command.code(), Ordering::Release);
        }
    }

    pub fn last_ap_state(&self) -> Option<ApCommand> {
        ApCommand::from_code(self.last_ap_state.load(Ordering::Acquire))
    }

    pub fn last_resume_state(&self) -> Option<ApCommand> {
        ApCommand::from_code(self.last_resume_state.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let state = ResetState::new();
        assert_eq!(state.reset_count(), 0);
        assert_eq!(state.timeout_count(), 0);
        assert_eq!(state.last_ap_state(), None);
        assert_eq!(state.last_resume_state(), None);
    }

    #[test]
    fn commands_land_in_their_slot() {
        let state = ResetState::new();
        state.record_command(ApCommand::Wakeup);
        state.record_command(ApCommand::Suspend);
        state.record_command(ApCommand::Sleep);
        state.record_command(ApCommand::ResetNotice);
        assert_eq!(state.last_ap_state(), Some(ApCommand::Sleep));
        assert_eq!(state.last_resume_state(), Some(ApCommand::Suspend));
    }

    #[test]
    fn counters() {
        let state = ResetState::new();
        assert_eq!(state.begin_attempt(), 1);
        assert_eq!(state.begin_attempt(), 2);
        assert_eq!(state.record_timeout(), 1);
        assert_eq!(state.record_timeout(), 2);
        state.clear_timeouts();
        assert_eq!(state.timeout_count(), 0);
        assert_eq!(state.reset_count(), 2);
    }
}
