//! Commands the host sends to the hub, and the bus operations recovery needs.

use std::fmt;

use serde::Serialize;

use crate::error::RecoveryError;

/// AP command: host woke up.
pub const AP_WAKEUP: u8 = 0xD1;
/// AP command: host is going to sleep.
pub const AP_SLEEP: u8 = 0xD2;
/// AP command: host resumed.
pub const AP_RESUME: u8 = 0xD3;
/// AP command: host suspended.
pub const AP_SUSPEND: u8 = 0xD4;
/// AP notice: host reset the hub.
pub const AP_RESET_NOTICE: u8 = 0xD5;

/// Host-to-hub status commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ApCommand {
    Wakeup = AP_WAKEUP,
    Sleep = AP_SLEEP,
    Resume = AP_RESUME,
    Suspend = AP_SUSPEND,
    ResetNotice = AP_RESET_NOTICE,
}

impl ApCommand {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            AP_WAKEUP => Some(ApCommand::Wakeup),
            AP_SLEEP => Some(ApCommand::Sleep),
            AP_RESUME => Some(ApCommand::Resume),
            AP_SUSPEND => Some(ApCommand::Suspend),
            AP_RESET_NOTICE => Some(ApCommand::ResetNotice),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Wakeup and sleep set the AP state replayed after recovery.
    pub fn is_ap_state(self) -> bool {
        matches!(self, ApCommand::Wakeup | ApCommand::Sleep)
    }

    /// Resume and suspend set the resume state replayed after recovery.
    pub fn is_resume_state(self) -> bool {
        matches!(self, ApCommand::Resume | ApCommand::Suspend)
    }
}

impl fmt::Display for ApCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApCommand::Wakeup => "wakeup",
            ApCommand::Sleep => "sleep",
            ApCommand::Resume => "resume",
            ApCommand::Suspend => "suspend",
            ApCommand::ResetNotice => "reset_notice",
        };
        write!(f, "{name} ({:#04x})", self.code())
    }
}

/// Bus-level operations on the hub.
///
/// Calls may block on bus I/O; the recovery coordinator runs them on the
/// blocking pool.
pub trait HubControl: Send + Sync + 'static {
    /// Bring the hub back to a known state after a reset.
    fn initialize(&self) -> Result<(), RecoveryError>;

    /// Push the host's full sensor enablement state to the hub.
    fn sync_sensor_state(&self) -> Result<(), RecoveryError>;

    fn send_command(&self, command: ApCommand) -> Result<(), RecoveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in AP_WAKEUP..=AP_RESET_NOTICE {
            assert_eq!(ApCommand::from_code(code).map(ApCommand::code), Some(code));
        }
        assert_eq!(ApCommand::from_code(0xD0), None);
        assert_eq!(ApCommand::from_code(0xD6), None);
    }

    #[test]
    fn state_groups() {
        assert!(ApCommand::Sleep.is_ap_state());
        assert!(!ApCommand::Sleep.is_resume_state());
        assert!(ApCommand::Suspend.is_resume_state());
        assert!(!ApCommand::ResetNotice.is_ap_state());
        assert!(!ApCommand::ResetNotice.is_resume_state());
    }

    #[test]
    fn display_includes_code() {
        assert_eq!(ApCommand::Resume.to_string(), "resume (0xd3)");
    }
}
