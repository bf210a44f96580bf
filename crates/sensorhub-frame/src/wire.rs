//! Hub-to-host instruction tags.
//!
//! Every frame unit in a transfer starts with one of these bytes. Tags this
//! core does not understand are skipped as single bytes so newer hub firmware
//! can add instructions without breaking older hosts.

/// Length-prefixed library/event payload.
pub const LIBRARY_DATA: u8 = 0x01;

/// Length-prefixed debug text from the hub firmware.
pub const DEBUG_DATA: u8 = 0x03;

/// Bulk transfer header (type, length, address).
pub const BIG_DATA: u8 = 0x04;

/// Reserved. Not interpreted by this core.
pub const META_DATA: u8 = 0x05;

/// Request to resynchronize the host time base.
pub const TIME_SYNC: u8 = 0x06;

/// Hub reset notice. Handled outside the frame dispatcher.
pub const RESET: u8 = 0x07;

/// Direct sensor sample.
pub const BYPASS_DATA: u8 = 0x37;

/// An instruction tag as seen by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    LibraryData,
    DebugData,
    BigData,
    TimeSync,
    BypassData,
    /// Any other byte, including the reserved Meta-Data and Reset tags.
    Unknown(u8),
}

impl Instruction {
    pub fn from_byte(tag: u8) -> Self {
        match tag {
            LIBRARY_DATA => Instruction::LibraryData,
            DEBUG_DATA => Instruction::DebugData,
            BIG_DATA => Instruction::BigData,
            TIME_SYNC => Instruction::TimeSync,
            BYPASS_DATA => Instruction::BypassData,
            other => Instruction::Unknown(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Instruction::LibraryData => LIBRARY_DATA,
            Instruction::DebugData => DEBUG_DATA,
            Instruction::BigData => BIG_DATA,
            Instruction::TimeSync => TIME_SYNC,
            Instruction::BypassData => BYPASS_DATA,
            Instruction::Unknown(tag) => tag,
        }
    }
}

/// Returns a human-readable name for an instruction tag.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        LIBRARY_DATA => "LIBRARY_DATA",
        DEBUG_DATA => "DEBUG_DATA",
        BIG_DATA => "BIG_DATA",
        META_DATA => "META_DATA",
        TIME_SYNC => "TIME_SYNC",
        RESET => "RESET",
        BYPASS_DATA => "BYPASS_DATA",
        _ => "UNKNOWN",
    }
}
