//! Big-Data headers and the hand-off of bulk transfers to background jobs.
//!
//! A Big-Data frame does not carry the bulk payload itself. It names where
//! the hub staged it (`address`, `length`) and what it is (`bulk_type`); a
//! job on the [`JobService`] then fetches or pushes the data over the bus
//! while the parser moves on.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::HubConfig;
use crate::cursor::FrameCursor;
use crate::error::{BulkTypeError, Result};
use crate::hooks::JobService;

/// Big-Data header: type (1) + length (4) + address (4) = 9 bytes.
pub const BULK_HEADER_SIZE: usize = 9;

/// Number of bulk types the hub defines.
pub const BULK_TYPE_COUNT: usize = 6;

/// The closed set of bulk transfer types, indexed by their wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BulkType {
    Dump = 0,
    ReadLibrary = 1,
    VoiceNet = 2,
    VoiceGrammar = 3,
    VoicePcm = 4,
    Temp = 5,
}

impl BulkType {
    pub const ALL: [BulkType; BULK_TYPE_COUNT] = [
        BulkType::Dump,
        BulkType::ReadLibrary,
        BulkType::VoiceNet,
        BulkType::VoiceGrammar,
        BulkType::VoicePcm,
        BulkType::Temp,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn is_voice(self) -> bool {
        matches!(
            self,
            BulkType::VoiceNet | BulkType::VoiceGrammar | BulkType::VoicePcm
        )
    }

    /// Job kind that services this bulk type.
    pub fn job_kind(self) -> BulkJobKind {
        match self {
            BulkType::Dump => BulkJobKind::DumpState,
            BulkType::ReadLibrary => BulkJobKind::ReadLibraryBlob,
            BulkType::VoiceNet | BulkType::VoiceGrammar => BulkJobKind::SendLibraryBlob,
            BulkType::VoicePcm => BulkJobKind::StreamPcm,
            BulkType::Temp => BulkJobKind::Noop,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BulkType::Dump => "dump",
            BulkType::ReadLibrary => "read_library",
            BulkType::VoiceNet => "voice_net",
            BulkType::VoiceGrammar => "voice_grammar",
            BulkType::VoicePcm => "voice_pcm",
            BulkType::Temp => "temp",
        }
    }
}

impl fmt::Display for BulkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The fixed set of background job kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkJobKind {
    DumpState,
    ReadLibraryBlob,
    SendLibraryBlob,
    StreamPcm,
    Noop,
}

impl BulkJobKind {
    pub fn name(self) -> &'static str {
        match self {
            BulkJobKind::DumpState => "dump_state",
            BulkJobKind::ReadLibraryBlob => "read_library_blob",
            BulkJobKind::SendLibraryBlob => "send_library_blob",
            BulkJobKind::StreamPcm => "stream_pcm",
            BulkJobKind::Noop => "noop",
        }
    }
}

/// Decoded Big-Data header. `bulk_type` is kept raw until dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkHeader {
    pub bulk_type: u8,
    pub length: u32,
    pub address: u32,
}

impl BulkHeader {
    pub fn from_bytes(raw: [u8; BULK_HEADER_SIZE]) -> Self {
        Self {
            bulk_type: raw[0],
            length: u32::from_le_bytes([raw[1], raw[2], raw[3], raw[4]]),
            address: u32::from_le_bytes([raw[5], raw[6], raw[7], raw[8]]),
        }
    }

    /// Consume exactly [`BULK_HEADER_SIZE`] bytes at the cursor.
    pub fn read(cursor: &mut FrameCursor<'_>) -> Result<Self> {
        Ok(Self::from_bytes(cursor.take_array()?))
    }
}

/// A bulk transfer ready to run. Owned by the job service once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkJob {
    pub bulk_type: BulkType,
    pub kind: BulkJobKind,
    pub length: u32,
    pub address: u32,
    /// Name of the session that received the header.
    pub session: Arc<str>,
}

/// Bulk-type → job-kind table, built once per session.
#[derive(Debug, Clone)]
pub struct BulkDispatcher {
    table: [Option<BulkJobKind>; BULK_TYPE_COUNT],
}

impl BulkDispatcher {
    /// Build the table. Without voice support the voice bulk types have no
    /// job and are rejected like unknown types.
    pub fn new(voice_enabled: bool) -> Self {
        let table = BulkType::ALL.map(|bulk_type| {
            (voice_enabled || !bulk_type.is_voice()).then(|| bulk_type.job_kind())
        });
        Self { table }
    }

    pub fn from_config(config: &HubConfig) -> Self {
        Self::new(config.voice_enabled)
    }

    /// Job kind registered for a raw bulk type, if any.
    pub fn job_kind(&self, bulk_type: u8) -> Option<BulkJobKind> {
        self.table.get(bulk_type as usize).copied().flatten()
    }

    /// Turn a header into a job and submit it.
    ///
    /// The header bytes are already consumed either way; a rejected type
    /// only skips the submission.
    pub fn dispatch(
        &self,
        header: BulkHeader,
        session: &Arc<str>,
        jobs: &dyn JobService,
    ) -> std::result::Result<BulkJobKind, BulkTypeError> {
        let (Some(bulk_type), Some(kind)) = (
            BulkType::from_index(header.bulk_type),
            self.job_kind(header.bulk_type),
        ) else {
            warn!(bulk_type = header.bulk_type, "rejecting unknown bulk type");
            return Err(BulkTypeError {
                bulk_type: header.bulk_type,
            });
        };

        debug!(
            %bulk_type,
            job = kind.name(),
            length = header.length,
            address = header.address,
            "submitting bulk job"
        );
        jobs.submit(BulkJob {
            bulk_type,
            kind,
            length: header.length,
            address: header.address,
            session: Arc::clone(session),
        });
        Ok(kind)
    }
}

impl Default for BulkDispatcher {
    fn default() -> Self {
        Self::new(true)
    }
}
