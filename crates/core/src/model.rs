use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CoreError, SampleId};

pub const VOICES_PER_KIT: u8 = 4;
pub const SLOTS_PER_VOICE: u8 = 12;

/// One of the four voices of a kit, numbered 1..=4.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct VoiceNumber(u8);

impl VoiceNumber {
    pub fn new(n: u8) -> Result<Self, CoreError> {
        if (1..=VOICES_PER_KIT).contains(&n) {
            Ok(Self(n))
        } else {
            Err(CoreError::InvalidVoice(n))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = VoiceNumber> {
        (1..=VOICES_PER_KIT).map(VoiceNumber)
    }
}

impl TryFrom<u8> for VoiceNumber {
    type Error = CoreError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<VoiceNumber> for u8 {
    fn from(v: VoiceNumber) -> u8 {
        v.0
    }
}

impl fmt::Debug for VoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Voice({})", self.0)
    }
}

impl fmt::Display for VoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 0-based slot position within a voice, 0..=11.
///
/// Slots are stored 0-based and shown to users 1-based; use [`SlotNumber::ordinal`]
/// for anything user-facing.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SlotNumber(u8);

impl SlotNumber {
    pub fn new(n: u8) -> Result<Self, CoreError> {
        if n < SLOTS_PER_VOICE {
            Ok(Self(n))
        } else {
            Err(CoreError::InvalidSlot(n))
        }
    }

    pub fn from_index(index: usize) -> Result<Self, CoreError> {
        u8::try_from(index)
            .map_err(|_| CoreError::InvalidSlot(u8::MAX))
            .and_then(Self::new)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// 1-based position for display.
    pub fn ordinal(self) -> u8 {
        self.0 + 1
    }
}

impl TryFrom<u8> for SlotNumber {
    type Error = CoreError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<SlotNumber> for u8 {
    fn from(s: SlotNumber) -> u8 {
        s.0
    }
}

impl fmt::Debug for SlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({})", self.0)
    }
}

impl fmt::Display for SlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementMode {
    /// Shift existing occupants up to make room.
    Insert,
    /// Replace any occupant at the destination.
    Overwrite,
}

impl PlacementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Overwrite => "overwrite",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "insert" => Ok(Self::Insert),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(CoreError::InvalidPlacementMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kit {
    pub name: String,
    pub bank_id: String,
    pub alias: Option<String>,
    pub editable: bool,
    pub locked: bool,
    pub modified: bool,
}

impl Kit {
    /// Bank identifier for a kit name: its leading letter ("A0" is in bank "A").
    pub fn bank_for(name: &str) -> String {
        name.chars()
            .next()
            .map(|c| c.to_ascii_uppercase().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub kit_name: String,
    pub voice_number: VoiceNumber,
    pub alias: Option<String>,
}

/// The part of a sample that travels with it between slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleDescriptor {
    pub filename: String,
    pub source_path: String,
    pub is_stereo: bool,
    #[serde(default)]
    pub wav_bitrate: Option<u32>,
    #[serde(default)]
    pub wav_sample_rate: Option<u32>,
}

impl SampleDescriptor {
    pub fn from_path(source_path: &str, is_stereo: bool) -> Self {
        Self::with_options(source_path, &SampleOptions::stereo(is_stereo))
    }

    pub fn with_options(source_path: &str, options: &SampleOptions) -> Self {
        Self {
            filename: filename_of(source_path),
            source_path: source_path.to_string(),
            is_stereo: options.stereo,
            wav_bitrate: options.wav_bitrate,
            wav_sample_rate: options.wav_sample_rate,
        }
    }

    /// The add/replace options that recreate this sample as it was.
    pub fn options(&self) -> SampleOptions {
        SampleOptions {
            stereo: self.is_stereo,
            wav_bitrate: self.wav_bitrate,
            wav_sample_rate: self.wav_sample_rate,
        }
    }
}

/// Last path component, or the whole path when it has none.
pub fn filename_of(source_path: &str) -> String {
    Path::new(source_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_path.to_string())
}

/// Per-call options for add and replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleOptions {
    pub stereo: bool,
    pub wav_bitrate: Option<u32>,
    pub wav_sample_rate: Option<u32>,
}

impl SampleOptions {
    pub fn stereo(stereo: bool) -> Self {
        Self {
            stereo,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub id: SampleId,
    pub kit_name: String,
    pub voice: VoiceNumber,
    pub slot: SlotNumber,
    pub filename: String,
    pub source_path: String,
    pub is_stereo: bool,
    pub wav_bitrate: Option<u32>,
    pub wav_sample_rate: Option<u32>,
}

impl Sample {
    pub fn descriptor(&self) -> SampleDescriptor {
        SampleDescriptor {
            filename: self.filename.clone(),
            source_path: self.source_path.clone(),
            is_stereo: self.is_stereo,
            wav_bitrate: self.wav_bitrate,
            wav_sample_rate: self.wav_sample_rate,
        }
    }
}
