//! Core types shared by the adapters and the player

use crate::bitrate::short_label;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Level index reserved for "automatic selection enabled"
pub const AUTO_QUALITY_INDEX: i32 = -1;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One selectable rendition as reported by an engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityLevel {
    /// Engine-local level index, `-1` for the automatic entry
    pub index: i32,
    /// Bandwidth in bits per second
    pub bitrate: u64,
    /// Display label, empty for engines that do not provide one
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bitrate_str: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl QualityLevel {
    /// Level with dimensions and the short `"<n>k"` label
    pub fn new(index: i32, bitrate: u64, width: u32, height: u32) -> Self {
        Self {
            index,
            bitrate,
            bitrate_str: short_label(bitrate),
            width,
            height,
        }
    }

    /// Level carrying only an index and a bitrate
    pub fn bare(index: i32, bitrate: u64) -> Self {
        Self {
            index,
            bitrate,
            bitrate_str: String::new(),
            width: 0,
            height: 0,
        }
    }

    /// Synthetic entry that selects automatic switching
    pub fn auto() -> Self {
        Self {
            index: AUTO_QUALITY_INDEX,
            bitrate: 0,
            bitrate_str: "Auto".to_string(),
            width: 0,
            height: 0,
        }
    }

    /// Returned when the active level cannot be resolved
    pub fn fallback() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn is_auto(&self) -> bool {
        self.index == AUTO_QUALITY_INDEX
    }
}

/// Pick the entry with the strictly greatest bitrate; the first one wins ties.
pub fn highest_quality(qualities: &[QualityLevel]) -> Option<&QualityLevel> {
    let mut iter = qualities.iter();
    let mut best = iter.next()?;
    for quality in iter {
        if quality.bitrate > best.bitrate {
            best = quality;
        }
    }
    Some(best)
}

/// An audio rendition selectable by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub index: i32,
    pub lang: String,
    pub name: String,
}

impl AudioTrack {
    /// Build a track, substituting `"Audio <position>"` for empty labels
    pub fn new(index: i32, position: usize, lang: &str, name: &str) -> Self {
        let placeholder = || format!("Audio {}", position);
        Self {
            index,
            lang: if lang.is_empty() { placeholder() } else { lang.to_string() },
            name: if name.is_empty() { placeholder() } else { name.to_string() },
        }
    }
}

/// Streaming technology behind a `Tech`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechKind {
    Dash,
    Hls,
    Smooth,
}

impl TechKind {
    pub fn name(&self) -> &'static str {
        match self {
            TechKind::Dash => "dash",
            TechKind::Hls => "hls",
            TechKind::Smooth => "smooth",
        }
    }
}

impl std::fmt::Display for TechKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for TechKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dash" => Ok(TechKind::Dash),
            "hls" => Ok(TechKind::Hls),
            "smooth" | "mss" => Ok(TechKind::Smooth),
            other => Err(crate::Error::InvalidConfig(format!("unknown tech: {}", other))),
        }
    }
}

/// Adapter lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechState {
    Uninitialized,
    Initialized,
    /// Terminal
    Destroyed,
}

impl TechState {
    pub fn can_transition_to(&self, target: TechState) -> bool {
        use TechState::*;
        matches!(
            (self, target),
            (Uninitialized, Initialized) | (Uninitialized, Destroyed) | (Initialized, Destroyed)
        )
    }
}

impl std::fmt::Display for TechState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TechState::Uninitialized => write!(f, "uninitialized"),
            TechState::Initialized => write!(f, "initialized"),
            TechState::Destroyed => write!(f, "destroyed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_quality() {
        let qualities = vec![
            QualityLevel::new(0, 500_000, 640, 360),
            QualityLevel::new(1, 1_200_000, 1280, 720),
            QualityLevel::new(2, 900_000, 960, 540),
        ];
        assert_eq!(highest_quality(&qualities).map(|q| q.index), Some(1));
        assert!(highest_quality(&[]).is_none());
    }

    #[test]
    fn test_highest_quality_tie_keeps_first() {
        let qualities = vec![
            QualityLevel::bare(3, 800_000),
            QualityLevel::bare(7, 800_000),
        ];
        assert_eq!(highest_quality(&qualities).map(|q| q.index), Some(3));
    }

    #[test]
    fn test_audio_track_placeholders() {
        let track = AudioTrack::new(4, 2, "", "");
        assert_eq!(track.lang, "Audio 2");
        assert_eq!(track.name, "Audio 2");

        let track = AudioTrack::new(0, 0, "en", "English");
        assert_eq!(track.lang, "en");
        assert_eq!(track.name, "English");
    }

    #[test]
    fn test_quality_serialization() {
        let json = serde_json::to_value(QualityLevel::new(1, 2048, 1920, 1080)).unwrap();
        assert_eq!(json["bitrateStr"], "2k");

        let bare = serde_json::to_value(QualityLevel::bare(0, 700_000)).unwrap();
        assert!(bare.get("bitrateStr").is_none());
    }

    #[test]
    fn test_fallback_quality() {
        let q = QualityLevel::fallback();
        assert_eq!(q.index, 0);
        assert_eq!(q.bitrate_str, "0k");
        assert!(QualityLevel::auto().is_auto());
    }

    #[test]
    fn test_state_transitions() {
        assert!(TechState::Uninitialized.can_transition_to(TechState::Initialized));
        assert!(TechState::Initialized.can_transition_to(TechState::Destroyed));
        assert!(!TechState::Destroyed.can_transition_to(TechState::Initialized));
        assert!(!TechState::Initialized.can_transition_to(TechState::Initialized));
    }

    #[test]
    fn test_tech_kind_parse() {
        assert_eq!("DASH".parse::<TechKind>().unwrap(), TechKind::Dash);
        assert_eq!("mss".parse::<TechKind>().unwrap(), TechKind::Smooth);
        assert!("rtmp".parse::<TechKind>().is_err());
    }
}
