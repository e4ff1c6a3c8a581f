/// Repeat policy applied when the current file reaches its end
use serde::{Deserialize, Serialize};

/// What plays after the current file ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatMode {
    /// Stop at the end of the file
    #[default]
    #[serde(rename = "none")]
    Off,
    /// Restart the same file
    RepeatOne,
    /// Advance through the folder, wrapping at the end
    RepeatAll,
    /// Pick another file from the folder at random
    Shuffle,
    /// Advance through the folder, stopping after the last file
    AutoPlayNext,
}

impl RepeatMode {
    /// All modes in cycling order
    pub const ALL: [RepeatMode; 5] = [
        Self::Off,
        Self::RepeatOne,
        Self::RepeatAll,
        Self::Shuffle,
        Self::AutoPlayNext,
    ];

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "none",
            Self::RepeatOne => "repeatOne",
            Self::RepeatAll => "repeatAll",
            Self::Shuffle => "shuffle",
            Self::AutoPlayNext => "autoPlayNext",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" | "off" => Some(Self::Off),
            "repeatOne" | "one" => Some(Self::RepeatOne),
            "repeatAll" | "all" => Some(Self::RepeatAll),
            "shuffle" => Some(Self::Shuffle),
            "autoPlayNext" | "next" => Some(Self::AutoPlayNext),
            _ => None,
        }
    }

    /// Whether end-of-media consults the folder queue
    #[must_use]
    pub fn uses_queue(&self) -> bool {
        matches!(self, Self::RepeatAll | Self::Shuffle | Self::AutoPlayNext)
    }

    /// The mode following this one in [`RepeatMode::ALL`]
    #[must_use]
    pub fn cycled(&self) -> Self {
        let pos = Self::ALL.iter().position(|m| m == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trip() {
        for mode in RepeatMode::ALL {
            assert_eq!(RepeatMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(RepeatMode::from_str("one"), Some(RepeatMode::RepeatOne));
        assert_eq!(RepeatMode::from_str("loop"), None);
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&RepeatMode::Off).unwrap(), "\"none\"");
        assert_eq!(
            serde_json::to_string(&RepeatMode::AutoPlayNext).unwrap(),
            "\"autoPlayNext\""
        );
    }

    #[test]
    fn only_folder_modes_use_queue() {
        assert!(!RepeatMode::Off.uses_queue());
        assert!(!RepeatMode::RepeatOne.uses_queue());
        assert!(RepeatMode::Shuffle.uses_queue());
    }

    #[test]
    fn cycling_wraps() {
        assert_eq!(RepeatMode::AutoPlayNext.cycled(), RepeatMode::Off);
    }
}
