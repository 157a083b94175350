//! Player-facing game settings.

use rand::Rng;
use serde::{Deserialize, Serialize};

use ai_analysis::difficulty::{MAX_LEVEL, MIN_LEVEL};
use ai_analysis::ProviderId;
use chess_core::Side;

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiColor {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
    #[serde(rename = "random")]
    Random,
}

impl AiColor {
    pub fn fixed(self) -> Option<Side> {
        match self {
            AiColor::White => Some(Side::White),
            AiColor::Black => Some(Side::Black),
            AiColor::Random => None,
        }
    }

    /// The concrete side for a new game. `Random` is rolled here and only here.
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> Side {
        self.fixed().unwrap_or_else(|| {
            if rng.random_bool(0.5) {
                Side::White
            } else {
                Side::Black
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub ai_color: AiColor,
    pub difficulty: u8,
    pub provider: ProviderId,
    /// Minutes per side.
    pub time_control: u32,
    /// Seconds credited after each move.
    pub increment: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_color: AiColor::Random,
            difficulty: 2,
            provider: ProviderId::Gpt4,
            time_control: 10,
            increment: 0,
        }
    }
}

impl Settings {
    pub fn initial_clock_secs(&self) -> u32 {
        self.time_control.saturating_mul(60)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&self.difficulty) {
            return Err(SessionError::InvalidSettings(format!(
                "difficulty must be between {MIN_LEVEL} and {MAX_LEVEL}"
            )));
        }
        if self.time_control == 0 {
            return Err(SessionError::InvalidSettings(
                "timeControl must be at least one minute".into(),
            ));
        }
        Ok(())
    }

    /// Settings with `patch` applied, validated.
    pub fn patched(&self, patch: &SettingsPatch) -> Result<Settings, SessionError> {
        let next = Settings {
            ai_color: patch.ai_color.unwrap_or(self.ai_color),
            difficulty: patch.difficulty.unwrap_or(self.difficulty),
            provider: patch.provider.unwrap_or(self.provider),
            time_control: patch.time_control.unwrap_or(self.time_control),
            increment: patch.increment.unwrap_or(self.increment),
        };
        next.validate()?;
        Ok(next)
    }
}

/// Partial settings update; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub ai_color: Option<AiColor>,
    pub difficulty: Option<u8>,
    pub provider: Option<ProviderId>,
    pub time_control: Option<u32>,
    pub increment: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.ai_color, AiColor::Random);
        assert_eq!(s.initial_clock_secs(), 600);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_patch_validation() {
        let s = Settings::default();
        let bad = SettingsPatch {
            difficulty: Some(4),
            ..Default::default()
        };
        assert!(matches!(s.patched(&bad), Err(SessionError::InvalidSettings(_))));

        let zero = SettingsPatch {
            time_control: Some(0),
            ..Default::default()
        };
        assert!(s.patched(&zero).is_err());

        let good = SettingsPatch {
            provider: Some(ProviderId::Claude),
            increment: Some(5),
            ..Default::default()
        };
        let next = s.patched(&good).unwrap();
        assert_eq!(next.provider, ProviderId::Claude);
        assert_eq!(next.increment, 5);
        assert_eq!(next.difficulty, 2);
    }

    #[test]
    fn test_wire_format() {
        let json: SettingsPatch = serde_json::from_str(r#"{"aiColor":"b","timeControl":5}"#).unwrap();
        assert_eq!(json.ai_color, Some(AiColor::Black));
        assert_eq!(json.time_control, Some(5));

        let value = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(value["aiColor"], "random");
        assert_eq!(value["provider"], "gpt4");
    }

    #[test]
    fn test_fixed_colour_never_rolls() {
        let mut rng = rand::rng();
        for _ in 0..10 {
            assert_eq!(AiColor::Black.resolve(&mut rng), Side::Black);
        }
    }
}
