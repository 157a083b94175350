//! Difficulty levels 1-3 and what they change about a request.

use crate::provider::{RequestConfig, DEFAULT_MAX_TOKENS};

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyProfile {
    pub level: u8,
    pub temperature: f32,
    pub analysis_depth: u32,
    pub consider_variations: bool,
    /// Confidence attached to analyses produced at this level.
    pub confidence: f64,
    pub prefer_simple_moves: bool,
    pub avoid_complex_positions: bool,
    pub persona: &'static str,
}

static PROFILES: [DifficultyProfile; 3] = [
    DifficultyProfile {
        level: 1,
        temperature: 0.9,
        analysis_depth: 2,
        consider_variations: false,
        confidence: 0.7,
        prefer_simple_moves: true,
        avoid_complex_positions: true,
        persona: "You are a beginner-friendly chess coach. Focus on:
- Basic piece safety and development
- Simple tactical opportunities
- Clear and educational explanations
- Avoiding overly complex positions
- Teaching basic chess principles",
    },
    DifficultyProfile {
        level: 2,
        temperature: 0.7,
        analysis_depth: 4,
        consider_variations: true,
        confidence: 0.8,
        prefer_simple_moves: false,
        avoid_complex_positions: false,
        persona: "You are an intermediate chess coach. Focus on:
- Tactical combinations and patterns
- Positional understanding
- Strategic planning
- Basic endgame principles
- Balanced decision making",
    },
    DifficultyProfile {
        level: 3,
        temperature: 0.5,
        analysis_depth: 6,
        consider_variations: true,
        confidence: 0.9,
        prefer_simple_moves: false,
        avoid_complex_positions: false,
        persona: "You are an advanced chess coach. Focus on:
- Complex tactical patterns
- Deep positional understanding
- Long-term strategic planning
- Advanced endgame technique
- Finding the most precise moves",
    },
];

impl DifficultyProfile {
    /// Profile for `level`, or `None` outside 1..=3.
    pub fn for_level(level: u8) -> Option<&'static DifficultyProfile> {
        if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            Some(&PROFILES[usize::from(level - MIN_LEVEL)])
        } else {
            None
        }
    }

    pub fn request_config(&self) -> RequestConfig {
        RequestConfig {
            temperature: self.temperature,
            max_tokens: DEFAULT_MAX_TOKENS,
            analysis_depth: Some(self.analysis_depth),
            consider_variations: self.consider_variations,
            persona: Some(self.persona_text()),
        }
    }

    /// The persona with the move-selection guidance of this level appended.
    fn persona_text(&self) -> String {
        let mut text = self.persona.to_string();
        if self.prefer_simple_moves {
            text.push_str("\n\nWhen choosing a move, prefer simple, safe moves with a clear purpose.");
        }
        if self.avoid_complex_positions {
            text.push_str("\nSteer away from sharp lines that lead to complex positions.");
        }
        text
    }
}
