//! Per-provider instruction wording.
//!
//! All three dialects ask for the same object and forbid prose; they differ
//! only in how strongly each model needs to be told.

use crate::provider::{Prompt, ProviderId, RequestConfig, RequestKind};

const GPT4_ANALYSIS: &str = r#"You are a chess analysis engine. You must return a valid JSON object with this exact structure, and nothing else - no explanations, no markdown:

{
  "evaluation": number,        // between -5 and 5, positive for white advantage
  "positionType": string,      // one of: "equal", "white_advantage", "black_advantage", "white_winning", "black_winning"
  "suggestedMoves": [          // array of move objects
    {
      "move": string,          // the move in algebraic notation
      "explanation": string    // explanation of the move
    }
  ],
  "keyPoints": string[],       // array of key points about the position
  "detailedAnalysis": string   // detailed positional and strategic analysis
}

Remember: Return ONLY the JSON object, no other text or formatting."#;

const CLAUDE_ANALYSIS: &str = r#"You are a chess analysis engine. Analyze the position and return ONLY a JSON object with this structure:
{
  "evaluation": number between -5 and 5 (positive for white advantage),
  "positionType": "equal" | "white_advantage" | "black_advantage" | "white_winning" | "black_winning",
  "suggestedMoves": [{ "move": "algebraic notation", "explanation": "explanation" }],
  "keyPoints": ["point1", "point2", ...],
  "detailedAnalysis": "detailed analysis"
}"#;

const GEMINI_ANALYSIS: &str = r#"You are a chess analysis engine. Return ONLY a JSON object (no markdown, no text) with this structure:
{
  "evaluation": number between -5 and 5 (positive for white advantage),
  "positionType": "equal" | "white_advantage" | "black_advantage" | "white_winning" | "black_winning",
  "suggestedMoves": [{ "move": "algebraic notation", "explanation": "explanation" }],
  "keyPoints": ["point1", "point2", ...],
  "detailedAnalysis": "detailed analysis"
}"#;

const MOVE_SHAPE: &str = r#"{
  "move": string,        // The move in algebraic notation (e.g., "e4", "Nf6")
  "explanation": string  // Brief explanation of the move
}"#;

fn system_text(provider: ProviderId, kind: RequestKind) -> String {
    match (kind, provider) {
        (RequestKind::Analyze, ProviderId::Gpt4) => GPT4_ANALYSIS.to_string(),
        (RequestKind::Analyze, ProviderId::Claude) => CLAUDE_ANALYSIS.to_string(),
        (RequestKind::Analyze, ProviderId::Gemini) => GEMINI_ANALYSIS.to_string(),
        (RequestKind::SuggestMove, ProviderId::Gemini) => format!(
            "You are a chess engine. Given a position in FEN notation, suggest the best move. \
             Return ONLY a JSON object (no markdown) with this structure:\n{MOVE_SHAPE}"
        ),
        (RequestKind::SuggestMove, _) => format!(
            "You are a chess engine. Given a position in FEN notation, suggest the best move. \
             Return ONLY a JSON object with this structure:\n{MOVE_SHAPE}"
        ),
    }
}

fn user_text(kind: RequestKind, fen: &str, config: &RequestConfig) -> String {
    match kind {
        RequestKind::SuggestMove => {
            format!("Suggest the best move for this chess position in FEN notation: {fen}")
        }
        RequestKind::Analyze => {
            let mut text = format!("Analyze this chess position in FEN notation: {fen}.");
            if let Some(depth) = config.analysis_depth {
                text.push_str(&format!(" Consider moves up to {depth} moves ahead."));
            }
            text.push_str(if config.consider_variations {
                " Include important variations in the analysis."
            } else {
                " Focus on the main line only."
            });
            text
        }
    }
}

pub fn build_prompt(provider: ProviderId, kind: RequestKind, fen: &str, config: &RequestConfig) -> Prompt {
    let instruction = system_text(provider, kind);
    let system = match &config.persona {
        Some(persona) => format!("{persona}\n\n{instruction}"),
        None => instruction,
    };
    Prompt {
        kind,
        system,
        user: user_text(kind, fen, config),
    }
}
