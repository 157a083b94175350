pub mod analysis;
pub mod cache;
pub mod clients;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod gateway;
pub mod parser;
pub mod prompts;
pub mod provider;
pub mod retry;
#[cfg(any(test, feature = "test-support"))]
pub mod scripted;
pub mod service;

pub use analysis::{Analysis, Clarity, PositionType, SuggestedMove};
pub use config::GatewayConfig;
pub use difficulty::DifficultyProfile;
pub use error::AnalysisError;
pub use gateway::ProviderGateway;
pub use provider::{ProviderBackend, ProviderId, RequestConfig, RequestKind};
pub use service::{AiMove, AnalysisService};
