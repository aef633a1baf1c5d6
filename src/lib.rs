//! # persona-rates
//!
//! Asks a locally served chat model for a preferred interest rate, once per
//! synthetic respondent and economic scenario, and records the answers as CSV.
//!
//! ## Pipeline
//!
//! - **Profiles**: every combination of gender, age, kids, income, education
//!   and political leaning
//! - **Scenarios**: every inflation × unemployment pair
//! - **Prompts**: a persona (or the central banker) plus the scenario question
//! - **Completion**: one sequential request per pair to an OpenAI-compatible API
//! - **Parsing**: the first `{X.XX}` in the reply
//! - **Persistence**: a full snapshot after every profile or iteration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use persona_rates::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load(None)?;
//!     let client = Arc::new(OllamaClient::new(settings.service.clone())?);
//!     let grid = ScenarioGrid::new(settings.survey.inflation.clone(), settings.survey.unemployment.clone())?;
//!
//!     let survey = CentralBankerSurvey::new(client, settings.model.clone(), grid, AnswerMode::Number, 10);
//!     let mut sink: CsvSnapshotSink<CentralBankRecord> = CsvSnapshotSink::new("resultsCentralBank.csv");
//!     survey.run(&mut sink).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod completion;
pub mod config;
pub mod error;
pub mod llm_client;
pub mod ollama;
pub mod parser;
pub mod profiles;
pub mod prompt;
pub mod scenarios;
pub mod sink;
pub mod survey;
pub mod table;
pub mod tracing_ext;
pub mod types;

// Re-exports for convenience
pub use completion::{CompletionRequest, CompletionResponse, Message, Role};
pub use config::{AnswerMode, Decoding, ModelConfig, ServiceConfig, Settings};
pub use error::{Error, Result};
pub use llm_client::LlmClient;
pub use ollama::OllamaClient;
pub use parser::parse_interest_rate;
pub use profiles::{read_profiles, write_profiles, ProfileDomains};
pub use prompt::{central_banker_prompt, persona_prompt, CompiledPrompt};
pub use scenarios::ScenarioGrid;
pub use sink::{CsvSnapshotSink, ResultSink, TableRecord};
pub use survey::{CentralBankerSurvey, PersonaSurvey};
pub use tracing_ext::{init_tracing, RunSummary};
pub use types::{CentralBankRecord, PersonaRecord, Profile, RunId, Scenario, TokenUsage};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{AnswerMode, ModelConfig, Settings};
    pub use crate::error::{Error, Result};
    pub use crate::llm_client::LlmClient;
    pub use crate::ollama::OllamaClient;
    pub use crate::scenarios::ScenarioGrid;
    pub use crate::sink::{CsvSnapshotSink, ResultSink};
    pub use crate::survey::{CentralBankerSurvey, PersonaSurvey};
    pub use crate::types::*;
}
