//! Survey drivers
//!
//! Both drivers are strictly sequential: each completion is awaited before
//! the next request is issued. A completion failure aborts the run; the last
//! persisted snapshot stays on disk as the recovery point. Snapshot failures
//! are logged and counted, never fatal.

use crate::completion::CompletionRequest;
use crate::config::{AnswerMode, Decoding, ModelConfig};
use crate::error::{Error, Result};
use crate::llm_client::LlmClient;
use crate::parser::parse_interest_rate;
use crate::prompt::{central_banker_prompt, persona_prompt, CompiledPrompt};
use crate::scenarios::ScenarioGrid;
use crate::sink::ResultSink;
use crate::tracing_ext::RunSummary;
use crate::types::{
    format_percent, CentralBankRecord, PersonaRecord, Profile, TokenUsage, CENTRAL_BANKER_ROLE,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// One parsed reply
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Trimmed reply text
    pub response: String,
    /// Braced rate, if present
    pub interest_rate: Option<f64>,
    /// Tokens billed for the exchange
    pub usage: TokenUsage,
}

/// Send one prompt and parse the reply
pub async fn ask(
    client: &dyn LlmClient,
    model: &str,
    prompt: &CompiledPrompt,
    decoding: Decoding,
) -> Result<Answer> {
    let request = CompletionRequest::new(model, prompt.messages())
        .with_temperature(decoding.temperature)
        .with_max_tokens(decoding.max_tokens);

    let completion = client.complete(request).await?;
    let response = completion.text()?;
    let interest_rate = parse_interest_rate(&response);
    if interest_rate.is_none() {
        debug!(response = %response, "no braced rate in reply");
    }

    Ok(Answer {
        response,
        interest_rate,
        usage: completion.token_usage(),
    })
}

fn rate_label(rate: Option<f64>) -> String {
    rate.map(format_percent).unwrap_or_else(|| "None".to_string())
}

fn persist_snapshot<R>(sink: &mut dyn ResultSink<R>, summary: &mut RunSummary) {
    if let Err(e) = sink.persist() {
        error!(location = %sink.location(), error = %e, "Error saving results");
        summary.save_failed();
    }
}

/// Asks every synthetic respondent about every scenario
pub struct PersonaSurvey {
    client: Arc<dyn LlmClient>,
    model: ModelConfig,
    grid: ScenarioGrid,
    start_offset: usize,
}

impl PersonaSurvey {
    /// Create a survey over `grid`
    pub fn new(client: Arc<dyn LlmClient>, model: ModelConfig, grid: ScenarioGrid) -> Self {
        Self {
            client,
            model,
            grid,
            start_offset: 0,
        }
    }

    /// Skip the first `offset` profiles
    pub fn with_start_offset(mut self, offset: usize) -> Self {
        self.start_offset = offset;
        self
    }

    /// Rows a resumed sink must already hold
    pub fn resume_rows(&self) -> usize {
        self.start_offset * self.grid.len()
    }

    /// Check that rows carried over from an earlier run are exactly the
    /// leading profiles crossed with this grid, in survey order.
    ///
    /// An empty sink starts a fresh table and always passes.
    fn check_resumed_rows(&self, profiles: &[Profile], rows: &[PersonaRecord]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        if rows.len() != self.resume_rows() {
            return Err(Error::storage(format!(
                "cannot resume at profile {}: {} rows carried over, expected {}",
                self.start_offset,
                rows.len(),
                self.resume_rows()
            )));
        }

        let per_profile = self.grid.len();
        for (i, row) in rows.iter().enumerate() {
            let profile = &profiles[i / per_profile];
            let scenario = self.grid.scenario_at(i % per_profile);
            if row.profile != *profile || Some(row.scenario) != scenario {
                return Err(Error::storage(format!(
                    "cannot resume: stored row {} ({:?}, {}) does not match the current profiles and scenarios",
                    i + 1,
                    row.profile,
                    row.scenario
                )));
            }
        }
        Ok(())
    }

    /// Run the survey, persisting a snapshot after every profile
    pub async fn run(
        &self,
        profiles: &[Profile],
        sink: &mut dyn ResultSink<PersonaRecord>,
    ) -> Result<RunSummary> {
        if self.start_offset > profiles.len() {
            return Err(Error::invalid_input(format!(
                "start offset {} is past the last of {} profiles",
                self.start_offset,
                profiles.len()
            )));
        }
        self.check_resumed_rows(profiles, sink.records())?;

        let mut summary = RunSummary::new("persona");
        let decoding = self.model.decoding(AnswerMode::Number);
        let total = profiles.len();
        info!(
            run_id = %summary.run_id,
            client = self.client.client_type(),
            endpoint = self.client.endpoint(),
            model = %self.model.model,
            profiles = total - self.start_offset,
            scenarios = self.grid.len(),
            start_offset = self.start_offset,
            "starting persona survey"
        );

        for (idx, profile) in profiles.iter().enumerate().skip(self.start_offset) {
            for scenario in self.grid.scenarios() {
                let prompt = persona_prompt(profile, &scenario);
                let answer = ask(self.client.as_ref(), &self.model.model, &prompt, decoding).await?;

                summary.record_answer(answer.interest_rate.is_some(), answer.usage);
                sink.push(PersonaRecord {
                    profile: profile.clone(),
                    scenario,
                    response: answer.response,
                    interest_rate: answer.interest_rate,
                });
            }

            persist_snapshot(sink, &mut summary);
            summary.unit_done();

            let percent_done = (idx + 1) as f64 / total as f64 * 100.0;
            info!(
                "Profile {} of {} processed. Progress: {:.2}%",
                idx + 1,
                total,
                percent_done
            );
        }

        summary.finish();
        Ok(summary)
    }
}

/// Asks the central-banker role about every scenario, several times over
pub struct CentralBankerSurvey {
    client: Arc<dyn LlmClient>,
    model: ModelConfig,
    grid: ScenarioGrid,
    mode: AnswerMode,
    iterations: u32,
}

impl CentralBankerSurvey {
    /// Create a survey over `grid`
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: ModelConfig,
        grid: ScenarioGrid,
        mode: AnswerMode,
        iterations: u32,
    ) -> Self {
        Self {
            client,
            model,
            grid,
            mode,
            iterations,
        }
    }

    /// Rows a completed run produces
    pub fn expected_rows(&self) -> usize {
        self.iterations as usize * self.grid.len()
    }

    /// Run the survey, persisting a snapshot after every iteration
    pub async fn run(&self, sink: &mut dyn ResultSink<CentralBankRecord>) -> Result<RunSummary> {
        let mut summary = RunSummary::new("central-banker");
        let decoding = self.model.decoding(self.mode);
        info!(
            run_id = %summary.run_id,
            client = self.client.client_type(),
            endpoint = self.client.endpoint(),
            model = %self.model.model,
            answer_mode = %self.mode,
            iterations = self.iterations,
            scenarios = self.grid.len(),
            "starting central-banker survey"
        );

        for iteration in 1..=self.iterations {
            info!("Starting iteration {}/{}", iteration, self.iterations);

            for scenario in self.grid.scenarios() {
                let prompt = central_banker_prompt(self.mode, &scenario);
                let answer = ask(self.client.as_ref(), &self.model.model, &prompt, decoding).await?;

                info!(
                    "Inflation: {}, Unemployment: {}, Interest Rate: {}",
                    format_percent(scenario.inflation),
                    format_percent(scenario.unemployment),
                    rate_label(answer.interest_rate)
                );

                summary.record_answer(answer.interest_rate.is_some(), answer.usage);
                sink.push(CentralBankRecord {
                    iteration,
                    role: CENTRAL_BANKER_ROLE.to_string(),
                    scenario,
                    response: answer.response,
                    interest_rate: answer.interest_rate,
                });
            }

            info!("Saving results after iteration {} ...", iteration);
            persist_snapshot(sink, &mut summary);
            summary.unit_done();
        }

        info!("All scenarios processed and results saved.");
        summary.finish();
        Ok(summary)
    }
}
