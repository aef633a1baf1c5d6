//! Prompt templates for respondents and the central banker

use crate::completion::Message;
use crate::config::AnswerMode;
use crate::types::{format_percent, Profile, Scenario};

const NUMBER_ONLY_INSTRUCTION: &str = "You must answer ONLY with a single number representing the interest rate in the format: {X.XX}. Do not add any explanation, reasoning, or extra text. Do NOT show your thought process. Reply ONLY with the number.";

const CENTRAL_BANKER_PERSONA: &str = "You are the chief economist of the European central bank.";

/// A system/user message pair ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPrompt {
    /// Persona and answer format
    pub system: String,
    /// The scenario question
    pub user: String,
}

impl CompiledPrompt {
    /// Messages in send order
    pub fn messages(&self) -> Vec<Message> {
        vec![Message::system(&self.system), Message::user(&self.user)]
    }
}

/// Prompt for one synthetic respondent facing one scenario
pub fn persona_prompt(profile: &Profile, scenario: &Scenario) -> CompiledPrompt {
    let system = format!(
        "You are a German {}, {} years old and have {} kid(s).\
         You have {} political views. \
         You have {} degree and earn {} Euros a month. {}",
        profile.gender,
        profile.age,
        profile.kids,
        profile.politics,
        profile.education,
        profile.income,
        NUMBER_ONLY_INSTRUCTION,
    );

    CompiledPrompt {
        system,
        user: scenario_question(scenario),
    }
}

/// Prompt for the central-banker role
pub fn central_banker_prompt(mode: AnswerMode, scenario: &Scenario) -> CompiledPrompt {
    match mode {
        AnswerMode::Number => CompiledPrompt {
            system: format!("{}{}", CENTRAL_BANKER_PERSONA, NUMBER_ONLY_INSTRUCTION),
            user: scenario_question(scenario),
        },
        AnswerMode::Open => CompiledPrompt {
            system: format!(
                "{}\
                 Keep your answer concise and focused on the interest rate decision.\
                 Your answer must include the interest rate in the format: {{X.XX}}.\
                 Do not say that you 'maintain' or 'keep' the interest rate, or that you change it in a specific direction.\
                 But rather provide the interest rate as a final value.",
                CENTRAL_BANKER_PERSONA
            ),
            user: format!(
                "{}\
                 Reason using your economic expertise and the current economic indicators.\
                 Come to a conclusion and provide the interest rate in the format: {{X.XX}}.\
                 Do not provide the interest rate as a change or relative to the current rate.\
                 Give an actual interest rate value.",
                scenario_question(scenario)
            ),
        },
    }
}

fn scenario_question(scenario: &Scenario) -> String {
    format!(
        "Inflation is at {}% and unemployment is at {}%. \
         Given this current economic climate, what is your preferred interest rate?",
        format_percent(scenario.inflation),
        format_percent(scenario.unemployment)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Role;

    fn respondent() -> Profile {
        Profile {
            gender: "Men".to_string(),
            age: 35,
            kids: 1,
            income: "1500-2500".to_string(),
            education: "a college".to_string(),
            politics: "centre".to_string(),
        }
    }

    #[test]
    fn test_persona_prompt_interpolates_profile_and_scenario() {
        let prompt = persona_prompt(&respondent(), &Scenario::new(4.0, 6.0));

        assert!(prompt.system.contains("35 years old"));
        assert!(prompt.system.contains("1 kid(s)"));
        assert!(prompt.system.contains("centre political views"));
        assert!(prompt.system.contains("You are a German Men"));
        assert!(prompt.system.contains("a college degree and earn 1500-2500 Euros a month"));
        assert!(prompt.system.ends_with("Reply ONLY with the number."));

        assert!(prompt.user.contains("Inflation is at 4.0%"));
        assert!(prompt.user.contains("unemployment is at 6.0%"));
        assert!(prompt.user.ends_with("what is your preferred interest rate?"));
    }

    #[test]
    fn test_messages_are_system_then_user() {
        let messages = persona_prompt(&respondent(), &Scenario::new(2.0, 2.0)).messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn test_central_banker_number_prompt() {
        let prompt = central_banker_prompt(AnswerMode::Number, &Scenario::new(12.0, 2.0));
        assert!(prompt.system.starts_with("You are the chief economist of the European central bank."));
        assert!(prompt.system.contains("format: {X.XX}"));
        assert_eq!(
            prompt.user,
            "Inflation is at 12.0% and unemployment is at 2.0%. Given this current economic climate, what is your preferred interest rate?"
        );
    }

    #[test]
    fn test_central_banker_open_prompt_asks_for_reasoning() {
        let prompt = central_banker_prompt(AnswerMode::Open, &Scenario::new(8.0, 4.0));
        assert!(prompt.system.contains("Keep your answer concise"));
        assert!(prompt.system.contains("{X.XX}"));
        assert!(prompt.user.starts_with("Inflation is at 8.0% and unemployment is at 4.0%."));
        assert!(prompt.user.contains("Reason using your economic expertise"));
        assert!(prompt.user.ends_with("Give an actual interest rate value."));
    }
}
