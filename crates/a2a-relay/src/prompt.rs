use serde::Serialize;
use std::fmt::Write;

use crate::agents::card::AgentSummary;
use crate::prompt_template::load_prompt;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

#[derive(Serialize)]
struct PromptContext<'a> {
    agents: &'a [AgentSummary],
    instructions: Option<&'a str>,
}

/// Build the orchestrator's system prompt from the discovered agents and any caller
/// instructions. Deterministic and infallible.
pub fn compose_system_prompt(agents: &[AgentSummary], instructions: Option<&str>) -> String {
    let instructions = instructions.filter(|text| !text.trim().is_empty());
    let context = PromptContext {
        agents,
        instructions,
    };

    match load_prompt(SYSTEM_TEMPLATE, &context) {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::warn!("failed to render system prompt template: {}", e);
            plain_prompt(agents, instructions)
        }
    }
}

fn plain_prompt(agents: &[AgentSummary], instructions: Option<&str>) -> String {
    let mut prompt = String::from(
        "You are an orchestrator. Delegate work to these agents with send_message_to_a2a_agent:\n",
    );
    for agent in agents {
        let _ = writeln!(prompt, "- {}: {}", agent.name, agent.description);
        for skill in &agent.skills {
            let _ = writeln!(prompt, "  - {}: {}", skill.name, skill.description);
        }
    }
    prompt.push_str(
        "If a result says PAYMENT_REQUIRED, ask the user to pay and then call \
         retry_a2a_agent_with_payment with the transaction hash.\n",
    );
    if let Some(instructions) = instructions {
        prompt.push('\n');
        prompt.push_str(instructions);
        prompt.push('\n');
    }
    prompt
}
