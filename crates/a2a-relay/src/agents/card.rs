use serde::{Deserialize, Serialize};

/// The capability card an agent publishes for discovery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    pub skills: Vec<AgentSkill>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub examples: Vec<String>,
}

/// What the orchestrator is told about an agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub description: String,
    pub skills: Vec<SkillSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSummary {
    pub name: String,
    pub description: String,
}

impl AgentSummary {
    pub fn new(name: &str, card: &AgentCard) -> Self {
        Self {
            name: name.to_string(),
            description: card.description.clone(),
            skills: card
                .skills
                .iter()
                .map(|skill| SkillSummary {
                    name: skill.name.clone(),
                    description: skill.description.clone(),
                })
                .collect(),
        }
    }
}
