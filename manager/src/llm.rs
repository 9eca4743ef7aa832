use std::future::Future;

use anyhow::Context;
use crisis::{
    config::GameConfig, crisis_state::CrisisState, error::ConfigError, GameState, Message, Policy,
    Resource, Team,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use reqwest::StatusCode;
use tracing::debug;

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 20;
const TEMPERATURE: f64 = 0.7;
const PROMPT_MESSAGES: usize = 3;

#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Credentials {
        Credentials { api_key: api_key.into() }
    }

    pub fn from_env() -> Result<Credentials, ConfigError> {
        match std::env::var(API_KEY_VAR) {
            Ok(api_key) if !api_key.trim().is_empty() => Ok(Credentials::new(api_key)),
            _ => Err(ConfigError::MissingVar(API_KEY_VAR)),
        }
    }
}

/// Team policy backed by the messages API. Decides locally whether the team
/// has a reason to speak and only then spends a request.
pub struct LlmPolicy {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_chars: usize,
    max_transmissions: u32,
    urgency_threshold: f64,
    rng: StdRng,
}

impl LlmPolicy {
    pub fn new(credentials: &Credentials, config: &GameConfig) -> anyhow::Result<LlmPolicy> {
        let client = reqwest::Client::builder()
            .timeout(config.policy_timeout())
            .build()
            .context("could not build http client")?;
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Ok(LlmPolicy {
            client,
            endpoint: API_URL.to_string(),
            api_key: credentials.api_key.clone(),
            model: config.llm_model.clone(),
            max_chars: config.max_message_chars,
            max_transmissions: config.max_transmissions,
            urgency_threshold: config.urgency_threshold,
            rng,
        })
    }

    fn should_respond(&mut self, team: Team, state: &GameState, recent: &[Message]) -> bool {
        is_urgent_situation(&state.crisis)
            || has_direct_request(team, recent)
            || has_resource_conflict(team, state)
            || self.rng.gen::<f64>() < self.urgency_threshold
    }
}

impl Policy for LlmPolicy {
    fn decide<'a>(
        &'a mut self,
        team: Team,
        state: &'a GameState,
        recent: &'a [Message],
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send + 'a {
        let speak = self.should_respond(team, state, recent);
        let system = system_prompt(team, self.max_chars);
        let situation = situation_prompt(team, state, recent, self.max_transmissions, self.max_chars);
        async move {
            if !speak {
                debug!(%team, "nothing worth saying");
                return Ok(None);
            }
            let reply = self.complete(&system, &situation).await?;
            Ok(normalize(&reply, self.max_chars))
        }
    }
}

impl LlmPolicy {
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<String> {
        let request = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "system": system,
            "messages": [
                {"role": "user", "content": user}
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .context("messages request failed")?;
        let status = response.status();
        let body = response.text().await.context("could not read messages reply")?;
        if status != StatusCode::OK {
            anyhow::bail!("messages http={}", status.as_u16());
        }

        let value = serde_json::from_str::<serde_json::Value>(&body).context("messages reply is not json")?;
        let text = value
            .get("content")
            .and_then(|content| content.get(0))
            .and_then(|block| block.get("text"))
            .and_then(|text| text.as_str())
            .context("messages reply has no text block")?;
        Ok(text.to_string())
    }
}

pub fn is_urgent_situation(crisis: &CrisisState) -> bool {
    crisis.is_critical() || crisis.victims().values().any(|count| *count >= 3)
}

pub fn has_direct_request(team: Team, recent: &[Message]) -> bool {
    let Some(last) = recent.last() else { return false };
    last.target_team == Some(team) || last.content.to_uppercase().contains(team.as_str())
}

pub fn has_resource_conflict(team: Team, state: &GameState) -> bool {
    let allocation = &state.allocation;
    match team {
        Team::Fire => allocation.owner(Resource::Ladder) != Some(Team::Fire),
        Team::Medical => !allocation.is_leased(Resource::Ambulance1),
        Team::Police => false,
    }
}

/// Trims, uppercases, strips surrounding quotes and cuts to `max_chars`.
/// An empty result means silence.
pub fn normalize(reply: &str, max_chars: usize) -> Option<String> {
    let upper = reply.trim().to_uppercase();
    let stripped = upper.trim_matches(|c| c == '"' || c == '\'');
    let content: String = stripped.chars().take(max_chars).collect();
    if content.trim().is_empty() {
        None
    } else {
        Some(content)
    }
}

pub fn system_prompt(team: Team, max_chars: usize) -> String {
    let profile = team.profile();
    format!(
        "You are the {team} TEAM in an emergency response scenario.

CRITICAL RULES:
1. You MUST respond with EXACTLY {max_chars} characters or fewer
2. Use emergency radio protocol - be urgent and direct
3. Focus on your team's priority: {priority}
4. Coordinate with other teams for shared resources
5. Use shorthand and abbreviations to fit {max_chars} characters

Your team: {name}
Priority: {priority}

Examples of short messages:
- \"L→F3?\" (Ladder to Floor 3?)
- \"‼3V-LB\" (URGENT: 3 victims in the lobby)
- \"RTE CLR\" (Route clear)
- \"AMB1 F4?\" (Ambulance 1 to Floor 4?)
- \"EVAC BLOCK\" (Evacuation blocked)

Respond with ONLY the message, nothing else.",
        team = team.as_str(),
        priority = profile.priority_focus,
        name = profile.name,
    )
}

fn or_none<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "NONE".to_string(), |value| value.to_string())
}

pub fn situation_prompt(
    team: Team,
    state: &GameState,
    recent: &[Message],
    max_transmissions: u32,
    max_chars: usize,
) -> String {
    let status = state.team(team);
    let crisis = &state.crisis;
    let allocation = &state.allocation;

    let fires: Vec<&str> = crisis.fire_locations.iter().map(|location| location.code()).collect();
    let victims: Vec<String> = crisis.victims().iter().map(|(location, count)| format!("{location}: {count}")).collect();
    let blocked: Vec<&str> = crisis.blocked_routes.iter().map(|location| location.code()).collect();

    let mut prompt = format!(
        "EMERGENCY SITUATION UPDATE:

Your status: {team} at {location}
Priority: {priority}
Transmissions: {used}/{max_transmissions}
Time remaining: {remaining}s

CRISIS STATE:
- Fire locations: [{fires}]
- Victims: {{{victims}}}
- Blocked routes: [{blocked}]
- Gas pressure: {gas}/10
- Building stability: {stability}/10

RESOURCES:
- Ladder: {ladder} (owner: {ladder_owner})
- Ambulance 1: {ambulance_1}
- Ambulance 2: {ambulance_2}
- Evac route: {evac_route:?}

YOUR PERFORMANCE:
- Victims saved: {saved}
- Fire contained: {contained}
- People evacuated: {evacuated}

RECENT MESSAGES:",
        team = team.as_str(),
        location = status.location,
        priority = status.priority,
        used = status.transmissions_used(),
        remaining = state.time_remaining(),
        fires = fires.join(", "),
        victims = victims.join(", "),
        blocked = blocked.join(", "),
        gas = crisis.gas_pressure(),
        stability = crisis.building_stability(),
        ladder = or_none(allocation.location(Resource::Ladder)),
        ladder_owner = or_none(allocation.owner(Resource::Ladder)),
        ambulance_1 = or_none(allocation.location(Resource::Ambulance1)),
        ambulance_2 = or_none(allocation.location(Resource::Ambulance2)),
        evac_route = allocation.evac_route,
        saved = status.victims_saved,
        contained = status.fire_contained,
        evacuated = status.people_evacuated,
    );

    let start = recent.len().saturating_sub(PROMPT_MESSAGES);
    for message in &recent[start..] {
        let urgency = if message.is_urgent { "‼" } else { "" };
        prompt.push_str(&format!("\n- {}: {urgency}{}", message.team.as_str(), message.content));
    }
    prompt.push_str(&format!(
        "\n\nBased on this situation, send your next emergency message ({max_chars} characters or fewer):"
    ));
    prompt
}
