use std::{
    collections::{BTreeMap, VecDeque},
    future::Future,
};

use anyhow::anyhow;

use crate::{game_state::GameState, message::Message, team::Team};

/// Decides what, if anything, a team transmits this tick.
///
/// The orchestrator only calls `decide` for a team whose transmission gate is
/// open, and bounds every call with a timeout. Returning `Ok(None)` means the
/// team stays silent; the returned text is validated and classified by the
/// engine.
pub trait Policy: Send {
    fn decide<'a>(
        &'a mut self,
        team: Team,
        state: &'a GameState,
        recent: &'a [Message],
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send + 'a;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedLine {
    Say(String),
    Silent,
    Fail(String),
    /// Never answers.
    Stall,
}

/// Replays a fixed list of lines per team, one per call. Teams with an
/// exhausted script stay silent.
#[derive(Debug, Default)]
pub struct ScriptedPolicy {
    lines: BTreeMap<Team, VecDeque<ScriptedLine>>,
    invocations: BTreeMap<Team, u32>,
}

impl ScriptedPolicy {
    pub fn new() -> ScriptedPolicy {
        ScriptedPolicy::default()
    }

    pub fn push(&mut self, team: Team, line: ScriptedLine) -> &mut Self {
        self.lines.entry(team).or_default().push_back(line);
        self
    }

    /// Queues plain messages; an empty string queues a silent turn.
    pub fn say(&mut self, team: Team, lines: &[&str]) -> &mut Self {
        for line in lines {
            let line = if line.is_empty() { ScriptedLine::Silent } else { ScriptedLine::Say(line.to_string()) };
            self.push(team, line);
        }
        self
    }

    pub fn invocations(&self, team: Team) -> u32 {
        self.invocations.get(&team).copied().unwrap_or(0)
    }
}

impl Policy for ScriptedPolicy {
    fn decide<'a>(
        &'a mut self,
        team: Team,
        _state: &'a GameState,
        _recent: &'a [Message],
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send + 'a {
        *self.invocations.entry(team).or_insert(0) += 1;
        let line = self.lines.get_mut(&team).and_then(VecDeque::pop_front);
        async move {
            match line {
                None | Some(ScriptedLine::Silent) => Ok(None),
                Some(ScriptedLine::Say(text)) => Ok(Some(text)),
                Some(ScriptedLine::Fail(reason)) => Err(anyhow!(reason)),
                Some(ScriptedLine::Stall) => {
                    std::future::pending::<()>().await;
                    Ok(None)
                }
            }
        }
    }
}
