use std::{any::Any, fmt, panic::AssertUnwindSafe};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use rand::{rngs::StdRng, SeedableRng};
use tokio::{
    sync::{mpsc, oneshot},
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{
    allocation::EvacRoute,
    classifier,
    config::GameConfig,
    error::PolicyError,
    game_state::GameState,
    message::{CoordinationEvent, CoordinationKind, Message, MessageKind},
    notice::{NotificationSink, Notice, StatusReport},
    policy::Policy,
    rescue,
    score::{self, GameResult},
    team::Team,
    updater::CrisisUpdater,
};

const COORDINATION_TIME_SAVED: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    TimeLimit,
    ProblemSolved,
    Stopped,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::TimeLimit => f.write_str("time limit"),
            EndReason::ProblemSolved => f.write_str("problem solved"),
            EndReason::Stopped => f.write_str("stopped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Ended(EndReason),
}

/// Requests accepted by a running game between ticks.
#[derive(Debug)]
pub enum Control {
    Stop,
    Status(oneshot::Sender<StatusReport>),
}

/// Terminal state of a game together with its score.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GameReport {
    pub state: GameState,
    pub result: GameResult,
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        reason.to_string()
    } else if let Some(reason) = payload.downcast_ref::<String>() {
        reason.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Owns the game state and runs the tick pipeline:
/// crisis timeline, lease countdown, team turns, rescues, notices.
pub struct TurnOrchestrator<P, N> {
    config: GameConfig,
    state: GameState,
    updater: CrisisUpdater,
    policy: P,
    sink: N,
    rng: StdRng,
    phase: Phase,
    next_status_at: u64,
    critical_alerted: bool,
}

impl<P: Policy, N: NotificationSink> TurnOrchestrator<P, N> {
    pub fn new(config: GameConfig, policy: P, sink: N) -> Self {
        let state = GameState::new(&config, Utc::now());
        Self::with_state(config, state, policy, sink)
    }

    pub fn with_state(config: GameConfig, state: GameState, policy: P, sink: N) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        TurnOrchestrator {
            updater: CrisisUpdater::new(&config),
            next_status_at: config.status_interval_secs,
            config,
            state,
            policy,
            sink,
            rng,
            phase: Phase::Running,
            critical_alerted: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn status(&self) -> StatusReport {
        StatusReport::from_state(&self.state)
    }

    /// Ends a running game; the loop notices before its next tick.
    pub fn stop(&mut self) {
        if self.phase == Phase::Running {
            self.end(EndReason::Stopped);
        }
    }

    fn end(&mut self, reason: EndReason) {
        info!(game_id = %self.state.game_id, %reason, elapsed = self.state.crisis.time_elapsed, "game ended");
        self.phase = Phase::Ended(reason);
    }

    /// Runs one tick as of `now` and returns the phase afterwards.
    pub async fn step(&mut self, now: DateTime<Utc>) -> Phase {
        if self.phase != Phase::Running {
            return self.phase;
        }

        let elapsed = self.state.elapsed_at(now);
        if elapsed >= self.state.duration_secs {
            self.state.crisis.time_elapsed = elapsed;
            self.end(EndReason::TimeLimit);
            return self.phase;
        }
        if self.state.crisis.is_resolved() {
            self.state.crisis.time_elapsed = elapsed;
            self.end(EndReason::ProblemSolved);
            return self.phase;
        }

        if let Some(fired) = self.updater.tick(&mut self.state.crisis, elapsed, &mut self.rng) {
            self.sink.notify(Notice::CrisisFlash {
                kind: fired.kind,
                location: fired.location,
                elapsed,
                gas_pressure: self.state.crisis.gas_pressure(),
                building_stability: self.state.crisis.building_stability(),
            });
        }

        for resource in self.state.allocation.tick(self.config.countdown_step_secs) {
            debug!(%resource, "resource available again");
        }

        for team in Team::ALL {
            if let Err(e) = self.take_turn(team, now).await {
                warn!(%team, error = %e, "no transmission this tick");
            }
        }

        for outcome in rescue::evaluate(&mut self.state, now) {
            self.sink.notify(Notice::RescueCompleted {
                location: outcome.location,
                rescued: outcome.rescued,
                teams: outcome.teams,
            });
        }

        self.report(elapsed);

        if self.state.crisis.is_resolved() {
            self.end(EndReason::ProblemSolved);
        }
        self.phase
    }

    async fn take_turn(&mut self, team: Team, now: DateTime<Utc>) -> Result<(), PolicyError> {
        let cooldown = self.config.transmission_cooldown();
        if !self.state.team(team).may_transmit(self.config.max_transmissions, cooldown, now) {
            debug!(%team, "transmission gate closed");
            return Ok(());
        }

        let timeout = self.config.policy_timeout();
        let recent = self.state.recent_messages(self.config.recent_message_window);
        let policy = &mut self.policy;
        let state = &self.state;
        let call = AssertUnwindSafe(async move { policy.decide(team, state, recent).await }).catch_unwind();
        let content = match tokio::time::timeout(timeout, call).await {
            Err(_) => return Err(PolicyError::Timeout { team, timeout }),
            Ok(Err(payload)) => {
                return Err(PolicyError::Failed { team, reason: format!("policy panicked: {}", panic_reason(payload.as_ref())) })
            }
            Ok(Ok(Err(e))) => return Err(PolicyError::Failed { team, reason: format!("{e:#}") }),
            Ok(Ok(Ok(None))) => return Ok(()),
            Ok(Ok(Ok(Some(content)))) => content,
        };

        let message = match Message::new(team, &content, now, self.config.max_message_chars) {
            Ok(message) => message,
            Err(e) => {
                warn!(%team, %content, error = %e, "message rejected");
                return Ok(());
            }
        };

        info!(%team, content = %message.content, kind = ?message.kind, urgent = message.is_urgent, "transmission");
        self.state.messages.push(message.clone());
        self.state.team_mut(team).record_transmission(now);
        self.state.vocabulary_mut(team).record(&message.content);
        self.sink.notify(Notice::MessageRelayed {
            team,
            content: message.content.clone(),
            urgent: message.is_urgent,
        });

        match message.kind {
            MessageKind::ResourceRequest => self.handle_request(&message, now),
            MessageKind::Coordination => self.handle_coordination(&message, now),
            MessageKind::StatusUpdate | MessageKind::UrgentAlert => {}
        }
        Ok(())
    }

    fn handle_request(&mut self, message: &Message, now: DateTime<Utc>) {
        let team = message.team;
        let (Some(resource), Some(location)) = (classifier::resource(&message.content), message.location) else {
            debug!(%team, content = %message.content, "request names no resource and location");
            return;
        };

        if self.state.allocation.request(team, resource, location, self.config.lease_duration_secs) {
            info!(%team, %resource, %location, "resource granted");
            let mut event = CoordinationEvent::success(CoordinationKind::ResourceSharing, vec![team], now);
            event.resource = Some(resource);
            event.location = Some(location);
            self.state.coordination_events.push(event);
            self.sink.notify(Notice::ResourceGranted { team, resource, location });
        } else {
            info!(%team, %resource, "resource conflict");
            self.sink.notify(Notice::ResourceDenied { team, resource });
        }
    }

    fn handle_coordination(&mut self, message: &Message, now: DateTime<Utc>) {
        let mut teams = vec![message.team];
        teams.extend(Team::ALL.into_iter().filter(|team| *team != message.team));
        let mut event = CoordinationEvent::success(CoordinationKind::CoordinationSuccess, teams, now);
        event.lives_saved = 1;
        event.time_saved = COORDINATION_TIME_SAVED;
        self.state.coordination_events.push(event);

        let allocation = &mut self.state.allocation;
        match classifier::evac_route(&message.content) {
            Some(EvacRoute::Clear) if message.team == Team::Police => {
                allocation.evac_route = EvacRoute::Clear;
                allocation.evac_route_controller = Some(Team::Police);
                info!("evacuation route cleared");
            }
            Some(EvacRoute::Blocked) => {
                allocation.evac_route = EvacRoute::Blocked;
                allocation.evac_route_controller = None;
                info!(team = %message.team, "evacuation route reported blocked");
            }
            _ => {}
        }
    }

    fn report(&mut self, elapsed: u64) {
        if self.state.crisis.is_critical() && !self.critical_alerted {
            self.critical_alerted = true;
            warn!(
                gas_pressure = self.state.crisis.gas_pressure(),
                building_stability = self.state.crisis.building_stability(),
                "critical threshold reached"
            );
            self.sink.notify(Notice::CriticalAlert {
                gas_pressure: self.state.crisis.gas_pressure(),
                building_stability: self.state.crisis.building_stability(),
            });
        }

        if self.config.status_interval_secs > 0 && elapsed >= self.next_status_at {
            self.next_status_at += self.config.status_interval_secs;
            self.sink.notify(Notice::Status(self.status()));
        }
    }

    /// Scores the game. Consuming `self` makes this happen exactly once.
    pub fn finish(mut self) -> GameReport {
        let reason = match self.phase {
            Phase::Ended(reason) => reason,
            Phase::Running => {
                self.end(EndReason::Stopped);
                EndReason::Stopped
            }
        };
        let result = score::result(&self.state, reason);
        info!(game_id = %result.game_id, score = result.final_score, lives_saved = result.lives_saved, "game scored");
        self.sink.notify(Notice::GameEnded(Box::new(result.clone())));
        GameReport { state: self.state, result }
    }

    /// Ticks at the configured interval until the game ends, answering
    /// control requests in between, then scores it.
    pub async fn run(mut self, mut control: mpsc::Receiver<Control>) -> GameReport {
        info!(game_id = %self.state.game_id, duration = self.state.duration_secs, "game started");
        self.sink.notify(Notice::GameStarted {
            game_id: self.state.game_id,
            duration_secs: self.state.duration_secs,
        });

        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut control_open = true;

        while self.phase == Phase::Running {
            tokio::select! {
                _ = interval.tick() => {
                    self.step(Utc::now()).await;
                }
                request = control.recv(), if control_open => match request {
                    Some(Control::Stop) => self.stop(),
                    Some(Control::Status(reply)) => {
                        let _ = reply.send(self.status());
                    }
                    None => control_open = false,
                },
            }
        }

        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ScriptedPolicy;

    fn game() -> (TurnOrchestrator<ScriptedPolicy, mpsc::UnboundedSender<Notice>>, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = GameConfig { rng_seed: Some(3), ..GameConfig::default() };
        (TurnOrchestrator::new(config, ScriptedPolicy::new(), tx), rx)
    }

    #[test]
    fn end_reason_labels() {
        assert_eq!(EndReason::TimeLimit.to_string(), "time limit");
        assert_eq!(EndReason::ProblemSolved.to_string(), "problem solved");
        assert_eq!(serde_json::to_string(&EndReason::Stopped).unwrap(), "\"stopped\"");
    }

    #[tokio::test]
    async fn stopped_game_ignores_ticks() {
        let (mut game, _rx) = game();
        game.stop();
        game.stop();
        assert_eq!(game.phase(), Phase::Ended(EndReason::Stopped));
        assert_eq!(game.step(Utc::now()).await, Phase::Ended(EndReason::Stopped));
        assert_eq!(game.policy().invocations(Team::Fire), 0);
    }

    #[test]
    fn finishing_a_running_game_counts_as_stopped() {
        let (game, mut rx) = game();
        let report = game.finish();
        assert_eq!(report.result.end_reason, EndReason::Stopped);
        assert!(matches!(rx.try_recv(), Ok(Notice::GameEnded(_))));
        assert!(rx.try_recv().is_err());
    }
}
