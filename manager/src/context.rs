use std::{collections::HashMap, sync::Arc};

use crisis::{Control, GameConfig, GameReport, GameResult, Notice, TurnOrchestrator};
use tokio::{
    sync::{mpsc, RwLock},
    task::JoinHandle,
};
use tracing::{error, info};
use uuid::Uuid;
use warp::filters::ws::Message;

use crate::{command::CommandError, export, llm::{Credentials, LlmPolicy}};

pub struct ManagerContext {
    pub to_frontend_senders: HashMap<String, mpsc::UnboundedSender<std::result::Result<Message, warp::Error>>>,
    pub config: GameConfig,
    pub credentials: Credentials,
    pub notices: mpsc::UnboundedSender<Notice>,
    pub game: Option<mpsc::Sender<Control>>,
    pub last_result: Option<GameResult>,
}

pub type ManagerContextRef = Arc<RwLock<ManagerContext>>;

impl ManagerContext {
    pub fn new(config: GameConfig, credentials: Credentials, notices: mpsc::UnboundedSender<Notice>) -> ManagerContext {
        ManagerContext {
            to_frontend_senders: HashMap::new(),
            config,
            credentials,
            notices,
            game: None,
            last_result: None,
        }
    }

    /// Relays text to every connected frontend.
    pub fn broadcast(&self, text: &str) {
        for (id, to_frontend_sender) in self.to_frontend_senders.iter() {
            if to_frontend_sender.send(Ok(Message::text(text))).is_err() {
                info!(%id, "frontend gone, dropping broadcast");
            }
        }
    }

    pub fn reply(&self, id: &str, text: &str) {
        if let Some(sender) = self.to_frontend_senders.get(id) {
            let _ = sender.send(Ok(Message::text(text)));
        }
    }
}

/// Spawns a new game task. When the game ends its report is exported and the
/// manager is ready for the next start.
pub async fn start_game(context_ref: &ManagerContextRef) -> anyhow::Result<Uuid> {
    let mut context = context_ref.write().await;
    if context.game.is_some() {
        return Err(CommandError::GameRunning.into());
    }

    let policy = LlmPolicy::new(&context.credentials, &context.config)?;
    let game = TurnOrchestrator::new(context.config.clone(), policy, context.notices.clone());
    let game_id = game.state().game_id;
    let (control_tx, control_rx) = mpsc::channel(8);
    context.game = Some(control_tx);
    let export_dir = context.config.export_dir.clone();

    let game = tokio::spawn(game.run(control_rx));
    tokio::spawn(settle(context_ref.clone(), game, game_id, export_dir));

    info!(%game_id, "game spawned");
    Ok(game_id)
}

/// Waits for a game task, exports its report and frees the manager for the
/// next start, whether the task finished or died.
async fn settle(context_ref: ManagerContextRef, game: JoinHandle<GameReport>, game_id: Uuid, export_dir: String) {
    let report = match game.await {
        Ok(report) => report,
        Err(e) => {
            error!(%game_id, error = %e, "game task failed");
            context_ref.write().await.game = None;
            return;
        }
    };
    match export::save(&export_dir, &report) {
        Ok(path) => info!(path = %path.display(), "game exported"),
        Err(e) => error!(error = %format!("{e:#}"), "could not export game"),
    }
    let mut context = context_ref.write().await;
    context.game = None;
    context.last_result = Some(report.result);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_game_task_frees_the_manager() {
        let (notice_tx, _notice_rx) = mpsc::unbounded_channel();
        let context = ManagerContext::new(GameConfig::default(), Credentials::new("test-key"), notice_tx);
        let context_ref = Arc::new(RwLock::new(context));
        let (control_tx, _control_rx) = mpsc::channel(1);
        context_ref.write().await.game = Some(control_tx);

        let game: JoinHandle<GameReport> = tokio::spawn(async { panic!("game loop crashed") });
        settle(context_ref.clone(), game, Uuid::new_v4(), ".".to_string()).await;

        let context = context_ref.read().await;
        assert!(context.game.is_none());
        assert!(context.last_result.is_none());
    }
}
