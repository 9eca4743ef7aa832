use std::str::FromStr;

use anyhow::Context;
use crisis::{Control, Notice};
use tokio::sync::oneshot;

use crate::context::{self, ManagerContextRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Status,
    Stop,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unrecognized command `{0}`, try start, status or stop")]
    Unrecognized(String),
    #[error("an emergency response game is already in progress")]
    GameRunning,
    #[error("no active game")]
    NoGame,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Command, CommandError> {
        let word = input.trim();
        let word = word
            .strip_prefix('<')
            .and_then(|word| word.strip_suffix('>'))
            .unwrap_or(word);
        match word.to_ascii_lowercase().as_str() {
            "start" | "start_game" => Ok(Command::Start),
            "status" => Ok(Command::Status),
            "stop" | "stop_game" => Ok(Command::Stop),
            _ => Err(CommandError::Unrecognized(input.trim().to_string())),
        }
    }
}

/// Runs a command from any frontend and returns the reply for its sender.
pub async fn process_command(command: Command, context_ref: &ManagerContextRef) -> anyhow::Result<String> {
    match command {
        Command::Start => {
            let game_id = context::start_game(context_ref).await?;
            Ok(format!("🚨 Emergency response game {game_id} started"))
        }
        Command::Status => {
            let game = context_ref.read().await.game.clone();
            let Some(game) = game else {
                let context = context_ref.read().await;
                return match &context.last_result {
                    Some(result) => Ok(format!("No active game. Last result:\n{}", Notice::GameEnded(Box::new(result.clone())))),
                    None => Err(CommandError::NoGame.into()),
                };
            };
            let (reply_tx, reply_rx) = oneshot::channel();
            game.send(Control::Status(reply_tx)).await.map_err(|_| CommandError::NoGame)?;
            let report = reply_rx.await.context("game ended before answering")?;
            Ok(Notice::Status(report).to_string())
        }
        Command::Stop => {
            let game = context_ref.read().await.game.clone().ok_or(CommandError::NoGame)?;
            game.send(Control::Stop).await.map_err(|_| CommandError::NoGame)?;
            Ok("🛑 Stopping emergency response game".to_string())
        }
    }
}
