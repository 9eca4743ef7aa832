use anyhow::Context;
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

use crate::{
    command::{process_command, Command},
    context::ManagerContextRef,
};

const WELCOME: &str = "🚨 Emergency Response Coordination System 🚨 Three teams (Fire 🔥, Medical 🚑, Police 👮) \
                       must coordinate during a building explosion. Send `start` to begin, `status` or `stop` while running.";

pub async fn frontend_connection_process(ws: WebSocket, context_ref: ManagerContextRef) {
    let (frontend_ws_sender, mut frontend_ws_rcv) = ws.split();
    let (to_frontend_connection_process, front_end_connection_process_rcv) = mpsc::unbounded_channel();

    let front_end_connection_rcv_unbounded_receiver_stream = UnboundedReceiverStream::new(front_end_connection_process_rcv);
    tokio::task::spawn(front_end_connection_rcv_unbounded_receiver_stream.forward(frontend_ws_sender).map(|result| {
        if let Err(e) = result {
            warn!(error = %e, "error sending websocket msg");
        }
    }));

    let id = Uuid::new_v4().as_simple().to_string();
    let _ = to_frontend_connection_process.send(Ok(Message::text(WELCOME)));
    context_ref.write().await.to_frontend_senders.insert(id.clone(), to_frontend_connection_process);
    info!(%id, "frontend connected");

    while let Some(result) = frontend_ws_rcv.next().await {
        let msg = match result {
            Ok(msg) => msg,
            Err(e) => {
                warn!(%id, error = %e, "error receiving ws message");
                break;
            }
        };
        if msg.is_close() {
            break;
        }
        if msg.is_ping() || msg.is_pong() {
            continue;
        }
        let reply = match client_msg(msg, &context_ref).await {
            Ok(reply) => reply,
            Err(e) => format!("❌ {e}"),
        };
        context_ref.read().await.reply(&id, &reply);
    }

    context_ref.write().await.to_frontend_senders.remove(&id);
    info!(%id, "frontend disconnected");
}

async fn client_msg(msg: Message, context_ref: &ManagerContextRef) -> anyhow::Result<String> {
    let text = msg.to_str().ok().context("only text commands are accepted")?;
    let command = text.parse::<Command>()?;
    info!(?command, "frontend command");
    process_command(command, context_ref).await
}
