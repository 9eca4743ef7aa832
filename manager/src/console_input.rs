use std::io::stdin;
use std::thread;

use tracing::warn;

use crate::command::{process_command, Command};
use crate::context::ManagerContextRef;

pub fn console_input_thread(context_ref: ManagerContextRef, runtime: tokio::runtime::Handle) {
    thread::spawn(move || {
        let _guard = runtime.enter();
        pollster::block_on(console_input_loop(context_ref))
    });
}

pub async fn console_input_loop(context_ref: ManagerContextRef) {
    loop {
        let mut input = String::new();
        match stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "could not read console input");
                break;
            }
        }
        if input.trim().is_empty() {
            continue;
        }
        match process_console_input(&input, &context_ref).await {
            Ok(reply) => println!("{reply}"),
            Err(e) => println!("error: {e}"),
        }
    }
}

pub async fn process_console_input(input: &str, context_ref: &ManagerContextRef) -> anyhow::Result<String> {
    let command = input.parse::<Command>()?;
    process_command(command, context_ref).await
}
