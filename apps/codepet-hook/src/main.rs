use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::{Value, json};

use codepet_client::{HookKind, build_event, ensure_tool_use_id, send_event};

#[derive(Debug, Parser)]
#[command(name = "codepet-hook")]
#[command(about = "Forward one CLI hook firing to the codepet daemon")]
struct Cli {
    /// Hook callback name, e.g. PreToolUse or SessionStart.
    hook_type: String,
    /// Hook payload JSON; read from stdin when omitted.
    #[arg(long, short = 'i')]
    input: Option<String>,
    /// Socket path; defaults to $CODEPET_SOCKET, then the temp dir.
    #[arg(long)]
    socket: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // The one caller bug worth failing on: a hook type we do not know.
    let kind: HookKind = match cli.hook_type.parse() {
        Ok(kind) => kind,
        Err(error) => {
            eprintln!("codepet-hook: {error}");
            return ExitCode::FAILURE;
        }
    };

    let raw = match cli.input {
        Some(input) => input,
        None => {
            let mut buffer = String::new();
            let _ = std::io::stdin().read_to_string(&mut buffer);
            buffer
        }
    };
    // A malformed payload must not fail the host CLI; treat it as empty.
    let mut payload: Value = serde_json::from_str(&raw).unwrap_or_else(|_| json!({}));
    ensure_tool_use_id(kind, &mut payload);

    let timestamp = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
    let event = build_event(kind, &payload, timestamp);
    let socket = cli.socket.unwrap_or_else(codepet_protocol::socket_path);

    // Delivered, not running, or failed: all the same to the host CLI.
    let _ = send_event(&socket, &event).await;
    ExitCode::SUCCESS
}
