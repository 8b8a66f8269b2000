use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use codepet_client::{ClientError, StatusClient};

#[derive(Debug, Parser)]
#[command(name = "codepet")]
#[command(about = "Query and poke the codepet daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Print raw JSON instead of formatted text.
    #[arg(long, global = true)]
    json: bool,
    /// Socket path; defaults to $CODEPET_SOCKET, then the temp dir.
    #[arg(long, global = true)]
    socket: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Pet level, resources, and current activity.
    Status,
    /// Skill levels and spendable tokens.
    Skills,
    /// Unlocked achievements.
    Achievements,
    /// Spend tokens to raise a skill.
    Upgrade { skill: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let socket = cli
        .socket
        .clone()
        .unwrap_or_else(codepet_protocol::socket_path);
    let client = StatusClient::new(socket);

    let result = match &cli.command {
        Command::Status => client.query("status").await,
        Command::Skills => client.query("skills").await,
        Command::Achievements => client.query("achievements").await,
        Command::Upgrade { skill } => client.action("upgrade", json!({"skill": skill})).await,
    };

    match result {
        Ok(value) => render(&cli, &value),
        Err(error) => {
            let message = match &error {
                ClientError::NotRunning => "Game not running".to_owned(),
                other => other.to_string(),
            };
            if cli.json {
                println!("{}", json!({"error": message}));
            } else {
                eprintln!("codepet: {message}");
            }
            ExitCode::FAILURE
        }
    }
}

fn render(cli: &Cli, value: &Value) -> ExitCode {
    if cli.json {
        let pretty =
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        println!("{pretty}");
        return exit_for(&cli.command, value);
    }

    match &cli.command {
        Command::Status => {
            println!(
                "level {}  ({} / {} xp)",
                value["level"], value["experience"], value["xp_to_next"]
            );
            println!(
                "activity: {}  time of day: {}",
                value["activity"].as_str().unwrap_or("?"),
                value["time_of_day"].as_str().unwrap_or("?"),
            );
            println!(
                "tokens: {}  connections: {}",
                value["tokens"], value["connections"]
            );
            println!(
                "tools used: {}  agents spawned: {}",
                value["tools_used"], value["agents_spawned"]
            );
        }
        Command::Skills => {
            if let Some(skills) = value["skills"].as_object() {
                for (name, level) in skills {
                    println!("{name:>10}  level {level}");
                }
            }
            println!("tokens available: {}", value["tokens"]);
        }
        Command::Achievements => {
            match value["unlocked"].as_array() {
                Some(unlocked) if !unlocked.is_empty() => {
                    for entry in unlocked {
                        println!("* {}", entry["title"].as_str().unwrap_or("?"));
                    }
                }
                _ => println!("nothing unlocked yet"),
            }
            println!(
                "{} of {} unlocked",
                value["unlocked_count"], value["total"]
            );
        }
        Command::Upgrade { .. } => {
            println!("{}", value["message"].as_str().unwrap_or_default());
        }
    }
    exit_for(&cli.command, value)
}

/// A refused action is a failure exit; queries succeed once answered.
fn exit_for(command: &Command, value: &Value) -> ExitCode {
    match command {
        Command::Upgrade { .. } if value["success"] != true => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
