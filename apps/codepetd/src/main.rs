use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::info;

use codepet_bridge::{ActionHandler, EventBridge, EventSink, QueryHandler};
use codepet_engine::{GameEngine, GameState};
use codepet_protocol::ClaudeEvent;

#[derive(Debug, Parser)]
#[command(name = "codepetd")]
#[command(about = "codepet daemon")]
struct Cli {
    /// Socket path; defaults to $CODEPET_SOCKET, then the temp dir.
    #[arg(long)]
    socket: Option<PathBuf>,
    /// Simulation ticks per second.
    #[arg(long, default_value_t = 8.0)]
    tick_hz: f64,
}

/// Bridges the bridge's handler ports onto one shared engine.
struct EngineAdapter(Arc<GameEngine>);

#[async_trait]
impl EventSink for EngineAdapter {
    async fn on_event(&self, event: ClaudeEvent) -> Result<()> {
        self.0.dispatch_claude_event(&event);
        Ok(())
    }
}

impl QueryHandler for EngineAdapter {
    fn handle_query(&self, query: &str) -> Value {
        self.0.handle_query(query)
    }
}

impl ActionHandler for EngineAdapter {
    fn handle_action(&self, action: &str, data: &Value) -> Value {
        self.0.handle_action(action, data)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let cli = Cli::parse();
    let socket = cli.socket.unwrap_or_else(codepet_protocol::socket_path);

    let engine = Arc::new(GameEngine::new(GameState::new()));
    let adapter = Arc::new(EngineAdapter(engine.clone()));

    let handle = EventBridge::builder(&socket)
        .event_sink(adapter.clone())
        .query_handler(adapter.clone())
        .action_handler(adapter)
        .build()
        .serve()?;

    // Renderer boundary: the pane renderer consumes this feed. Until it
    // attaches, the daemon logs each applied event.
    let mut feed = engine.subscribe();
    let feed_task = tokio::spawn(async move {
        loop {
            match feed.recv().await {
                Ok(event) => {
                    let rendered =
                        serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_owned());
                    info!(event = %rendered, "event.applied");
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let tick_engine = engine.clone();
    let tick_period = Duration::from_secs_f64(1.0 / cli.tick_hz.max(0.5));
    let tick_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(tick_period);
        let mut last = Instant::now();
        loop {
            ticker.tick().await;
            let now = Instant::now();
            tick_engine.update(now.duration_since(last).as_secs_f64());
            last = now;
        }
    });

    info!(socket = %handle.socket_path().display(), "codepet daemon ready");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    handle.shutdown().await;
    tick_task.abort();
    feed_task.abort();
    Ok(())
}
