// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Operator console: drives the control plane over stdin/stdout
use anyhow::Context;
use clap::Parser;
use futures::SinkExt;
use futures_util::StreamExt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info, warn};

use opsgate::bridge::ExtensionBridge;
use opsgate::config::{Config, YamlConfig};
use opsgate::engine::dispatcher::{Collaborators, OperDispatcher};
use opsgate::engine_core::constants::limits;
use opsgate::engine_core::events::ControlEvent;
use opsgate::engine_core::models::{ConnectionId, Principal};
use opsgate::engine_core::traits::{ConfigSource, ConnectionControl};
use opsgate::lifecycle::process::{Invocation, SystemProcess};
use opsgate::protocol::codec::LineCodec;
use opsgate::runtime::connections::{ConnectionHub, Outbound};
use opsgate::runtime::extensions::ExtensionManager;
use opsgate::runtime::registry::InMemoryRegistry;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the YAML configuration holding `admin.olines`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server name used as the prefix of replies
    #[arg(long)]
    server_name: Option<String>,

    /// Nickname of the console session
    #[arg(long, default_value = "console")]
    nick: String,

    /// Extensions the manager may load (repeatable)
    #[arg(long = "extension")]
    extensions: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    install_panic_hook();

    let mut config = Config::from_env().unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config from env, using defaults: {}",
            e
        );
        Config::default()
    });
    if let Some(p) = &cli.config {
        config.config_path = Some(p.clone());
    }
    if let Some(name) = &cli.server_name {
        config.server_name = name.clone();
    }

    if let Err(e) = init_tracing(&config) {
        eprintln!("Failed to init tracing: {}", e);
    }

    let yaml: Arc<dyn ConfigSource> = match &config.config_path {
        Some(path) => Arc::new(YamlConfig::load(path).context("loading configuration")?),
        None => {
            warn!("No configuration file given; no O-lines are configured");
            Arc::new(YamlConfig::empty())
        }
    };

    let registry = Arc::new(InMemoryRegistry::new());
    let hub = Arc::new(ConnectionHub::new());
    let (bridge, bridge_rx) = ExtensionBridge::channel(limits::BRIDGE_CHANNEL_CAPACITY);
    let _manager = ExtensionManager::new(cli.extensions.clone()).spawn(bridge_rx);
    let (events, _) = broadcast::channel::<ControlEvent>(16);

    let dispatcher = OperDispatcher::new(
        &config,
        Collaborators {
            registry: registry.clone(),
            extensions: Arc::new(bridge),
            connections: hub.clone(),
            config: yaml,
            events: Arc::new(events.clone()),
            process: Arc::new(SystemProcess),
        },
        Invocation::current()?,
    )
    .await
    .context("initializing dispatcher")?;

    spawn_event_listener(events.subscribe(), registry.clone());

    let console = Principal::new(
        ConnectionId::generate(),
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        cli.nick.clone(),
        std::env::var("USER").unwrap_or_else(|_| "console".to_string()),
        "localhost",
    );
    let connection = console.connection;
    info!("Console session {} as {}", connection, console.prefix());
    registry.register(console).await;

    let mut writer = tokio::spawn(write_outbound(hub.attach(connection).await));
    let mut writer_done = false;
    let mut lines = FramedRead::new(tokio::io::stdin(), LineCodec::new());

    // One operator at the console, so lines are handled one at a time
    loop {
        tokio::select! {
            line = lines.next() => {
                match line {
                    Some(Ok(line)) => match dispatcher.handle_line(connection, &line).await {
                        Ok(Some(handle)) => {
                            if let Err(e) = handle.await {
                                error!("Handler task failed: {}", e);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => warn!("Rejected line: {}", e),
                    },
                    Some(Err(e)) => {
                        warn!("Framing error: {}", e);
                    }
                    None => {
                        info!("Console input closed. Shutting down.");
                        break;
                    }
                }
            }
            _ = &mut writer => {
                info!("Console transport closed.");
                writer_done = true;
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down.");
                break;
            }
        }
    }

    if !writer_done {
        hub.close(connection).await?;
        if let Err(e) = writer.await {
            error!("Console writer failed: {}", e);
        }
    }

    Ok(())
}

/// Drain frames for the console to stdout until the hub closes it.
async fn write_outbound(mut rx: tokio::sync::mpsc::Receiver<Outbound>) {
    let mut out = FramedWrite::new(tokio::io::stdout(), LineCodec::new());
    while let Some(item) = rx.recv().await {
        match item {
            Outbound::Frame(message) => {
                if let Err(e) = out.send(&message).await {
                    error!("Failed to write reply: {}", e);
                }
            }
            Outbound::Close => break,
        }
    }
}

/// Quit events remove the departing session from the registry.
fn spawn_event_listener(
    mut rx: broadcast::Receiver<ControlEvent>,
    registry: Arc<InMemoryRegistry>,
) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ControlEvent::Quit {
                    connection, source, reason, ..
                }) => {
                    info!("{} quit: {}", source, reason);
                    registry.remove(connection).await;
                }
                Ok(ControlEvent::Rehashed) => info!("Configuration rehashed"),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!("Event listener lagged by {} events", n)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("PANIC: {} at {}", message, location);
    }));
}

fn init_tracing(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("opsgate=debug,info"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    if config.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
