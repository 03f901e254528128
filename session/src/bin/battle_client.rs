use std::{path::PathBuf, time::Duration};

use clap::Parser;
use itertools::Itertools;
use tokio::io::{AsyncBufReadExt, BufReader};
use tools::{BoardSummary, Judge, ProposedAction, ToolClient};

use session::{
    commands::{parse_command, Command, HELP},
    ClientConfig, CliOverrides, ConnectionStatus, GameSession,
};

#[derive(Parser, Debug)]
struct Params {
    /// Server origin, e.g. http://localhost:8000
    #[arg(short, long)]
    origin: Option<String>,
    #[arg(short, long)]
    session_id: Option<String>,
    /// YAML file with client settings
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Params::parse();
    log::info!("args: {args:?}");

    let cli = CliOverrides {
        origin: args.origin,
        session_id: args.session_id,
    };
    let config = match ClientConfig::from_cli_or_env_or_yaml(cli, args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            log::error!("Could not load configuration: {err}");
            std::process::exit(1);
        }
    };
    let session = match GameSession::with_websocket(&config) {
        Ok(session) => session,
        Err(err) => {
            log::error!("Could not create session: {err}");
            std::process::exit(1);
        }
    };
    session.on_narrative(|line| println!("{line}"));
    let judge = match ToolClient::new(&config.tools_base_url) {
        Ok(client) => Judge::new(client),
        Err(err) => {
            log::error!("Could not create tool client: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = session.connect().await {
        log::error!("Initial connection failed: {err}");
    }
    if let Some(banner) = session.banner() {
        println!("{banner}");
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                log::error!("Error reading line from stdin: {err}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                log::error!("Error parsing command: {err}");
                continue;
            }
        };
        log::debug!("command: {command}");

        let sent = match command {
            Command::AiTurn => session.simulate_ai_turn(),
            Command::Draw => session.draw_card(),
            Command::Play(card_id) => session.play_pokemon(&card_id),
            Command::Attack(index) => session.attack(index),
            Command::Retreat(index) => session.retreat(index),
            Command::EndTurn => session.end_turn(),
            Command::State => {
                match session.game_state() {
                    Some(state) => println!("{state}"),
                    None => println!("No game state yet"),
                }
                session.request_game_state()
            }
            Command::Reset => session.reset_game(),
            Command::Advice(attacking, defending) => {
                session.request_type_advice(attacking, defending)
            }
            Command::Check(card_name) => {
                check_with_judge(&judge, &session, &card_name).await;
                continue;
            }
            Command::Connect => {
                if let Err(err) = session.connect().await {
                    log::error!("Connection failed: {err}");
                }
                continue;
            }
            Command::Disconnect => {
                session.disconnect();
                continue;
            }
            Command::Log => {
                println!("{}", session.game_log().iter().join("\n"));
                continue;
            }
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Quit => break,
        };
        if !sent {
            if let Some(banner) = session.banner() {
                println!("{banner}");
            }
        }
    }

    session.disconnect();
    // Let the close handshake finish before the runtime goes away.
    let closed = async {
        while session.status() != ConnectionStatus::Disconnected {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    };
    if tokio::time::timeout(Duration::from_secs(1), closed).await.is_err() {
        log::warn!("Connection did not close cleanly");
    }
    session.shutdown();
}

async fn check_with_judge(judge: &Judge, session: &GameSession, card_name: &str) {
    let Some(state) = session.game_state() else {
        println!("No game state yet");
        return;
    };
    let board = BoardSummary::from(&state);
    match judge
        .validate_move(&board, &ProposedAction::play_card(card_name))
        .await
    {
        Ok(verdict) => println!("⚖️ {card_name}: {verdict}"),
        Err(err) => log::error!("Judge unavailable: {err}"),
    }
}
