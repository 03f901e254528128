//! End-to-end session behavior over the in-memory transport with a paused clock.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use serde_json::{json, Value};
use session::{
    events, ClientConfig, ConnectionStatus, GameSession, MemoryTransport, SessionError,
};
use tokio::time::Instant;
use types::{Attack, Card, Damage, ElementType, GameState};

fn config() -> ClientConfig {
    ClientConfig {
        origin: "http://localhost:8000".to_string(),
        session_id: "test-session".to_string(),
        ..ClientConfig::default()
    }
}

fn session_with(transport: &MemoryTransport) -> GameSession {
    GameSession::new(&config(), Arc::new(transport.clone())).expect("valid config")
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn snapshot(turn_number: u32) -> Value {
    let mut state = GameState::new("Ash", "AI Trainer");
    state.turn_number = turn_number;
    state.child_player.active = Some(Card::new("c1", "Charmander", 50, &[ElementType::Fire]));
    serde_json::to_value(state).unwrap()
}

fn count_events(session: &GameSession, channel: &str) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    session.subscribe(channel, move |event| {
        if !event.is_message() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    });
    count
}

fn whole_seconds(gap: Duration) -> u64 {
    gap.as_secs_f64().round() as u64
}

#[tokio::test(start_paused = true)]
async fn test_connect_is_idempotent() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    let connected = count_events(&session, events::CONNECTED);

    session.connect().await.unwrap();
    session.connect().await.unwrap();

    assert_eq!(transport.attempts(), 1);
    assert_eq!(connected.load(Ordering::SeqCst), 1);
    assert_eq!(session.status(), ConnectionStatus::Connected);
    assert!(session.banner().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_connect_while_pending_opens_one_socket() {
    let transport = MemoryTransport::new();
    transport.hang_next();
    let session = Arc::new(session_with(&transport));

    let pending = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.connect().await }
    });
    settle().await;
    assert_eq!(session.status(), ConnectionStatus::Connecting);

    session.connect().await.unwrap();
    assert_eq!(transport.attempts(), 1);
    assert_eq!(session.status(), ConnectionStatus::Connecting);

    session.disconnect();
    let result = pending.await.unwrap();
    assert!(matches!(result, Err(SessionError::Cancelled)));
    assert_eq!(session.status(), ConnectionStatus::Disconnected);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_connect_right_after_disconnect_opens_new_link() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.connect().await.unwrap();

    session.disconnect();
    session.connect().await.unwrap();
    assert_eq!(transport.attempts(), 2);
    assert_eq!(session.status(), ConnectionStatus::Connected);

    settle().await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.client_closes(), vec![1000]);
    assert_eq!(session.status(), ConnectionStatus::Connected);
    assert!(session.request_game_state());
    settle().await;
    assert_eq!(transport.sent_json()[0]["type"], "get_game_state");
}

#[tokio::test(start_paused = true)]
async fn test_unclean_close_reconnects_with_linear_backoff() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.connect().await.unwrap();

    for _ in 0..5 {
        transport.refuse_next("connection refused");
    }
    let closed_at = Instant::now();
    assert!(transport.close_from_server(1011, "server restart"));
    settle().await;
    assert_eq!(session.status(), ConnectionStatus::Disconnected);

    tokio::time::sleep(Duration::from_secs(120)).await;

    let times = transport.attempt_times();
    assert_eq!(times.len(), 6, "one manual attempt plus five retries");
    let mut previous = closed_at;
    let gaps: Vec<u64> = times[1..]
        .iter()
        .map(|at| {
            let gap = whole_seconds(*at - previous);
            previous = *at;
            gap
        })
        .collect();
    assert_eq!(gaps, vec![2, 4, 6, 8, 10]);
    assert_eq!(session.status(), ConnectionStatus::Disconnected);
    assert!(session.banner().is_some());

    // A manual connect starts a fresh budget.
    session.connect().await.unwrap();
    assert_eq!(transport.attempts(), 7);
    transport.refuse_next("connection refused");
    let closed_at = Instant::now();
    transport.drop_connection();
    settle().await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    let times = transport.attempt_times();
    assert_eq!(times.len(), 8);
    assert_eq!(whole_seconds(times[7] - closed_at), 2);
}

#[tokio::test(start_paused = true)]
async fn test_successful_reconnect_restores_connection() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    let connected = count_events(&session, events::CONNECTED);
    session.connect().await.unwrap();

    transport.drop_connection();
    settle().await;
    assert_eq!(session.status(), ConnectionStatus::Disconnected);

    tokio::time::sleep(Duration::from_secs(3)).await;
    settle().await;
    assert_eq!(session.status(), ConnectionStatus::Connected);
    assert_eq!(connected.load(Ordering::SeqCst), 2);
    assert!(session.request_game_state());
}

#[tokio::test(start_paused = true)]
async fn test_normal_close_does_not_reconnect() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.connect().await.unwrap();

    transport.close_from_server(1000, "game over");
    settle().await;
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(transport.attempts(), 1);
    assert_eq!(session.status(), ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_closes_normally_without_reconnect() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    let disconnected = count_events(&session, events::DISCONNECTED);
    session.connect().await.unwrap();

    session.disconnect();
    settle().await;

    assert_eq!(transport.client_closes(), vec![1000]);
    assert_eq!(session.status(), ConnectionStatus::Disconnected);
    assert_eq!(disconnected.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.attempts(), 1);
    assert_eq!(disconnected.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_pending_reconnect() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.connect().await.unwrap();

    transport.drop_connection();
    settle().await;
    session.disconnect();
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sending_while_disconnected_is_a_no_op() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);

    assert!(!session.simulate_ai_turn());
    assert!(!session.draw_card());
    assert!(!session.attack(0));
    assert!(!session.reset_game());
    assert!(!session.request_type_advice(ElementType::Fire, ElementType::Grass));

    assert!(transport.sent().is_empty());
    assert!(session.game_log().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_fails_without_retry() {
    let transport = MemoryTransport::new();
    transport.hang_next();
    let session = session_with(&transport);
    let errors = count_events(&session, events::ERROR);

    let started = Instant::now();
    let result = session.connect().await;
    assert!(matches!(result, Err(SessionError::ConnectTimeout(_))));
    assert_eq!(whole_seconds(Instant::now() - started), 10);
    assert_eq!(session.status(), ConnectionStatus::Disconnected);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert!(session.last_error().unwrap().contains("timed out"));

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refused_connect_surfaces_error() {
    let transport = MemoryTransport::new();
    transport.refuse_next("connection refused");
    let session = session_with(&transport);

    assert!(matches!(
        session.connect().await,
        Err(SessionError::Connect(_))
    ));
    let banner = session.banner().unwrap();
    assert!(banner.contains("Is the backend running?"));
    assert!(banner.contains("connection refused"));

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frames_are_dropped() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.connect().await.unwrap();
    let log_before = session.game_log();

    transport.push_text("{not json");
    transport.push_json(&json!({"no_type": true}));
    transport.push_json(&json!({"type": "game_state_update", "game_state": "bogus"}));
    transport.push_json(&json!({"type": "game_state_update", "game_state": snapshot(2)}));
    settle().await;

    assert_eq!(session.status(), ConnectionStatus::Connected);
    assert_eq!(session.game_state().unwrap().turn_number, 2);
    assert_eq!(session.game_log(), log_before);
}

#[tokio::test(start_paused = true)]
async fn test_thinking_then_decision_narrates_in_order() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    let narrated = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&narrated);
    session.on_narrative(move |line| sink.lock().unwrap().push(line.to_string()));
    session.connect().await.unwrap();

    assert!(session.simulate_ai_turn());
    settle().await;
    assert_eq!(transport.sent_json()[0]["type"], "simulate_ai_turn");

    transport.push_json(&json!({
        "type": "ai_thinking_started",
        "message": "🤔 AI is thinking about its next move..."
    }));
    settle().await;
    assert!(session.ai_thinking());
    assert!(session.ai_decision().is_none());

    transport.push_json(&json!({
        "type": "ai_decision_made",
        "ai_decision": {
            "action": "attack",
            "explanation": "Perfect! My Squirtle has type advantage!",
            "type_lesson": "Water beats Fire"
        },
        "game_state": snapshot(3)
    }));
    settle().await;

    assert!(!session.ai_thinking());
    let decision = session.ai_decision().unwrap();
    assert_eq!(decision.type_lesson.as_deref(), Some("Water beats Fire"));
    assert_eq!(session.game_state().unwrap().turn_number, 3);

    let log = session.game_log();
    let tail = &log[log.len() - 2..];
    assert!(tail[0].contains("Perfect! My Squirtle has type advantage!"));
    assert!(tail[1].contains("Water beats Fire"));
    assert_eq!(narrated.lock().unwrap().len(), log.len());
}

#[tokio::test(start_paused = true)]
async fn test_latest_snapshot_wins() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.connect().await.unwrap();

    for turn in [4, 5, 6] {
        transport.push_json(&json!({"type": "game_state_update", "game_state": snapshot(turn)}));
    }
    settle().await;
    assert_eq!(session.game_state().unwrap().turn_number, 6);
}

#[tokio::test(start_paused = true)]
async fn test_draw_preview_is_replaced_by_server_snapshot() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.connect().await.unwrap();
    transport.push_json(&json!({"type": "game_state_update", "game_state": snapshot(2)}));
    settle().await;

    assert!(session.draw_card());
    assert_eq!(session.game_state().unwrap().child_player.hand_count(), 1);
    settle().await;
    let sent = transport.sent_json();
    assert_eq!(sent[0]["type"], "player_action");
    assert_eq!(sent[0]["action_type"], "draw_card");

    transport.push_json(&json!({
        "type": "player_action_result",
        "action_type": "draw_card",
        "result": {"success": true, "message": "You drew a card!"},
        "game_state": snapshot(2)
    }));
    settle().await;
    assert_eq!(session.game_state().unwrap().child_player.hand_count(), 0);
    assert_eq!(session.game_log().last().map(String::as_str), Some("You drew a card!"));
}

#[tokio::test(start_paused = true)]
async fn test_attack_sends_previewed_damage() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.connect().await.unwrap();

    let mut state = GameState::new("Ash", "AI Trainer");
    state.child_player.active = Some(
        Card::new("c1", "Charmander", 50, &[ElementType::Fire]).with_attack(Attack::new(
            "Ember",
            Damage::Fixed(30),
            &[ElementType::Fire],
        )),
    );
    state.ai_player.active = Some(Card::new("a1", "Bulbasaur", 70, &[ElementType::Grass]));
    transport.push_json(&json!({"type": "game_state_update", "game_state": state}));
    settle().await;

    assert!(session.attack(0));
    settle().await;

    // Ember 30 doubled against Grass
    let sent = transport.sent_json();
    assert_eq!(sent[0]["action_type"], "attack");
    assert_eq!(sent[0]["action_data"]["attack_index"], 0);
    assert_eq!(sent[0]["action_data"]["damage"], 60);
    let preview = session.game_state().unwrap();
    assert_eq!(preview.ai_player.active.unwrap().hp, 10);
}

#[tokio::test(start_paused = true)]
async fn test_log_keeps_only_latest_entries() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.connect().await.unwrap();

    for i in 0..25 {
        transport.push_json(&json!({"type": "ai_turn_ready", "message": format!("line {i}")}));
    }
    settle().await;

    let log = session.game_log();
    assert_eq!(log.len(), 20);
    assert_eq!(log.first().map(String::as_str), Some("line 5"));
    assert_eq!(log.last().map(String::as_str), Some("line 24"));
}

#[tokio::test(start_paused = true)]
async fn test_game_reset_replaces_log() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.connect().await.unwrap();
    transport.push_json(&json!({"type": "ai_turn_ready", "message": "Your turn!"}));
    settle().await;

    assert!(session.reset_game());
    transport.push_json(&json!({
        "type": "game_reset",
        "message": "Game reset",
        "game_log": ["🎮 New Pokemon battle started!", "Ash goes first"],
        "game_state": snapshot(1)
    }));
    settle().await;

    assert_eq!(
        session.game_log(),
        vec!["🎮 New Pokemon battle started!", "Ash goes first"]
    );
    assert_eq!(session.game_state().unwrap().turn_number, 1);
}

#[tokio::test(start_paused = true)]
async fn test_type_advice_adds_one_entry_without_state_change() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.connect().await.unwrap();
    transport.push_json(&json!({"type": "game_state_update", "game_state": snapshot(2)}));
    settle().await;
    let state_before = session.game_state();
    let log_before = session.game_log().len();

    assert!(session.request_type_advice(ElementType::Fire, ElementType::Grass));
    transport.push_json(&json!({
        "type": "type_advice",
        "attacking_type": "Fire",
        "defending_type": "Grass",
        "effectiveness": 2.0,
        "explanation": "Fire burns Grass, so it does double damage!"
    }));
    settle().await;

    let log = session.game_log();
    assert_eq!(log.len(), log_before + 1);
    assert!(log[log.len() - 1].contains("Fire burns Grass, so it does double damage!"));
    assert_eq!(session.game_state(), state_before);

    let sent = transport.sent_json();
    assert_eq!(
        sent[0],
        json!({"type": "get_type_advice", "attacking_type": "Fire", "defending_type": "Grass"})
    );
}

#[tokio::test(start_paused = true)]
async fn test_ai_error_clears_thinking_and_keeps_state() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.connect().await.unwrap();
    transport.push_json(&json!({"type": "game_state_update", "game_state": snapshot(2)}));
    transport.push_json(&json!({"type": "ai_thinking_started"}));
    transport.push_json(&json!({"type": "ai_error", "message": "AI error: model timeout"}));
    settle().await;

    assert!(!session.ai_thinking());
    assert_eq!(session.game_state().unwrap().turn_number, 2);
    assert_eq!(
        session.game_log().last().map(String::as_str),
        Some("❌ AI error: model timeout")
    );
}

#[tokio::test(start_paused = true)]
async fn test_failing_subscriber_does_not_break_session() {
    let transport = MemoryTransport::new();
    let session = session_with(&transport);
    session.subscribe("game_state_update", |_| Err("subscriber failed".into()));
    session.subscribe(events::MESSAGE, |_| panic!("subscriber panicked"));
    session.connect().await.unwrap();

    transport.push_json(&json!({"type": "game_state_update", "game_state": snapshot(9)}));
    settle().await;
    assert_eq!(session.game_state().unwrap().turn_number, 9);
}
