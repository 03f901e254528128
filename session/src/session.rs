//! The session facade a presentation layer talks to.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use types::{
    apply_optimistic_attack, apply_optimistic_draw, apply_optimistic_play,
    apply_optimistic_retreat, attack_damage, placeholder_card, AiDecision, ElementType, GameState,
    OptimisticError, PlayerAction,
};

use crate::{
    config::ClientConfig,
    connection::{ConnectionManager, ConnectionStatus},
    dispatcher::ActionDispatcher,
    error::{HandlerError, SessionError},
    events::{self, EventRegistry, SessionEvent, Subscription},
    projector::BattleView,
    transport::{Transport, WsTransport},
};

type NarrativeListener = Arc<dyn Fn(&str) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct GameSession {
    connection: ConnectionManager,
    dispatcher: ActionDispatcher,
    view: Arc<Mutex<BattleView>>,
    listeners: Arc<Mutex<Vec<NarrativeListener>>>,
}

impl GameSession {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, SessionError> {
        let registry = EventRegistry::new();
        let connection = ConnectionManager::new(config, transport, registry.clone())?;
        let view = Arc::new(Mutex::new(BattleView::new(config.log_capacity)));
        let listeners: Arc<Mutex<Vec<NarrativeListener>>> = Arc::default();

        let project: Arc<dyn Fn(&SessionEvent) + Send + Sync> = {
            let view = Arc::clone(&view);
            let listeners = Arc::clone(&listeners);
            Arc::new(move |event: &SessionEvent| {
                let lines = lock(&view).apply(event);
                if lines.is_empty() {
                    return;
                }
                let listeners = lock(&listeners).clone();
                for line in &lines {
                    for listener in &listeners {
                        listener(line);
                    }
                }
            })
        };

        for channel in [events::CONNECTED, events::DISCONNECTED, events::ERROR] {
            let project = Arc::clone(&project);
            // Inbound `error` messages share the channel; they arrive again through MESSAGE.
            registry.subscribe(channel, move |event| {
                if !event.is_message() {
                    project(event);
                }
                Ok(())
            });
        }
        registry.subscribe(events::MESSAGE, move |event| {
            project(event);
            Ok(())
        });

        tracing::info!(
            "Created session {} for {}",
            connection.session_id(),
            connection.url()
        );
        Ok(Self {
            dispatcher: ActionDispatcher::new(connection.clone()),
            connection,
            view,
            listeners,
        })
    }

    pub fn with_websocket(config: &ClientConfig) -> Result<Self, SessionError> {
        Self::new(config, Arc::new(WsTransport))
    }

    pub async fn connect(&self) -> Result<(), SessionError> {
        self.connection.connect().await
    }

    pub fn disconnect(&self) {
        self.connection.disconnect();
    }

    pub fn shutdown(&self) {
        self.connection.shutdown();
        lock(&self.listeners).clear();
    }

    pub fn session_id(&self) -> &str {
        self.connection.session_id()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.view)
            .last_error
            .clone()
            .or_else(|| self.connection.last_error())
    }

    pub fn game_state(&self) -> Option<GameState> {
        lock(&self.view).game_state.clone()
    }

    pub fn ai_thinking(&self) -> bool {
        lock(&self.view).ai_thinking
    }

    pub fn ai_decision(&self) -> Option<AiDecision> {
        lock(&self.view).ai_decision.clone()
    }

    pub fn game_log(&self) -> Vec<String> {
        lock(&self.view).log.to_vec()
    }

    pub fn banner(&self) -> Option<String> {
        lock(&self.view).banner()
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Registers an extra handler for `channel` next to the session's own projection.
    pub fn subscribe<F>(&self, channel: &str, handler: F) -> Subscription
    where
        F: Fn(&SessionEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.connection.events().subscribe(channel, handler)
    }

    /// Called with every line appended to the transcript.
    pub fn on_narrative<F>(&self, listener: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        lock(&self.listeners).push(Arc::new(listener));
    }

    pub fn simulate_ai_turn(&self) -> bool {
        self.dispatcher.simulate_ai_turn()
    }

    pub fn request_game_state(&self) -> bool {
        self.dispatcher.request_game_state()
    }

    pub fn reset_game(&self) -> bool {
        self.dispatcher.reset_game()
    }

    pub fn request_type_advice(&self, attacking: ElementType, defending: ElementType) -> bool {
        self.dispatcher.request_type_advice(attacking, defending)
    }

    pub fn draw_card(&self) -> bool {
        self.act(PlayerAction::DrawCard, |state| {
            apply_optimistic_draw(state, placeholder_card(&mut rand::thread_rng()))
        })
    }

    pub fn play_pokemon(&self, card_id: &str) -> bool {
        self.act(
            PlayerAction::PlayPokemon {
                card_id: card_id.to_string(),
            },
            |state| apply_optimistic_play(state, card_id),
        )
    }

    /// Sends the same damage the local preview shows, so the server applies that amount.
    pub fn attack(&self, attack_index: usize) -> bool {
        let damage = lock(&self.view)
            .game_state
            .as_ref()
            .and_then(|state| match attack_damage(state, attack_index) {
                Ok(damage) => Some(damage),
                Err(err) => {
                    tracing::debug!("No damage preview for attack {}: {}", attack_index, err);
                    None
                }
            });
        self.act(
            PlayerAction::Attack {
                attack_index,
                damage,
            },
            |state| apply_optimistic_attack(state, attack_index),
        )
    }

    pub fn retreat(&self, bench_index: usize) -> bool {
        self.act(PlayerAction::Retreat { bench_index }, |state| {
            apply_optimistic_retreat(state, bench_index)
        })
    }

    pub fn end_turn(&self) -> bool {
        self.dispatcher.submit_action(&PlayerAction::EndTurn)
    }

    /// Shows the preview locally, then sends the action. The next server snapshot overwrites
    /// the preview either way.
    fn act<F>(&self, action: PlayerAction, preview: F) -> bool
    where
        F: FnOnce(&GameState) -> Result<GameState, OptimisticError>,
    {
        if !self.is_connected() {
            tracing::warn!("Not connected, ignoring {}", action.action_type());
            return false;
        }
        {
            let mut view = lock(&self.view);
            if let Some(current) = &view.game_state {
                match preview(current) {
                    Ok(next) => view.game_state = Some(next),
                    Err(err) => tracing::debug!("No preview for {}: {}", action, err),
                }
            }
        }
        self.dispatcher.submit_action(&action)
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
