//! Live session registry.
//!
//! Each session sits behind its own mutex so that at most one operation runs
//! against it at a time, while unrelated sessions proceed in parallel. The map
//! itself is a `DashMap`; a map guard is never held while a session is locked.

use dashmap::DashMap;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uno_core::{
    CardColor, CardId, GameError, GameEvent, GameSession, GameStatus, Player, PlayerView,
    PublicView, SessionId, UserId, MAX_PLAYERS,
};
use uuid::Uuid;

pub type SharedSession = Arc<Mutex<GameSession>>;

/// Result of one operation, with views captured under the same lock
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    pub session_id: SessionId,
    pub events: Vec<GameEvent>,
    /// Players still seated after the operation
    pub members: Vec<UserId>,
    /// One view per member; empty once the session is closed
    pub views: Vec<PlayerView>,
    /// The session was torn down and is no longer registered
    pub closed: bool,
}

impl SessionUpdate {
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn winner(&self) -> Option<&UserId> {
        self.events.iter().find_map(|e| match e {
            GameEvent::GameEnded { winner_id } => Some(winner_id),
            _ => None,
        })
    }
}

/// Summary of a session for discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub host_id: UserId,
    pub host_name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub status: GameStatus,
}

impl SessionSummary {
    fn of(session: &GameSession) -> Self {
        let host_name = session
            .get_player(&session.host_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();

        Self {
            id: session.id,
            host_id: session.host_id.clone(),
            host_name,
            player_count: session.player_count(),
            max_players: MAX_PLAYERS,
            status: session.status,
        }
    }
}

/// All live sessions
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SharedSession>,
    /// Source of per-session seeds when shuffles must be reproducible
    seeder: Option<Mutex<StdRng>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            seeder: None,
        }
    }

    /// A registry whose sessions shuffle deterministically
    pub fn with_seed(seed: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            seeder: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Open a new session with `host` seated
    pub fn create(&self, host: Player) -> SessionUpdate {
        let id = Uuid::new_v4();
        let host_id = host.user_id.clone();

        let session = match &self.seeder {
            Some(seeder) => {
                let seed = seeder.lock().gen();
                GameSession::with_seed(id, host, seed)
            }
            None => GameSession::new(id, host),
        };
        let members = vec![host_id.clone()];
        let views = session.player_views();

        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        info!("Session {} created by {} ({} live)", id, host_id, self.len());

        SessionUpdate {
            session_id: id,
            events: Vec::new(),
            members,
            views,
            closed: false,
        }
    }

    pub fn get(&self, id: SessionId) -> Option<SharedSession> {
        self.sessions.get(&id).map(|s| Arc::clone(s.value()))
    }

    /// Summaries of every live session
    pub fn list(&self) -> Vec<SessionSummary> {
        if self.is_empty() {
            return Vec::new();
        }

        // Collect handles first so no map guard is held while locking sessions
        let handles: Vec<SharedSession> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        handles
            .iter()
            .map(|s| s.lock())
            .filter(|s| !s.is_closed())
            .map(|s| SessionSummary::of(&s))
            .collect()
    }

    /// Sessions still accepting players
    pub fn list_waiting(&self) -> Vec<SessionSummary> {
        self.list()
            .into_iter()
            .filter(|s| s.status == GameStatus::Waiting && s.player_count < s.max_players)
            .collect()
    }

    pub fn remove(&self, id: SessionId) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            info!("Session {} removed", id);
        }
        removed
    }

    pub fn join(&self, id: SessionId, player: Player) -> Result<SessionUpdate, GameError> {
        self.apply(id, |s| s.join(player))
    }

    pub fn leave(&self, id: SessionId, user_id: &str) -> Result<SessionUpdate, GameError> {
        self.apply(id, |s| s.leave(user_id))
    }

    pub fn start(&self, id: SessionId) -> Result<SessionUpdate, GameError> {
        self.apply(id, |s| s.start())
    }

    pub fn play_card(
        &self,
        id: SessionId,
        user_id: &str,
        card_id: CardId,
        chosen_color: Option<CardColor>,
    ) -> Result<SessionUpdate, GameError> {
        self.apply(id, |s| s.play_card(user_id, card_id, chosen_color))
    }

    pub fn draw_card(&self, id: SessionId, user_id: &str) -> Result<SessionUpdate, GameError> {
        self.apply(id, |s| s.draw_card(user_id))
    }

    pub fn public_view(&self, id: SessionId) -> Result<PublicView, GameError> {
        self.read(id, |s| s.public_view())
    }

    pub fn player_view(&self, id: SessionId, user_id: &str) -> Result<PlayerView, GameError> {
        self.read(id, |s| s.player_view(user_id))
    }

    /// Run one mutating operation under the session lock
    fn apply<F>(&self, id: SessionId, op: F) -> Result<SessionUpdate, GameError>
    where
        F: FnOnce(&mut GameSession) -> Result<Vec<GameEvent>, GameError>,
    {
        let handle = self.get(id).ok_or(GameError::NotFound)?;
        let mut session = handle.lock();

        let events = op(&mut *session)?;
        let closed = session.is_closed();
        let members: Vec<UserId> = session.players.iter().map(|p| p.user_id.clone()).collect();
        let views = if closed {
            Vec::new()
        } else {
            session.player_views()
        };

        if closed {
            // Removed while still locked so nobody sees a closed session in the map
            self.sessions.remove(&id);
            info!("Session {} torn down", id);
        } else {
            debug!("Session {}: {} event(s)", id, events.len());
        }

        Ok(SessionUpdate {
            session_id: id,
            events,
            members,
            views,
            closed,
        })
    }

    fn read<T, F>(&self, id: SessionId, f: F) -> Result<T, GameError>
    where
        F: FnOnce(&GameSession) -> T,
    {
        let handle = self.get(id).ok_or(GameError::NotFound)?;
        let session = handle.lock();
        if session.is_closed() {
            return Err(GameError::NotFound);
        }
        Ok(f(&*session))
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
