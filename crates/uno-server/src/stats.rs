//! Win/loss bookkeeping for completed games.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uno_core::{SessionId, UserId};

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Winner {0} did not play in this match")]
    UnknownWinner(UserId),

    #[error("Match has no players")]
    NoPlayers,
}

/// Outcome of one finished game, as reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub session_id: SessionId,
    pub player_ids: Vec<UserId>,
    pub winner_id: UserId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub games_played: u32,
    pub games_won: u32,
}

/// A match as kept in history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub result: MatchResult,
    /// Seconds since the Unix epoch
    pub finished_at: u64,
}

/// Persists match outcomes
pub trait StatsStore: Send + Sync {
    fn record_match(&self, result: &MatchResult) -> Result<(), StatsError>;

    fn player_stats(&self, user_id: &str) -> Option<PlayerStats>;

    /// Most recent first
    fn match_history(&self, user_id: &str, limit: usize) -> Vec<MatchRecord>;

    /// Players ordered by games won, then by games played
    fn leaderboard(&self, limit: usize) -> Vec<(UserId, PlayerStats)>;
}

#[derive(Debug, Default)]
pub struct InMemoryStatsStore {
    players: RwLock<HashMap<UserId, PlayerStats>>,
    history: RwLock<Vec<MatchRecord>>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsStore for InMemoryStatsStore {
    fn record_match(&self, result: &MatchResult) -> Result<(), StatsError> {
        if result.player_ids.is_empty() {
            return Err(StatsError::NoPlayers);
        }
        if !result.player_ids.contains(&result.winner_id) {
            return Err(StatsError::UnknownWinner(result.winner_id.clone()));
        }

        {
            let mut players = self.players.write();
            for user_id in &result.player_ids {
                let stats = players.entry(user_id.clone()).or_default();
                stats.games_played += 1;
                if *user_id == result.winner_id {
                    stats.games_won += 1;
                }
            }
        }

        let finished_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.history.write().push(MatchRecord {
            result: result.clone(),
            finished_at,
        });

        Ok(())
    }

    fn player_stats(&self, user_id: &str) -> Option<PlayerStats> {
        self.players.read().get(user_id).cloned()
    }

    fn match_history(&self, user_id: &str, limit: usize) -> Vec<MatchRecord> {
        self.history
            .read()
            .iter()
            .rev()
            .filter(|m| m.result.player_ids.iter().any(|p| p == user_id))
            .take(limit)
            .cloned()
            .collect()
    }

    fn leaderboard(&self, limit: usize) -> Vec<(UserId, PlayerStats)> {
        let mut board: Vec<(UserId, PlayerStats)> = self
            .players
            .read()
            .iter()
            .map(|(id, stats)| (id.clone(), stats.clone()))
            .collect();

        board.sort_by(|(a_id, a), (b_id, b)| {
            b.games_won
                .cmp(&a.games_won)
                .then(b.games_played.cmp(&a.games_played))
                .then(a_id.cmp(b_id))
        });
        board.truncate(limit);
        board
    }
}
