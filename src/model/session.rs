use serde::{Deserialize, Serialize};

use crate::model::stats::Stats;

/// Hard turn limit. The session ends once the counter passes this.
pub const MAX_TURNS: u32 = 12;

/// Characters of narrative kept in each history entry.
pub const HISTORY_SNIPPET_LEN: usize = 100;

/// One resolved choice: what the player picked, and the opening of the
/// narrative that was on screen when they picked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user_choice: String,
    pub narrative_summary: String,
}

/// The full mutable game record. Mutated exactly once per turn by the
/// engine; frozen once `is_game_over` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub stats: Stats,
    pub turn: u32,
    pub history: Vec<HistoryEntry>,
    pub is_game_over: bool,
}

impl Session {
    /// A fresh session at turn 1 with the fixed starting stats.
    pub fn new() -> Self {
        Self {
            stats: Stats {
                sanity: 50,
                hope: 50,
                fear: 10,
            },
            turn: 1,
            history: Vec::new(),
            is_game_over: false,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// First `HISTORY_SNIPPET_LEN` characters of a narrative, cut on a
/// char boundary.
pub fn narrative_snippet(narrative: &str) -> String {
    narrative.chars().take(HISTORY_SNIPPET_LEN).collect()
}
