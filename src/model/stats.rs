use serde::{Deserialize, Serialize};

/// Upper bound shared by all three stats. A stat is never stored or
/// shown outside `[0, MAX_STAT]`.
pub const MAX_STAT: i32 = 100;

/// The three bounded stats summarizing the subject's condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub sanity: i32,
    pub hope: i32,
    pub fear: i32,
}

/// Signed per-stat adjustments reported by the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDelta {
    pub sanity: i32,
    pub hope: i32,
    pub fear: i32,
}

/// Map any value to the nearest point in `[0, MAX_STAT]`.
pub fn clamp(v: i32) -> i32 {
    v.clamp(0, MAX_STAT)
}

/// `clamp(stat + delta)`, with saturating addition so extreme deltas
/// cannot wrap before the clamp.
pub fn apply_delta(stat: i32, delta: i32) -> i32 {
    clamp(stat.saturating_add(delta))
}

impl Stats {
    /// Apply a delta to each stat independently.
    pub fn apply(&self, delta: &StatDelta) -> Stats {
        Stats {
            sanity: apply_delta(self.sanity, delta.sanity),
            hope: apply_delta(self.hope, delta.hope),
            fear: apply_delta(self.fear, delta.fear),
        }
    }
}
