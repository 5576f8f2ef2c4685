use serde::{Deserialize, Serialize};

/// Terminal narrative content, produced once when a session ends.
/// Displayed alongside the final session; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ending {
    pub title: String,
    pub description: String,
}
