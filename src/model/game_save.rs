use serde::{Deserialize, Serialize};

use crate::model::scenario::Scenario;
use crate::model::session::Session;

/// Everything a reload needs, stored as one record in the save slot.
/// No version field; a record that no longer matches the current shape
/// reads back as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSave {
    pub session: Session,
    pub scenario: Scenario,
}
