use crate::model::ending::Ending;
use crate::model::scenario::Scenario;
use crate::model::session::Session;

/// Requests the UI submits to the engine thread.
pub enum EngineCommand {
    NewGame,
    Choose(String),
    ResumeGame,
    ClearSave,
}

/// Results the engine thread pushes back to the UI. Every variant
/// carries owned clones; the engine keeps the only mutable copy.
pub enum EngineResponse {
    SessionStarted { session: Session, scenario: Scenario },
    TurnResolved { session: Session, scenario: Scenario },
    SessionEnded { session: Session, ending: Ending },
    SessionRestored { session: Session, scenario: Scenario },
    NoSavedSession,
    SaveCleared,
    Failed { message: String },
}
