use anyhow::Result;

use crate::model::ending::Ending;
use crate::model::reply::GeneratorReply;
use crate::model::scenario::Scenario;
use crate::model::session::Session;

/// The external content generator. Stateless: every call carries the
/// full session state it needs, and every failure mode collapses into
/// one generic generation error.
pub trait Generator: Send {
    /// Produce the opening scenario for a brand-new session.
    fn initial_scenario(&self) -> Result<Scenario>;

    /// Produce the next scene (and optional stat movement) after the
    /// player picked `choice_text`.
    fn next_turn(&self, session: &Session, choice_text: &str) -> Result<GeneratorReply>;

    /// Produce the ending for a session that has become terminal.
    fn ending(&self, session: &Session) -> Result<Ending>;
}
