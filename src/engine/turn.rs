use crate::model::reply::GeneratorReply;
use crate::model::scenario::Scenario;
use crate::model::session::{narrative_snippet, HistoryEntry, Session, MAX_TURNS};
use crate::model::stats::{Stats, MAX_STAT};

/// Terminal test, evaluated on post-update values. Hope reaching a
/// bound is never terminal on its own.
pub fn is_terminal(turn: u32, stats: &Stats) -> bool {
    turn > MAX_TURNS || stats.sanity <= 0 || stats.fear >= MAX_STAT
}

/// Resolve one turn of an active session against a generator reply.
///
/// The appended history entry pairs the literal choice text with a
/// snippet of the narrative the player was looking at when they picked
/// it: the scenario passed in, not the reply's new narrative.
pub fn resolve_turn(
    session: &Session,
    scenario: &Scenario,
    choice_text: &str,
    reply: &GeneratorReply,
) -> Session {
    let stats = session.stats.apply(&reply.stat_updates);
    let turn = session.turn + 1;

    let mut history = session.history.clone();
    history.push(HistoryEntry {
        user_choice: choice_text.to_string(),
        narrative_summary: narrative_snippet(&scenario.narrative),
    });

    Session {
        stats,
        turn,
        history,
        is_game_over: is_terminal(turn, &stats),
    }
}
