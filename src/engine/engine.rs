use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use thiserror::Error;
use tracing::{info, warn};

use crate::engine::gateway::Generator;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::turn::resolve_turn;
use crate::model::ending::Ending;
use crate::model::game_save::GameSave;
use crate::model::scenario::Scenario;
use crate::model::session::Session;
use crate::store::SessionStore;

/// Errors surfaced across the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("the generator could not produce a scene: {0:#}")]
    Generation(anyhow::Error),
    #[error("a request is already in flight")]
    Busy,
    #[error("no session is active")]
    NoSession,
    #[error("the session is already over")]
    SessionOver,
    #[error("the engine is no longer running")]
    Disconnected,
}

/// What a resolved turn hands back next to the updated session.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    Continued(Scenario),
    Ended(Ending),
}

/// The session state machine. Owns the only mutable copy of the
/// session and its current scenario; the UI sees clones.
pub struct Engine {
    gateway: Box<dyn Generator>,
    store: Box<dyn SessionStore>,
    session: Option<Session>,
    scenario: Option<Scenario>,
}

impl Engine {
    pub fn new(gateway: Box<dyn Generator>, store: Box<dyn SessionStore>) -> Self {
        Self {
            gateway,
            store,
            session: None,
            scenario: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn scenario(&self) -> Option<&Scenario> {
        self.scenario.as_ref()
    }

    /// Start a fresh session, discarding whatever was in memory.
    ///
    /// The gateway is asked first: if it fails, nothing is created and
    /// prior state stays untouched. The save slot is not written; the
    /// first resolved turn overwrites it.
    pub fn start_session(&mut self) -> Result<(Session, Scenario), EngineError> {
        let scenario = self
            .gateway
            .initial_scenario()
            .map_err(EngineError::Generation)?;

        let session = Session::new();
        info!("session started");

        self.session = Some(session.clone());
        self.scenario = Some(scenario.clone());
        Ok((session, scenario))
    }

    /// Advance the active session by exactly one turn.
    ///
    /// If either gateway call fails, the pre-call session stays
    /// authoritative and nothing is persisted. On the terminal path no
    /// new scenario exists, so the pre-turn one goes into the slot.
    pub fn advance(&mut self, choice_text: &str) -> Result<(Session, TurnOutcome), EngineError> {
        let Some(session) = self.session.clone() else {
            return Err(EngineError::NoSession);
        };
        let Some(scenario) = self.scenario.clone() else {
            return Err(EngineError::NoSession);
        };
        if session.is_game_over {
            return Err(EngineError::SessionOver);
        }

        let reply = self
            .gateway
            .next_turn(&session, choice_text)
            .map_err(EngineError::Generation)?;

        let updated = resolve_turn(&session, &scenario, choice_text, &reply);

        let (outcome, current) = if updated.is_game_over {
            let ending = self
                .gateway
                .ending(&updated)
                .map_err(EngineError::Generation)?;
            (TurnOutcome::Ended(ending), scenario)
        } else {
            let next = Scenario {
                narrative: reply.narrative,
                choices: reply.choices,
                environment: reply.environment,
            };
            (TurnOutcome::Continued(next.clone()), next)
        };

        self.session = Some(updated.clone());
        self.scenario = Some(current.clone());

        let save = GameSave {
            session: updated.clone(),
            scenario: current,
        };
        if let Err(err) = self.store.save(&save) {
            warn!(error = %err, "failed to write save slot");
        }

        info!(
            turn = updated.turn,
            game_over = updated.is_game_over,
            "turn resolved"
        );
        Ok((updated, outcome))
    }

    /// Restore the saved session, if any. A terminal record carries no
    /// ending, so one is requested again before handing it back.
    pub fn resume(&mut self) -> Result<Option<(Session, TurnOutcome)>, EngineError> {
        let Some(save) = self.store.load() else {
            return Ok(None);
        };

        let outcome = if save.session.is_game_over {
            let ending = self
                .gateway
                .ending(&save.session)
                .map_err(EngineError::Generation)?;
            TurnOutcome::Ended(ending)
        } else {
            TurnOutcome::Continued(save.scenario.clone())
        };

        info!(turn = save.session.turn, "session restored");
        self.session = Some(save.session.clone());
        self.scenario = Some(save.scenario);
        Ok(Some((save.session, outcome)))
    }

    /// Delete the save slot and drop the in-memory session.
    pub fn clear_save(&mut self) {
        self.store.clear();
        self.session = None;
        self.scenario = None;
        info!("save slot cleared");
    }

    /// Run the engine on its own thread. Returns the handle commands
    /// are submitted through and the channel responses arrive on.
    pub fn spawn(
        gateway: Box<dyn Generator>,
        store: Box<dyn SessionStore>,
    ) -> (EngineHandle, Receiver<EngineResponse>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let busy = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&busy);

        thread::spawn(move || {
            let mut engine = Engine::new(gateway, store);
            engine.run(cmd_rx, resp_tx, flag);
        });

        (EngineHandle { tx: cmd_tx, busy }, resp_rx)
    }

    fn run(
        &mut self,
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        busy: Arc<AtomicBool>,
    ) {
        while let Ok(cmd) = rx.recv() {
            let resp = self.dispatch(cmd);
            let _ = tx.send(resp);
            busy.store(false, Ordering::SeqCst);
        }
    }

    fn dispatch(&mut self, cmd: EngineCommand) -> EngineResponse {
        match cmd {
            EngineCommand::NewGame => match self.start_session() {
                Ok((session, scenario)) => EngineResponse::SessionStarted { session, scenario },
                Err(err) => failed(err),
            },
            EngineCommand::Choose(text) => match self.advance(&text) {
                Ok((session, TurnOutcome::Continued(scenario))) => {
                    EngineResponse::TurnResolved { session, scenario }
                }
                Ok((session, TurnOutcome::Ended(ending))) => {
                    EngineResponse::SessionEnded { session, ending }
                }
                Err(err) => failed(err),
            },
            EngineCommand::ResumeGame => match self.resume() {
                Ok(None) => EngineResponse::NoSavedSession,
                Ok(Some((session, TurnOutcome::Continued(scenario)))) => {
                    EngineResponse::SessionRestored { session, scenario }
                }
                Ok(Some((session, TurnOutcome::Ended(ending)))) => {
                    EngineResponse::SessionEnded { session, ending }
                }
                Err(err) => failed(err),
            },
            EngineCommand::ClearSave => {
                self.clear_save();
                EngineResponse::SaveCleared
            }
        }
    }
}

fn failed(err: EngineError) -> EngineResponse {
    warn!(error = %err, "engine request failed");
    EngineResponse::Failed {
        message: err.to_string(),
    }
}

/// UI-side handle to the engine thread. The `busy` flag is the
/// at-most-one-in-flight guard: a command submitted while another is
/// still being handled is rejected, never queued.
#[derive(Clone)]
pub struct EngineHandle {
    tx: Sender<EngineCommand>,
    busy: Arc<AtomicBool>,
}

impl EngineHandle {
    pub fn submit(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(EngineError::Busy);
        }
        if self.tx.send(cmd).is_err() {
            self.busy.store(false, Ordering::SeqCst);
            return Err(EngineError::Disconnected);
        }
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::bail;

    use crate::model::reply::GeneratorReply;
    use crate::model::scenario::Choice;
    use crate::model::stats::StatDelta;
    use crate::store::FileStore;

    const OPENING: &str = "You wake on cold tile under a light that never settles.";
    const NEXT_SCENE: &str = "The walls lean closer, patient as ever.";

    #[derive(Default)]
    struct Script {
        fail_initial: AtomicBool,
        fail_next: AtomicBool,
        fail_ending: AtomicBool,
    }

    struct ScriptedGenerator {
        delta: StatDelta,
        script: Arc<Script>,
    }

    fn choices() -> Vec<Choice> {
        vec![
            Choice {
                id: 1,
                text: "Step forward".to_string(),
                impact_description: "bold".to_string(),
            },
            Choice {
                id: 2,
                text: "Stay still".to_string(),
                impact_description: "cautious".to_string(),
            },
        ]
    }

    impl Generator for ScriptedGenerator {
        fn initial_scenario(&self) -> anyhow::Result<Scenario> {
            if self.script.fail_initial.load(Ordering::SeqCst) {
                bail!("generator offline");
            }
            Ok(Scenario {
                narrative: OPENING.to_string(),
                choices: choices(),
                environment: "sterile glow".to_string(),
            })
        }

        fn next_turn(&self, _session: &Session, _choice_text: &str) -> anyhow::Result<GeneratorReply> {
            if self.script.fail_next.load(Ordering::SeqCst) {
                bail!("generator offline");
            }
            Ok(GeneratorReply {
                narrative: NEXT_SCENE.to_string(),
                choices: choices(),
                environment: "low hum".to_string(),
                stat_updates: self.delta,
            })
        }

        fn ending(&self, _session: &Session) -> anyhow::Result<Ending> {
            if self.script.fail_ending.load(Ordering::SeqCst) {
                bail!("generator offline");
            }
            Ok(Ending {
                title: "Silence".to_string(),
                description: "The maze lets go.".to_string(),
            })
        }
    }

    fn engine_at(path: std::path::PathBuf, delta: StatDelta) -> (Engine, Arc<Script>) {
        let script = Arc::new(Script::default());
        let gateway = ScriptedGenerator {
            delta,
            script: Arc::clone(&script),
        };
        let engine = Engine::new(Box::new(gateway), Box::new(FileStore::new(path)));
        (engine, script)
    }

    fn slot(path: &std::path::Path) -> FileStore {
        FileStore::new(path.to_path_buf())
    }

    #[test]
    fn start_session_uses_fixed_initial_state() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, _) = engine_at(dir.path().join("save.json"), StatDelta::default());

        let (session, scenario) = engine.start_session().unwrap();
        assert_eq!(session, Session::new());
        assert_eq!(scenario.narrative, OPENING);
        // Starting a game does not touch the slot.
        assert!(slot(&dir.path().join("save.json")).load().is_none());
    }

    #[test]
    fn failed_start_creates_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, script) = engine_at(dir.path().join("save.json"), StatDelta::default());

        script.fail_initial.store(true, Ordering::SeqCst);
        assert!(matches!(
            engine.start_session(),
            Err(EngineError::Generation(_))
        ));
        assert!(engine.session().is_none());
        assert!(engine.scenario().is_none());
    }

    #[test]
    fn failed_restart_preserves_prior_session() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, script) = engine_at(dir.path().join("save.json"), StatDelta::default());

        engine.start_session().unwrap();
        engine.advance("Step forward").unwrap();
        let before = engine.session().cloned();

        script.fail_initial.store(true, Ordering::SeqCst);
        assert!(engine.start_session().is_err());
        assert_eq!(engine.session().cloned(), before);
    }

    #[test]
    fn restart_discards_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, _) = engine_at(dir.path().join("save.json"), StatDelta::default());

        engine.start_session().unwrap();
        engine.advance("Step forward").unwrap();
        assert_eq!(engine.session().unwrap().turn, 2);

        let (session, _) = engine.start_session().unwrap();
        assert_eq!(session, Session::new());
    }

    #[test]
    fn advance_without_session_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, _) = engine_at(dir.path().join("save.json"), StatDelta::default());

        assert!(matches!(
            engine.advance("Step forward"),
            Err(EngineError::NoSession)
        ));
    }

    #[test]
    fn advance_persists_session_and_new_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let delta = StatDelta {
            sanity: -5,
            hope: 2,
            fear: 8,
        };
        let (mut engine, _) = engine_at(path.clone(), delta);

        engine.start_session().unwrap();
        let (session, outcome) = engine.advance("Step forward").unwrap();

        assert_eq!(session.turn, 2);
        assert_eq!(session.stats.sanity, 45);
        let TurnOutcome::Continued(scenario) = outcome else {
            panic!("expected the session to continue");
        };
        assert_eq!(scenario.narrative, NEXT_SCENE);

        let saved = slot(&path).load().unwrap();
        assert_eq!(saved.session, session);
        assert_eq!(saved.scenario, scenario);
    }

    #[test]
    fn generation_failure_leaves_state_and_slot_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let (mut engine, script) = engine_at(path.clone(), StatDelta::default());

        engine.start_session().unwrap();
        engine.advance("Step forward").unwrap();
        let before_session = engine.session().cloned().unwrap();
        let before_saved = slot(&path).load().unwrap();

        script.fail_next.store(true, Ordering::SeqCst);
        assert!(matches!(
            engine.advance("Stay still"),
            Err(EngineError::Generation(_))
        ));

        assert_eq!(engine.session().cloned().unwrap(), before_session);
        assert_eq!(slot(&path).load().unwrap(), before_saved);
    }

    #[test]
    fn sanity_collapse_ends_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let delta = StatDelta {
            sanity: -60,
            hope: 0,
            fear: 0,
        };
        let (mut engine, _) = engine_at(path.clone(), delta);

        engine.start_session().unwrap();
        let (session, outcome) = engine.advance("Step forward").unwrap();

        assert_eq!(session.stats.sanity, 0);
        assert!(session.is_game_over);
        assert!(matches!(outcome, TurnOutcome::Ended(_)));

        // The terminal turn produced no new scenario, so the slot holds
        // the pre-turn one, and no ending.
        let saved = slot(&path).load().unwrap();
        assert!(saved.session.is_game_over);
        assert_eq!(saved.scenario.narrative, OPENING);
    }

    #[test]
    fn ending_failure_rolls_the_turn_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let delta = StatDelta {
            sanity: -60,
            hope: 0,
            fear: 0,
        };
        let (mut engine, script) = engine_at(path.clone(), delta);

        engine.start_session().unwrap();
        script.fail_ending.store(true, Ordering::SeqCst);

        assert!(matches!(
            engine.advance("Step forward"),
            Err(EngineError::Generation(_))
        ));
        let session = engine.session().unwrap();
        assert_eq!(session.turn, 1);
        assert!(!session.is_game_over);
        assert!(session.history.is_empty());
        assert!(slot(&path).load().is_none());
    }

    #[test]
    fn advance_on_terminal_session_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let delta = StatDelta {
            sanity: -60,
            hope: 0,
            fear: 0,
        };
        let (mut engine, _) = engine_at(dir.path().join("save.json"), delta);

        engine.start_session().unwrap();
        engine.advance("Step forward").unwrap();

        assert!(matches!(
            engine.advance("Stay still"),
            Err(EngineError::SessionOver)
        ));
        assert_eq!(engine.session().unwrap().history.len(), 1);
    }

    #[test]
    fn turn_limit_ends_the_twelfth_turn() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, _) = engine_at(dir.path().join("save.json"), StatDelta::default());

        engine.start_session().unwrap();
        for _ in 0..11 {
            let (_, outcome) = engine.advance("Step forward").unwrap();
            assert!(matches!(outcome, TurnOutcome::Continued(_)));
        }
        assert_eq!(engine.session().unwrap().turn, 12);

        let (session, outcome) = engine.advance("Step forward").unwrap();
        assert_eq!(session.turn, 13);
        assert!(session.is_game_over);
        assert!(matches!(outcome, TurnOutcome::Ended(_)));
    }

    #[test]
    fn advance_survives_store_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // Parent directory does not exist, so every write fails.
        let path = dir.path().join("missing").join("save.json");
        let (mut engine, _) = engine_at(path, StatDelta::default());

        engine.start_session().unwrap();
        let (session, _) = engine.advance("Step forward").unwrap();
        assert_eq!(session.turn, 2);
    }

    #[test]
    fn resume_without_save_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, _) = engine_at(dir.path().join("save.json"), StatDelta::default());

        assert!(engine.resume().unwrap().is_none());
        assert!(engine.session().is_none());
    }

    #[test]
    fn resume_restores_saved_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");

        let (mut first, _) = engine_at(path.clone(), StatDelta::default());
        first.start_session().unwrap();
        let (saved_session, _) = first.advance("Step forward").unwrap();

        let (mut second, _) = engine_at(path, StatDelta::default());
        let (session, outcome) = second.resume().unwrap().unwrap();
        assert_eq!(session, saved_session);
        let TurnOutcome::Continued(scenario) = outcome else {
            panic!("expected a restored scenario");
        };
        assert_eq!(scenario.narrative, NEXT_SCENE);
    }

    #[test]
    fn resume_of_terminal_save_requests_fresh_ending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let delta = StatDelta {
            sanity: -60,
            hope: 0,
            fear: 0,
        };

        let (mut first, _) = engine_at(path.clone(), delta);
        first.start_session().unwrap();
        first.advance("Step forward").unwrap();

        let (mut second, _) = engine_at(path, StatDelta::default());
        let (session, outcome) = second.resume().unwrap().unwrap();
        assert!(session.is_game_over);
        assert!(matches!(outcome, TurnOutcome::Ended(_)));
    }

    #[test]
    fn clear_save_empties_slot_and_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let (mut engine, _) = engine_at(path.clone(), StatDelta::default());

        engine.start_session().unwrap();
        engine.advance("Step forward").unwrap();
        assert!(slot(&path).load().is_some());

        engine.clear_save();
        assert!(slot(&path).load().is_none());
        assert!(engine.session().is_none());
        assert!(engine.resume().unwrap().is_none());
    }

    /// Generator whose next-turn call parks until the test releases it,
    /// keeping a request in flight for as long as needed.
    struct GatedGenerator {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl Generator for GatedGenerator {
        fn initial_scenario(&self) -> anyhow::Result<Scenario> {
            Ok(Scenario {
                narrative: OPENING.to_string(),
                choices: choices(),
                environment: "sterile glow".to_string(),
            })
        }

        fn next_turn(&self, _session: &Session, _choice_text: &str) -> anyhow::Result<GeneratorReply> {
            self.gate.lock().unwrap().recv()?;
            Ok(GeneratorReply {
                narrative: NEXT_SCENE.to_string(),
                choices: choices(),
                environment: "low hum".to_string(),
                stat_updates: StatDelta::default(),
            })
        }

        fn ending(&self, _session: &Session) -> anyhow::Result<Ending> {
            bail!("not reached");
        }
    }

    fn wait_until_idle(handle: &EngineHandle) {
        for _ in 0..500 {
            if !handle.is_busy() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("engine stayed busy");
    }

    #[test]
    fn second_advance_in_flight_is_rejected_not_queued() {
        let dir = tempfile::tempdir().unwrap();
        let (gate_tx, gate_rx) = mpsc::channel();
        let gateway = GatedGenerator {
            gate: Mutex::new(gate_rx),
        };
        let store = FileStore::new(dir.path().join("save.json"));
        let (handle, responses) = Engine::spawn(Box::new(gateway), Box::new(store));

        handle.submit(EngineCommand::NewGame).unwrap();
        assert!(matches!(
            responses.recv_timeout(Duration::from_secs(5)).unwrap(),
            EngineResponse::SessionStarted { .. }
        ));
        wait_until_idle(&handle);

        handle
            .submit(EngineCommand::Choose("Step forward".to_string()))
            .unwrap();
        // The first advance is parked inside the gateway; firing again
        // with the same choice must be rejected outright.
        assert!(matches!(
            handle.submit(EngineCommand::Choose("Step forward".to_string())),
            Err(EngineError::Busy)
        ));
        assert!(handle.is_busy());

        gate_tx.send(()).unwrap();
        let session = match responses.recv_timeout(Duration::from_secs(5)).unwrap() {
            EngineResponse::TurnResolved { session, .. } => session,
            _ => panic!("expected a resolved turn"),
        };
        assert_eq!(session.turn, 2);
        assert_eq!(session.history.len(), 1);

        // Exactly one turn was applied; no second response arrives.
        assert!(responses.recv_timeout(Duration::from_millis(250)).is_err());

        // The engine accepts work again once idle.
        wait_until_idle(&handle);
        gate_tx.send(()).unwrap();
        handle
            .submit(EngineCommand::Choose("Stay still".to_string()))
            .unwrap();
        let session = match responses.recv_timeout(Duration::from_secs(5)).unwrap() {
            EngineResponse::TurnResolved { session, .. } => session,
            _ => panic!("expected a resolved turn"),
        };
        assert_eq!(session.turn, 3);
    }
}
