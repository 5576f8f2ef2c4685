use crate::model::session::{Session, MAX_TURNS};

/// Builds the prompts sent to the generator.
/// Intentionally dumb: it only formats text.
/// No parsing, no networking, no engine logic.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn initial_scenario() -> String {
        let mut prompt = String::new();

        push_system_prompt(&mut prompt);
        prompt.push_str(
            "This is the very first scene. The subject has just woken inside \
the maze with no memory of entering it.\n\n",
        );
        push_scene_format(&mut prompt, false);

        prompt
    }

    pub fn next_turn(session: &Session, choice_text: &str) -> String {
        let mut prompt = String::new();

        push_system_prompt(&mut prompt);
        push_state_section(&mut prompt, session);
        push_history_section(&mut prompt, session);
        push_player_choice(&mut prompt, choice_text);
        push_scene_format(&mut prompt, true);

        prompt
    }

    pub fn ending(session: &Session) -> String {
        let mut prompt = String::new();

        push_system_prompt(&mut prompt);
        push_state_section(&mut prompt, session);
        push_history_section(&mut prompt, session);
        push_ending_format(&mut prompt);

        prompt
    }
}

fn push_system_prompt(prompt: &mut String) {
    prompt.push_str(
        "You are the narrator of MindMaze, a psychological maze a lone subject \
must navigate.\n\n\
Rules:\n\
- Write in second person, present tense. Unsettling, never gratuitous.\n\
- A run lasts at most 12 turns; pace revelations accordingly.\n\
- Offer 2 to 4 meaningfully different choices every scene.\n\
- Each choice carries an impact_description hint for your own later \
reasoning; the subject never sees it.\n\
- Report stat changes only through stat_updates, with small deltas \
(roughly -20 to +20 per stat).\n\
- Never mention the stats or the turn counter inside the narrative.\n\n",
    );
}

fn push_state_section(prompt: &mut String, session: &Session) {
    prompt.push_str("CURRENT STATE:\n");
    prompt.push_str(&format!(
        "- sanity: {}\n- hope: {}\n- fear: {}\n- turn: {} of {}\n\n",
        session.stats.sanity, session.stats.hope, session.stats.fear, session.turn, MAX_TURNS
    ));
}

fn push_history_section(prompt: &mut String, session: &Session) {
    if session.history.is_empty() {
        return;
    }

    prompt.push_str("HISTORY (oldest first):\n");
    for entry in &session.history {
        prompt.push_str(&format!(
            "- chose \"{}\" during: {}\n",
            entry.user_choice, entry.narrative_summary
        ));
    }
    prompt.push('\n');
}

fn push_player_choice(prompt: &mut String, choice_text: &str) {
    prompt.push_str("PLAYER CHOICE:\n");
    prompt.push_str(choice_text);
    prompt.push_str("\n\n");
}

fn push_scene_format(prompt: &mut String, with_stats: bool) {
    prompt.push_str(
        "Output Format:\n\
Respond with a single JSON object and nothing else:\n\
{\n\
  \"narrative\": \"...\",\n\
  \"choices\": [{ \"id\": 1, \"text\": \"...\", \"impact_description\": \"...\" }],\n\
  \"environment\": \"two or three word atmosphere label\"",
    );

    if with_stats {
        prompt.push_str(",\n  \"stat_updates\": { \"sanity\": 0, \"hope\": 0, \"fear\": 0 }\n}\n");
    } else {
        prompt.push_str("\n}\n");
    }

    prompt.push_str("Do not add explanations, markdown, or extra sections.\n");
}

fn push_ending_format(prompt: &mut String) {
    prompt.push_str(
        "The run is over. Write the ending this subject earned, consistent \
with their final state and the path they took.\n\n\
Output Format:\n\
Respond with a single JSON object and nothing else:\n\
{\n\
  \"title\": \"...\",\n\
  \"description\": \"...\"\n\
}\n\
Do not add explanations, markdown, or extra sections.\n",
    );
}
