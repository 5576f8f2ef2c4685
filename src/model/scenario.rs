use serde::{Deserialize, Serialize};

/// One selectable option inside a scenario. The impact hint feeds the
/// generator's later reasoning; the engine never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: u32,
    pub text: String,
    #[serde(default)]
    pub impact_description: String,
}

/// The content currently presented to the player. Immutable once
/// received; replaced wholesale each turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub narrative: String,
    pub choices: Vec<Choice>,
    /// Short atmosphere label shown above the narrative.
    pub environment: String,
}
