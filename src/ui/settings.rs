use serde::{Deserialize, Serialize};

use crate::engine::llm_client::GeneratorConfig;

/// Settings edited on the title screen and persisted between runs.
#[derive(Serialize, Deserialize, Clone)]
pub struct UiSettings {
    pub ui_scale: f32,
    pub generator: GeneratorConfig,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            ui_scale: 1.0,
            generator: GeneratorConfig::default(),
        }
    }
}
