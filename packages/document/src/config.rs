use folio_model::{IdGenerator, RandomIds, SequentialIds};
use serde::{Deserialize, Serialize};

/// How a session allocates node ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IdStrategy {
    Sequential {
        #[serde(default)]
        prefix: String,
    },
    Random,
}

impl Default for IdStrategy {
    fn default() -> Self {
        IdStrategy::Sequential { prefix: String::new() }
    }
}

impl IdStrategy {
    pub fn generator(&self) -> Box<dyn IdGenerator> {
        match self {
            IdStrategy::Sequential { prefix } => Box::new(SequentialIds::with_prefix(prefix.clone())),
            IdStrategy::Random => Box::new(RandomIds),
        }
    }
}

/// Session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default)]
    pub id_strategy: IdStrategy,

    /// Maximum undo levels (0 = unlimited)
    #[serde(default = "default_history_levels")]
    pub history_levels: usize,
}

fn default_history_levels() -> usize {
    100
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::default(),
            history_levels: default_history_levels(),
        }
    }
}
