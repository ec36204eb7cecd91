use uuid::Uuid;

/// Source of fresh node ids, injected into the document.
pub trait IdGenerator: Send {
    fn next_id(&mut self, node_type: &str) -> String;
}

/// Deterministic `{prefix}{type}-{n}` ids
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    prefix: String,
    count: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            count: 0,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, node_type: &str) -> String {
        self.count += 1;
        format!("{}{}-{}", self.prefix, node_type, self.count)
    }
}

/// `{type}-{uuid v4}` ids
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&mut self, node_type: &str) -> String {
        format!("{}-{}", node_type, Uuid::new_v4().simple())
    }
}
