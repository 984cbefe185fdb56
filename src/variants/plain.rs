use crate::enemy::{Capabilities, EnemyBehavior};

/// Uses the shared behaviour unchanged. Useful for scenery hazards and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct Plain {
    capabilities: Capabilities,
}

impl Plain {
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }
}

impl EnemyBehavior for Plain {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}
