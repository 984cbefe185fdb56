use crate::sector::Sector;
use crate::spawner::SpawnerId;

/// Source label passed along with dead-script runs.
pub const DEAD_SCRIPT_SOURCE: &str = "dead-script";

/// Exactly-once death bookkeeping for one enemy.
#[derive(Clone, Debug)]
pub struct DeathLedger {
    counted: bool,
    notified: bool,
    dead_script: String,
    spawner: Option<SpawnerId>,
}

impl DeathLedger {
    pub fn new(counted: bool, dead_script: String, spawner: Option<SpawnerId>) -> Self {
        Self {
            counted,
            notified: false,
            dead_script,
            spawner,
        }
    }

    pub fn counted(&self) -> bool {
        self.counted
    }

    pub fn dead_script(&self) -> &str {
        &self.dead_script
    }

    /// Runs the death side effects the first time it is called.
    /// Returns false on every later call.
    pub fn notify(&mut self, sector: &mut dyn Sector) -> bool {
        if self.notified {
            return false;
        }
        self.notified = true;

        if self.counted {
            sector.record_kill();
        }
        self.counted = false;

        if let Some(spawner) = self.spawner {
            sector.notify_spawner(spawner);
        }
        if !self.dead_script.is_empty() {
            sector.run_script(&self.dead_script, DEAD_SCRIPT_SOURCE);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawner::SpawnerRegistry;
    use crate::testing::TestSector;

    #[test]
    fn notification_runs_once() {
        let mut registry = SpawnerRegistry::default();
        let spawner = registry.register("dispenser", None);
        let mut sector = TestSector::default();
        let mut ledger = DeathLedger::new(true, "open_gate".to_string(), Some(spawner));

        assert!(ledger.notify(&mut sector));
        assert!(!ledger.notify(&mut sector));
        assert!(!ledger.notify(&mut sector));

        assert_eq!(sector.kills, 1);
        assert_eq!(sector.spawner_notifications, vec![spawner]);
        assert_eq!(
            sector.scripts,
            vec![("open_gate".to_string(), DEAD_SCRIPT_SOURCE.to_string())]
        );
        assert!(!ledger.counted());
    }

    #[test]
    fn uncounted_enemy_still_notifies_spawner() {
        let mut registry = SpawnerRegistry::default();
        let spawner = registry.register("dispenser", None);
        let mut sector = TestSector::default();
        let mut ledger = DeathLedger::new(false, String::new(), Some(spawner));
        ledger.notify(&mut sector);
        assert_eq!(sector.kills, 0);
        assert_eq!(sector.spawner_notifications.len(), 1);
        assert!(sector.scripts.is_empty());
    }
}
