//! Per-project memory of which engine last served a call.

use dashmap::DashMap;

use super::canonical::Engine;
use super::names::ProjectName;

/// Process-scoped `project → engine` map.
///
/// Absence means the project is still `UNKNOWN`. Writes are idempotent, so
/// concurrent first calls may race without coordination.
#[derive(Debug, Default)]
pub struct BackendModeCache {
    modes: DashMap<ProjectName, Engine>,
}

impl BackendModeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, project: &ProjectName) -> Option<Engine> {
        self.modes.get(project).map(|mode| *mode.value())
    }

    /// Record the engine that just succeeded for `project`.
    pub fn record(&self, project: &ProjectName, engine: Engine) {
        self.modes.insert(project.clone(), engine);
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_start_unknown_and_keep_the_last_winner() {
        let cache = BackendModeCache::new();
        let project = ProjectName::new("ecom").expect("project");
        assert_eq!(cache.get(&project), None);

        cache.record(&project, Engine::Remote);
        cache.record(&project, Engine::Remote);
        assert_eq!(cache.get(&project), Some(Engine::Remote));
        assert_eq!(cache.len(), 1);
    }
}
