//! Asset load tracking for the active model

/// Load phase of the active model's asset
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Pending { id: String },
    Ready { id: String },
    Failed { id: String, reason: String },
}

/// Tracks whether the active model is still loading
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    phase: LoadPhase,
}

impl LoadTracker {
    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    /// A new model became active; its asset is now pending
    pub fn begin(&mut self, id: &str) {
        self.phase = LoadPhase::Pending { id: id.to_string() };
    }

    /// Mark `id` ready. Returns false if `id` is no longer the pending model.
    pub fn finish(&mut self, id: &str) -> bool {
        if !self.is_pending_for(id) {
            return false;
        }
        self.phase = LoadPhase::Ready { id: id.to_string() };
        true
    }

    /// Mark `id` failed. Returns false if `id` is no longer the pending model.
    pub fn fail(&mut self, id: &str, reason: impl Into<String>) -> bool {
        if !self.is_pending_for(id) {
            return false;
        }
        self.phase = LoadPhase::Failed {
            id: id.to_string(),
            reason: reason.into(),
        };
        true
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.phase, LoadPhase::Pending { .. })
    }

    pub fn is_pending_for(&self, id: &str) -> bool {
        matches!(&self.phase, LoadPhase::Pending { id: pending } if pending == id)
    }

    /// The loading indicator is shown exactly while a load is pending
    pub fn indicator_visible(&self) -> bool {
        self.is_pending()
    }

    pub fn failure(&self) -> Option<(&str, &str)> {
        match &self.phase {
            LoadPhase::Failed { id, reason } => Some((id, reason)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_visible_only_while_pending() {
        let mut tracker = LoadTracker::default();
        assert!(!tracker.indicator_visible());

        tracker.begin("cat_skull");
        assert!(tracker.indicator_visible());

        assert!(tracker.finish("cat_skull"));
        assert!(!tracker.indicator_visible());
        assert_eq!(
            *tracker.phase(),
            LoadPhase::Ready {
                id: "cat_skull".to_string()
            }
        );
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut tracker = LoadTracker::default();
        tracker.begin("cat_skull");
        tracker.begin("raven_skull");

        assert!(!tracker.finish("cat_skull"));
        assert!(tracker.is_pending_for("raven_skull"));
        assert!(!tracker.fail("cat_skull", "404"));
        assert!(tracker.indicator_visible());
    }

    #[test]
    fn test_failure_hides_indicator() {
        let mut tracker = LoadTracker::default();
        tracker.begin("ram_skull");
        assert!(tracker.fail("ram_skull", "decode error"));
        assert!(!tracker.indicator_visible());
        assert_eq!(tracker.failure(), Some(("ram_skull", "decode error")));
    }
}
