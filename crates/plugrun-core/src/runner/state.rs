use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Lifecycle of a runner handle.
///
/// ```text
/// New ──start ok──▶ Running ──wait returns──▶ Exited
///  │                   │                        ▲
///  │                   └──kill──▶ Stopping ─────┘
///  └──start fails──▶ Dead
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerState {
    /// Constructed, nothing launched yet.
    New,
    /// Workload launched, streams live.
    Running,
    /// Termination requested, `wait` has not observed the exit yet.
    Stopping,
    /// `wait` observed termination.
    Exited,
    /// Launch failed or resources were released without a launch.
    Dead,
}

impl RunnerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunnerState::New => "new",
            RunnerState::Running => "running",
            RunnerState::Stopping => "stopping",
            RunnerState::Exited => "exited",
            RunnerState::Dead => "dead",
        }
    }

    /// Whether a workload was ever launched from this handle.
    pub fn has_launched(&self) -> bool {
        matches!(
            self,
            RunnerState::Running | RunnerState::Stopping | RunnerState::Exited
        )
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, lock-protected [`RunnerState`] with checked transitions.
#[derive(Debug)]
pub struct StateCell(Mutex<RunnerState>);

impl StateCell {
    pub fn new() -> Self {
        Self(Mutex::new(RunnerState::New))
    }

    pub fn get(&self) -> RunnerState {
        *self.lock()
    }

    pub fn set(&self, next: RunnerState) {
        *self.lock() = next;
    }

    /// Move to `next` if the current state is one of `allowed`.
    ///
    /// Returns the previous state on success and the current (unchanged) state on refusal.
    pub fn transition(
        &self,
        allowed: &[RunnerState],
        next: RunnerState,
    ) -> Result<RunnerState, RunnerState> {
        let mut guard = self.lock();
        let current = *guard;
        if allowed.contains(&current) {
            *guard = next;
            Ok(current)
        } else {
            Err(current)
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunnerState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_new() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), RunnerState::New);
        assert!(!cell.get().has_launched());
    }

    #[test]
    fn transition_checks_source_state() {
        let cell = StateCell::new();

        assert_eq!(
            cell.transition(&[RunnerState::New], RunnerState::Running),
            Ok(RunnerState::New)
        );
        assert_eq!(cell.get(), RunnerState::Running);

        assert_eq!(
            cell.transition(&[RunnerState::New], RunnerState::Running),
            Err(RunnerState::Running)
        );

        assert_eq!(
            cell.transition(
                &[RunnerState::Running, RunnerState::Stopping],
                RunnerState::Exited
            ),
            Ok(RunnerState::Running)
        );
        assert!(cell.get().has_launched());
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(RunnerState::Stopping.to_string(), "stopping");
        assert_eq!(RunnerState::Dead.to_string(), "dead");
    }
}
