#[cfg(test)]
#[path = "loading_test.rs"]
mod tests;

use super::FragmentKind;

/// Which generation, if any, is running. A single value rather than one flag
/// per kind, so two kinds can never load at once.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadingState {
    #[default]
    Idle,
    Active(FragmentKind),
}

impl LoadingState {
    /// Aggregate flag gating the input box.
    pub fn is_loading(&self) -> bool {
        return *self != LoadingState::Idle;
    }

    pub fn is_active(&self, kind: FragmentKind) -> bool {
        return *self == LoadingState::Active(kind);
    }

    pub fn active_kind(&self) -> Option<FragmentKind> {
        match self {
            LoadingState::Idle => return None,
            LoadingState::Active(kind) => return Some(*kind),
        }
    }

    pub fn label(&self) -> Option<String> {
        return self
            .active_kind()
            .map(|kind| return format!("{}...", kind.loading_label()));
    }
}
