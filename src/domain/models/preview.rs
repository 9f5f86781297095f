#[cfg(test)]
#[path = "preview_test.rs"]
mod tests;

use strum::EnumString;

use super::AttemptId;
use super::ExecutionResult;
use super::Fragment;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Tab {
    Code,
    #[default]
    Fragment,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreviewState {
    pub fragment: Option<Fragment>,
    pub result: Option<ExecutionResult>,
    pub selected_tab: Tab,
    pub visible: bool,
    /// Waiting on the sandbox for `result`. Never gates input.
    pub loading: bool,
    /// Attempt whose fragment is on display, used to route late sandbox results.
    pub attempt: Option<AttemptId>,
}

impl PreviewState {
    pub fn show(
        &mut self,
        fragment: Fragment,
        result: Option<ExecutionResult>,
        tab: Tab,
        attempt: Option<AttemptId>,
    ) {
        self.fragment = Some(fragment);
        self.result = result;
        self.selected_tab = tab;
        self.visible = true;
        self.loading = false;
        self.attempt = attempt;
    }

    pub fn is_showing(&self, attempt: AttemptId) -> bool {
        return self.attempt == Some(attempt);
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    pub fn reset(&mut self) {
        *self = PreviewState::default();
    }

    pub fn is_empty(&self) -> bool {
        return self.fragment.is_none() && self.result.is_none();
    }
}
