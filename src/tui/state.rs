use ratatui::widgets::ListState;
use tokio::sync::watch;

use crate::models::{RecommendationItem, ResultPayload};

use super::controller::ViewController;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestLifecycle {
    #[default]
    Idle,
    Loading,
    /// Settled, whether the request succeeded or not.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitControl {
    pub label: &'static str,
    pub disabled: bool,
}

impl RequestLifecycle {
    pub fn submit_control(self) -> SubmitControl {
        match self {
            RequestLifecycle::Loading => SubmitControl {
                label: "Loading...",
                disabled: true,
            },
            RequestLifecycle::Idle | RequestLifecycle::Done => SubmitControl {
                label: "Get Recommendations",
                disabled: false,
            },
        }
    }
}

/// Everything the view renders from. Published as a whole on every change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub query: String,
    pub lifecycle: RequestLifecycle,
    pub result: Option<ResultPayload>,
    pub info_visible: bool,
}

impl ViewState {
    /// Results stay visible after later failures, whatever the lifecycle.
    pub fn results(&self) -> Option<&ResultPayload> {
        self.result.as_ref()
    }

    pub fn info_panel(&self) -> Option<&ResultPayload> {
        self.results().filter(|_| self.info_visible)
    }

    pub fn info_toggle_label(&self) -> &'static str {
        if self.info_visible {
            "Hide Info"
        } else {
            "Show Info"
        }
    }

    pub fn recommendations(&self) -> &[RecommendationItem] {
        self.results()
            .map(|payload| payload.recommendations.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusArea {
    Input,
    Results,
}

/// Terminal-side shell around the controller: focus, list selection and the
/// latest published snapshot.
pub struct App {
    pub controller: ViewController,
    pub state_rx: watch::Receiver<ViewState>,
    pub view: ViewState,
    pub input: String,
    pub results_state: ListState,
    pub focus: FocusArea,
    pub page_title: String,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        controller: ViewController,
        state_rx: watch::Receiver<ViewState>,
        page_title: impl Into<String>,
    ) -> Self {
        let view = state_rx.borrow().clone();
        Self {
            controller,
            state_rx,
            input: view.query.clone(),
            view,
            results_state: ListState::default(),
            focus: FocusArea::Input,
            page_title: page_title.into(),
            should_quit: false,
        }
    }

    /// Pulls the newest snapshot published by the controller.
    pub fn sync(&mut self) {
        self.view = self.state_rx.borrow_and_update().clone();

        let len = self.view.recommendations().len();
        if len == 0 {
            self.results_state.select(None);
            if self.focus == FocusArea::Results {
                self.focus = FocusArea::Input;
            }
        } else {
            let idx = self.results_state.selected().unwrap_or(0).min(len - 1);
            self.results_state.select(Some(idx));
        }
    }

    pub fn push_char(&mut self, ch: char) {
        self.input.push(ch);
        self.controller.update_query(self.input.clone());
    }

    pub fn pop_char(&mut self) {
        if self.input.pop().is_some() {
            self.controller.update_query(self.input.clone());
        }
    }

    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            FocusArea::Input if self.view.results().is_some() => FocusArea::Results,
            _ => FocusArea::Input,
        };
    }

    pub fn previous_focus(&mut self) {
        self.next_focus();
    }

    pub fn selected_recommendation(&self) -> Option<&RecommendationItem> {
        self.results_state
            .selected()
            .and_then(|idx| self.view.recommendations().get(idx))
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.view.recommendations().len();
        update_list_state(&mut self.results_state, len, delta);
    }
}

fn update_list_state(state: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        state.select(None);
        return;
    }

    let current = state.selected().unwrap_or(0);
    let step = delta.unsigned_abs();
    let new_index = if delta < 0 {
        current.saturating_sub(step)
    } else {
        (current + step).min(len - 1)
    };
    state.select(Some(new_index));
}
