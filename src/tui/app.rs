use crate::session::{HistoryEntry, Session};

/// Application state for the TUI.
///
/// Owns the session (history, store, LLM components) plus the UI state:
/// input buffers, panel focus, history selection, and the status line.
pub struct App {
    session: Session,
    /// Natural-language query input buffer.
    query_input: String,
    /// Follow-up question input buffer.
    ask_input: String,
    /// Currently focused panel.
    focus: Focus,
    /// Currently selected history index (None if no selection).
    selected_index: Option<usize>,
    /// Scroll offset for the detail view.
    detail_scroll: u16,
    /// One-line status message shown under the content area.
    status: Option<String>,
    /// Set when the user requested quit.
    should_quit: bool,
}

/// Panel focus state for keyboard navigation.
///
/// Determines which panel receives keyboard input and how keys are
/// interpreted. Tab order: query input, history, detail, ask input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Query input bar is focused (typing edits the query buffer).
    QueryInput,
    /// History list is focused (j/k navigation).
    History,
    /// Detail panel is focused (j/k scrolling).
    Detail,
    /// Follow-up input bar is focused (typing edits the question buffer).
    AskInput,
}

impl App {
    /// Creates a new App over the given session. Initial focus is the query
    /// input, with no selection and empty buffers.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            query_input: String::new(),
            ask_input: String::new(),
            focus: Focus::QueryInput,
            selected_index: None,
            detail_scroll: 0,
            status: None,
            should_quit: false,
        }
    }

    /// Returns the session history, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        self.session.history()
    }

    /// Returns the query input buffer.
    pub fn query_input(&self) -> &str {
        &self.query_input
    }

    /// Returns the follow-up input buffer.
    pub fn ask_input(&self) -> &str {
        &self.ask_input
    }

    /// Returns the current focus state.
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Returns the currently selected history index.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    /// Returns the currently selected history entry, if any.
    pub fn selected_entry(&self) -> Option<&HistoryEntry> {
        self.selected_index.and_then(|i| self.session.history().get(i))
    }

    /// Returns the current status message, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Returns true when the user has requested quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Marks the application for shutdown.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Cycles focus to the next panel in Tab order.
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::QueryInput => Focus::History,
            Focus::History => Focus::Detail,
            Focus::Detail => Focus::AskInput,
            Focus::AskInput => Focus::QueryInput,
        };
        self.auto_select_on_history_focus();
    }

    /// Cycles focus to the previous panel in reverse Tab order.
    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            Focus::QueryInput => Focus::AskInput,
            Focus::History => Focus::QueryInput,
            Focus::Detail => Focus::History,
            Focus::AskInput => Focus::Detail,
        };
        self.auto_select_on_history_focus();
    }

    /// Auto-selects the newest entry when entering the history panel with no
    /// selection.
    fn auto_select_on_history_focus(&mut self) {
        if self.focus == Focus::History
            && self.selected_index.is_none()
            && !self.session.history().is_empty()
        {
            self.selected_index = Some(self.session.history().len() - 1);
        }
    }

    /// Returns focus to the query input and clears the selection (Esc).
    pub fn reset_focus(&mut self) {
        self.focus = Focus::QueryInput;
        self.selected_index = None;
    }

    /// Appends a character to whichever input bar is focused.
    pub fn push_input_char(&mut self, c: char) {
        match self.focus {
            Focus::QueryInput => self.query_input.push(c),
            Focus::AskInput => self.ask_input.push(c),
            Focus::History | Focus::Detail => {}
        }
    }

    /// Removes the last character from the focused input bar.
    pub fn pop_input_char(&mut self) {
        match self.focus {
            Focus::QueryInput => {
                self.query_input.pop();
            }
            Focus::AskInput => {
                self.ask_input.pop();
            }
            Focus::History | Focus::Detail => {}
        }
    }

    /// Moves selection down the history list, wrapping at the end.
    pub fn select_next(&mut self) {
        let len = self.session.history().len();
        if len == 0 {
            self.selected_index = None;
            return;
        }
        self.selected_index = Some(match self.selected_index {
            None => 0,
            Some(i) => {
                if i + 1 >= len {
                    0
                } else {
                    i + 1
                }
            }
        });
        self.detail_scroll = 0;
    }

    /// Moves selection up the history list, wrapping at the start.
    pub fn select_previous(&mut self) {
        let len = self.session.history().len();
        if len == 0 {
            self.selected_index = None;
            return;
        }
        self.selected_index = Some(match self.selected_index {
            None => len - 1,
            Some(0) => len - 1,
            Some(i) => i - 1,
        });
        self.detail_scroll = 0;
    }

    /// Returns the detail view scroll offset.
    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    /// Scrolls the detail view down.
    pub fn scroll_detail_down(&mut self, amount: u16) {
        self.detail_scroll = self.detail_scroll.saturating_add(amount);
    }

    /// Scrolls the detail view up.
    pub fn scroll_detail_up(&mut self, amount: u16) {
        self.detail_scroll = self.detail_scroll.saturating_sub(amount);
    }

    /// Submits the query buffer through the session pipeline.
    ///
    /// Blocks for the duration of the completion call. Outcome and notices
    /// land in the status line; on success the newest entry is selected.
    pub fn submit_query(&mut self) {
        let question = self.query_input.trim().to_string();
        if question.is_empty() {
            self.status = Some("Please enter a query.".to_string());
            return;
        }

        match self.session.run_query(&question) {
            Ok(outcome) => {
                let mut parts = vec![format!("Added {} result(s)", outcome.added)];
                parts.extend(outcome.notices.iter().map(ToString::to_string));
                self.status = Some(parts.join(" | "));
                self.query_input.clear();
                if outcome.added > 0 {
                    self.selected_index = Some(self.session.history().len() - 1);
                    self.detail_scroll = 0;
                }
            }
            Err(e) => self.status = Some(format!("Query failed: {e:#}")),
        }
    }

    /// Submits the follow-up buffer against the accumulated observations.
    pub fn submit_ask(&mut self) {
        let question = self.ask_input.trim().to_string();
        if question.is_empty() {
            self.status = Some("Please enter a question.".to_string());
            return;
        }

        let before = self.session.history().len();
        match self.session.ask(&question) {
            Ok(answer) => {
                if self.session.history().len() > before {
                    self.status = Some("Insight added to history.".to_string());
                    self.ask_input.clear();
                    self.selected_index = Some(self.session.history().len() - 1);
                    self.detail_scroll = 0;
                } else {
                    // No observations yet: surface the advisory directly.
                    self.status = Some(answer);
                }
            }
            Err(e) => self.status = Some(format!("Follow-up failed: {e:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::answerer::{FollowupAnswerer, NO_CONTEXT_ADVISORY};
    use crate::completion::{CompletionApi, CompletionRequest, TransportError};
    use crate::dataset::Dataset;
    use crate::extractor::QueryExtractor;
    use crate::models::NdviRecord;
    use crate::store::NdviStore;

    struct MockCompletion {
        response: String,
    }

    impl CompletionApi for MockCompletion {
        fn complete(&self, _request: &CompletionRequest) -> Result<String, TransportError> {
            Ok(self.response.clone())
        }
    }

    fn record(state: &str, month: &str, year: i64) -> NdviRecord {
        NdviRecord {
            state: state.to_string(),
            month: month.to_string(),
            year,
            ndvi_value: 0.5,
            temperature: 30.0,
            rainfall: 20.0,
            soilmoisture: 35.0,
            ndvi_url: format!("https://example.com/{state}.png"),
        }
    }

    fn test_app(extract_response: &str, answer_response: &str) -> App {
        let extract_mock = Arc::new(MockCompletion {
            response: extract_response.to_string(),
        });
        let answer_mock = Arc::new(MockCompletion {
            response: answer_response.to_string(),
        });

        let dataset = Dataset::from_records(vec![record("kerala", "March", 2025)]);
        let mut store = NdviStore::in_memory().unwrap();
        store.import_dataset(&dataset).unwrap();

        App::new(Session::new(
            QueryExtractor::new(extract_mock, "sonar"),
            FollowupAnswerer::new(answer_mock, "sonar-reasoning"),
            store,
            dataset,
        ))
    }

    fn app_with_selectors() -> App {
        test_app(
            r#"[{"state": "kerala", "month": "March", "year": 2025}]"#,
            "Answer: Steady greening.",
        )
    }

    #[test]
    fn app_initializes_with_default_state() {
        let app = app_with_selectors();
        assert!(app.history().is_empty());
        assert_eq!(app.selected_index(), None);
        assert_eq!(app.query_input(), "");
        assert_eq!(app.ask_input(), "");
        assert_eq!(app.focus(), Focus::QueryInput);
        assert!(!app.should_quit());
    }

    #[test]
    fn focus_cycles_in_tab_order() {
        let mut app = app_with_selectors();
        assert_eq!(app.focus(), Focus::QueryInput);
        app.next_focus();
        assert_eq!(app.focus(), Focus::History);
        app.next_focus();
        assert_eq!(app.focus(), Focus::Detail);
        app.next_focus();
        assert_eq!(app.focus(), Focus::AskInput);
        app.next_focus();
        assert_eq!(app.focus(), Focus::QueryInput);
    }

    #[test]
    fn focus_cycles_in_reverse_tab_order() {
        let mut app = app_with_selectors();
        app.prev_focus();
        assert_eq!(app.focus(), Focus::AskInput);
        app.prev_focus();
        assert_eq!(app.focus(), Focus::Detail);
        app.prev_focus();
        assert_eq!(app.focus(), Focus::History);
        app.prev_focus();
        assert_eq!(app.focus(), Focus::QueryInput);
    }

    #[test]
    fn typing_targets_focused_input() {
        let mut app = app_with_selectors();
        app.push_input_char('h');
        app.push_input_char('i');
        assert_eq!(app.query_input(), "hi");
        assert_eq!(app.ask_input(), "");

        app.next_focus();
        app.next_focus();
        app.next_focus(); // AskInput
        app.push_input_char('y');
        assert_eq!(app.ask_input(), "y");

        app.pop_input_char();
        assert_eq!(app.ask_input(), "");
    }

    #[test]
    fn submit_query_populates_history_and_selects_newest() {
        let mut app = app_with_selectors();
        for c in "show kerala".chars() {
            app.push_input_char(c);
        }
        app.submit_query();

        assert_eq!(app.history().len(), 1);
        assert_eq!(app.selected_index(), Some(0));
        assert_eq!(app.query_input(), "");
        assert!(app.status().unwrap().contains("Added 1 result(s)"));
    }

    #[test]
    fn submit_query_with_empty_buffer_sets_warning() {
        let mut app = app_with_selectors();
        app.submit_query();
        assert_eq!(app.status(), Some("Please enter a query."));
        assert!(app.history().is_empty());
    }

    #[test]
    fn submit_ask_without_data_reports_advisory_without_insight() {
        let mut app = app_with_selectors();
        app.prev_focus(); // AskInput
        for c in "why?".chars() {
            app.push_input_char(c);
        }
        app.submit_ask();

        // Advisory comes back in the status line; history stays empty
        assert!(app.history().is_empty());
        assert_eq!(app.status(), Some(NO_CONTEXT_ADVISORY));
    }

    #[test]
    fn submit_ask_after_query_appends_insight() {
        let mut app = app_with_selectors();
        for c in "show kerala".chars() {
            app.push_input_char(c);
        }
        app.submit_query();

        app.prev_focus(); // AskInput
        for c in "how green?".chars() {
            app.push_input_char(c);
        }
        app.submit_ask();

        assert_eq!(app.history().len(), 2);
        assert_eq!(app.selected_index(), Some(1));
        assert!(matches!(
            app.selected_entry().unwrap(),
            HistoryEntry::Insight { .. }
        ));
    }

    #[test]
    fn navigation_wraps_through_history() {
        let mut app = app_with_selectors();
        for c in "q".chars() {
            app.push_input_char(c);
        }
        app.submit_query();
        for c in "q".chars() {
            app.push_input_char(c);
        }
        app.submit_query();
        assert_eq!(app.history().len(), 2);

        app.select_next(); // from Some(1) wraps to 0
        assert_eq!(app.selected_index(), Some(0));
        app.select_previous(); // wraps back to 1
        assert_eq!(app.selected_index(), Some(1));
    }

    #[test]
    fn navigation_with_empty_history_does_nothing() {
        let mut app = app_with_selectors();
        app.select_next();
        assert_eq!(app.selected_index(), None);
        app.select_previous();
        assert_eq!(app.selected_index(), None);
    }

    #[test]
    fn entering_history_focus_selects_newest() {
        let mut app = app_with_selectors();
        app.push_input_char('q');
        app.submit_query();
        app.reset_focus();
        assert_eq!(app.selected_index(), None);

        app.next_focus(); // History
        assert_eq!(app.selected_index(), Some(0));
    }

    #[test]
    fn detail_scroll_saturates_at_zero() {
        let mut app = app_with_selectors();
        app.scroll_detail_up(5);
        assert_eq!(app.detail_scroll(), 0);
        app.scroll_detail_down(3);
        assert_eq!(app.detail_scroll(), 3);
    }
}
