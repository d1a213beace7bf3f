use crate::config::Config;
use crate::data::{AggregatedTab, Snapshot, TabId};
use crate::panel::{run_operation, Operation, Panel, TabAction};
use crate::sources::{SourceError, TabSource};
use crate::util::send_or_log;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Braille spinner frames for loading animation
pub const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Rows moved by PageUp/PageDown
pub const PAGE_STEP: usize = 10;

pub struct App {
    pub config: Arc<Config>,
    pub panel: Panel,
    pub selected: usize,
    pub search_mode: bool,
    pub show_help: bool,
    pub spinner_frame: usize,

    /// Result of the operation running in the background, if any
    pending_rx: Option<mpsc::Receiver<Result<Snapshot, SourceError>>>,
}

impl App {
    pub fn new(config: Config, source: Arc<dyn TabSource>) -> Self {
        Self {
            config: Arc::new(config),
            panel: Panel::new(source),
            selected: 0,
            search_mode: false,
            show_help: false,
            spinner_frame: 0,
            pending_rx: None,
        }
    }

    /// Process a message and update app state (Elm Architecture update function).
    ///
    /// Returns `true` if the app should quit.
    pub fn update(&mut self, msg: super::Message) -> bool {
        use super::Message;
        match msg {
            Message::Quit => return true,
            Message::Refresh => self.start_operation(Operation::Refresh),

            Message::MoveUp => self.move_selection(-1),
            Message::MoveDown => self.move_selection(1),
            Message::GotoTop => self.selected = 0,
            Message::GotoBottom => self.selected = self.panel.visible().len().saturating_sub(1),
            Message::PageUp => self.move_selection(-(PAGE_STEP as i64)),
            Message::PageDown => self.move_selection(PAGE_STEP as i64),

            Message::FocusTab => self.act_on_selected(|agg| TabAction::Focus(agg.id())),
            Message::CloseTab => self.act_on_selected(|agg| TabAction::Close(agg.id())),
            Message::CloseGroup => self.act_on_selected(TabAction::close_group),
            Message::CloseOthers => {
                if self.selected_tab().is_some_and(|agg| agg.is_duplicated()) {
                    self.act_on_selected(TabAction::close_others);
                }
            }

            Message::EnterSearch => self.search_mode = true,
            Message::ExitSearch => {
                self.search_mode = false;
                self.set_query(String::new());
            }
            Message::ConfirmSearch => self.search_mode = false,
            Message::SearchInput(c) => {
                let mut query = self.panel.query().to_string();
                query.push(c);
                self.set_query(query);
            }
            Message::SearchBackspace => {
                let mut query = self.panel.query().to_string();
                query.pop();
                self.set_query(query);
            }
            Message::ClearSearch => self.set_query(String::new()),

            Message::ToggleHelp => self.show_help = !self.show_help,

            Message::None => {}
        }
        false
    }

    pub fn selected_tab(&self) -> Option<&AggregatedTab> {
        self.panel.visible().get(self.selected)
    }

    pub fn is_loading(&self) -> bool {
        self.panel.is_busy()
    }

    /// Advance spinner frame (call on tick while loading)
    pub fn tick_spinner(&mut self) {
        if self.is_loading() {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn spinner_char(&self) -> char {
        SPINNER_FRAMES[self.spinner_frame]
    }

    fn act_on_selected(&mut self, make: impl FnOnce(&AggregatedTab) -> TabAction) {
        let Some(action) = self.selected_tab().map(make) else {
            return;
        };
        self.start_operation(Operation::Action(action));
    }

    /// Run `op` on a background task. Ignored while another one is in flight.
    pub fn start_operation(&mut self, op: Operation) {
        let op = self.panel.resolve(op);
        if !self.panel.begin(op.clone()) {
            return;
        }

        let (tx, rx) = mpsc::channel(1);
        self.pending_rx = Some(rx);

        let source = self.panel.source();
        tokio::spawn(async move {
            let result = run_operation(source.as_ref(), &op).await;
            send_or_log(&tx, result, "operation result").await;
        });
    }

    /// Poll for the background operation's result (non-blocking, call from
    /// event loop tick). Returns true when an operation completed.
    pub fn poll_pending(&mut self) -> bool {
        let Some(mut rx) = self.pending_rx.take() else {
            return false;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => {
                self.pending_rx = Some(rx);
                return false;
            }
            Err(TryRecvError::Disconnected) => Err(SourceError::Transport(
                "background task ended without a result".to_string(),
            )),
        };

        self.complete(result);
        true
    }

    /// Hand an operation result to the panel and keep the selection on the
    /// same tab when it is still visible.
    pub fn complete(&mut self, result: Result<Snapshot, SourceError>) {
        let previous = self.selected_tab().map(|a| a.id());
        // The panel keeps the error for the status bar
        let _ = self.panel.finish(result);
        self.reselect(previous);
    }

    fn set_query(&mut self, query: String) {
        let previous = self.selected_tab().map(|a| a.id());
        self.panel.set_query(query);
        self.reselect(previous);
    }

    fn reselect(&mut self, previous: Option<TabId>) {
        let visible = self.panel.visible();
        if let Some(idx) = previous.and_then(|id| visible.iter().position(|a| a.id() == id)) {
            self.selected = idx;
        } else {
            self.selected = self.selected.min(visible.len().saturating_sub(1));
        }
    }

    pub fn move_selection(&mut self, delta: i64) {
        let len = self.panel.visible().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let target = (self.selected as i64 + delta).clamp(0, len as i64 - 1);
        self.selected = target as usize;
    }
}
