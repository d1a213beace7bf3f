//! Message enum for Elm Architecture (TEA) pattern.
//!
//! Every user intent is a message; key handling produces them and
//! `App::update()` consumes them.

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // ─────────────────────────────────────────────────────────────────────────
    // App lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    Quit,
    /// Re-fetch the snapshot
    Refresh,

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────
    MoveUp,
    MoveDown,
    GotoTop,
    GotoBottom,
    PageUp,
    PageDown,

    // ─────────────────────────────────────────────────────────────────────────
    // Tab actions (all followed by a re-fetch)
    // ─────────────────────────────────────────────────────────────────────────
    /// Focus the selected tab in the browser
    FocusTab,
    /// Close the selected tab
    CloseTab,
    /// Close every tab with the selected tab's URL
    CloseGroup,
    /// Close the selected tab's duplicates, keeping it
    CloseOthers,

    // ─────────────────────────────────────────────────────────────────────────
    // Search mode
    // ─────────────────────────────────────────────────────────────────────────
    EnterSearch,
    /// Leave search mode and drop the query
    ExitSearch,
    /// Leave search mode and keep the query
    ConfirmSearch,
    SearchInput(char),
    SearchBackspace,
    /// Drop the query without entering search mode
    ClearSearch,

    // ─────────────────────────────────────────────────────────────────────────
    // Modals
    // ─────────────────────────────────────────────────────────────────────────
    ToggleHelp,

    None,
}
