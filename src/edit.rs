//! Inline title editing

/// Title edit lifecycle for one task.
///
/// `Idle -> Editing` on [`start`](TitleEdit::start); back to `Idle` on a
/// successful [`save`](TitleEdit::save) or on [`cancel`](TitleEdit::cancel).
/// Saving a blank draft keeps the editor open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TitleEdit {
    #[default]
    Idle,
    Editing {
        draft: String,
    },
}

impl TitleEdit {
    /// Open the editor with the current title as draft.
    pub fn start(&mut self, current: &str) {
        *self = TitleEdit::Editing {
            draft: current.to_string(),
        };
    }

    pub fn set_draft(&mut self, value: &str) {
        if let TitleEdit::Editing { draft } = self {
            *draft = value.to_string();
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            TitleEdit::Editing { draft } => Some(draft.as_str()),
            TitleEdit::Idle => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, TitleEdit::Editing { .. })
    }

    /// Trimmed title to persist, closing the editor. `None` when idle or
    /// when the draft is blank.
    pub fn save(&mut self) -> Option<String> {
        let title = self.draft()?.trim().to_string();
        if title.is_empty() {
            return None;
        }
        *self = TitleEdit::Idle;
        Some(title)
    }

    pub fn cancel(&mut self) {
        *self = TitleEdit::Idle;
    }
}
