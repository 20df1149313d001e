use crate::{classifier::LesionLabel, error::ErrorKind, intake::DecodedImage};
use indexmap::IndexMap;
use std::sync::Arc;

/// Per-label "description expanded?" flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelState {
    panels: IndexMap<LesionLabel, bool>,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the entry for `label` if its toggle has never been rendered.
    pub fn register(&mut self, label: LesionLabel) {
        self.panels.entry(label).or_insert(false);
    }

    pub fn is_open(&self, label: LesionLabel) -> bool {
        self.panels.get(&label).copied().unwrap_or(false)
    }

    #[cfg(test)]
    pub fn is_registered(&self, label: LesionLabel) -> bool {
        self.panels.contains_key(&label)
    }

    /// Flips the flag for `label` and returns the new value.
    pub fn toggle(&mut self, label: LesionLabel) -> bool {
        let open = self.panels.entry(label).or_insert(false);
        *open = !*open;
        *open
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn clear(&mut self) {
        self.panels.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error(ErrorKind),
}

/// Message produced by the last interaction, shown once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error(kind),
            message: message.into(),
        }
    }
}

/// Everything one user session owns.
#[derive(Debug)]
pub struct SessionState {
    current_image: Option<Arc<DecodedImage>>,
    panels: PanelState,
    notice: Option<Notice>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            current_image: None,
            panels: PanelState::new(),
            notice: None,
        }
    }

    pub fn current_image(&self) -> Option<&Arc<DecodedImage>> {
        self.current_image.as_ref()
    }

    /// Called at the start of every acquisition attempt.
    pub fn clear_image(&mut self) {
        self.current_image = None;
    }

    pub fn set_image(&mut self, image: DecodedImage) {
        self.current_image = Some(Arc::new(image));
    }

    pub fn panels(&self) -> &PanelState {
        &self.panels
    }

    pub fn panels_mut(&mut self) -> &mut PanelState {
        &mut self.panels
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
