//! Selection session
//!
//! State machine behind "pick a field, hover candidates, click to commit".
//! One session exists per page; only one field is selected at a time and a
//! click ends the selection.

use std::time::{Duration, Instant};

use scraper::ElementRef;
use tracing::debug;

use crate::config::{SelectorConfig, SessionConfig};
use crate::dom::{is_page_root, same_element};
use crate::extractors::ValueExtractor;
use crate::highlight::{Highlights, SELECTED_CLASS, SELECTING_CLASS};
use crate::model::FieldKind;
use crate::selector::generate_selector_with;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Selecting(FieldKind),
}

/// On-page hint shown when a selection starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub text: String,
    pub shown_at: Instant,
}

/// Value picked by a click, with the element it came from.
#[derive(Debug, Clone)]
pub struct ExtractedCandidate<'a> {
    pub field: FieldKind,
    pub value: String,
    pub selector: String,
    pub element: ElementRef<'a>,
}

#[derive(Debug, Clone)]
pub struct SelectionSession<'a> {
    state: SelectionState,
    /// Pointer listeners installed on the page.
    attached: bool,
    hint: Option<Hint>,
    hint_ttl: Duration,
    hovered: Option<ElementRef<'a>>,
    body: Option<ElementRef<'a>>,
}

impl<'a> SelectionSession<'a> {
    /// `body` receives the selecting class while a selection runs.
    pub fn new(body: Option<ElementRef<'a>>, config: &SessionConfig) -> Self {
        Self {
            state: SelectionState::Idle,
            attached: false,
            hint: None,
            hint_ttl: config.hint_ttl(),
            hovered: None,
            body,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.state, SelectionState::Selecting(_))
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn hint(&self) -> Option<&Hint> {
        self.hint.as_ref()
    }

    pub fn hovered(&self) -> Option<ElementRef<'a>> {
        self.hovered
    }

    /// Enter selection mode for `field`, stopping any running selection first.
    pub fn start(&mut self, field: FieldKind, highlights: &mut Highlights<'a>, now: Instant) {
        if self.is_selecting() {
            self.stop(highlights);
        }

        self.state = SelectionState::Selecting(field);
        if let Some(body) = &self.body {
            highlights.add_class(body, SELECTING_CLASS);
        }
        if !self.attached {
            self.attached = true;
            debug!("pointer listeners attached");
        }
        self.hint = Some(Hint {
            text: format!("Click on an element to select {}", field),
            shown_at: now,
        });
        debug!(%field, "selection started");
    }

    /// Leave selection mode. Permanent highlights stay in place.
    pub fn stop(&mut self, highlights: &mut Highlights<'a>) {
        if let Some(hovered) = self.hovered.take() {
            highlights.remove_hover(&hovered);
        }
        if let Some(body) = &self.body {
            highlights.remove_class(body, SELECTING_CLASS);
        }
        self.hint = None;
        if let SelectionState::Selecting(field) = self.state {
            debug!(%field, "selection stopped");
        }
        self.state = SelectionState::Idle;
    }

    /// Stop any running selection and remove the pointer listeners.
    pub fn teardown(&mut self, highlights: &mut Highlights<'a>) {
        self.stop(highlights);
        if self.attached {
            self.attached = false;
            debug!("pointer listeners detached");
        }
    }

    /// Hide the hint once its delay has passed. The selection keeps running.
    pub fn tick(&mut self, now: Instant) -> bool {
        let expired = self
            .hint
            .as_ref()
            .is_some_and(|hint| now.saturating_duration_since(hint.shown_at) >= self.hint_ttl);
        if expired {
            self.hint = None;
        }
        expired
    }

    /// Hover highlight. Returns true if `element` was highlighted.
    pub fn pointer_over(
        &mut self,
        element: &ElementRef<'a>,
        highlights: &mut Highlights<'a>,
    ) -> bool {
        if !self.attached || !self.is_selecting() || is_page_root(element) {
            return false;
        }
        if let Some(previous) = self.hovered.take() {
            if !same_element(&previous, element) {
                highlights.remove_hover(&previous);
            }
        }
        highlights.apply_hover(element);
        self.hovered = Some(*element);
        true
    }

    pub fn pointer_out(&mut self, element: &ElementRef<'a>, highlights: &mut Highlights<'a>) {
        if self.hovered.is_some_and(|hovered| same_element(&hovered, element)) {
            highlights.remove_hover(element);
            self.hovered = None;
        }
    }

    /// Commit a click. `None` when idle, in which case the page keeps the click.
    pub fn click(
        &mut self,
        element: &ElementRef<'a>,
        highlights: &mut Highlights<'a>,
        extractor: &ValueExtractor,
        selectors: &SelectorConfig,
    ) -> Option<ExtractedCandidate<'a>> {
        let SelectionState::Selecting(field) = self.state else {
            return None;
        };
        if !self.attached {
            return None;
        }

        let value = extractor.extract(element, field);
        let selector = generate_selector_with(element, selectors);
        self.stop(highlights);
        highlights.add_class(element, SELECTED_CLASS);
        debug!(%field, %selector, empty = value.is_empty(), "element selected");

        Some(ExtractedCandidate {
            field,
            value,
            selector,
            element: *element,
        })
    }
}
