//! Page engine
//!
//! Owns everything the extraction engine keeps for one loaded page: the
//! selection session, the highlight ledger, template bindings and the drafts
//! already extracted. Host commands come in through [`PageEngine::handle`],
//! pointer gestures through `pointer_over`, `pointer_out` and `click`; both
//! answer with host events.

use std::time::Instant;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::dom::body;
use crate::extractors::ValueExtractor;
use crate::highlight::{Highlights, MarkSnapshot, SIMILAR_CLASS};
use crate::model::{ExtractionMode, FieldKind, RecordDraft};
use crate::replicator::{TemplateBinding, TemplateBindings, TemplateReplicator};
use crate::session::{ExtractedCandidate, SelectionSession, SelectionState};

/// Commands sent by the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostCommand {
    StartSelection { field: FieldKind },
    StopSelection,
    SetMode { mode: ExtractionMode },
    ClearHighlights,
    FindSimilar,
}

/// Events sent back to the host UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    /// Manual mode: one field of the in-progress record.
    FieldExtracted {
        field: FieldKind,
        value: String,
        url: String,
        timestamp: DateTime<Utc>,
        /// Always false; the host verifies records.
        verified: bool,
    },
    /// Template mode: a field bound to an exemplar.
    TemplateFieldBound {
        field: FieldKind,
        value: String,
        selector: String,
    },
    /// Result of a find-similar pass, possibly empty.
    BatchExtracted { records: Vec<RecordDraft> },
}

/// What happened to a click.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClickOutcome {
    /// The page's own click handling must not run.
    pub default_prevented: bool,
    pub events: Vec<HostEvent>,
}

pub struct PageEngine<'a> {
    url: String,
    extractor: ValueExtractor,
    config: EngineConfig,
    mode: ExtractionMode,
    session: SelectionSession<'a>,
    highlights: Highlights<'a>,
    bindings: TemplateBindings<'a>,
    extracted: Vec<RecordDraft>,
}

impl<'a> PageEngine<'a> {
    pub fn new(document: &'a Html, url: impl Into<String>) -> Self {
        Self::with_config(document, url, EngineConfig::default())
    }

    pub fn with_config(document: &'a Html, url: impl Into<String>, config: EngineConfig) -> Self {
        let url = url.into();
        let extractor = ValueExtractor::for_page(&url);
        Self::with_extractor(document, url, config, extractor)
    }

    /// Engine with a custom extractor (extra price patterns, other base URL).
    pub fn with_extractor(
        document: &'a Html,
        url: impl Into<String>,
        config: EngineConfig,
        extractor: ValueExtractor,
    ) -> Self {
        let session = SelectionSession::new(body(document), &config.session);
        Self {
            url: url.into(),
            extractor,
            config,
            mode: ExtractionMode::default(),
            session,
            highlights: Highlights::new(),
            bindings: TemplateBindings::new(),
            extracted: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn selection_state(&self) -> SelectionState {
        self.session.state()
    }

    pub fn session(&self) -> &SelectionSession<'a> {
        &self.session
    }

    pub fn highlights(&self) -> &Highlights<'a> {
        &self.highlights
    }

    /// Ledger of engine classes and styles for the host to mirror.
    pub fn highlight_snapshot(&self) -> Vec<MarkSnapshot> {
        self.highlights.snapshot()
    }

    pub fn bindings(&self) -> &TemplateBindings<'a> {
        &self.bindings
    }

    /// Drafts remembered for deduplication.
    pub fn extracted(&self) -> &[RecordDraft] {
        &self.extracted
    }

    /// Apply a host command.
    pub fn handle(&mut self, command: HostCommand) -> Vec<HostEvent> {
        match command {
            HostCommand::StartSelection { field } => {
                self.session.start(field, &mut self.highlights, Instant::now());
                Vec::new()
            }
            HostCommand::StopSelection => {
                self.session.stop(&mut self.highlights);
                Vec::new()
            }
            HostCommand::SetMode { mode } => {
                info!(?mode, "extraction mode set");
                self.mode = mode;
                Vec::new()
            }
            HostCommand::ClearHighlights => {
                self.clear_highlights();
                Vec::new()
            }
            HostCommand::FindSimilar => self.find_similar(),
        }
    }

    /// Expire the on-page hint.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.session.tick(now)
    }

    pub fn pointer_over(&mut self, element: &ElementRef<'a>) -> bool {
        self.session.pointer_over(element, &mut self.highlights)
    }

    pub fn pointer_out(&mut self, element: &ElementRef<'a>) {
        self.session.pointer_out(element, &mut self.highlights)
    }

    pub fn click(&mut self, element: &ElementRef<'a>) -> ClickOutcome {
        let candidate = self.session.click(
            element,
            &mut self.highlights,
            &self.extractor,
            &self.config.selector,
        );
        match candidate {
            Some(candidate) => ClickOutcome {
                default_prevented: true,
                events: vec![self.commit(candidate)],
            },
            None => ClickOutcome::default(),
        }
    }

    fn commit(&mut self, candidate: ExtractedCandidate<'a>) -> HostEvent {
        let ExtractedCandidate {
            field,
            value,
            selector,
            element,
        } = candidate;

        match self.mode {
            ExtractionMode::Manual => {
                let timestamp = Utc::now();
                if !value.trim().is_empty() {
                    let mut draft = RecordDraft::new(self.url.clone(), timestamp);
                    draft.set(field, value.clone());
                    self.extracted.push(draft);
                }
                HostEvent::FieldExtracted {
                    field,
                    value,
                    url: self.url.clone(),
                    timestamp,
                    verified: false,
                }
            }
            ExtractionMode::Template => {
                self.bindings.bind(
                    field,
                    TemplateBinding {
                        exemplar: element,
                        selector: selector.clone(),
                        last_value: value.clone(),
                    },
                );
                HostEvent::TemplateFieldBound { field, value, selector }
            }
        }
    }

    /// Replay the template across the page. Only valid in template mode with a binding.
    pub fn find_similar(&mut self) -> Vec<HostEvent> {
        if self.mode != ExtractionMode::Template {
            warn!("find similar requires template mode");
            return Vec::new();
        }
        if self.bindings.is_empty() {
            warn!("find similar requires at least one bound field");
            return Vec::new();
        }

        let replication = TemplateReplicator::new(&self.extractor, &self.config).replicate(
            &self.bindings,
            &self.extracted,
            &self.url,
            Utc::now(),
        );
        for element in &replication.matched {
            self.highlights.add_class(element, SIMILAR_CLASS);
        }
        self.extracted.extend(replication.records.iter().cloned());

        vec![HostEvent::BatchExtracted {
            records: replication.records,
        }]
    }

    /// Stop any selection and revert every engine mutation of the page.
    pub fn clear_highlights(&mut self) {
        self.session.stop(&mut self.highlights);
        self.highlights.clear();
        self.bindings.clear();
        self.extracted.clear();
        info!("highlights cleared");
    }

    /// Detach from the page: remove the pointer listeners and revert all marks.
    pub fn teardown(&mut self) {
        self.session.teardown(&mut self.highlights);
        self.clear_highlights();
        info!(url = %self.url, "engine detached");
    }
}
