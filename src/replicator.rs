//! Template replication
//!
//! A template is a set of field bindings made on one card of a list. The
//! replicator finds the card's sibling containers, re-locates each bound field
//! inside every sibling, extracts the values and emits one draft record per
//! container, skipping empty and duplicate drafts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ContainerConfig, EngineConfig, SimilarityThresholds};
use crate::container::{find_container, ContainerCandidate};
use crate::dom::{contains, parse_selector, query_all, query_first, tag_name};
use crate::extractors::ValueExtractor;
use crate::model::{is_duplicate, FieldKind, RecordDraft};
use crate::selector::last_compound;
use crate::similarity::is_similar;

/// One bound field: the clicked exemplar, its selector and the value it gave.
#[derive(Debug, Clone)]
pub struct TemplateBinding<'a> {
    pub exemplar: ElementRef<'a>,
    pub selector: String,
    pub last_value: String,
}

/// Persistable form of a binding: the selector without the live element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSpec {
    pub field: FieldKind,
    pub selector: String,
}

/// Field bindings of one template pass, at most one per field kind.
#[derive(Debug, Clone, Default)]
pub struct TemplateBindings<'a> {
    bindings: BTreeMap<FieldKind, TemplateBinding<'a>>,
}

impl<'a> TemplateBindings<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-locate exemplars from persisted selectors on a freshly parsed page.
    ///
    /// Specs whose selector is invalid or matches nothing are skipped.
    pub fn from_selectors(
        document: &'a Html,
        specs: &[BindingSpec],
        extractor: &ValueExtractor,
    ) -> Self {
        let mut bindings = Self::new();
        for spec in specs {
            let selector = match parse_selector(&spec.selector) {
                Ok(selector) => selector,
                Err(err) => {
                    debug!(field = %spec.field, error = %err, "skipping binding");
                    continue;
                }
            };
            let Some(exemplar) = document.select(&selector).next() else {
                debug!(field = %spec.field, selector = %spec.selector, "binding matches nothing");
                continue;
            };
            let last_value = extractor.extract(&exemplar, spec.field);
            bindings.bind(
                spec.field,
                TemplateBinding {
                    exemplar,
                    selector: spec.selector.clone(),
                    last_value,
                },
            );
        }
        bindings
    }

    /// Bind a field, replacing an earlier binding of the same kind.
    pub fn bind(&mut self, kind: FieldKind, binding: TemplateBinding<'a>) {
        self.bindings.insert(kind, binding);
    }

    pub fn get(&self, kind: FieldKind) -> Option<&TemplateBinding<'a>> {
        self.bindings.get(&kind)
    }

    /// First bound field in canonical order (image, title, description, price, generic).
    pub fn first(&self) -> Option<(FieldKind, &TemplateBinding<'a>)> {
        self.bindings.iter().next().map(|(kind, binding)| (*kind, binding))
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKind, &TemplateBinding<'a>)> {
        self.bindings.iter().map(|(kind, binding)| (*kind, binding))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Selectors only, for persisting the template.
    pub fn specs(&self) -> Vec<BindingSpec> {
        self.iter()
            .map(|(field, binding)| BindingSpec {
                field,
                selector: binding.selector.clone(),
            })
            .collect()
    }

    /// Draft made of the bound values, i.e. the exemplar's own record.
    pub fn exemplar_draft(&self, url: &str, timestamp: DateTime<Utc>) -> RecordDraft {
        let mut draft = RecordDraft::new(url, timestamp);
        for (kind, binding) in self.iter() {
            if !binding.last_value.trim().is_empty() {
                draft.set(kind, binding.last_value.clone());
            }
        }
        draft
    }
}

/// Outcome of one replication pass.
#[derive(Debug, Clone, Default)]
pub struct Replication<'a> {
    /// Kept drafts in container order.
    pub records: Vec<RecordDraft>,
    /// Elements that produced a value of a kept draft.
    pub matched: Vec<ElementRef<'a>>,
    /// Container inferred from the first binding.
    pub container: Option<ContainerCandidate<'a>>,
}

/// Replays template bindings across sibling containers.
#[derive(Debug, Clone, Copy)]
pub struct TemplateReplicator<'e> {
    extractor: &'e ValueExtractor,
    container: &'e ContainerConfig,
    thresholds: &'e SimilarityThresholds,
}

impl<'e> TemplateReplicator<'e> {
    pub fn new(extractor: &'e ValueExtractor, config: &'e EngineConfig) -> Self {
        Self {
            extractor,
            container: &config.container,
            thresholds: &config.similarity,
        }
    }

    /// Run one pass. `seen` holds drafts already extracted this session;
    /// nothing duplicating them (or each other) is emitted.
    pub fn replicate<'a>(
        &self,
        bindings: &TemplateBindings<'a>,
        seen: &[RecordDraft],
        url: &str,
        timestamp: DateTime<Utc>,
    ) -> Replication<'a> {
        let Some((first_kind, first)) = bindings.first() else {
            debug!("no bindings, nothing to replicate");
            return Replication::default();
        };

        let container = find_container(&first.exemplar, self.container);
        let exemplars: Vec<ElementRef<'a>> = bindings.iter().map(|(_, b)| b.exemplar).collect();

        let mut memory = seen.to_vec();
        let own = bindings.exemplar_draft(url, timestamp);
        if own.has_content() {
            memory.push(own);
        }

        let mut records = Vec::new();
        let mut matched = Vec::new();

        for sibling in &container.siblings {
            if exemplars.iter().any(|exemplar| contains(sibling, exemplar)) {
                continue;
            }

            let mut draft = RecordDraft::new(url, timestamp);
            let mut used = Vec::new();
            for (kind, binding) in bindings.iter() {
                let Some(element) = self.locate(sibling, binding) else {
                    debug!(field = %kind, "no match in container");
                    continue;
                };
                let value = self.extractor.extract(&element, kind);
                if value.trim().is_empty() {
                    debug!(field = %kind, "empty value in container");
                    continue;
                }
                draft.set(kind, value);
                used.push(element);
            }

            if !draft.has_content() {
                continue;
            }
            if is_duplicate(&draft, &memory) {
                debug!(title = ?draft.title, "duplicate draft dropped");
                continue;
            }
            memory.push(draft.clone());
            records.push(draft);
            matched.extend(used);
        }

        info!(
            anchor = %first_kind,
            containers = container.siblings.len(),
            records = records.len(),
            "find similar finished"
        );

        Replication {
            records,
            matched,
            container: Some(container),
        }
    }

    /// Element in `container` playing the role of the binding's exemplar.
    fn locate<'a>(
        &self,
        container: &ElementRef<'a>,
        binding: &TemplateBinding<'a>,
    ) -> Option<ElementRef<'a>> {
        match query_first(container, last_compound(&binding.selector)) {
            Ok(Some(element)) => return Some(element),
            Ok(None) => {}
            Err(err) => debug!(error = %err, "literal lookup failed"),
        }

        let tag = tag_name(&binding.exemplar);
        query_all(container, tag)
            .ok()?
            .into_iter()
            .find(|candidate| is_similar(candidate, &binding.exemplar, self.thresholds))
    }
}
