//! Element selection and heuristic field extraction for web pages
//!
//! Turns clicks on a parsed page into typed record fields:
//! - Value extraction per field kind (image URL, title, description, price, generic)
//! - Selector generation for clicked elements
//! - Selection sessions with hover/selected highlights
//! - Template mode: container inference, structural similarity and replication
//!   of one card's bindings across its siblings, with deduplication
//! - Record store and JSON/CSV export
//! - FFI interface exchanging JSON

pub mod config;
pub mod container;
pub mod dom;
pub mod engine;
pub mod error;
pub mod export;
pub mod extractors;
pub mod ffi;
pub mod highlight;
pub mod logging;
pub mod model;
pub mod replicator;
pub mod selector;
pub mod session;
pub mod similarity;
pub mod store;
pub mod style;

pub use config::EngineConfig;
pub use container::{find_container, ContainerCandidate};
pub use engine::{ClickOutcome, HostCommand, HostEvent, PageEngine};
pub use error::{ConfigError, ExportError, StoreError};
pub use extractors::{extract_value, PricePatterns, ValueExtractor};
pub use model::{ExtractionMode, FieldKind, Record, RecordDraft, RecordPatch};
pub use replicator::{TemplateBindings, TemplateReplicator};
pub use selector::generate_selector;
pub use similarity::is_similar;
pub use store::{MemoryRecordStore, RecordStats, RecordStore};
