//! FFI interface for the host application
//!
//! C-compatible entry points over the extraction engine. Requests and results
//! are exchanged as JSON. Each call parses the page it is given, so element
//! references never cross the boundary; elements are addressed by selector.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use chrono::Utc;
use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::dom::parse_selector;
use crate::export::{render, ExportFormat};
use crate::extractors::ValueExtractor;
use crate::model::{FieldKind, Record, RecordDraft};
use crate::replicator::{BindingSpec, TemplateBindings, TemplateReplicator};
use crate::selector::generate_selector_with;

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_extraction_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if the call failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Request of [`extract_field_ffi`].
#[derive(Debug, Clone, Deserialize)]
pub struct FieldRequest {
    /// Page URL, used to resolve relative image URLs.
    #[serde(default)]
    pub url: Option<String>,
    /// Selector of the clicked element.
    pub selector: String,
    pub field: FieldKind,
    #[serde(default)]
    pub config: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResponse {
    pub field: FieldKind,
    /// `""` when nothing plausible was found.
    pub value: String,
    /// Generated selector of the matched element.
    pub selector: Option<String>,
    pub found: bool,
}

/// Request of [`find_similar_ffi`].
#[derive(Debug, Clone, Deserialize)]
pub struct SimilarRequest {
    pub url: String,
    pub bindings: Vec<BindingSpec>,
    /// Drafts extracted earlier in the session, for deduplication.
    #[serde(default)]
    pub seen: Vec<RecordDraft>,
    #[serde(default)]
    pub config: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarResponse {
    pub records: Vec<RecordDraft>,
    /// Selector of the inferred sibling containers.
    pub container: Option<String>,
    /// Selectors of the elements that produced the records.
    pub matched: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub format: ExportFormat,
    pub content: String,
}

/// Extract one field value from the element matched by a selector.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `request_json` - JSON-serialized FieldRequest (null-terminated)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `request_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn extract_field_ffi(
    html_ptr: *const c_char,
    html_len: usize,
    request_json: *const c_char,
) -> ExtractionResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(html) => html,
        Err(msg) => return make_error_result(msg),
    };
    let request: FieldRequest = match read_request(request_json) {
        Ok(request) => request,
        Err(msg) => return make_error_result(&msg),
    };
    if let Err(e) = request.config.validate() {
        return make_error_result(&e.to_string());
    }
    let selector = match parse_selector(&request.selector) {
        Ok(selector) => selector,
        Err(msg) => return make_error_result(&msg),
    };

    let document = Html::parse_document(&html);
    let extractor = match &request.url {
        Some(url) => ValueExtractor::for_page(url),
        None => ValueExtractor::default(),
    };

    let response = match document.select(&selector).next() {
        Some(element) => FieldResponse {
            field: request.field,
            value: extractor.extract(&element, request.field),
            selector: Some(generate_selector_with(&element, &request.config.selector)),
            found: true,
        },
        None => {
            debug!(selector = %request.selector, "no element for field request");
            FieldResponse {
                field: request.field,
                value: String::new(),
                selector: None,
                found: false,
            }
        }
    };
    json_result(&response)
}

/// Replay template bindings across the page and return the new drafts.
///
/// # Safety
/// Same as extract_field_ffi; `request_json` is a JSON-serialized SimilarRequest
#[no_mangle]
pub unsafe extern "C" fn find_similar_ffi(
    html_ptr: *const c_char,
    html_len: usize,
    request_json: *const c_char,
) -> ExtractionResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(html) => html,
        Err(msg) => return make_error_result(msg),
    };
    let request: SimilarRequest = match read_request(request_json) {
        Ok(request) => request,
        Err(msg) => return make_error_result(&msg),
    };
    if let Err(e) = request.config.validate() {
        return make_error_result(&e.to_string());
    }

    let document = Html::parse_document(&html);
    let extractor = ValueExtractor::for_page(&request.url);
    let bindings = TemplateBindings::from_selectors(&document, &request.bindings, &extractor);
    let replication = TemplateReplicator::new(&extractor, &request.config).replicate(
        &bindings,
        &request.seen,
        &request.url,
        Utc::now(),
    );

    let response = SimilarResponse {
        container: replication.container.as_ref().map(|c| c.selector.clone()),
        matched: replication
            .matched
            .iter()
            .map(|element| generate_selector_with(element, &request.config.selector))
            .collect(),
        records: replication.records,
    };
    json_result(&response)
}

/// Render records as JSON or CSV.
///
/// # Safety
/// - `records_json` must be a valid null-terminated C string holding a JSON array of records
/// - `format` must be null (JSON) or a valid null-terminated C string (`json` or `csv`)
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn export_records_ffi(
    records_json: *const c_char,
    format: *const c_char,
) -> ExtractionResultFFI {
    let records: Vec<Record> = match read_request(records_json) {
        Ok(records) => records,
        Err(msg) => return make_error_result(&msg),
    };
    let format = if format.is_null() {
        ExportFormat::default()
    } else {
        match read_cstr(format).and_then(|s| s.parse::<ExportFormat>()) {
            Ok(format) => format,
            Err(msg) => return make_error_result(&msg),
        }
    };

    match render(&records, format) {
        Ok(content) => json_result(&ExportResponse { format, content }),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Install the log subscriber (stderr, RUST_LOG aware).
#[no_mangle]
pub extern "C" fn init_logging_ffi(verbose: bool) {
    crate::logging::init_logging(verbose);
}

/// Free an ExtractionResultFFI returned by any function of this module
///
/// # Safety
/// - `result` must have been returned by a function of this module
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_extraction_result(result: ExtractionResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn read_html(html_ptr: *const c_char, html_len: usize) -> Result<String, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok(String::new());
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice)
        .map(str::to_string)
        .map_err(|_| "Invalid UTF-8 in HTML content")
}

unsafe fn read_cstr<'s>(ptr: *const c_char) -> Result<&'s str, String> {
    if ptr.is_null() {
        return Err("Argument is null".to_string());
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| "Invalid UTF-8 in argument".to_string())
}

unsafe fn read_request<T: for<'de> Deserialize<'de>>(ptr: *const c_char) -> Result<T, String> {
    let json = read_cstr(ptr)?;
    serde_json::from_str(json).map_err(|e| format!("Failed to parse request JSON: {}", e))
}

fn json_result<T: Serialize>(value: &T) -> ExtractionResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ExtractionResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> ExtractionResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PRODUCTS: &str = r#"
    <div class="grid">
        <div class="product-card">
            <img src="/a.jpg"><h3 class="title">Widget A</h3><span class="price">$10.00</span>
        </div>
        <div class="product-card">
            <img src="/b.jpg"><h3 class="title">Widget B</h3><span class="price">$11.00</span>
        </div>
        <div class="product-card">
            <img src="/c.jpg"><h3 class="title">Widget C</h3><span class="price">$12.00</span>
        </div>
    </div>
    "#;

    /// Call an FFI function and take ownership of its output.
    fn take(result: ExtractionResultFFI) -> Result<String, String> {
        let out = unsafe {
            if result.error_ptr.is_null() {
                Ok(CStr::from_ptr(result.json_ptr).to_string_lossy().into_owned())
            } else {
                Err(CStr::from_ptr(result.error_ptr).to_string_lossy().into_owned())
            }
        };
        unsafe { free_extraction_result(result) };
        out
    }

    fn call_with_html(
        f: unsafe extern "C" fn(*const c_char, usize, *const c_char) -> ExtractionResultFFI,
        html: &str,
        request: &str,
    ) -> Result<String, String> {
        let request = CString::new(request).unwrap();
        take(unsafe { f(html.as_ptr() as *const c_char, html.len(), request.as_ptr()) })
    }

    #[test]
    fn test_extract_field() {
        let json = call_with_html(
            extract_field_ffi,
            PRODUCTS,
            r#"{"url":"https://shop.test/list","selector":".product-card img","field":"image"}"#,
        )
        .unwrap();
        let response: FieldResponse = serde_json::from_str(&json).unwrap();

        assert_eq!(response.value, "https://shop.test/a.jpg");
        assert_eq!(response.selector.as_deref(), Some("div > div:nth-of-type(1) > img"));
        assert!(response.found);
    }

    #[test]
    fn test_extract_field_no_match() {
        let request = r#"{"selector":"table","field":"title"}"#;
        let json = call_with_html(extract_field_ffi, PRODUCTS, request).unwrap();
        let response: FieldResponse = serde_json::from_str(&json).unwrap();

        assert_eq!(response.value, "");
        assert!(!response.found);
    }

    #[test]
    fn test_request_errors() {
        let err = call_with_html(extract_field_ffi, PRODUCTS, "not json").unwrap_err();
        assert!(err.starts_with("Failed to parse request JSON"));

        let request = r#"{"selector":"h3[","field":"title"}"#;
        let err = call_with_html(extract_field_ffi, PRODUCTS, request).unwrap_err();
        assert!(err.starts_with("invalid selector"));

        let bad = [0xffu8, 0xfe];
        let request = CString::new(r#"{"selector":"p","field":"title"}"#).unwrap();
        let html = bad.as_ptr() as *const c_char;
        let result = unsafe { extract_field_ffi(html, bad.len(), request.as_ptr()) };
        let err = take(result).unwrap_err();
        assert_eq!(err, "Invalid UTF-8 in HTML content");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let request = r#"{
            "selector": "h3", "field": "title",
            "config": {"similarity": {"min_class_overlap": 1.5}}
        }"#;
        let err = call_with_html(extract_field_ffi, PRODUCTS, request).unwrap_err();
        assert!(err.starts_with("invalid value for similarity.min_class_overlap"));

        let request = r#"{
            "url": "https://shop.test/list",
            "bindings": [{"field": "title", "selector": "h3.title"}],
            "config": {"selector": {"engine_class_prefix": ""}}
        }"#;
        let err = call_with_html(find_similar_ffi, PRODUCTS, request).unwrap_err();
        assert!(err.starts_with("invalid value for selector.engine_class_prefix"));
    }

    #[test]
    fn test_find_similar() {
        let request = r#"{
            "url": "https://shop.test/list",
            "bindings": [
                {"field": "title", "selector": "h3.title"},
                {"field": "price", "selector": "span.price"}
            ],
            "seen": []
        }"#;
        let json = call_with_html(find_similar_ffi, PRODUCTS, request).unwrap();
        let response: SimilarResponse = serde_json::from_str(&json).unwrap();

        let titles: Vec<_> = response.records.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, vec!["Widget B", "Widget C"]);
        assert_eq!(response.container.as_deref(), Some(".product-card"));
        assert_eq!(response.matched.len(), 4);
    }

    #[test]
    fn test_export_csv() {
        let records = r#"[{
            "id": 1, "url": "https://example.com/1", "title": "Item 1", "description": "",
            "image": "", "price": "$10", "verified": true,
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
        }]"#;
        let records = CString::new(records).unwrap();
        let format = CString::new("csv").unwrap();

        let json =
            take(unsafe { export_records_ffi(records.as_ptr(), format.as_ptr()) }).unwrap();
        let response: ExportResponse = serde_json::from_str(&json).unwrap();

        assert_eq!(response.format, ExportFormat::Csv);
        let row = concat!(
            r#"1,"https://example.com/1","Item 1","","","$10","#,
            r#""Yes","2024-01-01T00:00:00.000Z""#,
        );
        assert_eq!(response.content.lines().nth(1), Some(row));

        let bad_format = CString::new("xml").unwrap();
        let result = unsafe { export_records_ffi(records.as_ptr(), bad_format.as_ptr()) };
        let err = take(result).unwrap_err();
        assert_eq!(err, "unknown export format: xml");
    }
}
