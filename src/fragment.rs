use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{SchemaError, SchemaResult};
use crate::model::{Finding, Moscow, Resolution, Status, TestCoverage};

/// Non-blocking authoring inconsistency found while loading a fragment.
/// Collected into a caller-supplied sink instead of a global logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentWarning {
    pub source_name: String,
    pub message: String,
}

const REQUIRED_FIELDS: [&str; 12] = [
    "schema_version",
    "fragment_id",
    "section_ref",
    "title",
    "requirement_text",
    "moscow",
    "status",
    "implementation",
    "test_coverage",
    "tests",
    "missing_tests",
    "missing_implementation",
];

const ENUM_FIELDS: [(&str, &[&str]); 3] = [
    ("moscow", &Moscow::VALUES),
    ("status", &Status::VALUES),
    ("test_coverage", &TestCoverage::VALUES),
];

/// Check a raw fragment against the schema.
///
/// Returns (errors, warnings). Errors block loading; warnings are
/// authoring inconsistencies that do not. Every problem is collected,
/// never just the first.
pub fn validate_fragment(data: &Value, source_name: &str) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let Some(fields) = data.as_object() else {
        errors.push("fragment is not a JSON object".to_string());
        return (errors, warnings);
    };

    for field_name in REQUIRED_FIELDS {
        if !fields.contains_key(field_name) {
            errors.push(format!("missing required field: {field_name}"));
        }
    }

    if let Some(impl_fields) = fields.get("implementation").and_then(Value::as_object) {
        if !impl_fields.contains_key("files") {
            errors.push("implementation missing required field: files".to_string());
        }
    }

    for (field_name, valid_values) in ENUM_FIELDS {
        if let Some(value) = fields.get(field_name) {
            if !is_valid_enum_value(value, valid_values) {
                errors.push(format!(
                    "invalid {field_name} value: '{}' (valid values: {valid_values:?})",
                    display_value(value)
                ));
            }
        }
    }

    if let Some(value) = fields.get("previous_status") {
        if !value.is_null() && !is_valid_enum_value(value, &Status::VALUES) {
            errors.push(format!(
                "invalid previous_status value: '{}'",
                display_value(value)
            ));
        }
    }

    if let Some(value) = fields.get("resolution") {
        if !value.is_null() && !is_valid_enum_value(value, &Resolution::VALUES) {
            errors.push(format!("invalid resolution value: '{}'", display_value(value)));
        }
    }

    // A fragment's declared id must match the name it was stored under.
    if let Some(fragment_id) = fields.get("fragment_id").and_then(Value::as_str) {
        let stem = Path::new(source_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(source_name);
        if fragment_id != stem {
            errors.push(format!(
                "fragment_id mismatch: '{fragment_id}' does not match filename stem '{stem}'"
            ));
        }
    }

    let status = fields.get("status").and_then(Value::as_str);
    let test_coverage = fields.get("test_coverage").and_then(Value::as_str);
    let missing_implementation = non_empty_array(fields.get("missing_implementation"));
    let implementation_files = non_empty_array(
        fields
            .get("implementation")
            .and_then(Value::as_object)
            .and_then(|impl_fields| impl_fields.get("files")),
    );
    let missing_tests = non_empty_array(fields.get("missing_tests"));
    let tests = non_empty_array(fields.get("tests"));

    if status == Some("implemented") && missing_implementation {
        warnings.push("status is 'implemented' but missing_implementation is non-empty".to_string());
    }
    if status == Some("not_implemented") && implementation_files {
        warnings.push("status is 'not_implemented' but implementation.files is non-empty".to_string());
    }
    if test_coverage == Some("full") && missing_tests {
        warnings.push("test_coverage is 'full' but missing_tests is non-empty".to_string());
    }
    if test_coverage == Some("none") && tests {
        warnings.push("test_coverage is 'none' but tests is non-empty".to_string());
    }

    (errors, warnings)
}

fn is_valid_enum_value(value: &Value, valid_values: &[&str]) -> bool {
    value
        .as_str()
        .is_some_and(|value| valid_values.contains(&value))
}

fn display_value(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

fn non_empty_array(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty())
}

/// Read a fragment JSON file, validate it, and return the typed finding.
///
/// Fails with a `SchemaError` on unreadable or malformed files and on any
/// hard validation error (all of them folded into one message). Warnings
/// go into the sink and the record loads with its stated values.
pub fn load_fragment(path: &Path, warnings: &mut Vec<FragmentWarning>) -> SchemaResult<Finding> {
    let source_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| path.display().to_string());

    let text = fs::read_to_string(path).map_err(|err| SchemaError::Io {
        path: path.display().to_string(),
        detail: err.to_string(),
    })?;

    let data: Value = serde_json::from_str(&text).map_err(|err| SchemaError::MalformedFragment {
        source_name: source_name.clone(),
        detail: err.to_string(),
    })?;

    let (errors, fragment_warnings) = validate_fragment(&data, &source_name);
    if !errors.is_empty() {
        let details = errors
            .iter()
            .map(|error| format!("  - {error}"))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(SchemaError::InvalidFragment {
            source_name,
            details,
        });
    }

    for message in fragment_warnings {
        warnings.push(FragmentWarning {
            source_name: source_name.clone(),
            message,
        });
    }

    serde_json::from_value(data).map_err(|err| SchemaError::MalformedFragment {
        source_name,
        detail: err.to_string(),
    })
}

/// List the `*.json` fragment files in a directory, sorted by name.
pub fn discover_fragments(dir: &Path) -> SchemaResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|err| SchemaError::Io {
        path: dir.display().to_string(),
        detail: err.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| SchemaError::Io {
            path: dir.display().to_string(),
            detail: err.to_string(),
        })?;
        let path = entry.path();

        let is_json = path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false);

        if is_json {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_fragment() -> Value {
        json!({
            "schema_version": "1.0.0",
            "fragment_id": "02-01-01",
            "section_ref": "\u{a7}2.1.1",
            "title": "Quick Capture: Scan Barcode",
            "requirement_text": "The system MUST allow adding assets by scanning a barcode",
            "moscow": "MUST",
            "status": "partial",
            "implementation": {
                "files": [
                    {"path": "views/capture.rs", "lines": "30-45", "description": "Barcode scan view"}
                ],
                "notes": "Handles QR and Code128 but not EAN-13"
            },
            "test_coverage": "partial",
            "tests": [
                {"path": "tests/capture.rs", "lines": "10-25", "description": "Tests scanning"}
            ],
            "missing_tests": ["EAN-13 format scanning"],
            "missing_implementation": ["EAN-13 barcode format support"],
            "notes": "Mobile optimisation is template-level"
        })
    }

    fn set(mut data: Value, key: &str, value: Value) -> Value {
        data.as_object_mut().unwrap().insert(key.to_string(), value);
        data
    }

    fn remove(mut data: Value, key: &str) -> Value {
        data.as_object_mut().unwrap().remove(key);
        data
    }

    #[test]
    fn valid_fragment_has_no_errors() {
        let (errors, _) = validate_fragment(&valid_fragment(), "02-01-01.json");
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let data = remove(valid_fragment(), "title");
        let (errors, _) = validate_fragment(&data, "02-01-01.json");
        assert!(errors.iter().any(|error| error.contains("title")));
    }

    #[test]
    fn missing_schema_version_is_an_error() {
        let data = remove(valid_fragment(), "schema_version");
        let (errors, _) = validate_fragment(&data, "02-01-01.json");
        assert!(errors.iter().any(|error| error.contains("schema_version")));
    }

    #[test]
    fn invalid_status_value_is_an_error() {
        let data = set(valid_fragment(), "status", json!("banana"));
        let (errors, _) = validate_fragment(&data, "02-01-01.json");
        assert!(errors.iter().any(|error| error.contains("status")));
    }

    #[test]
    fn invalid_moscow_value_is_an_error() {
        let data = set(valid_fragment(), "moscow", json!("MAYBE"));
        let (errors, _) = validate_fragment(&data, "02-01-01.json");
        assert!(errors.iter().any(|error| error.contains("moscow")));
    }

    #[test]
    fn invalid_test_coverage_value_is_an_error() {
        let data = set(valid_fragment(), "test_coverage", json!("excellent"));
        let (errors, _) = validate_fragment(&data, "02-01-01.json");
        assert!(errors.iter().any(|error| error.contains("test_coverage")));
    }

    #[test]
    fn invalid_previous_status_is_an_error_but_null_is_not() {
        let data = set(valid_fragment(), "previous_status", json!("banana"));
        let (errors, _) = validate_fragment(&data, "02-01-01.json");
        assert!(errors.iter().any(|error| error.contains("previous_status")));

        let data = set(valid_fragment(), "previous_status", Value::Null);
        let (errors, _) = validate_fragment(&data, "02-01-01.json");
        assert!(errors.is_empty());
    }

    #[test]
    fn invalid_resolution_is_an_error() {
        let data = set(valid_fragment(), "resolution", json!("wontfix"));
        let (errors, _) = validate_fragment(&data, "02-01-01.json");
        assert!(errors.iter().any(|error| error.contains("resolution")));
    }

    #[test]
    fn fragment_id_must_match_filename_stem() {
        let (errors, _) = validate_fragment(&valid_fragment(), "99-99-99.json");
        assert!(errors.iter().any(|error| error.contains("mismatch")));
    }

    #[test]
    fn fragment_id_matching_stem_passes() {
        let data = set(valid_fragment(), "fragment_id", json!("03-02"));
        let (errors, _) = validate_fragment(&data, "03-02.json");
        assert!(!errors.iter().any(|error| error.contains("mismatch")));
    }

    #[test]
    fn implementation_without_files_is_an_error() {
        let data = set(valid_fragment(), "implementation", json!({"notes": "no files key"}));
        let (errors, _) = validate_fragment(&data, "02-01-01.json");
        assert!(errors.iter().any(|error| error.contains("files")));
    }

    #[test]
    fn non_object_fragment_is_an_error() {
        let (errors, _) = validate_fragment(&json!(["not", "a", "record"]), "02-01-01.json");
        assert!(errors.iter().any(|error| error.contains("not a JSON object")));
    }

    #[test]
    fn warns_when_implemented_with_missing_implementation() {
        let data = set(valid_fragment(), "status", json!("implemented"));
        let (_, warnings) = validate_fragment(&data, "02-01-01.json");
        assert!(warnings.iter().any(|warning| warning.contains("missing_implementation")));
    }

    #[test]
    fn warns_when_not_implemented_with_files() {
        let data = set(valid_fragment(), "status", json!("not_implemented"));
        let (_, warnings) = validate_fragment(&data, "02-01-01.json");
        assert!(warnings.iter().any(|warning| warning.contains("implementation.files")));
    }

    #[test]
    fn warns_when_full_coverage_with_missing_tests() {
        let data = set(valid_fragment(), "test_coverage", json!("full"));
        let (_, warnings) = validate_fragment(&data, "02-01-01.json");
        assert!(warnings.iter().any(|warning| warning.contains("missing_tests")));
    }

    #[test]
    fn warns_when_none_coverage_with_tests() {
        let data = set(valid_fragment(), "test_coverage", json!("none"));
        let (_, warnings) = validate_fragment(&data, "02-01-01.json");
        assert!(warnings.iter().any(|warning| warning.contains("tests is non-empty")));
    }

    #[test]
    fn load_valid_fragment_builds_finding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("02-01-01.json");
        fs::write(&path, valid_fragment().to_string()).unwrap();

        let mut warnings = Vec::new();
        let finding = load_fragment(&path, &mut warnings).unwrap();
        assert_eq!(finding.fragment_id, "02-01-01");
        assert_eq!(finding.moscow, Moscow::Must);
        assert_eq!(finding.status, Status::Partial);
        assert_eq!(finding.implementation.files.len(), 1);
        assert_eq!(finding.implementation.files[0].path, "views/capture.rs");
        assert!(warnings.is_empty());
    }

    #[test]
    fn load_fails_on_missing_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("02-01-01.json");
        fs::write(&path, remove(valid_fragment(), "title").to_string()).unwrap();

        let mut warnings = Vec::new();
        let err = load_fragment(&path, &mut warnings).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFragment { .. }));
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn load_fails_on_invalid_enum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("02-01-01.json");
        fs::write(&path, set(valid_fragment(), "status", json!("banana")).to_string()).unwrap();

        let mut warnings = Vec::new();
        assert!(load_fragment(&path, &mut warnings).is_err());
    }

    #[test]
    fn load_fails_on_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("02-01-01.json");
        fs::write(&path, "not json").unwrap();

        let mut warnings = Vec::new();
        let err = load_fragment(&path, &mut warnings).unwrap_err();
        assert!(matches!(err, SchemaError::MalformedFragment { .. }));
    }

    #[test]
    fn load_keeps_reverification_fields() {
        let data = set(
            set(valid_fragment(), "previous_status", json!("not_implemented")),
            "resolution",
            json!("fixed"),
        );
        let data = set(data, "v_item_id", json!("V3"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("02-01-01.json");
        fs::write(&path, data.to_string()).unwrap();

        let mut warnings = Vec::new();
        let finding = load_fragment(&path, &mut warnings).unwrap();
        assert_eq!(finding.v_item_id, "V3");
        assert_eq!(finding.previous_status, Some(Status::NotImplemented));
        assert_eq!(finding.resolution, Some(Resolution::Fixed));
    }

    #[test]
    fn load_reports_warnings_with_source_name() {
        let data = set(valid_fragment(), "status", json!("implemented"));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("02-01-01.json");
        fs::write(&path, data.to_string()).unwrap();

        let mut warnings = Vec::new();
        let finding = load_fragment(&path, &mut warnings).unwrap();
        assert_eq!(finding.status, Status::Implemented);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].source_name, "02-01-01.json");
        assert!(warnings[0].message.contains("missing_implementation"));
    }

    #[test]
    fn discover_fragments_lists_json_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("02-01.json"), "{}").unwrap();
        fs::write(dir.path().join("01-01.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let paths = discover_fragments(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|path| path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["01-01.json", "02-01.json"]);
    }
}
