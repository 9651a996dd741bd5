//! Side-channel files shared with the external scripts.
//!
//! The scripts report list results by writing a file with a fixed name into
//! the working directory, and the orchestrator passes deploy instructions the
//! same way. The names are part of the script contract; all callers share
//! this namespace, so concurrent operations against the same build name can
//! race on these paths (callers must serialize, see `DeployService`).

use crate::error::DeployError;
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::path::PathBuf;

/// Written by the provisioning script after a `list` action.
pub const SERVER_LIST_FILE: &str = "server_list.txt";

/// Written by the dataset script after a `list-datasets` action.
pub const DATASETS_LIST_FILE: &str = "datasets_list.txt";

const INSTRUCTIONS_PREFIX: &str = "build_instructions_";

/// The deterministic instructions file name for one build, so the script can
/// locate it from the build name alone.
pub fn instructions_file_name(build_name: &str) -> String {
  format!("{INSTRUCTIONS_PREFIX}{build_name}.json")
}

/// Serializes caller-supplied deploy instructions for the next invocation.
///
/// The JSON is checked before anything touches the filesystem: a corrupt
/// instructions file would otherwise be consumed by the script on its next
/// run. The original service required a JSON object, and so does this one.
/// Returns the path written.
pub fn write_instructions(dir: &Path, build_name: &str, instructions: &str) -> Result<PathBuf> {
  match serde_json::from_str::<Value>(instructions) {
    Ok(Value::Object(_)) => {}
    Ok(other) => {
      return Err(DeployError::Validation {
        field: "build instructions",
        reason: format!("expected a JSON object, got {}", json_kind(&other)),
      });
    }
    Err(err) => {
      return Err(DeployError::Validation {
        field: "build instructions",
        reason: format!("not valid JSON: {err}"),
      });
    }
  }

  let path = dir.join(instructions_file_name(build_name));
  std::fs::write(&path, instructions).map_err(|source| DeployError::Io {
    path: path.clone(),
    source,
  })?;

  tracing::debug!(path = %path.display(), "wrote build instructions");
  Ok(path)
}

/// Reads a result file the script should have produced, concatenating its
/// lines with no separator. Pretty-printed JSON reconstructs into one blob
/// this way; the parser depends on that exact behavior, so keep it.
pub fn read_payload(path: &Path) -> Result<String> {
  let raw = std::fs::read_to_string(path).map_err(|source| {
    if source.kind() == std::io::ErrorKind::NotFound {
      DeployError::ResultFileMissing {
        path: path.to_path_buf(),
      }
    } else {
      DeployError::Io {
        path: path.to_path_buf(),
        source,
      }
    }
  })?;

  Ok(raw.lines().collect())
}

/// Server list as reported by the provisioning script. The current script
/// revision writes an object keyed by server name with usage stats; the
/// legacy revision wrote a bare array of server records. Both are accepted.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerList {
  Stats(serde_json::Map<String, Value>),
  Names(Vec<Value>),
}

/// Parses a server-list payload. Only well-formedness and the outer shape
/// are checked; field meaning is convention between script and consumer.
pub fn parse_server_list(path: &Path, payload: &str) -> Result<ServerList> {
  const EXPECTED: &str = "a JSON object or array";

  let value: Value =
    serde_json::from_str(payload).map_err(|err| malformed(path, EXPECTED, err.to_string()))?;

  match value {
    Value::Object(map) => Ok(ServerList::Stats(map)),
    Value::Array(items) => Ok(ServerList::Names(items)),
    other => Err(malformed(
      path,
      EXPECTED,
      format!("got {}", json_kind(&other)),
    )),
  }
}

/// Parses a dataset-list payload: a JSON array of dataset directory names.
pub fn parse_dataset_list(path: &Path, payload: &str) -> Result<Vec<String>> {
  serde_json::from_str(payload)
    .map_err(|err| malformed(path, "a JSON array of dataset names", err.to_string()))
}

fn malformed(path: &Path, expected: &'static str, reason: String) -> DeployError {
  DeployError::MalformedResult {
    path: path.to_path_buf(),
    expected,
    reason,
  }
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn instructions_round_trip_byte_for_byte() {
    let dir = tempdir().unwrap();
    let payload = r#"{"cpu": 2, "branches": {"pn": "feature-x"}}"#;

    let path = write_instructions(dir.path(), "b1", payload).unwrap();
    assert_eq!(path.file_name().unwrap(), "build_instructions_b1.json");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), payload);
  }

  #[test]
  fn malformed_instructions_leave_no_file_behind() {
    let dir = tempdir().unwrap();

    let err = write_instructions(dir.path(), "b1", "{not json").unwrap_err();
    assert!(matches!(err, DeployError::Validation { .. }));
    assert!(!dir.path().join(instructions_file_name("b1")).exists());
  }

  #[test]
  fn non_object_instructions_are_rejected() {
    let dir = tempdir().unwrap();

    let err = write_instructions(dir.path(), "b1", "[1, 2, 3]").unwrap_err();
    assert!(
      matches!(err, DeployError::Validation { reason, .. } if reason.contains("got an array"))
    );
  }

  #[test]
  fn payload_lines_concatenate_without_separators() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SERVER_LIST_FILE);
    std::fs::write(&path, "{\n  \"vm1\": {\n    \"ip\": \"10.0.0.1\"\n  }\n}\n").unwrap();

    let payload = read_payload(&path).unwrap();
    assert_eq!(payload, r#"{  "vm1": {    "ip": "10.0.0.1"  }}"#);
  }

  #[test]
  fn absent_result_file_is_a_distinct_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SERVER_LIST_FILE);

    let err = read_payload(&path).unwrap_err();
    assert!(matches!(err, DeployError::ResultFileMissing { .. }));
  }

  #[test]
  fn server_list_accepts_both_script_revisions() {
    let path = PathBuf::from(SERVER_LIST_FILE);

    let stats = parse_server_list(&path, r#"{"vm1": {"ip": "10.0.0.1"}}"#).unwrap();
    assert!(matches!(stats, ServerList::Stats(ref m) if m.contains_key("vm1")));

    let names = parse_server_list(&path, r#"[{"name": "vm1"}]"#).unwrap();
    assert!(matches!(names, ServerList::Names(ref items) if items.len() == 1));
  }

  #[test]
  fn server_list_rejects_non_json_and_wrong_shape() {
    let path = PathBuf::from(SERVER_LIST_FILE);

    assert!(matches!(
      parse_server_list(&path, "ERROR: quota exceeded").unwrap_err(),
      DeployError::MalformedResult { .. }
    ));
    assert!(matches!(
      parse_server_list(&path, "42").unwrap_err(),
      DeployError::MalformedResult { .. }
    ));
  }

  #[test]
  fn dataset_list_is_an_array_of_names() {
    let path = PathBuf::from(DATASETS_LIST_FILE);

    let datasets = parse_dataset_list(&path, r#"["cohort-A", "cohort-B"]"#).unwrap();
    assert_eq!(datasets, ["cohort-A", "cohort-B"]);

    assert!(matches!(
      parse_dataset_list(&path, r#"{"cohort-A": true}"#).unwrap_err(),
      DeployError::MalformedResult { .. }
    ));
  }
}
