// Copyright 2025 Chisomo Makombo Sakala
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Error taxonomy for the deployment orchestrator.
///
/// Every failure is reported synchronously to the caller; nothing in this
/// crate retries. The CLI edge converts these into a logged failure and a
/// non-zero exit status.
#[derive(Error, Debug)]
pub enum DeployError {
  /// A required field is missing or blank, or caller-supplied JSON does not
  /// parse. Always raised before any process is spawned or file written.
  #[error("invalid {field}: {reason}")]
  Validation { field: &'static str, reason: String },

  /// The resolved script path does not exist or is a directory.
  #[error("script not found: {path}")]
  ScriptNotFound { path: PathBuf },

  /// The OS could not spawn the process at all. Distinct from a non-zero
  /// exit of a process that did run.
  #[error("failed to spawn script {path}")]
  ProcessExecution {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The script ran to completion but returned the wrong exit code. An
  /// ordinary failure, reported with the actual code.
  #[error("script {path} exited with code {actual}, expected {expected}")]
  UnexpectedExitCode {
    path: PathBuf,
    actual: i32,
    expected: i32,
  },

  /// The script did not finish within the configured limit. The child has
  /// been killed by the time this is returned.
  #[error("script {path} did not finish within {limit:?}")]
  Timeout { path: PathBuf, limit: Duration },

  /// The script exited successfully but never wrote the result file it was
  /// expected to produce. A contract violation by the script, not a crash.
  #[error("script did not produce result file {path}")]
  ResultFileMissing { path: PathBuf },

  /// The result file exists but is not valid JSON of the expected shape.
  #[error("result file {path} is not {expected}: {reason}")]
  MalformedResult {
    path: PathBuf,
    expected: &'static str,
    reason: String,
  },

  /// Filesystem failure outside the cases above (e.g. writing the build
  /// instructions file).
  #[error("I/O error on {path}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

pub type Result<T> = std::result::Result<T, DeployError>;

impl DeployError {
  pub(crate) fn blank(field: &'static str) -> Self {
    DeployError::Validation {
      field,
      reason: "must not be blank".to_string(),
    }
  }
}
