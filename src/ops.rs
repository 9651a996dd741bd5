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
use crate::error::DeployError;
use crate::error::Result;
use serde::Deserialize;
use serde::Serialize;

/// Which of the two external scripts an operation is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
  /// Provisioning script: deploy / list / delete.
  Provision,
  /// Dataset-loading script: upload-dataset / list-datasets.
  DataLoader,
}

/// Optional per-repository branch overrides forwarded to the deploy action.
///
/// Each role maps to one `--<role> BRANCH` flag; a role that is not set is
/// simply omitted, never emitted as an empty value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchOverrides {
  pub pn: Option<String>,
  pub rm: Option<String>,
  pub pc: Option<String>,
  pub pt: Option<String>,
}

impl BranchOverrides {
  fn flag_pairs(&self) -> [(&'static str, &Option<String>); 4] {
    // Declaration order is the emission order.
    [
      ("--pn", &self.pn),
      ("--rm", &self.rm),
      ("--pc", &self.pc),
      ("--pt", &self.pt),
    ]
  }
}

/// Everything a caller supplies to provision one VM test environment.
///
/// `build_name` is the correlation key for the whole lifecycle: the same
/// name is reused across deploy, list, and delete.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
  pub build_name: String,
  /// Raw JSON object with deploy instructions, passed to the VM untouched.
  pub instructions: String,
  pub branches: BranchOverrides,
  pub project: Option<String>,
}

/// One logical operation against the external scripts, carrying exactly the
/// parameters its command line needs.
#[derive(Debug, Clone)]
pub enum Operation {
  Deploy {
    build_name: String,
    /// Name of the instructions file already written next to the script.
    instructions_file: String,
    branches: BranchOverrides,
    project: Option<String>,
    log_folder: Option<String>,
  },
  ListServers,
  DeleteServer {
    build_name: String,
  },
  UploadDataset {
    ip: String,
    dataset_name: String,
  },
  ListDatasets,
}

impl Operation {
  /// The `--action` value the script dispatches on.
  pub fn action_token(&self) -> &'static str {
    match self {
      Operation::Deploy { .. } => "deploy",
      Operation::ListServers => "list",
      Operation::DeleteServer { .. } => "delete",
      Operation::UploadDataset { .. } => "upload-dataset",
      Operation::ListDatasets => "list-datasets",
    }
  }

  pub fn script_kind(&self) -> ScriptKind {
    match self {
      Operation::Deploy { .. } | Operation::ListServers | Operation::DeleteServer { .. } => {
        ScriptKind::Provision
      }
      Operation::UploadDataset { .. } | Operation::ListDatasets => ScriptKind::DataLoader,
    }
  }

  /// Every action in the current script contract signals success with 0.
  pub fn expected_exit_code(&self) -> i32 {
    0
  }

  /// Builds the ordered argument tokens for this operation.
  ///
  /// Pure: validates and formats only, spawns nothing. The token order is
  /// fixed per operation (`--action` first, then optional flags in
  /// declaration order) so two builds from the same operation are identical.
  /// No shell quoting happens here; that is the invocation strategy's job.
  pub fn argument_tokens(&self) -> Result<Vec<String>> {
    let mut tokens = vec!["--action".to_string(), self.action_token().to_string()];

    match self {
      Operation::Deploy {
        build_name,
        instructions_file,
        branches,
        project,
        log_folder,
      } => {
        for (flag, value) in branches.flag_pairs() {
          push_optional(&mut tokens, flag, value.as_deref())?;
        }
        push_required(&mut tokens, "--build-name", "build name", build_name)?;
        push_required(
          &mut tokens,
          "--build-instructions",
          "build instructions file",
          instructions_file,
        )?;
        push_optional(&mut tokens, "--project", project.as_deref())?;
        push_optional(&mut tokens, "--log-folder", log_folder.as_deref())?;
      }
      Operation::ListServers | Operation::ListDatasets => {}
      Operation::DeleteServer { build_name } => {
        push_required(&mut tokens, "--build-name", "build name", build_name)?;
      }
      Operation::UploadDataset { ip, dataset_name } => {
        push_required(&mut tokens, "--ip", "server ip", ip)?;
        push_required(&mut tokens, "--dataset-name", "dataset name", dataset_name)?;
      }
    }

    Ok(tokens)
  }
}

fn push_required(
  tokens: &mut Vec<String>,
  flag: &str,
  field: &'static str,
  value: &str,
) -> Result<()> {
  if value.trim().is_empty() {
    return Err(DeployError::blank(field));
  }
  tokens.push(flag.to_string());
  tokens.push(value.to_string());
  Ok(())
}

/// Appends `flag value` when the value is present. A present-but-blank value
/// is a caller mistake, rejected rather than silently dropped.
fn push_optional(tokens: &mut Vec<String>, flag: &'static str, value: Option<&str>) -> Result<()> {
  match value {
    None => Ok(()),
    Some(v) if v.trim().is_empty() => Err(DeployError::Validation {
      field: flag,
      reason: "must not be blank when provided".to_string(),
    }),
    Some(v) => {
      tokens.push(flag.to_string());
      tokens.push(v.to_string());
      Ok(())
    }
  }
}
