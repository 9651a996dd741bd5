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
use crate::channel;
use crate::channel::ServerList;
use crate::config::Config;
use crate::error::DeployError;
use crate::error::Result;
use crate::ops::DeploymentRequest;
use crate::ops::Operation;
use crate::runner::CommandInvocation;
use crate::runner::ExecutionOutcome;
use crate::runner::Platform;
use crate::runner::ScriptRunner;
use crate::runner::ShellRunner;
use tracing::Instrument;

/// The five deployment operations, sequenced as build arguments, run the
/// script, then read and parse whatever result file the operation expects.
///
/// Each call is one linear pipeline; the first failing step short-circuits
/// the rest. A written instructions file is deliberately left in place when
/// a later step fails, for post-mortem inspection.
///
/// The side-channel files live under one fixed-name namespace shared by every
/// caller, so concurrent operations against the same build name can race on
/// them; callers needing that must serialize per build name themselves.
pub struct DeployService<R: ScriptRunner> {
  config: Config,
  platform: Platform,
  runner: R,
}

impl DeployService<ShellRunner> {
  /// Production wiring: the real shell runner with the configured timeout,
  /// on the platform probed at startup.
  pub fn from_config(config: Config) -> Self {
    let runner = ShellRunner::new(config.timeout());
    DeployService::with_runner(config, runner)
  }
}

impl<R: ScriptRunner> DeployService<R> {
  pub fn with_runner(config: Config, runner: R) -> Self {
    DeployService {
      config,
      platform: Platform::current(),
      runner,
    }
  }

  /// Provisions a new VM for `request.build_name`.
  ///
  /// Validates the name and the instructions JSON, writes the instructions
  /// file the script will consume, then runs the deploy action. Nothing is
  /// read back: the script reports only through its exit code.
  pub async fn deploy(&self, request: DeploymentRequest) -> Result<()> {
    let span = tracing::info_span!("deploy", build = %request.build_name);
    async {
      if request.build_name.trim().is_empty() {
        return Err(DeployError::blank("build name"));
      }

      let instructions_path = channel::write_instructions(
        &self.config.work_dir,
        &request.build_name,
        &request.instructions,
      )?;
      let instructions_file = instructions_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

      let op = Operation::Deploy {
        build_name: request.build_name,
        instructions_file,
        branches: request.branches,
        project: request.project,
        log_folder: self.config.log_folder.clone(),
      };
      self.run(&op).await?;

      tracing::info!("VM deployment script finished");
      Ok(())
    }
    .instrument(span)
    .await
  }

  /// Lists running servers with their usage stats, as reported through the
  /// server-list side channel.
  pub async fn list_servers(&self) -> Result<ServerList> {
    let span = tracing::info_span!("list_servers");
    async {
      self.run(&Operation::ListServers).await?;

      let path = self.config.work_dir.join(channel::SERVER_LIST_FILE);
      tracing::debug!(path = %path.display(), "parsing server list file");
      let payload = channel::read_payload(&path)?;
      channel::parse_server_list(&path, &payload)
    }
    .instrument(span)
    .await
  }

  /// Tears down the server provisioned under `build_name`.
  pub async fn delete_server(&self, build_name: &str) -> Result<()> {
    let span = tracing::info_span!("delete_server", build = %build_name);
    async {
      let op = Operation::DeleteServer {
        build_name: build_name.to_string(),
      };
      self.run(&op).await?;
      Ok(())
    }
    .instrument(span)
    .await
  }

  /// Pushes the named test dataset onto the server at `ip`, via the dataset
  /// script rather than the provisioning one.
  pub async fn load_dataset(&self, ip: &str, dataset_name: &str) -> Result<()> {
    let span = tracing::info_span!("load_dataset", %ip, dataset = %dataset_name);
    async {
      let op = Operation::UploadDataset {
        ip: ip.to_string(),
        dataset_name: dataset_name.to_string(),
      };
      self.run(&op).await?;
      Ok(())
    }
    .instrument(span)
    .await
  }

  /// Lists the dataset directories available for [`Self::load_dataset`].
  pub async fn list_datasets(&self) -> Result<Vec<String>> {
    let span = tracing::info_span!("list_datasets");
    async {
      self.run(&Operation::ListDatasets).await?;

      let path = self.config.work_dir.join(channel::DATASETS_LIST_FILE);
      let payload = channel::read_payload(&path)?;
      channel::parse_dataset_list(&path, &payload)
    }
    .instrument(span)
    .await
  }

  /// Builds the invocation and runs it, turning a wrong exit code into the
  /// error taxonomy. Argument validation happens here, before any spawn.
  async fn run(&self, op: &Operation) -> Result<ExecutionOutcome> {
    let tokens = op.argument_tokens()?;
    let script = self.config.script_path(op.script_kind()).to_path_buf();
    let invocation = CommandInvocation::new(script, tokens).with_platform(self.platform);

    tracing::info!(
      action = op.action_token(),
      script = %invocation.script.display(),
      args = %invocation.tokens.join(" "),
      "running deployment script"
    );

    let expected = op.expected_exit_code();
    let outcome = self.runner.execute(&invocation, expected).await?;
    if !outcome.succeeded {
      return Err(DeployError::UnexpectedExitCode {
        path: invocation.script,
        actual: outcome.exit_code,
        expected,
      });
    }
    Ok(outcome)
  }
}
