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
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// Interpreter used for direct invocation on Windows, where the script's
/// shebang line does nothing.
const WINDOWS_INTERPRETER: &str = "python";

/// How the external script gets invoked on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
  /// Wrap in `/bin/bash --login -c` so profile.d scripts run first and the
  /// cloud provider credentials they export reach the child.
  Posix,
  /// Call the interpreter directly; no profile sourcing is needed.
  Windows,
}

impl Platform {
  /// Probed once at startup and threaded through every invocation.
  pub fn current() -> Self {
    if cfg!(windows) {
      Platform::Windows
    } else {
      Platform::Posix
    }
  }
}

/// A fully-built invocation of an external script: the script path, the
/// ordered argument tokens, and the platform strategy that renders them.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
  pub script: PathBuf,
  pub tokens: Vec<String>,
  pub platform: Platform,
}

impl CommandInvocation {
  pub fn new(script: PathBuf, tokens: Vec<String>) -> Self {
    CommandInvocation {
      script,
      tokens,
      platform: Platform::current(),
    }
  }

  pub fn with_platform(mut self, platform: Platform) -> Self {
    self.platform = platform;
    self
  }

  /// The single command string handed to the login shell. Tokens are quoted
  /// here, not in the builder, since quoting rules belong to the strategy
  /// that interprets them.
  pub fn shell_line(&self) -> String {
    let mut parts = vec![shell_quote(&self.script.display().to_string())];
    parts.extend(self.tokens.iter().map(|t| shell_quote(t)));
    parts.join(" ")
  }

  fn to_command(&self) -> Command {
    match self.platform {
      Platform::Posix => {
        let mut cmd = Command::new("/bin/bash");
        cmd.arg("--login").arg("-c").arg(self.shell_line());
        cmd
      }
      Platform::Windows => {
        let mut cmd = Command::new(WINDOWS_INTERPRETER);
        cmd.arg(&self.script).args(&self.tokens);
        cmd
      }
    }
  }
}

/// Single-quotes a token for `bash -c` when it contains anything the shell
/// would interpret. Branch names and build names are passed through verbatim
/// by the builder, so this is where they stop being shell-dangerous.
fn shell_quote(token: &str) -> String {
  let plain = !token.is_empty()
    && token
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '@'));
  if plain {
    token.to_string()
  } else {
    format!("'{}'", token.replace('\'', r"'\''"))
  }
}

/// What one finished invocation looked like. Produced once per run; the
/// facade turns `succeeded == false` into `UnexpectedExitCode`.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionOutcome {
  pub exit_code: i32,
  pub succeeded: bool,
}

/// Seam between the facade and the operating system. The real implementation
/// spawns a process; tests substitute a fake that records invocations.
#[allow(async_fn_in_trait)]
pub trait ScriptRunner {
  /// Runs the invocation to completion and reports its exit code.
  ///
  /// Errors cover the cases where no exit code exists: the script path is
  /// missing, the spawn itself failed, or the configured time limit expired
  /// (in which case the child has been killed).
  async fn execute(
    &self,
    invocation: &CommandInvocation,
    expected_exit_code: i32,
  ) -> Result<ExecutionOutcome>;
}

/// Production runner: platform-appropriate spawn, blocking wait, optional
/// wall-clock limit.
#[derive(Debug, Default)]
pub struct ShellRunner {
  /// `None` keeps the legacy behavior of waiting forever.
  pub timeout: Option<Duration>,
}

impl ShellRunner {
  pub fn new(timeout: Option<Duration>) -> Self {
    ShellRunner { timeout }
  }
}

impl ScriptRunner for ShellRunner {
  async fn execute(
    &self,
    invocation: &CommandInvocation,
    expected_exit_code: i32,
  ) -> Result<ExecutionOutcome> {
    let script = &invocation.script;
    if !script.exists() || script.is_dir() {
      return Err(DeployError::ScriptNotFound {
        path: script.clone(),
      });
    }

    let mut command = invocation.to_command();
    command.kill_on_drop(true);

    tracing::debug!(cmd = ?command, "spawning script");
    let mut child = command
      .spawn()
      .map_err(|source| DeployError::ProcessExecution {
        path: script.clone(),
        source,
      })?;

    let status = match self.timeout {
      None => child.wait().await,
      Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
        Ok(waited) => waited,
        Err(_) => {
          tracing::warn!(script = %script.display(), ?limit, "script timed out, killing");
          let _ = child.start_kill();
          let _ = child.wait().await;
          return Err(DeployError::Timeout {
            path: script.clone(),
            limit,
          });
        }
      },
    }
    .map_err(|source| DeployError::ProcessExecution {
      path: script.clone(),
      source,
    })?;

    // Killed-by-signal has no code; report it as -1 like any other failure.
    let exit_code = status.code().unwrap_or(-1);
    tracing::info!(script = %script.display(), exit_code, "script finished");

    Ok(ExecutionOutcome {
      exit_code,
      succeeded: exit_code == expected_exit_code,
    })
  }
}
