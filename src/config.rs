use crate::ops::ScriptKind;
use figment::Figment;
use figment::providers::Env;
use figment::providers::Format;
use figment::providers::Json;
use figment::providers::Serialized;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// Resolved orchestrator configuration.
///
/// Layered lowest-to-highest: built-in defaults, `vmtestbed.json` in the
/// working directory, then `VMTB_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
  /// Provisioning script handling deploy / list / delete.
  pub provision_script: PathBuf,

  /// Dataset script handling upload-dataset / list-datasets.
  pub dataset_script: PathBuf,

  /// Directory the side-channel files live in. Must match the directory the
  /// scripts run against, which by contract is the orchestrator's cwd.
  pub work_dir: PathBuf,

  /// Forwarded to the deploy action as `--log-folder` so the script can drop
  /// its provisioning log where the web UI serves it from.
  pub log_folder: Option<String>,

  /// Wall-clock limit per script invocation. Unset means wait forever, the
  /// legacy behavior.
  pub timeout_secs: Option<u64>,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      provision_script: PathBuf::from("./deploy_vm.py"),
      dataset_script: PathBuf::from("./load_test_data.py"),
      work_dir: PathBuf::from("."),
      log_folder: None,
      timeout_secs: None,
    }
  }
}

impl Config {
  pub const CONFIG_FILE: &'static str = "vmtestbed.json";
  pub const ENV_PREFIX: &'static str = "VMTB_";

  pub fn load() -> Result<Config, figment::Error> {
    Figment::from(Serialized::defaults(Config::default()))
      .merge(Json::file(Self::CONFIG_FILE))
      .merge(Env::prefixed(Self::ENV_PREFIX))
      .extract()
  }

  pub fn script_path(&self, kind: ScriptKind) -> &Path {
    match kind {
      ScriptKind::Provision => &self.provision_script,
      ScriptKind::DataLoader => &self.dataset_script,
    }
  }

  pub fn timeout(&self) -> Option<Duration> {
    self.timeout_secs.map(Duration::from_secs)
  }
}
