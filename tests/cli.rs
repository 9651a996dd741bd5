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

// The binary wraps scripts in `/bin/bash --login -c` on POSIX, so these
// end-to-end tests only make sense there.
#![cfg(unix)]

use assert_cmd::cargo;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

/// Drops an executable stub script into `dir`, standing in for the real
/// provisioning scripts.
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
  fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
  path
}

fn vmtb_in(dir: &Path) -> Command {
  let mut cmd = Command::new(cargo::cargo_bin!("vmtb"));
  cmd.current_dir(dir).env("CLICOLOR", "0");
  cmd
}

#[test]
fn test_deploy_e2e() {
  let temp = tempdir().unwrap();
  write_script(
    temp.path(),
    "fake_deploy.sh",
    r#"printf '%s ' "$@" > deploy_args.txt"#,
  );

  let mut cmd = vmtb_in(temp.path());
  cmd
    .env("VMTB_PROVISION_SCRIPT", "./fake_deploy.sh")
    .arg("deploy")
    .arg("--build-name")
    .arg("b1")
    .arg("--instructions")
    .arg(r#"{"cpu":2}"#)
    .arg("--pn")
    .arg("feature-x");

  cmd
    .assert()
    .success()
    .stderr(predicate::str::contains("Deployment complete"));

  // The instructions file is written before the script runs, byte-for-byte.
  let instructions = temp.path().join("build_instructions_b1.json");
  assert_eq!(fs::read_to_string(instructions).unwrap(), r#"{"cpu":2}"#);

  // And the script saw the full, ordered argument list.
  let args = fs::read_to_string(temp.path().join("deploy_args.txt")).unwrap();
  assert_eq!(
    args.trim_end(),
    "--action deploy --pn feature-x --build-name b1 \
     --build-instructions build_instructions_b1.json"
  );
}

#[test]
fn test_deploy_rejects_malformed_instructions_without_running_script() {
  let temp = tempdir().unwrap();
  write_script(temp.path(), "fake_deploy.sh", "touch script_ran.txt");

  let mut cmd = vmtb_in(temp.path());
  cmd
    .env("VMTB_PROVISION_SCRIPT", "./fake_deploy.sh")
    .arg("deploy")
    .arg("--build-name")
    .arg("b1")
    .arg("--instructions")
    .arg("{not json");

  cmd
    .assert()
    .failure()
    .stderr(predicate::str::contains("build instructions"));

  assert!(!temp.path().join("script_ran.txt").exists());
  assert!(!temp.path().join("build_instructions_b1.json").exists());
}

#[test]
fn test_list_servers_e2e() {
  let temp = tempdir().unwrap();
  write_script(
    temp.path(),
    "fake_deploy.sh",
    r#"echo '{"vm1":{"ip":"10.0.0.1"}}' > server_list.txt"#,
  );

  let mut cmd = vmtb_in(temp.path());
  cmd
    .env("VMTB_PROVISION_SCRIPT", "./fake_deploy.sh")
    .arg("list-servers");

  cmd
    .assert()
    .success()
    .stdout(predicate::str::contains(r#""ip": "10.0.0.1""#));
}

#[test]
fn test_list_servers_fails_when_script_writes_no_file() {
  let temp = tempdir().unwrap();
  write_script(temp.path(), "fake_deploy.sh", "exit 0");

  let mut cmd = vmtb_in(temp.path());
  cmd
    .env("VMTB_PROVISION_SCRIPT", "./fake_deploy.sh")
    .arg("list-servers");

  cmd
    .assert()
    .failure()
    .stderr(predicate::str::contains("did not produce result file"));
}

#[test]
fn test_delete_server_reports_unexpected_exit_code() {
  let temp = tempdir().unwrap();
  write_script(temp.path(), "fake_deploy.sh", "exit 7");

  let mut cmd = vmtb_in(temp.path());
  cmd
    .env("VMTB_PROVISION_SCRIPT", "./fake_deploy.sh")
    .arg("delete-server")
    .arg("--build-name")
    .arg("b1");

  cmd
    .assert()
    .failure()
    .stderr(predicate::str::contains("exited with code 7"));
}

#[test]
fn test_missing_script_is_reported() {
  let temp = tempdir().unwrap();

  let mut cmd = vmtb_in(temp.path());
  cmd
    .env("VMTB_PROVISION_SCRIPT", "./no_such_script.sh")
    .arg("list-servers");

  cmd
    .assert()
    .failure()
    .stderr(predicate::str::contains("script not found"));
}

#[test]
fn test_dataset_operations_use_the_dataset_script() {
  let temp = tempdir().unwrap();
  write_script(
    temp.path(),
    "fake_loader.sh",
    r#"printf '%s ' "$@" > loader_args.txt
echo '["cohort-A","cohort-B"]' > datasets_list.txt"#,
  );
  // A provisioning stub that would fail loudly if it were ever picked.
  write_script(temp.path(), "fake_deploy.sh", "exit 1");

  let mut upload = vmtb_in(temp.path());
  upload
    .env("VMTB_PROVISION_SCRIPT", "./fake_deploy.sh")
    .env("VMTB_DATASET_SCRIPT", "./fake_loader.sh")
    .arg("load-dataset")
    .arg("--ip")
    .arg("10.0.0.2")
    .arg("--dataset-name")
    .arg("cohort-A");

  upload
    .assert()
    .success()
    .stderr(predicate::str::contains("Dataset loaded"));

  let args = fs::read_to_string(temp.path().join("loader_args.txt")).unwrap();
  assert_eq!(
    args.trim_end(),
    "--action upload-dataset --ip 10.0.0.2 --dataset-name cohort-A"
  );

  let mut list = vmtb_in(temp.path());
  list
    .env("VMTB_PROVISION_SCRIPT", "./fake_deploy.sh")
    .env("VMTB_DATASET_SCRIPT", "./fake_loader.sh")
    .arg("list-datasets");

  list
    .assert()
    .success()
    .stdout(predicate::str::contains("cohort-B"));
}
