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

//! # Vmtestbed
//!
//! `vmtestbed` is a thin orchestration layer over the external provisioning
//! scripts that spin up, list, and tear down VM-based test environments, and
//! that push test datasets onto them. It builds the platform-appropriate
//! command line, runs the script, classifies its exit code, and parses the
//! side-channel result files the script leaves behind.
//!
//! This crate contains the library logic behind the `vmtb` CLI, but the
//! [`service::DeployService`] facade can be embedded directly.
//!
//! ## Core Modules
//!
//! * [`ops`]: The five logical operations and the deterministic argument
//!   builder that turns them into `--flag value` token sequences.
//! * [`runner`]: Platform-dependent invocation strategies (login shell on
//!   POSIX, direct interpreter on Windows) and the [`runner::ScriptRunner`]
//!   seam used to substitute a fake in tests.
//! * [`channel`]: The side-channel files shared with the scripts — the
//!   instructions writer, the line-concatenating result reader, and the
//!   shape-checked JSON parsers.
//! * [`service`]: The [`service::DeployService`] facade sequencing the above
//!   per operation.
//! * [`config`]: Figment-layered configuration (defaults, `vmtestbed.json`,
//!   `VMTB_*` env vars).
//! * [`cli`]: Defines the `clap`-based command-line interface.
//! * [`error`]: Defines the error taxonomy for the library.
//! * [`logging`]: Provides the `setup_tracing` utility.

pub mod channel;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod ops;
pub mod runner;
pub mod service;
