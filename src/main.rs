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
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use vmtestbed::cli::Cli;
use vmtestbed::cli::Commands;
use vmtestbed::config::Config;
use vmtestbed::logging::setup_tracing;
use vmtestbed::ops::BranchOverrides;
use vmtestbed::ops::DeploymentRequest;
use vmtestbed::service::DeployService;

#[tokio::main]
async fn main() -> Result<()> {
  setup_tracing()?;

  let Cli { command } = Cli::parse();
  let main_span = tracing::info_span!("orchestrator");
  let _enter = main_span.enter();

  let config = Config::load().context("Failed to load configuration")?;
  let service = DeployService::from_config(config);

  match command {
    Commands::Deploy {
      build_name,
      instructions,
      pn,
      rm,
      pc,
      pt,
      project,
    } => {
      tracing::info!("Starting VM deployment...");

      let request = DeploymentRequest {
        build_name,
        instructions,
        branches: BranchOverrides { pn, rm, pc, pt },
        project,
      };
      service.deploy(request).await?;

      tracing::info!("Deployment complete.");
    }
    Commands::ListServers => {
      let servers = service.list_servers().await?;
      println!("{}", serde_json::to_string_pretty(&servers)?);
    }
    Commands::DeleteServer { build_name } => {
      tracing::info!("Deleting server for build [{}]...", build_name);

      service.delete_server(&build_name).await?;

      tracing::info!("Server deleted.");
    }
    Commands::LoadDataset { ip, dataset_name } => {
      tracing::info!("Loading dataset [{}] onto [{}]...", dataset_name, ip);

      service.load_dataset(&ip, &dataset_name).await?;

      tracing::info!("Dataset loaded.");
    }
    Commands::ListDatasets => {
      let datasets = service.list_datasets().await?;
      println!("{}", serde_json::to_string_pretty(&datasets)?);
    }
  }

  Ok(())
}
