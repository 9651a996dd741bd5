use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Parser)]
#[command(version, about = "Orchestrator of VM-based test environment deployments")]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  /// Provision a new VM test environment.
  Deploy {
    /// User-chosen name for the new environment; reused to list and delete it.
    #[arg(long)]
    build_name: String,

    /// JSON object with deploy instructions, forwarded to the VM as-is.
    /// Example: '{"cpu": 2, "memory_gb": 8}'
    #[arg(long)]
    instructions: String,

    /// Branch override for the patient-network repository.
    #[arg(long)]
    pn: Option<String>,

    /// Branch override for the remote-matching repository.
    #[arg(long)]
    rm: Option<String>,

    /// Branch override for the main product repository.
    #[arg(long)]
    pc: Option<String>,

    /// Branch override for the testing repository.
    #[arg(long)]
    pt: Option<String>,

    /// Project to provision under, when the script supports more than one.
    #[arg(long)]
    project: Option<String>,
  },

  /// List running servers and their resource usage stats as JSON.
  ListServers,

  /// Tear down the server provisioned under the given build name.
  DeleteServer {
    #[arg(long)]
    build_name: String,
  },

  /// Push a test dataset onto a running server.
  LoadDataset {
    /// IP address of the target server.
    #[arg(long)]
    ip: String,

    /// Name of the test data directory to upload.
    #[arg(long)]
    dataset_name: String,
  },

  /// List the available test dataset directories as JSON.
  ListDatasets,
}
