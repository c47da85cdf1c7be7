mod commands;
mod formatters;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fleetctl")]
#[command(about = "Inventory-driven monitoring fleet management")]
#[command(version)]
struct Cli {
    /// Server inventory file
    #[arg(
        long,
        global = true,
        env = "FLEETCTL_INVENTORY",
        default_value = "servers.yaml"
    )]
    inventory: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List inventoried servers
    List,

    /// Add a server to the inventory
    Add {
        name: String,
        hostname: String,
        ip: String,
        environment: String,
        role: String,
        /// system, docker+system or kubernetes+system
        monitoring_type: String,

        /// node_exporter port (default 9100)
        #[arg(long)]
        prometheus_port: Option<u16>,

        /// cAdvisor port (default 8080 for docker-capable types)
        #[arg(long)]
        cadvisor_port: Option<u16>,

        #[arg(long)]
        ssh_user: Option<String>,

        #[arg(long)]
        ssh_key: Option<String>,
    },

    /// Remove a server from the inventory (no error if already absent)
    Remove { name: String },

    /// Update one field of a server
    Update {
        name: String,
        field: String,
        value: String,
    },

    /// Check the inventory against its invariants
    Validate,

    /// Generate the Prometheus scrape config from the inventory
    GenerateConfig {
        /// Output path for the rendered config
        #[arg(long, env = "FLEETCTL_OUTPUT", default_value = "prometheus.yml")]
        output: PathBuf,
    },

    /// Roll monitoring out across the fleet
    Deploy {
        /// Only bring up the central collector stack
        #[arg(long, conflicts_with_all = ["agents_only", "verify_only"])]
        central_only: bool,

        /// Only install agents on the inventoried hosts
        #[arg(long, conflicts_with = "verify_only")]
        agents_only: bool,

        /// Only probe the deployed metrics endpoints
        #[arg(long)]
        verify_only: bool,

        /// Maximum hosts deployed concurrently
        #[arg(long, default_value_t = fleet_engine::constants::DEFAULT_MAX_PARALLEL)]
        parallel: usize,

        /// Directory holding the central stack's compose file
        #[arg(long, env = "FLEETCTL_STACK_DIR", default_value = "stack")]
        stack_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    // Usage errors (missing/unknown arguments) exit 1 like every other
    // operator error; --help and --version stay at 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = usage_error_code(&e);
            let _ = e.print();
            std::process::exit(code);
        }
    };
    let inventory_path = cli.inventory.clone();

    let result = match cli.command {
        Commands::List => commands::handle_list(&inventory_path),
        Commands::Add {
            name,
            hostname,
            ip,
            environment,
            role,
            monitoring_type,
            prometheus_port,
            cadvisor_port,
            ssh_user,
            ssh_key,
        } => commands::handle_add(
            &inventory_path,
            commands::AddArgs {
                name,
                hostname,
                ip,
                environment,
                role,
                monitoring_type,
                prometheus_port,
                cadvisor_port,
                ssh_user,
                ssh_key,
            },
        ),
        Commands::Remove { name } => commands::handle_remove(&inventory_path, &name),
        Commands::Update { name, field, value } => {
            commands::handle_update(&inventory_path, &name, &field, &value)
        }
        Commands::Validate => commands::handle_validate(&inventory_path),
        Commands::GenerateConfig { output } => {
            commands::handle_generate_config(&inventory_path, &output)
        }
        Commands::Deploy {
            central_only,
            agents_only,
            verify_only,
            parallel,
            stack_dir,
        } => {
            commands::handle_deploy(
                &inventory_path,
                commands::DeployArgs {
                    central_only,
                    agents_only,
                    verify_only,
                    parallel,
                    stack_dir,
                },
            )
            .await
        }
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

fn usage_error_code(error: &clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}
