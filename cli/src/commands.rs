//! Command handlers
//! Each handler returns the process exit code; hard errors bubble up as anyhow

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use fleet_engine::domain::services::{generate_scrape_config, render_scrape_config};
use fleet_engine::domain::{
    all_succeeded, validate_inventory, FleetDeploymentService, Inventory, MonitoringType,
    ServerRecord, VerificationService,
};
use fleet_engine::infrastructure::{
    HttpMetricsProbe, SshRemoteExecutor, StackLauncher, YamlInventoryStore,
};

use crate::formatters;

pub struct AddArgs {
    pub name: String,
    pub hostname: String,
    pub ip: String,
    pub environment: String,
    pub role: String,
    pub monitoring_type: String,
    pub prometheus_port: Option<u16>,
    pub cadvisor_port: Option<u16>,
    pub ssh_user: Option<String>,
    pub ssh_key: Option<String>,
}

pub struct DeployArgs {
    pub central_only: bool,
    pub agents_only: bool,
    pub verify_only: bool,
    pub parallel: usize,
    pub stack_dir: PathBuf,
}

fn load(path: &Path) -> Result<(YamlInventoryStore, Inventory)> {
    let store = YamlInventoryStore::new(path);
    let inventory = store.load().context("failed to load inventory")?;
    Ok((store, inventory))
}

/// Load and refuse to proceed unless the inventory passes validation.
/// Network phases must never run against an inconsistent inventory.
fn load_validated(path: &Path) -> Result<Inventory> {
    let (_, inventory) = load(path)?;
    let errors = validate_inventory(&inventory);
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("  {}", error);
        }
        bail!("inventory has {} validation error(s), fix them first", errors.len());
    }
    Ok(inventory)
}

pub fn handle_list(path: &Path) -> Result<i32> {
    let (_, inventory) = load(path)?;
    print!("{}", formatters::render_inventory_table(&inventory)?);
    println!("{} server(s)", inventory.len());
    Ok(0)
}

pub fn handle_add(path: &Path, args: AddArgs) -> Result<i32> {
    let (store, mut inventory) = load(path)?;

    let monitoring_type: MonitoringType = args.monitoring_type.parse()?;
    let mut record = ServerRecord::from_monitoring_type(
        args.name,
        args.hostname,
        args.ip,
        args.environment,
        args.role,
        monitoring_type,
    );
    if let Some(port) = args.prometheus_port {
        record.prometheus_port = Some(port);
    }
    if let Some(port) = args.cadvisor_port {
        record.cadvisor_port = Some(port);
    }
    if let Some(user) = args.ssh_user {
        record.ssh_user = user;
    }
    if let Some(key) = args.ssh_key {
        record.ssh_key_path = key;
    }

    let name = record.name.clone();
    // Nothing is persisted on a duplicate; the file stays as it was
    inventory.add(record)?;
    store.persist(&inventory)?;
    println!("Added server '{}' ({})", name, monitoring_type);
    Ok(0)
}

pub fn handle_remove(path: &Path, name: &str) -> Result<i32> {
    let (store, mut inventory) = load(path)?;
    if inventory.remove(name) {
        store.persist(&inventory)?;
        println!("Removed server '{}'", name);
    } else {
        // Idempotent: a server that is already gone never blocks automation
        println!("Server '{}' not present, nothing to remove", name);
    }
    Ok(0)
}

pub fn handle_update(path: &Path, name: &str, field: &str, value: &str) -> Result<i32> {
    let (store, mut inventory) = load(path)?;
    inventory.update(name, field, value)?;
    store.persist(&inventory)?;
    println!("Updated '{}': {} = {}", name, field, value);
    Ok(0)
}

pub fn handle_validate(path: &Path) -> Result<i32> {
    let (_, inventory) = load(path)?;
    let errors = validate_inventory(&inventory);
    if errors.is_empty() {
        println!(
            "Inventory OK: {} server(s), no validation errors",
            inventory.len()
        );
        Ok(0)
    } else {
        for error in &errors {
            println!("  {}", error);
        }
        println!(
            "Inventory INVALID: {} validation error(s) across {} server(s)",
            errors.len(),
            inventory.len()
        );
        Ok(1)
    }
}

pub fn handle_generate_config(path: &Path, output: &Path) -> Result<i32> {
    let inventory = load_validated(path)?;
    let config = generate_scrape_config(&inventory);
    let rendered = render_scrape_config(&config)?;
    std::fs::write(output, &rendered)
        .with_context(|| format!("failed to write {}", output.display()))?;

    let jobs: Vec<_> = config
        .scrape_configs
        .iter()
        .map(|j| format!("{} ({})", j.job_name, j.static_configs.len()))
        .collect();
    println!(
        "Wrote {} with jobs: {}",
        output.display(),
        jobs.join(", ")
    );
    Ok(0)
}

pub async fn handle_deploy(path: &Path, args: DeployArgs) -> Result<i32> {
    let inventory = load_validated(path)?;
    let run_central = !args.agents_only && !args.verify_only;
    let run_agents = !args.central_only && !args.verify_only;
    let run_verify = args.verify_only || (!args.central_only && !args.agents_only);

    let mut success = true;

    if run_central {
        println!("==> Central stack");
        let rendered = render_scrape_config(&generate_scrape_config(&inventory))?;
        StackLauncher::new(&args.stack_dir)
            .launch(&rendered)
            .await
            .context("central stack bring-up failed")?;
        println!("Central stack up in {}", args.stack_dir.display());
    }

    if run_agents {
        println!("==> Agent rollout ({} server(s))", inventory.len());
        let cancel = CancellationToken::new();
        let ctrl_c_cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("interrupt received, finishing in-flight hosts...");
                ctrl_c_cancel.cancel();
            }
        });

        let service = FleetDeploymentService::new(Arc::new(SshRemoteExecutor::new()))
            .with_max_parallel(args.parallel)
            .with_cancellation(cancel);
        let outcomes = service.deploy(inventory.records()).await;
        print!("{}", formatters::render_outcomes(&outcomes)?);
        success &= all_succeeded(&outcomes);
    }

    if run_verify {
        println!("==> Verification");
        let verifier = VerificationService::new(Arc::new(HttpMetricsProbe::new()))
            .with_max_parallel(args.parallel);
        let summary = verifier.verify(inventory.records()).await;
        print!("{}", formatters::render_verification(&summary));
        success &= summary.all_healthy();
    }

    println!("{}", formatters::render_verdict(success));
    Ok(if success { 0 } else { 1 })
}
