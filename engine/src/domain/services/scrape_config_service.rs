//! Scrape config generation service
//! Pure function from Inventory to a Prometheus scrape configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{Capability, DomainError, Inventory, Result};

/// Generated Prometheus configuration document.
///
/// Fully regenerable from the inventory at any time; edits belong in the
/// inventory, never in the rendered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub global: GlobalConfig,
    pub scrape_configs: Vec<ScrapeJob>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub scrape_interval: String,
    pub evaluation_interval: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            scrape_interval: "15s".to_string(),
            evaluation_interval: "15s".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeJob {
    pub job_name: String,
    pub static_configs: Vec<StaticConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticConfig {
    pub targets: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Derive the scrape configuration from the inventory.
///
/// Jobs are emitted per capability in declared order, then within each job
/// one static config per qualifying server in inventory order. Membership
/// comes from the capability flags only; the monitoring type string is just
/// a label, so a kubernetes+system server groups exactly like docker+system.
/// The same inventory always produces an identical document.
pub fn generate(inventory: &Inventory) -> ScrapeConfig {
    let mut scrape_configs = vec![ScrapeJob {
        job_name: "prometheus".to_string(),
        static_configs: vec![StaticConfig {
            targets: vec!["localhost:9090".to_string()],
            labels: BTreeMap::new(),
        }],
    }];

    for capability in Capability::ALL {
        let static_configs: Vec<StaticConfig> = inventory
            .iter()
            .filter_map(|server| {
                let port = capability.port_for(server)?;
                let mut labels = BTreeMap::new();
                labels.insert("environment".to_string(), server.environment.clone());
                labels.insert("role".to_string(), server.role.clone());
                if let Some(monitoring_type) = server.monitoring_type {
                    labels.insert("monitoring_type".to_string(), monitoring_type.to_string());
                }
                Some(StaticConfig {
                    targets: vec![format!("{}:{}", server.hostname, port)],
                    labels,
                })
            })
            .collect();

        if !static_configs.is_empty() {
            scrape_configs.push(ScrapeJob {
                job_name: capability.job_name().to_string(),
                static_configs,
            });
        }
    }

    ScrapeConfig {
        global: GlobalConfig::default(),
        scrape_configs,
    }
}

/// Render the configuration to YAML
pub fn render(config: &ScrapeConfig) -> Result<String> {
    serde_yaml::to_string(config).map_err(|e| DomainError::ConfigWrite(e.to_string()))
}
