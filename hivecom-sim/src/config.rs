use std::path::{Path, PathBuf};
use std::{fs, sync::Arc};

use clap::ValueEnum;
use hivecom_mesh::{Connection, RandomRoutingPolicy, RoutingPolicy};
use hivecom_telemetry::LoggingConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ConfigFormat {
    Auto,
    Toml,
    Yaml,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {format:?} config: {details}")]
    Parse { format: ConfigFormat, details: String },
    #[error("configuration invalid: {0}")]
    Validation(String),
}

/// One node entry: its identifier and its direct neighbours.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct NodeEntry {
    pub id: String,
    #[serde(default)]
    pub connections: Vec<String>,
}

/// A whole mesh topology plus a seed for reproducible routing.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct MeshTopologyConfig {
    pub nodes: Vec<NodeEntry>,
    /// Seed for the reference random routing policy. Unset means non-deterministic.
    #[serde(default)]
    pub routing_seed: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MeshTopologyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes.is_empty() {
            return Err(ConfigError::Validation("topology must name at least one node".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for node in &self.nodes {
            if !seen.insert(&node.id) {
                return Err(ConfigError::Validation(format!("duplicate node id {:?}", node.id)));
            }
        }
        Ok(())
    }

    pub fn sample() -> Self {
        Self {
            nodes: vec![
                NodeEntry {
                    id: "A".into(),
                    connections: vec!["B".into()],
                },
                NodeEntry {
                    id: "B".into(),
                    connections: vec!["A".into(), "C".into()],
                },
                NodeEntry {
                    id: "C".into(),
                    connections: vec!["B".into()],
                },
            ],
            routing_seed: Some(1),
            logging: LoggingConfig::default(),
        }
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.nodes
            .iter()
            .map(|node| Connection::new(node.id.clone(), node.connections.clone()))
            .collect()
    }

    pub fn routing_policy(&self) -> Arc<dyn RoutingPolicy> {
        match self.routing_seed {
            Some(seed) => Arc::new(RandomRoutingPolicy::from_seed(seed)),
            None => Arc::new(RandomRoutingPolicy::new()),
        }
    }
}

pub fn load_config(path: &Path, format: ConfigFormat) -> Result<MeshTopologyConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let format = resolve_format(path, format);
    let config: MeshTopologyConfig = match format {
        ConfigFormat::Toml => toml::from_str(&contents).map_err(|err| ConfigError::Parse {
            format,
            details: err.to_string(),
        }),
        ConfigFormat::Yaml => serde_yaml::from_str(&contents).map_err(|err| ConfigError::Parse {
            format,
            details: err.to_string(),
        }),
        ConfigFormat::Auto => unreachable!("auto variant resolved earlier"),
    }?;
    config.validate()?;
    Ok(config)
}

fn resolve_format(path: &Path, format: ConfigFormat) -> ConfigFormat {
    match format {
        ConfigFormat::Auto => match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => ConfigFormat::Toml,
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Toml,
        },
        _ => format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_empty_topology() {
        let mut config = MeshTopologyConfig::sample();
        config.nodes.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn detects_duplicate_node_ids() {
        let mut config = MeshTopologyConfig::sample();
        config.nodes.push(config.nodes[0].clone());
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn parses_toml_config() {
        let contents = r#"
            routing-seed = 7

            [[nodes]]
            id = "A"
            connections = ["B"]

            [[nodes]]
            id = "B"
            connections = ["A"]
        "#;
        let config: MeshTopologyConfig = toml::from_str(contents).unwrap();
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.routing_seed, Some(7));
    }
}
