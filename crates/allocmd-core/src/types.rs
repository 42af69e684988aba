//! role, network and environment selectors

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// what a node does on the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Worker,
    Reputer,
    Validator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::Reputer => "reputer",
            Role::Validator => "validator",
        }
    }

    /// workers and reputers serve a topic, validators do not
    pub fn requires_topic(&self) -> bool {
        !matches!(self, Role::Validator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Network {
    #[serde(rename = "dev")]
    #[value(name = "dev")]
    Dev,
    #[serde(rename = "edgenet")]
    #[value(name = "edgenet")]
    Edgenet,
    #[serde(rename = "testnet-1")]
    #[value(name = "testnet-1")]
    Testnet1,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Dev => "dev",
            Network::Edgenet => "edgenet",
            Network::Testnet1 => "testnet-1",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// where the scaffolded node is going to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Dev,
    Prod,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Dev => f.write_str("dev"),
            Environment::Prod => f.write_str("prod"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_names() {
        assert_eq!(serde_yaml::to_string(&Network::Testnet1).unwrap().trim(), "testnet-1");
        assert_eq!(serde_yaml::from_str::<Role>("reputer").unwrap(), Role::Reputer);
        assert!(serde_yaml::from_str::<Network>("mainnet").is_err());
    }

    #[test]
    fn test_cli_names_match_yaml() {
        for network in [Network::Dev, Network::Edgenet, Network::Testnet1] {
            let parsed = Network::from_str(network.as_str(), false).unwrap();
            assert_eq!(parsed, network);
        }
        assert_eq!(Role::from_str("validator", false).unwrap(), Role::Validator);
    }

    #[test]
    fn test_topic_requirement() {
        assert!(Role::Worker.requires_topic());
        assert!(Role::Reputer.requires_topic());
        assert!(!Role::Validator.requires_topic());
    }
}
