//! tool-level settings, shared by every command

use std::path::PathBuf;

pub const DEFAULT_KEYGEN_IMAGE: &str = "alloranetwork/allora-inference-base:latest";
pub const DEFAULT_NODE_IMAGE: &str = "alloranetwork/allora-inference-base:latest";
pub const DEFAULT_VALIDATOR_IMAGE: &str = "alloranetwork/allora-chain:latest";
pub const DEFAULT_CHAIN_REPO: &str = "https://github.com/allora-network/allora-chain.git";
pub const DEFAULT_CHART_REPO: &str = "https://upshot-tech.github.io/helm-charts";
pub const DEFAULT_HELM_VERSION: &str = "3.14.4";

/// name the chart repository is registered under
pub const CHART_REPO_NAME: &str = "upshot";
/// chart installed for every role
pub const CHART_NAME: &str = "upshot/universal-helm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// where the chain client checkout and downloaded tools live
    pub home: PathBuf,
    pub keygen_image: String,
    pub node_image: String,
    pub validator_image: String,
    pub chain_repo: String,
    pub chart_repo: String,
    pub helm_version: String,
}

impl Settings {
    pub fn default_home() -> PathBuf {
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("allocmd")
    }

    pub fn chain_dir(&self) -> PathBuf {
        self.home.join("allora-chain")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.home.join("bin")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            home: Self::default_home(),
            keygen_image: DEFAULT_KEYGEN_IMAGE.into(),
            node_image: DEFAULT_NODE_IMAGE.into(),
            validator_image: DEFAULT_VALIDATOR_IMAGE.into(),
            chain_repo: DEFAULT_CHAIN_REPO.into(),
            chart_repo: DEFAULT_CHART_REPO.into(),
            helm_version: DEFAULT_HELM_VERSION.into(),
        }
    }
}
