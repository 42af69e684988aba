//! persisted node document (`config.yaml`)
//!
//! one document per node directory. it is read whole, mutated in memory and
//! written back whole; writes go through a temp file in the same directory and
//! a rename so a crash never leaves a half written document behind.

use crate::error::{Error, Result};
use crate::types::{Network, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "config.yaml";

/// account material for a node, all three fields non-empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub mnemonic: String,
    pub hex_private_key: String,
    pub address: String,
}

impl Credentials {
    pub fn new(mnemonic: String, hex_private_key: String, address: String) -> Result<Self> {
        if mnemonic.is_empty() || hex_private_key.is_empty() || address.is_empty() {
            return Err(Error::Parse("account material: empty mnemonic, key or address".into()));
        }
        Ok(Self {
            mnemonic,
            hex_private_key,
            address,
        })
    }
}

/// either no account yet or a complete one. partial state is unrepresentable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Option<RawCredentials>", into = "Option<RawCredentials>")]
pub enum CredentialState {
    #[default]
    Unset,
    Set(Credentials),
}

impl CredentialState {
    pub fn is_unset(&self) -> bool {
        matches!(self, CredentialState::Unset)
    }

    pub fn get(&self) -> Option<&Credentials> {
        match self {
            CredentialState::Unset => None,
            CredentialState::Set(creds) => Some(creds),
        }
    }
}

/// on-disk shape of the credentials mapping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawCredentials {
    #[serde(default)]
    mnemonic: String,
    #[serde(default)]
    hex_private_key: String,
    #[serde(default)]
    address: String,
}

impl TryFrom<Option<RawCredentials>> for CredentialState {
    type Error = String;

    fn try_from(raw: Option<RawCredentials>) -> std::result::Result<Self, String> {
        let Some(raw) = raw else {
            return Ok(CredentialState::Unset);
        };
        let filled = [&raw.mnemonic, &raw.hex_private_key, &raw.address]
            .iter()
            .filter(|field| !field.trim().is_empty())
            .count();
        match filled {
            0 => Ok(CredentialState::Unset),
            3 => Ok(CredentialState::Set(Credentials {
                mnemonic: raw.mnemonic.trim().to_string(),
                hex_private_key: raw.hex_private_key.trim().to_string(),
                address: raw.address.trim().to_string(),
            })),
            _ => Err("credentials are partially set; mnemonic, hex_private_key and address must all be present or all be empty".into()),
        }
    }
}

impl From<CredentialState> for Option<RawCredentials> {
    fn from(state: CredentialState) -> Self {
        match state {
            CredentialState::Unset => None,
            CredentialState::Set(creds) => Some(RawCredentials {
                mnemonic: creds.mnemonic,
                hex_private_key: creds.hex_private_key,
                address: creds.address,
            }),
        }
    }
}

/// network derived addresses, filled at generation time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default)]
    pub faucet_url: String,
    #[serde(default)]
    pub rpc_address: String,
    #[serde(default)]
    pub api_address: String,
    #[serde(default)]
    pub boot_nodes: String,
}

/// container image used for production deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub uri: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    pub role: Role,
    pub network: Network,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<u64>,
    #[serde(default, skip_serializing_if = "CredentialState::is_unset")]
    pub credentials: CredentialState,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    /// fields written by newer versions, carried through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl NodeConfig {
    pub fn new(name: &str, role: Role, network: Network, topic_id: Option<u64>) -> Self {
        let params = network.params();
        Self {
            name: name.to_string(),
            role,
            network,
            topic_id,
            credentials: CredentialState::Unset,
            endpoints: Endpoints {
                faucet_url: params.faucet_url.to_string(),
                rpc_address: params.rpc_address.to_string(),
                api_address: params.api_address.to_string(),
                boot_nodes: String::new(),
            },
            image: None,
            extra: BTreeMap::new(),
        }
    }

    /// keyring entry holding this node's account, unique per name and role
    pub fn key_name(&self) -> String {
        format!("{}-{}", self.name, self.role)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.role.requires_topic() && self.topic_id.is_none() {
            return Err(format!("topic_id is required for a {}", self.role));
        }
        if let Some(image) = &self.image {
            if image.uri.trim().is_empty() || image.tag.trim().is_empty() {
                return Err("image requires both uri and tag".into());
            }
        }
        Ok(())
    }
}

/// reads and writes one node document
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// store for `config.yaml` inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<NodeConfig> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config(&self.path, "file not found")
            } else {
                Error::config(&self.path, e)
            }
        })?;
        let config: NodeConfig =
            serde_yaml::from_str(&content).map_err(|e| Error::config(&self.path, e))?;
        config
            .validate()
            .map_err(|reason| Error::config(&self.path, reason))?;
        Ok(config)
    }

    pub fn save(&self, config: &NodeConfig) -> Result<()> {
        let yaml = serde_yaml::to_string(config).map_err(|e| Error::config(&self.path, e))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!("wrote {}", self.path.display());
        Ok(())
    }
}
