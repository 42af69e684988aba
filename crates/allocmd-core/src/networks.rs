//! per-network endpoint constants

use crate::types::Network;

/// static endpoints for one allora network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    pub chain_id: &'static str,
    pub rpc_address: &'static str,
    pub api_address: &'static str,
    pub faucet_url: &'static str,
    /// newline separated head node multiaddrs, none for local chains
    pub heads_url: Option<&'static str>,
}

const DEV: NetworkParams = NetworkParams {
    chain_id: "demo",
    rpc_address: "http://localhost:26657",
    api_address: "http://localhost:1317",
    faucet_url: "http://localhost:8000",
    heads_url: None,
};

const EDGENET: NetworkParams = NetworkParams {
    chain_id: "edgenet",
    rpc_address: "https://allora-rpc.edgenet.allora.network",
    api_address: "https://allora-api.edgenet.allora.network",
    faucet_url: "https://faucet.edgenet.allora.network",
    heads_url: Some("https://raw.githubusercontent.com/allora-network/networks/main/edgenet/heads.txt"),
};

const TESTNET_1: NetworkParams = NetworkParams {
    chain_id: "testnet-1",
    rpc_address: "https://allora-rpc.testnet-1.testnet.allora.network",
    api_address: "https://allora-api.testnet-1.testnet.allora.network",
    faucet_url: "https://faucet.testnet-1.testnet.allora.network",
    heads_url: Some("https://raw.githubusercontent.com/allora-network/networks/main/testnet-1/heads.txt"),
};

/// public ip echo service
pub const PUBLIC_IP_URL: &str = "https://api.ipify.org";

/// used when the public ip lookup fails
pub const FALLBACK_PUBLIC_IP: &str = "127.0.0.1";

impl Network {
    pub fn params(&self) -> &'static NetworkParams {
        match self {
            Network::Dev => &DEV,
            Network::Edgenet => &EDGENET,
            Network::Testnet1 => &TESTNET_1,
        }
    }
}

/// normalize a fetched head list into the comma separated form the node expects.
/// entries with quotes or inner whitespace are not multiaddrs and are dropped,
/// the result is written unescaped into yaml and shell files
pub fn parse_boot_nodes(body: &str) -> String {
    body.lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty() && !entry.starts_with('#'))
        .filter(|entry| {
            !entry
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '\\' | '`' | '$'))
        })
        .collect::<Vec<_>>()
        .join(",")
}
