//! one-time account creation and funding for a node
//!
//! `ensure_account` is idempotent: once the document holds credentials no
//! external tool is touched again. the document is only written after the
//! mnemonic, key and address are all known, so a failure part way leaves it as
//! it was.

use crate::chain::ChainClient;
use crate::config::{ConfigStore, CredentialState, Credentials};
use crate::error::Result;
use crate::exec::CommandRunner;
use crate::http::HttpClient;
use crate::settings::Settings;
use crate::types::{Network, Role};
use crate::ui;
use tracing::{info, warn};

pub struct CredentialBootstrapper<'a> {
    runner: &'a dyn CommandRunner,
    http: &'a dyn HttpClient,
    settings: &'a Settings,
}

/// who the account is for
#[derive(Debug, Clone, Copy)]
pub struct AccountSpec<'c> {
    pub name: &'c str,
    /// keyring entry the account is stored under
    pub key_name: &'c str,
    pub role: Role,
    pub faucet_url: &'c str,
    pub network: Network,
}

impl<'a> CredentialBootstrapper<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        http: &'a dyn HttpClient,
        settings: &'a Settings,
    ) -> Self {
        Self {
            runner,
            http,
            settings,
        }
    }

    /// return the node's credentials, creating and funding the account the
    /// first time
    pub fn ensure_account(&self, store: &ConfigStore) -> Result<Credentials> {
        let mut config = store.load()?;
        if let CredentialState::Set(existing) = &config.credentials {
            info!("reusing account {} for {}", existing.address, config.name);
            return Ok(existing.clone());
        }

        let faucet_url = if config.endpoints.faucet_url.is_empty() {
            config.network.params().faucet_url.to_string()
        } else {
            config.endpoints.faucet_url.clone()
        };
        let key_name = config.key_name();
        let credentials = self.create_account(AccountSpec {
            name: &config.name,
            key_name: &key_name,
            role: config.role,
            faucet_url: &faucet_url,
            network: config.network,
        })?;

        config.credentials = CredentialState::Set(credentials.clone());
        store.save(&config)?;
        ui::success(format!(
            "account created for {} '{}', credentials saved to {}",
            config.role,
            config.name,
            store.path().display()
        ));
        Ok(credentials)
    }

    fn create_account(&self, account: AccountSpec<'_>) -> Result<Credentials> {
        ui::step(format!("creating {} account '{}'...", account.role, account.name));
        let chain = ChainClient::new(self.runner, self.settings).ensure_installed()?;

        // the document has no credentials, so an entry under this name was
        // never saved and only blocks the add
        if chain.key_exists(account.key_name)? {
            warn!("removing unsaved keyring entry {}", account.key_name);
            ui::warn(format!(
                "keyring entry '{}' was left by an incomplete run and is replaced",
                account.key_name
            ));
            chain.delete_key(account.key_name)?;
        }

        let key = chain.add_key(account.key_name)?;
        let hex_private_key = chain.export_hex_key(account.key_name)?;
        let credentials = Credentials::new(key.mnemonic, hex_private_key, key.address)?;

        match request_funds(self.http, account.faucet_url, account.network, &credentials.address) {
            Ok(()) => ui::success(format!("requested faucet funds for {}", credentials.address)),
            Err(e) => {
                warn!("faucet request failed: {}", e);
                ui::warn(format!(
                    "could not fund {} from the faucet ({}); fund it manually before starting the node",
                    credentials.address, e
                ));
            }
        }

        Ok(credentials)
    }
}

pub fn faucet_request_url(faucet_url: &str, network: Network, address: &str) -> String {
    format!("{}/send/{}/{}", faucet_url.trim_end_matches('/'), network, address)
}

/// best-effort: callers log the error and carry on
pub fn request_funds(
    http: &dyn HttpClient,
    faucet_url: &str,
    network: Network,
    address: &str,
) -> Result<()> {
    let url = faucet_request_url(faucet_url, network, address);
    let body = http.get_text(&url)?;
    info!("faucet response: {}", body.trim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faucet_url() {
        assert_eq!(
            faucet_request_url("https://faucet.edgenet.allora.network/", Network::Edgenet, "allo1abc"),
            "https://faucet.edgenet.allora.network/send/edgenet/allo1abc"
        );
        assert_eq!(
            faucet_request_url("http://localhost:8000", Network::Testnet1, "allo1x"),
            "http://localhost:8000/send/testnet-1/allo1x"
        );
    }
}
