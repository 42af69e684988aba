//! node project generation
//!
//! `dev` creates `<name>/<role>/` with everything needed to run the node
//! locally and bootstraps its account. `prod` runs inside such a directory and
//! adds the production compose file and an init script.

use crate::config::{ConfigStore, CredentialState, NodeConfig};
use crate::credentials::CredentialBootstrapper;
use crate::error::{Error, Result};
use crate::exec::{CommandRunner, CommandSpec, Stdio};
use crate::http::HttpClient;
use crate::networks::{parse_boot_nodes, FALLBACK_PUBLIC_IP, PUBLIC_IP_URL};
use crate::render::{write_template, Context, Renderer, TemplateId};
use crate::settings::Settings;
use crate::types::{Environment, Network, Role};
use crate::ui;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// files a dev scaffold writes, in order
pub const DEV_TEMPLATES: [TemplateId; 6] = [
    TemplateId::Dockerfile,
    TemplateId::DockerCompose,
    TemplateId::Requirements,
    TemplateId::GitIgnore,
    TemplateId::Env,
    TemplateId::Config,
];

/// files a prod scaffold writes, in order
pub const PROD_TEMPLATES: [TemplateId; 2] = [TemplateId::ProdDockerCompose, TemplateId::InitScript];

/// the dev artifact a prod scaffold builds on
pub const DEV_COMPOSE_FILE: &str = "docker-compose.yaml";

const IDENTITY_FILE: &str = "data/keys/identity";

#[derive(Debug, Clone)]
pub struct ScaffoldRequest {
    pub environment: Environment,
    /// defaults to worker for dev; prod takes it from config.yaml
    pub role: Option<Role>,
    pub name: Option<String>,
    pub topic_id: Option<u64>,
    /// defaults to edgenet for dev; prod takes it from config.yaml
    pub network: Option<Network>,
}

pub struct Scaffolder<'a> {
    runner: &'a dyn CommandRunner,
    http: &'a dyn HttpClient,
    renderer: &'a dyn Renderer,
    settings: &'a Settings,
}

impl<'a> Scaffolder<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        http: &'a dyn HttpClient,
        renderer: &'a dyn Renderer,
        settings: &'a Settings,
    ) -> Self {
        Self {
            runner,
            http,
            renderer,
            settings,
        }
    }

    /// generate the project under `base_dir` and return the directory written to
    pub fn scaffold(&self, base_dir: &Path, request: &ScaffoldRequest) -> Result<PathBuf> {
        match request.environment {
            Environment::Dev => self.scaffold_dev(base_dir, request),
            Environment::Prod => self.scaffold_prod(base_dir, request),
        }
    }

    fn scaffold_dev(&self, base_dir: &Path, request: &ScaffoldRequest) -> Result<PathBuf> {
        let role = request.role.unwrap_or(Role::Worker);
        let name = request
            .name
            .as_deref()
            .ok_or_else(|| Error::Validation("--name is required for a dev scaffold".into()))?;
        validate_name(name)?;
        let topic_id = match (role.requires_topic(), request.topic_id) {
            (true, None) => {
                return Err(Error::Validation(format!(
                    "--topic is required for a dev {} scaffold",
                    role
                )))
            }
            (true, topic) => topic,
            (false, _) => None,
        };

        let network = request.network.unwrap_or(Network::Edgenet);

        ensure_docker_running(self.runner)?;

        let node_dir = base_dir.join(name).join(role.as_str());
        let store = ConfigStore::in_dir(&node_dir);
        // a rerun regenerates files but keeps the account and deploy settings
        let previous = if store.exists() {
            Some(store.load()?)
        } else {
            None
        };

        ui::note(format!("bootstrapping '{}'...", node_dir.display()));
        std::fs::create_dir_all(node_dir.join("data"))?;

        let peer_id = self.generate_identity(&node_dir)?;

        let mut config = NodeConfig::new(name, role, network, topic_id);
        config.endpoints.boot_nodes = self.fetch_boot_nodes(network);
        let public_ip = self.fetch_public_ip();

        let mut context = node_context(&config, self.settings);
        context.insert("peer_id", peer_id);
        context.insert("public_ip", public_ip);

        for template in DEV_TEMPLATES {
            let path = write_template(self.renderer, template, &context, &node_dir)?;
            info!("created {}", path.display());
        }

        if let Some(previous) = previous {
            let mut fresh = store.load()?;
            if let CredentialState::Set(credentials) = &previous.credentials {
                info!("keeping account {} from the existing config", credentials.address);
            }
            fresh.credentials = previous.credentials;
            fresh.image = previous.image;
            fresh.extra = previous.extra;
            store.save(&fresh)?;
        }

        CredentialBootstrapper::new(self.runner, self.http, self.settings).ensure_account(&store)?;

        ui::success(format!("all files bootstrapped in {}", node_dir.display()));
        Ok(node_dir)
    }

    fn scaffold_prod(&self, base_dir: &Path, request: &ScaffoldRequest) -> Result<PathBuf> {
        if request.name.is_some() || request.topic_id.is_some() || request.network.is_some() {
            return Err(Error::Validation(
                "--name, --topic and --network only apply to --env dev; prod reads them from config.yaml"
                    .into(),
            ));
        }

        if !base_dir.join(DEV_COMPOSE_FILE).is_file() {
            return Err(Error::Validation(format!(
                "{} not found in {}. run `allocmd init --env dev` first, then run this command from inside the generated node directory",
                DEV_COMPOSE_FILE,
                base_dir.display()
            )));
        }

        ensure_docker_running(self.runner)?;

        let store = ConfigStore::in_dir(base_dir);
        let config = store.load()?;
        if let Some(role) = request.role {
            if role != config.role {
                return Err(Error::Validation(format!(
                    "--type {} does not match the {} configured in {}",
                    role,
                    config.role,
                    store.path().display()
                )));
            }
        }
        let credentials = match &config.credentials {
            CredentialState::Set(credentials) => credentials,
            CredentialState::Unset => {
                return Err(Error::config(
                    store.path(),
                    "no account credentials yet; rerun `allocmd init --env dev`",
                ))
            }
        };

        let mut context = node_context(&config, self.settings);
        context.insert("address", credentials.address.clone());

        for template in PROD_TEMPLATES {
            let path = write_template(self.renderer, template, &context, base_dir)?;
            info!("created {}", path.display());
        }
        make_executable(&base_dir.join(TemplateId::InitScript.file_name()))?;

        ui::success(format!(
            "production files generated. run ./{} on the target machine",
            TemplateId::InitScript.file_name()
        ));
        Ok(base_dir.to_path_buf())
    }

    /// run the key generation image against `<node_dir>/data` and read back the peer id
    fn generate_identity(&self, node_dir: &Path) -> Result<String> {
        let data_dir = std::fs::canonicalize(node_dir.join("data"))?;
        self.runner.run_checked(
            &CommandSpec::new("docker")
                .args(["run", "--rm", "--entrypoint=bash", "-v"])
                .arg(format!("{}:/data", data_dir.display()))
                .arg(self.settings.keygen_image.as_str())
                .args(["-c", "mkdir -p /data/keys && cd /data/keys && allora-keys"]),
        )?;

        let identity_path = node_dir.join(IDENTITY_FILE);
        let identity = std::fs::read_to_string(&identity_path)
            .map_err(|_| Error::Parse(format!("node identity: {} was not created", identity_path.display())))?;
        let peer_id = identity.trim().to_string();
        if peer_id.is_empty() {
            return Err(Error::Parse(format!("node identity: {} is empty", identity_path.display())));
        }
        ui::note("node identity generated");
        Ok(peer_id)
    }

    fn fetch_boot_nodes(&self, network: Network) -> String {
        let Some(url) = network.params().heads_url else {
            return String::new();
        };
        match self.http.get_text(url) {
            Ok(body) => parse_boot_nodes(&body),
            Err(e) => {
                warn!("head node list unavailable: {}", e);
                ui::warn(format!("could not fetch {} head nodes; boot_nodes left empty", network));
                String::new()
            }
        }
    }

    fn fetch_public_ip(&self) -> String {
        match self.http.get_text(PUBLIC_IP_URL) {
            Ok(body) if !body.trim().is_empty() => body.trim().to_string(),
            Ok(_) | Err(_) => {
                warn!("public ip lookup failed, using {}", FALLBACK_PUBLIC_IP);
                FALLBACK_PUBLIC_IP.to_string()
            }
        }
    }
}

/// fail fast when the docker daemon is unreachable
pub fn ensure_docker_running(runner: &dyn CommandRunner) -> Result<()> {
    let info = CommandSpec::new("docker").arg("info").stdio(Stdio::Capture);
    match runner.run(&info) {
        Ok(output) if output.success() => Ok(()),
        Ok(_) => Err(Error::DependencyMissing(
            "docker is not running. start the docker daemon and try again.".into(),
        )),
        Err(e) => Err(e),
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "invalid name '{}': use letters, digits, '-' and '_', starting with a letter or digit",
            name
        )))
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// command line the node container runs
pub fn node_command(config: &NodeConfig) -> String {
    let topic = config.topic_id.map(|t| t.to_string()).unwrap_or_default();
    match config.role {
        Role::Worker | Role::Reputer => {
            let mut command = format!(
                "allora-node --role=worker --peer-db=/data/peerdb --function-db=/data/function-db \
                 --runtime-path=/app/runtime --runtime-cli=bls-runtime --workspace=/data/workspace \
                 --private-key=/data/keys/priv.bin --log-level=info --port=9011 \
                 --boot-nodes={} --topic=allora-topic-{}-{} --allora-chain-key-name={} \
                 --allora-node-rpc-address={} --allora-chain-topic-id={}",
                config.endpoints.boot_nodes,
                topic,
                config.role,
                config.key_name(),
                config.endpoints.rpc_address,
                topic,
            );
            if config.role == Role::Reputer {
                command.push_str(" --allora-chain-worker-mode=reputer");
            }
            command
        }
        Role::Validator => format!(
            "allorad start --home=/data --moniker={} --p2p.persistent_peers={} --rpc.laddr=tcp://0.0.0.0:26657",
            config.name, config.endpoints.boot_nodes,
        ),
    }
}

/// template values every node file can use
pub fn node_context(config: &NodeConfig, settings: &Settings) -> Context {
    let node_image = match config.role {
        Role::Validator => settings.validator_image.clone(),
        Role::Worker | Role::Reputer => settings.node_image.clone(),
    };

    let mut context = Context::new();
    context.insert("name", config.name.clone());
    context.insert("role", config.role.to_string());
    context.insert("network", config.network.to_string());
    context.insert(
        "topic_id",
        config.topic_id.map(|t| t.to_string()).unwrap_or_default(),
    );
    context.insert("chain_id", config.network.params().chain_id.to_string());
    context.insert("rpc_address", config.endpoints.rpc_address.clone());
    context.insert("api_address", config.endpoints.api_address.clone());
    context.insert("faucet_url", config.endpoints.faucet_url.clone());
    context.insert("boot_nodes", config.endpoints.boot_nodes.clone());
    context.insert("node_image", node_image);
    context.insert("keygen_image", settings.keygen_image.clone());
    context.insert("node_command", node_command(config));
    context
}
