//! allora chain client (`allorad`) provisioning and keyring access

use crate::error::{Error, Result};
use crate::exec::{CommandRunner, CommandSpec};
use crate::keys::{self, NewKey};
use crate::settings::Settings;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

pub const CHAIN_BINARY: &str = "allorad";
pub const KEYRING_BACKEND: &str = "test";

pub struct ChainClient<'a> {
    runner: &'a dyn CommandRunner,
    settings: &'a Settings,
}

/// a chain client known to be callable with `env`
pub struct InstalledChain<'a> {
    runner: &'a dyn CommandRunner,
    env: BTreeMap<String, String>,
}

impl<'a> ChainClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self { runner, settings }
    }

    /// PATH for chain client children: the inherited PATH plus go's bin dir,
    /// where `make install` puts allorad
    fn child_env(&self) -> Result<BTreeMap<String, String>> {
        let gopath = self
            .runner
            .run(&CommandSpec::new("go").args(["env", "GOPATH"]))
            .ok()
            .filter(|output| output.success())
            .map(|output| output.stdout.trim().to_string())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join("go")));

        let mut paths: Vec<PathBuf> = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        if let Some(gopath) = gopath {
            paths.push(gopath.join("bin"));
        }
        let joined = std::env::join_paths(paths)
            .map_err(|e| Error::DependencyMissing(format!("invalid PATH entry: {}", e)))?;

        let mut env = BTreeMap::new();
        env.insert("PATH".to_string(), joined.to_string_lossy().into_owned());
        Ok(env)
    }

    fn require(&self, program: &str, version_args: &[&str]) -> Result<()> {
        if self
            .runner
            .probe(&CommandSpec::new(program).args(version_args.iter().copied()))
        {
            Ok(())
        } else {
            Err(Error::DependencyMissing(format!(
                "'{}' is not available in the system's PATH. please install it or check your PATH settings.",
                program
            )))
        }
    }

    /// make sure allorad is callable, building it from source if needed
    pub fn ensure_installed(&self) -> Result<InstalledChain<'a>> {
        let env = self.child_env()?;
        let version = CommandSpec::new(CHAIN_BINARY).arg("version").envs(&env);
        if self.runner.probe(&version) {
            debug!("{} already installed", CHAIN_BINARY);
            return Ok(InstalledChain {
                runner: self.runner,
                env,
            });
        }

        info!("{} not found, building it from source", CHAIN_BINARY);
        self.require("make", &["--version"])?;
        self.require("git", &["--version"])?;
        self.require("go", &["version"])?;

        let chain_dir = self.settings.chain_dir();
        if !chain_dir.exists() {
            std::fs::create_dir_all(&self.settings.home)?;
            info!("cloning {} into {}", self.settings.chain_repo, chain_dir.display());
            self.runner.run_checked(
                &CommandSpec::new("git")
                    .args(["clone", "--depth", "1", self.settings.chain_repo.as_str()])
                    .arg(chain_dir.to_string_lossy()),
            )?;
        }

        self.runner.run_checked(
            &CommandSpec::new("make")
                .arg("install")
                .cwd(&chain_dir)
                .envs(&env),
        )?;

        if !self.runner.probe(&version) {
            return Err(Error::DependencyMissing(format!(
                "{} was built but cannot be found on PATH; check `go env GOPATH`",
                CHAIN_BINARY
            )));
        }

        Ok(InstalledChain {
            runner: self.runner,
            env,
        })
    }
}

impl InstalledChain<'_> {
    /// whether the keyring already holds an entry called `name`
    pub fn key_exists(&self, name: &str) -> Result<bool> {
        let output = self.runner.run(
            &CommandSpec::new(CHAIN_BINARY)
                .args(["keys", "show", name, "--keyring-backend", KEYRING_BACKEND])
                .envs(&self.env)
                .stdin(""),
        )?;
        Ok(output.success())
    }

    pub fn delete_key(&self, name: &str) -> Result<()> {
        self.runner.run_checked(
            &CommandSpec::new(CHAIN_BINARY)
                .args(["keys", "delete", name, "-y", "--keyring-backend", KEYRING_BACKEND])
                .envs(&self.env)
                .stdin("y\n"),
        )?;
        Ok(())
    }

    /// create keyring entry `name` and return its address and mnemonic
    pub fn add_key(&self, name: &str) -> Result<NewKey> {
        // empty stdin: an existing entry makes allorad fail instead of prompting
        let output = self.runner.run_checked(
            &CommandSpec::new(CHAIN_BINARY)
                .args(["keys", "add", name, "--keyring-backend", KEYRING_BACKEND])
                .args(["--output", "json"])
                .envs(&self.env)
                .stdin(""),
        )?;
        keys::parse_key_add(&output.combined())
    }

    /// export the unarmored hex private key of `name`
    pub fn export_hex_key(&self, name: &str) -> Result<String> {
        let output = self.runner.run_checked(
            &CommandSpec::new(CHAIN_BINARY)
                .args(["keys", "export", name, "--unarmored-hex", "--unsafe"])
                .args(["--keyring-backend", KEYRING_BACKEND])
                .envs(&self.env)
                .stdin("y\n"),
        )?;
        keys::parse_exported_hex(&output.combined())
    }
}
