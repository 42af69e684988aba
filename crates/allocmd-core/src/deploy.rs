//! production deployment through helm
//!
//! steps run in order and stop at the first failure; nothing already applied
//! (repository registration, a rendered values file) is rolled back.

use crate::config::{ConfigStore, ImageRef, NodeConfig};
use crate::credentials::CredentialBootstrapper;
use crate::error::{Error, Result};
use crate::exec::{CommandRunner, CommandSpec, Stdio};
use crate::http::HttpClient;
use crate::render::{write_template, Renderer, TemplateId};
use crate::scaffold::node_context;
use crate::settings::{Settings, CHART_NAME, CHART_REPO_NAME};
use crate::types::Role;
use crate::ui;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct Deployer<'a> {
    runner: &'a dyn CommandRunner,
    http: &'a dyn HttpClient,
    renderer: &'a dyn Renderer,
    settings: &'a Settings,
}

impl<'a> Deployer<'a> {
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

    /// deploy the node described by `<dir>/config.yaml` to the current cluster
    pub fn deploy(&self, dir: &Path, role: Role) -> Result<()> {
        let store = ConfigStore::in_dir(dir);
        let config = store.load()?;
        let image = check_deployable(&config, role, &store)?;

        let context_name = self.current_context()?;
        ui::note(format!("current kubernetes context: {}", context_name));

        let helm = HelmInstaller::new(self.runner, self.http, self.settings).ensure()?;

        ui::step(format!("adding the '{}' helm repository...", CHART_REPO_NAME));
        self.runner.run_checked(
            &CommandSpec::new(helm.as_str())
                .args(["repo", "add", CHART_REPO_NAME, self.settings.chart_repo.as_str()])
                .arg("--force-update"),
        )?;
        self.runner
            .run_checked(&CommandSpec::new(helm.as_str()).args(["repo", "update"]))?;
        ui::success(format!("'{}' repository added and updated", CHART_REPO_NAME));

        let credentials = CredentialBootstrapper::new(self.runner, self.http, self.settings)
            .ensure_account(&store)?;

        let mut context = node_context(&config, self.settings);
        context.insert("image_uri", image.uri.clone());
        context.insert("image_tag", image.tag.clone());
        context.insert("mnemonic", credentials.mnemonic.clone());
        context.insert("hex_private_key", credentials.hex_private_key.clone());
        context.insert("address", credentials.address.clone());
        let values = write_template(self.renderer, TemplateId::Values(role), &context, dir)?;
        info!("rendered {}", values.display());

        ui::step(format!("installing chart '{}' as release '{}'...", CHART_NAME, config.name));
        self.runner.run_checked(
            &CommandSpec::new(helm.as_str())
                .args(["upgrade", "--install", config.name.as_str(), CHART_NAME, "-f"])
                .arg(values.to_string_lossy())
                .stdio(Stdio::Inherit),
        )?;
        ui::success(format!("{} '{}' deployed", role, config.name));
        Ok(())
    }

    fn current_context(&self) -> Result<String> {
        let guidance = "failed to get the current kubernetes context. is kubectl configured with your cluster as the current context?";
        let output = self
            .runner
            .run(&CommandSpec::new("kubectl").args(["config", "current-context"]))
            .map_err(|e| match e {
                Error::DependencyMissing(_) => Error::DependencyMissing(guidance.into()),
                other => other,
            })?;
        let context = output.stdout.trim();
        if !output.success() || context.is_empty() {
            return Err(Error::Subprocess {
                command: "kubectl config current-context".into(),
                code: output.code,
                stderr: format!("{} {}", guidance, output.stderr.trim()),
            });
        }
        Ok(context.to_string())
    }
}

fn check_deployable(config: &NodeConfig, role: Role, store: &ConfigStore) -> Result<ImageRef> {
    if config.role != role {
        return Err(Error::Validation(format!(
            "--type {} does not match the {} configured in {}",
            role,
            config.role,
            store.path().display()
        )));
    }
    config.image.clone().ok_or_else(|| {
        Error::Validation(format!(
            "set image.uri and image.tag in {} to the image you pushed before deploying",
            store.path().display()
        ))
    })
}

/// finds helm, or installs a pinned release after checking its sha256
pub struct HelmInstaller<'a> {
    runner: &'a dyn CommandRunner,
    http: &'a dyn HttpClient,
    settings: &'a Settings,
}

impl<'a> HelmInstaller<'a> {
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

    /// program to invoke helm with
    pub fn ensure(&self) -> Result<String> {
        if self.runner.probe(&helm_version("helm")) {
            ui::success("helm is already installed");
            return Ok("helm".into());
        }

        let local = self.settings.bin_dir().join("helm");
        let local_program = local.to_string_lossy().into_owned();
        if local.is_file() && self.runner.probe(&helm_version(&local_program)) {
            debug!("using {}", local.display());
            return Ok(local_program);
        }

        ui::step(format!("installing helm v{}...", self.settings.helm_version));
        self.install(&local)?;
        if !self.runner.probe(&helm_version(&local_program)) {
            return Err(Error::DependencyMissing(format!(
                "helm was installed to {} but does not run",
                local.display()
            )));
        }
        ui::success(format!("helm installed to {}", local.display()));
        Ok(local_program)
    }

    fn install(&self, target: &Path) -> Result<()> {
        let platform = helm_platform()?;
        let archive_name = format!("helm-v{}-{}.tar.gz", self.settings.helm_version, platform);
        let url = format!("https://get.helm.sh/{}", archive_name);

        let expected = self
            .http
            .get_text(&format!("{}.sha256sum", url))
            .map_err(|e| Error::DependencyMissing(format!("cannot download helm checksum: {}", e)))?;
        let expected = parse_sha256sum(&expected, &archive_name)?;

        let archive = self
            .http
            .get_bytes(&url)
            .map_err(|e| Error::DependencyMissing(format!("cannot download helm: {}", e)))?;
        verify_sha256(&archive, &expected, &archive_name)?;

        let bin_dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&bin_dir)?;
        let archive_path = bin_dir.join(&archive_name);
        std::fs::write(&archive_path, &archive)?;

        let extracted = self.runner.run_checked(
            &CommandSpec::new("tar")
                .arg("-xzf")
                .arg(archive_path.to_string_lossy())
                .arg("-C")
                .arg(bin_dir.to_string_lossy())
                .arg("--strip-components=1")
                .arg(format!("{}/helm", platform)),
        );
        std::fs::remove_file(&archive_path)?;
        extracted?;
        Ok(())
    }
}

fn helm_version(program: &str) -> CommandSpec {
    CommandSpec::new(program).arg("version").stdio(Stdio::Null)
}

/// `<os>-<arch>` as used in helm release archive names
pub fn helm_platform() -> Result<String> {
    let os = match std::env::consts::OS {
        "linux" => "linux",
        "macos" => "darwin",
        other => {
            return Err(Error::DependencyMissing(format!(
                "no helm release for {}; install helm manually",
                other
            )))
        }
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "arm" => "arm",
        other => {
            return Err(Error::DependencyMissing(format!(
                "no helm release for {}; install helm manually",
                other
            )))
        }
    };
    Ok(format!("{}-{}", os, arch))
}

/// digest for `file` from a `sha256sum`-style listing
pub fn parse_sha256sum(listing: &str, file: &str) -> Result<String> {
    listing
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let digest = parts.next()?;
            let name = parts.next().map(|n| n.trim_start_matches('*'));
            match name {
                Some(name) if name != file => None,
                _ => Some(digest),
            }
        })
        .find(|digest| digest.len() == 64 && hex::decode(digest).is_ok())
        .map(str::to_lowercase)
        .ok_or_else(|| Error::Parse(format!("sha256 for {}", file)))
}

pub fn verify_sha256(data: &[u8], expected_hex: &str, what: &str) -> Result<()> {
    let actual = hex::encode(Sha256::digest(data));
    if actual == expected_hex.to_lowercase() {
        Ok(())
    } else {
        Err(Error::DependencyMissing(format!(
            "checksum mismatch for {}: expected {}, got {}",
            what, expected_hex, actual
        )))
    }
}
