//! template rendering
//!
//! templates are compiled into the binary and use `{{ key }}` placeholders.
//! rendering is a pure function of (template, context); a placeholder without a
//! value is an error rather than an empty string.

use crate::error::{Error, Result};
use crate::types::Role;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    Dockerfile,
    DockerCompose,
    Requirements,
    GitIgnore,
    Env,
    Config,
    ProdDockerCompose,
    InitScript,
    Values(Role),
}

impl TemplateId {
    pub fn name(&self) -> &'static str {
        match self {
            TemplateId::Dockerfile => "dockerfile",
            TemplateId::DockerCompose => "docker-compose",
            TemplateId::Requirements => "requirements",
            TemplateId::GitIgnore => "gitignore",
            TemplateId::Env => "env",
            TemplateId::Config => "config",
            TemplateId::ProdDockerCompose => "prod-docker-compose",
            TemplateId::InitScript => "init-script",
            TemplateId::Values(Role::Worker) => "values-worker",
            TemplateId::Values(Role::Reputer) => "values-reputer",
            TemplateId::Values(Role::Validator) => "values-validator",
        }
    }

    /// file the template renders into
    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateId::Dockerfile => "Dockerfile",
            TemplateId::DockerCompose => "docker-compose.yaml",
            TemplateId::Requirements => "requirements.txt",
            TemplateId::GitIgnore => ".gitignore",
            TemplateId::Env => ".env",
            TemplateId::Config => crate::config::CONFIG_FILE,
            TemplateId::ProdDockerCompose => "prod-docker-compose.yaml",
            TemplateId::InitScript => "init.sh",
            TemplateId::Values(_) => "values.yaml",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            TemplateId::Dockerfile => include_str!("../templates/Dockerfile.tmpl"),
            TemplateId::DockerCompose => include_str!("../templates/docker-compose.yaml.tmpl"),
            TemplateId::Requirements => include_str!("../templates/requirements.txt.tmpl"),
            TemplateId::GitIgnore => include_str!("../templates/gitignore.tmpl"),
            TemplateId::Env => include_str!("../templates/env.tmpl"),
            TemplateId::Config => include_str!("../templates/config.yaml.tmpl"),
            TemplateId::ProdDockerCompose => {
                include_str!("../templates/prod-docker-compose.yaml.tmpl")
            }
            TemplateId::InitScript => include_str!("../templates/init.sh.tmpl"),
            TemplateId::Values(Role::Worker) => include_str!("../templates/values-worker.yaml.tmpl"),
            TemplateId::Values(Role::Reputer) => {
                include_str!("../templates/values-reputer.yaml.tmpl")
            }
            TemplateId::Values(Role::Validator) => {
                include_str!("../templates/values-validator.yaml.tmpl")
            }
        }
    }
}

/// named values substituted into a template
pub type Context = BTreeMap<&'static str, String>;

pub trait Renderer {
    fn render(&self, template: TemplateId, context: &Context) -> Result<String>;
}

/// renders the templates shipped with allocmd
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplates;

impl Renderer for EmbeddedTemplates {
    fn render(&self, template: TemplateId, context: &Context) -> Result<String> {
        substitute(template.name(), template.source(), context)
    }
}

fn substitute(name: &str, source: &str, context: &Context) -> Result<String> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| Error::Template(format!("{}: unclosed placeholder", name)))?;
        let key = after[..end].trim();
        let value = context
            .get(key)
            .ok_or_else(|| Error::Template(format!("{}: no value for '{}'", name, key)))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    Ok(out)
}

/// render one template into `dir`, overwriting any existing file
pub fn write_template(
    renderer: &dyn Renderer,
    template: TemplateId,
    context: &Context,
    dir: &Path,
) -> Result<PathBuf> {
    let content = renderer.render(template, context)?;
    let path = dir.join(template.file_name());
    std::fs::write(&path, content)?;
    debug!("rendered {} -> {}", template.name(), path.display());
    Ok(path)
}
