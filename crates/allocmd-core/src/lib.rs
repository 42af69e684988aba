//! # allocmd-core
//!
//! scaffolding and deployment for allora worker, reputer and validator nodes.
//!
//! nothing here talks to the chain directly. the library renders project files
//! from embedded templates, drives external tools (docker, allorad, kubectl,
//! helm) through [`exec::CommandRunner`] and keeps one node's state in a
//! `config.yaml` document.
//!
//! ## flow
//!
//! ```text
//! init --env dev    Scaffolder ─┬─ docker (identity) ─ http (heads, ip)
//!                               ├─ Renderer ──> <name>/<role>/*
//!                               └─ CredentialBootstrapper ─ allorad ─ faucet
//!                                             └─> config.yaml
//! init --env prod   Scaffolder ── config.yaml ── Renderer ──> prod compose, init.sh
//! deploy            Deployer ── kubectl ── helm ── CredentialBootstrapper
//!                            └─ Renderer ──> values.yaml ── helm upgrade --install
//! ```

pub mod chain;
pub mod compose;
pub mod config;
pub mod credentials;
pub mod deploy;
pub mod error;
pub mod exec;
pub mod http;
pub mod keys;
pub mod networks;
pub mod render;
pub mod scaffold;
pub mod settings;
pub mod types;
pub mod ui;

pub use config::{ConfigStore, CredentialState, Credentials, Endpoints, ImageRef, NodeConfig};
pub use credentials::CredentialBootstrapper;
pub use deploy::Deployer;
pub use error::{Error, Result};
pub use exec::{CommandRunner, CommandSpec, SystemRunner};
pub use http::{HttpClient, ReqwestClient};
pub use render::{EmbeddedTemplates, Renderer, TemplateId};
pub use scaffold::{ScaffoldRequest, Scaffolder};
pub use settings::Settings;
pub use types::{Environment, Network, Role};
