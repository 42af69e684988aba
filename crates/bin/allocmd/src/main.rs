//! allocmd - create and deploy allora network nodes
//!
//! ## Usage
//!
//! ```bash
//! # scaffold a local worker for topic 7 on edgenet
//! allocmd init --env dev --type worker --name alice --topic 7 --network edgenet
//!
//! # from inside alice/worker: run it locally, then stop it
//! allocmd run --logs
//! allocmd terminate
//!
//! # add production compose + init script, then deploy to the current k8s context
//! allocmd init --env prod
//! allocmd deploy --type worker
//! ```

use allocmd_core::settings::{
    DEFAULT_CHAIN_REPO, DEFAULT_CHART_REPO, DEFAULT_HELM_VERSION, DEFAULT_KEYGEN_IMAGE,
    DEFAULT_NODE_IMAGE, DEFAULT_VALIDATOR_IMAGE,
};
use allocmd_core::ui::{self, Color};
use allocmd_core::{
    compose, Deployer, EmbeddedTemplates, Environment, Network, ReqwestClient, Role,
    ScaffoldRequest, Scaffolder, Settings, SystemRunner,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser)]
#[command(name = "allocmd")]
#[command(version, about = "Create and deploy Allora worker, reputer and validator nodes", long_about = None)]
struct Cli {
    /// Directory for the chain client checkout and downloaded tools
    #[arg(long, env = "ALLOCMD_HOME", global = true)]
    home: Option<PathBuf>,

    /// Image used to generate node identities
    #[arg(long, env = "ALLOCMD_KEYGEN_IMAGE", default_value = DEFAULT_KEYGEN_IMAGE, global = true)]
    keygen_image: String,

    /// Base image for worker and reputer nodes
    #[arg(long, env = "ALLOCMD_NODE_IMAGE", default_value = DEFAULT_NODE_IMAGE, global = true)]
    node_image: String,

    /// Base image for validator nodes
    #[arg(long, env = "ALLOCMD_VALIDATOR_IMAGE", default_value = DEFAULT_VALIDATOR_IMAGE, global = true)]
    validator_image: String,

    /// Git repository the chain client is built from
    #[arg(long, env = "ALLOCMD_CHAIN_REPO", default_value = DEFAULT_CHAIN_REPO, global = true)]
    chain_repo: String,

    /// Helm chart repository
    #[arg(long, env = "ALLOCMD_CHART_REPO", default_value = DEFAULT_CHART_REPO, global = true)]
    chart_repo: String,

    /// Helm release installed when helm is missing
    #[arg(long, env = "ALLOCMD_HELM_VERSION", default_value = DEFAULT_HELM_VERSION, global = true)]
    helm_version: String,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    yes: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a node directory with the necessary boilerplate
    #[command(alias = "generate")]
    Init {
        /// Target environment
        #[arg(long, value_enum, default_value_t = Environment::Dev)]
        env: Environment,

        /// Node type (dev defaults to worker, prod reads it from config.yaml)
        #[arg(long = "type", value_enum)]
        role: Option<Role>,

        /// Name of the node and its account
        #[arg(long)]
        name: Option<String>,

        /// Topic id the worker or reputer serves
        #[arg(long)]
        topic: Option<u64>,

        /// Network to join (dev only, defaults to edgenet)
        #[arg(long, value_enum)]
        network: Option<Network>,
    },

    /// Deploy the node in the current directory to your kubernetes cluster
    Deploy {
        /// Node type
        #[arg(long = "type", value_enum)]
        role: Role,
    },

    /// Start the node in the current directory locally
    Run {
        /// Follow logs after starting
        #[arg(long)]
        logs: bool,
    },

    /// Stop the locally running node in the current directory
    Terminate,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            home: self.home.clone().unwrap_or_else(Settings::default_home),
            keygen_image: self.keygen_image.clone(),
            node_image: self.node_image.clone(),
            validator_image: self.validator_image.clone(),
            chain_repo: self.chain_repo.clone(),
            chart_repo: self.chart_repo.clone(),
            helm_version: self.helm_version.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "allocmd=info,allocmd_core=info",
        1 => "allocmd=debug,allocmd_core=debug",
        _ => "allocmd=trace,allocmd_core=trace,reqwest=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::fatal(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings();
    debug!("settings: {:?}", settings);

    let cwd = std::env::current_dir().context("cannot read the current directory")?;
    let runner = SystemRunner;
    let renderer = EmbeddedTemplates;

    match cli.command {
        Commands::Init {
            env,
            role,
            name,
            topic,
            network,
        } => {
            ui::banner();
            println!("{}", ui::bold("Welcome to the Allora CLI!", Color::Green));
            ui::step("allocmd creates worker, reputer and validator nodes for the Allora chain.");
            match (env, &name) {
                (Environment::Dev, Some(name)) => ui::note(format!(
                    "\nthis command will generate files in '{}/{}'.",
                    name,
                    role.unwrap_or(Role::Worker)
                )),
                (Environment::Prod, _) => ui::note(format!(
                    "\nthis command will generate production files in '{}'.",
                    cwd.display()
                )),
                _ => {}
            }
            if !confirm(cli.yes)? {
                println!("{}", ui::paint("\nOperation cancelled.", Color::Red));
                return Ok(());
            }

            let http = ReqwestClient::new()?;
            let request = ScaffoldRequest {
                environment: env,
                role,
                name,
                topic_id: topic,
                network,
            };
            Scaffolder::new(&runner, &http, &renderer, &settings).scaffold(&cwd, &request)?;
        }
        Commands::Deploy { role } => {
            ui::banner();
            print_deploy_requirements();
            if !confirm(cli.yes)? {
                println!("{}", ui::paint("\nOperation cancelled.", Color::Red));
                return Ok(());
            }

            let http = ReqwestClient::new()?;
            Deployer::new(&runner, &http, &renderer, &settings).deploy(&cwd, role)?;
        }
        Commands::Run { logs } => compose::run(&runner, &cwd, logs)?,
        Commands::Terminate => compose::terminate(&runner, &cwd)?,
    }

    Ok(())
}

fn print_deploy_requirements() {
    println!("{}", ui::bold("\nREQUIREMENTS", Color::Yellow));
    ui::step(
        "1. build the Dockerfile and push the image to your registry; keep its uri and tag at hand.\n\
         2. configure your kubernetes cluster as the current context in your kubeconfig.\n\
         3. set image.uri and image.tag in ./config.yaml. the account is created for you if missing.",
    );
    println!("{}", ui::bold("\nDEPENDENCIES", Color::Yellow));
    ui::step(
        "1. kubectl: to reach your cluster.\n\
         2. helm: installed into the allocmd home (checksum verified) when missing.\n\
         3. make, git and go: only if allorad has to be built to create the account.",
    );
}

/// ask to proceed; enter means yes
fn confirm(assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    print!("{} [Y/n]: ", ui::bold("\nWould you like to proceed?", Color::White));
    std::io::stdout().flush()?;
    read_answer(&mut std::io::stdin().lock())
}

/// closed input is a refusal, so non-interactive runs need --yes
fn read_answer(input: &mut impl BufRead) -> Result<bool> {
    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        println!();
        return Ok(false);
    }
    Ok(parse_answer(&answer))
}

fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}
