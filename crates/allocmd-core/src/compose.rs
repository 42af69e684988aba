//! local start/stop of a scaffolded node through `docker compose`

use crate::error::{Error, Result};
use crate::exec::{CommandRunner, CommandSpec, Stdio};
use crate::scaffold::DEV_COMPOSE_FILE;
use crate::ui;
use std::path::Path;

fn require_compose_file(dir: &Path) -> Result<()> {
    if dir.join(DEV_COMPOSE_FILE).is_file() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} does not exist in {}. run this command from a node directory",
            DEV_COMPOSE_FILE,
            dir.display()
        )))
    }
}

fn compose(dir: &Path) -> CommandSpec {
    CommandSpec::new("docker")
        .args(["compose", "-f", DEV_COMPOSE_FILE])
        .cwd(dir)
        .stdio(Stdio::Inherit)
}

/// build and start the node in the background, optionally following its logs
pub fn run(runner: &dyn CommandRunner, dir: &Path, follow_logs: bool) -> Result<()> {
    require_compose_file(dir)?;

    ui::step("starting node on the local machine...");
    runner.run_checked(&compose(dir).args(["up", "--build", "-d"]))?;
    ui::success("node started successfully.");

    if follow_logs {
        ui::note("following logs (press ctrl-c to stop)...");
        runner.run_checked(&compose(dir).args(["logs", "-f"]))?;
    } else {
        println!(
            "run {} to follow the logs, or {} to stop the node.",
            ui::paint("allocmd run --logs", ui::Color::Cyan),
            ui::paint("allocmd terminate", ui::Color::Cyan)
        );
    }
    Ok(())
}

pub fn terminate(runner: &dyn CommandRunner, dir: &Path) -> Result<()> {
    require_compose_file(dir)?;

    ui::step("stopping node on the local machine...");
    runner.run_checked(&compose(dir).arg("stop"))?;
    ui::success("node stopped successfully.");
    Ok(())
}
