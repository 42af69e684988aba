//! scripted stand-ins for the external tools and the network

#![allow(dead_code)]

use allocmd_core::exec::{CommandOutput, CommandRunner, CommandSpec};
use allocmd_core::{Error, HttpClient, Result, Settings};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const ADDRESS: &str = "allo1zvq9z0ylu4e3pl9akwpxvd3kp8u5gzylr6zwsg";
pub const MNEMONIC: &str = "abandon ability able about above absent absorb abstract absurd abuse access accident account accuse achieve acid acoustic acquire across act action actor actress actual";
pub const HEX_KEY: &str = "4f3edf983ac636a65a842ce7c78d9aa706d3b113bce9c46f30d7d21715b23b1d";
pub const PEER_ID: &str = "12D3KooWJPx1dsAxkkSXJmjMgRpXHJN7vbnQnBj9ZtH5WBeoDeTA";
pub const PUBLIC_IP: &str = "203.0.113.7";
pub const HEADS: &str = "# heads\n/dns4/head-0/tcp/9527/p2p/12D3KooWA\n/dns4/head-1/tcp/9527/p2p/12D3KooWB\n";
pub const GOPATH: &str = "/nonexistent/go";
pub const KUBE_CONTEXT: &str = "kind-allora";

/// records every command and answers the ones allocmd parses. keeps a fake
/// keyring so entries behave like they do in allorad
#[derive(Default)]
pub struct MockRunner {
    pub calls: RefCell<Vec<CommandSpec>>,
    pub keyring: RefCell<BTreeSet<String>>,
    missing: Vec<String>,
    failing: Vec<String>,
    failing_once: RefCell<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `program` behaves as if it were not on PATH
    pub fn missing(mut self, program: &str) -> Self {
        self.missing.push(program.into());
        self
    }

    /// commands starting with `prefix` exit 1
    pub fn failing(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.into());
        self
    }

    /// the first command starting with `prefix` exits 1, later ones succeed
    pub fn failing_once(self, prefix: &str) -> Self {
        self.failing_once.borrow_mut().push(prefix.into());
        self
    }

    /// start with `name` already in the keyring
    pub fn with_key(self, name: &str) -> Self {
        self.keyring.borrow_mut().insert(name.into());
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(CommandSpec::display).collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.count(prefix) > 0
    }

    /// position of the first command starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.lines().iter().position(|l| l.starts_with(prefix))
    }

    pub fn find(&self, prefix: &str) -> Option<CommandSpec> {
        self.calls
            .borrow()
            .iter()
            .find(|spec| spec.display().starts_with(prefix))
            .cloned()
    }

    fn fails(&self, line: &str) -> bool {
        if self.failing.iter().any(|p| line.starts_with(p.as_str())) {
            return true;
        }
        let mut once = self.failing_once.borrow_mut();
        if let Some(i) = once.iter().position(|p| line.starts_with(p.as_str())) {
            once.remove(i);
            return true;
        }
        false
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());
        let line = spec.display();

        if self.missing.iter().any(|p| *p == spec.program) {
            return Err(Error::DependencyMissing(format!("'{}' not found", spec.program)));
        }
        if self.fails(&line) {
            return Ok(CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: format!("mock failure: {}\n", line),
            });
        }

        if spec.program == "allorad" && spec.args.first().map(String::as_str) == Some("keys") {
            return Ok(self.keys(spec));
        }

        let stdout = if line.starts_with("docker run") {
            write_identity(spec)?;
            String::new()
        } else if line == "go env GOPATH" {
            format!("{}\n", GOPATH)
        } else if line == "kubectl config current-context" {
            format!("{}\n", KUBE_CONTEXT)
        } else if line.starts_with("tar ") {
            extract_helm(spec)?;
            String::new()
        } else {
            String::new()
        };

        Ok(CommandOutput {
            code: Some(0),
            stdout,
            stderr: String::new(),
        })
    }
}

impl MockRunner {
    /// `allorad keys <verb> <name> ...` against the fake keyring
    fn keys(&self, spec: &CommandSpec) -> CommandOutput {
        let verb = spec.args.get(1).map(String::as_str).unwrap_or_default();
        let name = spec.args.get(2).cloned().unwrap_or_default();
        let mut keyring = self.keyring.borrow_mut();
        let ok = |stdout: String| CommandOutput {
            code: Some(0),
            stdout,
            stderr: String::new(),
        };
        let fail = |stderr: String| CommandOutput {
            code: Some(1),
            stdout: String::new(),
            stderr,
        };

        match (verb, keyring.contains(&name)) {
            ("add", true) => fail(format!("Error: aborted: key {} already exists\n", name)),
            ("add", false) => {
                keyring.insert(name.clone());
                ok(format!(
                    "{{\"name\":\"{}\",\"type\":\"local\",\"address\":\"{}\",\"mnemonic\":\"{}\"}}\n",
                    name, ADDRESS, MNEMONIC
                ))
            }
            ("show", true) => ok(format!("- address: {}\n  name: {}\n", ADDRESS, name)),
            ("delete", true) => {
                keyring.remove(&name);
                ok("Key deleted forever (uh oh!)\n".into())
            }
            ("export", true) => ok(format!("{}\n", HEX_KEY.to_uppercase())),
            (_, false) => fail(format!("Error: {} is not a valid name or address\n", name)),
            _ => fail(format!("Error: unknown command keys {}\n", verb)),
        }
    }
}

/// what the keygen image leaves behind in the mounted data dir
fn write_identity(spec: &CommandSpec) -> Result<()> {
    let host = spec
        .args
        .iter()
        .find_map(|arg| arg.strip_suffix(":/data"))
        .ok_or_else(|| Error::Validation("docker run without a /data mount".into()))?;
    let keys = Path::new(host).join("keys");
    std::fs::create_dir_all(&keys)?;
    std::fs::write(keys.join("identity"), format!("{}\n", PEER_ID))?;
    Ok(())
}

/// drop an executable stub where `tar -C <dir>` was told to extract
fn extract_helm(spec: &CommandSpec) -> Result<()> {
    let dir = spec
        .args
        .iter()
        .skip_while(|arg| arg.as_str() != "-C")
        .nth(1)
        .ok_or_else(|| Error::Validation("tar without -C".into()))?;
    std::fs::write(Path::new(dir).join("helm"), "#!/bin/sh\n")?;
    Ok(())
}

/// canned responses keyed by url suffix; everything else is an empty 200
#[derive(Default)]
pub struct MockHttp {
    pub requests: RefCell<Vec<String>>,
    failing: Vec<String>,
    texts: Vec<(String, String)>,
    bytes: Vec<u8>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// requests to urls containing `pattern` fail
    pub fn failing(mut self, pattern: &str) -> Self {
        self.failing.push(pattern.into());
        self
    }

    pub fn text(mut self, suffix: &str, body: &str) -> Self {
        self.texts.push((suffix.into(), body.into()));
        self
    }

    pub fn bytes(mut self, body: &[u8]) -> Self {
        self.bytes = body.to_vec();
        self
    }

    pub fn requested(&self, pattern: &str) -> bool {
        self.requests.borrow().iter().any(|url| url.contains(pattern))
    }

    fn record(&self, url: &str) -> Result<()> {
        self.requests.borrow_mut().push(url.to_string());
        if self.failing.iter().any(|p| url.contains(p.as_str())) {
            return Err(Error::Network(format!("{}: connection refused", url)));
        }
        Ok(())
    }
}

impl HttpClient for MockHttp {
    fn get_text(&self, url: &str) -> Result<String> {
        self.record(url)?;
        if let Some((_, body)) = self.texts.iter().find(|(suffix, _)| url.ends_with(suffix.as_str())) {
            return Ok(body.clone());
        }
        let body = if url.ends_with("heads.txt") {
            HEADS.to_string()
        } else if url.contains("ipify") {
            PUBLIC_IP.to_string()
        } else if url.contains("/send/") {
            "{\"status\":\"ok\"}".to_string()
        } else {
            String::new()
        };
        Ok(body)
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.record(url)?;
        Ok(self.bytes.clone())
    }
}

/// settings whose home lives inside the test's temp dir
pub fn settings(home: &Path) -> Settings {
    Settings {
        home: home.join("allocmd-home"),
        ..Settings::default()
    }
}

pub fn entries(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|rd| rd.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default();
    found.sort();
    found
}
