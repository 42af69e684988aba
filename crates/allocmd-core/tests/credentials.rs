mod common;

use allocmd_core::{
    ConfigStore, CredentialBootstrapper, CredentialState, Credentials, Error, Network, NodeConfig,
    Role,
};
use common::{settings, MockHttp, MockRunner, ADDRESS, GOPATH, HEX_KEY, MNEMONIC};
use std::path::Path;
use tempfile::tempdir;

fn unset_store(dir: &Path) -> ConfigStore {
    let store = ConfigStore::in_dir(dir);
    store
        .save(&NodeConfig::new("alice", Role::Worker, Network::Edgenet, Some(7)))
        .unwrap();
    store
}

#[test]
fn test_existing_credentials_touch_nothing() {
    let tmp = tempdir().unwrap();
    let settings = settings(tmp.path());
    let store = ConfigStore::in_dir(tmp.path());
    let existing = Credentials::new(MNEMONIC.into(), HEX_KEY.into(), "allo1existing".into()).unwrap();
    let mut config = NodeConfig::new("alice", Role::Reputer, Network::Testnet1, Some(2));
    config.credentials = CredentialState::Set(existing.clone());
    store.save(&config).unwrap();
    let before = std::fs::read(store.path()).unwrap();

    let runner = MockRunner::new();
    let http = MockHttp::new();
    let got = CredentialBootstrapper::new(&runner, &http, &settings)
        .ensure_account(&store)
        .unwrap();

    assert_eq!(got, existing);
    assert!(runner.lines().is_empty());
    assert!(http.requests.borrow().is_empty());
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
}

#[test]
fn test_account_created_once() {
    let tmp = tempdir().unwrap();
    let settings = settings(tmp.path());
    let store = unset_store(tmp.path());
    let runner = MockRunner::new();
    let http = MockHttp::new();
    let bootstrapper = CredentialBootstrapper::new(&runner, &http, &settings);

    let first = bootstrapper.ensure_account(&store).unwrap();
    let second = bootstrapper.ensure_account(&store).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.address, ADDRESS);
    assert_eq!(runner.count("allorad keys add"), 1);
    assert_eq!(runner.count("allorad keys export"), 1);

    let add = runner.find("allorad keys add").unwrap();
    assert!(add.args.windows(2).any(|w| w == ["--keyring-backend", "test"]));
    let export = runner.find("allorad keys export").unwrap();
    assert_eq!(export.stdin.as_deref(), Some("y\n"));

    assert_eq!(store.load().unwrap().credentials.get(), Some(&first));
}

#[test]
fn test_failure_leaves_document_unchanged() {
    for step in ["allorad keys add", "allorad keys export"] {
        let tmp = tempdir().unwrap();
        let settings = settings(tmp.path());
        let store = unset_store(tmp.path());
        let before = std::fs::read(store.path()).unwrap();

        let runner = MockRunner::new().failing(step);
        let http = MockHttp::new();
        let err = CredentialBootstrapper::new(&runner, &http, &settings)
            .ensure_account(&store)
            .unwrap_err();

        assert!(matches!(err, Error::Subprocess { .. }), "{}", err);
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }
}

#[test]
fn test_faucet_failure_is_not_fatal() {
    let tmp = tempdir().unwrap();
    let settings = settings(tmp.path());
    let store = unset_store(tmp.path());
    let runner = MockRunner::new();
    let http = MockHttp::new().failing("/send/");

    let credentials = CredentialBootstrapper::new(&runner, &http, &settings)
        .ensure_account(&store)
        .unwrap();

    assert!(http.requested(&format!("/send/edgenet/{}", ADDRESS)));
    assert_eq!(store.load().unwrap().credentials.get(), Some(&credentials));
}

#[test]
fn test_missing_build_tools() {
    let tmp = tempdir().unwrap();
    let settings = settings(tmp.path());
    let store = unset_store(tmp.path());
    let before = std::fs::read(store.path()).unwrap();
    let runner = MockRunner::new().missing("allorad").missing("make");
    let http = MockHttp::new();

    let err = CredentialBootstrapper::new(&runner, &http, &settings)
        .ensure_account(&store)
        .unwrap_err();

    match err {
        Error::DependencyMissing(message) => assert!(message.contains("'make'")),
        other => panic!("unexpected error: {}", other),
    }
    assert!(!runner.ran("git clone"));
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
}

#[test]
fn test_chain_client_built_from_source() {
    let tmp = tempdir().unwrap();
    let settings = settings(tmp.path());
    let store = unset_store(tmp.path());
    let path_before = std::env::var_os("PATH");
    let runner = MockRunner::new().failing_once("allorad version");
    let http = MockHttp::new();

    CredentialBootstrapper::new(&runner, &http, &settings)
        .ensure_account(&store)
        .unwrap();

    let clone = runner.find("git clone").unwrap();
    assert!(clone.args.contains(&settings.chain_repo));
    assert!(clone.args.contains(&settings.chain_dir().to_string_lossy().into_owned()));

    let make = runner.find("make install").unwrap();
    assert_eq!(make.cwd.as_deref(), Some(settings.chain_dir().as_path()));
    let path = make.env.get("PATH").unwrap();
    assert!(path.contains(&format!("{}/bin", GOPATH)));

    // child PATH only, never the process environment
    assert_eq!(std::env::var_os("PATH"), path_before);
    let add = runner.find("allorad keys add").unwrap();
    assert_eq!(add.env.get("PATH"), Some(path));
    assert!(runner.position("make install").unwrap() < runner.position("allorad keys add").unwrap());
}

#[test]
fn test_retry_replaces_unsaved_keyring_entry() {
    let tmp = tempdir().unwrap();
    let settings = settings(tmp.path());
    let store = unset_store(tmp.path());
    let runner = MockRunner::new().failing_once("allorad keys export");
    let http = MockHttp::new();
    let bootstrapper = CredentialBootstrapper::new(&runner, &http, &settings);

    assert!(bootstrapper.ensure_account(&store).is_err());
    assert!(runner.keyring.borrow().contains("alice-worker"));
    assert!(store.load().unwrap().credentials.is_unset());

    let credentials = bootstrapper.ensure_account(&store).unwrap();
    assert_eq!(credentials.address, ADDRESS);
    assert_eq!(runner.count("allorad keys delete alice-worker -y"), 1);
    assert_eq!(runner.count("allorad keys add alice-worker "), 2);
    assert!(runner.position("allorad keys delete").unwrap() < runner.lines().len() - 2);
    assert_eq!(store.load().unwrap().credentials.get(), Some(&credentials));
}

#[test]
fn test_keyring_entry_is_per_role() {
    let tmp = tempdir().unwrap();
    let settings = settings(tmp.path());
    let runner = MockRunner::new().with_key("alice");
    let http = MockHttp::new();

    let worker_dir = tmp.path().join("worker");
    let reputer_dir = tmp.path().join("reputer");
    std::fs::create_dir_all(&worker_dir).unwrap();
    std::fs::create_dir_all(&reputer_dir).unwrap();
    let worker = unset_store(&worker_dir);
    let reputer = ConfigStore::in_dir(&reputer_dir);
    reputer
        .save(&NodeConfig::new("alice", Role::Reputer, Network::Edgenet, Some(7)))
        .unwrap();

    let bootstrapper = CredentialBootstrapper::new(&runner, &http, &settings);
    bootstrapper.ensure_account(&worker).unwrap();
    bootstrapper.ensure_account(&reputer).unwrap();

    let keyring = runner.keyring.borrow();
    assert!(keyring.contains("alice-worker"));
    assert!(keyring.contains("alice-reputer"));
    // an unrelated entry with the bare node name is left alone
    assert!(keyring.contains("alice"));
    assert!(!runner.ran("allorad keys delete"));
}
