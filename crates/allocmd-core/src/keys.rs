//! parsing of `allorad keys` output
//!
//! the only place that knows what the chain client prints. `keys add` is asked
//! for json; the plain text layout (`address: <token>` line, mnemonic on the last
//! line) is accepted as a fallback for client builds that ignore `--output`.

use crate::error::{Error, Result};
use serde::Deserialize;

/// address and mnemonic of a freshly created key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKey {
    pub address: String,
    pub mnemonic: String,
}

#[derive(Deserialize)]
struct KeyAddJson {
    address: String,
    #[serde(default)]
    mnemonic: Option<String>,
}

const MNEMONIC_LENGTHS: [usize; 5] = [12, 15, 18, 21, 24];

pub fn parse_key_add(output: &str) -> Result<NewKey> {
    if let Some(key) = parse_key_add_json(output) {
        return Ok(key);
    }

    let address = parse_address(output)?;
    let mnemonic = parse_mnemonic(output)?;
    Ok(NewKey { address, mnemonic })
}

fn parse_key_add_json(output: &str) -> Option<NewKey> {
    std::iter::once(output.trim())
        .chain(output.lines().map(str::trim))
        .filter(|candidate| candidate.starts_with('{'))
        .filter_map(|candidate| serde_json::from_str::<KeyAddJson>(candidate).ok())
        .find_map(|parsed| {
            let mnemonic = parsed.mnemonic?.trim().to_string();
            let address = parsed.address.trim().to_string();
            (!address.is_empty() && is_mnemonic(&mnemonic)).then_some(NewKey { address, mnemonic })
        })
}

/// first `address: <token>` in the output
pub fn parse_address(output: &str) -> Result<String> {
    output
        .lines()
        .find_map(|line| {
            let (_, rest) = line.split_once("address:")?;
            rest.split_whitespace().next().map(str::to_string)
        })
        .ok_or_else(|| Error::Parse("address from key creation output".into()))
}

/// last non-empty line, which must look like a bip39 phrase
pub fn parse_mnemonic(output: &str) -> Result<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .filter(|line| is_mnemonic(line))
        .map(str::to_string)
        .ok_or_else(|| Error::Parse("mnemonic from key creation output".into()))
}

fn is_mnemonic(candidate: &str) -> bool {
    let words: Vec<&str> = candidate.split_whitespace().collect();
    MNEMONIC_LENGTHS.contains(&words.len())
        && words
            .iter()
            .all(|word| word.chars().all(|c| c.is_ascii_lowercase()))
}

/// unarmored secp256k1 key printed by `keys export --unarmored-hex`
pub fn parse_exported_hex(output: &str) -> Result<String> {
    output
        .lines()
        .rev()
        .flat_map(|line| line.split_whitespace().rev())
        .find(|token| token.len() == 64 && hex::decode(token).is_ok())
        .map(str::to_lowercase)
        .ok_or_else(|| Error::Parse("hex private key from key export output".into()))
}
