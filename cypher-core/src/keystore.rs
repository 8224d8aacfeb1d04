//! On-disk storage for a recipient key pair.
//!
//! A key store is a directory holding:
//!
//! - `private_key.pem`: PKCS#8, encrypted when a passphrase is used
//! - `public_key.pem`: SPKI
//! - `keystore.json`: [`KeyStoreState`] metadata

use crate::error::{CypherError, Result};
use crate::key_wrap::{RecipientPrivateKey, RecipientPublicKey};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use zeroize::Zeroizing;

/// File name of the private key inside a key store.
pub const PRIVATE_KEY_FILE: &str = "private_key.pem";
/// File name of the public key inside a key store.
pub const PUBLIC_KEY_FILE: &str = "public_key.pem";
/// File name of the metadata record inside a key store.
pub const STATE_FILE: &str = "keystore.json";

/// Suffix of files staged by [`init`] before they are renamed into place.
const STAGING_SUFFIX: &str = ".tmp";

/// Metadata describing the key pair in a key store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct KeyStoreState {
    /// A unique identifier for the key pair.
    pub key_id: String,
    /// The RSA modulus size in bits.
    pub bits: usize,
    /// Hex SHA-256 of the DER-encoded public key.
    pub fingerprint: String,
    /// Whether the private key file is passphrase-protected.
    pub encrypted: bool,
}

impl KeyStoreState {
    fn describe(public: &RecipientPublicKey, encrypted: bool) -> Result<Self> {
        Ok(Self {
            key_id: Uuid::new_v4().to_string(),
            bits: public.bits(),
            fingerprint: public.fingerprint()?,
            encrypted,
        })
    }
}

/// A loaded key pair together with its metadata.
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// Metadata from `keystore.json`.
    pub state: KeyStoreState,
    /// The private key.
    pub private: RecipientPrivateKey,
    /// The public key.
    pub public: RecipientPublicKey,
}

/// Whether `dir` contains a complete key store.
#[must_use]
pub fn exists(dir: &Path) -> bool {
    [PRIVATE_KEY_FILE, PUBLIC_KEY_FILE, STATE_FILE]
        .iter()
        .all(|name| dir.join(name).is_file())
}

/// Generates a key pair and writes it to `dir`, creating the directory if needed.
///
/// # Errors
///
/// Returns [`CypherError::KeyStore`] if `dir` already holds a key store and
/// `force` is false; otherwise errors come from key generation, encoding or I/O.
pub fn init(dir: &Path, passphrase: Option<&str>, bits: usize, force: bool) -> Result<KeyPair> {
    if !force && dir.join(PRIVATE_KEY_FILE).exists() {
        return Err(CypherError::KeyStore(format!(
            "a key pair already exists at '{}'",
            dir.display()
        )));
    }

    info!("Generating a {bits}-bit RSA key pair in '{}'.", dir.display());
    let private = RecipientPrivateKey::generate(bits)?;
    let public = private.public_key();
    let state = KeyStoreState::describe(&public, passphrase.is_some())?;

    let private_pem = private.to_pem(passphrase)?;
    let public_pem = public.to_pem()?;
    let state_str = state_to_json(&state)?;
    let files = [
        (PRIVATE_KEY_FILE, private_pem.as_bytes(), true),
        (PUBLIC_KEY_FILE, public_pem.as_bytes(), false),
        (STATE_FILE, state_str.as_bytes(), false),
    ];

    // Nothing in the store is replaced until every new file is on disk.
    fs::create_dir_all(dir)?;
    for (name, contents, secret) in files {
        if let Err(e) = stage(dir, name, contents, secret) {
            discard_staged(dir);
            return Err(e);
        }
    }
    for (name, _, _) in files {
        fs::rename(staged_path(dir, name), dir.join(name))?;
    }

    info!("Key pair {} written (fingerprint {}).", state.key_id, state.fingerprint);
    Ok(KeyPair {
        state,
        private,
        public,
    })
}

/// Loads the metadata record of the key store at `dir`.
///
/// # Errors
///
/// Returns [`CypherError::KeyStore`] if the record is missing or unparsable.
pub fn load_state(dir: &Path) -> Result<KeyStoreState> {
    let state_file_path = dir.join(STATE_FILE);
    if !state_file_path.exists() {
        return Err(CypherError::KeyStore(format!(
            "no key store found at '{}'",
            dir.display()
        )));
    }
    let state_str = fs::read_to_string(state_file_path)?;
    serde_json::from_str(&state_str)
        .map_err(|e| CypherError::KeyStore(format!("failed to parse {STATE_FILE}: {e}")))
}

/// Saves the metadata record to `dir`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_state(dir: &Path, state: &KeyStoreState) -> Result<()> {
    let state_str = state_to_json(state)?;
    stage(dir, STATE_FILE, state_str.as_bytes(), false)?;
    fs::rename(staged_path(dir, STATE_FILE), dir.join(STATE_FILE))?;
    Ok(())
}

fn state_to_json(state: &KeyStoreState) -> Result<String> {
    serde_json::to_string_pretty(state)
        .map_err(|e| CypherError::KeyStore(format!("failed to serialize state: {e}")))
}

fn staged_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}{STAGING_SUFFIX}"))
}

/// Writes `contents` to the staging path for `name`.
///
/// Secret files are created owner-only on Unix.
fn stage(dir: &Path, name: &str, contents: &[u8], secret: bool) -> Result<()> {
    let path = staged_path(dir, name);
    // A leftover from an interrupted run would keep its old permissions.
    if path.exists() {
        fs::remove_file(&path)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(if secret { 0o600 } else { 0o644 });
    }
    #[cfg(not(unix))]
    let _ = secret;

    let mut file = options.open(&path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

fn discard_staged(dir: &Path) {
    for name in [PRIVATE_KEY_FILE, PUBLIC_KEY_FILE, STATE_FILE] {
        let path = staged_path(dir, name);
        if path.exists() && fs::remove_file(&path).is_err() {
            warn!("Could not remove staged file '{}'.", path.display());
        }
    }
}

/// Loads a public key from a PEM file anywhere on disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not an RSA public key.
pub fn load_public_key_file(path: &Path) -> Result<RecipientPublicKey> {
    let pem = fs::read_to_string(path)?;
    RecipientPublicKey::from_pem(&pem)
}

/// Loads the public key of the key store at `dir`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_public_key(dir: &Path) -> Result<RecipientPublicKey> {
    load_public_key_file(&dir.join(PUBLIC_KEY_FILE))
}

/// Loads the private key of the key store at `dir`.
///
/// A passphrase given for a store that is not passphrase-protected is ignored.
///
/// # Errors
///
/// Returns [`CypherError::KeyStore`] if the store is missing or is protected
/// and no passphrase was given, [`CypherError::KeyEncoding`] if the passphrase
/// is wrong, or an I/O error if the file cannot be read.
pub fn load_private_key(dir: &Path, passphrase: Option<&str>) -> Result<RecipientPrivateKey> {
    let state = load_state(dir)?;
    read_private_key(dir, &state, passphrase)
}

fn read_private_key(
    dir: &Path,
    state: &KeyStoreState,
    passphrase: Option<&str>,
) -> Result<RecipientPrivateKey> {
    let passphrase = match (state.encrypted, passphrase) {
        (true, None) => {
            return Err(CypherError::KeyStore(format!(
                "passphrase required to unlock the key store at '{}'",
                dir.display()
            )));
        }
        (false, Some(_)) => {
            warn!(
                "Key store at '{}' is not passphrase-protected; ignoring the passphrase.",
                dir.display()
            );
            None
        }
        (_, passphrase) => passphrase,
    };

    let pem = Zeroizing::new(fs::read_to_string(dir.join(PRIVATE_KEY_FILE))?);
    RecipientPrivateKey::from_pem(&pem, passphrase)
}

/// Loads the full key pair at `dir`, checking that its halves belong together.
///
/// # Errors
///
/// Returns [`CypherError::KeyStore`] if the files disagree with each other,
/// plus any error from the individual loaders.
pub fn load(dir: &Path, passphrase: Option<&str>) -> Result<KeyPair> {
    let state = load_state(dir)?;
    let private = read_private_key(dir, &state, passphrase)?;
    let public = load_public_key(dir)?;

    if private.public_key() != public {
        return Err(CypherError::KeyStore(format!(
            "'{PUBLIC_KEY_FILE}' does not match '{PRIVATE_KEY_FILE}'"
        )));
    }
    if public.fingerprint()? != state.fingerprint {
        return Err(CypherError::KeyStore(format!(
            "fingerprint in '{STATE_FILE}' does not match the stored key"
        )));
    }

    Ok(KeyPair {
        state,
        private,
        public,
    })
}

/// Loads the key pair at `dir`, generating a new one first if none exists.
///
/// # Errors
///
/// Returns any error from [`load`] or [`init`].
pub fn load_or_init(dir: &Path, passphrase: Option<&str>, bits: usize) -> Result<KeyPair> {
    if exists(dir) {
        info!("Loading existing key pair from '{}'.", dir.display());
        load(dir, passphrase)
    } else {
        init(dir, passphrase, bits, false)
    }
}
