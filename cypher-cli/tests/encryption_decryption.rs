#![allow(missing_docs)]
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn init_keys(key_dir: &Path) -> String {
    let output = Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(key_dir)
        .arg("keys")
        .arg("init")
        .arg("--bits")
        .arg("1024")
        .output()
        .expect("Failed to execute keys init");
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[test]
fn test_full_message_workflow() {
    // 1. Setup temporary directories for the test
    let temp_dir = tempdir().unwrap();
    let key_dir = temp_dir.path().join("bob_keys");
    let public_key_path = temp_dir.path().join("bob.pem");
    let payload_path = temp_dir.path().join("message.json");
    let decrypted_path = temp_dir.path().join("decrypted.txt");

    // 2. Initialize the key store
    let key_id = init_keys(&key_dir);
    assert!(!key_id.is_empty(), "Key ID should not be empty");
    assert!(key_dir.join("private_key.pem").exists());
    assert!(key_dir.join("keystore.json").exists());

    // 3. Export the public key
    let export = Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("keys")
        .arg("export")
        .output()
        .expect("Failed to execute keys export");
    assert!(export.status.success());
    fs::write(&public_key_path, export.stdout).unwrap();

    // 4. Send a message using only the public key
    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("send")
        .arg("--to")
        .arg(&public_key_path)
        .arg("--message")
        .arg("Hello, World! 123")
        .arg("--output")
        .arg(&payload_path)
        .assert()
        .success();
    assert!(payload_path.exists(), "Payload file should exist");

    let payload: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&payload_path).unwrap()).unwrap();
    assert_eq!(payload["cipher"].as_array().map(Vec::len), Some(17));

    // 5. Receive it with the private key
    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("receive")
        .arg("--input")
        .arg(&payload_path)
        .arg("--output")
        .arg(&decrypted_path)
        .assert()
        .success();

    // 6. Verify the decrypted content
    let decrypted_content = fs::read_to_string(&decrypted_path).unwrap();
    assert_eq!(decrypted_content, "hello, world! 123");
}

#[test]
fn test_send_and_receive_through_pipes() {
    let temp_dir = tempdir().unwrap();
    let key_dir = temp_dir.path().join("keys");
    init_keys(&key_dir);

    let send_output = assert_cmd::Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("send")
        .write_stdin("Piped (through stdin)!\n")
        .output()
        .expect("Failed to execute send");
    assert!(send_output.status.success());

    assert_cmd::Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("receive")
        .write_stdin(send_output.stdout)
        .assert()
        .success()
        .stdout("piped (through stdin)!\n");
}

#[test]
fn test_tampered_payload_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let key_dir = temp_dir.path().join("keys");
    let payload_path = temp_dir.path().join("message.json");
    let decrypted_path = temp_dir.path().join("decrypted.txt");
    init_keys(&key_dir);

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("send")
        .arg("--message")
        .arg("pay bob 10 dollars")
        .arg("--output")
        .arg(&payload_path)
        .assert()
        .success();

    let mut payload: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&payload_path).unwrap()).unwrap();
    let first = payload["cipher"][0].as_u64().unwrap();
    payload["cipher"][0] = serde_json::Value::from((first + 1) % 48);
    fs::write(&payload_path, payload.to_string()).unwrap();

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("receive")
        .arg("--input")
        .arg(&payload_path)
        .arg("--output")
        .arg(&decrypted_path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Integrity check failed"));
    assert!(!decrypted_path.exists(), "Nothing should be written on rejection");
}

#[test]
fn test_keys_show_command() {
    let temp_dir = tempdir().unwrap();
    let key_dir = temp_dir.path().join("keys");
    let key_id = init_keys(&key_dir);

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("keys")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Key ID: {key_id}")))
        .stdout(predicate::str::contains("Bits: 1024"))
        .stdout(predicate::str::contains("Passphrase Protected: no"))
        .stdout(predicate::str::contains("Max Message Length: 62 symbols"));
}

#[test]
fn test_passphrase_is_required_for_protected_keys() {
    let temp_dir = tempdir().unwrap();
    let key_dir = temp_dir.path().join("keys");
    let payload_path = temp_dir.path().join("message.json");

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("--passphrase")
        .arg("open sesame")
        .arg("keys")
        .arg("init")
        .arg("--bits")
        .arg("1024")
        .assert()
        .success();

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("send")
        .arg("--message")
        .arg("sealed")
        .arg("--output")
        .arg(&payload_path)
        .assert()
        .success();

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("--passphrase")
        .arg("wrong guess")
        .arg("receive")
        .arg("--input")
        .arg(&payload_path)
        .assert()
        .failure()
        .code(1);

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("--passphrase")
        .arg("open sesame")
        .arg("receive")
        .arg("--input")
        .arg(&payload_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("sealed"));
}

#[test]
fn test_message_too_long_for_key() {
    let temp_dir = tempdir().unwrap();
    let key_dir = temp_dir.path().join("keys");
    init_keys(&key_dir);

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("send")
        .arg("--message")
        .arg("x".repeat(63))
        .assert()
        .failure();
}

#[test]
fn test_init_refuses_to_overwrite() {
    let temp_dir = tempdir().unwrap();
    let key_dir = temp_dir.path().join("keys");
    init_keys(&key_dir);

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("keys")
        .arg("init")
        .arg("--bits")
        .arg("1024")
        .assert()
        .failure();
}

#[test]
fn test_stray_passphrase_does_not_lock_out_unprotected_keys() {
    let temp_dir = tempdir().unwrap();
    let key_dir = temp_dir.path().join("keys");
    let payload_path = temp_dir.path().join("message.json");
    init_keys(&key_dir);

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("send")
        .arg("--message")
        .arg("still readable")
        .arg("--output")
        .arg(&payload_path)
        .assert()
        .success();

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .env("CYPHER_PASSPHRASE", "left over from another shell")
        .arg("--keys")
        .arg(&key_dir)
        .arg("receive")
        .arg("--input")
        .arg(&payload_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("still readable"));
}

#[test]
fn test_protected_keys_ask_for_passphrase() {
    let temp_dir = tempdir().unwrap();
    let key_dir = temp_dir.path().join("keys");
    let payload_path = temp_dir.path().join("message.json");

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("--passphrase")
        .arg("open sesame")
        .arg("keys")
        .arg("init")
        .arg("--bits")
        .arg("1024")
        .assert()
        .success();

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .arg("--keys")
        .arg(&key_dir)
        .arg("send")
        .arg("--message")
        .arg("sealed")
        .arg("--output")
        .arg(&payload_path)
        .assert()
        .success();

    Command::cargo_bin("cypher-cli")
        .unwrap()
        .env_remove("CYPHER_PASSPHRASE")
        .arg("--keys")
        .arg(&key_dir)
        .arg("receive")
        .arg("--input")
        .arg(&payload_path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("passphrase required"));
}
