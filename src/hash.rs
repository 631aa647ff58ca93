//! SHA-256 hashing utilities for change detection and receipts
//!
//! Hashes are rendered as 64 lowercase hex characters with no prefix.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{Result, fs as fs_error};

/// Length of a rendered SHA-256 digest
pub const HASH_HEX_LEN: usize = 64;

/// Calculate SHA-256 hash of a file
pub fn hash_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| fs_error::read_failed(path, e))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| fs_error::read_failed(path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash a file if it exists, `None` when it does not
pub fn hash_file_if_exists(path: &Path) -> Result<Option<String>> {
    if path.is_file() {
        hash_file(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Calculate SHA-256 hash of in-memory content
pub fn hash_bytes(content: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(content.as_ref()))
}

/// Render a JSON value canonically: object keys sorted, no whitespace
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// SHA-256 over the canonical JSON rendering of a value
pub fn digest_value(value: &Value) -> String {
    hash_bytes(canonical_json(value))
}

/// Whether a string looks like a rendered SHA-256 digest
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == HASH_HEX_LEN && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Verify a hash matches the expected value (case-insensitive)
pub fn verify_hash(expected: &str, actual: &str) -> bool {
    expected.eq_ignore_ascii_case(actual)
}
