//! Checksummed blob codec on top of [`Storage`].
//!
//! Binary blobs are laid out as
//!
//! ```text
//! magic: [u8; 4] | version: u16 | crc32: u32 | length: u64 | bincode payload
//! ```
//!
//! with little-endian integers. Every write goes to a temporary file that is
//! renamed into place once complete, so a reader never observes a half-written
//! blob. JSON metadata goes through the same temp-and-rename path.

use std::io::{Read, Write};

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{LexstatError, Result};
use crate::storage::{Storage, StorageError};

/// Version of the blob envelope.
pub const BLOB_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 4 + 8;

/// Serialize `value` with bincode and store it under `name`.
pub fn write_blob<T: Serialize>(
    storage: &dyn Storage,
    name: &str,
    magic: [u8; 4],
    value: &T,
) -> Result<()> {
    let payload = bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| LexstatError::serialization(format!("Failed to encode {name}: {e}")))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&magic);
    bytes.extend_from_slice(&BLOB_VERSION.to_le_bytes());
    bytes.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&payload);

    write_atomic(storage, name, &bytes)
}

/// Load a blob written by [`write_blob`], verifying magic, version and checksum.
pub fn read_blob<T: DeserializeOwned>(
    storage: &dyn Storage,
    name: &str,
    magic: [u8; 4],
) -> Result<T> {
    let bytes = read_all(storage, name)?;
    if bytes.len() < HEADER_LEN {
        return Err(corrupted(name, "truncated header"));
    }

    if bytes[0..4] != magic {
        return Err(corrupted(name, "invalid file format"));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != BLOB_VERSION {
        return Err(corrupted(name, &format!("unsupported version {version}")));
    }

    let checksum = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[10..HEADER_LEN]);
    let length = u64::from_le_bytes(len_bytes);

    let payload = &bytes[HEADER_LEN..];
    if payload.len() as u64 != length {
        return Err(corrupted(
            name,
            &format!("expected {length} payload bytes, found {}", payload.len()),
        ));
    }
    if crc32fast::hash(payload) != checksum {
        return Err(corrupted(name, "checksum mismatch"));
    }

    let (value, _): (T, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .map_err(|e| corrupted(name, &format!("failed to decode: {e}")))?;
    Ok(value)
}

/// Store `value` as pretty-printed JSON under `name`.
pub fn write_json<T: Serialize>(storage: &dyn Storage, name: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(storage, name, &bytes)
}

/// Load a JSON document written by [`write_json`].
pub fn read_json<T: DeserializeOwned>(storage: &dyn Storage, name: &str) -> Result<T> {
    let bytes = read_all(storage, name)?;
    serde_json::from_slice(&bytes).map_err(|e| corrupted(name, &format!("invalid JSON: {e}")))
}

fn write_atomic(storage: &dyn Storage, name: &str, bytes: &[u8]) -> Result<()> {
    let (temp_name, mut output) = storage.create_temp_output(name)?;
    let written = output
        .write_all(bytes)
        .map_err(LexstatError::from)
        .and_then(|()| output.close())
        .and_then(|()| storage.rename_file(&temp_name, name));
    drop(output);

    // A failed write must not leave its temporary file behind.
    if written.is_err()
        && let Err(e) = storage.delete_file(&temp_name)
    {
        warn!("Failed to remove temporary file {temp_name}: {e}");
    }
    written
}

fn read_all(storage: &dyn Storage, name: &str) -> Result<Vec<u8>> {
    let mut input = storage.open_input(name)?;
    let mut bytes = Vec::with_capacity(input.size()? as usize);
    input.read_to_end(&mut bytes)?;
    input.close()?;
    Ok(bytes)
}

fn corrupted(name: &str, reason: &str) -> LexstatError {
    StorageError::Corrupted(format!("{name}: {reason}")).into()
}
