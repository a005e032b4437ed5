//! On-disk record format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::crypto::NONCE_SIZE;
use crate::error::{StoreError, StoreResult};

const RECORD_VERSION: u32 = 1;

/// A single typed preference value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum StoreValue {
    Str(String),
    Bool(bool),
    Int(i32),
    Long(i64),
}

/// The decrypted store contents: a typed map keyed by preference name.
pub(crate) type RecordMap = BTreeMap<String, StoreValue>;

/// The sealed file envelope written to disk.
#[derive(Serialize, Deserialize)]
pub(crate) struct SealedRecord {
    pub(crate) version: u32,
    pub(crate) nonce: [u8; NONCE_SIZE],
    pub(crate) ciphertext: Vec<u8>,
}

impl SealedRecord {
    pub(crate) const fn new(nonce: [u8; NONCE_SIZE], ciphertext: Vec<u8>) -> Self {
        Self {
            version: RECORD_VERSION,
            nonce,
            ciphertext,
        }
    }

    pub(crate) fn serialize(&self) -> StoreResult<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(self, &mut bytes)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        Ok(bytes)
    }

    pub(crate) fn deserialize(bytes: &[u8]) -> StoreResult<Self> {
        let record: Self = ciborium::de::from_reader(bytes)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        if record.version != RECORD_VERSION {
            return Err(StoreError::UnsupportedVersion(record.version));
        }
        Ok(record)
    }
}

pub(crate) fn serialize_map(map: &RecordMap) -> StoreResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(map, &mut bytes)
        .map_err(|err| StoreError::Serialization(err.to_string()))?;
    Ok(bytes)
}

pub(crate) fn deserialize_map(bytes: &[u8]) -> StoreResult<RecordMap> {
    ciborium::de::from_reader(bytes).map_err(|err| StoreError::Serialization(err.to_string()))
}
