/*
 * Copyright 2024 Oxide Computer Company
 */

use crate::{value::Value, Oid};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /**
     * No response within the engine's timeout and retry budget.  A device
     * with a mismatched community string does not answer at all, so this
     * can equally mean "wrong community".
     */
    #[error("no response from {host} ({indication})")]
    Timeout { host: String, indication: String },

    /**
     * The device answered with an SNMP error status.
     */
    #[error("{host} returned SNMP error status {status} at index {index}")]
    Protocol { host: String, status: u32, index: u32 },

    #[error("could not resolve {host:?}: {source}")]
    NameResolution {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /**
     * A row of a per-channel table refers to a row index for which the
     * channel ID column never produced a value.
     */
    #[error("{table}: row {index} has no channel ID")]
    IndexConsistency { table: &'static str, index: u32 },

    #[error("walk of {root} did not advance: {current} after {previous}")]
    NonIncreasing { root: Oid, previous: Oid, current: Oid },

    #[error("unusual table structure at {oid} under {root}")]
    TableShape { root: Oid, oid: Oid },

    #[error("expected {expected} at {oid}, got {value:?}")]
    UnexpectedValue { oid: Oid, expected: &'static str, value: Value },

    #[error("empty response for {oid}")]
    EmptyResponse { oid: Oid },

    #[error("invalid OID {0}")]
    InvalidOid(String),

    #[error("could not deserialise {what}: {source}")]
    Deserialize {
        what: String,
        #[source]
        source: serde::de::value::Error,
    },

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    /**
     * A local failure inside the SNMP engine (socket setup, encoding) or in
     * the OID naming tree, as opposed to anything the device said.
     */
    #[error(transparent)]
    Engine(#[from] anyhow::Error),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}
