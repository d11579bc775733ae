/*
 * Copyright 2024 Oxide Computer Company
 */

/*
 * The seam between a [`Session`](crate::Session) and whatever actually puts
 * SNMP packets on the wire.
 *
 * An engine is shared by every session in the process and holds no
 * per-device state that a caller can see: the target and community travel
 * with each request.  Responses come back in the classic command generator
 * shape (error indication, error status, error index, var-binds) and the
 * session decides what they mean.
 */

use std::future::Future;
use std::net::SocketAddr;

use crate::{value::Value, Oid};

pub mod mock;
mod snmp2c;

pub use mock::MockEngine;
pub use snmp2c::CsnmpEngine;

/**
 * Where a request goes.  Built by the session from its configuration for
 * every request.
 */
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub addr: SocketAddr,
    pub community: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /**
     * Set when the request failed as a whole, e.g. "request timed out".
     */
    pub error_indication: Option<String>,
    pub error_status: u32,
    pub error_index: u32,
    pub var_binds: Vec<(Oid, Value)>,
}

impl Response {
    pub fn var_binds(var_binds: Vec<(Oid, Value)>) -> Response {
        Response { var_binds, ..Default::default() }
    }

    /**
     * No answer from the device within the engine's retry budget.
     */
    pub fn timed_out() -> Response {
        Response {
            error_indication: Some("request timed out".to_string()),
            ..Default::default()
        }
    }

    pub fn error_status(status: u32, index: u32) -> Response {
        Response {
            error_indication: Some(format!("error status {status}")),
            error_status: status,
            error_index: index,
            var_binds: Vec::new(),
        }
    }
}

/**
 * The four primitive operations.  An `Err` is reserved for failures on our
 * side of the wire (sockets, encoding); anything the device did or did not
 * say is reported through the [`Response`].
 */
pub trait Engine: Send + Sync {
    fn get(
        &self,
        target: &Target,
        oid: Oid,
    ) -> impl Future<Output = anyhow::Result<Response>> + Send;

    /**
     * GETBULK with no non-repeaters: up to `max_repetitions` objects that
     * follow `oid`, wherever in the OID space they are.
     */
    fn bulk_walk(
        &self,
        target: &Target,
        max_repetitions: u32,
        oid: Oid,
    ) -> impl Future<Output = anyhow::Result<Response>> + Send;

    /**
     * GETNEXT: the single object that follows `oid`.
     */
    fn next_walk(
        &self,
        target: &Target,
        oid: Oid,
    ) -> impl Future<Output = anyhow::Result<Response>> + Send;

    fn set(
        &self,
        target: &Target,
        oid: Oid,
        value: Value,
    ) -> impl Future<Output = anyhow::Result<Response>> + Send;
}
