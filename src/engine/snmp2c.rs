/*
 * Copyright 2024 Oxide Computer Company
 */

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use csnmp::message::{
    BindingValue, BulkPdu, ErrorStatus, InnerPdu, Snmp2cMessage, Snmp2cPdu,
    VariableBinding, VERSION_VALUE,
};
use tokio::net::UdpSocket;
use tracing::{debug, trace};

use super::{Engine, Response, Target};
use crate::{value::Value, Oid};

/**
 * The production engine: SNMPv2c over UDP, using the csnmp message codec.
 *
 * The PDUs are built and read here rather than through `Snmp2cClient` so
 * that the error status and index of every response reach the session, and
 * so that exceptions like endOfMibView are just missing values rather than
 * failures.
 *
 * Each exchange binds its own socket and drops it once the exchange is over,
 * so the engine holds no sockets between requests no matter how many devices
 * it is pointed at.  Retries of one request reuse its socket and request ID,
 * so a late answer to an earlier attempt is still accepted.
 */
pub struct CsnmpEngine {
    bind_address: Option<SocketAddr>,
    timeout: Duration,
    retries: usize,
    request_id: AtomicI32,
}

static SHARED: OnceLock<Arc<CsnmpEngine>> = OnceLock::new();

impl Default for CsnmpEngine {
    fn default() -> Self {
        CsnmpEngine::new(Duration::from_secs(5), 1)
    }
}

fn unspecified(oid: Oid) -> VariableBinding {
    VariableBinding { name: oid.0, value: BindingValue::Unspecified }
}

fn request(
    request_id: i32,
    variable_bindings: Vec<VariableBinding>,
) -> InnerPdu {
    InnerPdu {
        request_id,
        error_status: ErrorStatus::NoError,
        error_index: 0,
        variable_bindings,
    }
}

/**
 * A nonzero error status or index is passed on as is.  Otherwise every
 * binding with a value becomes a var-bind; the exceptions (noSuchObject,
 * noSuchInstance, endOfMibView) carry no value and are left out.
 */
fn response(pdu: InnerPdu) -> Response {
    let status = u32::from(u8::from(pdu.error_status));
    if status != 0 || pdu.error_index != 0 {
        return Response::error_status(status, pdu.error_index);
    }

    let var_binds = pdu
        .variable_bindings
        .into_iter()
        .filter_map(|vb| match vb.value {
            BindingValue::Value(v) => Some((Oid::from(vb.name), Value(v))),
            other => {
                trace!(oid = %vb.name, ?other, "binding without a value");
                None
            }
        })
        .collect();

    Response::var_binds(var_binds)
}

/**
 * Wait for the response to `request_id` from `peer`.  Datagrams from anyone
 * else, and responses to other requests, are dropped.
 */
async fn receive(
    socket: &UdpSocket,
    peer: SocketAddr,
    request_id: i32,
) -> Result<InnerPdu> {
    let mut buf = vec![0u8; 65535];
    loop {
        let (len, from) =
            socket.recv_from(&mut buf).await.context("receiving")?;
        if from != peer {
            trace!(%from, %peer, "dropping datagram from elsewhere");
            continue;
        }

        let msg = Snmp2cMessage::try_from_bytes(&buf[..len])
            .map_err(|e| anyhow!("decoding response: {e}"))?;
        if msg.pdu.request_id() != request_id {
            trace!(
                %peer,
                got = msg.pdu.request_id(),
                want = request_id,
                "dropping stale response",
            );
            continue;
        }

        match msg.pdu {
            Snmp2cPdu::Response(inner) => return Ok(inner),
            other => bail!("expected a response PDU, got {other:?}"),
        }
    }
}

impl CsnmpEngine {
    pub fn new(timeout: Duration, retries: usize) -> CsnmpEngine {
        CsnmpEngine {
            bind_address: None,
            timeout,
            retries,
            request_id: AtomicI32::new(1),
        }
    }

    pub fn with_bind_address(mut self, bind: SocketAddr) -> CsnmpEngine {
        self.bind_address = Some(bind);
        self
    }

    /**
     * The process-wide engine used by sessions built without an explicit
     * one.
     */
    pub fn shared() -> Arc<CsnmpEngine> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(CsnmpEngine::default())))
    }

    fn next_request_id(&self) -> i32 {
        self.request_id.fetch_add(1, Ordering::Relaxed) & i32::MAX
    }

    /*
     * Pick a local bind address based on the address family if one was not
     * provided.
     */
    fn bind_for(&self, peer: SocketAddr) -> SocketAddr {
        if let Some(ba) = self.bind_address {
            return ba;
        }

        SocketAddr::new(
            match peer {
                SocketAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
                SocketAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
            },
            0,
        )
    }

    /**
     * Send one request, retrying on timeout.  Running out of attempts is
     * reported as a timed out response; a failure on our side of the wire is
     * an error.
     */
    async fn exchange(
        &self,
        target: &Target,
        what: &str,
        oid: Oid,
        pdu: Snmp2cPdu,
    ) -> Result<Response> {
        let request_id = pdu.request_id();
        let msg = Snmp2cMessage {
            version: VERSION_VALUE,
            community: target.community.clone(),
            pdu,
        };
        let bytes = msg
            .to_bytes()
            .map_err(|e| anyhow!("encoding SNMP {what} {oid}: {e}"))?;

        let bind = self.bind_for(target.addr);
        let socket = UdpSocket::bind(bind)
            .await
            .with_context(|| format!("binding {bind} for {}", target.addr))?;

        for attempt in 0..=self.retries {
            trace!(peer = %target.addr, %oid, attempt, request_id, "{what}");
            socket.send_to(&bytes, target.addr).await.with_context(|| {
                format!("sending SNMP {what} {oid} to {}", target.addr)
            })?;

            match tokio::time::timeout(
                self.timeout,
                receive(&socket, target.addr, request_id),
            )
            .await
            {
                Ok(res) => {
                    let pdu = res.with_context(|| {
                        format!("SNMP {what} {oid} to {}", target.addr)
                    })?;
                    return Ok(response(pdu));
                }
                Err(_) => {
                    debug!(
                        peer = %target.addr,
                        %oid,
                        attempt,
                        "{what} timed out",
                    );
                }
            }
        }

        Ok(Response::timed_out())
    }
}

impl Engine for CsnmpEngine {
    async fn get(&self, target: &Target, oid: Oid) -> Result<Response> {
        let pdu = request(self.next_request_id(), vec![unspecified(oid)]);
        self.exchange(target, "get", oid, Snmp2cPdu::GetRequest(pdu)).await
    }

    async fn bulk_walk(
        &self,
        target: &Target,
        max_repetitions: u32,
        oid: Oid,
    ) -> Result<Response> {
        let pdu = BulkPdu {
            request_id: self.next_request_id(),
            non_repeaters: 0,
            max_repetitions,
            variable_bindings: vec![unspecified(oid)],
        };
        self.exchange(target, "getbulk", oid, Snmp2cPdu::GetBulkRequest(pdu))
            .await
    }

    async fn next_walk(&self, target: &Target, oid: Oid) -> Result<Response> {
        let pdu = request(self.next_request_id(), vec![unspecified(oid)]);
        self.exchange(target, "getnext", oid, Snmp2cPdu::GetNextRequest(pdu))
            .await
    }

    async fn set(
        &self,
        target: &Target,
        oid: Oid,
        value: Value,
    ) -> Result<Response> {
        let binding = VariableBinding {
            name: oid.0,
            value: BindingValue::Value(value.0),
        };
        let pdu = request(self.next_request_id(), vec![binding]);
        self.exchange(target, "set", oid, Snmp2cPdu::SetRequest(pdu)).await
    }
}
