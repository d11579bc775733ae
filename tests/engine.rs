/*
 * Copyright 2024 Oxide Computer Company
 */

/*
 * The csnmp engine against a small SNMPv2c agent on the loopback interface.
 */

mod common;

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{cell, oid};
use modemwalk::csnmp::message::{
    BindingValue, ErrorStatus, InnerPdu, Snmp2cMessage, Snmp2cPdu,
    VariableBinding, VERSION_VALUE,
};
use modemwalk::csnmp::{ObjectIdentifier, ObjectValue};
use modemwalk::engine::{CsnmpEngine, MockEngine};
use modemwalk::mib::{docsis, snmpv2};
use modemwalk::{Device, Error, Modem, PollError, Session, Value};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

struct Agent {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl Agent {
    /**
     * Answer every request with whatever `reply` returns, or not at all if
     * it returns None.
     */
    async fn start<F>(reply: F) -> Agent
    where
        F: Fn(Snmp2cPdu) -> Option<InnerPdu> + Send + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; 65535];
            loop {
                let Ok((len, from)) = socket.recv_from(&mut buf).await else {
                    continue;
                };
                let Ok(msg) = Snmp2cMessage::try_from_bytes(&buf[..len]) else {
                    continue;
                };
                seen.fetch_add(1, Ordering::SeqCst);

                let Some(pdu) = reply(msg.pdu) else { continue };
                let out = Snmp2cMessage {
                    version: VERSION_VALUE,
                    community: msg.community,
                    pdu: Snmp2cPdu::Response(pdu),
                };
                socket.send_to(&out.to_bytes().unwrap(), from).await.unwrap();
            }
        });

        Agent { addr, requests, task }
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn session(&self, bulk: bool, timeout: Duration) -> Session<CsnmpEngine> {
        Session::builder("127.0.0.1")
            .port(self.addr.port())
            .bulk(bulk)
            .bulk_count(4)
            .build_with(Arc::new(CsnmpEngine::new(timeout, 2)))
            .unwrap()
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn answer(
    request_id: i32,
    error_status: ErrorStatus,
    error_index: u32,
    variable_bindings: Vec<VariableBinding>,
) -> InnerPdu {
    InnerPdu { request_id, error_status, error_index, variable_bindings }
}

fn following(
    data: &BTreeMap<ObjectIdentifier, ObjectValue>,
    after: ObjectIdentifier,
) -> VariableBinding {
    match data.range((Bound::Excluded(after), Bound::Unbounded)).next() {
        Some((name, v)) => VariableBinding {
            name: *name,
            value: BindingValue::Value(v.clone()),
        },
        None => {
            VariableBinding { name: after, value: BindingValue::EndOfMibView }
        }
    }
}

/**
 * A read-only agent over a fixed set of objects.  GETBULK pages stop at the
 * end of the MIB view with an endOfMibView binding; sets are refused.
 */
fn read_only(
    data: Vec<(modemwalk::Oid, Value)>,
) -> impl Fn(Snmp2cPdu) -> Option<InnerPdu> + Send + 'static {
    let data: BTreeMap<ObjectIdentifier, ObjectValue> =
        data.into_iter().map(|(o, v)| (*o, v.into_inner())).collect();

    move |pdu| {
        let (request_id, bindings) = match pdu {
            Snmp2cPdu::GetRequest(p) => {
                let vbs = p
                    .variable_bindings
                    .iter()
                    .map(|vb| VariableBinding {
                        name: vb.name,
                        value: data
                            .get(&vb.name)
                            .cloned()
                            .map_or(BindingValue::NoSuchObject, |v| {
                                BindingValue::Value(v)
                            }),
                    })
                    .collect();
                (p.request_id, vbs)
            }
            Snmp2cPdu::GetNextRequest(p) => {
                let vbs = p
                    .variable_bindings
                    .iter()
                    .map(|vb| following(&data, vb.name))
                    .collect();
                (p.request_id, vbs)
            }
            Snmp2cPdu::GetBulkRequest(p) => {
                let mut vbs = Vec::new();
                let mut cursor = p.variable_bindings[0].name;
                for _ in 0..p.max_repetitions {
                    let vb = following(&data, cursor);
                    let end = vb.value == BindingValue::EndOfMibView;
                    cursor = vb.name;
                    vbs.push(vb);
                    if end {
                        break;
                    }
                }
                (p.request_id, vbs)
            }
            Snmp2cPdu::SetRequest(p) => {
                return Some(answer(
                    p.request_id,
                    ErrorStatus::NotWritable,
                    1,
                    p.variable_bindings,
                ));
            }
            _ => return None,
        };

        Some(answer(request_id, ErrorStatus::NoError, 0, bindings))
    }
}

fn modem_data() -> Vec<(modemwalk::Oid, Value)> {
    common::system_group()
        .into_iter()
        .chain(common::interfaces())
        .chain(common::docsis_tables())
        .collect()
}

const QUICK: Duration = Duration::from_millis(100);
const PATIENT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn bulk_pages_end_at_end_of_view() {
    let agent = Agent::start(read_only(common::interfaces())).await;
    let s = agent.session(true, PATIENT);

    /*
     * ifName is the last column the agent has: the second page holds ifName.5
     * then endOfMibView, and the third holds only endOfMibView.
     */
    let names = Device::new(&s).walk_ifname().await.unwrap();
    assert_eq!(names.len(), 5);
    assert_eq!(names[&3], "cable-downstream 1");
    assert_eq!(agent.requests(), 3);

    let table = Device::new(&s).interfaces().await.unwrap();
    assert_eq!(
        table.keys().copied().collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );
}

#[tokio::test]
async fn sequential_walk_ends_at_end_of_view() {
    let agent = Agent::start(read_only(common::interfaces())).await;
    let s = agent.session(false, PATIENT);

    let names = Device::new(&s).walk_ifname().await.unwrap();
    assert_eq!(names.len(), 5);
    assert_eq!(names[&5], "cable-upstream 1");
    assert_eq!(agent.requests(), 6);
}

#[tokio::test]
async fn get_over_udp() {
    let agent = Agent::start(read_only(common::system_group())).await;
    let s = agent.session(true, PATIENT);

    let descr = Device::new(&s).sysdescr().await.unwrap();
    assert_eq!(descr, "ACME CM-3000 DOCSIS 3.0");

    /*
     * noSuchObject has no value, so nothing comes back.
     */
    let missing = cell(snmpv2::SYS_DESCR, &[1]);
    assert!(s.get(missing).await.unwrap().is_empty());
}

#[tokio::test]
async fn poll_matches_in_memory_agent() {
    let agent = Agent::start(read_only(modem_data())).await;
    let mock = Arc::new(MockEngine::with_data(modem_data()));
    let expected = Modem::new(&common::session(&mock, true))
        .get_all_info()
        .await
        .unwrap();
    assert_eq!(expected.down_freq.len(), 2);

    for bulk in [true, false] {
        let s = agent.session(bulk, PATIENT);
        let info = Modem::new(&s).get_all_info().await.unwrap();
        assert_eq!(info, expected, "bulk = {bulk}");
    }
}

#[tokio::test]
async fn silent_agent_times_out() {
    let agent = Agent::start(|_| None).await;
    let s = agent.session(false, QUICK);

    let e = s.get(oid(snmpv2::SYS_DESCR_0)).await.unwrap_err();
    assert!(e.is_timeout(), "{e:?}");
    assert_eq!(agent.requests(), 3);

    let info = Modem::new(&s).get_all_info().await.unwrap();
    assert_eq!(info.error, Some(PollError::SnmpTimeout));
    assert_eq!(info.sysdescr, None);
}

#[tokio::test]
async fn refused_set() {
    let agent = Agent::start(read_only(modem_data())).await;
    let s = agent.session(true, PATIENT);

    match Modem::new(&s).reset().await {
        Err(Error::Protocol { status, index, .. }) => {
            assert_eq!((status, index), (17, 1));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn accepted_set() {
    let agent = Agent::start(|pdu| match pdu {
        Snmp2cPdu::SetRequest(p) => Some(answer(
            p.request_id,
            ErrorStatus::NoError,
            0,
            p.variable_bindings,
        )),
        _ => None,
    })
    .await;
    let s = agent.session(true, PATIENT);

    Modem::new(&s).reset().await.unwrap();
    let vbs = s
        .set(oid(docsis::DOCS_DEV_RESET_NOW_0), Value::integer(1))
        .await
        .unwrap();
    assert_eq!(
        vbs,
        vec![(oid(docsis::DOCS_DEV_RESET_NOW_0), Value::integer(1))]
    );
    assert_eq!(agent.requests(), 2);
}

#[tokio::test]
async fn status_on_a_walk() {
    let agent = Agent::start(|pdu| match pdu {
        Snmp2cPdu::GetBulkRequest(p) => Some(answer(
            p.request_id,
            ErrorStatus::GenErr,
            1,
            p.variable_bindings,
        )),
        _ => None,
    })
    .await;
    let s = agent.session(true, PATIENT);

    match Device::new(&s).walk_iftype().await {
        Err(Error::Protocol { status: 5, index: 1, .. }) => {}
        other => panic!("unexpected {other:?}"),
    }
}
