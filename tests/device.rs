/*
 * Copyright 2024 Oxide Computer Company
 */

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use common::{cell, oid, session};
use modemwalk::engine::mock::Fault;
use modemwalk::engine::MockEngine;
use modemwalk::mib::if_mib::{self, IfStatus};
use modemwalk::mib::snmpv2;
use modemwalk::{Device, Error, Value};

#[tokio::test]
async fn interface_columns() {
    let engine = common::modem();
    let s = session(&engine, true);
    let dev = Device::new(&s);

    assert_eq!(
        dev.walk_iftype().await.unwrap(),
        BTreeMap::from([
            (1, if_mib::IF_TYPE_ETHERNET_CSMACD),
            (2, if_mib::IF_TYPE_DOCS_CABLE_MACLAYER),
            (3, if_mib::IF_TYPE_DOCS_CABLE_DOWNSTREAM),
            (4, if_mib::IF_TYPE_DOCS_CABLE_DOWNSTREAM),
            (5, if_mib::IF_TYPE_DOCS_CABLE_UPSTREAM),
        ])
    );
    assert_eq!(
        dev.walk_ifadminstatus()
            .await
            .unwrap()
            .into_values()
            .collect::<Vec<_>>(),
        vec![1; 5]
    );
    assert_eq!(dev.walk_ifoperstatus().await.unwrap()[&4], 2);

    let names = dev.walk_ifname().await.unwrap();
    assert_eq!(names[&1], "eth0");
    assert_eq!(names[&5], "cable-upstream 1");
    assert_eq!(dev.walk_ifdescr().await.unwrap(), names);
    assert!(dev.walk_ifalias().await.unwrap().is_empty());
}

#[tokio::test]
async fn sysdescr() {
    let engine = common::modem();
    let s = session(&engine, false);

    let descr = Device::new(&s).sysdescr().await.unwrap();
    assert_eq!(descr, "ACME CM-3000 DOCSIS 3.0");
}

#[tokio::test]
async fn ifstack_accumulates() {
    let status = if_mib::IF_STACK_STATUS;
    let engine = Arc::new(MockEngine::with_data([
        (cell(status, &[0, 10]), Value::integer(1)),
        (cell(status, &[10, 1]), Value::integer(1)),
        (cell(status, &[10, 2]), Value::integer(1)),
        (cell(status, &[1, 0]), Value::integer(1)),
        (cell(status, &[2, 0]), Value::integer(1)),
    ]));

    for bulk in [true, false] {
        let s = session(&engine, bulk);
        let stack = Device::new(&s).walk_ifstackstatus().await.unwrap();
        assert_eq!(
            stack,
            BTreeMap::from([
                (0, vec![10]),
                (1, vec![0]),
                (2, vec![0]),
                (10, vec![1, 2]),
            ])
        );
    }
}

#[tokio::test]
async fn ifstack_needs_two_indices() {
    let engine = Arc::new(MockEngine::with_data([(
        cell(if_mib::IF_STACK_STATUS, &[10]),
        Value::integer(1),
    )]));
    let s = session(&engine, true);

    let e = Device::new(&s).walk_ifstackstatus().await.unwrap_err();
    assert!(matches!(e, Error::TableShape { .. }), "{e:?}");
}

#[tokio::test]
async fn system_group() {
    let engine = common::modem();
    let s = session(&engine, true);

    let sys = Device::new(&s).system().await.unwrap();
    assert_eq!(sys.descr, "ACME CM-3000 DOCSIS 3.0");
    assert_eq!(sys.object_id(), oid(&[1, 3, 6, 1, 4, 1, 4115, 1]));
    assert_eq!(sys.uptime(), Duration::from_millis(123_450));
    assert_eq!(sys.contact.as_deref(), Some("noc@example.net"));
    assert_eq!(sys.name.as_deref(), Some("cm-17"));
    assert_eq!(sys.location, None);
}

#[tokio::test]
async fn interface_table() {
    let engine = common::modem();
    let s = session(&engine, true);

    let ifs = Device::new(&s).interfaces().await.unwrap();
    assert_eq!(ifs.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

    let ds2 = &ifs[&4];
    assert_eq!(ds2.index, 4);
    assert_eq!(ds2.descr.as_deref(), Some("cable-downstream 2"));
    assert_eq!(ds2.kind, Some(if_mib::IF_TYPE_DOCS_CABLE_DOWNSTREAM));
    assert_eq!(ds2.admin_status, Some(IfStatus::Up));
    assert_eq!(ds2.oper_status, Some(IfStatus::Down));
    assert_eq!(ds2.in_octets, Some(4000));
    assert_eq!(ds2.speed, None);
    assert!(!ds2.is_up());
    assert!(ifs[&1].is_up());
}

#[tokio::test]
async fn errors_propagate() {
    let engine = common::modem();
    let s = session(&engine, true);
    let dev = Device::new(&s);

    engine.fail_under(
        oid(if_mib::IF_TYPE),
        Fault::Status { status: 5, index: 1 },
    );
    match dev.walk_iftype().await {
        Err(Error::Protocol { status: 5, index: 1, host }) => {
            assert_eq!(host, "127.0.0.1");
        }
        other => panic!("unexpected {other:?}"),
    }

    engine.fail_under(oid(snmpv2::SYS_DESCR), Fault::Timeout);
    assert!(dev.sysdescr().await.unwrap_err().is_timeout());

    /*
     * Other columns are unaffected.
     */
    assert_eq!(dev.walk_ifname().await.unwrap().len(), 5);
}

#[tokio::test]
async fn missing_sysdescr() {
    let engine = Arc::new(MockEngine::new());
    let s = session(&engine, true);

    /*
     * The mock answers a get for a missing object with noSuchName, as an
     * SNMPv1 agent would.
     */
    let e = Device::new(&s).sysdescr().await.unwrap_err();
    assert!(matches!(e, Error::Protocol { status: 2, index: 1, .. }), "{e:?}");
}
