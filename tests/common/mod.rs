/*
 * Copyright 2024 Oxide Computer Company
 */

#![allow(dead_code)]

use std::sync::Arc;

use modemwalk::csnmp::ObjectValue;
use modemwalk::engine::MockEngine;
use modemwalk::mib::{docsis, if_mib, snmpv2};
use modemwalk::{Oid, Session, Value};

pub fn oid(arcs: &[u32]) -> Oid {
    Oid::from_arcs(arcs).unwrap()
}

/**
 * An instance of a column: `base.index...`.
 */
pub fn cell(base: &[u32], index: &[u32]) -> Oid {
    let mut arcs = base.to_vec();
    arcs.extend_from_slice(index);
    oid(&arcs)
}

pub fn session(engine: &Arc<MockEngine>, bulk: bool) -> Session<MockEngine> {
    Session::builder("127.0.0.1")
        .bulk(bulk)
        .bulk_count(4)
        .build_with(Arc::clone(engine))
        .unwrap()
}

pub fn system_group() -> Vec<(Oid, Value)> {
    vec![
        (
            cell(snmpv2::SYS_DESCR, &[0]),
            Value::string("ACME CM-3000 DOCSIS 3.0"),
        ),
        (
            cell(snmpv2::SYS_OBJECT_ID, &[0]),
            Value::from(ObjectValue::ObjectId(
                *oid(&[1, 3, 6, 1, 4, 1, 4115, 1]),
            )),
        ),
        (
            cell(snmpv2::SYS_UP_TIME, &[0]),
            Value::from(ObjectValue::TimeTicks(12_345)),
        ),
        (cell(snmpv2::SYS_CONTACT, &[0]), Value::string("noc@example.net")),
        (cell(snmpv2::SYS_NAME, &[0]), Value::string("cm-17")),
    ]
}

/**
 * ifTable/ifXTable for a modem with a MAC layer (2), two downstreams (3, 4),
 * one upstream (5) and an ethernet port (1).  Downstream 4 is down.
 */
pub fn interfaces() -> Vec<(Oid, Value)> {
    let ifs: [(u32, &str, i32, i32); 5] = [
        (1, "eth0", if_mib::IF_TYPE_ETHERNET_CSMACD, 1),
        (2, "cable-mac", if_mib::IF_TYPE_DOCS_CABLE_MACLAYER, 1),
        (3, "cable-downstream 1", if_mib::IF_TYPE_DOCS_CABLE_DOWNSTREAM, 1),
        (4, "cable-downstream 2", if_mib::IF_TYPE_DOCS_CABLE_DOWNSTREAM, 2),
        (5, "cable-upstream 1", if_mib::IF_TYPE_DOCS_CABLE_UPSTREAM, 1),
    ];

    let mut out = Vec::new();
    for (idx, name, kind, oper) in ifs {
        out.push((cell(if_mib::IF_INDEX, &[idx]), Value::integer(idx as i32)));
        out.push((cell(if_mib::IF_DESCR, &[idx]), Value::string(name)));
        out.push((cell(if_mib::IF_TYPE, &[idx]), Value::integer(kind)));
        out.push((cell(if_mib::IF_ADMIN_STATUS, &[idx]), Value::integer(1)));
        out.push((cell(if_mib::IF_OPER_STATUS, &[idx]), Value::integer(oper)));
        out.push((
            cell(if_mib::IF_IN_OCTETS, &[idx]),
            Value::counter32(1000 * idx),
        ));
        out.push((cell(if_mib::IF_NAME, &[idx]), Value::string(name)));
    }
    out
}

/**
 * Downstream rows 3 and 4 carry channels 17 and 18, upstream row 5 carries
 * channel 2.
 */
pub fn docsis_tables() -> Vec<(Oid, Value)> {
    let down = |col: u32, row: u32, v: Value| {
        (cell(docsis::DOWN_CHANNEL_ENTRY, &[col, row]), v)
    };
    let up = |col: u32, row: u32, v: Value| {
        (cell(docsis::UP_CHANNEL_ENTRY, &[col, row]), v)
    };
    let qam256 = Value::integer(docsis::MODULATION_QAM256);
    let unsigned = |u: u32| Value::from(ObjectValue::Unsigned32(u));

    vec![
        down(docsis::DOWN_CHANNEL_ID, 3, Value::integer(17)),
        down(docsis::DOWN_CHANNEL_ID, 4, Value::integer(18)),
        down(docsis::DOWN_CHANNEL_FREQUENCY, 3, Value::integer(603_000_000)),
        down(docsis::DOWN_CHANNEL_FREQUENCY, 4, Value::integer(609_000_000)),
        down(docsis::DOWN_CHANNEL_WIDTH, 3, Value::integer(6_000_000)),
        down(docsis::DOWN_CHANNEL_WIDTH, 4, Value::integer(6_000_000)),
        down(docsis::DOWN_CHANNEL_MODULATION, 3, qam256.clone()),
        down(docsis::DOWN_CHANNEL_MODULATION, 4, qam256),
        down(docsis::DOWN_CHANNEL_INTERLEAVE, 3, Value::integer(5)),
        down(docsis::DOWN_CHANNEL_POWER, 3, Value::integer(-3)),
        down(docsis::DOWN_CHANNEL_POWER, 4, Value::integer(21)),
        down(docsis::DOWN_CHANNEL_ANNEX, 3, Value::integer(4)),
        up(docsis::UP_CHANNEL_ID, 5, Value::integer(2)),
        up(docsis::UP_CHANNEL_FREQUENCY, 5, Value::integer(36_000_000)),
        up(docsis::UP_CHANNEL_WIDTH, 5, Value::integer(6_400_000)),
        up(docsis::UP_CHANNEL_SLOT_SIZE, 5, unsigned(4)),
        up(docsis::UP_CHANNEL_TX_TIMING_OFFSET, 5, unsigned(1187)),
        (cell(docsis::SIG_Q_SIGNAL_NOISE, &[3]), Value::integer(385)),
        (cell(docsis::SIG_Q_SIGNAL_NOISE, &[4]), Value::integer(371)),
        (
            cell(docsis::SIG_Q_EXT_UNERROREDS, &[3]),
            Value::counter64(9_000_000_000),
        ),
        (
            cell(docsis::SIG_Q_EXT_UNERROREDS, &[4]),
            Value::counter64(8_000_000_000),
        ),
        (cell(docsis::SIG_Q_EXT_CORRECTEDS, &[3]), Value::counter64(12)),
        (cell(docsis::SIG_Q_EXT_CORRECTEDS, &[4]), Value::counter64(0)),
        (cell(docsis::SIG_Q_EXT_UNCORRECTABLES, &[3]), Value::counter64(1)),
        (cell(docsis::SIG_Q_EXT_UNCORRECTABLES, &[4]), Value::counter64(0)),
    ]
}

/**
 * A complete modem, with something past the end of every table of interest
 * so that bulk pages overshoot.
 */
pub fn modem() -> Arc<MockEngine> {
    let engine = MockEngine::with_data(
        system_group()
            .into_iter()
            .chain(interfaces())
            .chain(docsis_tables()),
    );
    engine.insert(oid(&[1, 3, 6, 1, 2, 1, 69, 1, 1, 3, 0]), Value::integer(2));
    engine.insert(oid(&[1, 3, 6, 1, 4, 1, 4115, 1, 0]), Value::integer(7));
    Arc::new(engine)
}
