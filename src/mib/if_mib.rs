/*
 * Copyright 2024 Oxide Computer Company
 */

/*
 * IF-MIB (RFC 2863): the interfaces group, ifXTable and ifStackTable.
 */

use super::sublude::*;

pub const INTERFACES: &[u32] = &[1, 3, 6, 1, 2, 1, 2];
pub const IF_NUMBER: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 1];
pub const IF_TABLE: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2];
pub const IF_ENTRY: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1];
pub const IF_INDEX: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 1];
pub const IF_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 2];
pub const IF_TYPE: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 3];
pub const IF_MTU: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 4];
pub const IF_SPEED: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 5];
pub const IF_PHYS_ADDRESS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 6];
pub const IF_ADMIN_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 7];
pub const IF_OPER_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 8];
pub const IF_LAST_CHANGE: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 9];
pub const IF_IN_OCTETS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 10];
pub const IF_IN_ERRORS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 14];
pub const IF_OUT_OCTETS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 16];
pub const IF_OUT_ERRORS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 20];

pub const IF_MIB: &[u32] = &[1, 3, 6, 1, 2, 1, 31];
pub const IF_MIB_OBJECTS: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1];
pub const IF_X_TABLE: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1];
pub const IF_X_ENTRY: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1];
pub const IF_NAME: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 1];
pub const IF_HC_IN_OCTETS: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6];
pub const IF_HC_OUT_OCTETS: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 10];
pub const IF_HIGH_SPEED: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 15];
pub const IF_ALIAS: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 18];
pub const IF_STACK_TABLE: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 2];
pub const IF_STACK_ENTRY: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 2, 1];
pub const IF_STACK_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 2, 1, 3];

/*
 * IANAifType values seen on cable modems.
 */
pub const IF_TYPE_OTHER: i32 = 1;
pub const IF_TYPE_ETHERNET_CSMACD: i32 = 6;
pub const IF_TYPE_DOCS_CABLE_MACLAYER: i32 = 127;
pub const IF_TYPE_DOCS_CABLE_DOWNSTREAM: i32 = 128;
pub const IF_TYPE_DOCS_CABLE_UPSTREAM: i32 = 129;

pub fn populate(tree: &mut OidTree) -> Result<()> {
    tree.add_all(&[
        ("interfaces", INTERFACES),
        ("ifNumber", IF_NUMBER),
        ("ifTable", IF_TABLE),
        ("ifEntry", IF_ENTRY),
        ("ifIndex", IF_INDEX),
        ("ifDescr", IF_DESCR),
        ("ifType", IF_TYPE),
        ("ifMtu", IF_MTU),
        ("ifSpeed", IF_SPEED),
        ("ifPhysAddress", IF_PHYS_ADDRESS),
        ("ifAdminStatus", IF_ADMIN_STATUS),
        ("ifOperStatus", IF_OPER_STATUS),
        ("ifLastChange", IF_LAST_CHANGE),
        ("ifInOctets", IF_IN_OCTETS),
        ("ifInErrors", IF_IN_ERRORS),
        ("ifOutOctets", IF_OUT_OCTETS),
        ("ifOutErrors", IF_OUT_ERRORS),
        ("ifMIB", IF_MIB),
        ("ifMIBObjects", IF_MIB_OBJECTS),
        ("ifXTable", IF_X_TABLE),
        ("ifXEntry", IF_X_ENTRY),
        ("ifName", IF_NAME),
        ("ifHCInOctets", IF_HC_IN_OCTETS),
        ("ifHCOutOctets", IF_HC_OUT_OCTETS),
        ("ifHighSpeed", IF_HIGH_SPEED),
        ("ifAlias", IF_ALIAS),
        ("ifStackTable", IF_STACK_TABLE),
        ("ifStackEntry", IF_STACK_ENTRY),
        ("ifStackStatus", IF_STACK_STATUS),
    ])
    .map_err(|e| anyhow!("if_mib::populate: {e}"))
}

/**
 * ifAdminStatus and ifOperStatus.  Admin status only ever uses the first
 * three.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr)]
#[repr(i32)]
pub enum IfStatus {
    Up = 1,
    Down = 2,
    Testing = 3,
    Unknown = 4,
    Dormant = 5,
    NotPresent = 6,
    LowerLayerDown = 7,
}

/**
 * The integer ifOperStatus/ifAdminStatus code for up(1).
 */
pub const IF_STATUS_UP: i32 = IfStatus::Up as i32;

/**
 * A row of ifTable, keyed by ifIndex.  Column names are matched after the
 * "if" prefix is stripped, so ifAdminStatus arrives as "AdminStatus".
 */
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IfEntry {
    pub index: u32,
    pub descr: Option<String>,
    #[serde(rename = "Type")]
    pub kind: Option<i32>,
    pub mtu: Option<i32>,
    pub speed: Option<u32>,
    pub admin_status: Option<IfStatus>,
    pub oper_status: Option<IfStatus>,
    pub in_octets: Option<u32>,
    pub in_errors: Option<u32>,
    pub out_octets: Option<u32>,
    pub out_errors: Option<u32>,
}

impl IfEntry {
    pub fn is_up(&self) -> bool {
        self.oper_status == Some(IfStatus::Up)
    }
}
