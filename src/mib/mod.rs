/*
 * Copyright 2024 Oxide Computer Company
 */

use crate::oidtree::OidTree;
use anyhow::{anyhow, Result};

pub mod docsis;
pub mod if_mib;
pub mod snmpv2;

mod sublude {
    pub(crate) use crate::oidtree::OidTree;
    pub(crate) use anyhow::{anyhow, Result};
    pub(crate) use serde::Deserialize;
    #[allow(unused_imports)]
    pub(crate) use serde_repr::Deserialize_repr;
}

/*
 * The path to the root is via: iso(1) org(3) dod(6) internet(1), but none of
 * that hierarchy is generally useful at this point so we'll start at
 * "internet" directly.
 */
pub const INTERNET: &[u32] = &[1, 3, 6, 1];
pub const MGMT: &[u32] = &[1, 3, 6, 1, 2];
pub const MIB_2: &[u32] = &[1, 3, 6, 1, 2, 1];
pub const TRANSMISSION: &[u32] = &[1, 3, 6, 1, 2, 1, 10];
pub const PRIVATE: &[u32] = &[1, 3, 6, 1, 4];
pub const ENTERPRISES: &[u32] = &[1, 3, 6, 1, 4, 1];
pub const SNMP_V2: &[u32] = &[1, 3, 6, 1, 6];

pub fn base() -> Result<OidTree> {
    let mut tree = OidTree::default();

    tree.add_all(&[
        ("internet", INTERNET),
        ("mgmt", MGMT),
        ("mib-2", MIB_2),
        ("transmission", TRANSMISSION),
        ("private", PRIVATE),
        ("enterprises", ENTERPRISES),
        ("snmpV2", SNMP_V2),
    ])
    .map_err(|e| anyhow!("mib::base: {e}"))?;

    Ok(tree)
}

/**
 * The naming tree for every MIB this crate knows about.
 */
pub fn standard() -> Result<OidTree> {
    let mut tree = base()?;
    snmpv2::populate(&mut tree)?;
    if_mib::populate(&mut tree)?;
    docsis::populate(&mut tree)?;
    Ok(tree)
}
