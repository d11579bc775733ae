/*
 * Copyright 2024 Oxide Computer Company
 */

/*
 * SNMPv2-MIB: the system group.
 */

use super::sublude::*;
use crate::Oid;

pub const SYSTEM: &[u32] = &[1, 3, 6, 1, 2, 1, 1];
pub const SYS_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 1];
pub const SYS_OBJECT_ID: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 2];
pub const SYS_UP_TIME: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 3];
pub const SYS_CONTACT: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 4];
pub const SYS_NAME: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 5];
pub const SYS_LOCATION: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 6];
pub const SYS_SERVICES: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 7];

/**
 * sysDescr.0, the instance fetched with a single get.
 */
pub const SYS_DESCR_0: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 1, 0];

pub fn populate(tree: &mut OidTree) -> Result<()> {
    tree.add_all(&[
        ("system", SYSTEM),
        ("sysDescr", SYS_DESCR),
        ("sysObjectID", SYS_OBJECT_ID),
        ("sysUpTime", SYS_UP_TIME),
        ("sysContact", SYS_CONTACT),
        ("sysName", SYS_NAME),
        ("sysLocation", SYS_LOCATION),
        ("sysServices", SYS_SERVICES),
    ])
    .map_err(|e| anyhow!("snmpv2::populate: {e}"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct System {
    #[serde(rename = "Descr")]
    pub descr: String,
    #[serde(rename = "ObjectID")]
    object_id: Oid,
    #[serde(rename = "UpTime")]
    pub uptime: u32,
    #[serde(rename = "Contact")]
    pub contact: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
}

impl System {
    pub fn object_id(&self) -> Oid {
        self.object_id
    }

    /**
     * sysUpTime is in hundredths of a second.
     */
    pub fn uptime(&self) -> std::time::Duration {
        std::time::Duration::from_millis(u64::from(self.uptime) * 10)
    }
}
