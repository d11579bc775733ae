/*
 * Copyright 2024 Oxide Computer Company
 */

use std::collections::BTreeMap;

use crate::engine::Engine;
use crate::mib::{if_mib, snmpv2};
use crate::value::convert;
use crate::{Error, Oid, Result, Session};

/**
 * Named queries against any SNMP device.  Every query is a walk (or, for
 * sysDescr, a get) and every error is passed straight back to the caller.
 */
pub struct Device<'a, E: Engine> {
    session: &'a Session<E>,
}

impl<'a, E: Engine> Device<'a, E> {
    pub fn new(session: &'a Session<E>) -> Device<'a, E> {
        Device { session }
    }

    pub fn session(&self) -> &'a Session<E> {
        self.session
    }

    pub async fn sysdescr(&self) -> Result<String> {
        let oid = Oid::from_arcs(snmpv2::SYS_DESCR_0)?;
        let Some((oid, value)) = self.session.get(oid).await?.into_iter().next()
        else {
            return Err(Error::EmptyResponse { oid });
        };

        convert::string(&oid, value)
    }

    async fn column<T, F>(
        &self,
        col: &[u32],
        convert: F,
    ) -> Result<BTreeMap<u32, T>>
    where
        F: Fn(&Oid, crate::Value) -> Result<T>,
    {
        self.session
            .walk_subtree(Oid::from_arcs(col)?)
            .collect_by_index(convert)
            .await
    }

    pub async fn walk_iftype(&self) -> Result<BTreeMap<u32, i32>> {
        self.column(if_mib::IF_TYPE, convert::integer).await
    }

    pub async fn walk_ifadminstatus(&self) -> Result<BTreeMap<u32, i32>> {
        self.column(if_mib::IF_ADMIN_STATUS, convert::integer).await
    }

    pub async fn walk_ifoperstatus(&self) -> Result<BTreeMap<u32, i32>> {
        self.column(if_mib::IF_OPER_STATUS, convert::integer).await
    }

    pub async fn walk_ifname(&self) -> Result<BTreeMap<u32, String>> {
        self.column(if_mib::IF_NAME, convert::string).await
    }

    pub async fn walk_ifdescr(&self) -> Result<BTreeMap<u32, String>> {
        self.column(if_mib::IF_DESCR, convert::string).await
    }

    pub async fn walk_ifalias(&self) -> Result<BTreeMap<u32, String>> {
        self.column(if_mib::IF_ALIAS, convert::string).await
    }

    /**
     * ifStackStatus is indexed by (higher layer, lower layer).  Returns the
     * lower layers under each higher layer, in the order the device listed
     * them.  Higher layer 0 holds the interfaces with nothing above them.
     */
    pub async fn walk_ifstackstatus(&self) -> Result<BTreeMap<u32, Vec<u32>>> {
        let root = Oid::from_arcs(if_mib::IF_STACK_STATUS)?;
        let mut walk = self.session.walk_subtree(root);

        let mut out: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        while let Some((oid, _)) = walk.next().await? {
            match oid.relative_to(&root).as_deref() {
                Some(&[higher, lower]) => {
                    out.entry(higher).or_default().push(lower);
                }
                _ => return Err(Error::TableShape { root, oid }),
            }
        }

        Ok(out)
    }

    /**
     * The whole system group as one record.
     */
    pub async fn system(&self) -> Result<snmpv2::System> {
        let root = Oid::from_arcs(snmpv2::SYSTEM)?;
        self.session
            .walk_subtree(root)
            .collect()
            .await?
            .extract_object(root, "sys")
    }

    /**
     * ifTable, keyed by ifIndex.
     */
    pub async fn interfaces(&self) -> Result<BTreeMap<u32, if_mib::IfEntry>> {
        let entry = Oid::from_arcs(if_mib::IF_ENTRY)?;
        self.session
            .walk_subtree(entry)
            .collect()
            .await?
            .extract_table(entry, "if")
    }
}
