/*
 * Copyright 2024 Oxide Computer Company
 */

use std::ops::Deref;

/*
 * Re-export the csnmp module we're using:
 */
pub use csnmp;
use csnmp::ObjectIdentifier;
use serde::{de::Visitor, Deserialize, Deserializer};

pub mod device;
pub mod engine;
pub mod error;
pub mod mib;
pub mod modem;
pub mod oidtree;
pub mod session;
pub mod value;
pub mod walk;

pub use device::Device;
pub use error::{Error, Result};
pub use modem::{Modem, ModemInfo, PollError};
pub use session::{Session, SessionBuilder, SessionConfig};
pub use value::{Tenths, Value};
pub use walk::{Subtree, WalkedValues};

/*
 * csnmp orders object identifiers arc by arc, so a BTreeMap<Oid, _> iterates
 * in SNMP (lexicographic) order.
 */
#[derive(Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct Oid(ObjectIdentifier);

impl std::fmt::Debug for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        format_args!("Oid({})", self).fmt(f)
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(OidVisitor)
    }
}

struct OidVisitor;

impl<'de> Visitor<'de> for OidVisitor {
    type Value = Oid;

    fn expecting(
        &self,
        formatter: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        formatter.write_str("an OID (a sequence of u32)")
    }

    fn visit_seq<A>(
        self,
        mut seq: A,
    ) -> std::result::Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut nums: Vec<u32> =
            Vec::with_capacity(seq.size_hint().unwrap_or(16));

        while let Some(val) = seq.next_element()? {
            nums.push(val);
        }

        Oid::from_arcs(&nums).map_err(serde::de::Error::custom)
    }
}

impl Deref for Oid {
    type Target = ObjectIdentifier;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<ObjectIdentifier> for Oid {
    fn from(oid: ObjectIdentifier) -> Self {
        Oid(oid)
    }
}

impl Oid {
    /**
     * Build an OID from its numeric arcs, e.g. one of the constants in the
     * [`mib`] modules.
     */
    pub fn from_arcs(arcs: &[u32]) -> Result<Oid> {
        ObjectIdentifier::try_from(arcs)
            .map(Oid)
            .map_err(|e| Error::InvalidOid(format!("{arcs:?}: {e}")))
    }

    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.as_slice().starts_with(prefix.as_slice())
    }

    /**
     * The index part of this OID below `base`, or None if this OID is not
     * within the subtree rooted at `base`.
     */
    pub fn relative_to(&self, base: &Oid) -> Option<RelativeOid> {
        self.as_slice()
            .strip_prefix(base.as_slice())
            .map(|rel| RelativeOid(rel.to_vec()))
    }

    pub fn last(&self) -> Option<u32> {
        self.as_slice().last().copied()
    }

    pub fn child(&self, arc: u32) -> Result<Oid> {
        let mut arcs = self.as_slice().to_vec();
        arcs.push(arc);
        Oid::from_arcs(&arcs)
    }
}

/**
 * The suffix of an OID below some table or column root: for a conceptual
 * table entry this is (column, index...), for a column it is just the index.
 */
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Debug)]
pub struct RelativeOid(Vec<u32>);

impl Deref for RelativeOid {
    type Target = [u32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for RelativeOid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts = self.0.iter().map(|a| a.to_string()).collect::<Vec<_>>();
        parts.join(".").fmt(f)
    }
}
