/*
 * Copyright 2024 Oxide Computer Company
 */

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use crate::Oid;
use anyhow::{anyhow, bail, Result};

/**
 * Maps numeric OIDs to MIB object descriptors ("ifOperStatus") and back.
 * Descriptors are unique across the MIBs we load, so a single flat namespace
 * is enough.
 */
#[derive(Debug, Clone, Default)]
pub struct OidTree {
    names: BTreeMap<Vec<u32>, String>,
    oids: HashMap<String, Vec<u32>>,
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.chars().any(|c| !c.is_ascii_alphanumeric() && c != '-')
    {
        bail!("invalid OID name: {name:?}");
    }

    Ok(())
}

/**
 * The readable form of an OID: the closest named ancestor, plus whatever
 * index arcs follow it.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidName {
    base: String,
    suffix: Vec<u32>,
}

impl OidName {
    pub fn basename(&self) -> &str {
        &self.base
    }

    pub fn suffix(&self) -> &[u32] {
        &self.suffix
    }
}

impl Display for OidName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base)?;
        for arc in &self.suffix {
            write!(f, ".{arc}")?;
        }
        Ok(())
    }
}

impl OidTree {
    pub fn add(&mut self, oid: &[u32], name: &str) -> Result<()> {
        check_name(name)?;
        if oid.is_empty() {
            bail!("cannot name the empty OID {name:?}");
        }

        if let Some(prior) = self.oids.get(name) {
            if prior.as_slice() != oid {
                bail!("adding: duplicate name {name:?} for {prior:?}");
            }
        }
        if let Some(prior) = self.names.get(oid) {
            if prior != name {
                bail!("adding: {oid:?} already named {prior:?}");
            }
        }

        self.names.insert(oid.to_vec(), name.to_string());
        self.oids.insert(name.to_string(), oid.to_vec());
        Ok(())
    }

    pub fn add_all(&mut self, entries: &[(&str, &[u32])]) -> Result<()> {
        for (name, oid) in entries {
            self.add(oid, name)?;
        }
        Ok(())
    }

    /**
     * Look up "ifOperStatus", or an instance below a named object such as
     * "ifOperStatus.3".
     */
    pub fn oid_by_name(&self, name: &str) -> Result<Oid> {
        let mut parts = name.split('.');
        let base = parts.next().unwrap_or_default();

        let Some(oid) = self.oids.get(base) else {
            bail!("could not find {base:?}");
        };

        let mut arcs = oid.clone();
        for p in parts {
            arcs.push(
                p.parse()
                    .map_err(|e| anyhow!("mapping OID {name:?}: {p:?}: {e}"))?,
            );
        }

        Oid::from_arcs(&arcs).map_err(|e| anyhow!("mapping OID {name:?}: {e}"))
    }

    /**
     * The descriptor for exactly this OID, if we have one.
     */
    pub fn name_of(&self, oid: &Oid) -> Option<&str> {
        self.names.get(oid.as_slice()).map(String::as_str)
    }

    pub fn oid_name(&self, oid: &Oid) -> Result<OidName> {
        let arcs = oid.as_slice();

        /*
         * Try successively shorter prefixes until one has a name.
         */
        for n in (1..=arcs.len()).rev() {
            if let Some(base) = self.names.get(&arcs[..n]) {
                return Ok(OidName {
                    base: base.clone(),
                    suffix: arcs[n..].to_vec(),
                });
            }
        }

        bail!("no name for any part of {oid}")
    }

    /**
     * A name for log messages, falling back to the numeric form.
     */
    pub fn describe(&self, oid: &Oid) -> String {
        self.oid_name(oid)
            .map(|n| n.to_string())
            .unwrap_or_else(|_| oid.to_string())
    }
}
