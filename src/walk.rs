/*
 * Copyright 2024 Oxide Computer Company
 */

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::Arc,
};

use anyhow::anyhow;
use serde::{de::value::MapDeserializer, Deserialize};
use tracing::{debug, trace};

use crate::engine::Engine;
use crate::oidtree::OidTree;
use crate::session::Session;
use crate::{value::Value, Error, Oid, Result};

impl<E: Engine> Session<E> {
    /**
     * Start a walk of everything below `root`.  Nothing is sent until the
     * first call to [`Subtree::next`].
     */
    pub fn walk_subtree(&self, root: Oid) -> Subtree<'_, E> {
        Subtree {
            session: self,
            root,
            cursor: root,
            page: VecDeque::new(),
            pages: 0,
            done: false,
        }
    }
}

/**
 * A walk of one subtree, produced a page at a time.
 *
 * Agents answer get-next and get-bulk with whatever follows the requested
 * OID, so a page regularly runs on into the next table.  The walk ends at the
 * first OID that is not below the root, and that OID (and the rest of its
 * page) is dropped.  A walk can be consumed only once; walk again from the
 * root to start over.
 */
pub struct Subtree<'a, E: Engine> {
    session: &'a Session<E>,
    root: Oid,
    cursor: Oid,
    page: VecDeque<(Oid, Value)>,
    pages: usize,
    done: bool,
}

impl<E: Engine> Subtree<'_, E> {
    pub fn root(&self) -> Oid {
        self.root
    }

    fn finish(&mut self, why: &str) {
        debug!(
            host = self.session.host(),
            root = %self.session.tree().describe(&self.root),
            pages = self.pages,
            "walk done: {why}",
        );
        self.page.clear();
        self.done = true;
    }

    pub async fn next(&mut self) -> Result<Option<(Oid, Value)>> {
        loop {
            if let Some((oid, value)) = self.page.pop_front() {
                if !oid.starts_with(&self.root) || oid == self.root {
                    trace!(%oid, root = %self.root, "left subtree");
                    self.finish("end of subtree");
                    return Ok(None);
                }

                if oid <= self.cursor {
                    let previous = self.cursor;
                    self.finish("OID did not increase");
                    return Err(Error::NonIncreasing {
                        root: self.root,
                        previous,
                        current: oid,
                    });
                }

                self.cursor = oid;
                return Ok(Some((oid, value)));
            }

            if self.done {
                return Ok(None);
            }

            let page = match self.session.walk(self.cursor).await {
                Ok(page) => page,
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            };
            self.pages += 1;

            if page.is_empty() {
                self.finish("end of MIB view");
                return Ok(None);
            }
            self.page = page.into();
        }
    }

    /**
     * As [`Subtree::next`], but pass the value through a converter from
     * [`crate::value::convert`] (or anything shaped like one).
     */
    pub async fn next_with<T, F>(
        &mut self,
        convert: F,
    ) -> Result<Option<(Oid, T)>>
    where
        F: FnOnce(&Oid, Value) -> Result<T>,
    {
        match self.next().await? {
            Some((oid, value)) => Ok(Some((oid, convert(&oid, value)?))),
            None => Ok(None),
        }
    }

    /**
     * Drain the walk into a buffer for typed extraction.
     */
    pub async fn collect(mut self) -> Result<WalkedValues> {
        let mut values = BTreeMap::new();
        while let Some((oid, value)) = self.next().await? {
            values.insert(oid, value);
        }

        Ok(WalkedValues { values, tree: self.session.tree_arc() })
    }

    /**
     * Drain the walk into a map keyed by the last arc of each OID, which for
     * a column of a singly-indexed table is the row index.
     */
    pub async fn collect_by_index<T, F>(
        mut self,
        convert: F,
    ) -> Result<BTreeMap<u32, T>>
    where
        F: Fn(&Oid, Value) -> Result<T>,
    {
        let mut out = BTreeMap::new();
        while let Some((oid, value)) = self.next_with(&convert).await? {
            let Some(idx) = oid.last() else {
                return Err(Error::TableShape { root: self.root, oid });
            };
            out.insert(idx, value);
        }

        Ok(out)
    }
}

/**
 * The complete result of a subtree walk, for turning into typed records.
 */
pub struct WalkedValues {
    values: BTreeMap<Oid, Value>,
    tree: Arc<OidTree>,
}

impl WalkedValues {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, oid: &Oid) -> Option<&Value> {
        self.values.get(oid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &Value)> {
        self.values.iter()
    }

    fn under(&self, root: Oid) -> impl Iterator<Item = (&Oid, &Value)> {
        self.values
            .range(root..)
            .take_while(move |(oid, _)| oid.starts_with(&root))
    }

    /**
     * Deserialise the scalar objects (`object.0`) directly under `group`,
     * e.g. the system group.  Each object is matched to a field by its MIB
     * name with `strip_name_prefix` removed, so with "sys" sysUpTime.0 fills
     * a field named "UpTime".
     */
    pub fn extract_object<T>(
        &self,
        group: Oid,
        strip_name_prefix: &str,
    ) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut map: HashMap<String, &Value> = HashMap::new();
        for (oid, val) in self.under(group) {
            /*
             * There may be tables or other objects underneath this one in
             * the space, so skip over anything that is not a direct child
             * value.
             */
            let Some(rel) = oid.relative_to(&group) else { continue };
            if rel.len() != 2 || rel[1] != 0 {
                continue;
            }

            let name = self.tree.oid_name(oid)?;
            if name.suffix() != [0] {
                trace!(%oid, "skipping unnamed object");
                continue;
            }

            let Some(n) = name.basename().strip_prefix(strip_name_prefix)
            else {
                return Err(anyhow!(
                    "name {name} not prefixed with {strip_name_prefix:?}"
                )
                .into());
            };
            map.insert(n.to_string(), val);
        }

        T::deserialize(MapDeserializer::new(map.into_iter())).map_err(
            |source| Error::Deserialize {
                what: self.tree.describe(&group),
                source,
            },
        )
    }

    /**
     * Deserialise the rows of the conceptual table whose entry OID is
     * `entry`, keyed by row index.  Column names are matched to fields as for
     * [`WalkedValues::extract_object`]; columns with no name in the tree are
     * skipped.  Only tables with a single integer index are supported.
     */
    pub fn extract_table<T>(
        &self,
        entry: Oid,
        strip_name_prefix: &str,
    ) -> Result<BTreeMap<u32, T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut out: BTreeMap<u32, HashMap<String, &Value>> = BTreeMap::new();
        for (oid, val) in self.under(entry) {
            let rel = match oid.relative_to(&entry) {
                Some(rel) if rel.len() == 2 => rel,
                _ => {
                    return Err(Error::TableShape { root: entry, oid: *oid });
                }
            };

            let column = entry.child(rel[0])?;
            let Some(name) = self.tree.name_of(&column) else {
                trace!(%oid, "skipping unnamed column");
                continue;
            };
            let Some(n) = name.strip_prefix(strip_name_prefix) else {
                return Err(anyhow!(
                    "name {name} not prefixed with {strip_name_prefix:?}"
                )
                .into());
            };

            let i = rel[1];
            let row = out.entry(i).or_default();
            if row.insert(n.to_string(), val).is_some() {
                return Err(anyhow!("duplicate {n:?}[{i}] value?").into());
            }
        }

        out.into_iter()
            .map(|(idx, row)| {
                T::deserialize(MapDeserializer::new(row.into_iter()))
                    .map(|t| (idx, t))
                    .map_err(|source| Error::Deserialize {
                        what: format!("{}.{idx}", self.tree.describe(&entry)),
                        source,
                    })
            })
            .collect()
    }
}
