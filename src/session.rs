/*
 * Copyright 2024 Oxide Computer Company
 */

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::anyhow;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::engine::{CsnmpEngine, Engine, Response, Target};
use crate::oidtree::OidTree;
use crate::{mib, value::Value, Error, Oid, Result};

/**
 * Everything needed to talk to one device.  Deserialisable so that a list of
 * devices can come straight out of a configuration file; anything but the
 * host may be left out.
 */
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    pub host: String,
    #[serde(default = "default_community")]
    pub community: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /**
     * Use GETBULK to page through walks.  Many cable modems do not answer
     * GETBULK at all (it shows up as a timeout), so turn this off for them.
     */
    #[serde(default = "default_bulk")]
    pub bulk: bool,
    /**
     * Objects per GETBULK.  Bigger pages mean fewer round trips but larger
     * responses, which get fragmented on small-MTU links.
     */
    #[serde(default = "default_bulk_count")]
    pub bulk_count: u32,
}

fn default_community() -> String {
    "public".to_string()
}

fn default_port() -> u16 {
    161
}

fn default_bulk() -> bool {
    true
}

fn default_bulk_count() -> u32 {
    40
}

impl SessionConfig {
    pub fn new<S: Into<String>>(host: S) -> SessionConfig {
        SessionConfig {
            host: host.into(),
            community: default_community(),
            port: default_port(),
            bulk: default_bulk(),
            bulk_count: default_bulk_count(),
        }
    }
}

/**
 * One device, reached through a shared [`Engine`].  A session issues one
 * request at a time; poll several devices by giving each its own session.
 */
pub struct Session<E = CsnmpEngine> {
    config: SessionConfig,
    engine: Arc<E>,
    tree: Arc<OidTree>,
    addr: OnceCell<SocketAddr>,
}

impl Session<CsnmpEngine> {
    pub fn builder<S: Into<String>>(host: S) -> SessionBuilder {
        SessionBuilder::from(SessionConfig::new(host))
    }
}

impl<E: Engine> Session<E> {
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn tree(&self) -> &OidTree {
        &self.tree
    }

    pub(crate) fn tree_arc(&self) -> Arc<OidTree> {
        Arc::clone(&self.tree)
    }

    /**
     * Resolve the host the first time it is needed.  Nothing is sent to the
     * device until this has succeeded.
     */
    async fn target(&self) -> Result<Target> {
        let host = &self.config.host;
        let port = self.config.port;

        let addr = self
            .addr
            .get_or_try_init(|| async {
                let mut addrs = tokio::net::lookup_host((host.as_str(), port))
                    .await
                    .map_err(|source| Error::NameResolution {
                        host: host.clone(),
                        source,
                    })?;

                addrs.next().ok_or_else(|| Error::NameResolution {
                    host: host.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "no addresses",
                    ),
                })
            })
            .await?;

        Ok(Target {
            addr: *addr,
            community: self.config.community.as_bytes().to_vec(),
        })
    }

    /**
     * Turn an engine response into var-binds or an error.  An error
     * indication with no status is a timeout; a status, with or without an
     * indication, is the device telling us no.
     */
    fn check(
        &self,
        op: &str,
        oid: Oid,
        res: Response,
    ) -> Result<Vec<(Oid, Value)>> {
        let Response {
            error_indication,
            error_status,
            error_index,
            var_binds,
        } = res;

        if error_status != 0 || error_index != 0 {
            warn!(
                host = %self.config.host,
                %oid,
                status = error_status,
                index = error_index,
                "{op} failed",
            );
            return Err(Error::Protocol {
                host: self.config.host.clone(),
                status: error_status,
                index: error_index,
            });
        }

        if let Some(indication) = error_indication {
            debug!(host = %self.config.host, %oid, %indication, "{op} failed");
            return Err(Error::Timeout {
                host: self.config.host.clone(),
                indication,
            });
        }

        Ok(var_binds)
    }

    /**
     * Fetch exactly the object named by `oid`.
     */
    pub async fn get(&self, oid: Oid) -> Result<Vec<(Oid, Value)>> {
        let target = self.target().await?;
        debug!(host = self.host(), oid = %self.tree.describe(&oid), "get");
        let res = self.engine.get(&target, oid).await?;
        self.check("get", oid, res)
    }

    /**
     * Fetch one page of whatever follows `oid`: a GETBULK of `bulk_count`
     * objects, or a single GETNEXT.  The page is not confined to any
     * subtree; see [`Session::walk_subtree`] for that.
     */
    pub async fn walk(&self, oid: Oid) -> Result<Vec<(Oid, Value)>> {
        let target = self.target().await?;
        let res = if self.config.bulk {
            debug!(
                host = %self.config.host,
                oid = %self.tree.describe(&oid),
                count = self.config.bulk_count,
                "getbulk",
            );
            self.engine
                .bulk_walk(&target, self.config.bulk_count, oid)
                .await?
        } else {
            debug!(
                host = self.host(),
                oid = %self.tree.describe(&oid),
                "getnext",
            );
            self.engine.next_walk(&target, oid).await?
        };
        self.check("walk", oid, res)
    }

    pub async fn set(
        &self,
        oid: Oid,
        value: Value,
    ) -> Result<Vec<(Oid, Value)>> {
        let target = self.target().await?;
        debug!(
            host = self.host(),
            oid = %self.tree.describe(&oid),
            ?value,
            "set",
        );
        let res = self.engine.set(&target, oid, value).await?;
        self.check("set", oid, res)
    }
}

pub struct SessionBuilder {
    config: SessionConfig,
    tree: Option<OidTree>,
}

impl From<SessionConfig> for SessionBuilder {
    fn from(config: SessionConfig) -> Self {
        SessionBuilder { config, tree: None }
    }
}

impl SessionBuilder {
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.config.port = port;
        self
    }

    pub fn community<C: AsRef<str>>(&mut self, community: C) -> &mut Self {
        self.config.community = community.as_ref().to_string();
        self
    }

    pub fn bulk(&mut self, bulk: bool) -> &mut Self {
        self.config.bulk = bulk;
        self
    }

    pub fn bulk_count(&mut self, count: u32) -> &mut Self {
        self.config.bulk_count = count;
        self
    }

    /**
     * Add names to the OID tree, e.g. for vendor MIBs.  The tree starts out
     * with every MIB in [`crate::mib`].
     */
    pub fn with_oid_tree<E: std::fmt::Display + Send + Sync>(
        &mut self,
        func: impl Fn(&mut OidTree) -> std::result::Result<(), E>,
    ) -> anyhow::Result<&mut Self> {
        let tree = match self.tree.take() {
            Some(tree) => tree,
            None => mib::standard()?,
        };
        let tree = self.tree.insert(tree);
        func(tree)
            .map_err(|e| anyhow!("session builder with_oid_tree(): {e}"))?;
        Ok(self)
    }

    /**
     * Build a session on the process-wide csnmp engine.
     */
    pub fn build(&self) -> Result<Session<CsnmpEngine>> {
        self.build_with(CsnmpEngine::shared())
    }

    pub fn build_with<E: Engine>(&self, engine: Arc<E>) -> Result<Session<E>> {
        let tree = match &self.tree {
            Some(tree) => tree.clone(),
            None => mib::standard()?,
        };

        if self.config.bulk && self.config.bulk_count == 0 {
            return Err(anyhow!("bulk walks need a bulk count above 0").into());
        }

        Ok(Session {
            config: self.config.clone(),
            engine,
            tree: Arc::new(tree),
            addr: OnceCell::new(),
        })
    }
}
