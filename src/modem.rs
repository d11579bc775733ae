/*
 * Copyright 2024 Oxide Computer Company
 */

/*
 * DOCSIS cable modem polling: the downstream and upstream channel tables,
 * signal quality and codeword counters, joined into one record keyed by
 * logical channel ID.
 */

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::mib::docsis::{self, DownstreamChannel, UpstreamChannel};
use crate::mib::if_mib::IF_STATUS_UP;
use crate::value::{convert, Tenths};
use crate::{Device, Error, Oid, Result, Session, Value};

/**
 * Why a poll stopped early.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollError {
    SnmpTimeout,
    DnsNxdomain,
}

impl PollError {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollError::SnmpTimeout => "snmp_timeout",
            PollError::DnsNxdomain => "dns_nxdomain",
        }
    }
}

impl std::fmt::Display for PollError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/**
 * The result of one poll of one modem.  Every per-channel map is keyed by
 * logical channel ID (docsIfDownChannelId / docsIfUpChannelId), never by
 * row index.
 *
 * If `error` is set the poll stopped early and holds whatever had been
 * gathered up to that point.
 */
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModemInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sysdescr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PollError>,

    /** Hz */
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub down_freq: BTreeMap<u32, u32>,
    /** Hz */
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub down_bw: BTreeMap<u32, u32>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub down_mod: BTreeMap<u32, i32>,
    /** dBmV */
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub down_power: BTreeMap<u32, f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub down_non_oper: Vec<u32>,
    /** dB */
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub down_snr: BTreeMap<u32, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub down_cw_unerroreds: BTreeMap<u32, u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub down_cw_correcteds: BTreeMap<u32, u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub down_cw_uncorrectables: BTreeMap<u32, u64>,

    /** Hz */
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub up_freq: BTreeMap<u32, u32>,
    /** Hz */
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub up_bw: BTreeMap<u32, u32>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub up_timingoffset: BTreeMap<u32, u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub up_non_oper: Vec<u32>,
}

impl ModemInfo {
    /**
     * The record as a JSON object, leaving out every field with nothing in
     * it.  Map keys become strings, as JSON requires.
     */
    pub fn to_record(
        &self,
    ) -> Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => {
                Err(anyhow::anyhow!("record is not an object: {other}").into())
            }
        }
    }
}

/**
 * Row index to logical channel ID, built from a channel table's ID column.
 */
struct ChannelIds {
    table: &'static str,
    ids: BTreeMap<u32, u32>,
}

impl ChannelIds {
    fn channel(&self, index: u32) -> Result<u32> {
        self.ids
            .get(&index)
            .copied()
            .ok_or(Error::IndexConsistency { table: self.table, index })
    }

    /**
     * Re-key a table indexed by row into one indexed by channel ID.
     */
    fn rekey<T>(
        &self,
        table: &'static str,
        rows: BTreeMap<u32, T>,
    ) -> Result<BTreeMap<u32, T>> {
        rows.into_iter()
            .map(|(index, v)| match self.ids.get(&index) {
                Some(ch) => Ok((*ch, v)),
                None => Err(Error::IndexConsistency { table, index }),
            })
            .collect()
    }
}

/**
 * Work out channel IDs from the ID column first, then check every row that
 * carries anything else has one.  Rows whose interface is known and not up
 * are listed in `non_oper`.
 */
fn channel_ids<R>(
    table: &'static str,
    rows: &BTreeMap<u32, R>,
    id: impl Fn(&R) -> Option<u32>,
    has_data: impl Fn(&R) -> bool,
    oper: &BTreeMap<u32, i32>,
    non_oper: &mut Vec<u32>,
) -> Result<ChannelIds> {
    let mut ids = BTreeMap::new();
    for (&index, row) in rows {
        let Some(ch) = id(row) else { continue };
        ids.insert(index, ch);
        if oper.get(&index).is_some_and(|&st| st != IF_STATUS_UP) {
            non_oper.push(ch);
        }
    }

    let ids = ChannelIds { table, ids };
    for (&index, row) in rows {
        if has_data(row) {
            ids.channel(index)?;
        }
    }
    Ok(ids)
}

/**
 * A DOCSIS cable modem.
 */
pub struct Modem<'a, E: Engine> {
    device: Device<'a, E>,
}

impl<'a, E: Engine> Modem<'a, E> {
    pub fn new(session: &'a Session<E>) -> Modem<'a, E> {
        Modem { device: Device::new(session) }
    }

    /**
     * The generic device queries, for the same session.
     */
    pub fn device(&self) -> &Device<'a, E> {
        &self.device
    }

    fn session(&self) -> &'a Session<E> {
        self.device.session()
    }

    async fn column<T, F>(
        &self,
        col: &[u32],
        convert: F,
    ) -> Result<BTreeMap<u32, T>>
    where
        F: Fn(&Oid, Value) -> Result<T>,
    {
        self.session()
            .walk_subtree(Oid::from_arcs(col)?)
            .collect_by_index(convert)
            .await
    }

    /**
     * docsIfSigQSignalNoise by row index, in dB.
     */
    pub async fn walk_downstr_snr(&self) -> Result<BTreeMap<u32, Tenths>> {
        self.column(docsis::SIG_Q_SIGNAL_NOISE, convert::tenths).await
    }

    pub async fn walk_downstr_cw_unerroreds(
        &self,
    ) -> Result<BTreeMap<u32, u64>> {
        self.column(docsis::SIG_Q_EXT_UNERROREDS, convert::counter).await
    }

    pub async fn walk_downstr_cw_correcteds(
        &self,
    ) -> Result<BTreeMap<u32, u64>> {
        self.column(docsis::SIG_Q_EXT_CORRECTEDS, convert::counter).await
    }

    pub async fn walk_downstr_cw_uncorrectables(
        &self,
    ) -> Result<BTreeMap<u32, u64>> {
        self.column(docsis::SIG_Q_EXT_UNCORRECTABLES, convert::counter)
            .await
    }

    /**
     * docsIfDownstreamChannelTable by row index.
     */
    pub async fn downstream_channels(
        &self,
    ) -> Result<BTreeMap<u32, DownstreamChannel>> {
        let entry = Oid::from_arcs(docsis::DOWN_CHANNEL_ENTRY)?;
        self.session()
            .walk_subtree(entry)
            .collect()
            .await?
            .extract_table(entry, "docsIfDownChannel")
    }

    /**
     * docsIfUpstreamChannelTable by row index.
     */
    pub async fn upstream_channels(
        &self,
    ) -> Result<BTreeMap<u32, UpstreamChannel>> {
        let entry = Oid::from_arcs(docsis::UP_CHANNEL_ENTRY)?;
        self.session()
            .walk_subtree(entry)
            .collect()
            .await?
            .extract_table(entry, "docsIfUpChannel")
    }

    /**
     * Reboot the modem through docsDevResetNow.
     */
    pub async fn reset(&self) -> Result<()> {
        let oid = Oid::from_arcs(docsis::DOCS_DEV_RESET_NOW_0)?;
        warn!(host = self.session().host(), "resetting modem");
        self.session().set(oid, Value::integer(1)).await?;
        Ok(())
    }

    /**
     * Poll everything into one record.  A timeout or a host that does not
     * resolve ends the poll early with `error` set on the record; anything
     * else is returned as an error.
     */
    pub async fn get_all_info(&self) -> Result<ModemInfo> {
        let mut info = ModemInfo::default();

        match self.poll(&mut info).await {
            Ok(()) => {}
            Err(e @ Error::Timeout { .. }) => {
                warn!(host = self.session().host(), "poll cut short: {e}");
                info.error = Some(PollError::SnmpTimeout);
            }
            Err(e @ Error::NameResolution { .. }) => {
                warn!(host = self.session().host(), "poll abandoned: {e}");
                info.error = Some(PollError::DnsNxdomain);
            }
            Err(e) => return Err(e),
        }

        Ok(info)
    }

    async fn poll(&self, info: &mut ModemInfo) -> Result<()> {
        info.sysdescr = Some(self.device.sysdescr().await?);
        let oper = self.device.walk_ifoperstatus().await?;

        let down = self.downstream_channels().await?;
        let ids = channel_ids(
            "docsIfDownstreamChannelTable",
            &down,
            |r| r.id,
            DownstreamChannel::has_data,
            &oper,
            &mut info.down_non_oper,
        )?;
        for (index, row) in down {
            let Some(ch) = row.id else { continue };
            debug!(index, ch, "downstream channel");
            if let Some(v) = row.frequency {
                info.down_freq.insert(ch, v);
            }
            if let Some(v) = row.width {
                info.down_bw.insert(ch, v);
            }
            if let Some(v) = row.modulation {
                info.down_mod.insert(ch, v);
            }
            if let Some(v) = row.power {
                info.down_power.insert(ch, Tenths(v.into()).to_f64());
            }
        }

        let up = self.upstream_channels().await?;
        let up_ids = channel_ids(
            "docsIfUpstreamChannelTable",
            &up,
            |r| r.id,
            UpstreamChannel::has_data,
            &oper,
            &mut info.up_non_oper,
        )?;
        for (index, row) in up {
            let Some(ch) = row.id else { continue };
            debug!(index, ch, "upstream channel");
            if let Some(v) = row.frequency {
                info.up_freq.insert(ch, v);
            }
            if let Some(v) = row.width {
                info.up_bw.insert(ch, v);
            }
            if let Some(v) = row.tx_timing_offset {
                info.up_timingoffset.insert(ch, v);
            }
        }
        debug!(
            down = ids.ids.len(),
            up = up_ids.ids.len(),
            "channel tables joined",
        );

        let snr = self.walk_downstr_snr().await?;
        info.down_snr = ids
            .rekey("docsIfSigQSignalNoise", snr)?
            .into_iter()
            .map(|(ch, t)| (ch, t.to_f64()))
            .collect();

        let cw = self.walk_downstr_cw_unerroreds().await?;
        info.down_cw_unerroreds = ids.rekey("docsIfSigQExtUnerroreds", cw)?;

        let cw = self.walk_downstr_cw_correcteds().await?;
        info.down_cw_correcteds = ids.rekey("docsIfSigQExtCorrecteds", cw)?;

        let cw = self.walk_downstr_cw_uncorrectables().await?;
        info.down_cw_uncorrectables =
            ids.rekey("docsIfSigQExtUncorrectables", cw)?;

        Ok(())
    }
}
