/*
 * Copyright 2024 Oxide Computer Company
 */

/*
 * DOCS-IF-MIB (RFC 4546) channel and signal quality tables, and the reset
 * object from DOCS-CABLE-DEVICE-MIB (RFC 4639).
 */

use super::sublude::*;

pub const DOCS_IF_MIB: &[u32] = &[1, 3, 6, 1, 2, 1, 10, 127];
pub const DOCS_IF_BASE_OBJECTS: &[u32] = &[1, 3, 6, 1, 2, 1, 10, 127, 1, 1];

/*
 * docsIfDownstreamChannelTable.  Each row is indexed by the ifIndex of the
 * downstream interface.
 */
pub const DOWN_CHANNEL_TABLE: &[u32] = &[1, 3, 6, 1, 2, 1, 10, 127, 1, 1, 1];
pub const DOWN_CHANNEL_ENTRY: &[u32] =
    &[1, 3, 6, 1, 2, 1, 10, 127, 1, 1, 1, 1];
pub const DOWN_CHANNEL_ID: u32 = 1;
pub const DOWN_CHANNEL_FREQUENCY: u32 = 2;
pub const DOWN_CHANNEL_WIDTH: u32 = 3;
pub const DOWN_CHANNEL_MODULATION: u32 = 4;
pub const DOWN_CHANNEL_INTERLEAVE: u32 = 5;
pub const DOWN_CHANNEL_POWER: u32 = 6;
pub const DOWN_CHANNEL_ANNEX: u32 = 7;

/*
 * docsIfUpstreamChannelTable, indexed by the ifIndex of the upstream
 * interface.
 */
pub const UP_CHANNEL_TABLE: &[u32] = &[1, 3, 6, 1, 2, 1, 10, 127, 1, 1, 2];
pub const UP_CHANNEL_ENTRY: &[u32] = &[1, 3, 6, 1, 2, 1, 10, 127, 1, 1, 2, 1];
pub const UP_CHANNEL_ID: u32 = 1;
pub const UP_CHANNEL_FREQUENCY: u32 = 2;
pub const UP_CHANNEL_WIDTH: u32 = 3;
pub const UP_CHANNEL_MODULATION_PROFILE: u32 = 4;
pub const UP_CHANNEL_SLOT_SIZE: u32 = 5;
pub const UP_CHANNEL_TX_TIMING_OFFSET: u32 = 6;

/*
 * docsIfSignalQualityTable, indexed like the downstream channel table.
 */
pub const SIG_Q_TABLE: &[u32] = &[1, 3, 6, 1, 2, 1, 10, 127, 1, 1, 4];
pub const SIG_Q_ENTRY: &[u32] = &[1, 3, 6, 1, 2, 1, 10, 127, 1, 1, 4, 1];
pub const SIG_Q_SIGNAL_NOISE: &[u32] =
    &[1, 3, 6, 1, 2, 1, 10, 127, 1, 1, 4, 1, 5];
pub const SIG_Q_EXT_UNERROREDS: &[u32] =
    &[1, 3, 6, 1, 2, 1, 10, 127, 1, 1, 4, 1, 8];
pub const SIG_Q_EXT_CORRECTEDS: &[u32] =
    &[1, 3, 6, 1, 2, 1, 10, 127, 1, 1, 4, 1, 9];
pub const SIG_Q_EXT_UNCORRECTABLES: &[u32] =
    &[1, 3, 6, 1, 2, 1, 10, 127, 1, 1, 4, 1, 10];

pub const DOCS_DEV: &[u32] = &[1, 3, 6, 1, 2, 1, 69];
pub const DOCS_DEV_RESET_NOW: &[u32] = &[1, 3, 6, 1, 2, 1, 69, 1, 1, 3];

/**
 * docsDevResetNow.0; writing true(1) reboots the modem.
 */
pub const DOCS_DEV_RESET_NOW_0: &[u32] = &[1, 3, 6, 1, 2, 1, 69, 1, 1, 3, 0];

/*
 * docsIfDownChannelModulation values.
 */
pub const MODULATION_UNKNOWN: i32 = 1;
pub const MODULATION_OTHER: i32 = 2;
pub const MODULATION_QAM64: i32 = 3;
pub const MODULATION_QAM256: i32 = 4;

fn column(entry: &[u32], col: u32) -> Vec<u32> {
    let mut v = entry.to_vec();
    v.push(col);
    v
}

pub fn populate(tree: &mut OidTree) -> Result<()> {
    tree.add_all(&[
        ("docsIfMib", DOCS_IF_MIB),
        ("docsIfBaseObjects", DOCS_IF_BASE_OBJECTS),
        ("docsIfDownstreamChannelTable", DOWN_CHANNEL_TABLE),
        ("docsIfDownstreamChannelEntry", DOWN_CHANNEL_ENTRY),
        ("docsIfUpstreamChannelTable", UP_CHANNEL_TABLE),
        ("docsIfUpstreamChannelEntry", UP_CHANNEL_ENTRY),
        ("docsIfSignalQualityTable", SIG_Q_TABLE),
        ("docsIfSignalQualityEntry", SIG_Q_ENTRY),
        ("docsIfSigQSignalNoise", SIG_Q_SIGNAL_NOISE),
        ("docsIfSigQExtUnerroreds", SIG_Q_EXT_UNERROREDS),
        ("docsIfSigQExtCorrecteds", SIG_Q_EXT_CORRECTEDS),
        ("docsIfSigQExtUncorrectables", SIG_Q_EXT_UNCORRECTABLES),
        ("docsDev", DOCS_DEV),
        ("docsDevResetNow", DOCS_DEV_RESET_NOW),
    ])
    .map_err(|e| anyhow!("docsis::populate: {e}"))?;

    /*
     * The channel table columns are addressed by number when joining, so
     * they are named from the column constants:
     */
    for (name, col) in [
        ("docsIfDownChannelId", DOWN_CHANNEL_ID),
        ("docsIfDownChannelFrequency", DOWN_CHANNEL_FREQUENCY),
        ("docsIfDownChannelWidth", DOWN_CHANNEL_WIDTH),
        ("docsIfDownChannelModulation", DOWN_CHANNEL_MODULATION),
        ("docsIfDownChannelInterleave", DOWN_CHANNEL_INTERLEAVE),
        ("docsIfDownChannelPower", DOWN_CHANNEL_POWER),
        ("docsIfDownChannelAnnex", DOWN_CHANNEL_ANNEX),
    ] {
        tree.add(&column(DOWN_CHANNEL_ENTRY, col), name)
            .map_err(|e| anyhow!("docsis::populate: {e}"))?;
    }

    for (name, col) in [
        ("docsIfUpChannelId", UP_CHANNEL_ID),
        ("docsIfUpChannelFrequency", UP_CHANNEL_FREQUENCY),
        ("docsIfUpChannelWidth", UP_CHANNEL_WIDTH),
        ("docsIfUpChannelModulationProfile", UP_CHANNEL_MODULATION_PROFILE),
        ("docsIfUpChannelSlotSize", UP_CHANNEL_SLOT_SIZE),
        ("docsIfUpChannelTxTimingOffset", UP_CHANNEL_TX_TIMING_OFFSET),
    ] {
        tree.add(&column(UP_CHANNEL_ENTRY, col), name)
            .map_err(|e| anyhow!("docsis::populate: {e}"))?;
    }

    Ok(())
}

/**
 * A row of docsIfDownstreamChannelTable, keyed by raw row index.  Every
 * column is optional: a device may skip any of them for a given row, and the
 * channel ID in particular has to be checked before the row can be used.
 */
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DownstreamChannel {
    pub id: Option<u32>,
    /** Hz */
    pub frequency: Option<u32>,
    /** Hz */
    pub width: Option<u32>,
    pub modulation: Option<i32>,
    /** tenths of a dBmV */
    pub power: Option<i32>,
}

/**
 * A row of docsIfUpstreamChannelTable, keyed by raw row index.
 */
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpstreamChannel {
    pub id: Option<u32>,
    /** Hz */
    pub frequency: Option<u32>,
    /** Hz */
    pub width: Option<u32>,
    pub modulation_profile: Option<u32>,
    /** units of 6.25 microseconds / 64 */
    pub tx_timing_offset: Option<u32>,
}

impl DownstreamChannel {
    /**
     * Whether anything besides the channel ID arrived for this row.
     */
    pub(crate) fn has_data(&self) -> bool {
        self.frequency.is_some()
            || self.width.is_some()
            || self.modulation.is_some()
            || self.power.is_some()
    }
}

impl UpstreamChannel {
    pub(crate) fn has_data(&self) -> bool {
        self.frequency.is_some()
            || self.width.is_some()
            || self.modulation_profile.is_some()
            || self.tx_timing_offset.is_some()
    }
}
