/*
 * Copyright 2024 Oxide Computer Company
 */

use anyhow::{bail, Context, Result};
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

use modemwalk::{Modem, SessionBuilder, SessionConfig};

type Record = serde_json::Map<String, serde_json::Value>;

async fn poll(
    cfg: SessionConfig,
    reset: bool,
) -> modemwalk::Result<Option<Record>> {
    let s = SessionBuilder::from(cfg).build()?;
    let modem = Modem::new(&s);

    if reset {
        modem.reset().await?;
        return Ok(None);
    }

    Ok(Some(modem.get_all_info().await?.to_record()?))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = getopts::Options::new()
        .optopt("c", "", "community string", "COMMUNITY")
        .optopt("b", "", "objects per GETBULK", "COUNT")
        .optflag("n", "", "walk with GETNEXT instead of GETBULK")
        .optopt("f", "", "JSON list of session configurations", "FILE")
        .optflag("", "reset", "reboot each modem instead of polling it")
        .parsing_style(getopts::ParsingStyle::StopAtFirstFree)
        .parse(std::env::args_os().skip(1))?;

    let mut configs: Vec<SessionConfig> = if let Some(f) = opts.opt_str("f") {
        let buf = std::fs::read_to_string(&f)
            .with_context(|| format!("reading {f}"))?;
        serde_json::from_str(&buf).with_context(|| format!("parsing {f}"))?
    } else {
        Vec::new()
    };
    configs.extend(opts.free.iter().map(SessionConfig::new));

    if configs.is_empty() {
        bail!("specify one or more modems to poll");
    }

    let bulk_count = opts.opt_str("b").map(|b| b.parse::<u32>()).transpose()?;
    let reset = opts.opt_present("reset");

    /*
     * Each modem gets its own session and task; they all share the one
     * engine.
     */
    let mut tasks = JoinSet::new();
    for mut cfg in configs {
        if let Some(c) = opts.opt_str("c") {
            cfg.community = c;
        }
        if opts.opt_present("n") {
            cfg.bulk = false;
        }
        if let Some(b) = bulk_count {
            cfg.bulk_count = b;
        }

        tasks.spawn(async move {
            let host = cfg.host.clone();
            (host, poll(cfg, reset).await)
        });
    }

    let mut failed = false;
    while let Some(res) = tasks.join_next().await {
        let (host, res) = res?;
        match res {
            Ok(Some(rec)) => {
                let out = serde_json::json!({ "host": host, "info": rec });
                println!("{out}");
            }
            Ok(None) => println!("{host}: reset"),
            Err(e) => {
                eprintln!("{host}: {e}");
                failed = true;
            }
        }
    }

    if failed {
        bail!("some modems could not be polled");
    }

    Ok(())
}
