/*
 * Copyright 2024 Oxide Computer Company
 */

use anyhow::{bail, Result};
use tracing_subscriber::EnvFilter;

use modemwalk::{Device, Session};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = getopts::Options::new()
        .optopt("c", "", "community string", "COMMUNITY")
        .optopt("p", "", "UDP port", "PORT")
        .optflag("n", "", "walk with GETNEXT instead of GETBULK")
        .parsing_style(getopts::ParsingStyle::StopAtFirstFree)
        .parse(std::env::args_os().skip(1))?;

    if opts.free.len() != 1 {
        bail!("specify host name or IP address of SNMP target");
    }

    let s = Session::builder(opts.free[0].as_str())
        .community(opts.opt_str("c").as_deref().unwrap_or("public"))
        .port(opts.opt_str("p").as_deref().unwrap_or("161").parse()?)
        .bulk(!opts.opt_present("n"))
        .build()?;
    let dev = Device::new(&s);

    let sys = dev.system().await?;
    println!("system = {sys:#?}");
    println!(
        "vendor OID is {} = {}",
        sys.object_id(),
        s.tree().describe(&sys.object_id()),
    );
    println!("up for {:?}", sys.uptime());
    println!();

    let names = dev.walk_ifname().await?;
    let aliases = dev.walk_ifalias().await?;
    for (idx, ent) in dev.interfaces().await? {
        println!(
            "{idx:>4} {:<24} {:<24} type {:>3} admin {:?} oper {:?}",
            names.get(&idx).map(String::as_str).unwrap_or("-"),
            aliases.get(&idx).map(String::as_str).unwrap_or("-"),
            ent.kind.unwrap_or_default(),
            ent.admin_status,
            ent.oper_status,
        );
    }
    println!();

    for (higher, lower) in dev.walk_ifstackstatus().await? {
        println!("{higher:>4} -> {lower:?}");
    }

    Ok(())
}
