use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug};

use portablesource_installer::cli::Args;
use portablesource_installer::config::InstallerConfig;
use portablesource_installer::install::{self, console::Console};

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(if args.debug { LevelFilter::Debug } else { LevelFilter::Info })
        .init();

    let console = Console::default();

    // The pipeline is strictly sequential; a single-threaded runtime is enough.
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            console.error(format!("Failed to create Tokio runtime: {e}"));
            std::process::exit(1);
        }
    };

    // Everything the run owns, including the staging directory, is dropped
    // before we reach `exit`.
    let result = rt.block_on(real_main(args, &console));
    drop(rt);

    if let Err(e) = result {
        console.error(format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn real_main(args: Args, console: &Console) -> Result<()> {
    let config = InstallerConfig::load(args.config.as_deref()).context("Failed to load installer configuration")?;
    let config = args.apply(config);
    config.validate().context("Invalid installer configuration")?;
    debug!("Effective configuration: {config:?}");

    if args.dry_run {
        return install::run_dry_run(config, console).await;
    }

    install::run_install(config, console).await?;
    Ok(())
}
