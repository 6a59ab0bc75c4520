mod clear_raster;
mod script;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{bail, Context, Result};
use fastcanvas_engine::device::GpuInit;
use fastcanvas_engine::logging::{init_logging, LoggingConfig};
use fastcanvas_engine::storage::{FsStorage, StorageConfig};
use fastcanvas_engine::window::{Runtime, RuntimeConfig};

use clear_raster::ClearRasterizer;

const USAGE: &str = "usage: fastcanvas-studio [SCRIPT] [--assets DIR] [--storage DIR]";

#[derive(Debug, Default)]
struct Options {
    /// Reads stdin when absent.
    script: Option<PathBuf>,
    storage: StorageConfig,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options> {
    let mut options = Options::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--assets" => {
                options.storage.asset_root = args.next().context("--assets needs a directory")?.into();
            }
            "--storage" => {
                options.storage.storage_root = args.next().context("--storage needs a directory")?.into();
            }
            "-h" | "--help" => bail!(USAGE),
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            path if options.script.is_none() => options.script = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument {extra}\n{USAGE}"),
        }
    }
    Ok(options)
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let options = parse_args(std::env::args().skip(1))?;
    log::info!(
        "assets from {}, captures to {}",
        options.storage.asset_root.display(),
        options.storage.storage_root.display()
    );

    let storage = Arc::new(FsStorage::new(options.storage));
    let (bridge, render_loop) = fastcanvas_engine::connect(storage, ClearRasterizer::new());

    let script = options.script;
    let control = thread::Builder::new()
        .name("fastcanvas-control".into())
        .spawn(move || -> Result<usize> {
            match script {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("failed to open script {}", path.display()))?;
                    script::play(&bridge, BufReader::new(file))
                }
                None => script::play(&bridge, io::stdin().lock()),
            }
        })
        .context("failed to spawn control thread")?;

    let config = RuntimeConfig {
        title: "FastCanvas Studio".to_string(),
        ..RuntimeConfig::default()
    };
    Runtime::run(config, GpuInit::default(), render_loop)?;

    // Teardown cancelled any frame request the script was blocked on. A
    // script reading stdin may still wait for input, so only report a
    // finished one.
    if control.is_finished() {
        match control.join() {
            Ok(Ok(count)) => log::info!("script executed {count} action(s)"),
            Ok(Err(err)) => log::error!("script failed: {err:#}"),
            Err(_) => log::error!("script thread panicked"),
        }
    }
    Ok(())
}
