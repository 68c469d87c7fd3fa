use std::process::ExitCode;

use autocrop_cli::{logger, BatchError, BatchRunner, CropConfig};
use log::{error, warn};

#[cfg(feature = "serde")]
fn load_config() -> Result<CropConfig, BatchError> {
    CropConfig::discover()
}

#[cfg(not(feature = "serde"))]
fn load_config() -> Result<CropConfig, BatchError> {
    Ok(CropConfig::default())
}

fn run() -> Result<(), BatchError> {
    let cfg = load_config()?;
    if let Err(e) = autocrop_cli::autocrop_core::init_thread_pool(cfg.n_threads) {
        warn!("could not size the global thread pool: {}", e);
    }

    println!(
        "Cropping templates from {} out of {} into {} and {}",
        cfg.template_dir.display(),
        cfg.source_dir.display(),
        cfg.high_res_dir.display(),
        cfg.fixed_dir.display()
    );
    let report = BatchRunner::new(cfg)?.run()?;
    println!("{}", report.summary());
    Ok(())
}

fn main() -> ExitCode {
    logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
