use std::path::PathBuf;
use std::process::ExitCode;

use imu_simulator::{serve, CommandRouter, Dataset, SimulatorConfig, SystemClock, TcpTransport};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = SimulatorConfig::from_env()?;
    if let Some(path) = std::env::args_os().nth(1) {
        config.dataset_path = PathBuf::from(path);
    }

    let dataset = Dataset::load(&config.dataset_path)?;
    log::info!(
        "Loaded {} samples from {}, ODR {:?}, device address 0x{:02x}",
        dataset.len(),
        config.dataset_path.display(),
        config.output_data_rate,
        config.device_address
    );

    let mut router = CommandRouter::from_config(&config, dataset, SystemClock);
    let mut transport = TcpTransport::bind(config.endpoint.as_str())?;
    serve(&mut transport, &mut router)?;
    Ok(())
}
