use anyhow::{Context, Result};
use clap::Parser;

use clickmatch::config::{Args, Command, StaticConfig, get_config, init_config, init_config_from};
use clickmatch::runtime::modes;
use clickmatch::system::init_logging;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if let Command::GenerateConfig { output } = args.command() {
        let sample = StaticConfig::generate_sample_config();
        match output {
            Some(path) => {
                std::fs::write(&path, sample)
                    .with_context(|| format!("Failed to write {}", path))?;
                println!("Sample configuration written to {}", path);
            }
            None => print!("{}", sample),
        }
        return Ok(());
    }

    match args.config.as_deref() {
        Some(path) => init_config_from(path),
        None => init_config(),
    }

    let config = get_config();
    let _guard = init_logging(&config.logging)?;

    actix_web::rt::System::new().block_on(modes::run_server())
}
