use envoy_mobile_config::{cli, config};

fn main() -> anyhow::Result<()> {
    // Must happen before any settings are read from the environment
    config::load_dotenv();

    cli::run_cli()
}
