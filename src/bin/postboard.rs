use std::path::PathBuf;

use clap::{value_parser, Arg, Command};

use postboard::{new_instance, Config, Result};

#[rocket::main]
async fn main() -> Result<()> {
    let matches = Command::new("postboard")
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Serve the postboard API")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .help("Config file to use"),
        )
        .get_matches();

    let config =
        Config::open_or_default(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    config.init_logging()?;

    log::info!("listening on {}:{}", config.address, config.port);

    let _rocket = new_instance(config)?.launch().await?;

    Ok(())
}
