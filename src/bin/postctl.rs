use std::io::Write;
use std::path::PathBuf;

use clap::{value_parser, Arg, Command};

use rand::rngs::StdRng;
use rand::SeedableRng;

use postboard::models::{now, PostboardId, SingleConnection};
use postboard::{Config, Result};

fn print_json<T>(value: &T) -> Result<()>
where
    T: serde::Serialize,
{
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;

    Ok(())
}

fn main_res() -> Result<()> {
    let matches = Command::new("postctl")
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Inspect and manage a postboard database")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .help("Config file to use"),
        )
        .arg(
            Arg::new("database-url")
                .short('u')
                .long("database-url")
                .value_name("URL")
                .num_args(1)
                .help("SQLite database file to use"),
        )
        .subcommand(
            Command::new("generate-config")
                .about("Print a config file with default values"),
        )
        .subcommand(
            Command::new("check-config")
                .about("Check configuration file for errors"),
        )
        .subcommand(Command::new("boards").about("Print every postboard"))
        .subcommand(
            Command::new("posts")
                .about("Print the posts on a postboard")
                .arg(
                    Arg::new("board")
                        .help("The postboard ID")
                        .required(true)
                        .value_parser(value_parser!(PostboardId)),
                ),
        )
        .subcommand(
            Command::new("seed")
                .about("Give the demo user a new postboard with random posts")
                .arg(
                    Arg::new("seed")
                        .short('s')
                        .long("seed")
                        .value_name("N")
                        .num_args(1)
                        .value_parser(value_parser!(u64))
                        .help("Seed for the random generator"),
                ),
        )
        .get_matches();

    if matches.subcommand_matches("generate-config").is_some() {
        return Config::generate(std::io::stdout());
    }

    let conf_path = matches.get_one::<PathBuf>("config");
    let mut config = Config::open_or_default(conf_path.map(PathBuf::as_path))?;

    if matches.subcommand_matches("check-config").is_some() {
        // Parsing succeeded, so the file is good.
        match conf_path {
            Some(path) => println!("Configuration: {}", path.display()),
            None => println!("Configuration: {}", Config::default_path().display()),
        }
        println!("\n{}", serde_yaml::to_string(&config)?);
        println!("Config file is good.");
        return Ok(());
    }

    if let Some(url) = matches.get_one::<String>("database-url") {
        config.database_url = url.to_owned();
    }

    let mut db = SingleConnection::establish(&config.database_url)?;

    match matches.subcommand() {
        Some(("boards", _)) => print_json(&db.all_boards()?)?,
        Some(("posts", sub)) => {
            if let Some(board_id) = sub.get_one::<PostboardId>("board") {
                print_json(&db.posts_on_board(*board_id)?)?;
            }
        }
        Some(("seed", sub)) => {
            let mut rng = match sub.get_one::<u64>("seed").or(config.demo_seed.as_ref()) {
                Some(seed) => StdRng::seed_from_u64(*seed),
                None => StdRng::from_entropy(),
            };

            print_json(&db.seed_demo(&mut rng, now())?)?;
        }
        _ => {}
    }

    Ok(())
}

fn main() {
    if let Err(e) = main_res() {
        eprintln!("{}", e);
        std::process::exit(-1);
    }
}
