//! A bulletin board service: postboards, posts and the events attached to
//! them, served as JSON over HTTP and stored in SQLite.

#[macro_use]
extern crate diesel;

use std::sync::{Arc, Mutex};

use log::info;

use rand::rngs::StdRng;
use rand::SeedableRng;

use rocket::{Build, Rocket};

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;

pub use config::Config;
pub use error::{Error, Result};

use models::Database;

/// The random source behind the demo data endpoint. Clones share the
/// generator.
#[derive(Clone)]
pub struct DemoRng(pub Arc<Mutex<StdRng>>);

impl DemoRng {
    /// A fixed sequence when `seed` is given, otherwise seeded from the OS.
    pub fn new(seed: Option<u64>) -> DemoRng {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        DemoRng(Arc::new(Mutex::new(rng)))
    }
}

/// Build a server for `config`. The database is opened, and its schema
/// brought up to date, before this returns.
pub fn new_instance(config: Config) -> Result<Rocket<Build>> {
    let db = Database::open(
        &config.database_url,
        config.pool_size,
        config.connection_options(),
    )?;

    info!("opened database {}", config.database_url);
    config.debug_log();

    let figment = rocket::Config::figment()
        .merge(("address", config.address.clone()))
        .merge(("port", config.port))
        .merge(("log_level", "off"));

    Ok(rocket::custom(figment)
        .mount("/api", routes::routes())
        .register("/", routes::catchers())
        .manage(db)
        .manage(DemoRng::new(config.demo_seed))
        .manage(config))
}
