#![recursion_limit = "512"]

#[macro_use] pub extern crate diesel;
#[macro_use] extern crate diesel_migrations;
#[macro_use] extern crate error_chain;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate log;

pub extern crate chrono;

pub use diesel::prelude::*;
pub use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, PooledConnection};

pub type ConnManager = ConnectionManager<PgConnection>;
pub type Connection = PooledConnection<ConnManager>;

/// Logs how long the expression took, at debug level.
#[macro_export]
macro_rules! time_it {
    ($comment:expr , $code:expr) => { {
        let start = ::std::time::Instant::now();
        let result = $code;
        let elapsed = start.elapsed();
        ::log::debug!("{} took {}.{:03}s", $comment, elapsed.as_secs(), elapsed.subsec_millis());
        result
    } }
}

macro_rules! try_or {
    ($t:expr , else $e:expr ) => {  match $t { Some(x) => x, None => { $e } }  }
}

pub mod errors;
pub mod schema;
pub mod models;
pub mod period;
pub mod stats;
pub mod subject;
pub mod question;
pub mod image;
pub mod review;
pub mod review_session;
pub mod session;
pub mod user;

pub use crate::errors::*;
pub use crate::models::*;


pub mod db {
    use super::*;
    use diesel::Connection as _;
    use diesel::r2d2::Pool;

    embed_migrations!();

    pub fn connect(database_url: &str) -> Result<PgConnection> {
        PgConnection::establish(database_url)
            .chain_err(|| "Error connecting to database!")
    }

    pub fn pool(database_url: &str, max_size: u32) -> Result<Pool<ConnManager>> {
        let manager = ConnManager::new(database_url);
        Pool::builder()
            .max_size(max_size)
            .build(manager)
            .chain_err(|| "Couldn't build the connection pool!")
    }

    /// Runs pending migrations. Returns whether there are any users yet.
    pub fn check(conn: &PgConnection) -> Result<bool> {
        embedded_migrations::run(conn).chain_err(|| "Couldn't run the migrations.")?;
        info!("Migrations checked.");
        is_installed(conn)
    }

    pub fn is_installed(conn: &PgConnection) -> Result<bool> {
        let count: i64 = schema::users::table
            .count()
            .get_result(conn)?;

        Ok(count > 0)
    }
}
