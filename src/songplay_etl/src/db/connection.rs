//! Connection setup for both targets.

use diesel::{
    Connection, ConnectionError, ConnectionResult, PgConnection, SqliteConnection,
    connection::SimpleConnection,
};
use secrecy::ExposeSecret;
use tracing::info;
use url::Url;

use crate::config::ClusterConfig;

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> ConnectionResult<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)?;

    conn.batch_execute("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")
        .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
    info!(database = database_url, "connected to local warehouse");
    Ok(conn)
}

/// Build the `postgres://` URL for a cluster. User, password and database name are
/// percent-encoded, so any characters are allowed in them.
pub fn redshift_url(cfg: &ClusterConfig) -> ConnectionResult<Url> {
    let invalid = |what: &str| ConnectionError::InvalidConnectionUrl(format!("invalid {what}"));

    let mut url = Url::parse("postgres://localhost")
        .map_err(|e| ConnectionError::InvalidConnectionUrl(e.to_string()))?;
    url.set_host(Some(&cfg.host))
        .map_err(|_| invalid("cluster.host"))?;
    url.set_port(Some(cfg.db_port))
        .map_err(|_| invalid("cluster.db_port"))?;
    url.set_username(&cfg.db_user)
        .map_err(|_| invalid("cluster.db_user"))?;
    url.set_password(Some(cfg.db_password.expose_secret()))
        .map_err(|_| invalid("cluster.db_password"))?;
    url.set_path(&cfg.db_name);
    Ok(url)
}

/// Open a connection to a Redshift cluster.
pub fn connect_redshift(cfg: &ClusterConfig) -> ConnectionResult<PgConnection> {
    let url = redshift_url(cfg)?;
    let conn = PgConnection::establish(url.as_str())?;
    info!(
        host = %cfg.host,
        port = cfg.db_port,
        database = %cfg.db_name,
        "connected to cluster"
    );
    Ok(conn)
}
