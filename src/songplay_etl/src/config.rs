//! Warehouse configuration: parsing, validation, and loading.
//!
//! The TOML file mirrors the classic `dwh.cfg` sections:
//! - `[cluster]`: Redshift endpoint and login (host, db_name, db_user, db_password, db_port)
//! - `[s3]`: event-log prefix, event-log jsonpaths file, song-catalog prefix, bucket region
//! - `[iam_role]`: role ARN passed to `COPY` as credentials
//! - `[local]`: SQLite database path, used instead of `[cluster]` for local runs
//!
//! Exactly one of `[cluster]` and `[local]` selects the target. With `[local]` the `[s3]`
//! values are filesystem paths read by the in-process loader.
//!
//! `SONGPLAY_ETL_DB_PASSWORD`, when set and non-blank, replaces `cluster.db_password`.
//!
//! Entrypoints:
//! - Parse + validate from a TOML string: [`load_config_str`]
//! - Parse + validate from a file path: [`load_config_path`]

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use shared_utils::env::env_override;
use thiserror::Error;

use crate::sql::{Dialect, copy::JsonFormat};

/// Environment variable overriding `cluster.db_password`.
pub const PASSWORD_ENV: &str = "SONGPLAY_ETL_DB_PASSWORD";

/// Region used when `[s3].region` is omitted.
pub const DEFAULT_REGION: &str = "ap-southeast-2";

/// Errors raised while reading or validating configuration. All of them surface before
/// any connection is opened.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or does not match the expected shape.
    #[error("failed to parse config TOML")]
    Parse(#[from] toml::de::Error),
    /// Neither or both of `[cluster]` and `[local]` were given.
    #[error("config must contain exactly one of [cluster] or [local]")]
    Target,
    /// A required value is absent.
    #[error("missing config value: {0}")]
    Missing(&'static str),
    /// A value is present but unusable.
    #[error("invalid config value {key}: {reason}")]
    Invalid {
        /// Dotted key, e.g. `iam_role.arn`.
        key: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DwhFile {
    cluster: Option<ClusterCfg>,
    local: Option<LocalCfg>,
    s3: S3Cfg,
    iam_role: Option<IamRoleCfg>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClusterCfg {
    host: String,
    db_name: String,
    db_user: String,
    db_password: Option<String>,
    db_port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LocalCfg {
    database: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct S3Cfg {
    log_data: String,
    log_jsonpath: String,
    song_data: String,
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IamRoleCfg {
    arn: String,
}

/// Validated configuration handed to each component's constructor.
#[derive(Debug)]
pub struct Config {
    /// Where statements run.
    pub target: Target,
    /// Bulk-load sources.
    pub s3: S3Config,
    /// Role ARN for `COPY` credentials; always present for [`Target::Cluster`].
    pub iam_role: Option<String>,
}

/// Warehouse the pipeline runs against.
#[derive(Debug)]
pub enum Target {
    /// A Redshift cluster.
    Cluster(ClusterConfig),
    /// A SQLite database with local JSON sources.
    Local(LocalConfig),
}

/// Redshift login.
#[derive(Debug)]
pub struct ClusterConfig {
    /// Endpoint host name.
    pub host: String,
    /// Database name.
    pub db_name: String,
    /// Database user.
    pub db_user: String,
    /// Database password; redacted in `Debug`.
    pub db_password: SecretString,
    /// Port, 5439 on a default cluster.
    pub db_port: u16,
}

/// Local SQLite target.
#[derive(Debug)]
pub struct LocalConfig {
    /// Database file path.
    pub database: PathBuf,
}

/// Bulk-load sources.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Event-log prefix (or local path).
    pub log_data: String,
    /// Mapping for event logs; the string `auto` selects [`JsonFormat::Auto`].
    pub log_format: JsonFormat,
    /// Song-catalog prefix (or local path).
    pub song_data: String,
    /// Bucket region.
    pub region: String,
}

impl Config {
    /// Dialect statements are rendered in for this target.
    pub fn dialect(&self) -> Dialect {
        match self.target {
            Target::Cluster(_) => Dialect::Redshift,
            Target::Local(_) => Dialect::Sqlite,
        }
    }
}

fn required(value: String, key: &'static str) -> Result<String, ConfigError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ConfigError::Missing(key));
    }
    Ok(value)
}

fn validate(file: DwhFile) -> Result<Config, ConfigError> {
    let iam_role = match file.iam_role {
        Some(role) => {
            let arn = required(role.arn, "iam_role.arn")?;
            if !arn.starts_with("arn:") {
                return Err(ConfigError::Invalid {
                    key: "iam_role.arn",
                    reason: "expected an ARN starting with `arn:`",
                });
            }
            Some(arn)
        }
        None => None,
    };

    let target = match (file.cluster, file.local) {
        (Some(c), None) => {
            if iam_role.is_none() {
                return Err(ConfigError::Missing("iam_role.arn"));
            }
            if c.db_port == 0 {
                return Err(ConfigError::Invalid {
                    key: "cluster.db_port",
                    reason: "port must be non-zero",
                });
            }
            let password = env_override(PASSWORD_ENV)
                .or(c.db_password)
                .ok_or(ConfigError::Missing("cluster.db_password"))?;
            Target::Cluster(ClusterConfig {
                host: required(c.host, "cluster.host")?,
                db_name: required(c.db_name, "cluster.db_name")?,
                db_user: required(c.db_user, "cluster.db_user")?,
                db_password: SecretString::new(password.into()),
                db_port: c.db_port,
            })
        }
        (None, Some(l)) => {
            if l.database.as_os_str().is_empty() {
                return Err(ConfigError::Missing("local.database"));
            }
            Target::Local(LocalConfig {
                database: l.database,
            })
        }
        _ => return Err(ConfigError::Target),
    };

    let log_jsonpath = required(file.s3.log_jsonpath, "s3.log_jsonpath")?;
    let log_format = if log_jsonpath.eq_ignore_ascii_case("auto") {
        JsonFormat::Auto
    } else {
        JsonFormat::JsonPaths(log_jsonpath)
    };
    let region = match file.s3.region {
        Some(r) => required(r, "s3.region")?,
        None => DEFAULT_REGION.to_string(),
    };

    Ok(Config {
        target,
        s3: S3Config {
            log_data: required(file.s3.log_data, "s3.log_data")?,
            log_format,
            song_data: required(file.s3.song_data, "s3.song_data")?,
            region,
        },
        iam_role,
    })
}

/// Parse and validate configuration from a TOML string.
///
/// Errors:
/// - TOML parse failures, including unknown keys
/// - Missing or ambiguous target sections, missing values, malformed ARN
pub fn load_config_str(toml_str: &str) -> Result<Config, ConfigError> {
    let file: DwhFile = toml::from_str(toml_str)?;
    validate(file)
}

/// Read a configuration file from disk, parse, and validate it.
///
/// See [`load_config_str`] for details.
pub fn load_config_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_str(&text)
}
