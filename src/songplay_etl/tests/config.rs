use secrecy::ExposeSecret;
use serial_test::serial;
use songplay_etl::config::{
    ConfigError, DEFAULT_REGION, PASSWORD_ENV, Target, load_config_path, load_config_str,
};
use songplay_etl::sql::{Dialect, copy::JsonFormat};

const S3: &str = r#"
[s3]
log_data = "s3://udacity-dend/log_data"
log_jsonpath = "s3://udacity-dend/log_json_path.json"
song_data = "s3://udacity-dend/song_data"
"#;

const CLUSTER: &str = r#"
[cluster]
host = "dwh.abc123.ap-southeast-2.redshift.amazonaws.com"
db_name = "dev"
db_user = "awsuser"
db_password = "from-file"
db_port = 5439
"#;

const IAM: &str = r#"
[iam_role]
arn = "arn:aws:iam::123456789012:role/dwhRole"
"#;

fn cluster_toml() -> String {
    format!("{CLUSTER}{S3}{IAM}")
}

#[test]
#[serial]
fn cluster_config_parses() {
    let cfg = load_config_str(&cluster_toml()).unwrap();
    assert_eq!(cfg.dialect(), Dialect::Redshift);
    assert_eq!(cfg.s3.region, DEFAULT_REGION);
    assert_eq!(
        cfg.s3.log_format,
        JsonFormat::JsonPaths("s3://udacity-dend/log_json_path.json".into())
    );
    assert_eq!(
        cfg.iam_role.as_deref(),
        Some("arn:aws:iam::123456789012:role/dwhRole")
    );
    let Target::Cluster(cluster) = &cfg.target else {
        panic!("expected cluster target");
    };
    assert_eq!(cluster.db_port, 5439);
    assert_eq!(cluster.db_password.expose_secret(), "from-file");
}

#[test]
#[serial]
fn password_env_overrides_file() {
    unsafe { std::env::set_var(PASSWORD_ENV, "from-env") };
    let cfg = load_config_str(&cluster_toml());
    unsafe { std::env::remove_var(PASSWORD_ENV) };

    let Target::Cluster(cluster) = cfg.unwrap().target else {
        panic!("expected cluster target");
    };
    assert_eq!(cluster.db_password.expose_secret(), "from-env");
}

#[test]
#[serial]
fn password_may_come_from_env_only() {
    let toml = cluster_toml().replace("db_password = \"from-file\"\n", "");
    assert!(matches!(
        load_config_str(&toml),
        Err(ConfigError::Missing("cluster.db_password"))
    ));

    unsafe { std::env::set_var(PASSWORD_ENV, "from-env") };
    let cfg = load_config_str(&toml);
    unsafe { std::env::remove_var(PASSWORD_ENV) };
    assert!(cfg.is_ok());
}

#[test]
fn local_config_needs_no_role() {
    let cfg = load_config_str(&format!("[local]\ndatabase = \"dwh.db\"\n{S3}")).unwrap();
    assert_eq!(cfg.dialect(), Dialect::Sqlite);
    assert!(cfg.iam_role.is_none());
}

#[test]
fn auto_jsonpath_and_region_override() {
    let toml = format!(
        "[local]\ndatabase = \"dwh.db\"\n{}region = \"us-west-2\"\n",
        S3.replace("s3://udacity-dend/log_json_path.json", "AUTO")
    );
    let cfg = load_config_str(&toml).unwrap();
    assert_eq!(cfg.s3.log_format, JsonFormat::Auto);
    assert_eq!(cfg.s3.region, "us-west-2");
}

#[test]
fn exactly_one_target_is_required() {
    let both = format!("{CLUSTER}[local]\ndatabase = \"dwh.db\"\n{S3}{IAM}");
    assert!(matches!(load_config_str(&both), Err(ConfigError::Target)));
    assert!(matches!(load_config_str(S3), Err(ConfigError::Target)));
}

#[test]
#[serial]
fn cluster_requires_role() {
    let toml = format!("{CLUSTER}{S3}");
    assert!(matches!(
        load_config_str(&toml),
        Err(ConfigError::Missing("iam_role.arn"))
    ));
}

#[test]
#[serial]
fn malformed_values_are_rejected() {
    let bad_arn = cluster_toml().replace("arn:aws", "aws");
    assert!(matches!(
        load_config_str(&bad_arn),
        Err(ConfigError::Invalid {
            key: "iam_role.arn",
            ..
        })
    ));

    let zero_port = cluster_toml().replace("5439", "0");
    assert!(matches!(
        load_config_str(&zero_port),
        Err(ConfigError::Invalid {
            key: "cluster.db_port",
            ..
        })
    ));

    let blank_host =
        cluster_toml().replace("dwh.abc123.ap-southeast-2.redshift.amazonaws.com", " ");
    assert!(matches!(
        load_config_str(&blank_host),
        Err(ConfigError::Missing("cluster.host"))
    ));
}

#[test]
fn unknown_keys_fail_parsing() {
    let toml = format!("[local]\ndatabase = \"dwh.db\"\nschema = \"public\"\n{S3}");
    assert!(matches!(load_config_str(&toml), Err(ConfigError::Parse(_))));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.toml");
    match load_config_path(&path) {
        Err(ConfigError::Read { path: p, .. }) => assert_eq!(p, path),
        other => panic!("unexpected: {other:?}"),
    }
}
