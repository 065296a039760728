#![allow(dead_code)]

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};
use serde_json::{Value, json};
use songplay_etl::config::{Config, load_config_str};
use songplay_etl::schema_manager::SchemaManager;
use songplay_etl::sql::Dialect;
use songplay_etl::warehouse::LocalWarehouse;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Event-log fields in `staging_events` column order.
pub const EVENT_FIELDS: [&str; 18] = [
    "artist",
    "auth",
    "firstName",
    "gender",
    "itemInSession",
    "lastName",
    "length",
    "level",
    "location",
    "method",
    "page",
    "registration",
    "sessionId",
    "song",
    "status",
    "ts",
    "userAgent",
    "userId",
];

#[derive(QueryableByName)]
struct Count {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

#[derive(QueryableByName, Debug, PartialEq)]
pub struct TimeRow {
    #[diesel(sql_type = Text)]
    pub start_time: String,
    #[diesel(sql_type = Integer)]
    pub hour: i32,
    #[diesel(sql_type = Integer)]
    pub day: i32,
    #[diesel(sql_type = Integer)]
    pub week: i32,
    #[diesel(sql_type = Integer)]
    pub month: i32,
    #[diesel(sql_type = Integer)]
    pub year: i32,
    #[diesel(sql_type = Integer)]
    pub weekday: i32,
}

#[derive(QueryableByName, Debug, PartialEq)]
pub struct PlayRow {
    #[diesel(sql_type = Text)]
    pub start_time: String,
    #[diesel(sql_type = Text)]
    pub user_id: String,
    #[diesel(sql_type = Text)]
    pub level: String,
    #[diesel(sql_type = Text)]
    pub song_id: String,
    #[diesel(sql_type = Text)]
    pub artist_id: String,
    #[diesel(sql_type = Text)]
    pub session_id: String,
    #[diesel(sql_type = Text)]
    pub user_agent: String,
}

#[derive(QueryableByName)]
struct Level {
    #[diesel(sql_type = Text)]
    level: String,
}

pub struct TestEnv {
    _dir: TempDir, // keep alive for the life of the test
    pub root: PathBuf,
    pub log_data: PathBuf,
    pub song_data: PathBuf,
    pub jsonpaths: PathBuf,
    pub database: PathBuf,
}

impl TestEnv {
    /// `[local]` config pointing at this environment's paths.
    pub fn config_toml(&self) -> String {
        format!(
            "[local]\ndatabase = '{}'\n\n[s3]\nlog_data = '{}'\nlog_jsonpath = '{}'\nsong_data = '{}'\n",
            self.database.display(),
            self.log_data.display(),
            self.jsonpaths.display(),
            self.song_data.display(),
        )
    }

    pub fn config(&self) -> Config {
        load_config_str(&self.config_toml()).expect("config")
    }

    pub fn open(&self) -> LocalWarehouse {
        LocalWarehouse::open(&self.database).expect("open warehouse")
    }

    /// Write newline-delimited event records to `log_data/<name>`.
    pub fn write_events(&self, name: &str, events: &[Value]) {
        let body = events
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        write(&self.log_data.join(name), &body);
    }

    /// Write one song record to `song_data/<name>`.
    pub fn write_song(&self, name: &str, song: &Value) {
        write(&self.song_data.join(name), &song.to_string());
    }

    pub fn write_raw_song(&self, name: &str, body: &str) {
        write(&self.song_data.join(name), body);
    }
}

fn write(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(path, body).expect("write");
}

/// Temp directory with empty source prefixes and an event jsonpaths file. No tables yet.
pub fn setup_env() -> TestEnv {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path().to_path_buf();
    let log_data = root.join("log_data");
    let song_data = root.join("song_data");
    std::fs::create_dir_all(&log_data).expect("mkdir log_data");
    std::fs::create_dir_all(&song_data).expect("mkdir song_data");

    let jsonpaths = root.join("log_json_path.json");
    let paths: Vec<String> = EVENT_FIELDS.iter().map(|f| format!("$['{f}']")).collect();
    write(&jsonpaths, &json!({ "jsonpaths": paths }).to_string());

    TestEnv {
        _dir: dir,
        database: root.join("dwh.db"),
        root,
        log_data,
        song_data,
        jsonpaths,
    }
}

/// [`setup_env`] plus a freshly reset schema.
pub fn setup_warehouse() -> (TestEnv, LocalWarehouse) {
    let env = setup_env();
    let mut wh = env.open();
    let schema = SchemaManager::new(Dialect::Sqlite);
    schema.drop_all(&mut wh).expect("drop");
    schema.create_all(&mut wh).expect("create");
    (env, wh)
}

/// A `NextSong` event for user 42 at the Unix epoch.
pub fn next_song_event() -> Value {
    json!({
        "artist": "A",
        "auth": "Logged In",
        "firstName": "F",
        "gender": "M",
        "itemInSession": 0,
        "lastName": "L",
        "length": 200.5,
        "level": "free",
        "location": "X",
        "method": "PUT",
        "page": "NextSong",
        "registration": 1540919166796.0,
        "sessionId": 7,
        "song": "T",
        "status": 200,
        "ts": 0,
        "userAgent": "Z",
        "userId": "42"
    })
}

/// The catalog entry matching [`next_song_event`].
pub fn song_record() -> Value {
    json!({
        "num_songs": 1,
        "artist_id": "AR1",
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "",
        "artist_name": "A",
        "song_id": "S1",
        "title": "T",
        "duration": 218.93,
        "year": 0
    })
}

pub fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    let c: Count = diesel::sql_query(format!("SELECT COUNT(*) AS n FROM {table}"))
        .get_result(conn)
        .expect("count");
    c.n
}

pub fn time_rows(conn: &mut SqliteConnection) -> Vec<TimeRow> {
    diesel::sql_query(
        "SELECT start_time, hour, day, week, month, year, weekday FROM dimtime ORDER BY start_time",
    )
    .load(conn)
    .expect("dimtime")
}

pub fn play_rows(conn: &mut SqliteConnection) -> Vec<PlayRow> {
    diesel::sql_query(
        "SELECT start_time, user_id, level, song_id, artist_id, session_id, user_agent \
         FROM factsongplay ORDER BY songplay_id",
    )
    .load(conn)
    .expect("factsongplay")
}

pub fn user_level(conn: &mut SqliteConnection, user_id: &str) -> String {
    let l: Level = diesel::sql_query(format!(
        "SELECT level FROM dimuser WHERE user_id = '{user_id}'"
    ))
    .get_result(conn)
    .expect("dimuser level");
    l.level
}
