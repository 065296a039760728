//! INSERT...SELECT statements that build the star schema from the staging tables.
//!
//! Dimension inserts guard against existing keys with a `NOT IN (SELECT ...)` anti-join,
//! so re-running them over unchanged staging data adds nothing. The fact insert has no
//! such guard and appends again on every run.

use super::{DatePart, Dialect};

/// `factsongplay`: every `NextSong` event whose song title and artist name match a
/// catalog row exactly. Unmatched events are dropped.
pub fn songplay_insert(dialect: Dialect) -> String {
    let start_time = dialect.epoch_millis_to_timestamp("events.ts");
    format!(
        "INSERT INTO factsongplay (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT
    {start_time} AS start_time,
    events.userId AS user_id,
    events.level,
    songs.song_id,
    songs.artist_id,
    events.sessionId AS session_id,
    events.location,
    events.user_agent
FROM staging_events events
JOIN staging_songs songs
    ON events.song = songs.title AND events.artist = songs.artist_name
WHERE events.page = 'NextSong'"
    )
}

/// `dimuser`: users seen in `NextSong` events. A user already present keeps the level
/// from the run that first inserted it.
pub fn user_insert() -> String {
    "INSERT INTO dimuser (user_id, first_name, last_name, gender, level)
SELECT DISTINCT
    userId,
    firstName,
    lastName,
    gender,
    level
FROM staging_events
WHERE page = 'NextSong'
    AND userId NOT IN (SELECT DISTINCT user_id FROM dimuser)"
        .to_string()
}

/// `dimsong`: catalog songs not yet present.
pub fn song_insert() -> String {
    "INSERT INTO dimsong (song_id, title, artist_id, year, duration)
SELECT DISTINCT
    song_id,
    title,
    artist_id,
    year,
    duration
FROM staging_songs
WHERE song_id NOT IN (SELECT DISTINCT song_id FROM dimsong)"
        .to_string()
}

/// `dimartist`: catalog artists not yet present.
pub fn artist_insert() -> String {
    "INSERT INTO dimartist (artist_id, name, location, latitude, longitude)
SELECT DISTINCT
    artist_id,
    artist_name AS name,
    artist_location AS location,
    artist_latitude AS latitude,
    artist_longitude AS longitude
FROM staging_songs
WHERE artist_id NOT IN (SELECT DISTINCT artist_id FROM dimartist)"
        .to_string()
}

/// `dimtime`: distinct play timestamps, recomputed from `ts` independently of the fact
/// insert, exploded into calendar parts.
pub fn time_insert(dialect: Dialect) -> String {
    let start_time = dialect.epoch_millis_to_timestamp("ts");
    let part = |p| dialect.date_part(p, "start_time");
    format!(
        "INSERT INTO dimtime (start_time, hour, day, week, month, year, weekday)
SELECT DISTINCT
    start_time,
    {hour} AS hour,
    {day} AS day,
    {week} AS week,
    {month} AS month,
    {year} AS year,
    {weekday} AS weekday
FROM (
    SELECT DISTINCT {start_time} AS start_time
    FROM staging_events
    WHERE page = 'NextSong'
) AS plays
WHERE start_time NOT IN (SELECT DISTINCT start_time FROM dimtime)",
        hour = part(DatePart::Hour),
        day = part(DatePart::Day),
        week = part(DatePart::Week),
        month = part(DatePart::Month),
        year = part(DatePart::Year),
        weekday = part(DatePart::Weekday),
    )
}

/// The five inserts in run order, labelled by target table.
pub fn insert_statements(dialect: Dialect) -> Vec<(&'static str, String)> {
    vec![
        ("factsongplay", songplay_insert(dialect)),
        ("dimuser", user_insert()),
        ("dimsong", song_insert()),
        ("dimartist", artist_insert()),
        ("dimtime", time_insert(dialect)),
    ]
}
