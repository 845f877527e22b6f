pub const CREATE_LAST_POSITIONS: &str = r#"
CREATE TABLE IF NOT EXISTS last_positions (
    imei TEXT PRIMARY KEY,
    last_seen TIMESTAMP NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    speed_kmh DOUBLE PRECISION NOT NULL,
    bearing_deg DOUBLE PRECISION NOT NULL
);
"#;

pub const CREATE_POSITION_HISTORY: &str = r#"
CREATE TABLE IF NOT EXISTS position_history (
    id BIGSERIAL PRIMARY KEY,
    imei TEXT NOT NULL,
    created TIMESTAMP NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    speed_kmh DOUBLE PRECISION NOT NULL,
    bearing_deg DOUBLE PRECISION NOT NULL
);
"#;

pub const CREATE_POSITION_HISTORY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS position_history_imei_created_idx
ON position_history (imei, created);
"#;

pub const SELECT_LAST_POSITION: &str = r#"
SELECT imei, last_seen, latitude, longitude, speed_kmh, bearing_deg
FROM last_positions WHERE imei = $1;
"#;

pub const UPSERT_LAST_POSITION: &str = r#"
INSERT INTO last_positions (imei, last_seen, latitude, longitude, speed_kmh, bearing_deg)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (imei) DO UPDATE
SET last_seen = $2,
    latitude = $3,
    longitude = $4,
    speed_kmh = $5,
    bearing_deg = $6;
"#;

pub const INSERT_POSITION_HISTORY: &str = r#"
INSERT INTO position_history (imei, created, latitude, longitude, speed_kmh, bearing_deg)
VALUES ($1, $2, $3, $4, $5, $6);
"#;

pub const SELECT_POSITION_HISTORY: &str = r#"
SELECT imei, created, latitude, longitude, speed_kmh, bearing_deg
FROM position_history WHERE imei = $1
ORDER BY created ASC, id ASC;
"#;

pub const SELECT_POSITION_HISTORY_RANGE: &str = r#"
SELECT imei, created, latitude, longitude, speed_kmh, bearing_deg
FROM position_history WHERE imei = $1 AND created >= $2 AND created < $3
ORDER BY created ASC, id ASC;
"#;
