pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS road_segments (
  id BIGINT PRIMARY KEY,
  geometry TEXT NOT NULL,
  road_length DOUBLE NOT NULL
);

CREATE TABLE IF NOT EXISTS speed_readings (
  id BIGINT PRIMARY KEY,
  road_segment_id BIGINT NOT NULL,
  speed DOUBLE NOT NULL,
  created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS traffic_classifications (
  id BIGINT PRIMARY KEY,
  name TEXT NOT NULL UNIQUE,
  min_speed DOUBLE,
  max_speed DOUBLE
);

CREATE TABLE IF NOT EXISTS cars (
  id BIGINT PRIMARY KEY,
  license_plate TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS sensors (
  id BIGINT PRIMARY KEY,
  name TEXT NOT NULL,
  uuid TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS traffic_records (
  id BIGINT PRIMARY KEY,
  sensor_id BIGINT NOT NULL,
  car_id BIGINT NOT NULL,
  road_segment_id BIGINT NOT NULL,
  timestamp TIMESTAMP NOT NULL
);

CREATE SEQUENCE IF NOT EXISTS road_segment_id_seq;
CREATE SEQUENCE IF NOT EXISTS speed_reading_id_seq;
CREATE SEQUENCE IF NOT EXISTS classification_id_seq;
CREATE SEQUENCE IF NOT EXISTS car_id_seq;
CREATE SEQUENCE IF NOT EXISTS sensor_id_seq;
CREATE SEQUENCE IF NOT EXISTS traffic_record_id_seq;

CREATE INDEX IF NOT EXISTS idx_segments_geometry ON road_segments(geometry);
CREATE INDEX IF NOT EXISTS idx_readings_segment_created ON speed_readings(road_segment_id, created_at);
CREATE INDEX IF NOT EXISTS idx_records_car ON traffic_records(car_id);
CREATE INDEX IF NOT EXISTS idx_records_segment ON traffic_records(road_segment_id);
"#;
