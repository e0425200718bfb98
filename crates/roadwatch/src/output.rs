use owo_colors::OwoColorize;
use roadwatch_store::StoreStatus;

use crate::import::{RoadImportSummary, SensorImportSummary};

pub fn print_status_human(status: &StoreStatus) {
    println!("{}", "roadwatch status".bold());
    println!("  db: {}", status.db_path.cyan());
    println!("  size: {} bytes", status.db_size_bytes);
    println!("  road segments: {}", status.road_segments_count.green());
    println!("  speed readings: {}", status.speed_readings_count.green());
    println!("  traffic records: {}", status.traffic_records_count.green());
    println!("  cars: {}", status.cars_count);
    println!("  sensors: {}", status.sensors_count);
    println!("  classifications: {}", status.classifications_count);
}

pub fn print_road_import_summary(summary: &RoadImportSummary) {
    println!(
        "imported {} readings across {} segments ({} rows skipped)",
        summary.readings.green(),
        summary.segments.green(),
        summary.skipped.yellow(),
    );
}

pub fn print_sensor_import_summary(summary: &SensorImportSummary) {
    println!(
        "loaded {} sensors ({} rows skipped)",
        summary.loaded.green(),
        summary.skipped.yellow(),
    );
}
