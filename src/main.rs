use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, warn};

use parkade::engine::{AreaKind, Facility, FacilityError, PricingPolicy};
use parkade::model::{HOUR_MS, Ms, Spot, SpotId, SpotKind, VehicleId};

const MINUTE: Ms = 60_000;

#[derive(Deserialize)]
struct SeedLayout {
    zones: Vec<SeedZone>,
}

#[derive(Deserialize)]
struct SeedZone {
    name: String,
    base_price: f64,
    floors: Vec<SeedFloor>,
}

#[derive(Deserialize)]
struct SeedFloor {
    name: String,
    base_price: f64,
    spots: Vec<SeedSpot>,
}

#[derive(Deserialize)]
struct SeedSpot {
    id: String,
    kind: SpotKind,
    rate: f64,
    priority: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("PARKADE_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    parkade::observability::init(metrics_port);

    let data_dir = std::env::var("PARKADE_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let seed_file = std::env::var("PARKADE_SEED").ok();
    let max_sessions: usize = std::env::var("PARKADE_MAX_SESSIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(256);
    let compact_threshold: u64 = std::env::var("PARKADE_COMPACT_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    std::fs::create_dir_all(&data_dir)?;
    let journal_path = PathBuf::from(&data_dir).join("facility.journal");
    let mut facility = Facility::open(&journal_path, PricingPolicy::default(), max_sessions)?;

    info!("parkade facility online");
    info!("  data_dir: {data_dir}");
    info!("  max_sessions: {max_sessions}");
    info!("  compact_threshold: {compact_threshold}");
    info!(
        "  metrics: {}",
        metrics_port.map_or("disabled".to_string(), |p| format!(
            "http://0.0.0.0:{p}/metrics"
        ))
    );

    if facility.status().zones == 0 {
        match &seed_file {
            Some(path) => {
                seed_from_file(&mut facility, path)?;
                info!("seeded layout from {path}");
            }
            None => {
                seed_default(&mut facility)?;
                info!("seeded default two-zone layout");
            }
        }
    } else {
        let status = facility.status();
        info!(
            "replayed existing facility: {} spots, {} active sessions",
            status.spots, status.active_sessions
        );
    }

    run_demo_day(&mut facility);
    print_report(&facility);

    if facility.journal_appends_since_compact() > compact_threshold {
        facility.compact()?;
    }

    Ok(())
}

fn seed_from_file(facility: &mut Facility, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let layout: SeedLayout = serde_json::from_str(&text)?;
    for zone in layout.zones {
        facility.add_zone(zone.name.as_str(), zone.base_price)?;
        for floor in zone.floors {
            facility.add_floor(zone.name.as_str(), floor.name.as_str(), floor.base_price)?;
            for seed in floor.spots {
                let spot = Spot::new(
                    SpotId::new(seed.id),
                    seed.kind,
                    zone.name.as_str(),
                    floor.name.as_str(),
                    seed.rate,
                    seed.priority,
                );
                facility.register_spot(spot)?;
            }
        }
    }
    Ok(())
}

fn seed_default(facility: &mut Facility) -> Result<(), FacilityError> {
    facility.add_zone("North", 10.0)?;
    facility.add_zone("South", 8.0)?;
    facility.add_floor("North", "N1", 10.0)?;
    facility.add_floor("South", "S1", 8.0)?;
    let spots = [
        ("N1-01", SpotKind::Standard, "North", "N1", 10.0, 2),
        ("N1-02", SpotKind::Standard, "North", "N1", 10.0, 2),
        ("N1-03", SpotKind::Handicap, "North", "N1", 10.0, 1),
        ("N1-04", SpotKind::Electric, "North", "N1", 12.0, 3),
        ("S1-01", SpotKind::Standard, "South", "S1", 8.0, 1),
        ("S1-02", SpotKind::Standard, "South", "S1", 8.0, 1),
        ("S1-03", SpotKind::Compact, "South", "S1", 7.0, 1),
        ("S1-04", SpotKind::Electric, "South", "S1", 9.0, 2),
    ];
    for (id, kind, zone, floor, rate, priority) in spots {
        facility.register_spot(Spot::new(SpotId::new(id), kind, zone, floor, rate, priority))?;
    }
    Ok(())
}

/// One scripted business day against fixed timestamps. Rejections are
/// normal on a re-run: vehicles replayed from the journal are still here.
fn run_demo_day(facility: &mut Facility) {
    let arrivals: [(&str, &str, Ms); 4] = [
        ("CAR-101", "N1-01", 8 * HOUR_MS),
        ("CAR-102", "N1-02", 9 * HOUR_MS),
        ("CAR-103", "S1-01", 9 * HOUR_MS),
        ("CAR-104", "S1-02", 10 * HOUR_MS),
    ];
    for (plate, spot, at) in arrivals {
        match facility.park(VehicleId::new(plate), SpotId::new(spot), at) {
            Ok(session) => info!("{plate} parked in {spot} at {:.2}/h", session.quoted_rate),
            Err(e) => warn!("{plate} turned away from {spot}: {e}"),
        }
    }

    // An EV takes whatever charging spot is free.
    match facility.first_available(SpotKind::Electric).map(|s| s.id.clone()) {
        Some(id) => match facility.park(VehicleId::new("EV-301"), id.clone(), 11 * HOUR_MS) {
            Ok(session) => info!("EV-301 parked in {id} at {:.2}/h", session.quoted_rate),
            Err(e) => warn!("EV-301 turned away from {id}: {e}"),
        },
        None => warn!("no electric spot free for EV-301"),
    }

    // Midday departures: one by plate, one by spot.
    match facility.leave(&VehicleId::new("CAR-102"), 12 * HOUR_MS + 25 * MINUTE) {
        Ok(receipt) => info!(
            "CAR-102 left {}: {}h billed, {:.2} due",
            receipt.spot, receipt.billed_hours, receipt.amount
        ),
        Err(e) => warn!("CAR-102 departure failed: {e}"),
    }
    match facility.release_spot(&SpotId::new("S1-01"), 13 * HOUR_MS) {
        Ok(receipt) => info!(
            "{} released S1-01: {}h billed, {:.2} due",
            receipt.vehicle, receipt.billed_hours, receipt.amount
        ),
        Err(e) => warn!("release of S1-01 failed: {e}"),
    }
}

fn print_report(facility: &Facility) {
    let status = facility.status();
    println!("\n=== parkade daily report ===");
    println!(
        "{} zones, {} floors, {} spots; {}/{} sessions in use",
        status.zones, status.floors, status.spots, status.active_sessions, status.max_sessions
    );
    println!("facility occupancy: {:.0}%", facility.occupancy_rate() * 100.0);

    println!("\nlayout:");
    for (depth, node) in facility.walk() {
        let indent = "  ".repeat(depth);
        if node.kind == AreaKind::Spot {
            let marker = if node.occupied > 0 { " (occupied)" } else { "" };
            println!("  {indent}{} {}{marker}", node.kind.label(), node.name);
        } else {
            println!(
                "  {indent}{} {} [{}/{}]",
                node.kind.label(),
                node.name,
                node.occupied,
                node.capacity
            );
        }
    }

    println!("\nzones:");
    let zone_names: Vec<String> = facility
        .walk()
        .filter(|(_, n)| n.kind == AreaKind::Zone)
        .map(|(_, n)| n.name.clone())
        .collect();
    for name in zone_names {
        if let Ok(zo) = facility.zone_occupancy(&name) {
            println!(
                "  {}: {}/{} occupied (rate {:.2}), dynamic price {:.2}/h",
                zo.zone, zo.occupied, zo.capacity, zo.rate, zo.dynamic_price
            );
        }
    }

    println!("\ncheapest available:");
    for spot in facility.rank_by_price().iter().filter(|s| !s.occupied).take(5) {
        let rate = facility.spot_rate(&spot.id).unwrap_or(spot.base_rate);
        println!("  {} ({}/{}) at {rate:.2}/h", spot.id, spot.zone, spot.floor);
    }

    println!("\nby priority:");
    for spot in facility.rank_by_priority().iter().take(5) {
        println!(
            "  {} priority {} ({}/{}){}",
            spot.id,
            spot.priority,
            spot.zone,
            spot.floor,
            if spot.occupied { " (occupied)" } else { "" }
        );
    }

    println!("\nfree first:");
    for spot in facility.rank_by_availability().iter().take(5) {
        println!(
            "  {} ({}/{}){}",
            spot.id,
            spot.zone,
            spot.floor,
            if spot.occupied { " (occupied)" } else { "" }
        );
    }
}
