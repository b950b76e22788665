use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use std::env;
use std::path::PathBuf;

use entity_ledger::entities::ParcelField;
use entity_ledger::{
    catalog, logging, Activity, ActivityRegistry, AuditLog, Book, Car, CelestialRegistry,
    ConsumptionPolicy, Entity, EntityField, FieldValue, IrrigatedParcel, OccupancyAction, Parcel,
    ParcelRegistry, Planet, PlateRegistry, Publication, PublicationRegistry, Race, Settings,
};

const USAGE: &str = "Usage: entity-ledger [all|parcels|books|activities|vehicles|planets] [--config <path>]";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut scenario = String::from("all");
    let mut config_path: Option<PathBuf> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                config_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            other => scenario = other.to_string(),
        }
    }

    let settings = match &config_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    logging::init(&settings.logging)?;

    println!("📒 Entity Ledger v{}", entity_ledger::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match scenario.as_str() {
        "all" => {
            run_parcels(&settings)?;
            run_books()?;
            run_activities()?;
            run_vehicles(&settings)?;
            run_planets()?;
        }
        "parcels" => run_parcels(&settings)?,
        "books" => run_books()?,
        "activities" => run_activities()?,
        "vehicles" => run_vehicles(&settings)?,
        "planets" => run_planets()?,
        other => {
            eprintln!("❌ Unknown scenario: {}", other);
            eprintln!("   {}", USAGE);
            bail!("unknown scenario '{}'", other);
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Done");
    Ok(())
}

fn header(title: &str) {
    println!("\n{}", title);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

fn print_log<F: EntityField>(log: &AuditLog<F>) -> Result<()> {
    let json = log.to_json().context("Failed to export audit log")?;
    println!("\n📜 Audit log ({} events):", log.len());
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

// ============================================================================
// PARCELS + IRRIGATION
// ============================================================================

fn run_parcels(settings: &Settings) -> Result<()> {
    header("🌾 Parcels & irrigation");

    let registry = ParcelRegistry::new();

    println!("\n📋 Parcel fields:");
    for field in catalog::<ParcelField>() {
        println!("   • {:<8} {:?}", field.name, field.definition.access);
    }

    let mut parcel = Parcel::new(&registry, 1, 10.567, "Trigo")?;
    println!("\n✓ Parcel {} registered: {} ha of {}", parcel.id(), parcel.area_ha(), parcel.crop());

    match Parcel::new(&registry, 1, 3.0, "Cebada") {
        Ok(_) => println!("✗ Duplicate parcel accepted"),
        Err(e) => println!("✓ Duplicate parcel rejected: {}", e),
    }

    match parcel.assign("crop", FieldValue::from("Maíz")) {
        Ok(()) => println!("✗ Direct assignment accepted"),
        Err(e) => println!("✓ Direct assignment refused: {}", e),
    }

    parcel.update_crop("Maíz")?;
    println!("✓ Crop updated to {}", parcel.crop());

    parcel.deactivate("Rotación de cultivos");
    if let Err(e) = parcel.update_crop("Soja") {
        println!("✓ Inactive parcel keeps its crop: {}", e);
    }
    parcel.activate("Nueva campaña");
    parcel.rectify_area(12.346, "Medición precisa")?;
    println!("✓ Area rectified to {} ha", parcel.area_ha());
    print_log(&parcel.audit_log())?;

    let mut field = IrrigatedParcel::new(&registry, 2, 15.75, "Olivo", &settings.irrigation)?;
    field.load_water(20_000.0)?;
    println!("\n💧 Parcel {} demands {} L", field.parcel().id(), field.demand_l());

    let strict = field.irrigate(settings.irrigation.default_policy)?;
    println!(
        "✓ Irrigated ({}): applied {} L, balance {} → {} L",
        strict.policy, strict.applied, strict.before, strict.after
    );

    let rejected = field.irrigate(ConsumptionPolicy::Strict)?;
    if rejected.is_rejected() {
        println!("✓ Strict irrigation rejected with {} L left", rejected.after);
    }

    let partial = field.irrigate(ConsumptionPolicy::Partial)?;
    println!(
        "✓ Partial irrigation applied {} of {} L",
        partial.applied, partial.requested
    );

    field.deactivate("Fin de temporada");
    if let Err(e) = field.irrigate(ConsumptionPolicy::Partial) {
        println!("✓ Deactivated parcel cannot irrigate: {}", e);
    }
    println!("✓ Irrigation runs recorded: {}", field.irrigation_runs().len());
    print_log(&field.irrigation().audit_log())?;

    Ok(())
}

// ============================================================================
// PUBLICATIONS + BOOKS
// ============================================================================

fn run_books() -> Result<()> {
    header("📚 Publications & books");

    let registry = PublicationRegistry::new();

    let mut paper = Publication::new(&registry, 1, "On Computable Numbers", 1936)?;
    paper.update_title("On Computable Numbers, with an Application")?;
    println!("✓ Publication {}: {} ({})", paper.id(), paper.title(), paper.year());

    if let Err(e) = Publication::new(&registry, 2, "Incunable", 1400) {
        println!("✓ Too old to be printed: {}", e);
    }

    let mut book = Book::new(&registry, 3, "Cien años de soledad", 1967, 500)?;
    book.read(120)?;
    println!("✓ Read {} pages, {}% done", book.pages_read(), book.progress());

    if let Err(e) = book.read(400) {
        println!("✓ Cannot read past the end: {}", e);
    }
    book.read(book.remaining_pages())?;
    if let Err(e) = book.read(1) {
        println!("✓ Finished book: {}", e);
    }
    println!("✓ Reading sessions: {}", book.reading_sessions().len());
    print_log(&book.audit_log())?;

    Ok(())
}

// ============================================================================
// ACTIVITIES + RACES
// ============================================================================

fn run_activities() -> Result<()> {
    header("🏃 Activities & races");

    let registry = ActivityRegistry::new();

    let mut walk = Activity::new(&registry, "Paseo", 30)?;
    walk.update_duration(45)?;
    println!("✓ Activity {} lasts {} min", walk.name(), walk.duration_min());

    if let Err(e) = Activity::new(&registry, "Siesta", 0) {
        println!("✓ Zero-length activity rejected: {}", e);
    }

    let mut race = Race::new(&registry, "Maratón de Valencia", 240, 42.195)?;
    println!("✓ {}: pace {} min/km", race.name(), race.pace_min_per_km());

    race.record_distance(21.0975)?;
    race.update_duration(110)?;
    println!(
        "✓ Half distance: pace {} min/km over {} checkpoints",
        race.pace_min_per_km(),
        race.checkpoints().len()
    );
    print_log(&race.audit_log())?;

    Ok(())
}

// ============================================================================
// VEHICLES + CARS
// ============================================================================

fn run_vehicles(settings: &Settings) -> Result<()> {
    header("🚗 Vehicles & cars");

    let registry = PlateRegistry::from_settings(&settings.vehicles)?;
    let actor = "fleet-admin";
    let started = Utc::now();

    let mut car = Car::new(&registry, " 1234-abc ", 1350.0, 5, true, actor)?;
    println!("✓ Car {} registered ({} seats)", car.plate(), car.total_seats());

    if let Err(e) = Car::new(&registry, "1234-ABC", 1200.0, 4, false, actor) {
        println!("✓ Plate already in use: {}", e);
    }
    if let Err(e) = Car::new(&registry, "!!", 1200.0, 4, false, actor) {
        println!("✓ Malformed plate: {}", e);
    }

    car.board(3, actor)?;
    if let Err(e) = car.board(3, actor) {
        println!("✓ Over capacity: {}", e);
    }
    car.alight(1, actor)?;
    let occupancy = car.occupancy();
    println!(
        "✓ Occupancy {}/{} ({}%)",
        occupancy.occupants, occupancy.total_seats, occupancy.occupancy_rate
    );

    car.empty("Fin del trayecto", actor);
    car.reconfigure_seats(7, "Tercera fila", actor)?;
    car.disable("Revisión técnica", actor);
    if let Err(e) = car.board(1, actor) {
        println!("✓ Disabled car: {}", e);
    }
    car.enable("Revisión superada", actor);
    car.update_weight(1420.0, actor)?;

    let boardings = car.count_occupancy_events(OccupancyAction::Board, started, Utc::now() + Duration::seconds(1));
    let sheet = car.sheet();
    println!(
        "✓ Sheet: {} kg, {}, {} status changes, {} boardings",
        sheet.weight_kg, sheet.status, sheet.status_changes, boardings
    );
    print_log(&car.audit_log())?;

    Ok(())
}

// ============================================================================
// CELESTIAL BODIES + PLANETS
// ============================================================================

fn run_planets() -> Result<()> {
    header("🪐 Celestial bodies & planets");

    let registry = CelestialRegistry::new();

    let earth = Planet::new(&registry, "Tierra", 5.972e24, 6371.0, 1.496e8)?;
    let mut mars = Planet::new(&registry, "Marte", 6.417e23, 3389.5, 2.279e8)?;

    println!("✓ {} volume: {:.4e} km³", earth.name(), earth.volume_km3());
    println!("✓ {} density: {:.4e} kg/km³", earth.name(), earth.density_kg_km3());
    println!(
        "✓ {} is {} than {}",
        earth.name(),
        earth.compare_distance(&mars),
        mars.name()
    );

    mars.update_radius(3390.0)?;
    let unchanged = mars.update_mass(6.417e23)?;
    println!("✓ Unchanged mass ignored: {}", !unchanged);
    mars.update_mass(6.42e23)?;

    let sheet = mars.sheet();
    println!(
        "✓ {} modified {} times, last mass update {:?}",
        sheet.name, sheet.modifications, sheet.last_mass_update
    );
    print_log(&mars.audit_log())?;

    Ok(())
}
