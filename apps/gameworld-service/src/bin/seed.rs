//! # Seed Data Generator
//!
//! Populates the database with a small, hand-made slice of the universe
//! for development.
//!
//! ## Usage
//! ```bash
//! # Seed using defaults + GAMEWORLD_* environment variables
//! cargo run -p gameworld-service --bin seed
//!
//! # Use a config file and seed even if objects already exist
//! cargo run -p gameworld-service --bin seed -- --config gameworld.toml --force
//! ```
//!
//! ## Generated Hierarchy
//! ```text
//! Milky Way (GALAXY)
//! ├── Solar System (STAR_SYSTEM_SINGLE)
//! │   ├── Sol (STAR)
//! │   │   └── Mercury, Venus, Earth, Mars (PLANET)
//! │   │       └── Luna (PLANETOID), Gateway (SPACE_STATION) under Earth
//! │   └── Asteroid Belt (ASTEROID_BELT)
//! └── Alpha Centauri (STAR_SYSTEM_MULTIPLE)
//!     └── Proxima Centauri (STAR)
//!         └── Proxima b (PLANET)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gameworld_core::{CelestialObject, CelestialObjectType, Coordinates, ObjectFilter};
use gameworld_db::{CelestialObjectRepository, Database};
use gameworld_service::{telemetry, ServiceConfig};

#[derive(Parser, Debug)]
#[command(name = "seed", about = "GameWorld seed data generator")]
struct Args {
    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed even when the catalogue already has objects
    #[arg(long)]
    force: bool,
}

/// One object of the seed tree: name, type, parent index, global position
/// and physical properties.
struct SeedObject {
    name: &'static str,
    object_type: CelestialObjectType,
    parent: Option<usize>,
    position: (f64, f64, f64),
    properties: &'static [(&'static str, &'static str)],
}

const fn seed(
    name: &'static str,
    object_type: CelestialObjectType,
    parent: Option<usize>,
    position: (f64, f64, f64),
    properties: &'static [(&'static str, &'static str)],
) -> SeedObject {
    SeedObject {
        name,
        object_type,
        parent,
        position,
        properties,
    }
}

/// Parents always precede their children.
const UNIVERSE: &[SeedObject] = &[
    seed("Milky Way", CelestialObjectType::Galaxy, None, (0.0, 0.0, 0.0), &[]),
    seed("Solar System", CelestialObjectType::StarSystemSingle, Some(0), (8178.0, 0.0, 20.8), &[]),
    seed(
        "Sol",
        CelestialObjectType::Star,
        Some(1),
        (8178.0, 0.0, 20.8),
        &[("mass_solar_masses", "1.0"), ("radius_solar_radii", "1.0"), ("temperature_kelvin", "5772")],
    ),
    seed("Mercury", CelestialObjectType::Planet, Some(2), (8178.0, 0.0, 20.8), &[("mass_solar_masses", "0.000000166")]),
    seed("Venus", CelestialObjectType::Planet, Some(2), (8178.0, 0.0, 20.8), &[("mass_solar_masses", "0.00000245")]),
    seed(
        "Earth",
        CelestialObjectType::Planet,
        Some(2),
        (8178.0, 0.0, 20.8),
        &[("mass_solar_masses", "0.000003003"), ("temperature_kelvin", "288")],
    ),
    seed("Mars", CelestialObjectType::Planet, Some(2), (8178.0, 0.0, 20.8), &[("mass_solar_masses", "0.000000323")]),
    seed("Luna", CelestialObjectType::Planetoid, Some(5), (8178.0, 0.0, 20.8), &[]),
    seed("Gateway", CelestialObjectType::SpaceStation, Some(5), (8178.0, 0.0, 20.8), &[]),
    seed("Asteroid Belt", CelestialObjectType::AsteroidBelt, Some(1), (8178.0, 0.0, 20.8), &[]),
    seed("Alpha Centauri", CelestialObjectType::StarSystemMultiple, Some(0), (8176.7, 0.3, 20.1), &[]),
    seed(
        "Proxima Centauri",
        CelestialObjectType::Star,
        Some(10),
        (8176.7, 0.3, 20.1),
        &[("mass_solar_masses", "0.122"), ("radius_solar_radii", "0.154"), ("temperature_kelvin", "3042")],
    ),
    seed("Proxima b", CelestialObjectType::Planet, Some(11), (8176.7, 0.3, 20.1), &[]),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("GameWorld Seed Data Generator");
    println!("=============================");

    let config = ServiceConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    telemetry::init(&config.logging)?;
    let db = Database::connect(&config.database.to_db_config())
        .await
        .context("Failed to connect to PostgreSQL")?;
    println!("✓ Connected to {}:{}/{}", config.database.host, config.database.port, config.database.name);

    db.run_migrations().await.context("Failed to run migrations")?;
    println!("✓ Migrations applied");

    let repo: Arc<dyn CelestialObjectRepository> = Arc::new(db.objects());

    let existing = repo.count(&ObjectFilter::default()).await?;
    if existing > 0 && !args.force {
        println!("⚠ Catalogue already has {} objects", existing);
        println!("  Skipping seed to avoid duplicates (use --force to seed anyway).");
        db.close();
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut ids: Vec<String> = Vec::with_capacity(UNIVERSE.len());
    for entry in UNIVERSE {
        let (x, y, z) = entry.position;
        let mut object = CelestialObject::new(entry.name, entry.object_type)
            .with_global_coordinates(Coordinates::new(x, y, z));
        if let Some(parent) = entry.parent {
            object = object.with_parent(ids[parent].clone());
        }
        for (key, value) in entry.properties {
            object = object.with_property(*key, *value);
        }
        object.discovered = true;

        let created = repo
            .create(&object)
            .await
            .with_context(|| format!("Failed to insert {}", entry.name))?;
        println!("  + {:<18} {:<14} {}", created.name, created.object_type.as_str(), created.id);
        ids.push(created.id);
    }

    println!();
    println!("✓ Seeded {} objects in {:?}", ids.len(), start.elapsed());

    let tree = repo.get_hierarchy(&ids[0]).await?;
    println!("✓ Hierarchy under {} has {} nodes", UNIVERSE[0].name, tree.len());

    db.close();
    Ok(())
}
