//! Script to reset the leads table with random sample data.
//!
//! Usage: `seed_leads [--count N]` (default 100).

use chrono::{Duration, Utc};
use dotenvy::dotenv;
use rand::seq::SliceRandom;
use rand::Rng;
use std::env;

use lead_manager::db::Database;
use lead_manager::db_storage::PgLeadStore;
use lead_manager::models::{LeadSource, LeadStatus, NewLead};
use lead_manager::store::LeadStore;

const DEFAULT_COUNT: usize = 100;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Daniel", "Elena", "Felipe", "Grace", "Hugo", "Irene", "Jonas",
    "Karen", "Lucas", "Marta", "Nico", "Olivia", "Pedro",
];
const LAST_NAMES: &[&str] = &[
    "Almeida", "Brown", "Costa", "Diaz", "Evans", "Ferreira", "Garcia", "Hill", "Ito", "Johnson",
    "Klein", "Lopez", "Martins", "Nguyen",
];
const COMPANIES: &[&str] = &[
    "Acme Corp", "Globex", "Initech", "Umbrella", "Stark Industries", "Wayne Enterprises",
    "Hooli", "Vandelay Industries",
];
const LOCATIONS: &[(&str, &str)] = &[
    ("New York", "NY"),
    ("San Francisco", "CA"),
    ("Austin", "TX"),
    ("Chicago", "IL"),
    ("Seattle", "WA"),
    ("Miami", "FL"),
    ("Denver", "CO"),
    ("Boston", "MA"),
];
const EMAIL_DOMAINS: &[&str] = &["example.com", "test.com", "mail.com", "company.io"];

fn parse_count(args: &[String]) -> anyhow::Result<usize> {
    match args.iter().position(|arg| arg == "--count") {
        Some(index) => args
            .get(index + 1)
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| anyhow::anyhow!("--count expects a non-negative number")),
        None => Ok(DEFAULT_COUNT),
    }
}

fn random_lead(rng: &mut impl Rng, index: usize) -> NewLead {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Lead");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Sample");
    let domain = EMAIL_DOMAINS.choose(rng).copied().unwrap_or("example.com");
    let (city, state) = LOCATIONS.choose(rng).copied().unwrap_or(("Austin", "TX"));

    let email = format!(
        "{}.{}{}@{}",
        first.to_lowercase(),
        last.to_lowercase(),
        index,
        domain
    );

    let mut lead = NewLead::new(first, last, email);
    lead.phone = format!(
        "+1{}{:07}",
        rng.gen_range(200..1000),
        rng.gen_range(0..10_000_000)
    );
    lead.company = COMPANIES.choose(rng).copied().unwrap_or_default().to_string();
    lead.city = city.to_string();
    lead.state = state.to_string();
    lead.source = LeadSource::ALL.choose(rng).copied().unwrap_or_default();
    lead.status = LeadStatus::ALL.choose(rng).copied().unwrap_or_default();
    lead.score = rng.gen_range(0..=100);
    lead.lead_value = (rng.gen_range(100.0..10_000.0_f64) * 100.0).round() / 100.0;
    lead.last_activity_at =
        Some(Utc::now() - Duration::minutes(rng.gen_range(0..30 * 24 * 60)));
    lead.is_qualified = rng.gen_bool(0.5);
    lead
}

/// Main entry point for the seed script.
///
/// Deletes every lead, then inserts `--count` random ones.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let count = parse_count(&args)?;

    let database_url = env::var("DATABASE_URL")
        .or_else(|_| env::var("DB_URL"))
        .map_err(|_| anyhow::anyhow!("DATABASE_URL or DB_URL environment variable required"))?;
    let db = Database::new(&database_url).await?;
    let store = PgLeadStore::new(db.pool.clone());

    tracing::info!("Connected to database. Seeding {} leads...", count);

    let removed = store.delete_all().await?;
    tracing::info!("Removed {} existing leads", removed);

    let mut rng = rand::thread_rng();
    for index in 0..count {
        let lead = random_lead(&mut rng, index);
        store.insert(lead).await?;
    }

    tracing::info!("Seed complete. Inserted {} leads.", count);

    Ok(())
}
