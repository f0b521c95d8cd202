//! Fuel Desk
//!
//! Budget plan estimator and lead intake backend for a heating oil
//! delivery company.

mod auth;
mod db;
mod estimator;
mod intake;
mod locations;
mod middleware;
mod models;
mod routes;
mod webhook;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use auth::{AdminCredentials, SessionSigner};
use models::{ApplicationStatus, HomeProfile, HouseType, OrderStatus};
use webhook::WebhookVerifier;

pub struct AppState {
    pub db: Mutex<Connection>,
    pub admin: AdminCredentials,
    pub sessions: SessionSigner,
    /// `None` when no webhook secret is configured
    pub webhook: Option<WebhookVerifier>,
}

#[derive(Parser)]
#[command(name = "fuel-desk")]
#[command(about = "Budget estimator and lead intake backend for heating oil delivery")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "FUEL_DESK_DATABASE", default_value = "fuel_desk.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ServeConfig {
    /// Address to listen on
    #[arg(long, env = "FUEL_DESK_BIND", default_value = "0.0.0.0:8080")]
    bind: String,

    /// Staff password for the admin API
    #[arg(long, env = "FUEL_DESK_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: String,

    /// Key for signing admin sessions (random per process if unset)
    #[arg(long, env = "FUEL_DESK_SESSION_SECRET", hide_env_values = true)]
    session_secret: Option<String>,

    /// How long an admin session lasts
    #[arg(long, env = "FUEL_DESK_SESSION_HOURS", default_value = "12")]
    session_hours: i64,

    /// Shared secret for the form completion webhook (disabled if unset)
    #[arg(long, env = "FUEL_DESK_WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,
}

#[derive(Args)]
struct ProfileArgs {
    /// House layout
    #[arg(long, value_enum, default_value = "single")]
    house: HouseType,

    /// House has a basement
    #[arg(long)]
    basement: bool,

    /// Number of heat pumps (3 or more count the same)
    #[arg(long, default_value = "0")]
    heat_pumps: u32,

    /// Hot water is heated with oil
    #[arg(long)]
    oil_hot_water: bool,

    /// People living in the house
    #[arg(long, default_value = "1", allow_negative_numbers = true)]
    occupants: i32,

    /// Thermostat setpoint in °C
    #[arg(long, default_value = "18", allow_negative_numbers = true)]
    thermostat: f64,
}

impl From<ProfileArgs> for HomeProfile {
    fn from(args: ProfileArgs) -> Self {
        HomeProfile {
            house_type: args.house,
            has_basement: args.basement,
            heat_pumps: args.heat_pumps,
            has_oil_hot_water: args.oil_hot_water,
            occupants: args.occupants,
            thermostat_c: args.thermostat,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Run the HTTP API
    Serve(ServeConfig),

    /// Estimate annual usage and the monthly budget payment for a home
    Estimate {
        #[command(flatten)]
        profile: ProfileArgs,

        /// Price per liter
        #[arg(short, long, allow_negative_numbers = true)]
        price: Decimal,
    },

    /// Budget payment for a known annual usage
    Cost {
        /// Annual usage in liters
        #[arg(allow_negative_numbers = true)]
        liters: Decimal,

        /// Price per liter
        #[arg(short, long, allow_negative_numbers = true)]
        price: Decimal,
    },

    /// List captured leads
    Leads,

    /// List delivery orders
    Orders {
        #[arg(long, value_enum)]
        status: Option<OrderStatus>,
    },

    /// List credit applications
    Applications {
        #[arg(long, value_enum)]
        status: Option<ApplicationStatus>,
    },

    /// Change a delivery order's status
    SetOrderStatus {
        id: i64,
        #[arg(value_enum)]
        status: OrderStatus,
    },

    /// Approve or decline a credit application
    SetApplicationStatus {
        id: i64,
        #[arg(value_enum)]
        status: ApplicationStatus,
    },

    /// List service-area towns
    Locations,

    /// Load sample submissions for testing
    LoadSample,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fuel_desk=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    db::init_schema(&conn)?;
    Ok(conn)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let open = || open_database(&cli.database);

    match cli.command {
        Commands::Init => {
            open()?;
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::Serve(config) => {
            let conn = open()?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve(conn, config))?;
        }

        Commands::Estimate { profile, price } => {
            let profile = HomeProfile::from(profile);
            let estimate = estimator::estimate(&profile, price)?;
            if let Some(usage) = &estimate.breakdown {
                println!("Heating:   {:>8.1} L", usage.heating_liters);
                println!("Hot water: {:>8.1} L", usage.hot_water_liters);
            }
            println!("Estimated usage: {} L/year", estimate.estimated_annual_liters);
            println!("Yearly total:    ${}", estimate.yearly_total);
            println!("Monthly payment: ${} (10 months)", estimate.monthly_payment);
        }

        Commands::Cost { liters, price } => {
            let cost = estimator::compute_cost(liters, price)?;
            println!("Yearly total:    ${}", cost.yearly_total);
            println!("Monthly payment: ${} (10 months)", cost.monthly_payment);
        }

        Commands::Leads => {
            let leads = db::list_leads(&open()?)?;
            if leads.is_empty() {
                println!("No leads yet.");
            } else {
                println!("{:>5} {:<24} {:<28} {:<14} {:<16}", "ID", "Name", "Email", "Phone", "Page");
                println!("{}", "-".repeat(91));
                for l in leads {
                    println!(
                        "{:>5} {:<24} {:<28} {:<14} {:<16}",
                        l.id,
                        l.name,
                        l.email.as_deref().unwrap_or("-"),
                        l.phone.as_deref().unwrap_or("-"),
                        l.source_page.as_deref().unwrap_or("-"),
                    );
                }
            }
        }

        Commands::Orders { status } => {
            let orders = db::list_orders(&open()?, status)?;
            if orders.is_empty() {
                println!("No orders.");
            } else {
                println!("{:>5} {:<24} {:<16} {:>10} {:<10}", "ID", "Name", "Town", "Liters", "Status");
                println!("{}", "-".repeat(69));
                for o in orders {
                    let liters = match o.liters {
                        Some(l) => l.to_string(),
                        None => "fill".to_string(),
                    };
                    println!("{:>5} {:<24} {:<16} {:>10} {:<10}", o.id, o.name, o.town, liters, o.status);
                }
            }
        }

        Commands::Applications { status } => {
            let apps = db::list_applications(&open()?, status)?;
            if apps.is_empty() {
                println!("No credit applications.");
            } else {
                println!("{:>5} {:<24} {:<28} {:<10}", "ID", "Name", "Email", "Status");
                println!("{}", "-".repeat(70));
                for a in apps {
                    println!("{:>5} {:<24} {:<28} {:<10}", a.id, a.name, a.email, a.status);
                }
            }
        }

        Commands::SetOrderStatus { id, status } => match db::update_order_status(&open()?, id, status)? {
            Some(order) => println!("Order {} is now {}", order.id, order.status),
            None => bail!("Order {} not found", id),
        },

        Commands::SetApplicationStatus { id, status } => {
            match db::update_application_status(&open()?, id, status)? {
                Some(app) => println!("Application {} is now {}", app.id, app.status),
                None => bail!("Credit application {} not found", id),
            }
        }

        Commands::Locations => {
            for l in locations::all() {
                println!("{:<16} {:<16} {}", l.slug, l.name, l.delivery_days.join(", "));
            }
        }

        Commands::LoadSample => {
            load_sample_data(&open()?)?;
            println!("Sample data loaded successfully!");
        }
    }

    Ok(())
}

async fn serve(conn: Connection, config: ServeConfig) -> Result<()> {
    let admin = AdminCredentials::new(&config.admin_password).context("Invalid admin password")?;
    let ttl = chrono::Duration::hours(config.session_hours);
    let sessions = match &config.session_secret {
        Some(secret) => SessionSigner::new(secret.as_bytes(), ttl),
        None => {
            info!("no session secret configured, admin sessions end on restart");
            SessionSigner::random(ttl)
        }
    };
    let webhook = config
        .webhook_secret
        .as_ref()
        .map(|secret| WebhookVerifier::new(secret.as_bytes()));
    if webhook.is_none() {
        info!("no webhook secret configured, form webhook disabled");
    }

    let state = Arc::new(AppState {
        db: Mutex::new(conn),
        admin,
        sessions,
        webhook,
    });

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    info!(bind = %config.bind, "fuel-desk listening");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Load a handful of submissions for trying out the admin API
fn load_sample_data(conn: &Connection) -> Result<()> {
    use crate::intake::{NewCreditApplication, NewLead, NewOrder};

    db::clear_submissions(conn)?;

    let leads = [
        ("Mary MacNeil", Some("mary@example.com"), None, "glace-bay", "budget-plan"),
        ("Ron Ferguson", None, Some("902-555-0113"), "sydney", "delivery"),
        ("Cathy Burke", Some("cathy@example.com"), Some("902-555-0177"), "donkin", "furnace-service"),
    ];
    for (name, email, phone, page, interest) in leads {
        let lead = NewLead {
            name: name.to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            message: None,
            source_page: Some(page.to_string()),
            interest: Some(interest.to_string()),
        }
        .validate()?;
        db::insert_lead(conn, &lead)?;
    }

    let fill = NewOrder {
        name: "John Boutilier".to_string(),
        phone: "902-555-0199".to_string(),
        address: "12 Commercial St".to_string(),
        town: "Dominion".to_string(),
        fill_tank: true,
        ..Default::default()
    }
    .validate()?;
    db::insert_order(conn, &fill)?;

    let partial = NewOrder {
        name: "Linda Morrison".to_string(),
        phone: "902-555-0150".to_string(),
        email: Some("linda@example.com".to_string()),
        address: "88 Plummer Ave".to_string(),
        town: "New Waterford".to_string(),
        liters: Some(Decimal::from(500)),
        notes: Some("Tank is behind the garage".to_string()),
        ..Default::default()
    }
    .validate()?;
    let partial = db::insert_order(conn, &partial)?;
    db::update_order_status(conn, partial.id, OrderStatus::Confirmed)?;

    let application = NewCreditApplication {
        name: "Anne Gillis".to_string(),
        phone: "902-555-0142".to_string(),
        email: "anne@example.com".to_string(),
        address: "4 Main St, Donkin".to_string(),
        years_at_address: Some(6),
        employer: Some("Cape Breton Regional Hospital".to_string()),
        notes: None,
    }
    .validate()?;
    db::insert_application(conn, &application)?;

    println!("Loaded {} leads, 2 orders and 1 credit application", leads.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_database_creates_schema() {
        let conn = open_database(Path::new(":memory:")).unwrap();
        assert!(db::list_leads(&conn).unwrap().is_empty());
    }

    #[test]
    fn estimate_args_build_a_profile() {
        let args = "fuel-desk estimate --house two-story --heat-pumps 1 --thermostat 20 --price 1.50";
        let cli = Cli::try_parse_from(args.split_whitespace()).unwrap();
        let Commands::Estimate { profile, price } = cli.command else {
            panic!("expected estimate");
        };
        let result = estimator::estimate(&HomeProfile::from(profile), price).unwrap();
        assert_eq!(result.monthly_payment, Decimal::from(200));
    }

    #[test]
    fn serve_needs_an_admin_password() {
        let cli = Cli::try_parse_from(["fuel-desk", "serve", "--admin-password", ""]).unwrap();
        let Commands::Serve(config) = cli.command else {
            panic!("expected serve");
        };
        assert!(AdminCredentials::new(&config.admin_password).is_err());
    }
}
