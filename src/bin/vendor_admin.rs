//! Operator CLI: seed users, mint tokens and force metric recomputes.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use sea_orm::{ActiveModelTrait, EntityTrait, QuerySelect, Set};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;
use vendor_api::{
    auth::{hash_password, AuthConfig, AuthService, Role},
    commands::{performance::RecomputeVendorMetricsCommand, Command},
    config::AppConfig,
    db::{self, DbPool},
    entities::{user, vendor},
    events::{self, EventSender},
};

#[derive(Parser)]
#[command(name = "vendor-admin", about = "Administrative tasks for vendor-api", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a login for the API
    CreateUser(CreateUserArgs),
    /// Print a signed access token without a stored user
    IssueToken(IssueTokenArgs),
    /// Recompute performance metrics for one vendor or all of them
    Recompute(RecomputeArgs),
}

#[derive(Args)]
struct CreateUserArgs {
    #[arg(long, help = "Login email address")]
    email: String,
    #[arg(long, help = "Display name")]
    name: String,
    #[arg(long, env = "VENDOR_ADMIN_PASSWORD", help = "Initial password")]
    password: String,
    #[arg(long, default_value = "viewer", help = "admin, procurement or viewer")]
    role: String,
}

#[derive(Args)]
struct IssueTokenArgs {
    #[arg(long, help = "Token subject")]
    subject: String,
    #[arg(long, default_value = "admin", help = "admin, procurement or viewer")]
    role: String,
}

#[derive(Args)]
struct RecomputeArgs {
    #[arg(long, value_parser = clap::value_parser!(Uuid), conflicts_with = "all")]
    vendor_id: Option<Uuid>,
    #[arg(long, help = "Recompute every vendor")]
    all: bool,
}

fn parse_role(raw: &str) -> Result<Role> {
    raw.parse::<Role>().map_err(|e| anyhow!(e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = vendor_api::config::load_config().context("failed to load configuration")?;
    vendor_api::config::init_tracing(&cfg.log_level, cfg.log_json);

    match cli.command {
        Commands::CreateUser(args) => create_user(&cfg, args).await,
        Commands::IssueToken(args) => issue_token(&cfg, args).await,
        Commands::Recompute(args) => recompute(&cfg, args).await,
    }
}

async fn connect(cfg: &AppConfig) -> Result<Arc<DbPool>> {
    let pool = db::establish_connection_from_app_config(cfg)
        .await
        .context("failed to connect to the database")?;
    Ok(Arc::new(pool))
}

async fn create_user(cfg: &AppConfig, args: CreateUserArgs) -> Result<()> {
    let role = parse_role(&args.role)?;
    if args.password.len() < 8 {
        return Err(anyhow!("password must be at least 8 characters"));
    }
    let pool = connect(cfg).await?;
    let now = Utc::now();
    let created = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(args.email.trim().to_lowercase()),
        name: Set(args.name),
        password_hash: Set(hash_password(&args.password)?),
        role: Set(role.as_str().to_string()),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(pool.as_ref())
    .await
    .context("failed to insert user")?;
    println!("created {} user {} ({})", created.role, created.email, created.id);
    Ok(())
}

async fn issue_token(cfg: &AppConfig, args: IssueTokenArgs) -> Result<()> {
    let role = parse_role(&args.role)?;
    let pool = connect(cfg).await?;
    let auth = AuthService::new(AuthConfig::from_app_config(cfg), pool);
    let token = auth.issue_token(&args.subject, None, None, role)?;
    println!("{}", token.access_token);
    Ok(())
}

async fn recompute(cfg: &AppConfig, args: RecomputeArgs) -> Result<()> {
    let pool = connect(cfg).await?;
    let vendor_ids: Vec<Uuid> = match (args.vendor_id, args.all) {
        (Some(id), _) => vec![id],
        (None, true) => vendor::Entity::find()
            .select_only()
            .column(vendor::Column::Id)
            .into_tuple()
            .all(pool.as_ref())
            .await?,
        (None, false) => return Err(anyhow!("pass --vendor-id <UUID> or --all")),
    };

    let (tx, rx) = mpsc::channel(cfg.event_channel_capacity);
    let event_loop = tokio::spawn(events::process_events(rx));
    let event_sender = Arc::new(EventSender::new(tx));

    for vendor_id in vendor_ids {
        let outcome = RecomputeVendorMetricsCommand { vendor_id }
            .execute(pool.clone(), event_sender.clone())
            .await?;
        let metrics = outcome.metrics();
        println!(
            "{} v{}: on_time={:.3} quality={:.2} response_s={:.1} fulfilment={:.3}",
            vendor_id,
            outcome.vendor.metrics_version,
            metrics.on_time_delivery_rate,
            metrics.quality_rating_average,
            metrics.average_response_time,
            metrics.fulfilment_rate,
        );
    }

    drop(event_sender);
    event_loop.await?;
    Ok(())
}
