//! SIGESDA CLI: room reservations against the SIGESDA backend.
//!
//! Set SIGESDA_API_URL and SIGESDA_API_TOKEN (a `.env` file is honoured).
//! Commands that act on reservations need `--user` and `--role`.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sigesda_api_client::ApiClient;
use sigesda_cli::{actor_from_flags, init_tracing, parse_timestamp};
use sigesda_core::models::{
    CreateReservationRequest, ReservationCandidate, ReservationEdit, ReservationStatus,
    ReservationWindow, Role,
};
use sigesda_core::{next_allowed_actions, Config};
use sigesda_services::ReservationService;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "sigesda", about = "SIGESDA room reservations CLI")]
struct Cli {
    /// Acting user id
    #[arg(long, global = true)]
    user: Option<Uuid>,
    /// Acting user role (administrator, secretary, teacher, student)
    #[arg(long, global = true)]
    role: Option<Role>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List rooms available for reservation
    Rooms,
    /// Open a room for new reservations
    OpenRoom { id: Uuid },
    /// Close a room for new reservations
    CloseRoom { id: Uuid },
    /// List a room's reservations, optionally within a date range
    Reservations {
        #[arg(long)]
        room: Uuid,
        #[arg(long, value_parser = parse_timestamp, requires = "to")]
        from: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_timestamp, requires = "from")]
        to: Option<DateTime<Utc>>,
    },
    /// Show reservations that would conflict with a slot
    Check {
        #[arg(long)]
        room: Uuid,
        #[arg(long, value_parser = parse_timestamp)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_timestamp)]
        end: DateTime<Utc>,
        /// Reservation being edited, ignored in the check
        #[arg(long)]
        exclude: Option<Uuid>,
    },
    /// Workflow actions available from a status
    Actions { status: ReservationStatus },
    /// Actions the acting user may run on a reservation
    Allowed { id: Uuid },
    /// Request a reservation
    Create {
        #[arg(long)]
        room: Uuid,
        #[arg(long, value_parser = parse_timestamp)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_timestamp)]
        end: DateTime<Utc>,
        /// Requester, defaults to the acting user
        #[arg(long)]
        requester: Option<Uuid>,
        #[arg(long)]
        activity: Option<Uuid>,
        #[arg(long)]
        observations: Option<String>,
    },
    /// Edit a pending reservation
    Edit {
        id: Uuid,
        #[arg(long)]
        room: Option<Uuid>,
        #[arg(long, value_parser = parse_timestamp)]
        start: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_timestamp)]
        end: Option<DateTime<Utc>>,
        #[arg(long)]
        observations: Option<String>,
    },
    /// Approve a pending reservation
    Approve { id: Uuid },
    /// Reject a pending reservation
    Reject {
        id: Uuid,
        #[arg(long)]
        reason: String,
    },
    /// Cancel a confirmed reservation or withdraw a pending one
    Cancel {
        id: Uuid,
        #[arg(long)]
        reason: Option<String>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("Invalid configuration")?;
    let client = ApiClient::from_config(&config)
        .context("Failed to create API client. Set SIGESDA_API_URL and SIGESDA_API_TOKEN")?;
    let service = ReservationService::new(Arc::new(client), &config.reservation);

    tracing::debug!(api_url = %config.api_url, "SIGESDA CLI starting");

    match cli.command {
        Commands::Actions { status } => {
            print_json(&next_allowed_actions(status))?;
        }
        Commands::Rooms => {
            print_json(&service.active_rooms().await?)?;
        }
        Commands::OpenRoom { id } => {
            let actor = actor_from_flags(cli.user, cli.role)?;
            print_json(&service.set_room_availability(id, true, &actor).await?)?;
        }
        Commands::CloseRoom { id } => {
            let actor = actor_from_flags(cli.user, cli.role)?;
            print_json(&service.set_room_availability(id, false, &actor).await?)?;
        }
        Commands::Reservations { room, from, to } => {
            let window = from.zip(to).map(|(from, to)| ReservationWindow { from, to });
            print_json(&service.room_schedule(room, window).await?)?;
        }
        Commands::Check {
            room,
            start,
            end,
            exclude,
        } => {
            let candidate = ReservationCandidate::new(room, start, end);
            let conflicts = service.check_availability(&candidate, exclude).await?;
            print_json(&serde_json::json!({
                "available": conflicts.is_empty(),
                "conflicts": conflicts,
            }))?;
        }
        Commands::Allowed { id } => {
            let actor = actor_from_flags(cli.user, cli.role)?;
            print_json(&service.allowed_actions(id, &actor).await?)?;
        }
        Commands::Create {
            room,
            start,
            end,
            requester,
            activity,
            observations,
        } => {
            let actor = actor_from_flags(cli.user, cli.role)?;
            let request = CreateReservationRequest {
                room_id: room,
                requester_id: requester.unwrap_or(actor.user_id),
                activity_id: activity,
                start_time: start,
                end_time: end,
                observations,
            };
            print_json(&service.create(request, &actor).await?)?;
        }
        Commands::Edit {
            id,
            room,
            start,
            end,
            observations,
        } => {
            let actor = actor_from_flags(cli.user, cli.role)?;
            let edit = ReservationEdit {
                room_id: room,
                start_time: start,
                end_time: end,
                activity_id: None,
                observations,
            };
            if edit.is_empty() {
                anyhow::bail!("Nothing to edit: pass --room, --start, --end or --observations");
            }
            print_json(&service.edit(id, edit, &actor).await?)?;
        }
        Commands::Approve { id } => {
            let actor = actor_from_flags(cli.user, cli.role)?;
            print_json(&service.approve(id, &actor).await?)?;
        }
        Commands::Reject { id, reason } => {
            let actor = actor_from_flags(cli.user, cli.role)?;
            print_json(&service.reject(id, &actor, &reason).await?)?;
        }
        Commands::Cancel { id, reason } => {
            let actor = actor_from_flags(cli.user, cli.role)?;
            print_json(&service.cancel(id, &actor, reason.as_deref()).await?)?;
        }
    }

    Ok(())
}
