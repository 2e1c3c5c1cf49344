//! CLI command handling

use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::api::{ApiClient, ReservationQuery};
use crate::config::{Config, Overrides};
use crate::services::{
    build_entries, change_status, submit_booking, Aggregator, BookingDraft, BookingRequest,
    DashboardService, LedgerOptions, NewReservation, SnapshotCacheService,
};
use crate::tui::widgets::tabs::Tab;
use crate::tui::TuiConfig;
use crate::types::{
    connection_board, AvailabilityQuote, ChannelConnection, Dashboard, ReportWindow, Reservation,
    ReservationStatus, RevenueSummary,
};

/// Revenue dashboard for hotel channel-management backends
#[derive(Parser)]
#[command(name = "innpulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// Backend base URL, e.g. https://pms.example.com/api
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token for the backend
    #[arg(long, global = true)]
    token: Option<String>,

    /// Restrict queries to one hotel
    #[arg(long, global = true)]
    hotel_id: Option<String>,

    /// Config file (default: ~/.innpulse/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch interactive TUI (default)
    Tui,

    /// Show today's dashboard (TUI overview tab, or JSON with --json)
    Dashboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the 30-day channel mix (TUI channels tab, or JSON with --json)
    Channels {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Prorated revenue, ADR and RevPAR over an inclusive date range
    Revenue {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check availability and price a prospective booking
    Quote(QuoteArgs),

    /// Change a reservation's status (confirmed, pending, cancelled)
    Status {
        /// Reservation id
        id: String,
        #[arg(value_parser = parse_status)]
        status: ReservationStatus,
    },

    /// Show OTA channel connections and their last sync
    Connections {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Trigger a sync for one OTA channel
    Sync {
        /// Channel name, e.g. airbnb
        channel: String,
    },

    /// Derive finance ledger entries from reservation payments
    Ledger {
        #[arg(long)]
        from: NaiveDate,
        /// Last day, inclusive
        #[arg(long)]
        to: NaiveDate,
        /// Skip recorded payments and refunds
        #[arg(long)]
        no_payments: bool,
        /// Skip planned check-in balances
        #[arg(long)]
        no_balances: bool,
        /// Upsert the entries into the backend instead of printing them
        #[arg(long)]
        push: bool,
    },

    /// Delete the saved offline snapshot for the current hotel and server
    ClearCache,
}

#[derive(Args, Debug)]
struct QuoteArgs {
    /// Room type id or code
    #[arg(long)]
    room_type: String,
    #[arg(long)]
    check_in: NaiveDate,
    #[arg(long)]
    check_out: NaiveDate,
    #[arg(long, default_value_t = 1)]
    rooms: u32,
    /// Total price; defaults to the suggested price
    #[arg(long)]
    total: Option<f64>,
    #[arg(long, default_value_t = 0.0)]
    deposit: f64,
    /// Create the reservation after pricing it
    #[arg(long, requires = "guest")]
    create: bool,
    /// Guest name for --create
    #[arg(long)]
    guest: Option<String>,
    #[arg(long, default_value = "direct")]
    channel: String,
    #[arg(long, default_value_t = crate::services::booking::DEFAULT_ADULTS)]
    adults: u32,
    #[arg(long, default_value_t = 0)]
    children: u32,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl QuoteArgs {
    fn request(&self) -> BookingRequest {
        BookingRequest {
            check_in: self.check_in,
            check_out: self.check_out,
            rooms: self.rooms,
            total_price: self.total,
            deposit: self.deposit,
        }
    }
}

fn parse_status(label: &str) -> Result<ReservationStatus, String> {
    ReservationStatus::parse(label)
        .ok_or_else(|| format!("unknown status {:?} (confirmed, pending, cancelled)", label))
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.global.verbose
    }

    /// Whether this invocation opens the TUI
    pub fn is_interactive(&self) -> bool {
        match &self.command {
            None | Some(Commands::Tui) => true,
            Some(Commands::Dashboard { json }) | Some(Commands::Channels { json }) => !json,
            _ => false,
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        let config = Config::load(Overrides {
            api_url: self.global.api_url,
            token: self.global.token,
            hotel_id: self.global.hotel_id,
            config_path: self.global.config,
        })?;

        match self.command {
            None | Some(Commands::Tui) => crate::tui::run(TuiConfig::new(config, Tab::Overview)),
            Some(Commands::Dashboard { json }) => {
                if json {
                    let dashboard = load_dashboard(&config)?;
                    print_json(&dashboard)
                } else {
                    crate::tui::run(TuiConfig::new(config, Tab::Overview))
                }
            }
            Some(Commands::Channels { json }) => {
                if json {
                    let dashboard = load_dashboard(&config)?;
                    print_json(&dashboard.channels)
                } else {
                    crate::tui::run(TuiConfig::new(config, Tab::Channels))
                }
            }
            Some(Commands::Revenue { from, to, json }) => run_revenue(&config, from, to, json),
            Some(Commands::Quote(args)) => run_quote(&config, args),
            Some(Commands::Status { id, status }) => {
                let client = ApiClient::new(&config)?;
                change_status(&client, &id, status)
                    .with_context(|| format!("updating reservation on {}", client.base_url()))?;
                println!("Reservation {} is now {}.", id.trim(), status.as_str());
                Ok(())
            }
            Some(Commands::Connections { json }) => {
                let client = ApiClient::new(&config)?;
                let board = connection_board(
                    client
                        .channel_connections()
                        .with_context(|| format!("listing channels on {}", client.base_url()))?,
                );
                if json {
                    print_json(&board)
                } else {
                    for conn in &board {
                        println!("{}", format_connection(conn));
                    }
                    Ok(())
                }
            }
            Some(Commands::Sync { channel }) => {
                let client = ApiClient::new(&config)?;
                client
                    .sync_channel(&channel)
                    .with_context(|| format!("syncing {} on {}", channel, client.base_url()))?;
                println!("Sync triggered for {}.", channel.trim().to_lowercase());
                Ok(())
            }
            Some(Commands::Ledger {
                from,
                to,
                no_payments,
                no_balances,
                push,
            }) => run_ledger(
                &config,
                window_from_args(from, to)?,
                LedgerOptions {
                    include_payments: !no_payments,
                    include_planned_balance: !no_balances,
                },
                push,
            ),
            Some(Commands::ClearCache) => {
                let scope = config.scope();
                SnapshotCacheService::new()?.clear(&scope)?;
                println!("Removed saved snapshot for {}.", scope);
                Ok(())
            }
        }
    }
}

/// Load today's dashboard, falling back to the offline snapshot
fn load_dashboard(config: &Config) -> anyhow::Result<Dashboard> {
    let client = ApiClient::new(config)?;
    let cache = SnapshotCacheService::new().ok();
    let today = Local::now().date_naive();

    let dashboard = DashboardService::new(&client)
        .load_or_cached(today, cache.as_ref(), &config.scope(), |stage| {
            info!(?stage, "loading dashboard")
        })
        .with_context(|| format!("loading dashboard from {}", client.base_url()))?;
    Ok(dashboard)
}

fn window_from_args(from: NaiveDate, to: NaiveDate) -> anyhow::Result<ReportWindow> {
    if to < from {
        anyhow::bail!("--to ({}) is before --from ({})", to, from);
    }
    Ok(ReportWindow::inclusive(from, to))
}

fn run_revenue(config: &Config, from: NaiveDate, to: NaiveDate, json: bool) -> anyhow::Result<()> {
    let window = window_from_args(from, to)?;
    let client = ApiClient::new(config)?;

    let total_rooms: u32 = client
        .room_types()
        .with_context(|| format!("loading room types from {}", client.base_url()))?
        .iter()
        .map(|rt| rt.total_rooms)
        .sum();
    let reservations = client
        .fetch_all_reservations(&ReservationQuery::confirmed(window))
        .context("fetching reservations")?;

    let summary = Aggregator::revenue(&reservations, window, total_rooms);
    if json {
        print_json(&summary)
    } else {
        print_revenue(&summary, &config.currency);
        Ok(())
    }
}

fn run_quote(config: &Config, args: QuoteArgs) -> anyhow::Result<()> {
    // Reject bad input before any request goes out
    let request = args.request();
    request.validate()?;

    let client = ApiClient::new(config)?;
    let quote = client
        .availability_quote(&args.room_type, args.check_in, args.check_out, args.rooms)
        .with_context(|| format!("requesting quote from {}", client.base_url()))?;
    let draft = request.price(&quote);
    draft.validate()?;

    let created = match (&args.guest, args.create) {
        (Some(guest), true) => {
            if !quote.available {
                anyhow::bail!(
                    "not enough rooms on {} night(s), reservation not created",
                    quote.short_days(draft.rooms).len()
                );
            }
            let mut reservation =
                NewReservation::from_draft(&draft, guest, &args.room_type, &args.channel);
            reservation.adults = args.adults;
            reservation.children = args.children;
            Some(submit_booking(&client, &reservation)?)
        }
        _ => None,
    };

    if args.json {
        return print_json(&QuoteReport::new(&quote, &draft, created.as_ref()));
    }
    print_quote(&quote, &draft);
    if let Some(created) = &created {
        println!();
        println!(
            "Created reservation {} for {}.",
            created.id, created.guest_name
        );
    }
    Ok(())
}

fn run_ledger(
    config: &Config,
    window: ReportWindow,
    opts: LedgerOptions,
    push: bool,
) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let reservations = client.fetch_all_reservations(&ReservationQuery::confirmed(window))?;
    let entries = build_entries(&reservations, opts);

    if !push {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No ledger entries to push.");
        return Ok(());
    }

    let written = client
        .push_ledger(&entries)
        .with_context(|| format!("pushing ledger to {}", client.base_url()))?;
    println!(
        "Pushed {} entries ({} written) from {} reservations.",
        entries.len(),
        written,
        reservations.len()
    );
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_revenue(summary: &RevenueSummary, currency: &str) {
    let window = summary.window;
    println!("Revenue {} .. {}", window.start, window.last_day());
    println!("  Revenue      {:>14.2} {}", summary.revenue, currency);
    println!("  Room nights  {:>14}", summary.room_nights_sold);
    println!("  ADR          {:>14.2} {}", summary.adr, currency);
    println!("  RevPAR       {:>14.2} {}", summary.revpar, currency);
    println!("  Occupancy    {:>13.1}%", summary.occupancy);
    println!();
    for day in &summary.daily_series {
        println!("  {}  {:>12}", day.date, day.amount);
    }
}

/// One line of `connections`: name, state, last sync in local time
fn format_connection(conn: &ChannelConnection) -> String {
    let state = if conn.active { "connected" } else { "not connected" };
    let last_sync = conn
        .last_sync
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!("{:<10} {:<14} last sync {}", conn.channel, state, last_sync)
}

/// Quote plus the priced draft, as printed by `quote --json`
#[derive(Serialize)]
struct QuoteReport<'a> {
    quote: &'a AvailabilityQuote,
    draft: &'a BookingDraft,
    nights: i64,
    adr: f64,
    balance: f64,
    short_days: Vec<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<&'a Reservation>,
}

impl<'a> QuoteReport<'a> {
    fn new(
        quote: &'a AvailabilityQuote,
        draft: &'a BookingDraft,
        created: Option<&'a Reservation>,
    ) -> Self {
        Self {
            quote,
            draft,
            nights: draft.nights(),
            adr: draft.adr(),
            balance: draft.balance(),
            short_days: quote.short_days(draft.rooms),
            created,
        }
    }
}

fn print_quote(quote: &AvailabilityQuote, draft: &BookingDraft) {
    let status = if quote.available {
        "available"
    } else {
        "NOT available"
    };
    println!(
        "{} .. {}  {} night(s), {} room(s): {}",
        draft.check_in,
        draft.check_out,
        draft.nights(),
        draft.rooms,
        status
    );
    for day in &quote.remaining_per_day {
        let mark = if day.fits(draft.rooms) { ' ' } else { '!' };
        println!(
            "  {} {}  open {:>3} / {:>3}",
            mark,
            day.date,
            day.open(),
            day.allotment
        );
    }
    println!("  Suggested total {:>12.2}", quote.suggested_total_price);
    println!("  Total           {:>12.2}", draft.total_price);
    println!("  ADR             {:>12.2}", draft.adr());
    println!("  Deposit         {:>12.2}", draft.deposit);
    println!("  Balance         {:>12.2}", draft.balance());
}
