mod charts;
mod client;
mod dashboard;
#[cfg(feature = "gui")]
mod gui;
mod report;
mod stats;
mod web;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::charts::ChartBoard;
use crate::client::{HttpStatsClient, PrinterFilter, StatsQuery, StatsSource};
use crate::dashboard::{ChartSurfaces, DashboardController, Filters};
use crate::stats::ExportEnvelope;
use crate::web::{start_view_server, PrinterOption};

#[derive(Parser)]
#[command(name = "printdash")]
#[command(about = "Analytics dashboard for a 3D print shop backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the analytics dashboard
    Dashboard {
        /// Base URL of the shop backend
        #[arg(short, long, default_value = "http://localhost:5000")]
        backend: String,

        /// Port for the local dashboard view
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Initial lookback window in days
        #[arg(long, default_value = "30")]
        days: u32,

        /// Initial printer filter (a printer id, or "all")
        #[arg(long, default_value = "all")]
        printer: String,

        /// Printer options for the filter dropdown (comma-separated id:name pairs)
        #[arg(long, default_value = "")]
        printers: String,

        /// Path to store log files
        #[arg(short, long, default_value = "logs")]
        log_dir: PathBuf,

        /// Disable the GUI window and use the browser only
        #[arg(long, default_value = "false")]
        no_gui: bool,
    },
    /// Fetch one stats snapshot and write it to a JSON file
    Export {
        /// Base URL of the shop backend
        #[arg(short, long, default_value = "http://localhost:5000")]
        backend: String,

        /// Lookback window in days
        #[arg(long, default_value = "30")]
        days: u32,

        /// Printer filter (a printer id, or "all")
        #[arg(long, default_value = "all")]
        printer: String,

        /// Output file path
        #[arg(short, long, default_value = "stats_export.json")]
        output: PathBuf,
    },
    /// Fetch one stats snapshot and print an analysis report
    Report {
        /// Base URL of the shop backend
        #[arg(short, long, default_value = "http://localhost:5000")]
        backend: String,

        /// Lookback window in days
        #[arg(long, default_value = "30")]
        days: u32,

        /// Printer filter (a printer id, or "all")
        #[arg(long, default_value = "all")]
        printer: String,

        /// Output report file
        #[arg(short, long, default_value = "analytics_report.txt")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Dashboard {
            backend,
            port,
            days,
            printer,
            printers,
            log_dir,
            no_gui,
        } => {
            // Set up logging
            std::fs::create_dir_all(&log_dir)?;
            let file_appender = RollingFileAppender::new(Rotation::HOURLY, &log_dir, "printdash.log");
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
                .with(fmt::layer().with_writer(std::io::stdout))
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();

            info!("Starting Print Shop Analytics dashboard");
            info!("Backend: {}", backend);
            info!("Dashboard view: http://127.0.0.1:{}", port);

            let printer_options = parse_printer_options(&printers);

            let source = Arc::new(HttpStatsClient::new(&backend));
            let filters = Filters::new(days, PrinterFilter::parse(&printer));
            let board = ChartBoard::default();
            let controller = Arc::new(DashboardController::new(
                source,
                filters,
                ChartSurfaces::publishing(&board),
            )?);

            // Start the view server in the background
            let web_controller = Arc::clone(&controller);
            let web_board = board.clone();
            let web_port = port;
            std::thread::spawn(move || {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async move {
                    if let Err(e) =
                        start_view_server(web_controller, web_board, printer_options, web_port).await
                    {
                        tracing::error!("View server error: {}", e);
                    }
                });
            });

            // Give the view server time to start
            std::thread::sleep(std::time::Duration::from_secs(1));

            // Charts exist with empty data; now run the initial fetch cycle.
            Arc::clone(&controller).spawn_cycle();

            #[cfg(feature = "gui")]
            let gui_enabled = !no_gui;
            #[cfg(not(feature = "gui"))]
            let gui_enabled = {
                let _ = no_gui;
                false
            };

            if gui_enabled {
                #[cfg(feature = "gui")]
                {
                    info!("Launching dashboard window...");
                    gui::launch_window(port)?;
                }
            } else {
                info!("Running headless. Open http://127.0.0.1:{} in your browser", port);
                tokio::signal::ctrl_c().await?;
                info!("Shutting down...");
            }

            Ok(())
        }
        Commands::Export {
            backend,
            days,
            printer,
            output,
        } => {
            let client = HttpStatsClient::new(&backend);
            let query = StatsQuery {
                days,
                printer: PrinterFilter::parse(&printer),
            };
            let stats = client.fetch(&query).await?;
            let envelope = ExportEnvelope {
                exported_at: Utc::now(),
                days: query.days,
                printer_id: query.printer.as_param().to_string(),
                stats,
            };
            std::fs::write(&output, serde_json::to_string_pretty(&envelope)?)?;
            println!("Exported stats to {:?}", output);
            Ok(())
        }
        Commands::Report {
            backend,
            days,
            printer,
            output,
        } => {
            let client = HttpStatsClient::new(&backend);
            let query = StatsQuery {
                days,
                printer: PrinterFilter::parse(&printer),
            };
            let stats = client.fetch(&query).await?;
            let report = report::generate_report(&query, &stats);
            std::fs::write(&output, &report)?;
            println!("{}", report);
            println!("\nReport saved to {:?}", output);
            Ok(())
        }
    }
}

/// Parses the `--printers` flag: comma-separated `id:name` pairs; a bare id
/// doubles as its display name.
fn parse_printer_options(value: &str) -> Vec<PrinterOption> {
    value
        .split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let (id, name) = entry.split_once(':').unwrap_or((entry, entry));
            Some(PrinterOption {
                id: id.trim().to_string(),
                name: name.trim().to_string(),
            })
        })
        .collect()
}
