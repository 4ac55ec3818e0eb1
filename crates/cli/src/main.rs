//! Chamber CLI - operator console for the Chamber Monitor daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9631";
const WATCH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "chamber")]
#[command(about = "Chamber Monitor CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "CHAMBER_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List every machine with its status and queue
    Machines,

    /// Queue a job on a machine
    AddJob {
        /// Machine ID
        machine_id: u32,

        /// Work request number
        #[arg(short, long, default_value = "")]
        wr: String,

        /// Job name
        #[arg(short, long, default_value = "")]
        name: String,

        /// Number of crates
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        crates: i64,
    },

    /// Start a run (machine must be idle with queued jobs)
    Start {
        /// Machine ID
        machine_id: u32,
    },

    /// Report downtime on a running machine
    Down {
        /// Machine ID
        machine_id: u32,

        /// What went wrong
        #[arg(short, long, default_value = "")]
        reason: String,
    },

    /// Resume production after downtime
    Resume {
        /// Machine ID
        machine_id: u32,
    },

    /// Complete a queued job and save its report
    Complete {
        /// Machine ID
        machine_id: u32,

        /// Job ID (default: first job in the queue)
        job_id: Option<i64>,
    },

    /// Search completed job reports
    Search {
        /// Field: wr (default), job or machine
        #[arg(short, long, default_value = "job.wrNumber")]
        field: String,

        /// Exact value to match (omit to list every report)
        value: Option<String>,
    },

    /// Follow a machine's elapsed time until it goes idle
    Watch {
        /// Machine ID
        machine_id: u32,
    },

    /// Print a stored report as email text
    Report {
        /// Report ID (from `chamber search`)
        report_id: String,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobView {
    job_id: i64,
    wr_number: String,
    job_name: String,
    crate_count: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MachineView {
    id: u32,
    name: String,
    status: String,
    jobs: Vec<JobView>,
    #[serde(default)]
    elapsed: Option<String>,
    #[serde(default)]
    open_downtime: Option<OpenDowntimeView>,
}

#[derive(Deserialize)]
struct OpenDowntimeView {
    description: String,
}

#[derive(Tabled)]
struct MachineRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Machine")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Jobs")]
    jobs: usize,
    #[tabled(rename = "Elapsed")]
    elapsed: String,
    #[tabled(rename = "Current job")]
    current: String,
}

impl From<&MachineView> for MachineRow {
    fn from(view: &MachineView) -> Self {
        Self {
            id: view.id,
            name: view.name.clone(),
            status: view.status.clone(),
            jobs: view.jobs.len(),
            elapsed: view.elapsed.clone().unwrap_or_else(|| "-".to_string()),
            current: view
                .jobs
                .first()
                .map(|job| format!("{} ({})", job.job_name, job.wr_number))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "Job ID")]
    job_id: i64,
    #[tabled(rename = "WR")]
    wr_number: String,
    #[tabled(rename = "Job")]
    job_name: String,
    #[tabled(rename = "Crates")]
    crate_count: u32,
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Report ID")]
    id: String,
    #[tabled(rename = "Machine")]
    machine: String,
    #[tabled(rename = "WR")]
    wr_number: String,
    #[tabled(rename = "Job")]
    job_name: String,
    #[tabled(rename = "Production")]
    production: String,
    #[tabled(rename = "Downtime")]
    downtime: String,
}

impl ReportRow {
    fn from_value(report: &serde_json::Value) -> Self {
        let text = |value: &serde_json::Value| value.as_str().unwrap_or("N/A").to_string();
        Self {
            id: text(&report["id"]),
            machine: text(&report["machineName"]),
            wr_number: text(&report["job"]["wrNumber"]),
            job_name: text(&report["job"]["jobName"]),
            production: text(&report["totalProductionTime"]),
            downtime: text(&report["totalDowntime"]),
        }
    }
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

async fn get_machine(url: &str, machine_id: u32) -> Result<MachineView> {
    let result = call_rpc(url, "machine.get.v1", json!({ "machine_id": machine_id })).await?;
    serde_json::from_value(result).context("Unexpected machine payload")
}

fn status_colored(status: &str) -> colored::ColoredString {
    match status {
        "Running" => status.green().bold(),
        "Down" => status.red().bold(),
        _ => status.normal(),
    }
}

fn print_machine(view: &MachineView) {
    println!(
        "{} {} [{}]",
        format!("#{}", view.id).bold(),
        view.name.cyan().bold(),
        status_colored(&view.status)
    );
    if let Some(elapsed) = &view.elapsed {
        println!("  {} {}", "Elapsed:".bold(), elapsed);
    }
    if let Some(open) = &view.open_downtime {
        println!("  {} {}", "Down:".bold(), open.description);
    }

    if view.jobs.is_empty() {
        println!("  {}", "No jobs queued".yellow());
    } else {
        let rows: Vec<JobRow> = view
            .jobs
            .iter()
            .map(|job| JobRow {
                job_id: job.job_id,
                wr_number: job.wr_number.clone(),
                job_name: job.job_name.clone(),
                crate_count: job.crate_count,
            })
            .collect();
        println!("{}", Table::new(rows));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let url = cli.rpc_url.as_str();

    match cli.command {
        Commands::Machines => {
            let result = call_rpc(url, "machine.list.v1", json!({})).await?;
            let views: Vec<MachineView> =
                serde_json::from_value(result).context("Unexpected machine list payload")?;
            let rows: Vec<MachineRow> = views.iter().map(MachineRow::from).collect();
            println!("{}", Table::new(rows));
        }

        Commands::AddJob {
            machine_id,
            wr,
            name,
            crates,
        } => {
            let params = json!({
                "machine_id": machine_id,
                "wr_number": wr,
                "job_name": name,
                "crate_count": crates,
            });
            let result = call_rpc(url, "machine.add_job.v1", params).await?;
            let view: MachineView = serde_json::from_value(result)?;

            println!("{}", "✓ Job queued".green().bold());
            print_machine(&view);
        }

        Commands::Start { machine_id } => {
            let result = call_rpc(url, "machine.start.v1", json!({ "machine_id": machine_id }))
                .await?;
            let view: MachineView = serde_json::from_value(result)?;
            if view.status == "Running" {
                println!("{}", format!("✓ {} started", view.name).green().bold());
            } else {
                println!(
                    "{}",
                    format!("○ {} not started (needs idle status and queued jobs)", view.name)
                        .yellow()
                );
            }
            print_machine(&view);
        }

        Commands::Down { machine_id, reason } => {
            let params = json!({ "machine_id": machine_id, "reason": reason });
            let result = call_rpc(url, "machine.report_downtime.v1", params).await?;
            let view: MachineView = serde_json::from_value(result)?;
            print_machine(&view);
        }

        Commands::Resume { machine_id } => {
            let result =
                call_rpc(url, "machine.resume.v1", json!({ "machine_id": machine_id })).await?;
            let view: MachineView = serde_json::from_value(result)?;
            print_machine(&view);
        }

        Commands::Complete { machine_id, job_id } => {
            let job_id = match job_id {
                Some(id) => id,
                None => get_machine(url, machine_id)
                    .await?
                    .jobs
                    .first()
                    .map(|job| job.job_id)
                    .ok_or_else(|| anyhow::anyhow!("Machine {} has no queued jobs", machine_id))?,
            };

            let params = json!({ "machine_id": machine_id, "job_id": job_id });
            let result = call_rpc(url, "machine.complete_job.v1", params).await?;

            if result["report"].is_null() {
                println!("{}", format!("○ Job {} is not queued", job_id).yellow());
            } else {
                let report = &result["report"];
                println!("{}", "✓ Job completed".green().bold());
                println!(
                    "  {} {}",
                    "Production:".bold(),
                    report["totalProductionTime"].as_str().unwrap_or("-")
                );
                println!(
                    "  {} {}",
                    "Downtime:".bold(),
                    report["totalDowntime"].as_str().unwrap_or("-")
                );
                if result["persisted"].as_bool().unwrap_or(false) {
                    println!(
                        "  {} {}",
                        "Saved as:".bold(),
                        result["report_id"].as_str().unwrap_or("-")
                    );
                } else {
                    println!(
                        "  {} Report not saved: {}",
                        "✗".red(),
                        result["persistence_error"].as_str().unwrap_or("unknown error")
                    );
                }
            }

            let view: MachineView = serde_json::from_value(result["machine"].clone())?;
            print_machine(&view);
        }

        Commands::Search { field, value } => {
            let params = json!({ "field": field, "value": value.unwrap_or_default() });
            let result = call_rpc(url, "reports.search.v1", params).await?;

            let reports = result["reports"].as_array().cloned().unwrap_or_default();
            if reports.is_empty() {
                let message = result["message"].as_str().unwrap_or("No results.");
                println!("{}", message.yellow());
            } else {
                let rows: Vec<ReportRow> = reports.iter().map(ReportRow::from_value).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Watch { machine_id } => {
            let mut ticker = tokio::time::interval(WATCH_INTERVAL);
            loop {
                ticker.tick().await;
                let view = get_machine(url, machine_id).await?;
                println!(
                    "{} [{}] {}",
                    view.name.cyan(),
                    status_colored(&view.status),
                    view.elapsed.as_deref().unwrap_or("-")
                );
                if view.status == "Idle" {
                    println!("{}", "Machine is idle".yellow());
                    break;
                }
            }
        }

        Commands::Report { report_id } => {
            let result = call_rpc(url, "reports.search.v1", json!({})).await?;
            let report = result["reports"]
                .as_array()
                .and_then(|reports| reports.iter().find(|r| r["id"] == report_id.as_str()))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Report {} not found", report_id))?;

            let export = call_rpc(url, "reports.export.v1", json!({ "report": report })).await?;
            println!(
                "{} {}",
                "Subject:".bold(),
                export["subject"].as_str().unwrap_or_default()
            );
            println!();
            print!("{}", export["body"].as_str().unwrap_or_default());
            println!();
            println!(
                "{} {}",
                "Email:".bold(),
                export["mailto"].as_str().unwrap_or_default()
            );
        }
    }

    Ok(())
}
