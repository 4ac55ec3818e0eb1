// Job completion report - generation and text export

use crate::domain::downtime::{total_ms, DowntimeInterval};
use crate::domain::format::{format_duration, format_timestamp};
use crate::domain::job::Job;
use crate::domain::machine::{Machine, MachineStatus};
use chrono::TimeZone;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Store-assigned report identifier
pub type ReportId = String;

const RULE_HEAVY: &str = "====================================";
const RULE_LIGHT: &str = "------------------------------------";

// Characters left bare by a URI component encoder
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// `mailto:` link with no recipient, prefilled with `subject` and `body`
pub fn mailto_link(subject: &str, body: &str) -> String {
    format!(
        "mailto:?subject={}&body={}",
        utf8_percent_encode(subject, URI_COMPONENT),
        utf8_percent_encode(body, URI_COMPONENT)
    )
}

/// Immutable snapshot summarizing one completed job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReport {
    pub machine_name: String,
    pub job: Job,
    pub start_time: Option<i64>,
    pub finish_time: i64,
    pub downtime_logs: Vec<DowntimeInterval>,
    pub total_production_time: String,
    pub total_downtime: String,
    pub total_production_ms: i64,
    pub total_downtime_ms: i64,
}

impl JobReport {
    /// Snapshot `machine` at `finish_time` for the completion of `job`.
    ///
    /// A machine that is still Down contributes its open interval, closed at
    /// `finish_time`, without the machine itself being mutated.
    pub fn generate(machine: &Machine, job: &Job, finish_time: i64) -> Self {
        let downtime_logs = if machine.status() == MachineStatus::Down {
            machine.downtime().effective_intervals(finish_time)
        } else {
            machine.downtime_log().to_vec()
        };

        let total_downtime_ms = total_ms(&downtime_logs);
        let total_duration_ms = machine
            .start_time()
            .map(|start| finish_time - start)
            .unwrap_or(0);
        let total_production_ms = (total_duration_ms - total_downtime_ms).max(0);

        Self {
            machine_name: machine.name().to_string(),
            job: job.clone(),
            start_time: machine.start_time(),
            finish_time,
            downtime_logs,
            total_production_time: format_duration(total_production_ms),
            total_downtime: format_duration(total_downtime_ms),
            total_production_ms,
            total_downtime_ms,
        }
    }

    /// Subject line used when mailing the report
    pub fn email_subject(&self) -> String {
        format!(
            "Job Report: {} (WR: {})",
            self.job.job_name, self.job.wr_number
        )
    }

    /// Plain-text export of the report, timestamps rendered in `tz`
    pub fn render_text<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let mut body = String::new();
        // Writing into a String cannot fail
        let _ = self.write_text(&mut body, tz);
        body
    }

    /// Plain-text export in the host's local time zone
    pub fn render_local_text(&self) -> String {
        self.render_text(&chrono::Local)
    }

    fn write_text<Tz: TimeZone>(&self, out: &mut String, tz: &Tz) -> std::fmt::Result
    where
        Tz::Offset: std::fmt::Display,
    {
        writeln!(out, "JOB COMPLETION REPORT")?;
        writeln!(out, "{RULE_HEAVY}")?;
        writeln!(out)?;

        writeln!(out, "JOB DETAILS")?;
        writeln!(out, "{RULE_LIGHT}")?;
        writeln!(out, "Machine:      {}", self.machine_name)?;
        writeln!(out, "Job Name:     {}", self.job.job_name)?;
        writeln!(out, "WR Number:    {}", self.job.wr_number)?;
        writeln!(out, "Crates:       {}", self.job.crate_count)?;
        writeln!(out)?;

        writeln!(out, "TIMELINE")?;
        writeln!(out, "{RULE_LIGHT}")?;
        writeln!(out, "Job Started:   {}", format_timestamp(self.start_time, tz))?;
        writeln!(
            out,
            "Job Completed: {}",
            format_timestamp(Some(self.finish_time), tz)
        )?;
        writeln!(out)?;

        writeln!(out, "SUMMARY")?;
        writeln!(out, "{RULE_LIGHT}")?;
        writeln!(out, "Total Production Time: {}", self.total_production_time)?;
        writeln!(out, "Total Downtime:        {}", self.total_downtime)?;
        writeln!(out)?;

        writeln!(out, "DOWNTIME LOG")?;
        writeln!(out, "{RULE_LIGHT}")?;

        if self.downtime_logs.is_empty() {
            writeln!(out, "No downtime recorded for this job.")?;
            return Ok(());
        }

        for (index, log) in self.downtime_logs.iter().enumerate() {
            let reason = if log.description.trim().is_empty() {
                "N/A"
            } else {
                log.description.as_str()
            };
            writeln!(out, "Event {}:", index + 1)?;
            writeln!(out, "  From:     {}", format_timestamp(Some(log.down_at), tz))?;
            writeln!(out, "  To:       {}", format_timestamp(Some(log.up_at), tz))?;
            writeln!(out, "  Duration: {}", format_duration(log.duration_ms()))?;
            writeln!(out, "  Reason:   {reason}")?;
            writeln!(out)?;
        }
        Ok(())
    }
}

/// A report as held by the job store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: ReportId,
    #[serde(flatten)]
    pub report: JobReport,
}
