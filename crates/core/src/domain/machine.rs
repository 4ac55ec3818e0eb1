// Machine Domain Model - lifecycle state machine
//
// Idle --start--> Running --report_downtime--> Down --resume--> Running
// complete_job on the last queued job resets any state back to Idle.
//
// Every transition is a defensive no-op when its precondition does not hold;
// the boolean result tells the caller whether anything changed.

use crate::domain::downtime::{DowntimeInterval, DowntimeLog, OpenDowntime};
use crate::domain::job::{Job, JobId};
use crate::domain::queue::JobQueue;
use crate::domain::report::JobReport;
use serde::{Deserialize, Serialize};

/// Machine ID (fixed at bootstrap)
pub type MachineId = u32;

/// Machine operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStatus {
    Idle,
    Running,
    Down,
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineStatus::Idle => write!(f, "Idle"),
            MachineStatus::Running => write!(f, "Running"),
            MachineStatus::Down => write!(f, "Down"),
        }
    }
}

/// Live state of one production machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    id: MachineId,
    name: String,
    status: MachineStatus,
    jobs: JobQueue,
    start_time: Option<i64>,
    #[serde(flatten)]
    downtime: DowntimeLog,
}

impl Machine {
    /// Create an idle machine with an empty queue
    pub fn new(id: MachineId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: MachineStatus::Idle,
            jobs: JobQueue::new(),
            start_time: None,
            downtime: DowntimeLog::new(),
        }
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> MachineStatus {
        self.status
    }

    pub fn jobs(&self) -> &JobQueue {
        &self.jobs
    }

    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    pub fn downtime_log(&self) -> &[DowntimeInterval] {
        self.downtime.closed()
    }

    pub fn open_downtime(&self) -> Option<&OpenDowntime> {
        self.downtime.open_interval()
    }

    pub(crate) fn downtime(&self) -> &DowntimeLog {
        &self.downtime
    }

    /// Append a job to the backlog. Valid in any state; never touches
    /// status or timers. Rejects a job id already in the queue.
    pub fn add_job(&mut self, job: Job) -> bool {
        if self.jobs.contains(job.job_id) {
            return false;
        }
        self.jobs.enqueue(job);
        true
    }

    /// Begin a fresh run: Idle with a non-empty queue -> Running
    pub fn start(&mut self, now: i64) -> bool {
        if self.status != MachineStatus::Idle || self.jobs.is_empty() {
            return false;
        }
        self.status = MachineStatus::Running;
        self.start_time = Some(now);
        self.downtime.clear();
        true
    }

    /// Running -> Down, opening a downtime interval at `now`
    pub fn report_downtime(&mut self, now: i64, reason: impl Into<String>) -> bool {
        if self.status != MachineStatus::Running {
            return false;
        }
        if !self.downtime.open(now, reason) {
            return false;
        }
        self.status = MachineStatus::Down;
        true
    }

    /// Down -> Running, closing the open interval at `now`
    pub fn resume_production(&mut self, now: i64) -> bool {
        if self.status != MachineStatus::Down {
            return false;
        }
        if self.downtime.close(now).is_none() {
            return false;
        }
        self.status = MachineStatus::Running;
        true
    }

    /// Complete a queued job at `now`.
    ///
    /// The report is generated from the state before the job is removed.
    /// Removing the last job ends the run and resets the machine to Idle;
    /// otherwise status, timers and downtime history carry over.
    pub fn complete_job(&mut self, job_id: JobId, now: i64) -> Option<JobReport> {
        let job = self.jobs.get(job_id)?;
        let report = JobReport::generate(self, job, now);

        self.jobs.remove(job_id);
        if self.jobs.is_empty() {
            self.reset();
        }
        Some(report)
    }

    fn reset(&mut self) {
        self.status = MachineStatus::Idle;
        self.start_time = None;
        self.downtime.clear();
    }

    /// Elapsed run time at `now` (None when no run is in progress)
    pub fn elapsed_ms(&self, now: i64) -> Option<i64> {
        self.start_time.map(|start| (now - start).max(0))
    }

    /// Status/timer/downtime invariants
    pub fn is_consistent(&self) -> bool {
        let down_matches_open = (self.status == MachineStatus::Down) == self.downtime.is_open();
        let timer_matches_status = match self.status {
            MachineStatus::Idle => self.start_time.is_none(),
            MachineStatus::Running | MachineStatus::Down => self.start_time.is_some(),
        };
        down_matches_open && timer_matches_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60_000;

    fn machine_with_jobs(ids: &[JobId]) -> Machine {
        let mut machine = Machine::new(1, "Vallet 1");
        for id in ids {
            assert!(machine.add_job(Job::new(*id, format!("WR-{id}"), "Coat", 1)));
        }
        machine
    }

    #[test]
    fn test_initial_state() {
        let machine = Machine::new(7, "Robson");
        assert_eq!(machine.status(), MachineStatus::Idle);
        assert!(machine.jobs().is_empty());
        assert!(machine.start_time().is_none());
        assert!(machine.open_downtime().is_none());
        assert!(machine.is_consistent());
    }

    #[test]
    fn test_add_job_never_changes_status_or_timers() {
        let mut machine = machine_with_jobs(&[1]);
        machine.start(1_000);
        machine.report_downtime(2_000, "Jam");
        let before = machine.clone();

        assert!(machine.add_job(Job::new(2, "WR-2", "Coat", 4)));

        assert_eq!(machine.status(), before.status());
        assert_eq!(machine.start_time(), before.start_time());
        assert_eq!(machine.downtime_log(), before.downtime_log());
        assert_eq!(machine.open_downtime(), before.open_downtime());
        assert_eq!(machine.jobs().len(), 2);
    }

    #[test]
    fn test_add_job_rejects_duplicate_id() {
        let mut machine = machine_with_jobs(&[1]);
        assert!(!machine.add_job(Job::new(1, "WR-dup", "Coat", 1)));
        assert_eq!(machine.jobs().len(), 1);
    }

    #[test]
    fn test_start_requires_jobs() {
        let mut machine = Machine::new(1, "Vallet 1");
        assert!(!machine.start(1_000));
        assert_eq!(machine.status(), MachineStatus::Idle);
        assert!(machine.start_time().is_none());
    }

    #[test]
    fn test_start_is_noop_when_not_idle() {
        let mut machine = machine_with_jobs(&[1]);
        assert!(machine.start(1_000));
        assert!(!machine.start(5_000));
        assert_eq!(machine.start_time(), Some(1_000));

        machine.report_downtime(6_000, "Jam");
        assert!(!machine.start(7_000));
        assert_eq!(machine.status(), MachineStatus::Down);
    }

    #[test]
    fn test_downtime_requires_running() {
        let mut machine = machine_with_jobs(&[1]);
        assert!(!machine.report_downtime(1_000, "Jam"));
        assert_eq!(machine.status(), MachineStatus::Idle);

        machine.start(1_000);
        assert!(machine.report_downtime(2_000, "Jam"));
        assert!(!machine.report_downtime(3_000, "Again"));
        assert_eq!(machine.open_downtime().map(|o| o.down_at), Some(2_000));
        assert!(machine.is_consistent());
    }

    #[test]
    fn test_resume_requires_down() {
        let mut machine = machine_with_jobs(&[1]);
        machine.start(0);
        assert!(!machine.resume_production(1_000));
        assert!(machine.downtime_log().is_empty());

        machine.report_downtime(1_000, "Jam");
        assert!(machine.resume_production(3_000));
        assert_eq!(machine.status(), MachineStatus::Running);
        assert_eq!(machine.downtime_log().len(), 1);
        assert!(machine.open_downtime().is_none());
        assert!(machine.is_consistent());
    }

    #[test]
    fn test_resume_then_downtime_leaves_no_gap() {
        let mut machine = machine_with_jobs(&[1]);
        machine.start(0);
        machine.report_downtime(10 * MIN, "Tool change");

        let t = 15 * MIN;
        machine.resume_production(t);
        machine.report_downtime(t, "Material jam");

        let last_closed = machine.downtime_log().last().unwrap();
        assert_eq!(last_closed.up_at, t);
        assert_eq!(machine.open_downtime().unwrap().down_at, t);
    }

    #[test]
    fn test_start_clears_previous_downtime_history() {
        let mut machine = machine_with_jobs(&[1]);
        machine.start(0);
        machine.report_downtime(1_000, "Jam");
        machine.resume_production(2_000);
        machine.complete_job(1, 3_000);

        machine.add_job(Job::new(2, "WR-2", "Coat", 1));
        assert!(machine.start(4_000));
        assert!(machine.downtime_log().is_empty());
        assert_eq!(machine.start_time(), Some(4_000));
    }

    #[test]
    fn test_complete_last_job_resets_to_idle() {
        let mut machine = machine_with_jobs(&[1]);
        machine.start(0);
        machine.report_downtime(MIN, "Jam");

        let report = machine.complete_job(1, 2 * MIN).unwrap();
        assert_eq!(report.downtime_logs.len(), 1);

        assert_eq!(machine.status(), MachineStatus::Idle);
        assert!(machine.start_time().is_none());
        assert!(machine.downtime_log().is_empty());
        assert!(machine.open_downtime().is_none());
        assert!(machine.jobs().is_empty());
        assert!(machine.is_consistent());
    }

    #[test]
    fn test_complete_non_last_job_keeps_run() {
        let mut machine = machine_with_jobs(&[1, 2]);
        machine.start(0);
        machine.report_downtime(MIN, "Jam");
        machine.resume_production(2 * MIN);
        machine.report_downtime(3 * MIN, "Tool");

        machine.complete_job(1, 4 * MIN).unwrap();

        assert_eq!(machine.status(), MachineStatus::Down);
        assert_eq!(machine.start_time(), Some(0));
        assert_eq!(machine.downtime_log().len(), 1);
        assert_eq!(machine.open_downtime().map(|o| o.down_at), Some(3 * MIN));
        assert_eq!(machine.jobs().len(), 1);
    }

    #[test]
    fn test_downtime_carries_into_next_report() {
        let mut machine = machine_with_jobs(&[1, 2]);
        machine.start(0);
        machine.report_downtime(MIN, "Jam");
        machine.resume_production(2 * MIN);

        let first = machine.complete_job(1, 3 * MIN).unwrap();
        let second = machine.complete_job(2, 4 * MIN).unwrap();

        assert_eq!(first.downtime_logs, second.downtime_logs);
        assert_eq!(second.total_downtime, "1m 0s");
        assert_eq!(second.total_production_time, "3m 0s");
    }

    #[test]
    fn test_complete_unknown_job_is_noop() {
        let mut machine = machine_with_jobs(&[1]);
        machine.start(0);
        let before = machine.clone();

        assert!(machine.complete_job(42, 1_000).is_none());
        assert_eq!(machine, before);
    }

    #[test]
    fn test_elapsed() {
        let mut machine = machine_with_jobs(&[1]);
        assert_eq!(machine.elapsed_ms(5_000), None);
        machine.start(1_000);
        assert_eq!(machine.elapsed_ms(5_000), Some(4_000));
    }

    #[test]
    fn test_serialized_shape() {
        let mut machine = machine_with_jobs(&[1]);
        machine.start(0);
        machine.report_downtime(10, "Jam");

        let value = serde_json::to_value(&machine).unwrap();
        assert_eq!(value["status"], "Down");
        assert_eq!(value["startTime"], 0);
        assert_eq!(value["openDowntime"]["downAt"], 10);
        assert!(value["downtimeLog"].as_array().unwrap().is_empty());
        assert_eq!(value["jobs"][0]["wrNumber"], "WR-1");
    }

    #[test]
    fn test_command_sequences_keep_invariants() {
        // xorshift: deterministic command mix without extra dependencies
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        let mut machine = Machine::new(1, "Vallet 1");
        let mut now = 0;
        let mut next_id: JobId = 1;

        for _ in 0..2_000 {
            now += (next() % 5 * MIN as u64) as i64;
            match next() % 5 {
                0 => {
                    machine.add_job(Job::new(next_id, "WR", "Coat", 1));
                    next_id += 1;
                }
                1 => {
                    machine.start(now);
                }
                2 => {
                    machine.report_downtime(now, "Jam");
                }
                3 => {
                    machine.resume_production(now);
                }
                _ => {
                    let Some(job_id) = machine.jobs().iter().next().map(|job| job.job_id) else {
                        continue;
                    };
                    let start = machine.start_time();
                    let report = machine.complete_job(job_id, now).unwrap();
                    let run = start.map(|start| now - start).unwrap_or(0);
                    assert!(report.total_production_ms >= 0);
                    assert!(report.total_downtime_ms >= 0);
                    assert_eq!(report.total_production_ms + report.total_downtime_ms, run);
                }
            }
            assert!(machine.is_consistent());
        }
    }
}
