//! Shop-floor service
//!
//! Owns every machine on the floor. Each machine lives in its own slot behind
//! an async mutex, so commands against one machine are serialized while
//! different machines proceed independently. Report persistence happens after
//! the slot lock is released and never rolls back the in-memory transition.

mod command;
mod job_ids;

pub use command::{
    AddJobRequest, Command, CommandOutcome, CompletionOutcome, PersistenceStatus, Submission,
};
pub use job_ids::JobIdAllocator;

use crate::application::constants::DEFAULT_TICK_INTERVAL;
use crate::application::ticker::ElapsedTicker;
use crate::domain::{DomainError, JobId, JobReport, Machine, MachineId};
use crate::error::{AppError, Result};
use crate::port::{JobStore, TimeProvider};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// One roster entry, as read from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSeed {
    pub id: MachineId,
    pub name: String,
}

impl MachineSeed {
    pub fn new(id: MachineId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Default floor roster (ids 1..=8)
pub fn default_roster() -> Vec<MachineSeed> {
    [
        "Vallet 1",
        "McKenzie 5",
        "Vallet 2",
        "Jerone 1",
        "Jerone 2",
        "JBB",
        "Robson",
        "Autec",
    ]
    .iter()
    .zip(1..)
    .map(|(name, id)| MachineSeed::new(id, *name))
    .collect()
}

/// Check a roster: non-empty, unique ids, non-blank names
pub fn validate_roster(roster: &[MachineSeed]) -> std::result::Result<(), DomainError> {
    if roster.is_empty() {
        return Err(DomainError::EmptyRoster);
    }
    let mut seen = std::collections::HashSet::new();
    for seed in roster {
        if seed.name.trim().is_empty() {
            return Err(DomainError::BlankMachineName(seed.id));
        }
        if !seen.insert(seed.id) {
            return Err(DomainError::DuplicateMachine(seed.id));
        }
    }
    Ok(())
}

struct MachineSlot {
    machine: Machine,
    ticker: Option<ElapsedTicker>,
}

impl MachineSlot {
    /// Keep the ticker bound to the machine's current run
    fn sync_ticker(&mut self, period: Duration, time_provider: &Arc<dyn TimeProvider>) {
        match (self.machine.start_time(), self.ticker.as_ref()) {
            (Some(start), Some(ticker)) if ticker.start_time() == start => {}
            (Some(start), _) => {
                if let Some(old) = self.ticker.take() {
                    old.stop();
                }
                self.ticker = Some(ElapsedTicker::spawn(start, period, time_provider.clone()));
                debug!(machine_id = self.machine.id(), start, "Elapsed ticker started");
            }
            (None, Some(_)) => {
                if let Some(ticker) = self.ticker.take() {
                    ticker.stop();
                }
                debug!(machine_id = self.machine.id(), "Elapsed ticker cancelled");
            }
            (None, None) => {}
        }
    }
}

pub struct ShopFloorService {
    slots: BTreeMap<MachineId, Mutex<MachineSlot>>,
    store: Arc<dyn JobStore>,
    time_provider: Arc<dyn TimeProvider>,
    job_ids: JobIdAllocator,
    tick_interval: Duration,
}

impl ShopFloorService {
    /// Build the floor from a roster. Rejects an empty roster, duplicate ids
    /// and blank names.
    pub fn new(
        roster: Vec<MachineSeed>,
        store: Arc<dyn JobStore>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Result<Self> {
        validate_roster(&roster)?;

        let slots = roster
            .into_iter()
            .map(|seed| {
                let slot = MachineSlot {
                    machine: Machine::new(seed.id, seed.name.trim()),
                    ticker: None,
                };
                (seed.id, Mutex::new(slot))
            })
            .collect();

        Ok(Self {
            slots,
            store,
            time_provider,
            job_ids: JobIdAllocator::new(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        })
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    fn slot(&self, machine_id: MachineId) -> Result<&Mutex<MachineSlot>> {
        self.slots
            .get(&machine_id)
            .ok_or_else(|| AppError::NotFound(format!("Machine {machine_id} not found")))
    }

    /// Run `f` against one machine under its lock, then resync its ticker
    async fn mutate<F>(&self, machine_id: MachineId, op: &'static str, f: F) -> Result<Machine>
    where
        F: FnOnce(&mut Machine, i64) -> bool,
    {
        let mut slot = self.slot(machine_id)?.lock().await;
        let now = self.time_provider.now_millis();

        if f(&mut slot.machine, now) {
            info!(
                machine_id,
                op,
                status = %slot.machine.status(),
                queued = slot.machine.jobs().len(),
                "Machine updated"
            );
        } else {
            debug!(machine_id, op, status = %slot.machine.status(), "Command ignored");
        }

        slot.sync_ticker(self.tick_interval, &self.time_provider);
        Ok(slot.machine.clone())
    }

    // ------------------------------------------------------------------
    // Command handlers
    // ------------------------------------------------------------------

    pub async fn add_job(&self, machine_id: MachineId, req: AddJobRequest) -> Result<Machine> {
        // Unknown machine wins over bad input
        self.slot(machine_id)?;
        let job_id = self.job_ids.next(self.time_provider.now_millis());
        let job = req.into_job(job_id)?;

        self.mutate(machine_id, "add_job", move |machine, _| machine.add_job(job))
            .await
    }

    pub async fn start_machine(&self, machine_id: MachineId) -> Result<Machine> {
        self.mutate(machine_id, "start_machine", |machine, now| machine.start(now))
            .await
    }

    pub async fn report_downtime(
        &self,
        machine_id: MachineId,
        reason: impl Into<String>,
    ) -> Result<Machine> {
        let reason = reason.into();
        self.mutate(machine_id, "report_downtime", move |machine, now| {
            machine.report_downtime(now, reason)
        })
        .await
    }

    pub async fn resume_production(&self, machine_id: MachineId) -> Result<Machine> {
        self.mutate(machine_id, "resume_production", |machine, now| {
            machine.resume_production(now)
        })
        .await
    }

    /// Complete a queued job and hand its report to the job store.
    ///
    /// A store failure is logged and reported in the outcome; the machine
    /// stays transitioned either way.
    pub async fn complete_job(
        &self,
        machine_id: MachineId,
        job_id: JobId,
    ) -> Result<CompletionOutcome> {
        let (machine, report) = {
            let mut slot = self.slot(machine_id)?.lock().await;
            let now = self.time_provider.now_millis();
            let report = slot.machine.complete_job(job_id, now);

            match &report {
                Some(report) => info!(
                    machine_id,
                    job_id,
                    total_production_ms = report.total_production_ms,
                    total_downtime_ms = report.total_downtime_ms,
                    status = %slot.machine.status(),
                    "Job completed"
                ),
                None => debug!(machine_id, job_id, "Complete ignored: job not queued"),
            }

            slot.sync_ticker(self.tick_interval, &self.time_provider);
            (slot.machine.clone(), report)
        };

        let persistence = match &report {
            Some(report) => self.persist(machine_id, job_id, report).await,
            None => PersistenceStatus::Skipped,
        };

        Ok(CompletionOutcome {
            machine,
            report,
            persistence,
        })
    }

    async fn persist(
        &self,
        machine_id: MachineId,
        job_id: JobId,
        report: &JobReport,
    ) -> PersistenceStatus {
        match self.store.create(report).await {
            Ok(report_id) => {
                info!(machine_id, job_id, report_id = %report_id, "Job report saved");
                PersistenceStatus::Persisted(report_id)
            }
            Err(e) => {
                error!(machine_id, job_id, error = %e, "Failed to save job report");
                PersistenceStatus::Failed(e.to_string())
            }
        }
    }

    /// Dispatch a typed command
    pub async fn execute(&self, machine_id: MachineId, command: Command) -> Result<CommandOutcome> {
        let machine = match command {
            Command::AddJob(req) => self.add_job(machine_id, req).await?,
            Command::StartMachine => self.start_machine(machine_id).await?,
            Command::ReportDowntime { reason } => self.report_downtime(machine_id, reason).await?,
            Command::ResumeProduction => self.resume_production(machine_id).await?,
            Command::CompleteJob { job_id } => {
                return Ok(CommandOutcome::Completed(
                    self.complete_job(machine_id, job_id).await?,
                ))
            }
        };
        Ok(CommandOutcome::Updated { machine })
    }

    /// Run a command the operator may have dismissed; a cancelled
    /// submission returns the machine unchanged.
    pub async fn submit(
        &self,
        machine_id: MachineId,
        submission: Submission<Command>,
    ) -> Result<CommandOutcome> {
        match submission {
            Submission::Submitted(command) => self.execute(machine_id, command).await,
            Submission::Cancelled => {
                debug!(machine_id, "Submission cancelled");
                Ok(CommandOutcome::Updated {
                    machine: self.machine(machine_id).await?,
                })
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Snapshots of every machine, ordered by id
    pub async fn list_machines(&self) -> Vec<Machine> {
        let mut machines = Vec::with_capacity(self.slots.len());
        for slot in self.slots.values() {
            machines.push(slot.lock().await.machine.clone());
        }
        machines
    }

    pub async fn machine(&self, machine_id: MachineId) -> Result<Machine> {
        Ok(self.slot(machine_id)?.lock().await.machine.clone())
    }

    /// Latest ticker reading (ms); None when the machine has no run
    pub async fn elapsed(&self, machine_id: MachineId) -> Result<Option<i64>> {
        let slot = self.slot(machine_id)?.lock().await;
        Ok(slot.ticker.as_ref().map(|ticker| ticker.elapsed_ms()))
    }

    /// Current time from the injected clock (epoch ms)
    pub fn now_millis(&self) -> i64 {
        self.time_provider.now_millis()
    }

    pub fn machine_count(&self) -> usize {
        self.slots.len()
    }

    /// Stop every ticker. Machine state is kept.
    pub async fn shutdown(&self) {
        for slot in self.slots.values() {
            let mut slot = slot.lock().await;
            if let Some(ticker) = slot.ticker.take() {
                let _ = ticker.stop().await;
            }
        }
        info!("Shop floor tickers stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MachineStatus;
    use crate::port::job_store::mocks::InMemoryJobStore;
    use crate::port::job_store::MockJobStore;
    use crate::port::time_provider::mocks::ManualClock;

    const MIN: i64 = 60_000;
    const T0: i64 = 1_709_625_600_000;

    fn floor() -> (ShopFloorService, Arc<ManualClock>, Arc<InMemoryJobStore>) {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(InMemoryJobStore::new());
        let service = ShopFloorService::new(default_roster(), store.clone(), clock.clone())
            .unwrap()
            .with_tick_interval(Duration::from_millis(5));
        (service, clock, store)
    }

    fn job(wr: &str, name: &str, crates: i64) -> AddJobRequest {
        AddJobRequest {
            wr_number: wr.to_string(),
            job_name: name.to_string(),
            crate_count: crates,
        }
    }

    #[test]
    fn test_default_roster() {
        let roster = default_roster();
        assert_eq!(roster.len(), 8);
        assert_eq!(roster[0], MachineSeed::new(1, "Vallet 1"));
        assert_eq!(roster[7], MachineSeed::new(8, "Autec"));
        assert!(validate_roster(&roster).is_ok());
    }

    #[test]
    fn test_roster_validation() {
        assert!(matches!(validate_roster(&[]), Err(DomainError::EmptyRoster)));
        assert!(matches!(
            validate_roster(&[MachineSeed::new(1, "A"), MachineSeed::new(1, "B")]),
            Err(DomainError::DuplicateMachine(1))
        ));
        assert!(matches!(
            validate_roster(&[MachineSeed::new(3, "  ")]),
            Err(DomainError::BlankMachineName(3))
        ));
    }

    #[tokio::test]
    async fn test_full_run_scenario() {
        let (service, clock, store) = floor();

        let machine = service.add_job(1, job("WR-1", "Coat A", 5)).await.unwrap();
        assert_eq!(machine.status(), MachineStatus::Idle);
        let job_id = machine.jobs().iter().next().unwrap().job_id;

        service.start_machine(1).await.unwrap();
        clock.advance(10 * MIN);
        let machine = service.report_downtime(1, "Tool change").await.unwrap();
        assert_eq!(machine.status(), MachineStatus::Down);
        clock.advance(5 * MIN);
        service.resume_production(1).await.unwrap();
        clock.advance(5 * MIN);

        let outcome = service.complete_job(1, job_id).await.unwrap();
        let report = outcome.report.unwrap();
        assert_eq!(report.total_downtime, "5m 0s");
        assert_eq!(report.total_production_time, "15m 0s");
        assert_eq!(outcome.machine.status(), MachineStatus::Idle);
        assert!(outcome.machine.start_time().is_none());
        assert!(outcome.persistence.is_persisted());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_machine_is_not_found() {
        let (service, _, _) = floor();
        assert!(matches!(
            service.start_machine(99).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.add_job(99, job("WR", "x", -1)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(service.elapsed(99).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_negative_crate_count_rejected() {
        let (service, _, _) = floor();
        let result = service.add_job(2, job("WR-9", "Coat", -1)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(service.machine(2).await.unwrap().jobs().is_empty());
    }

    #[tokio::test]
    async fn test_job_ids_unique_within_same_millisecond() {
        let (service, _, _) = floor();
        service.add_job(1, job("WR-1", "A", 1)).await.unwrap();
        let machine = service.add_job(1, job("WR-2", "B", 1)).await.unwrap();
        let ids: Vec<_> = machine.jobs().iter().map(|j| j.job_id).collect();
        assert_eq!(ids, vec![T0, T0 + 1]);
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_transition() {
        let clock = Arc::new(ManualClock::new(T0));
        let mut store = MockJobStore::new();
        store
            .expect_create()
            .times(1)
            .returning(|_| Err(AppError::Database("disk I/O error".to_string())));
        let service = ShopFloorService::new(default_roster(), Arc::new(store), clock.clone())
            .unwrap()
            .with_tick_interval(Duration::from_millis(5));

        let machine = service.add_job(4, job("WR-1", "Coat", 2)).await.unwrap();
        let job_id = machine.jobs().iter().next().unwrap().job_id;
        service.start_machine(4).await.unwrap();
        clock.advance(MIN);

        let outcome = service.complete_job(4, job_id).await.unwrap();
        assert!(outcome.report.is_some());
        assert!(matches!(
            outcome.persistence,
            PersistenceStatus::Failed(ref msg) if msg.contains("disk I/O error")
        ));
        assert_eq!(outcome.machine.status(), MachineStatus::Idle);
        assert!(service.machine(4).await.unwrap().jobs().is_empty());
    }

    #[tokio::test]
    async fn test_complete_unknown_job_is_skipped() {
        let (service, _, store) = floor();
        let outcome = service.complete_job(3, 12345).await.unwrap();
        assert!(outcome.report.is_none());
        assert_eq!(outcome.persistence, PersistenceStatus::Skipped);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_submission_changes_nothing() {
        let (service, _, _) = floor();
        service.add_job(5, job("WR-1", "Coat", 1)).await.unwrap();

        let outcome = service.submit(5, Submission::Cancelled).await.unwrap();
        assert_eq!(outcome.machine().status(), MachineStatus::Idle);
        assert_eq!(outcome.machine().jobs().len(), 1);
        assert!(outcome.report().is_none());

        let outcome = service
            .submit(5, Submission::Submitted(Command::StartMachine))
            .await
            .unwrap();
        assert_eq!(outcome.machine().status(), MachineStatus::Running);
    }

    #[tokio::test]
    async fn test_ticker_follows_run_lifetime() {
        let (service, clock, _) = floor();
        assert_eq!(service.elapsed(1).await.unwrap(), None);

        let machine = service.add_job(1, job("WR-1", "A", 1)).await.unwrap();
        let first = machine.jobs().iter().next().unwrap().job_id;
        service.add_job(1, job("WR-2", "B", 1)).await.unwrap();

        service.start_machine(1).await.unwrap();
        clock.advance(2_000);
        assert!(service.elapsed(1).await.unwrap().is_some());

        // Non-last job keeps the run going
        service.complete_job(1, first).await.unwrap();
        assert!(service.elapsed(1).await.unwrap().is_some());

        let machine = service.machine(1).await.unwrap();
        let last = machine.jobs().iter().next().unwrap().job_id;
        service.complete_job(1, last).await.unwrap();
        assert_eq!(service.elapsed(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ignored_transitions_return_snapshot() {
        let (service, _, _) = floor();
        // Empty queue: start is a no-op
        let machine = service.start_machine(6).await.unwrap();
        assert_eq!(machine.status(), MachineStatus::Idle);
        // Not running: downtime is a no-op
        let machine = service.report_downtime(6, "Jam").await.unwrap();
        assert_eq!(machine.status(), MachineStatus::Idle);
        assert!(machine.open_downtime().is_none());
        let machine = service.resume_production(6).await.unwrap();
        assert!(machine.is_consistent());
    }

    #[tokio::test]
    async fn test_list_machines_ordered_and_shutdown() {
        let (service, _, _) = floor();
        service.add_job(2, job("WR-1", "A", 1)).await.unwrap();
        service.start_machine(2).await.unwrap();

        let ids: Vec<_> = service.list_machines().await.iter().map(|m| m.id()).collect();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
        assert_eq!(service.machine_count(), 8);

        service.shutdown().await;
        assert_eq!(service.elapsed(2).await.unwrap(), None);
        // State survives shutdown
        assert_eq!(
            service.machine(2).await.unwrap().status(),
            MachineStatus::Running
        );
    }
}
