use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    Executed,
    Failed,
    Compensated,
    CompensationFailed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Executed => "✓",
            Self::Failed => "✗",
            Self::Compensated => "↩",
            Self::CompensationFailed => "⚠",
        })
    }
}

/// One step's entry in a [`SagaAuditLog`].
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    /// How long the step's own execution took; `None` while it is running.
    pub elapsed: Option<Duration>,
    /// What compensating the step will do, once it has executed.
    pub compensation_description: Option<String>,
}

/// What happened to each step of one saga run, in execution order.
///
/// Entries are addressed by position, so two steps with the same name are
/// tracked separately.
#[derive(Debug, Default)]
pub struct SagaAuditLog {
    records: Vec<StepRecord>,
    running_since: Option<Instant>,
}

impl SagaAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn step_started(&mut self, name: &str) {
        self.running_since = Some(Instant::now());
        self.records.push(StepRecord {
            name: name.to_string(),
            status: StepStatus::Executed,
            elapsed: None,
            compensation_description: None,
        });
    }

    pub(crate) fn step_executed(&mut self, compensation_description: String) {
        let elapsed = self.stop_clock();
        if let Some(record) = self.records.last_mut() {
            record.elapsed = elapsed;
            record.compensation_description = Some(compensation_description);
        }
    }

    pub(crate) fn step_failed(&mut self) {
        let elapsed = self.stop_clock();
        if let Some(record) = self.records.last_mut() {
            record.status = StepStatus::Failed;
            record.elapsed = elapsed;
        }
    }

    pub(crate) fn mark(&mut self, index: usize, status: StepStatus) {
        if let Some(record) = self.records.get_mut(index) {
            record.status = status;
        }
    }

    fn stop_clock(&mut self) -> Option<Duration> {
        self.running_since.take().map(|start| start.elapsed())
    }

    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Names of the steps that were rolled back successfully, in execution order.
    #[must_use]
    pub fn compensated_steps(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|record| record.status == StepStatus::Compensated)
            .map(|record| record.name.as_str())
            .collect()
    }

    /// One line per step, its status marker then its name.
    #[must_use]
    pub fn summary(&self) -> String {
        self.records
            .iter()
            .map(|record| format!("{} {}", record.status, record.name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executed(log: &mut SagaAuditLog, name: &str) {
        log.step_started(name);
        log.step_executed(format!("undo {name}"));
    }

    #[test]
    fn running_step_has_no_duration() {
        let mut log = SagaAuditLog::new();
        log.step_started("create_parent_user");

        let record = &log.records()[0];
        assert_eq!(record.status, StepStatus::Executed);
        assert!(record.elapsed.is_none());
        assert!(record.compensation_description.is_none());
    }

    #[test]
    fn executed_step_keeps_its_compensation() {
        let mut log = SagaAuditLog::new();
        executed(&mut log, "create_parent_user");

        let record = &log.records()[0];
        assert!(record.elapsed.is_some());
        assert_eq!(
            record.compensation_description.as_deref(),
            Some("undo create_parent_user")
        );
    }

    #[test]
    fn failed_step_is_timed() {
        let mut log = SagaAuditLog::new();
        log.step_started("create_parent_user");
        log.step_failed();

        assert_eq!(log.records()[0].status, StepStatus::Failed);
        assert!(log.records()[0].elapsed.is_some());
    }

    #[test]
    fn marks_target_position_not_name() {
        let mut log = SagaAuditLog::new();
        executed(&mut log, "link_user");
        executed(&mut log, "link_user");
        log.mark(1, StepStatus::Compensated);
        log.mark(0, StepStatus::CompensationFailed);
        log.mark(7, StepStatus::Compensated);

        assert_eq!(log.records().len(), 2);
        assert_eq!(log.records()[0].status, StepStatus::CompensationFailed);
        assert_eq!(log.records()[1].status, StepStatus::Compensated);
    }

    #[test]
    fn summary_lists_rolled_back_run() {
        let mut log = SagaAuditLog::new();
        executed(&mut log, "create_student_user");
        executed(&mut log, "create_student_record");
        log.step_started("link_student_user");
        log.step_failed();
        log.mark(1, StepStatus::CompensationFailed);
        log.mark(0, StepStatus::Compensated);

        assert_eq!(log.compensated_steps(), vec!["create_student_user"]);
        assert_eq!(
            log.summary(),
            "↩ create_student_user\n⚠ create_student_record\n✗ link_student_user"
        );
    }
}
