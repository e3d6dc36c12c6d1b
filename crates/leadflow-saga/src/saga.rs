use std::fmt::Debug;
use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::audit::{SagaAuditLog, StepStatus};
use crate::erased::{ErasedStep, Payload, downcast};
use crate::error::{CompensationError, SagaError};

type CompensationStack = Vec<(usize, Box<dyn Payload>)>;

/// A compiled saga ready for execution.
///
/// Sagas execute a sequence of steps, where each step's output becomes the
/// next step's input. If any step fails, previously completed steps are
/// compensated in reverse order (LIFO), each with the output it produced.
pub struct Saga<Input, Output, Ctx, Err> {
    steps: Vec<Box<dyn ErasedStep<Ctx, Err>>>,
    _phantom: PhantomData<fn(Input) -> Output>,
}

impl<Input, Output, Ctx, Err> Saga<Input, Output, Ctx, Err>
where
    Input: Clone + Send + 'static,
    Output: Clone + Send + 'static,
    Err: Debug,
{
    pub(crate) fn from_steps(steps: Vec<Box<dyn ErasedStep<Ctx, Err>>>) -> Self {
        Self {
            steps,
            _phantom: PhantomData,
        }
    }

    /// Names of the steps in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Execute the saga, returning the final output on success.
    ///
    /// On failure, compensates all previously completed steps in reverse order.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::StepFailed` if a step fails and all compensations succeed.
    /// Returns `SagaError::CompensationFailed` if a step fails and some compensations also fail.
    pub async fn execute(&self, ctx: &Ctx, input: Input) -> Result<Output, SagaError<Err>> {
        let (result, _audit_log) = self.execute_with_audit(ctx, input).await;
        result
    }

    /// Execute the saga and return both the result and an audit log.
    ///
    /// The audit log tracks all step executions and compensations.
    pub async fn execute_with_audit(
        &self,
        ctx: &Ctx,
        input: Input,
    ) -> (Result<Output, SagaError<Err>>, SagaAuditLog) {
        match self.execute_uncommitted(ctx, input).await {
            Ok(uncommitted) => {
                let (output, audit_log) = uncommitted.commit_with_audit();
                (Ok(output), audit_log)
            }
            Err((error, audit_log)) => (Err(error), audit_log),
        }
    }

    /// Execute every step but keep the compensation stack alive.
    ///
    /// The caller runs follow-up work and then either commits the result or
    /// aborts, which rolls back every step as if the last one had failed.
    ///
    /// # Errors
    ///
    /// Same as [`Saga::execute`], paired with the audit log of the failed run.
    pub async fn execute_uncommitted(
        &self,
        ctx: &Ctx,
        input: Input,
    ) -> Result<Uncommitted<'_, Input, Output, Ctx, Err>, (SagaError<Err>, SagaAuditLog)> {
        let mut audit_log = SagaAuditLog::new();
        let mut compensation_stack: CompensationStack = Vec::with_capacity(self.steps.len());
        let mut current: Box<dyn Payload> = Box::new(input);

        for (index, step) in self.steps.iter().enumerate() {
            audit_log.step_started(step.name());
            debug!(step = step.name(), "executing saga step");

            match step.execute_erased(ctx, current).await {
                Ok(output) => {
                    audit_log.step_executed(step.compensation_description());
                    compensation_stack.push((index, output.clone_payload()));
                    current = output;
                }
                Err(error) => {
                    audit_log.step_failed();
                    let saga_error = self
                        .compensate(ctx, &mut audit_log, compensation_stack, step.name(), error)
                        .await;
                    return Err((saga_error, audit_log));
                }
            }
        }

        Ok(Uncommitted {
            saga: self,
            output: downcast::<Output>(current),
            compensation_stack,
            audit_log,
        })
    }

    async fn compensate(
        &self,
        ctx: &Ctx,
        audit_log: &mut SagaAuditLog,
        mut compensation_stack: CompensationStack,
        failed_step: &str,
        step_error: Err,
    ) -> SagaError<Err> {
        warn!(
            failed_step,
            completed = compensation_stack.len(),
            error = ?step_error,
            "saga failed, rolling back completed steps"
        );

        let mut compensation_errors = Vec::new();

        while let Some((index, output)) = compensation_stack.pop() {
            let step = &self.steps[index];
            let step_name = step.name();
            let description = step.compensation_description();

            match step.compensate_erased(ctx, output).await {
                Ok(()) => {
                    debug!(step = step_name, "compensated");
                    audit_log.mark(index, StepStatus::Compensated);
                }
                Err(error) => {
                    warn!(
                        step = step_name,
                        compensation = %description,
                        error = ?error,
                        "compensation failed, continuing rollback"
                    );
                    audit_log.mark(index, StepStatus::CompensationFailed);
                    compensation_errors.push(CompensationError {
                        step: step_name.to_string(),
                        description,
                        error,
                    });
                }
            }
        }

        if compensation_errors.is_empty() {
            SagaError::StepFailed {
                step: failed_step.to_string(),
                source: step_error,
            }
        } else {
            SagaError::CompensationFailed {
                failed_step: failed_step.to_string(),
                step_error,
                compensation_errors,
            }
        }
    }
}

/// Result of a saga whose steps all succeeded but whose rollback is still
/// possible.
///
/// Dropping an `Uncommitted` without calling [`Uncommitted::abort`] keeps
/// every effect, same as [`Uncommitted::commit`].
#[must_use = "commit or abort the saga result"]
pub struct Uncommitted<'saga, Input, Output, Ctx, Err> {
    saga: &'saga Saga<Input, Output, Ctx, Err>,
    output: Output,
    compensation_stack: CompensationStack,
    audit_log: SagaAuditLog,
}

impl<Input, Output, Ctx, Err> Uncommitted<'_, Input, Output, Ctx, Err>
where
    Input: Clone + Send + 'static,
    Output: Clone + Send + 'static,
    Err: Debug,
{
    /// Output of the final step.
    #[must_use]
    pub fn output(&self) -> &Output {
        &self.output
    }

    #[must_use]
    pub fn audit_log(&self) -> &SagaAuditLog {
        &self.audit_log
    }

    /// Keep every step's effects and return the output.
    pub fn commit(self) -> Output {
        self.output
    }

    /// Like [`Uncommitted::commit`], also returning the audit log.
    pub fn commit_with_audit(self) -> (Output, SagaAuditLog) {
        (self.output, self.audit_log)
    }

    /// Roll back every completed step because follow-up work named `stage`
    /// failed with `error`.
    pub async fn abort(self, ctx: &Ctx, stage: &str, error: Err) -> SagaError<Err> {
        self.abort_with_audit(ctx, stage, error).await.0
    }

    /// Like [`Uncommitted::abort`], also returning the audit log.
    pub async fn abort_with_audit(
        self,
        ctx: &Ctx,
        stage: &str,
        error: Err,
    ) -> (SagaError<Err>, SagaAuditLog) {
        let Self {
            saga,
            compensation_stack,
            mut audit_log,
            ..
        } = self;

        let saga_error = saga
            .compensate(ctx, &mut audit_log, compensation_stack, stage, error)
            .await;
        (saga_error, audit_log)
    }
}
