use async_trait::async_trait;

/// A step in a saga that can be executed and compensated.
///
/// Each step transforms an input into an output. If a later step fails, the
/// step is compensated with the output it produced, so a step that created an
/// external record can delete exactly the record it created.
///
/// # Type Parameters
///
/// - `Input`: Data received from the previous step (or saga entry point)
/// - `Output`: Data produced for the next step, and handed back on compensation
/// - `Context`: Shared collaborators (injected, not passed between steps)
/// - `Error`: The error type for step failures
#[async_trait]
pub trait SagaStep: Send + Sync {
    /// Data received from the previous step or saga entry point.
    type Input: Clone + Send + 'static;

    /// Data produced for the next step.
    type Output: Clone + Send + 'static;

    /// Shared context providing collaborators.
    type Context: Send + Sync;

    /// Error type for step failures.
    type Error: Send;

    /// Human-readable name for logging and error messages.
    fn name(&self) -> &'static str;

    /// Execute the step, transforming input into output.
    ///
    /// # Errors
    ///
    /// Returns an error if the step fails to complete.
    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> Result<Self::Output, Self::Error>;

    /// Compensate (undo) the step's effects.
    ///
    /// Called during rollback when a later step fails. Receives the output
    /// this step's `execute()` returned.
    ///
    /// The default implementation is a no-op, suitable for steps whose effects
    /// are undone by an earlier step's compensation.
    ///
    /// # Errors
    ///
    /// Returns an error if compensation fails.
    async fn compensate(&self, ctx: &Self::Context, output: Self::Output) -> Result<(), Self::Error> {
        let _ = (ctx, output);
        Ok(())
    }

    /// Human-readable description of what compensation will do.
    fn compensation_description(&self) -> String {
        format!("undo {}", self.name())
    }
}
