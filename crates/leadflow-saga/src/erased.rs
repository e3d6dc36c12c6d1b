use std::any::Any;

use async_trait::async_trait;

use crate::step::SagaStep;

/// Type-erased value passed between steps and kept for compensation.
pub(crate) trait Payload: Any + Send {
    fn clone_payload(&self) -> Box<dyn Payload>;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T> Payload for T
where
    T: Clone + Send + 'static,
{
    fn clone_payload(&self) -> Box<dyn Payload> {
        Box::new(self.clone())
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Recover the concrete value of a payload.
///
/// # Panics
///
/// Panics if the payload is not a `T`. The type-state builder makes every
/// step's input match the previous step's output, so this cannot happen for
/// sagas built through `SagaBuilder`.
pub(crate) fn downcast<T: 'static>(payload: Box<dyn Payload>) -> T {
    *payload
        .into_any()
        .downcast::<T>()
        .expect("type-state builder guarantees payload type")
}

#[async_trait]
pub(crate) trait ErasedStep<Ctx, Err>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute_erased(
        &self,
        ctx: &Ctx,
        input: Box<dyn Payload>,
    ) -> Result<Box<dyn Payload>, Err>;

    async fn compensate_erased(&self, ctx: &Ctx, output: Box<dyn Payload>) -> Result<(), Err>;

    fn compensation_description(&self) -> String;
}

pub(crate) struct StepWrapper<S> {
    step: S,
}

impl<S> StepWrapper<S> {
    pub(crate) fn new(step: S) -> Self {
        Self { step }
    }
}

#[async_trait]
impl<S> ErasedStep<S::Context, S::Error> for StepWrapper<S>
where
    S: SagaStep + 'static,
    S::Context: 'static,
    S::Error: 'static,
{
    fn name(&self) -> &'static str {
        self.step.name()
    }

    async fn execute_erased(
        &self,
        ctx: &S::Context,
        input: Box<dyn Payload>,
    ) -> Result<Box<dyn Payload>, S::Error> {
        let output = self.step.execute(ctx, downcast::<S::Input>(input)).await?;
        Ok(Box::new(output))
    }

    async fn compensate_erased(
        &self,
        ctx: &S::Context,
        output: Box<dyn Payload>,
    ) -> Result<(), S::Error> {
        self.step.compensate(ctx, downcast::<S::Output>(output)).await
    }

    fn compensation_description(&self) -> String {
        self.step.compensation_description()
    }
}
