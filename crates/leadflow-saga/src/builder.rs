use std::fmt::Debug;
use std::marker::PhantomData;

use crate::erased::{ErasedStep, StepWrapper};
use crate::saga::Saga;
use crate::step::SagaStep;

/// Builder state before the first step.
pub struct Empty;

/// Builder state once steps exist; tracks the last step's output type.
pub struct HasSteps<LastOutput>(PhantomData<LastOutput>);

/// Chains steps into a [`Saga`], checking at compile time that each step
/// accepts what the previous one produced.
///
/// ```compile_fail
/// use async_trait::async_trait;
/// use leadflow_saga::{SagaBuilder, SagaStep};
///
/// struct CreateUser;
/// #[async_trait]
/// impl SagaStep for CreateUser {
///     type Input = ();
///     type Output = String;
///     type Context = ();
///     type Error = ();
///     fn name(&self) -> &'static str { "create_user" }
///     async fn execute(&self, _: &(), _: ()) -> Result<String, ()> {
///         Ok("recUser".to_string())
///     }
/// }
///
/// struct CountRecords;
/// #[async_trait]
/// impl SagaStep for CountRecords {
///     type Input = usize;
///     type Output = usize;
///     type Context = ();
///     type Error = ();
///     fn name(&self) -> &'static str { "count_records" }
///     async fn execute(&self, _: &(), n: usize) -> Result<usize, ()> {
///         Ok(n + 1)
///     }
/// }
///
/// let saga = SagaBuilder::new()
///     .first_step(CreateUser)
///     .then(CountRecords)
///     .build();
/// ```
///
/// A saga needs at least one step:
///
/// ```compile_fail
/// use leadflow_saga::SagaBuilder;
///
/// let saga = SagaBuilder::<(), (), (), ()>::new().build();
/// ```
pub struct SagaBuilder<Input, Output, Ctx, Err, State> {
    steps: Vec<Box<dyn ErasedStep<Ctx, Err>>>,
    _phantom: PhantomData<(fn(Input) -> Output, State)>,
}

impl<Input, Output, Ctx, Err, State> SagaBuilder<Input, Output, Ctx, Err, State>
where
    Ctx: 'static,
    Err: 'static,
{
    fn push<S, NewInput>(self, step: S) -> SagaBuilder<NewInput, S::Output, Ctx, Err, HasSteps<S::Output>>
    where
        S: SagaStep<Context = Ctx, Error = Err> + 'static,
    {
        let mut steps = self.steps;
        steps.push(Box::new(StepWrapper::new(step)));
        SagaBuilder {
            steps,
            _phantom: PhantomData,
        }
    }
}

impl<Ctx, Err> SagaBuilder<(), (), Ctx, Err, Empty> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// The saga takes whatever this step takes.
    #[must_use]
    pub fn first_step<S>(
        self,
        step: S,
    ) -> SagaBuilder<S::Input, S::Output, Ctx, Err, HasSteps<S::Output>>
    where
        S: SagaStep<Context = Ctx, Error = Err> + 'static,
        Ctx: 'static,
        Err: 'static,
    {
        self.push(step)
    }
}

impl<Ctx, Err> Default for SagaBuilder<(), (), Ctx, Err, Empty> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Input, CurrentOutput, Ctx, Err>
    SagaBuilder<Input, CurrentOutput, Ctx, Err, HasSteps<CurrentOutput>>
{
    #[must_use]
    pub fn then<S>(self, step: S) -> SagaBuilder<Input, S::Output, Ctx, Err, HasSteps<S::Output>>
    where
        S: SagaStep<Input = CurrentOutput, Context = Ctx, Error = Err> + 'static,
        Ctx: 'static,
        Err: 'static,
    {
        self.push(step)
    }

    #[must_use]
    pub fn build(self) -> Saga<Input, CurrentOutput, Ctx, Err>
    where
        Input: Clone + Send + 'static,
        CurrentOutput: Clone + Send + 'static,
        Err: Debug,
    {
        Saga::from_steps(self.steps)
    }
}
