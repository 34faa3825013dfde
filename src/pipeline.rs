//! Middleware-style build pipeline.
//!
//! A step does its work around a call to [`Next::run`], which executes the
//! remaining steps. Steps are held in an explicit list and driven by index,
//! so every step can be checked for calling `next` exactly once.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use log::debug;

use crate::data::TransactionDataBuilder;
use crate::error::TxError;
use crate::options::BuildOptions;

#[async_trait]
pub trait BuildStep: Send + Sync {
    /// Used in logs and in errors about misuse of `next`.
    fn name(&self) -> &str;

    async fn run(
        &self,
        tx: &mut TransactionDataBuilder,
        options: &BuildOptions,
        next: &mut Next<'_>,
    ) -> Result<(), TxError>;
}

/// Continuation handed to a step.
pub struct Next<'a> {
    steps: &'a [Arc<dyn BuildStep>],
    position: usize,
    options: &'a BuildOptions,
    caller: &'a str,
    calls: usize,
    finished: bool,
}

impl<'a> Next<'a> {
    /// Run every remaining step. Must be called, and awaited, exactly once.
    ///
    /// The call itself is recorded immediately, so a future that is created
    /// and dropped is reported as not awaited.
    pub fn run<'s>(
        &'s mut self,
        tx: &'s mut TransactionDataBuilder,
    ) -> BoxFuture<'s, Result<(), TxError>> {
        self.calls += 1;
        if self.calls > 1 {
            let caller = self.caller.to_string();
            return async move { Err(TxError::NextCalledMultipleTimes(caller)) }.boxed();
        }
        async move {
            let result = run_from(self.steps, self.position, tx, self.options).await;
            self.finished = true;
            result
        }
        .boxed()
    }
}

/// Run `steps` in order over `tx`.
pub fn run_steps<'a>(
    steps: &'a [Arc<dyn BuildStep>],
    tx: &'a mut TransactionDataBuilder,
    options: &'a BuildOptions,
) -> BoxFuture<'a, Result<(), TxError>> {
    run_from(steps, 0, tx, options)
}

fn run_from<'a>(
    steps: &'a [Arc<dyn BuildStep>],
    position: usize,
    tx: &'a mut TransactionDataBuilder,
    options: &'a BuildOptions,
) -> BoxFuture<'a, Result<(), TxError>> {
    async move {
        let Some(step) = steps.get(position) else {
            return Ok(());
        };
        let name = step.name();
        debug!("running build step {name}");

        let mut next = Next {
            steps,
            position: position + 1,
            options,
            caller: name,
            calls: 0,
            finished: false,
        };
        step.run(tx, options, &mut next).await?;

        match (next.calls, next.finished) {
            (0, _) => Err(TxError::NextNotCalled(name.to_string())),
            (1, false) => Err(TxError::NextNotAwaited(name.to_string())),
            (1, true) => Ok(()),
            _ => Err(TxError::NextCalledMultipleTimes(name.to_string())),
        }
    }
    .boxed()
}

/// Caller-registered build steps, serialization steps and intent resolvers.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    build_steps: Vec<Arc<dyn BuildStep>>,
    serialization_steps: Vec<Arc<dyn BuildStep>>,
    intent_resolvers: BTreeMap<String, Arc<dyn BuildStep>>,
}

fn same_step(a: &Arc<dyn BuildStep>, b: &Arc<dyn BuildStep>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs before the built-in resolution steps on every build.
    pub fn add_build_step(&mut self, step: Arc<dyn BuildStep>) {
        self.build_steps.push(step);
    }

    /// Runs whenever the transaction is prepared, including plain JSON
    /// serialization.
    pub fn add_serialization_step(&mut self, step: Arc<dyn BuildStep>) {
        self.serialization_steps.push(step);
    }

    /// Registering the same handler twice is a no-op; a different handler
    /// for a taken name is an error.
    pub fn add_intent_resolver(
        &mut self,
        intent: impl Into<String>,
        resolver: Arc<dyn BuildStep>,
    ) -> Result<(), TxError> {
        let intent = intent.into();
        match self.intent_resolvers.get(&intent) {
            Some(existing) if same_step(existing, &resolver) => Ok(()),
            Some(_) => Err(TxError::DuplicateIntentResolver(intent)),
            None => {
                self.intent_resolvers.insert(intent, resolver);
                Ok(())
            }
        }
    }

    pub fn intent_resolver(&self, intent: &str) -> Option<&Arc<dyn BuildStep>> {
        self.intent_resolvers.get(intent)
    }

    pub fn build_steps(&self) -> &[Arc<dyn BuildStep>] {
        &self.build_steps
    }

    pub fn serialization_steps(&self) -> &[Arc<dyn BuildStep>] {
        &self.serialization_steps
    }
}
