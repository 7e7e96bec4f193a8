//! Fixture lifecycle engine
//!
//! Fixtures are declared once as an explicit, acyclic dependency graph and
//! instantiated per test in a value arena. Setup runs lazily on first use,
//! dependencies first, in declaration order; teardown runs in the exact
//! reverse of the realized setup order, unconditionally for every fixture
//! that reached `Ready`, even when the test body or a later setup failed.
//!
//! Per-fixture state machine, per test:
//!
//! ```text
//! Unrequested -> SettingUp -> Ready -> TearingDown -> Done
//!                    |          |           |
//!                    +----------+-----------+--> Failed
//! ```
//!
//! Scheduling is single-threaded cooperative within one test: setups and
//! teardowns never overlap, because the UI session they drive is itself
//! sequential.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tracing::{debug, info, warn};

use qadrive_common::{Error, Result};

/// Type-erased fixture value held in the per-test arena
pub type FixtureValue = Arc<dyn Any + Send + Sync>;

/// Boxed future used by setup/teardown closures and the recursive resolver
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type SetupFn =
    Arc<dyn Fn(FixtureHandles) -> BoxFuture<'static, Result<FixtureValue>> + Send + Sync>;
type TeardownFn =
    Arc<dyn Fn(FixtureValue, FixtureHandles) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Index of a fixture in its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixtureId(usize);

/// Typed handle to a registered fixture
pub struct FixtureKey<T> {
    id: FixtureId,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for FixtureKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FixtureKey<T> {}

impl<T> FixtureKey<T> {
    pub fn id(&self) -> FixtureId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

struct FixtureDef {
    name: &'static str,
    deps: Vec<FixtureId>,
    setup: SetupFn,
    teardown: Option<TeardownFn>,
}

/// Immutable, cycle-checked fixture graph built at composition time
pub struct FixtureGraph {
    defs: Vec<FixtureDef>,
    names: HashMap<&'static str, FixtureId>,
}

impl FixtureGraph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder {
            defs: Vec::new(),
            names: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    fn def(&self, id: FixtureId) -> &FixtureDef {
        &self.defs[id.0]
    }
}

/// Builder for a [`FixtureGraph`]
pub struct GraphBuilder {
    defs: Vec<FixtureDef>,
    names: HashMap<&'static str, FixtureId>,
}

impl GraphBuilder {
    /// Register a fixture without teardown.
    pub fn fixture<T, S>(
        &mut self,
        name: &'static str,
        deps: &[FixtureId],
        setup: S,
    ) -> Result<FixtureKey<T>>
    where
        T: Send + Sync + 'static,
        S: Fn(FixtureHandles) -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    {
        self.register(name, deps, erase_setup(setup), None)
    }

    /// Register a fixture whose teardown consumes the setup value.
    ///
    /// Teardown also receives the handle set, so it can use values of the
    /// fixtures it depends on: those are torn down later and are still live.
    pub fn fixture_with_teardown<T, S, D>(
        &mut self,
        name: &'static str,
        deps: &[FixtureId],
        setup: S,
        teardown: D,
    ) -> Result<FixtureKey<T>>
    where
        T: Send + Sync + 'static,
        S: Fn(FixtureHandles) -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
        D: Fn(Arc<T>, FixtureHandles) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        let name_for_err = name;
        let erased: TeardownFn = Arc::new(move |value: FixtureValue, handles| {
            match value.downcast::<T>() {
                Ok(typed) => teardown(typed, handles),
                Err(_) => futures::future::ready(Err(Error::FixtureUnavailable {
                    fixture: name_for_err,
                    message: "teardown value had an unexpected type".to_string(),
                }))
                .boxed(),
            }
        });
        self.register(name, deps, erase_setup(setup), Some(erased))
    }

    fn register<T>(
        &mut self,
        name: &'static str,
        deps: &[FixtureId],
        setup: SetupFn,
        teardown: Option<TeardownFn>,
    ) -> Result<FixtureKey<T>> {
        if self.names.contains_key(name) {
            return Err(Error::DuplicateFixture(name));
        }
        for dep in deps {
            if dep.0 >= self.defs.len() {
                return Err(Error::UnknownFixture(format!(
                    "dependency #{} of '{name}' is not registered",
                    dep.0
                )));
            }
        }

        let id = FixtureId(self.defs.len());
        self.defs.push(FixtureDef {
            name,
            deps: deps.to_vec(),
            setup,
            teardown,
        });
        self.names.insert(name, id);
        Ok(FixtureKey {
            id,
            name,
            _marker: PhantomData,
        })
    }

    /// Finish the graph, verifying acyclicity.
    ///
    /// Keys only reference already-registered fixtures, so a graph built
    /// through the public API is acyclic by construction; the topological
    /// check still runs so a hand-assembled graph cannot slip through.
    pub fn build(self) -> Result<FixtureGraph> {
        let mut indegree = vec![0usize; self.defs.len()];
        for def in &self.defs {
            for dep in &def.deps {
                indegree[dep.0] += 1;
            }
        }
        let mut queue: Vec<usize> = indegree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut seen = 0;
        while let Some(node) = queue.pop() {
            seen += 1;
            for dep in &self.defs[node].deps {
                indegree[dep.0] -= 1;
                if indegree[dep.0] == 0 {
                    queue.push(dep.0);
                }
            }
        }
        if seen != self.defs.len() {
            let stuck = indegree
                .iter()
                .position(|d| *d > 0)
                .map(|i| self.defs[i].name)
                .unwrap_or("unknown");
            return Err(Error::FixtureCycle(stuck.to_string()));
        }

        Ok(FixtureGraph {
            defs: self.defs,
            names: self.names,
        })
    }
}

fn erase_setup<T, S>(setup: S) -> SetupFn
where
    T: Send + Sync + 'static,
    S: Fn(FixtureHandles) -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
{
    Arc::new(move |handles| {
        let fut = setup(handles);
        async move { fut.await.map(|value| Arc::new(value) as FixtureValue) }.boxed()
    })
}

/// Read-only snapshot of the Ready fixture values, handed by value to setup
/// and teardown closures
#[derive(Clone)]
pub struct FixtureHandles {
    values: HashMap<FixtureId, FixtureValue>,
    names: HashMap<&'static str, FixtureId>,
}

impl FixtureHandles {
    /// Fetch a dependency's value.
    pub fn get<T: Send + Sync + 'static>(&self, key: FixtureKey<T>) -> Result<Arc<T>> {
        let value = self
            .values
            .get(&key.id)
            .cloned()
            .ok_or(Error::FixtureUnavailable {
                fixture: key.name,
                message: "not set up in this test".to_string(),
            })?;
        value.downcast::<T>().map_err(|_| Error::FixtureUnavailable {
            fixture: key.name,
            message: "value had an unexpected type".to_string(),
        })
    }

    /// Fetch by name, for callers without a typed key.
    pub fn get_by_name<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let id = self
            .names
            .get(name)
            .ok_or_else(|| Error::UnknownFixture(name.to_string()))?;
        let value = self
            .values
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownFixture(name.to_string()))?;
        value
            .downcast::<T>()
            .map_err(|_| Error::UnknownFixture(format!("{name} has an unexpected type")))
    }
}

/// Per-test, per-fixture lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    Unrequested,
    SettingUp,
    Ready,
    TearingDown,
    Done,
    Failed,
}

struct Slot {
    state: FixtureState,
    value: Option<FixtureValue>,
    failure: Option<String>,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: FixtureState::Unrequested,
            value: None,
            failure: None,
        }
    }
}

/// A teardown failure, collected rather than propagated
#[derive(Debug)]
pub struct TeardownFailure {
    pub fixture: &'static str,
    pub error: Error,
}

struct RigInner {
    slots: Vec<Slot>,
    realized: Vec<FixtureId>,
}

/// One test's isolated instantiation of a fixture graph.
///
/// The rig itself is only locked for state transitions; setup and teardown
/// futures run unlocked, one at a time, in the cooperative order the test
/// body requests them.
pub struct TestRig {
    graph: Arc<FixtureGraph>,
    inner: Mutex<RigInner>,
}

impl TestRig {
    pub fn new(graph: Arc<FixtureGraph>) -> Self {
        let slots = (0..graph.len()).map(|_| Slot::new()).collect();
        Self {
            graph,
            inner: Mutex::new(RigInner {
                slots,
                realized: Vec::new(),
            }),
        }
    }

    /// Resolve a fixture, setting up its not-yet-instantiated dependencies
    /// first. Setup runs at most once per test.
    pub async fn resolve<T: Send + Sync + 'static>(&self, key: FixtureKey<T>) -> Result<Arc<T>> {
        self.instantiate(key.id).await?;
        self.value(key)
    }

    /// Value of an already-Ready fixture.
    pub fn value<T: Send + Sync + 'static>(&self, key: FixtureKey<T>) -> Result<Arc<T>> {
        let inner = self.inner.lock().unwrap();
        let slot = &inner.slots[key.id.0];
        match (&slot.state, &slot.value) {
            (FixtureState::Ready, Some(value)) => {
                value
                    .clone()
                    .downcast::<T>()
                    .map_err(|_| Error::FixtureUnavailable {
                        fixture: key.name,
                        message: "value had an unexpected type".to_string(),
                    })
            }
            _ => Err(Error::FixtureUnavailable {
                fixture: key.name,
                message: format!("in state {:?}", slot.state),
            }),
        }
    }

    /// Lifecycle state of a fixture within this test.
    pub fn state(&self, id: FixtureId) -> FixtureState {
        self.inner.lock().unwrap().slots[id.0].state
    }

    /// Names of the fixtures that reached Ready, in realized setup order.
    pub fn setup_order(&self) -> Vec<&'static str> {
        self.inner
            .lock()
            .unwrap()
            .realized
            .iter()
            .map(|id| self.graph.def(*id).name)
            .collect()
    }

    fn instantiate(&self, id: FixtureId) -> BoxFuture<'_, Result<()>> {
        async move {
            let name = self.graph.def(id).name;
            {
                let mut inner = self.inner.lock().unwrap();
                match inner.slots[id.0].state {
                    FixtureState::Ready => return Ok(()),
                    FixtureState::Unrequested => {
                        inner.slots[id.0].state = FixtureState::SettingUp;
                    }
                    FixtureState::SettingUp => {
                        // Re-entered while setting up: the fixture reached
                        // itself through its own dependency closure.
                        return Err(Error::FixtureCycle(name.to_string()));
                    }
                    FixtureState::Failed => {
                        return Err(Error::FixtureUnavailable {
                            fixture: name,
                            message: inner.slots[id.0]
                                .failure
                                .clone()
                                .unwrap_or_else(|| "setup previously failed".to_string()),
                        });
                    }
                    state @ (FixtureState::TearingDown | FixtureState::Done) => {
                        return Err(Error::FixtureUnavailable {
                            fixture: name,
                            message: format!("in state {state:?}"),
                        });
                    }
                }
            }

            for dep in self.graph.def(id).deps.clone() {
                if let Err(e) = self.instantiate(dep).await {
                    let mut inner = self.inner.lock().unwrap();
                    inner.slots[id.0].state = FixtureState::Failed;
                    inner.slots[id.0].failure = Some(e.to_string());
                    return Err(e);
                }
            }

            debug!(fixture = name, "setting up");
            let setup = self.graph.def(id).setup.clone();
            let handles = self.handles();
            match setup(handles).await {
                Ok(value) => {
                    let mut inner = self.inner.lock().unwrap();
                    inner.slots[id.0].state = FixtureState::Ready;
                    inner.slots[id.0].value = Some(value);
                    inner.realized.push(id);
                    Ok(())
                }
                Err(e) => {
                    let wrapped = Error::FixtureSetup {
                        fixture: name,
                        source: Box::new(e),
                    };
                    let mut inner = self.inner.lock().unwrap();
                    inner.slots[id.0].state = FixtureState::Failed;
                    inner.slots[id.0].failure = Some(wrapped.to_string());
                    Err(wrapped)
                }
            }
        }
        .boxed()
    }

    /// Tear down every Ready fixture, last realized first.
    ///
    /// Failures are collected and returned; one fixture's failing teardown
    /// never prevents the remaining teardowns from running.
    pub async fn teardown_all(&self) -> Vec<TeardownFailure> {
        let mut failures = Vec::new();
        let order: Vec<FixtureId> = {
            let inner = self.inner.lock().unwrap();
            inner.realized.clone()
        };

        for id in order.into_iter().rev() {
            let name = self.graph.def(id).name;
            let value = {
                let mut inner = self.inner.lock().unwrap();
                if inner.slots[id.0].state != FixtureState::Ready {
                    continue;
                }
                inner.slots[id.0].state = FixtureState::TearingDown;
                inner.slots[id.0].value.take()
            };

            match (self.graph.def(id).teardown.clone(), value) {
                (Some(teardown), Some(value)) => {
                    debug!(fixture = name, "tearing down");
                    let handles = self.handles();
                    let outcome = teardown(value, handles).await;
                    let mut inner = self.inner.lock().unwrap();
                    match outcome {
                        Ok(()) => inner.slots[id.0].state = FixtureState::Done,
                        Err(e) => {
                            let wrapped = Error::FixtureTeardown {
                                fixture: name,
                                source: Box::new(e),
                            };
                            warn!(fixture = name, error = %wrapped, "teardown failed");
                            failures.push(TeardownFailure {
                                fixture: name,
                                error: wrapped,
                            });
                            inner.slots[id.0].state = FixtureState::Failed;
                        }
                    }
                }
                _ => {
                    self.inner.lock().unwrap().slots[id.0].state = FixtureState::Done;
                }
            }
        }

        failures
    }

    fn handles(&self) -> FixtureHandles {
        let inner = self.inner.lock().unwrap();
        let mut values = HashMap::new();
        for (index, slot) in inner.slots.iter().enumerate() {
            if slot.state == FixtureState::Ready {
                if let Some(value) = &slot.value {
                    values.insert(FixtureId(index), value.clone());
                }
            }
        }
        FixtureHandles {
            values,
            names: self.graph.names.clone(),
        }
    }
}

/// Result of one test run, teardown outcome included
#[derive(Debug)]
pub struct TestReport {
    pub name: String,
    pub outcome: Result<()>,
    pub teardown_failures: Vec<TeardownFailure>,
    pub setup_order: Vec<&'static str>,
    pub teardown_order: Vec<&'static str>,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok() && self.teardown_failures.is_empty()
    }

    /// Collapse into a single result; the body's failure wins over teardown
    /// failures when both happened.
    pub fn into_result(mut self) -> Result<()> {
        self.outcome?;
        match self.teardown_failures.pop() {
            None => Ok(()),
            Some(failure) => Err(failure.error),
        }
    }
}

/// Run one test body against a fixture graph.
///
/// The body resolves whatever fixtures it declares; afterwards every fixture
/// that reached Ready is torn down in reverse realized order, whether the
/// body returned, failed, or panicked.
pub async fn run<F>(graph: Arc<FixtureGraph>, name: &str, body: F) -> TestReport
where
    F: FnOnce(Arc<TestRig>) -> BoxFuture<'static, Result<()>>,
{
    info!(test = name, "running");
    let rig = Arc::new(TestRig::new(graph));

    let outcome = match AssertUnwindSafe(body(rig.clone())).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(Error::TestPanicked(panic_message(payload.as_ref()))),
    };

    let setup_order = rig.setup_order();
    let teardown_failures = rig.teardown_all().await;
    let teardown_order: Vec<&'static str> = setup_order.iter().rev().copied().collect();

    match &outcome {
        Ok(()) => info!(test = name, "passed"),
        Err(e) => warn!(test = name, error = %e, "failed"),
    }

    TestReport {
        name: name.to_string(),
        outcome,
        teardown_failures,
        setup_order,
        teardown_order,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
