//! View index warmup.
//!
//! CouchDB builds a view index lazily, on the first query that reads it. On a
//! large database that first query can take minutes. Warming runs one cheap
//! query (`limit=1&reduce=false`) per view right after a deploy, so the
//! indexes are built before real traffic needs them.
//!
//! Querying one view of a design document builds the index of every view in
//! that document, so [`WarmupScope::FirstView`] is enough for most setups.

use std::collections::HashMap;

use couchwarm_core::{HttpClient, ViewParams, ViewTask, WarmupFailure};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{Database, Error, HyperClient, Result};

/// Which views of each design document get a warmup query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WarmupScope {
    /// The first view declared by each design document.
    #[default]
    FirstView,
    /// Every view declared by each design document.
    AllViews,
}

/// What a failed warmup query does to the outcome of [`Warmup::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure and report it in [`WarmupReport`].
    #[default]
    Log,
    /// Turn any failure into [`Error::Warmup`].
    Fail,
}

/// Parameters of a warmup query: one row, no reduce.
#[must_use]
pub fn default_params() -> ViewParams {
    ViewParams::new().with("limit", 1).with("reduce", false)
}

/// Outcome of a warmup run.
#[derive(Debug, Default)]
pub struct WarmupReport {
    dispatched: usize,
    skipped: Vec<ViewTask>,
    failures: Vec<(ViewTask, Error)>,
}

impl WarmupReport {
    /// Number of warmup queries sent.
    #[must_use]
    pub const fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// Number of warmup queries that answered successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.dispatched - self.failures.len()
    }

    /// Tasks left out because the design document had no usable name or view.
    #[must_use]
    pub fn skipped(&self) -> &[ViewTask] {
        &self.skipped
    }

    /// Failed queries with their error.
    #[must_use]
    pub fn failures(&self) -> &[(ViewTask, Error)] {
        &self.failures
    }

    /// No query failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Warmup of every design document of one database.
///
/// # Example
///
/// ```ignore
/// use couchwarm::{Database, FailurePolicy, Warmup, WarmupScope};
///
/// let db = Database::connect("http://localhost:5984/orders")?;
/// let report = Warmup::new(db)
///     .scope(WarmupScope::AllViews)
///     .failure_policy(FailurePolicy::Fail)
///     .run()
///     .await?;
/// println!("{} views warmed", report.succeeded());
/// ```
#[derive(Debug, Clone)]
pub struct Warmup<C = HyperClient> {
    db: Database<C>,
    scope: WarmupScope,
    failure_policy: FailurePolicy,
    params: ViewParams,
}

impl<C> Warmup<C> {
    /// Warmup of `db` with the default scope, policy and query parameters.
    #[must_use]
    pub fn new(db: Database<C>) -> Self {
        Self {
            db,
            scope: WarmupScope::default(),
            failure_policy: FailurePolicy::default(),
            params: default_params(),
        }
    }

    /// Which views to query.
    #[must_use]
    pub fn scope(mut self, scope: WarmupScope) -> Self {
        self.scope = scope;
        self
    }

    /// How failed queries affect the result.
    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Parameters sent with every warmup query.
    #[must_use]
    pub fn params(mut self, params: ViewParams) -> Self {
        self.params = params;
        self
    }

    /// The database being warmed.
    #[must_use]
    pub fn database(&self) -> &Database<C> {
        &self.db
    }
}

impl<C> Warmup<C>
where
    C: HttpClient + Clone + Send + Sync + 'static,
{
    /// List the view tasks of the database, in design document order.
    ///
    /// Tasks with a missing design or view name are included; [`Warmup::run`]
    /// skips them.
    ///
    /// # Errors
    ///
    /// Returns an error if the design documents cannot be listed.
    pub async fn tasks(&self) -> Result<Vec<ViewTask>> {
        let docs = self.db.design_docs().await?;
        let tasks = docs
            .iter()
            .flatten()
            .flat_map(|doc| match self.scope {
                WarmupScope::FirstView => vec![ViewTask::first_view(doc)],
                WarmupScope::AllViews => {
                    let tasks = ViewTask::all_views(doc);
                    if tasks.is_empty() {
                        vec![ViewTask::first_view(doc)]
                    } else {
                        tasks
                    }
                }
            })
            .collect();
        Ok(tasks)
    }

    /// List the design documents, then query every view task concurrently.
    ///
    /// Listing finishes before the first query is sent. Queries run in
    /// parallel, limited only by the client's connection pool, and `run`
    /// returns once all of them have answered.
    ///
    /// # Errors
    ///
    /// - the design documents cannot be listed
    /// - [`Error::Warmup`] when a query fails under [`FailurePolicy::Fail`]
    pub async fn run(self) -> Result<WarmupReport> {
        let tasks = self.tasks().await?;

        let mut report = WarmupReport::default();
        let mut queries = JoinSet::new();
        let mut pending = HashMap::new();

        for task in tasks {
            let Some((design, view)) = task.parts() else {
                debug!(%task, "skipping design document without a view");
                report.skipped.push(task);
                continue;
            };

            let db = self.db.clone();
            let design = design.to_string();
            let view = view.to_string();
            let params = self.params.clone();
            let handle = queries.spawn(async move {
                db.view(&design, &view, Some(params)).await.map(drop)
            });
            pending.insert(handle.id(), task);
        }

        report.dispatched = pending.len();
        info!(
            database = self.db.database_name(),
            dispatched = report.dispatched,
            skipped = report.skipped.len(),
            "warmup queries dispatched"
        );

        while let Some(joined) = queries.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(join_error) => (join_error.id(), Err(Error::task(join_error.to_string()))),
            };
            let Some(task) = pending.remove(&id) else {
                continue;
            };
            match result {
                Ok(()) => debug!(%task, "view warmed"),
                Err(error) => {
                    warn!(%task, %error, "warmup query failed");
                    report.failures.push((task, error));
                }
            }
        }

        info!(
            database = self.db.database_name(),
            succeeded = report.succeeded(),
            failed = report.failures.len(),
            "warmup finished"
        );

        if self.failure_policy == FailurePolicy::Fail && !report.is_clean() {
            return Err(WarmupFailure::new(report.dispatched, report.failures).into());
        }
        Ok(report)
    }
}

/// Database to warm: a URL, or an existing handle.
#[derive(Debug, Clone)]
pub enum WarmupTarget {
    /// Database URL; a handle with its own unbounded pool is built for it.
    Url(String),
    /// Existing handle, used as-is.
    Database(Database),
}

impl From<&str> for WarmupTarget {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for WarmupTarget {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<Database> for WarmupTarget {
    fn from(db: Database) -> Self {
        Self::Database(db)
    }
}

/// Completion callback of [`warm_up`]: `None` on success, the error otherwise.
pub type WarmupCallback = Box<dyn FnOnce(Option<&Error>) + Send>;

/// Warm every design document of `target` with the default settings.
///
/// `username` and `password` are only used for a URL target, and only when
/// both are given.
///
/// # Errors
///
/// Without a callback, listing or connection errors are returned. With a
/// callback, they are handed to it and `Ok(())` is returned.
pub async fn warm_up(
    target: impl Into<WarmupTarget>,
    username: Option<&str>,
    password: Option<&str>,
    callback: Option<WarmupCallback>,
) -> Result<()> {
    let outcome = match target.into() {
        WarmupTarget::Url(url) => Database::with_credentials(url, username, password),
        WarmupTarget::Database(db) => Ok(db),
    };
    let outcome = match outcome {
        Ok(db) => Warmup::new(db).run().await.map(drop),
        Err(error) => Err(error),
    };

    match (outcome, callback) {
        (Ok(()), Some(callback)) => {
            callback(None);
            Ok(())
        }
        (Err(error), Some(callback)) => {
            callback(Some(&error));
            Ok(())
        }
        (outcome, None) => outcome,
    }
}
