// file: src/pipeline/orchestrator.rs
// description: drives search, filtering, summarization and delivery per query with bounded retries
// reference: orchestrates the sequential digest workflow

use crate::config::{ArticleFailurePolicy, Config};
use crate::error::{PipelineError, Result};
use crate::models::{ArticleId, DigestEntry};
use crate::notifier::{ChatNotifier, DeliveryPolicy, deliver_with_retry};
use crate::pipeline::batcher::MessageBatcher;
use crate::pipeline::progress::{ProgressTracker, QueryStats};
use crate::pubmed::{LiteratureSource, PublicationTypeFilter, SearchWindow};
use crate::summarizer::Summarizer;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// States of the per-query retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting,
    RateLimited,
    TransientError,
    Success,
    Abandoned,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limit_delay: Duration,
    pub error_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.pipeline.max_attempts.max(1),
            rate_limit_delay: config.pipeline.rate_limit_delay(),
            error_delay: config.pipeline.error_delay(),
        }
    }

    /// State entered when a pass fails. Rate limits and other failures share
    /// one attempt budget.
    pub fn failure_state(error: &PipelineError) -> RetryState {
        if error.is_rate_limit() {
            RetryState::RateLimited
        } else {
            RetryState::TransientError
        }
    }

    /// From a failure state, either wait and go back to `Attempting` or give up.
    /// `attempts` is the number of passes already run for the query.
    pub fn next(&self, state: RetryState, attempts: u32) -> (RetryState, Option<Duration>) {
        let delay = match state {
            RetryState::RateLimited => self.rate_limit_delay,
            RetryState::TransientError => self.error_delay,
            other => return (other, None),
        };

        if attempts < self.max_attempts {
            (RetryState::Attempting, Some(delay))
        } else {
            (RetryState::Abandoned, None)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Completed { attempts: u32, stats: QueryStats },
    Abandoned { attempts: u32, last_error: String },
}

impl QueryOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, QueryOutcome::Completed { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub search_date: String,
    pub outcomes: Vec<(String, QueryOutcome)>,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_completed()).count()
    }

    pub fn abandoned(&self) -> usize {
        self.outcomes.len() - self.completed()
    }

    pub fn messages_posted(&self) -> usize {
        self.completed_stats().map(|s| s.messages_posted).sum()
    }

    pub fn messages_failed(&self) -> usize {
        self.completed_stats().map(|s| s.messages_failed).sum()
    }

    fn completed_stats(&self) -> impl Iterator<Item = &QueryStats> {
        self.outcomes.iter().filter_map(|(_, o)| match o {
            QueryOutcome::Completed { stats, .. } => Some(stats),
            QueryOutcome::Abandoned { .. } => None,
        })
    }
}

pub struct DigestOrchestrator<S, M, N> {
    config: Config,
    source: S,
    summarizer: M,
    notifier: N,
    filter: PublicationTypeFilter,
    retry: RetryPolicy,
    delivery: DeliveryPolicy,
    show_progress: bool,
    colored: bool,
}

impl<S, M, N> DigestOrchestrator<S, M, N>
where
    S: LiteratureSource,
    M: Summarizer,
    N: ChatNotifier,
{
    pub fn new(config: Config, source: S, summarizer: M, notifier: N) -> Self {
        let filter = PublicationTypeFilter::new(config.pipeline.publication_types.clone());
        let retry = RetryPolicy::from_config(&config);
        let delivery = DeliveryPolicy::from(&config.webhook);

        Self {
            config,
            source,
            summarizer,
            notifier,
            filter,
            retry,
            delivery,
            show_progress: false,
            colored: false,
        }
    }

    pub fn with_progress(mut self, visible: bool, colored: bool) -> Self {
        self.show_progress = visible;
        self.colored = colored;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn summarizer(&self) -> &M {
        &self.summarizer
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Runs every configured query in order. One query's failure never stops the next.
    pub async fn run(&self, window: &SearchWindow) -> RunReport {
        info!(
            "Processing {} queries for {}",
            self.config.pipeline.queries.len(),
            window.formatted()
        );

        let mut report = RunReport {
            search_date: window.formatted(),
            outcomes: Vec::with_capacity(self.config.pipeline.queries.len()),
        };

        for query in &self.config.pipeline.queries {
            let outcome = self.run_query(query, window).await;
            report.outcomes.push((query.clone(), outcome));
        }

        report
    }

    pub async fn run_query(&self, query: &str, window: &SearchWindow) -> QueryOutcome {
        let mut state = RetryState::Attempting;
        let mut attempts = 0;
        let mut stats: Option<QueryStats> = None;
        let mut last_error: Option<PipelineError> = None;

        loop {
            match state {
                RetryState::Attempting => {
                    attempts += 1;
                    let tracker = ProgressTracker::new(query, self.show_progress, self.colored);

                    match self.run_pass(query, window, &tracker).await {
                        Ok(pass_stats) => {
                            info!(
                                "Query '{}' done in {:.1}s: {} qualifying of {} ids, {} messages",
                                query,
                                tracker.elapsed().as_secs_f64(),
                                pass_stats.articles_qualifying,
                                pass_stats.articles_found,
                                pass_stats.messages_total()
                            );
                            stats = Some(pass_stats);
                            state = RetryState::Success;
                        }
                        Err(e) => {
                            state = RetryPolicy::failure_state(&e);
                            last_error = Some(e);
                        }
                    }
                }
                RetryState::RateLimited | RetryState::TransientError => {
                    let (next, delay) = self.retry.next(state, attempts);
                    let reason = last_error
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default();

                    if let Some(delay) = delay {
                        warn!(
                            "Query '{}' failed ({:?}): {}. Waiting {}s before retry {}/{}",
                            query,
                            state,
                            reason,
                            delay.as_secs(),
                            attempts,
                            self.retry.max_attempts
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        error!(
                            "Maximum retries reached for query '{}' ({}). Skipping to next query",
                            query, reason
                        );
                    }
                    state = next;
                }
                RetryState::Success => {
                    return QueryOutcome::Completed {
                        attempts,
                        stats: stats.take().unwrap_or_default(),
                    };
                }
                RetryState::Abandoned => {
                    return QueryOutcome::Abandoned {
                        attempts,
                        last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
                    };
                }
            }
        }
    }

    /// One full pass from the search step. Batches delivered before a failure
    /// are not withdrawn; a retry starts over and posts again.
    async fn run_pass(
        &self,
        query: &str,
        window: &SearchWindow,
        tracker: &ProgressTracker,
    ) -> Result<QueryStats> {
        let ids = self.source.search_ids(query, window).await?;
        info!("{}: {} article ids", query, ids.len());
        tracker.set_found(ids.len());

        let mut batcher = MessageBatcher::new(
            query,
            &window.formatted(),
            self.config.pipeline.max_articles_per_message,
        );

        for id in &ids {
            tracker.inc_processed();

            match self.process_article(query, id).await {
                Ok(Some(entry)) => {
                    tracker.inc_qualifying();
                    if let Some(batch) = batcher.push(entry) {
                        let delivered = deliver_with_retry(&self.notifier, &batch, self.delivery).await;
                        tracker.record_delivery(delivered);
                    }
                }
                Ok(None) => {}
                Err(e)
                    if self.config.pipeline.article_failure_policy
                        == ArticleFailurePolicy::SkipArticle
                        && !e.is_rate_limit() =>
                {
                    warn!("Skipping article {} for '{}': {}", id, query, e);
                    tracker.inc_skipped();
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(batch) = batcher.finish() {
            let delivered = deliver_with_retry(&self.notifier, &batch, self.delivery).await;
            tracker.record_delivery(delivered);
        }

        Ok(tracker.get_stats())
    }

    /// Returns `None` for articles outside the publication-type allow-list.
    async fn process_article(&self, query: &str, id: &ArticleId) -> Result<Option<DigestEntry>> {
        let summary = self.source.fetch_summary(id).await?;
        let accepted = self.filter.accepts(&summary.publication_types);
        debug!(
            "ID {} pubtype: {:?}, accepted: {}",
            id, summary.publication_types, accepted
        );

        if !accepted {
            return Ok(None);
        }

        let abstract_text = self.source.fetch_abstract(id).await?;
        debug!("ID {} title: {}", id, summary.title);

        let digest = self
            .summarizer
            .summarize(&summary.title, &abstract_text)
            .await?;

        Ok(Some(DigestEntry::new(id.clone(), query, digest)))
    }
}
