// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};

use mention_entities::Mention;
use strum_macros::Display;
use tracing::{trace, warn};

use crate::{MentionDataSource, MentionsConfig, MentionsError};

/// How a mention attempt was begun, passed through to the data source so it
/// can scope its lookup.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum SearchType {
    /// Begun by a run of consecutive word characters.
    Implicit,
    /// Begun by a control character.
    Explicit,
    /// An un-prefixed fetch of starting suggestions, before the user has
    /// typed anything.
    Initial,
}

/// One lookup request handed to the data source.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub key_string: String,
    pub search_type: SearchType,
    /// The control character that began the mention, for explicit searches.
    pub control_character: Option<char>,
    /// Buffer index where the completed mention will begin.
    pub anchor_location: usize,
    /// Monotonic epoch used for staleness checks.
    pub generation: u64,
}

#[derive(Debug)]
pub(crate) struct ResultBatch {
    generation: u64,
    results: Vec<Mention>,
    dedupe: bool,
    is_complete: bool,
}

/// The completion handle given to the data source alongside a [`Query`].
///
/// The sink may be called from any thread; batches are marshalled back to
/// the event thread and applied when the controller next drains. Per the
/// data source contract it may be called repeatedly only while every
/// previous call passed `is_complete = false` and the first call carried a
/// non-empty batch; anything delivered after that is discarded.
#[derive(Clone, Debug)]
pub struct ResultSink {
    generation: u64,
    sender: Sender<ResultBatch>,
}

impl ResultSink {
    pub fn deliver(&self, results: Vec<Mention>, dedupe: bool, is_complete: bool) {
        let _ = self.sender.send(ResultBatch {
            generation: self.generation,
            results,
            dedupe,
            is_complete,
        });
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What a drain pass observed, in arrival order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PipelineEvent {
    Results { is_complete: bool },
    EmptyFinal,
}

/// Owns the query epoch counter and the marshalling channel, applies the
/// dedup and staleness rules, and coalesces keystroke-driven queries while
/// the cooldown window is open.
#[derive(Debug)]
pub(crate) struct QueryPipeline {
    generation: u64,
    sender: Sender<ResultBatch>,
    receiver: Receiver<ResultBatch>,
    results: Vec<Mention>,
    complete: bool,
    awaiting_first_batch: bool,
    dispatched_at: Option<Instant>,
    pending: Option<Query>,
    last_final_at: Option<Instant>,
}

impl QueryPipeline {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            generation: 0,
            sender,
            receiver,
            results: Vec::new(),
            complete: false,
            awaiting_first_batch: false,
            dispatched_at: None,
            pending: None,
            last_final_at: None,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn results(&self) -> &[Mention] {
        &self.results
    }

    pub(crate) fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    pub(crate) fn awaiting_first_batch(&self) -> bool {
        self.awaiting_first_batch
    }

    /// Start a new query epoch. Everything still in flight becomes stale.
    /// While the cooldown window is open the query is parked and sent on a
    /// later drain (or replaced by a newer one).
    pub(crate) fn dispatch(
        &mut self,
        key_string: String,
        search_type: SearchType,
        control_character: Option<char>,
        anchor_location: usize,
        config: &MentionsConfig,
        data_source: &mut MentionDataSource,
    ) {
        self.generation += 1;
        self.complete = false;
        self.awaiting_first_batch = true;
        self.dispatched_at = None;
        let query = Query {
            key_string,
            search_type,
            control_character,
            anchor_location,
            generation: self.generation,
        };
        if self.in_cooldown(config) {
            self.pending = Some(query);
        } else {
            self.pending = None;
            self.send(query, data_source);
        }
    }

    fn in_cooldown(&self, config: &MentionsConfig) -> bool {
        config.query_cooldown_interval > Duration::ZERO
            && self
                .last_final_at
                .is_some_and(|at| at.elapsed() < config.query_cooldown_interval)
    }

    fn send(&mut self, query: Query, data_source: &mut MentionDataSource) {
        trace!(
            generation = query.generation,
            key_string = %query.key_string,
            search_type = %query.search_type,
            "dispatching mention query"
        );
        self.dispatched_at = Some(Instant::now());
        let sink = ResultSink {
            generation: query.generation,
            sender: self.sender.clone(),
        };
        (data_source.retrieve_entities)(&query, sink);
    }

    /// Send a parked query once its cooldown window has passed.
    fn flush_pending(
        &mut self,
        config: &MentionsConfig,
        data_source: &mut MentionDataSource,
    ) {
        if self.pending.is_some() && !self.in_cooldown(config) {
            let query = self.pending.take().expect("pending query checked above");
            self.send(query, data_source);
        }
    }

    /// Apply every batch delivered since the last drain, in order, and
    /// report what changed. Must run on the event thread; this is the
    /// marshalling point for sinks called from other threads.
    pub(crate) fn drain(
        &mut self,
        config: &MentionsConfig,
        data_source: &mut MentionDataSource,
    ) -> Vec<PipelineEvent> {
        self.flush_pending(config, data_source);

        let mut events = Vec::new();
        while let Ok(batch) = self.receiver.try_recv() {
            if batch.generation != self.generation {
                trace!(
                    batch_generation = batch.generation,
                    current_generation = self.generation,
                    "{}",
                    MentionsError::StaleQueryResult
                );
                continue;
            }
            if self.complete {
                warn!("{}", MentionsError::DelegateContractViolation);
                continue;
            }
            if self.awaiting_first_batch {
                self.awaiting_first_batch = false;
                self.results.clear();
                if batch.results.is_empty() {
                    self.complete = true;
                    events.push(PipelineEvent::EmptyFinal);
                    continue;
                }
            }
            self.extend_deduped(batch.results, batch.dedupe);
            if batch.is_complete {
                self.complete = true;
                self.last_final_at = Some(Instant::now());
            }
            events.push(PipelineEvent::Results {
                is_complete: batch.is_complete,
            });
        }

        if let Some(event) = self.check_timeout(config) {
            events.push(event);
        }
        events
    }

    fn check_timeout(&mut self, config: &MentionsConfig) -> Option<PipelineEvent> {
        if !self.awaiting_first_batch || self.pending.is_some() {
            return None;
        }
        let dispatched_at = self.dispatched_at?;
        if config.query_timeout > Duration::ZERO
            && dispatched_at.elapsed() >= config.query_timeout
        {
            trace!(
                generation = self.generation,
                "query timed out, treating as empty"
            );
            self.awaiting_first_batch = false;
            self.complete = true;
            self.results.clear();
            Some(PipelineEvent::EmptyFinal)
        } else {
            None
        }
    }

    fn extend_deduped(&mut self, batch: Vec<Mention>, dedupe: bool) {
        if !dedupe {
            self.results.extend(batch);
            return;
        }
        let mut seen: HashSet<String> = self
            .results
            .iter()
            .map(|m| m.unique_id().to_owned())
            .collect();
        for mention in batch {
            if seen.insert(mention.unique_id().to_owned()) {
                self.results.push(mention);
            }
        }
    }

    /// Forget the current session's results and anything parked or in
    /// flight. The generation counter is not rewound, so late completions
    /// stay stale forever.
    pub(crate) fn reset(&mut self) {
        self.results.clear();
        self.complete = false;
        self.awaiting_first_batch = false;
        self.dispatched_at = None;
        self.pending = None;
        // Drop batches already queued for dead generations.
        while self.receiver.try_recv().is_ok() {}
    }
}
