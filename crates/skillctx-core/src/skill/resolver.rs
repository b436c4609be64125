//! The resolver service: the host agent's entry point.
//!
//! Holds the active [`CorpusIndex`] behind `RwLock<Arc<_>>`. Queries take
//! the read lock only long enough to clone the `Arc`, then run the whole
//! pipeline against that snapshot without further locking. Reloads build
//! the new index outside the lock, serialized by a separate reload guard,
//! and swap it in with one pointer write. Readers see the old index or the
//! complete new one, never a mix.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use skillctx_types::bundle::{ExcludedSkill, ExclusionReason, InjectionBundle};
use skillctx_types::config::GlobalConfig;
use skillctx_types::error::{ConfigError, LoadError, QueryError, SkillNotFound};
use skillctx_types::query::{Budget, ContextSignals, QueryContext};
use skillctx_types::skill::{RawSkillRecord, SkillRecord};

use super::expander::expand;
use super::index::CorpusIndex;
use super::matcher::match_skills;
use super::packer::pack;
use super::ranker::rank;
use super::tokens::{CharRatioEstimator, TokenEstimator};

pub struct SkillResolver {
    config: GlobalConfig,
    estimator: Arc<dyn TokenEstimator>,
    index: RwLock<Arc<CorpusIndex>>,
    reload_guard: Mutex<()>,
}

impl SkillResolver {
    /// Resolver with an empty corpus (generation 0) and the character-ratio
    /// estimator from `config`.
    pub fn new(config: GlobalConfig) -> Result<Self, ConfigError> {
        let estimator = Arc::new(CharRatioEstimator::from_config(&config.estimator));
        Self::with_estimator(config, estimator)
    }

    /// Resolver using a caller-supplied token estimator.
    pub fn with_estimator(
        config: GlobalConfig,
        estimator: Arc<dyn TokenEstimator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            estimator,
            index: RwLock::new(Arc::new(CorpusIndex::empty(0))),
            reload_guard: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// The currently active index.
    pub fn snapshot(&self) -> Arc<CorpusIndex> {
        let guard = self.index.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().generation()
    }

    /// Query API: resolve query text and signals into a bundle.
    pub fn resolve_skills(
        &self,
        query_text: &str,
        signals: &ContextSignals,
        budget_tokens: u32,
    ) -> InjectionBundle {
        let query = QueryContext::new(query_text).with_signals(signals.clone());
        self.resolve(&query, Budget::tokens(budget_tokens))
    }

    /// Run match, expand, rank, and pack against the active index.
    ///
    /// Never fails: a query that cannot be processed yields an empty bundle
    /// whose `diagnostic` says why.
    pub fn resolve(&self, query: &QueryContext, budget: Budget) -> InjectionBundle {
        let index = self.snapshot();
        let start = Instant::now();

        match self.run_pipeline(&index, query, budget) {
            Ok(bundle) => {
                tracing::debug!(
                    generation = bundle.generation,
                    included = bundle.skills.len(),
                    excluded = bundle.excluded.len(),
                    tokens = bundle.total_tokens,
                    budget = budget.get(),
                    truncated = bundle.truncated,
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "Resolved skills"
                );
                bundle
            }
            Err(e) => {
                tracing::warn!(
                    generation = index.generation(),
                    error = %e,
                    "Query degraded to empty bundle"
                );
                InjectionBundle::degraded(budget, index.generation(), e.to_string())
            }
        }
    }

    fn run_pipeline(
        &self,
        index: &CorpusIndex,
        query: &QueryContext,
        budget: Budget,
    ) -> Result<InjectionBundle, QueryError> {
        let len = query.text.chars().count();
        if len > self.config.max_query_chars {
            return Err(QueryError::QueryTooLong {
                len,
                max: self.config.max_query_chars,
            });
        }

        let matched = match_skills(index, query, &self.config.scoring);
        if matched.is_empty() {
            return Ok(InjectionBundle::empty(budget, index.generation()));
        }

        let expansion = &self.config.expansion;
        let expanded = expand(index, &matched, expansion.max_hops, expansion.decay);
        let ranking = rank(index, expanded);

        let mut bundle = pack(&ranking.ranked, index, budget);
        bundle
            .excluded
            .extend(ranking.superseded.into_iter().map(|(id, by)| ExcludedSkill {
                id,
                reason: ExclusionReason::Superseded { by },
            }));
        Ok(bundle)
    }

    /// Direct-lookup API. Ignores scoring and `context: manual`.
    pub fn get_skill_by_id(&self, id: &str) -> Result<Arc<SkillRecord>, SkillNotFound> {
        self.snapshot()
            .get(id)
            .cloned()
            .ok_or_else(|| SkillNotFound(id.to_owned()))
    }

    /// Reload API: build a new index from `raw` and make it active.
    ///
    /// On error the previously active index keeps serving.
    pub fn reload_corpus(
        &self,
        raw: Vec<RawSkillRecord>,
    ) -> Result<Arc<CorpusIndex>, LoadError> {
        let _reload = self
            .reload_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let previous = self.generation();
        let generation = previous + 1;
        let start = Instant::now();

        let index = match CorpusIndex::load(raw, self.estimator.as_ref(), generation) {
            Ok(index) => Arc::new(index),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    active_generation = previous,
                    "Corpus reload failed, keeping previous index"
                );
                return Err(e);
            }
        };

        {
            let mut active = self.index.write().unwrap_or_else(PoisonError::into_inner);
            *active = Arc::clone(&index);
        }

        tracing::info!(
            generation,
            skills = index.len(),
            warnings = index.warnings().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Corpus index swapped in"
        );

        Ok(index)
    }
}
