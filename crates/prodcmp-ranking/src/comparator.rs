//! Comparison pipeline orchestration.
//!
//! ```text
//! Resolving -> Fetching -> Normalizing -> Guaranteeing -> Scoring -> Ranked
//! ```
//!
//! Weights are validated before any network access. The base product is
//! located first; candidate strategies then run in batches, and after each
//! batch the aggregate is normalized and checked against the minimum
//! candidate count. Fallback strategies run only when every primary strategy
//! has finished and the minimum is still unmet. A whole-pipeline deadline
//! abandons in-flight strategies but keeps every strategy that finished
//! before it, whatever its position in the batch.

use std::collections::HashSet;
use std::pin::pin;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::{timeout_at, Instant};

use prodcmp_core::{
    AppConfig, Asin, ComparisonResult, Diagnostics, Product, ProductReference, RankedProduct,
    ScoringWeights, WeightOverrides, MIN_CANDIDATES,
};
use prodcmp_scraper::{
    candidate_strategies, normalize_all, resolve_target, FetchTarget, MarketplaceClient,
    RawExtraction, ScraperError, Strategy, StrategyLimits,
};

use crate::error::CompareError;
use crate::guarantee::check_minimum;
use crate::insights::{pros_and_cons, recommendation, SetMedians};
use crate::relevance::select_candidates;
use crate::scorer::score_set;

/// Pipeline stage, logged at each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    Fetching,
    Normalizing,
    Guaranteeing,
    Scoring,
    Ranked,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::Fetching => "fetching",
            Self::Normalizing => "normalizing",
            Self::Guaranteeing => "guaranteeing",
            Self::Scoring => "scoring",
            Self::Ranked => "ranked",
        }
    }
}

/// Pipeline settings, usually built from [`AppConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompareOptions {
    /// Weight overrides from the environment; request overrides win.
    pub weights: WeightOverrides,
    /// Currency assumed for prices without a symbol or code.
    pub default_currency: String,
    pub limits: StrategyLimits,
    pub max_concurrent_strategies: usize,
    /// Cap on candidates kept in the ranking (never below the minimum).
    pub max_candidates: usize,
    pub timeout: Duration,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            weights: WeightOverrides::default(),
            default_currency: "INR".to_owned(),
            limits: StrategyLimits::default(),
            max_concurrent_strategies: 2,
            max_candidates: 8,
            timeout: Duration::from_secs(120),
        }
    }
}

impl From<&AppConfig> for CompareOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            weights: config.weight_overrides,
            default_currency: config.default_currency.clone(),
            limits: StrategyLimits {
                budget: config.strategy_budget,
                max_concurrent_requests: config.max_concurrent_requests,
            },
            max_concurrent_strategies: config.max_concurrent_strategies,
            max_candidates: config.max_candidates,
            timeout: Duration::from_secs(config.pipeline_timeout_secs),
        }
    }
}

/// One comparison request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompareRequest {
    /// Product name, ASIN, or marketplace URL.
    pub input: String,
    /// Per-request weight overrides, applied over the configured ones.
    pub weights: WeightOverrides,
    /// Per-request deadline; `None` uses the configured timeout.
    pub timeout: Option<Duration>,
}

impl CompareRequest {
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }
}

type StrategyOutcome = (String, Result<Vec<RawExtraction>, ScraperError>);

/// Runs comparisons against one marketplace.
pub struct Comparator {
    client: MarketplaceClient,
    options: CompareOptions,
}

impl Comparator {
    #[must_use]
    pub fn new(client: MarketplaceClient, options: CompareOptions) -> Self {
        Self { client, options }
    }

    /// Builds the marketplace client and options from application config.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Client`] when the base URL or extraction rules
    /// are unusable.
    pub fn from_config(config: &AppConfig) -> Result<Self, CompareError> {
        let client = MarketplaceClient::from_config(config)?;
        Ok(Self::new(client, CompareOptions::from(config)))
    }

    #[must_use]
    pub fn client(&self) -> &MarketplaceClient {
        &self.client
    }

    /// Classifies `input` and resolves what would be fetched first, without
    /// touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InvalidReference`] for unusable input.
    pub fn resolve(&self, input: &str) -> Result<(ProductReference, FetchTarget), CompareError> {
        let reference = ProductReference::classify(input, &[self.client.host()])?;
        let target = resolve_target(&reference, self.client.origin());
        Ok((reference, target))
    }

    /// Runs the full pipeline for one request.
    ///
    /// # Errors
    ///
    /// - [`CompareError::Configuration`]: weights invalid (before any fetch).
    /// - [`CompareError::InvalidReference`]: input unusable, or no base
    ///   product could be obtained for it.
    /// - [`CompareError::InsufficientData`]: fewer than the minimum number of
    ///   complete candidates after every strategy or at the deadline, with
    ///   diagnostics.
    pub async fn compare(&self, request: &CompareRequest) -> Result<ComparisonResult, CompareError> {
        let weights = self.options.weights.merged_with(request.weights).resolve()?;

        log_stage(Stage::Resolving);
        let (reference, target) = self.resolve(&request.input)?;
        tracing::info!(
            input = %request.input,
            kind = reference.kind(),
            "resolved product reference"
        );

        let deadline = Instant::now() + request.timeout.unwrap_or(self.options.timeout);
        let mut diagnostics = Diagnostics::default();

        log_stage(Stage::Fetching);
        let (base, related) = self
            .locate_base(&request.input, &target, deadline, &mut diagnostics)
            .await?;
        tracing::info!(base_id = %base.id, title = %base.title, related = related.len(), "base product located");

        let base_asin = Asin::parse(&base.id);
        let (primary, fallback) = candidate_strategies(&base, &related);

        let mut raws: Vec<RawExtraction> = Vec::new();
        let mut candidates = self
            .run_phase(&primary, &base, base_asin.as_ref(), deadline, &mut raws, &mut diagnostics)
            .await;

        if check_minimum(candidates.len()).is_err() && !diagnostics.timed_out && !fallback.is_empty() {
            tracing::info!(
                found = candidates.len(),
                "minimum not met after primary strategies; escalating to fallback"
            );
            diagnostics.escalated = true;
            candidates = self
                .run_phase(&fallback, &base, base_asin.as_ref(), deadline, &mut raws, &mut diagnostics)
                .await;
        }

        log_stage(Stage::Guaranteeing);
        let cap = self.options.max_candidates.max(MIN_CANDIDATES);
        let selected = select_candidates(&base, candidates, cap);
        if let Err(shortfall) = check_minimum(selected.len()) {
            tracing::warn!(
                found = shortfall.found,
                required = shortfall.required,
                attempted = diagnostics.strategies_attempted.len(),
                blocked = diagnostics.strategies_blocked.len(),
                failed = diagnostics.strategies_failed.len(),
                discarded = diagnostics.records_discarded,
                "not enough comparable products"
            );
            return Err(CompareError::InsufficientData {
                found: shortfall.found,
                required: shortfall.required,
                diagnostics: Box::new(diagnostics),
            });
        }

        log_stage(Stage::Scoring);
        let ranked = rank(&base, selected, &weights);

        log_stage(Stage::Ranked);
        let best = &ranked[0];
        let recommendation = recommendation(best);
        Ok(ComparisonResult {
            best: best.product.clone(),
            base,
            ranked,
            recommendation,
            diagnostics,
        })
    }

    /// Tries the target's own strategy, then (for ASIN targets) a search by
    /// the ASIN, until one yields a product with a title.
    ///
    /// Running out of time here is reported as insufficient data with
    /// nothing found, not as a bad reference.
    async fn locate_base(
        &self,
        input: &str,
        target: &FetchTarget,
        deadline: Instant,
        diagnostics: &mut Diagnostics,
    ) -> Result<(Product, Vec<Asin>), CompareError> {
        let mut strategies = vec![Strategy::for_target(target)];
        if let Some(asin) = target.asin() {
            strategies.push(Strategy::SearchByName {
                keyword: asin.to_string(),
            });
        }

        let mut last_problem = String::from("no strategy returned a product");
        for strategy in &strategies {
            let label = strategy.label();
            diagnostics.strategies_attempted.push(label.clone());

            let outcome = timeout_at(deadline, strategy.run(&self.client, None, self.options.limits)).await;
            let Ok(result) = outcome else {
                tracing::warn!(strategy = %label, "pipeline deadline reached before the base product was found");
                diagnostics.timed_out = true;
                return Err(CompareError::InsufficientData {
                    found: 0,
                    required: MIN_CANDIDATES,
                    diagnostics: Box::new(std::mem::take(diagnostics)),
                });
            };

            match result {
                Ok(raws) => {
                    let outcome = normalize_all(&raws, &self.options.default_currency);
                    diagnostics.records_discarded += outcome.discarded;
                    if let Some(base) = outcome.products.into_iter().next() {
                        let related = raws
                            .into_iter()
                            .next()
                            .map(|raw| raw.related_asins)
                            .unwrap_or_default();
                        return Ok((base, related));
                    }
                    last_problem = format!("{label} found no product page with a title");
                }
                Err(e) => {
                    record_failure(diagnostics, &label, &e);
                    last_problem = e.to_string();
                }
            }
        }

        Err(CompareError::InvalidReference(format!(
            "could not obtain a product for \"{input}\": {last_problem}"
        )))
    }

    /// Runs `strategies` in batches until the minimum is met, the list is
    /// exhausted, or the deadline passes. Returns the complete, deduplicated
    /// candidates built from every extraction collected so far.
    async fn run_phase(
        &self,
        strategies: &[Strategy],
        base: &Product,
        base_asin: Option<&Asin>,
        deadline: Instant,
        raws: &mut Vec<RawExtraction>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Product> {
        let mut candidates = self.candidate_pool(base, raws, diagnostics);
        let batch_size = self.options.max_concurrent_strategies.max(1);

        for batch in strategies.chunks(batch_size) {
            if check_minimum(candidates.len()).is_ok() {
                break;
            }

            diagnostics
                .strategies_attempted
                .extend(batch.iter().map(Strategy::label));

            // Strategies finish in any order; slots restore submission order.
            let mut slots: Vec<Option<StrategyOutcome>> = batch.iter().map(|_| None).collect();
            let mut results = pin!(stream::iter(batch.iter().enumerate())
                .map(|(index, strategy)| async move {
                    let result = strategy.run(&self.client, base_asin, self.options.limits).await;
                    (index, (strategy.label(), result))
                })
                .buffer_unordered(batch_size));

            loop {
                match timeout_at(deadline, results.next()).await {
                    Ok(Some((index, outcome))) => slots[index] = Some(outcome),
                    Ok(None) => break,
                    Err(_) => {
                        tracing::warn!("pipeline deadline reached; abandoning in-flight strategies");
                        diagnostics.timed_out = true;
                        break;
                    }
                }
            }

            for (label, result) in slots.into_iter().flatten() {
                match result {
                    Ok(found) => {
                        tracing::debug!(strategy = %label, records = found.len(), "strategy finished");
                        raws.extend(found);
                    }
                    Err(e) => record_failure(diagnostics, &label, &e),
                }
            }

            log_stage(Stage::Normalizing);
            candidates = self.candidate_pool(base, raws, diagnostics);
            tracing::debug!(candidates = candidates.len(), "batch complete");

            if diagnostics.timed_out {
                break;
            }
        }
        candidates
    }

    /// Normalizes every collected extraction and returns the complete
    /// candidates, deduplicated by id and case-folded title, base excluded.
    ///
    /// Discard and incomplete counts in `diagnostics` are recomputed from
    /// scratch on every call.
    fn candidate_pool(
        &self,
        base: &Product,
        raws: &[RawExtraction],
        diagnostics: &mut Diagnostics,
    ) -> Vec<Product> {
        let outcome = normalize_all(raws, &self.options.default_currency);
        diagnostics.records_discarded = outcome.discarded;
        diagnostics.records_incomplete = outcome.incomplete;

        let mut seen_ids: HashSet<String> = HashSet::from([base.id.clone()]);
        let mut seen_titles: HashSet<String> = HashSet::from([base.title.to_lowercase()]);
        outcome
            .products
            .into_iter()
            .filter(Product::is_complete)
            .filter(|p| seen_ids.insert(p.id.clone()) && seen_titles.insert(p.title.to_lowercase()))
            .collect()
    }
}

/// Scores the ranking set (complete base first, then candidates) and returns
/// it in rank order with pros and cons attached.
fn rank(base: &Product, selected: Vec<(Product, f64)>, weights: &ScoringWeights) -> Vec<RankedProduct> {
    let mut entries: Vec<(Product, f64, bool)> = Vec::with_capacity(selected.len() + 1);
    if base.is_complete() {
        entries.push((base.clone(), 1.0, true));
    }
    entries.extend(selected.into_iter().map(|(p, r)| (p, r, false)));

    let products: Vec<Product> = entries.iter().map(|(p, _, _)| p.clone()).collect();
    let scores = score_set(&products, weights);
    let medians = SetMedians::of(&products);

    let mut ranked: Vec<RankedProduct> = entries
        .into_iter()
        .zip(scores)
        .map(|((product, relevance, is_base), score)| {
            let (pros, cons) = pros_and_cons(&product, &medians);
            RankedProduct {
                product,
                score,
                relevance,
                is_base,
                pros,
                cons,
            }
        })
        .collect();
    ranked.sort_by_key(|r| r.score.rank);
    ranked
}

fn record_failure(diagnostics: &mut Diagnostics, label: &str, error: &ScraperError) {
    if error.is_blocked() {
        tracing::warn!(strategy = label, error = %error, "strategy blocked");
        diagnostics.strategies_blocked.push(label.to_owned());
    } else {
        tracing::warn!(strategy = label, error = %error, "strategy failed");
        diagnostics.strategies_failed.push(label.to_owned());
    }
}

fn log_stage(stage: Stage) {
    tracing::debug!(stage = stage.as_str(), "pipeline stage");
}
