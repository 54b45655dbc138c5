//! Analysis orchestration: window selection, the five calculators, red
//! flags, the composite and report assembly.
//!
//! A report is all-or-nothing. Cancellation is observed before the
//! calculators start, at the join point after they finish, and before the
//! report is assembled; a cancelled analysis returns
//! [`FraudRiskError::Cancelled`] and discards every partial result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::assessment::{aggregate, generate_red_flags, trends};
use crate::config::{AnalysisParams, EngineConfig};
use crate::error::FraudRiskError;
use crate::facts::quality::check_window;
use crate::facts::{DataQualityIssue, DataQualityKind, FactsStore, PeriodFacts};
use crate::models::altman::calculate_altman;
use crate::models::beneish::calculate_beneish;
use crate::models::benford::calculate_benford;
use crate::models::fraud_triangle::calculate_fraud_triangle;
use crate::models::piotroski::calculate_piotroski;
use crate::models::ModelResults;
use crate::report::{AnalysisReport, DerivedFact, ReportParts};
use crate::types::{ModelId, ReportMetadata};
use crate::FraudRiskResult;

const METHODOLOGY: &str = "Beneish M-Score, Altman Z-Score, Piotroski F-Score, \
     Benford's Law first-digit test and Fraud Triangle proxies, \
     aggregated as a weighted mean of normalized model risk";

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Shared flag a caller sets to abandon an in-flight analysis.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn check(&self, stage: &str) -> FraudRiskResult<()> {
        if self.is_cancelled() {
            info!(stage, "fraud analysis cancelled");
            return Err(FraudRiskError::Cancelled);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Runs fraud-risk analyses under one validated configuration. Holds no
/// per-analysis state, so one engine may serve concurrent analyses.
#[derive(Debug, Clone)]
pub struct FraudRiskEngine {
    config: EngineConfig,
}

impl FraudRiskEngine {
    pub fn new(config: EngineConfig) -> FraudRiskResult<Self> {
        config.validate()?;
        Ok(FraudRiskEngine { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyze(
        &self,
        store: &FactsStore,
        params: &AnalysisParams,
    ) -> FraudRiskResult<AnalysisReport> {
        self.analyze_with_cancellation(store, params, &CancellationToken::new())
    }

    pub fn analyze_with_cancellation(
        &self,
        store: &FactsStore,
        params: &AnalysisParams,
        token: &CancellationToken,
    ) -> FraudRiskResult<AnalysisReport> {
        let start = Instant::now();
        params.validate()?;

        let company = store.company();
        info!(
            cik = %company.cik,
            name = %company.name,
            window_years = params.window_years,
            include_amendments = params.include_amendments,
            "fraud analysis started"
        );

        let window = store.select_window(params);
        if window.periods.is_empty() {
            warn!(
                cik = %company.cik,
                "no analysable periods; every model will report insufficient data"
            );
        }

        // Private snapshot: derivations never touch the caller's store.
        let mut periods = window.periods;
        let mut derived_facts = Vec::new();
        for pf in periods.iter_mut() {
            let fiscal_year = pf.fiscal_year();
            derived_facts.extend(
                pf.facts
                    .derive_missing()
                    .into_iter()
                    .map(|note| DerivedFact { fiscal_year, note }),
            );
        }

        let mut data_quality = check_window(&periods);
        data_quality.extend(window.superseded.iter().map(|p| DataQualityIssue {
            fiscal_year: p.fiscal_year,
            concept: None,
            kind: DataQualityKind::AmendmentApplied,
            message: format!("{} was superseded by its amendment", p.label()),
        }));
        for issue in &data_quality {
            warn!(fy = issue.fiscal_year, kind = ?issue.kind, "{}", issue.message);
        }

        token.check("before calculators")?;
        let models = self.evaluate_models(&periods, &window.pool);
        token.check("join")?;

        for model in ModelId::ALL {
            match models.outcome(model) {
                Some((score, level)) => {
                    debug!(%model, value = %score.value(), %level, "model scored")
                }
                None => debug!(%model, "model reported insufficient data"),
            }
        }

        let red_flags = generate_red_flags(&models, &self.config.composite);
        let overall_risk = aggregate(&models, &red_flags, &self.config.composite);
        if let Some(q) = &overall_risk.qualifier {
            warn!(cik = %company.cik, "low-confidence composite: {q}");
        }
        let trends = trends::summarize(&periods);

        token.check("before report assembly")?;
        let elapsed = start.elapsed().as_micros() as u64;
        info!(
            cik = %company.cik,
            level = %overall_risk.level,
            score = %overall_risk.score,
            red_flags = red_flags.len(),
            elapsed_us = elapsed,
            "fraud analysis complete"
        );

        Ok(AnalysisReport::assemble(ReportParts {
            company: company.clone(),
            params: *params,
            filings_analyzed: periods.iter().map(|p| p.period.clone()).collect(),
            overall_risk,
            models,
            red_flags,
            trends,
            data_quality,
            derived_facts,
            metadata: ReportMetadata::new(METHODOLOGY, elapsed),
        }))
    }

    /// Run the five calculators over a window. `pool` feeds the pooled
    /// Benford test; the others read `periods` only.
    pub fn evaluate_models(&self, periods: &[PeriodFacts], pool: &[PeriodFacts]) -> ModelResults {
        let cfg = &self.config;
        let beneish = || calculate_beneish(periods);
        let altman = || calculate_altman(periods, cfg.altman_book_equity_fallback);
        let piotroski = || calculate_piotroski(periods);
        let fraud_triangle = || calculate_fraud_triangle(periods, &cfg.fraud_triangle);
        let benford = || calculate_benford(pool, &cfg.benford);

        if cfg.parallel {
            let ((beneish, altman), (piotroski, (fraud_triangle, benford))) = rayon::join(
                || rayon::join(beneish, altman),
                || rayon::join(piotroski, || rayon::join(fraud_triangle, benford)),
            );
            ModelResults {
                beneish,
                altman,
                piotroski,
                fraud_triangle,
                benford,
            }
        } else {
            ModelResults {
                beneish: beneish(),
                altman: altman(),
                piotroski: piotroski(),
                fraud_triangle: fraud_triangle(),
                benford: benford(),
            }
        }
    }
}
