use chrono::NaiveDate;
use fraud_risk_core::assessment::RedFlagKind;
use fraud_risk_core::facts::{
    CompanyIdentity, Concept, DataQualityKind, FactsStore, FilingType, FinancialFacts,
    FiscalPeriod,
};
use fraud_risk_core::{
    AnalysisParams, CancellationToken, EngineConfig, FraudRiskEngine, FraudRiskError, ModelId,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ===========================================================================
// Fixtures
// ===========================================================================

fn company(cik: &str) -> CompanyIdentity {
    CompanyIdentity {
        cik: cik.into(),
        name: format!("Company {cik}"),
        ticker: None,
    }
}

fn period(year: i32, filing_type: FilingType) -> FiscalPeriod {
    FiscalPeriod::new(
        year,
        NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
        filing_type,
    )
}

fn facts(values: &[(Concept, Decimal)]) -> FinancialFacts {
    values
        .iter()
        .fold(FinancialFacts::new(), |f, (c, v)| f.with(*c, *v))
}

/// Every canonical concept reported, non-zero, in both years.
fn complete_2019() -> FinancialFacts {
    facts(&[
        (Concept::Revenue, dec!(1000)),
        (Concept::CostOfGoodsSold, dec!(600)),
        (Concept::GrossProfit, dec!(400)),
        (Concept::NetIncome, dec!(80)),
        (Concept::TotalAssets, dec!(2000)),
        (Concept::CurrentAssets, dec!(700)),
        (Concept::CurrentLiabilities, dec!(400)),
        (Concept::Receivables, dec!(150)),
        (Concept::Inventory, dec!(120)),
        (Concept::Ppe, dec!(900)),
        (Concept::Depreciation, dec!(90)),
        (Concept::Sga, dec!(120)),
        (Concept::TotalLiabilities, dec!(900)),
        (Concept::LongTermDebt, dec!(500)),
        (Concept::StockholdersEquity, dec!(1100)),
        (Concept::CashFlowFromOperations, dec!(130)),
        (Concept::MarketValueOfEquity, dec!(2500)),
        (Concept::RetainedEarnings, dec!(600)),
        (Concept::Ebit, dec!(140)),
        (Concept::SharesOutstanding, dec!(100)),
        (Concept::Cash, dec!(200)),
    ])
}

fn complete_2020() -> FinancialFacts {
    facts(&[
        (Concept::Revenue, dec!(1100)),
        (Concept::CostOfGoodsSold, dec!(650)),
        (Concept::GrossProfit, dec!(450)),
        (Concept::NetIncome, dec!(95)),
        (Concept::TotalAssets, dec!(2100)),
        (Concept::CurrentAssets, dec!(760)),
        (Concept::CurrentLiabilities, dec!(410)),
        (Concept::Receivables, dec!(160)),
        (Concept::Inventory, dec!(125)),
        (Concept::Ppe, dec!(930)),
        (Concept::Depreciation, dec!(95)),
        (Concept::Sga, dec!(130)),
        (Concept::TotalLiabilities, dec!(920)),
        (Concept::LongTermDebt, dec!(480)),
        (Concept::StockholdersEquity, dec!(1180)),
        (Concept::CashFlowFromOperations, dec!(150)),
        (Concept::MarketValueOfEquity, dec!(2800)),
        (Concept::RetainedEarnings, dec!(680)),
        (Concept::Ebit, dec!(160)),
        (Concept::SharesOutstanding, dec!(100)),
        (Concept::Cash, dec!(230)),
    ])
}

fn store_of(pairs: Vec<(FiscalPeriod, FinancialFacts)>) -> FactsStore {
    let mut store = FactsStore::new(company("0000000042"));
    for (p, f) in pairs {
        store.insert(p, f).unwrap();
    }
    store
}

fn complete_store() -> FactsStore {
    store_of(vec![
        (period(2019, FilingType::Annual), complete_2019()),
        (period(2020, FilingType::Annual), complete_2020()),
    ])
}

fn engine() -> FraudRiskEngine {
    FraudRiskEngine::new(EngineConfig::default()).unwrap()
}

fn scored_models(report: &fraud_risk_core::AnalysisReport) -> Vec<ModelId> {
    ModelId::ALL
        .iter()
        .copied()
        .filter(|m| report.models().outcome(*m).is_some())
        .collect()
}

// ===========================================================================
// Degradation
// ===========================================================================

#[test]
fn test_complete_two_period_input_scores_every_model() {
    init_tracing();
    let report = engine()
        .analyze(&complete_store(), &AnalysisParams::default())
        .unwrap();
    assert_eq!(scored_models(&report), ModelId::ALL.to_vec());
    assert!(!report.overall_risk().low_confidence);
    assert!(report.data_quality().is_empty());
}

#[test]
fn test_single_period_altman_valid_beneish_insufficient() {
    let store = store_of(vec![(period(2020, FilingType::Annual), complete_2020())]);
    let report = engine().analyze(&store, &AnalysisParams::default()).unwrap();
    let models = report.models();

    assert!(models.altman.is_scored());
    let why = models.beneish.insufficiency().unwrap();
    assert!(why.reason.contains("two periods"));
    assert_eq!(report.filings_analyzed().len(), 1);
}

#[test]
fn test_single_healthy_period_not_penalized_by_piotroski() {
    let store = store_of(vec![(period(2020, FilingType::Annual), complete_2020())]);
    let report = engine().analyze(&store, &AnalysisParams::default()).unwrap();

    let piotroski = report.models().piotroski.detail().unwrap();
    assert_eq!((piotroski.f_score, piotroski.evaluable), (3, 3));
    assert!(!piotroski.weakness_conclusive());

    let kinds: Vec<RedFlagKind> = report.red_flags().iter().map(|f| f.kind).collect();
    assert!(!kinds.contains(&RedFlagKind::WeakFundamentals));
    assert!(kinds.contains(&RedFlagKind::LimitedEvaluability));
    assert!(!report
        .models()
        .high_risk_models()
        .contains(&ModelId::Piotroski));

    let contribution = report
        .overall_risk()
        .contributions
        .iter()
        .find(|c| c.model == ModelId::Piotroski)
        .unwrap();
    assert_eq!(contribution.normalized_risk, Decimal::ZERO);
}

#[test]
fn test_removing_any_concept_only_narrows_results() {
    let full = engine()
        .analyze(&complete_store(), &AnalysisParams::default())
        .unwrap();
    let full_scored = scored_models(&full);

    for concept in Concept::ALL {
        for drop_from_current in [false, true] {
            let mut prior = complete_2019();
            let mut current = complete_2020();
            if drop_from_current {
                current.remove(concept);
            } else {
                prior.remove(concept);
            }
            let store = store_of(vec![
                (period(2019, FilingType::Annual), prior),
                (period(2020, FilingType::Annual), current),
            ]);
            let report = engine()
                .analyze(&store, &AnalysisParams::default())
                .unwrap_or_else(|e| panic!("{concept} removed: {e}"));
            for model in scored_models(&report) {
                assert!(
                    full_scored.contains(&model),
                    "{model} scored only after removing {concept}"
                );
            }
        }
    }
}

#[test]
fn test_gap_disables_two_period_ratios() {
    let store = store_of(vec![
        (period(2018, FilingType::Annual), complete_2019()),
        (period(2020, FilingType::Annual), complete_2020()),
    ]);
    let report = engine().analyze(&store, &AnalysisParams::default()).unwrap();
    let models = report.models();

    assert!(models
        .beneish
        .insufficiency()
        .unwrap()
        .reason
        .contains("does not directly follow"));
    assert!(models.altman.is_scored());
    assert_eq!(models.piotroski.detail().unwrap().evaluable, 3);
    assert!(report
        .data_quality()
        .iter()
        .any(|i| i.kind == DataQualityKind::PeriodGap));
}

#[test]
fn test_negative_assets_reported_not_rejected() {
    let mut current = complete_2020();
    current.set(Concept::TotalAssets, dec!(-2100));
    let store = store_of(vec![
        (period(2019, FilingType::Annual), complete_2019()),
        (period(2020, FilingType::Annual), current),
    ]);
    let report = engine().analyze(&store, &AnalysisParams::default()).unwrap();
    assert!(report
        .data_quality()
        .iter()
        .any(|i| i.kind == DataQualityKind::NegativeValue && i.concept == Some(Concept::TotalAssets)));
    let altman = report.models().altman.as_scored().unwrap();
    assert!(altman.warnings.iter().any(|w| w.contains("TotalAssets")));
}

// ===========================================================================
// Window selection and normalization
// ===========================================================================

#[test]
fn test_window_years_limits_periods() {
    let store = store_of(vec![
        (period(2018, FilingType::Annual), complete_2019()),
        (period(2019, FilingType::Annual), complete_2019()),
        (period(2020, FilingType::Annual), complete_2020()),
    ]);
    let params = AnalysisParams {
        window_years: 2,
        include_amendments: false,
    };
    let report = engine().analyze(&store, &params).unwrap();
    let years: Vec<i32> = report
        .filings_analyzed()
        .iter()
        .map(|p| p.fiscal_year)
        .collect();
    assert_eq!(years, vec![2019, 2020]);
}

#[test]
fn test_amendment_supersedes_original() {
    let mut amended = complete_2020();
    amended.set(Concept::Revenue, dec!(1050));
    let store = store_of(vec![
        (period(2019, FilingType::Annual), complete_2019()),
        (period(2020, FilingType::Annual), complete_2020()),
        (period(2020, FilingType::AnnualAmendment), amended),
    ]);
    let params = AnalysisParams {
        window_years: 5,
        include_amendments: true,
    };
    let report = engine().analyze(&store, &params).unwrap();
    let last = report.filings_analyzed().last().unwrap();
    assert_eq!(last.filing_type, FilingType::AnnualAmendment);
    assert!(report
        .data_quality()
        .iter()
        .any(|i| i.kind == DataQualityKind::AmendmentApplied));
}

#[test]
fn test_derivations_recorded_and_store_untouched() {
    let mut prior = complete_2019();
    prior.remove(Concept::CostOfGoodsSold);
    let store = store_of(vec![
        (period(2019, FilingType::Annual), prior),
        (period(2020, FilingType::Annual), complete_2020()),
    ]);
    let report = engine().analyze(&store, &AnalysisParams::default()).unwrap();

    let derived = report.derived_facts();
    assert_eq!(derived.len(), 1);
    assert_eq!(derived[0].fiscal_year, 2019);
    assert_eq!(derived[0].note.concept, Concept::CostOfGoodsSold);
    assert!(report.models().beneish.is_scored());
    assert_eq!(store.periods()[0].get(Concept::CostOfGoodsSold), None);
}

// ===========================================================================
// Determinism and concurrency
// ===========================================================================

#[test]
fn test_parallel_and_sequential_agree() {
    let parallel = FraudRiskEngine::new(EngineConfig {
        parallel: true,
        ..EngineConfig::default()
    })
    .unwrap();
    let sequential = FraudRiskEngine::new(EngineConfig {
        parallel: false,
        ..EngineConfig::default()
    })
    .unwrap();
    let store = complete_store();
    let params = AnalysisParams::default();

    let a = parallel.analyze(&store, &params).unwrap();
    let b = sequential.analyze(&store, &params).unwrap();
    assert_eq!(a.models(), b.models());
    assert_eq!(a.red_flags(), b.red_flags());
    assert_eq!(a.overall_risk(), b.overall_risk());
    assert_eq!(a.trends(), b.trends());
}

#[test]
fn test_concurrent_analyses_share_one_engine() {
    let engine = &engine();
    let stores: Vec<FactsStore> = (0..4).map(|_| complete_store()).collect();
    let params = AnalysisParams::default();
    let expected = engine.analyze(&stores[0], &params).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = stores
            .iter()
            .map(|store| s.spawn(move || engine.analyze(store, &params).unwrap()))
            .collect();
        for h in handles {
            let report = h.join().unwrap();
            assert_eq!(report.overall_risk(), expected.overall_risk());
        }
    });
}

// ===========================================================================
// Errors and cancellation
// ===========================================================================

#[test]
fn test_window_years_out_of_range_rejected() {
    for window_years in [0u8, 11] {
        let params = AnalysisParams {
            window_years,
            include_amendments: false,
        };
        match engine().analyze(&complete_store(), &params).unwrap_err() {
            FraudRiskError::InvalidInput { field, .. } => assert_eq!(field, "window_years"),
            e => panic!("Expected InvalidInput, got {e}"),
        }
    }
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let mut config = EngineConfig::default();
    config.composite.altman_weight = dec!(-0.5);
    assert!(matches!(
        FraudRiskEngine::new(config),
        Err(FraudRiskError::InvalidInput { .. })
    ));
}

#[test]
fn test_engine_from_json_config() {
    let config = EngineConfig::from_json(
        r#"{"benford": {"min_sample": 100}, "composite": {"corroboration_min_models": 2}}"#,
    )
    .unwrap();
    let report = FraudRiskEngine::new(config)
        .unwrap()
        .analyze(&complete_store(), &AnalysisParams::default())
        .unwrap();
    assert!(!report.models().benford.is_scored());
}

#[test]
fn test_empty_store_reports_every_model_insufficient() {
    let store = FactsStore::new(company("0000000001"));
    let report = engine().analyze(&store, &AnalysisParams::default()).unwrap();

    assert!(scored_models(&report).is_empty());
    assert!(report.filings_analyzed().is_empty());
    assert!(report.red_flags().is_empty());

    let overall = report.overall_risk();
    assert!(overall.low_confidence);
    assert!(overall.qualifier.is_some());
    assert_eq!(overall.score, Decimal::ZERO);
    assert_eq!(
        report.trends().revenue_trend,
        fraud_risk_core::assessment::TrendDirection::InsufficientData
    );
}

#[test]
fn test_cancelled_analysis_emits_no_report() {
    let token = CancellationToken::new();
    token.cancel();
    let result =
        engine().analyze_with_cancellation(&complete_store(), &AnalysisParams::default(), &token);
    assert!(matches!(result, Err(FraudRiskError::Cancelled)));
}

#[test]
fn test_uncancelled_token_completes() {
    let token = CancellationToken::new();
    let clone = token.clone();
    let result =
        engine().analyze_with_cancellation(&complete_store(), &AnalysisParams::default(), &token);
    assert!(result.is_ok());
    assert!(!clone.is_cancelled());
}
