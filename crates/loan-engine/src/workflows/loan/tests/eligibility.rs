use super::common::*;
use crate::workflows::loan::eligibility::{
    EligibilityBand, EligibilityConfig, EligibilityEngine, EligibilityError,
    ReverificationDecision,
};

fn engine() -> EligibilityEngine {
    EligibilityEngine::new(eligibility_config())
}

#[test]
fn limit_scales_salary_by_score_and_uncommitted_income() {
    let limit = engine().limit(&asha()).expect("score above minimum");
    assert!((limit - 333_333.333).abs() < 0.01, "limit was {limit}");
}

#[test]
fn limit_fails_below_minimum_score_regardless_of_income() {
    for (salary, obligation) in [(80_000, 0), (1, 0), (0, 0), (50_000, 90_000)] {
        match engine().compute_limit(699, salary, obligation) {
            Err(EligibilityError::LowCreditScore {
                score: 699,
                minimum: 700,
            }) => {}
            other => panic!("expected low credit score, got {other:?}"),
        }
    }
}

#[test]
fn limit_is_finite_and_non_negative_above_minimum_score() {
    for score in [700_u16, 750, 820, 900] {
        for (salary, obligation) in [(1_u64, 0_u64), (50_000, 10_000), (90_000, 89_999)] {
            let limit = engine()
                .compute_limit(score, salary, obligation)
                .expect("limit computes");
            assert!(limit.is_finite() && limit >= 0.0);
        }
    }
}

#[test]
fn limit_is_clamped_at_zero_when_obligations_exceed_salary() {
    let limit = engine()
        .compute_limit(800, 20_000, 35_000)
        .expect("limit computes");
    assert_eq!(limit, 0.0);
}

#[test]
fn zero_salary_is_rejected() {
    assert_eq!(
        engine().compute_limit(800, 0, 0),
        Err(EligibilityError::NonPositiveSalary)
    );
}

#[test]
fn scores_above_maximum_inflate_limit_unless_clamped() {
    let unclamped = engine()
        .compute_limit(990, 10_000, 0)
        .expect("limit computes");
    assert!((unclamped - 110_000.0).abs() < 1e-6);

    let clamped = EligibilityEngine::new(EligibilityConfig {
        clamp_credit_score: true,
        ..EligibilityConfig::default()
    })
    .compute_limit(990, 10_000, 0)
    .expect("limit computes");
    assert_eq!(clamped, 100_000.0);
}

#[test]
fn classify_bands() {
    let engine = engine();
    let limit = 333_333.33;
    assert_eq!(engine.classify(300_000, limit), EligibilityBand::Approved);
    assert_eq!(
        engine.classify(600_000, limit),
        EligibilityBand::NeedsVerification
    );
    assert_eq!(engine.classify(700_000, limit), EligibilityBand::Rejected);
}

#[test]
fn classify_reports_unknown_only_on_band_boundaries() {
    let engine = engine();
    let limit = 100_000.0;
    assert_eq!(engine.classify(100_000, limit), EligibilityBand::Unknown);
    assert_eq!(engine.classify(200_000, limit), EligibilityBand::Unknown);

    for principal in (1..=300).map(|step| step * 1_000) {
        let band = engine.classify(principal, limit);
        let on_boundary = principal == 100_000 || principal == 200_000;
        assert_eq!(band == EligibilityBand::Unknown, on_boundary, "{principal}");
    }
}

#[test]
fn classify_with_zero_limit_rejects() {
    assert_eq!(engine().classify(1, 0.0), EligibilityBand::Rejected);
}

#[test]
fn reverify_requires_exact_salary_match() {
    match engine().reverify(50_000, 49_999, 10_000, 1_000.0) {
        Err(EligibilityError::SalaryMismatch {
            stated: 50_000,
            observed: 49_999,
        }) => {}
        other => panic!("expected salary mismatch, got {other:?}"),
    }
}

#[test]
fn reverify_allows_installments_up_to_half_of_available_income() {
    let engine = engine();

    let at_cap = engine
        .reverify(50_000, 50_000, 10_000, 20_000.0)
        .expect("salaries match");
    assert_eq!(at_cap.decision, ReverificationDecision::Approved);
    assert_eq!(at_cap.available_income, 40_000.0);
    assert_eq!(at_cap.max_allowed_installment, 20_000.0);

    let above_cap = engine
        .reverify(50_000, 50_000, 10_000, 50_000.0)
        .expect("salaries match");
    assert_eq!(above_cap.decision, ReverificationDecision::Rejected);
}

#[test]
fn reverify_is_repeatable() {
    let engine = engine();
    let first = engine.reverify(50_000, 50_000, 10_000, 16_666.67);
    let second = engine.reverify(50_000, 50_000, 10_000, 16_666.67);
    assert_eq!(first, second);
}

#[test]
fn band_messages_and_statuses() {
    use crate::workflows::loan::LoanStatus;

    assert_eq!(EligibilityBand::Approved.status(), LoanStatus::Approved);
    assert_eq!(
        EligibilityBand::NeedsVerification.status(),
        LoanStatus::SalaryVerification
    );
    assert_eq!(EligibilityBand::Rejected.status(), LoanStatus::Rejected);
    assert_eq!(EligibilityBand::Unknown.status(), LoanStatus::Unknown);
    assert_eq!(
        EligibilityBand::NeedsVerification.message(),
        "please upload salary slip for further verification"
    );
}
