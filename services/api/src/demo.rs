use crate::infra::{build_decision_service, seed_customers, DecisionService};
use clap::Args;
use loan_engine::config::AppConfig;
use loan_engine::error::AppError;
use loan_engine::workflows::loan::{
    CustomerId, EligibilityEngine, EligibilityError, FilesystemArchive, LoanDecision,
    LoanRequest, LoanServiceError, SalaryDocument,
};
use std::path::PathBuf;
use std::sync::Arc;

const SAMPLE_SALARY_SLIP: &str = "ACME Payroll Services\n\
Employee: Asha Verma\n\
Pay Period: March\n\
Gross Salary: 62,000\n\
Deductions: 12,000\n\
Net Pay: 50,000\n";

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Bureau credit score of the applicant
    #[arg(long)]
    pub(crate) credit_score: u16,
    /// Monthly salary as recorded on the profile
    #[arg(long)]
    pub(crate) salary: u64,
    /// Existing monthly obligations (installments already being paid)
    #[arg(long, default_value_t = 0)]
    pub(crate) obligation: u64,
    /// Requested principal
    #[arg(long)]
    pub(crate) amount: u64,
    /// Requested tenure in months
    #[arg(long)]
    pub(crate) duration: u32,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Salary slip to upload for the verification step (plain text slips are read directly).
    #[arg(long)]
    pub(crate) salary_slip: Option<PathBuf>,
    /// Directory receiving archived salary slips. Defaults to a temporary directory.
    #[arg(long)]
    pub(crate) upload_dir: Option<PathBuf>,
}

pub(crate) fn run_evaluation(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let engine = EligibilityEngine::new(config.eligibility);
    let request = LoanRequest::new(args.amount, args.duration)?;

    println!("Eligibility evaluation");
    println!(
        "- credit score {} | salary {} | obligations {}",
        args.credit_score, args.salary, args.obligation
    );
    println!(
        "- requested {} over {} months (installment {:.2})",
        request.principal,
        request.duration_months,
        request.monthly_installment()
    );

    match engine.compute_limit(args.credit_score, args.salary, args.obligation) {
        Ok(limit) => {
            let band = engine.classify(request.principal, limit);
            println!("- pre-approved limit {limit:.2}");
            println!("- outcome: {} ({})", band.status(), band.message());
        }
        Err(err @ EligibilityError::LowCreditScore { .. }) => {
            println!("- outcome: rejected ({err})");
        }
        Err(err) => {
            return Err(LoanServiceError::InvalidInput(err.to_string()).into());
        }
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        salary_slip,
        upload_dir,
    } = args;

    let config = AppConfig::load()?;
    let upload_dir =
        upload_dir.unwrap_or_else(|| std::env::temp_dir().join("loan-eligibility-demo"));
    let service = build_decision_service(&config, Arc::new(FilesystemArchive::new(&upload_dir)));

    println!("Loan eligibility demo");
    println!("Seeded customers:");
    for customer in seed_customers() {
        println!(
            "  - #{} {} | score {} | salary {} | obligations {}",
            customer.customer_id,
            customer.full_name,
            customer.credit_score,
            customer.monthly_salary,
            customer.existing_obligation
        );
    }

    let asha = CustomerId(12);
    println!("\n1. Instant approval");
    let approved = service.apply(&asha, LoanRequest::new(300_000, 12)?).await?;
    render_decision(&approved);

    println!("\n2. Application needing a salary slip");
    let pending = service.apply(&asha, LoanRequest::new(400_000, 24)?).await?;
    render_decision(&pending);
    let case_id = pending.case.case_id.to_string();

    println!("\n3. Salary slip re-verification");
    let document = load_salary_slip(salary_slip)?;
    println!(
        "  uploading '{}' ({}, {} bytes)",
        document.file_name,
        document.content_type,
        document.bytes.len()
    );
    match service.verify_salary(&asha, &case_id, document).await {
        Ok(decision) => {
            render_decision(&decision);
            println!("  slip archived under {}", upload_dir.display());
        }
        Err(err) => render_error(&err),
    }

    println!("\n4. Repeated verification of the same case");
    let repeat = SalaryDocument {
        file_name: "repeat.txt".to_string(),
        content_type: mime_guess::mime::TEXT_PLAIN,
        bytes: SAMPLE_SALARY_SLIP.as_bytes().to_vec(),
    };
    if let Err(err) = service.verify_salary(&asha, &case_id, repeat).await {
        render_error(&err);
    }

    println!("\n5. Credit score below the minimum");
    let low_score = service
        .apply(&CustomerId(13), LoanRequest::new(100_000, 10)?)
        .await?;
    render_decision(&low_score);

    println!("\n6. Principal exactly on the limit");
    let boundary = service
        .apply(&CustomerId(14), LoanRequest::new(100_000, 10)?)
        .await?;
    render_decision(&boundary);

    print_case_summary(&service, &[approved, pending, low_score, boundary]).await;
    Ok(())
}

fn load_salary_slip(path: Option<PathBuf>) -> Result<SalaryDocument, AppError> {
    let Some(path) = path else {
        return Ok(SalaryDocument {
            file_name: "march slip.txt".to_string(),
            content_type: mime_guess::mime::TEXT_PLAIN,
            bytes: SAMPLE_SALARY_SLIP.as_bytes().to_vec(),
        });
    };

    let bytes = std::fs::read(&path)?;
    let content_type = mime_guess::from_path(&path).first_or_octet_stream();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "salary-slip".to_string());

    Ok(SalaryDocument {
        file_name,
        content_type,
        bytes,
    })
}

fn render_decision(decision: &LoanDecision) {
    let view = decision.view();
    println!(
        "  case #{} for {}: {} | limit {:.2} | installment {:.2}",
        view.loan_id, view.full_name, view.status, view.limit_amount, view.monthly_emi
    );
    println!("  {}", view.message);
    if let Some(letter) = &decision.letter {
        println!("  sanction letter ({}):", letter.file_name);
        for line in String::from_utf8_lossy(&letter.bytes).lines() {
            println!("    | {line}");
        }
    }
}

fn render_error(err: &LoanServiceError) {
    let retry = if err.is_retryable() {
        "retryable"
    } else {
        "final"
    };
    println!("  {} ({retry}): {err}", err.kind());
}

async fn print_case_summary(service: &DecisionService, decisions: &[LoanDecision]) {
    println!("\nCase summary");
    for decision in decisions {
        let case_id = decision.case.case_id.to_string();
        match service
            .case_view(&decision.case.customer_id, &case_id)
            .await
        {
            Ok(view) => println!(
                "  - #{} {} {} over {} months: {}",
                view.loan_id, view.full_name, view.loan_amount, view.duration_months, view.status
            ),
            Err(err) => render_error(&err),
        }
    }
}
