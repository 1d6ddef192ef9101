use crate::infra::{parse_date, sample_notice_fields, InMemoryTemplates, Services};
use chrono::{Local, NaiveDate};
use clap::Args;
use multa_desk::config::AppEnvironment;
use multa_desk::context::SessionContext;
use multa_desk::error::AppError;
use multa_desk::workflows::advertencia::{
    DraftOutcome, EligibilityGate, GeneratedDocument, ADVERTENCIA_TEMPLATE_KEY,
};
use multa_desk::workflows::billing::{
    OwnerRef, PaymentMethod, PaymentMethodResolver, Settlement, SettlementRequest,
};
use multa_desk::workflows::feedback::{FeedbackAspect, FeedbackSubmission};
use multa_desk::workflows::intake::{
    keys, CandidateFile, ExtractionReview, FieldMap, UploadPolicy,
};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct DraftArgs {
    /// JSON object with the reviewed notice fields
    #[arg(long)]
    pub(crate) fields: PathBuf,
    /// Whether the driver committed violations in the last 12 months
    #[arg(long)]
    pub(crate) had_violations: Option<bool>,
    /// Template text with {{field}} placeholders (defaults to the built-in request)
    #[arg(long)]
    pub(crate) template: Option<PathBuf>,
    /// Directory the exported .txt is written to
    #[arg(long, default_value = ".")]
    pub(crate) output_dir: PathBuf,
    /// Issue date printed on the request (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Issue date used for the drafted request (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip the billing portion of the demo.
    #[arg(long)]
    pub(crate) skip_billing: bool,
}

pub(crate) async fn run_draft(args: DraftArgs) -> Result<(), AppError> {
    let exported = draft_to_file(args).await?;
    match exported {
        Some(path) => println!("Advertência exportada para {}", path.display()),
        None => println!("Advertência não gerada; tente novamente."),
    }
    Ok(())
}

/// Returns the written path, or `None` when the render step had to be recovered.
pub(crate) async fn draft_to_file(args: DraftArgs) -> Result<Option<PathBuf>, AppError> {
    let DraftArgs {
        fields,
        had_violations,
        template,
        output_dir,
        today,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(fields)?)?;
    let review = ExtractionReview::new(FieldMap::from_json(raw)?);

    let templates = InMemoryTemplates::default();
    if let Some(path) = template {
        templates.insert(ADVERTENCIA_TEMPLATE_KEY, fs::read_to_string(path)?);
    }
    let services =
        Services::with_templates(AppEnvironment::Production, UploadPolicy::default(), templates);

    let mut gate = EligibilityGate::new();
    if let Some(had_violations) = had_violations {
        gate.answer(had_violations);
    }

    let document = match services
        .advertencia
        .draft(&gate, &review, None, today)
        .await?
    {
        DraftOutcome::Drafted { document, .. } => document,
        DraftOutcome::Recovered { panel, .. } => {
            eprintln!("{}", panel.message);
            return Ok(None);
        }
    };

    Ok(Some(write_export(&document, &output_dir, today)?))
}

fn write_export(
    document: &GeneratedDocument,
    output_dir: &Path,
    today: NaiveDate,
) -> Result<PathBuf, AppError> {
    let file = document.export(today);
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(&file.file_name);
    fs::write(&path, &file.bytes)?;
    Ok(path)
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        skip_billing,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let services = Services::in_memory(AppEnvironment::Development, UploadPolicy::default());
    let operator = SessionContext::for_user("operador-demo").with_company("escritorio-demo");

    println!("Multa desk demo");

    println!("\nUpload");
    let oversized = CandidateFile::new("auto-infracao.pdf", vec![0; 12 * 1024 * 1024]);
    if let Err(rejection) = services.intake.stage(oversized) {
        println!("- 12 MB scan rejected: {rejection}");
    }
    let staged = match services
        .intake
        .stage(CandidateFile::new("auto-infracao.pdf", vec![0x25; 180 * 1024]))
    {
        Ok(staged) => staged,
        Err(rejection) => {
            println!("  Upload rejected: {rejection}");
            return Ok(());
        }
    };
    println!(
        "- {} staged as {} ({} bytes), waiting for confirmation",
        staged.file.file_name, staged.upload_id, staged.file.size_bytes
    );
    let extracted = match services.intake.confirm(&staged.upload_id).await {
        Ok(extracted) => extracted,
        Err(err) => {
            println!("  Extraction unavailable: {err}");
            return Ok(());
        }
    };
    println!("- {} fields extracted", extracted.fields.len());

    println!("\nReview");
    let mut review = ExtractionReview::new(extracted.fields);
    let status = review.clear(keys::LOCATION);
    println!(
        "- Location cleared -> can proceed: {} (missing: {})",
        status.complete,
        status.missing.join(", ")
    );
    let status = review.edit(keys::LOCATION, "Alameda Santos, 745 - São Paulo/SP");
    println!("- Location corrected -> can proceed: {}", status.complete);

    println!("\nAdvertência (Art. 267 CTB)");
    services.history.record("cnh-reincidente", 2);
    if let Ok(repeat) = services.advertencia.suggest("cnh-reincidente").await {
        println!(
            "- Repeat offender: {} violations -> suggested {:?}",
            repeat.check.violation_count, repeat.suggested_answer
        );
    }
    let suggestion = match services.advertencia.suggest("cnh-demo").await {
        Ok(suggestion) => suggestion,
        Err(err) => {
            println!("  History lookup unavailable: {err}");
            return Ok(());
        }
    };
    println!(
        "- History: {} violations in 12 months (suggested answer: {:?})",
        suggestion.check.violation_count, suggestion.suggested_answer
    );
    let mut gate = EligibilityGate::new();
    let route = gate.answer(suggestion.check.has_violations());
    println!("- Operator answered -> route {route:?}");

    match services.advertencia.draft(&gate, &review, None, today).await {
        Ok(DraftOutcome::Drafted { document, notice }) => {
            println!("- {} ({:?} template)", notice.message, document.source());
            for line in document.text().lines().take(6) {
                println!("  | {line}");
            }
            println!("- Export name: {}", document.export(today).file_name);
        }
        Ok(DraftOutcome::Recovered { panel, .. }) => println!("  {}", panel.message),
        Err(err) => println!("  {}", err.notice().message),
    }

    if !skip_billing {
        println!("\nBilling");
        for (balance, cost) in [
            (Decimal::new(10000, 2), Decimal::new(3500, 2)),
            (Decimal::new(2000, 2), Decimal::new(3500, 2)),
        ] {
            let decision =
                PaymentMethodResolver::new(balance, cost, Decimal::new(15000, 2)).decision();
            match decision.shortfall {
                None => println!(
                    "- Balance {balance} / cost {cost}: prepaid available, projected {}",
                    decision.projected_balance
                ),
                Some(shortfall) => println!(
                    "- Balance {balance} / cost {cost}: prepaid blocked, short by {shortfall}"
                ),
            }
        }

        let payer = OwnerRef::company("escritorio-demo");
        services.balances.top_up(payer.clone(), Decimal::new(5000, 2));
        for method in [PaymentMethod::Prepaid, PaymentMethod::Prepaid, PaymentMethod::Gateway] {
            let request = SettlementRequest {
                service_id: "recurso-demo".to_string(),
                payer: payer.clone(),
                method,
                service_cost: Decimal::new(3500, 2),
                service_amount: Decimal::new(15000, 2),
                description: "Advertência por escrito".to_string(),
            };
            match services.billing.settle(&operator, &request).await {
                Ok(Settlement::Prepaid { receipt }) => println!(
                    "- Prepaid debit {} -> remaining {}",
                    receipt.amount, receipt.remaining_balance
                ),
                Ok(Settlement::Gateway { invoice }) => println!(
                    "- Invoice {} for {} ({:?})",
                    invoice.reference, invoice.amount, invoice.status
                ),
                Err(err) => println!("- {}", err.notice().message),
            }
        }
    }

    println!("\nFeedback");
    let blank = FeedbackSubmission::new("SP-2025-004417", 0);
    if let Err(err) = services.feedback.submit(&operator, blank).await {
        println!("- Without stars: {}", err.notice().message);
    }
    let rated = FeedbackSubmission::new("SP-2025-004417", 5)
        .with_comment("Pronto para protocolo.")
        .with_aspect(FeedbackAspect::LegalBasis, 5)
        .with_aspect(FeedbackAspect::Clarity, 4);
    match services.feedback.submit(&operator, rated).await {
        Ok(entry) => println!(
            "- Stored {} stars from {} ({} entries)",
            entry.rating,
            entry.user_id.0,
            services.feedback_store.entries().len()
        ),
        Err(err) => println!("- {}", err.notice().message),
    }

    Ok(())
}
