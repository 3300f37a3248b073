//! fedhealth-client — command-line diagnostic session driver
//!
//! Runs one diagnostic session against the remote scoring service: selects
//! a module, submits `field=value` vitals, prints the computed risk, and
//! optionally generates the narrative report or sends a chat message.

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fedhealth_client::models::prediction::risk_band;
use fedhealth_client::services::ChatClient;
use fedhealth_client::{
    ClientConfig, DiagnosticSession, ModuleCatalog, PredictionPhase, RawForm, ReportOrchestrator,
    ReportPhase,
};

#[derive(Parser)]
#[command(
    name = "fedhealth-client",
    version,
    about = "Diagnostic session client for the FedHealth scoring service"
)]
struct Cli {
    /// Scoring service base URL (overrides FEDHEALTH_API_URL and the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Module to run: cardio, diabetes, ipf, cbc
    #[arg(long, default_value = "cardio")]
    module: String,

    /// Member name to assess (added to the session roster)
    #[arg(long)]
    member: Option<String>,

    /// Generate a narrative report after a successful prediction
    #[arg(long)]
    report: bool,

    /// Send a message to the medical assistant
    #[arg(long)]
    chat: Option<String>,

    /// Form fields as name=value pairs
    #[arg(value_name = "FIELD=VALUE")]
    fields: Vec<String>,
}

fn parse_form(fields: &[String]) -> Result<RawForm> {
    let mut form = RawForm::new();
    for field in fields {
        let (name, value) = field
            .split_once('=')
            .with_context(|| format!("Malformed field '{}', expected name=value", field))?;
        form.insert(name.to_string(), value.to_string());
    }
    Ok(form)
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let config = ClientConfig::resolve(cli.api_url.as_deref());
    info!("Scoring service: {}", config.api_base_url);

    let module = ModuleCatalog::lookup_id(&cli.module)?;
    let session = DiagnosticSession::new(&config)?;
    session.select_module(module.kind).await;

    if let Some(name) = &cli.member {
        let member = session.add_member(name.clone()).await;
        info!("Assessing member: {}", member.name);
    }

    if cli.fields.is_empty() && cli.chat.is_none() {
        bail!(
            "No form fields provided. Required fields for {}: {}",
            module.kind,
            module
                .fields
                .iter()
                .map(|f| f.name)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if !cli.fields.is_empty() {
        let form = parse_form(&cli.fields)?;
        session.submit_form(&form).await?;

        match session.phase().await {
            PredictionPhase::Ready(result) => {
                println!("Module:          {}", module.label);
                if let Some(probability) = result.risk_probability {
                    println!("Risk probability: {:.1}%", probability * 100.0);
                    let category = result
                        .risk_category
                        .clone()
                        .unwrap_or_else(|| risk_band(probability).to_string());
                    println!("Classification:   {}", category);
                }
                if let Some(label) = result.prediction_label() {
                    println!("Prediction:       {}", label);
                }
                for factor in &result.explanations {
                    println!("  - {} ({:?})", factor.feature, factor.impact);
                }
            }
            other => bail!("Submission did not produce a result (session is {})", other.name()),
        }

        if cli.report {
            let orchestrator =
                ReportOrchestrator::new(config.api_base_url.clone(), session.state_handle())?;
            orchestrator.generate().await?;
            if let ReportPhase::Ready(text) = orchestrator.phase().await {
                println!("\n--- Medical Analysis Report ---\n{}", text);
            }
        }
    }

    if let Some(message) = &cli.chat {
        let chat = ChatClient::new(config.api_base_url.clone())?;
        match chat.send(message, &[]).await {
            Ok(reply) => println!("\nAssistant: {}", reply),
            // Chat degrades to an inline message; other flows are unaffected
            Err(e) => println!("\nAssistant: {}", e),
        }
    }

    Ok(())
}
