use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_shared::{DiagnoseRes, LookupRes};
use ddx_core::{
    extract_terms, CaseReport, CoreConfig, DefaultDiagnosisService, OntologyLookup,
};

#[derive(Parser)]
#[command(name = "ddx")]
#[command(about = "Case report to differential diagnosis CLI")]
struct Cli {
    /// Print JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split text into unique lower-cased terms
    Terms {
        /// Free text to split
        text: String,
    },
    /// Look up one term in the ontology search service
    Lookup {
        /// Term to search for
        term: String,
    },
    /// Show the prompt that would be sent for a case report
    Prompt {
        /// Case report text
        text: String,
    },
    /// Run the full pipeline and print the differential diagnosis
    Diagnose {
        /// Case report text
        text: String,
    },
    /// Fetch HPO term details for one or more symptoms
    Query {
        /// Symptoms to search for
        #[arg(required = true)]
        symptoms: Vec<String>,
    },
}

/// Resolve configuration from the environment and build the pipeline.
fn service_from_env() -> anyhow::Result<DefaultDiagnosisService> {
    let cfg = CoreConfig::from_lookup(|name| std::env::var(name).ok())
        .context("invalid configuration")?;
    Ok(DefaultDiagnosisService::from_config(&cfg)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ddx_core=warn".parse()?)
                .add_directive("hpo=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'ddx --help' for commands");
        return Ok(());
    };

    match command {
        Commands::Terms { text } => {
            let terms = extract_terms(&text).into_vec();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&terms)?);
            } else {
                for term in terms {
                    println!("{term}");
                }
            }
        }
        Commands::Lookup { term } => {
            let service = service_from_env()?;
            let labels = service
                .ontology()
                .lookup(&term)
                .await
                .with_context(|| format!("ontology lookup failed for {term:?}"))?;
            if cli.json {
                let res = LookupRes { term, labels };
                println!("{}", serde_json::to_string_pretty(&res)?);
            } else if labels.is_empty() {
                println!("No matches for {term:?}.");
            } else {
                for label in labels {
                    println!("{label}");
                }
            }
        }
        Commands::Prompt { text } => {
            let case_report = CaseReport::new(&text)?;
            let service = service_from_env()?;
            let prepared = service.prepare(&case_report).await;
            println!("{}", prepared.prompt);
        }
        Commands::Diagnose { text } => match service_from_env()?.diagnose(&text).await {
            Ok(diagnosis) => {
                if cli.json {
                    let res = DiagnoseRes::from(diagnosis);
                    println!("{}", serde_json::to_string_pretty(&res)?);
                } else {
                    println!("{}", diagnosis.result);
                }
            }
            Err(e) => {
                tracing::error!("Diagnose error: {:?}", e);
                anyhow::bail!(e.user_message());
            }
        },
        Commands::Query { symptoms } => {
            let service = service_from_env()?;
            let details = service.ontology().query_symptoms(&symptoms).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&details)?);
            } else if details.is_empty() {
                println!("No HPO terms found.");
            } else {
                for term in details {
                    match term.definition {
                        Some(definition) => println!("{}\t{}\t{}", term.id, term.name, definition),
                        None => println!("{}\t{}", term.id, term.name),
                    }
                }
            }
        }
    }

    Ok(())
}
