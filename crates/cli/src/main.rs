use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mentor_agents::{ChatTurnController, TurnOutcome};
use mentor_core::{
    compute_metrics, evaluate_budget, BudgetRecord, ChatInput, ProfileType,
};
use mentor_observability::{init_tracing, AppMetrics};
use mentor_storage::MemoryStore;

#[derive(Debug, Parser)]
#[command(name = "finmentor")]
#[command(about = "FinMentor budget analysis and finance chat CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat session with the finance assistant.
    Chat {
        #[arg(long)]
        profile: Option<String>,
        /// Simulated bot response latency in milliseconds.
        #[arg(long, default_value_t = 1000)]
        latency_ms: u64,
    },
    /// One question, one answer.
    Ask {
        text: String,
        #[arg(long)]
        profile: Option<String>,
    },
    /// Analyze a monthly budget against profile rules.
    Analyze {
        #[arg(long, default_value = "professional")]
        profile: String,
        #[arg(long, default_value_t = 0.0)]
        income: f64,
        #[arg(long, default_value_t = 0.0)]
        housing: f64,
        #[arg(long, default_value_t = 0.0)]
        food: f64,
        #[arg(long, default_value_t = 0.0)]
        transportation: f64,
        #[arg(long, default_value_t = 0.0)]
        entertainment: f64,
        #[arg(long, default_value_t = 0.0)]
        utilities: f64,
        #[arg(long, default_value_t = 0.0)]
        other: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("mentor_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Chat {
            profile,
            latency_ms,
        } => run_chat(profile, Duration::from_millis(latency_ms)).await?,
        Command::Ask { text, profile } => {
            let controller = build_controller(Duration::from_millis(0));
            let outcome = controller
                .handle_turn(ChatInput {
                    session_id: None,
                    text,
                    profile,
                })
                .await?;

            match outcome {
                TurnOutcome::Completed(reply) => println!("{}", reply.reply.text),
                TurnOutcome::Rejected(_) => println!("Nothing to ask."),
            }
        }
        Command::Analyze {
            profile,
            income,
            housing,
            food,
            transportation,
            entertainment,
            utilities,
            other,
        } => {
            let Some(profile) = ProfileType::from_optional_str(Some(&profile)) else {
                anyhow::bail!("invalid --profile value, expected student or professional");
            };

            let record = BudgetRecord {
                income,
                housing,
                food,
                transportation,
                entertainment,
                utilities,
                other,
            }
            .sanitized();

            let metrics = compute_metrics(&record);
            let recommendations = evaluate_budget(&metrics, profile);

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "profile": profile,
                    "metrics": metrics,
                    "recommendations": recommendations,
                }))?
            );
        }
    }

    Ok(())
}

fn build_controller(latency: Duration) -> ChatTurnController<MemoryStore> {
    ChatTurnController::new(Arc::new(MemoryStore::new()), AppMetrics::shared())
        .with_latency(latency)
}

async fn run_chat(profile: Option<String>, latency: Duration) -> Result<()> {
    let controller = build_controller(latency);
    let mut session_id: Option<String> = None;

    println!("FinMentor chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let outcome = controller
            .handle_turn(ChatInput {
                session_id: session_id.clone(),
                text: message.to_string(),
                profile: profile.clone(),
            })
            .await?;

        match outcome {
            TurnOutcome::Completed(reply) => {
                session_id = Some(reply.session_id.clone());
                println!("\n{}\n", reply.reply.text);
            }
            TurnOutcome::Rejected(_) => continue,
        }
    }

    Ok(())
}
