// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Four commands are supported:
//   1. `train`    — fine-tunes the seq2seq model on a Q&A corpus
//   2. `evaluate` — scores a fine-tuned snapshot with BLEU/ROUGE
//   3. `ask`      — answers a single question from a snapshot
//   4. `chat`     — interactive question/answer loop
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TrainArgs, EvaluateArgs, AskArgs, ChatArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "agribot",
    version = "0.1.0",
    about = "Fine-tune a seq2seq transformer on agriculture Q&A, then chat with it."
)]
pub struct Cli {
    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => Self::run_train(args),
            Commands::Evaluate(args) => Self::run_evaluate(args),
            Commands::Ask(args)      => Self::run_ask(args),
            Commands::Chat(args)     => Self::run_chat(args),
        }
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig and hands off to Layer 2.
    fn run_train( args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting fine-tuning on dataset '{}'", args.dataset);

        // Convert CLI args → application config (separates presentation from domain)
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training complete. Snapshot saved.");
        Ok(())
    }

    /// Handles the `evaluate` subcommand.
    /// Loads a snapshot, generates answers for a validation sample,
    /// and prints the BLEU/ROUGE report.
    fn run_evaluate( args: EvaluateArgs) -> Result<()> {
        use crate::application::evaluate_use_case::EvaluateUseCase;

        let use_case = EvaluateUseCase::new(args.into());
        let report   = use_case.execute()?;

        println!("\n{report}");
        Ok(())
    }

    /// Handles the `ask` subcommand.
    /// Loads the snapshot and prints one generated answer
    /// (or the fixed refusal for off-domain output).
    fn run_ask( args: AskArgs) -> Result<()> {
        use crate::application::respond_use_case::RespondUseCase;

        let use_case = RespondUseCase::new(
            &args.models_dir,
            &args.run_name,
            args.beam_width,
            args.max_gen_len,
        )?;

        let answer = use_case.respond(&args.question);
        println!("\nAnswer: {}", answer);
        Ok(())
    }

    /// Handles the `chat` subcommand — a read-eval loop over stdin.
    /// Typing `stop` ends the conversation.
    fn run_chat( args: ChatArgs) -> Result<()> {
        use crate::application::respond_use_case::RespondUseCase;
        use std::io::{BufRead, Write};

        let use_case = RespondUseCase::new(
            &args.models_dir,
            &args.run_name,
            args.beam_width,
            args.max_gen_len,
        )?;

        println!(
            "Hello! I'm an agriculture chatbot. Ask me anything about agriculture. \
             Type 'stop' to end the conversation."
        );

        let stdin  = std::io::stdin();
        let mut out = std::io::stdout();

        loop {
            print!("You: ");
            out.flush()?;

            let mut line = String::new();
            // EOF on stdin ends the loop the same way as `stop`
            if stdin.lock().read_line(&mut line)? == 0 {
                println!("Chatbot: Goodbye!");
                break;
            }

            let question = line.trim();
            if question.eq_ignore_ascii_case("stop") {
                println!("Chatbot: Goodbye!");
                break;
            }
            if question.is_empty() {
                continue;
            }

            let answer = use_case.respond(question);
            println!("Chatbot: {}", answer);
        }

        Ok(())
    }
}
