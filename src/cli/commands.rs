// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands: `train`, `evaluate`, `ask`, `chat`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::evaluate_use_case::EvaluateConfig;
use crate::application::train_use_case::TrainConfig;

/// The four top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the seq2seq model on a question/answer corpus
    Train(TrainArgs),

    /// Score a fine-tuned snapshot with BLEU and ROUGE
    Evaluate(EvaluateArgs),

    /// Ask a single question using a fine-tuned snapshot
    Ask(AskArgs),

    /// Interactive chat loop (type 'stop' to exit)
    Chat(ChatArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
/// Defaults match the original AGRIBOT experiment.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Dataset identifier, resolved to a corpus file under --data-dir
    #[arg(long, default_value = "KisanVaani/agriculture-qa-english-only")]
    pub dataset: String,

    /// Directory containing corpus files
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory holding model snapshots (base checkpoints and runs)
    #[arg(long, default_value = "models")]
    pub models_dir: String,

    /// Name of the snapshot this run writes
    #[arg(long, default_value = "fine_tuned_t5_agriculture")]
    pub run_name: String,

    /// Identifier of the pretrained checkpoint to fine-tune from,
    /// resolved under --models-dir
    #[arg(long, default_value = "t5-base")]
    pub base_model: String,

    /// Initialize fresh parameters and build a tokenizer from the
    /// corpus instead of loading --base-model
    #[arg(long)]
    pub from_scratch: bool,

    /// Seed for the deterministic train/validation split
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of the corpus used for training (rest is validation)
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    /// Fixed length of every tokenized input and label sequence
    #[arg(long, default_value_t = 128)]
    pub max_seq_len: usize,

    /// Number of samples processed together in one forward pass
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Number of full passes through the training split
    #[arg(long, default_value_t = 21)]
    pub epochs: usize,

    /// How fast the model learns — too high causes instability,
    /// too low causes slow convergence
    #[arg(long, default_value_t = 2e-5)]
    pub lr: f64,

    /// Stop when validation loss has not improved for this many
    /// passes. Off by default: the run does all --epochs passes.
    #[arg(long)]
    pub patience: Option<usize>,

    /// Hidden dimension of the transformer (d_model in the paper)
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// Number of attention heads in multi-head attention
    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Number of stacked encoder layers
    #[arg(long, default_value_t = 6)]
    pub num_encoder_layers: usize,

    /// Number of stacked decoder layers
    #[arg(long, default_value_t = 6)]
    pub num_decoder_layers: usize,

    /// Inner dimension of the feed-forward network
    /// Typically 4x d_model
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    /// Dropout probability — randomly zeroes activations during training
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Vocabulary cap when building a tokenizer from the corpus
    /// (ignored when loading a pretrained tokenizer)
    #[arg(long, default_value_t = 32000)]
    pub vocab_size: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataset_id:         a.dataset,
            data_dir:           a.data_dir,
            models_dir:         a.models_dir,
            run_name:           a.run_name,
            base_model:         if a.from_scratch { None } else { Some(a.base_model) },
            seed:               a.seed,
            train_fraction:     a.train_fraction,
            max_seq_len:        a.max_seq_len,
            batch_size:         a.batch_size,
            epochs:             a.epochs,
            lr:                 a.lr,
            patience:           a.patience,
            d_model:            a.d_model,
            num_heads:          a.num_heads,
            num_encoder_layers: a.num_encoder_layers,
            num_decoder_layers: a.num_decoder_layers,
            d_ff:               a.d_ff,
            dropout:            a.dropout,
            vocab_size:         a.vocab_size,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Name of the snapshot to evaluate
    #[arg(long, default_value = "fine_tuned_t5_agriculture")]
    pub run_name: String,

    /// Directory holding model snapshots
    #[arg(long, default_value = "models")]
    pub models_dir: String,

    /// Directory containing corpus files
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Dataset identifier — defaults to the one the snapshot was trained on
    #[arg(long)]
    pub dataset: Option<String>,

    /// Number of validation questions to score (first N in split order)
    #[arg(long, default_value_t = 50)]
    pub sample_size: usize,

    /// Number of beams kept during decoding
    #[arg(long, default_value_t = 4)]
    pub beam_width: usize,

    /// Maximum length of a generated answer in tokens
    #[arg(long, default_value_t = 128)]
    pub max_gen_len: usize,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            run_name:    a.run_name,
            models_dir:  a.models_dir,
            data_dir:    a.data_dir,
            dataset_id:  a.dataset,
            sample_size: a.sample_size,
            beam_width:  a.beam_width,
            max_gen_len: a.max_gen_len,
        }
    }
}

/// All arguments for the `ask` command
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The natural language question to answer
    #[arg(long)]
    pub question: String,

    /// Name of the snapshot to answer from
    #[arg(long, default_value = "fine_tuned_t5_agriculture")]
    pub run_name: String,

    /// Directory holding model snapshots
    #[arg(long, default_value = "models")]
    pub models_dir: String,

    /// Number of beams kept during decoding
    #[arg(long, default_value_t = 4)]
    pub beam_width: usize,

    /// Maximum length of a generated answer in tokens
    #[arg(long, default_value_t = 128)]
    pub max_gen_len: usize,
}

/// All arguments for the `chat` command
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Name of the snapshot to answer from
    #[arg(long, default_value = "fine_tuned_t5_agriculture")]
    pub run_name: String,

    /// Directory holding model snapshots
    #[arg(long, default_value = "models")]
    pub models_dir: String,

    /// Number of beams kept during decoding
    #[arg(long, default_value_t = 4)]
    pub beam_width: usize,

    /// Maximum length of a generated answer in tokens
    #[arg(long, default_value_t = 128)]
    pub max_gen_len: usize,
}
