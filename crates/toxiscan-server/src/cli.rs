use clap::Parser;
use std::path::PathBuf;
use toxiscan_classifiers::DeviceSpec;

#[derive(Parser, Debug)]
#[command(name = "toxiscan-server")]
#[command(author, version, about = "Toxic language detection API", long_about = None)]
pub struct Cli {
    /// Configuration file path (optional; defaults apply when missing)
    #[arg(short, long, default_value = "toxiscan.yaml")]
    pub config: String,

    /// Directory holding the fine-tuned model
    #[arg(short, long)]
    pub model_path: Option<PathBuf>,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Compute device: auto, cpu, cuda[:N] or metal[:N]
    #[arg(short, long)]
    pub device: Option<DeviceSpec>,

    /// Maximum tokens per input
    #[arg(long)]
    pub max_length: Option<usize>,

    /// Do not log logits and probabilities for each prediction
    #[arg(long)]
    pub quiet_scores: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
