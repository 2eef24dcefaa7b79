use anyhow::Result;
use audioquote::core::log::init_logging;
use audioquote::core::{Currency, FormulaId};
use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Default)]
struct QuoteArgs {
    /// Audio duration in minutes
    #[arg(short, long)]
    minutes: Option<f64>,

    /// Pricing formula: hyperbolic, power or logarithmic
    #[arg(short, long)]
    formula: Option<FormulaId>,

    /// Shape parameter A, clamped to the formula's range
    #[arg(short = 'a', long = "param-a", allow_negative_numbers = true)]
    param_a: Option<f64>,

    /// Shape parameter B, clamped to the formula's range
    #[arg(short = 'b', long = "param-b", allow_negative_numbers = true)]
    param_b: Option<f64>,

    /// Flat fee added to every quote, in USD
    #[arg(long)]
    base_fee: Option<f64>,

    /// Display currency: USD, UAH or EUR
    #[arg(short = 'u', long)]
    currency: Option<Currency>,

    /// Use fallback exchange rates without contacting any endpoint
    #[arg(long)]
    offline: bool,
}

impl From<QuoteArgs> for audioquote::QuoteOptions {
    fn from(args: QuoteArgs) -> Self {
        audioquote::QuoteOptions {
            minutes: args.minutes,
            formula: args.formula,
            param_a: args.param_a,
            param_b: args.param_b,
            base_fee: args.base_fee,
            currency: args.currency,
            offline: args.offline,
        }
    }
}

impl From<Commands> for audioquote::AppCommand {
    fn from(cmd: Commands) -> audioquote::AppCommand {
        match cmd {
            Commands::Formulas => audioquote::AppCommand::Formulas,
            Commands::Rates => audioquote::AppCommand::Rates,
            Commands::Quote(args) => audioquote::AppCommand::Quote(args.into()),
            Commands::Curve { quote, max, step } => audioquote::AppCommand::Curve {
                options: quote.into(),
                max_duration: max,
                step,
            },
            Commands::Interactive(args) => audioquote::AppCommand::Interactive(args.into()),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List the available pricing formulas
    Formulas,
    /// Fetch and display current exchange rates
    Rates,
    /// Price a single audio duration
    Quote(QuoteArgs),
    /// Print the sampled price curve
    Curve {
        #[command(flatten)]
        quote: QuoteArgs,

        /// Longest duration to sample, in minutes
        #[arg(long)]
        max: Option<f64>,

        /// Sampling step, in minutes
        #[arg(long)]
        step: Option<f64>,
    },
    /// Adjust the quote interactively while rates refresh in the background
    Interactive(QuoteArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => audioquote::cli::setup::setup(),
        Some(cmd) => audioquote::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
