use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};

use bankflow::cli::{
    handle_config_command, run_joint_application, run_payment, ConfigArgs, JointArgs, PayArgs,
    Prompter,
};
use bankflow::config::{BankflowPaths, Settings};

#[derive(Parser)]
#[command(
    name = "bankflow",
    author = "Kaylee Beyene",
    version,
    about = "Multi-step banking flows in the terminal",
    long_about = "bankflow walks through staged banking flows: opening a joint \
                  account with an invited partner, and making a payment with an \
                  explicit review and authorization before anything is sent."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply for a joint account
    Joint(JointArgs),

    /// Make a payment
    #[command(alias = "payment")]
    Pay(PayArgs),

    /// Show current configuration and paths
    Config(ConfigArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = BankflowPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    bankflow::logging::init(&settings.log_filter)?;

    tracing::debug!(config_dir = %paths.base_dir().display(), "settings loaded");

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    match cli.command {
        Some(Commands::Joint(args)) => {
            run_joint_application(&settings, &args, &mut prompter).await?;
        }
        Some(Commands::Pay(args)) => {
            run_payment(&settings, &args, &mut prompter).await?;
        }
        Some(Commands::Config(args)) => {
            handle_config_command(&paths, &settings, &args, &mut io::stdout())?;
        }
        None => {
            println!("bankflow - multi-step banking flows");
            println!();
            println!("Run 'bankflow --help' for usage information.");
            println!("Run 'bankflow joint' to open a joint account or 'bankflow pay' to make a payment.");
        }
    }

    Ok(())
}
