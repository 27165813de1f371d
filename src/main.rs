use clap::Parser;
use love_sandwiches::utils::{logger, validation::Validate};
use love_sandwiches::{
    Cli, Command, ConfiguredTokens, GoogleSheetsGateway, HistoryFormat, ReportRunner, SalesPrompt, SheetsConfig,
    SheetsError,
};
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting love-sandwiches");
    // keep machine-readable history output clean
    if !matches!(
        cli.command(),
        Command::History {
            format: HistoryFormat::Json | HistoryFormat::Csv,
            ..
        }
    ) {
        println!("Welcome to Love Sandwiches Data Automation\n");
    }

    let mut config = match SheetsConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(e.exit_code());
        }
    };
    cli.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }
    if cli.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    if let Err(e) = run(cli.command(), config).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    Ok(())
}

async fn run(command: Command, config: SheetsConfig) -> Result<(), SheetsError> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.spreadsheet.timeout_seconds {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build()?;

    let tokens = ConfiguredTokens::from_config(client.clone(), &config.credentials)?;
    let gateway = GoogleSheetsGateway::connect(client, &config.spreadsheet, tokens).await?;

    let trim_whitespace = config.input.trim_whitespace;
    let max_attempts = config.input.max_attempts;
    let runner = ReportRunner::new(gateway, config);

    match command {
        Command::Update { .. } => {
            let mut prompt = SalesPrompt::stdio()
                .with_trim_whitespace(trim_whitespace)
                .with_max_attempts(max_attempts);
            let outcome = runner.run_update_cycle(&mut prompt).await?;
            tracing::info!("✅ Surplus recorded: {:?}", outcome.surplus.values());
        }
        Command::History { format, .. } => {
            let history = runner
                .print_recent_sales_history(format, std::io::stdout().lock())
                .await?;
            tracing::info!("✅ Printed {} entries per sandwich", history.depth());
        }
    }

    Ok(())
}
