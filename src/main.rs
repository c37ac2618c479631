use clap::Parser;
use farm_advisor::adapters::openai::OpenAiClient;
use farm_advisor::app::grants::build_index;
use farm_advisor::app::recommend::RecommendRequest;
use farm_advisor::app::report::{action_plan, write_bundle};
use farm_advisor::config::{Command, GrantsCommand};
use farm_advisor::core::catalog::load_programs;
use farm_advisor::core::checklist::application_checklist;
use farm_advisor::domain::model::FarmerProfile;
use farm_advisor::server::{serve, ServerState};
use farm_advisor::utils::error::ErrorSeverity;
use farm_advisor::utils::{logger, validation::Validate};
use farm_advisor::{AdvisorError, AdvisorServices, AdvisorySession, AppConfig, Cli, LocalStorage, Result};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match AppConfig::load(Some(&cli.config)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    match &cli.command {
        Command::Serve { json_logs, .. } => {
            logger::init_server_logger(*json_logs || config.server.json_logs)
        }
        _ => logger::init_cli_logger(cli.verbose),
    }
    tracing::debug!("Loaded configuration from {}", cli.config.display());

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 依錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 4,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    let data_storage = LocalStorage::new(".");

    match command {
        Command::Serve { addr, .. } => {
            let services = AdvisorServices::from_config(&config, &data_storage).await?;
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            tracing::info!("Starting farm-advisor service on {}", addr);
            serve(&addr, ServerState::new(services.advisor, services.market)).await
        }
        Command::Recommend { location } => {
            let services = AdvisorServices::from_config(&config, &data_storage).await?;
            let request = RecommendRequest {
                location_name: location.location.clone(),
                latitude: location.lat,
                longitude: location.lon,
                profile: None,
            };
            let advice = services.advisor.recommend(&request).await?;
            print_json(&advice)
        }
        Command::Market { commodity } => {
            let services = AdvisorServices::from_config(&config, &data_storage).await?;
            let outlook = services.market.predict(&commodity).await?;
            print_json(&outlook)
        }
        Command::Grants { command } => run_grants(command, &config, &data_storage).await,
        Command::Plan {
            profile,
            output_path,
            bundle_name,
        } => {
            let profile = profile.to_profile()?;
            let services = AdvisorServices::from_config(&config, &data_storage).await?;
            let session = run_wizard(&services, profile).await?;

            println!("{}", action_plan(&session)?);

            let output = LocalStorage::new(output_path);
            write_bundle(&output, &bundle_name, &session).await?;
            println!("📁 Advisory bundle saved to: {}", output.resolve(&bundle_name).display());
            Ok(())
        }
    }
}

async fn run_grants(command: GrantsCommand, config: &AppConfig, storage: &LocalStorage) -> Result<()> {
    match command {
        GrantsCommand::Ask {
            question,
            beginning_farmer,
            veteran,
            state,
            farm_size,
        } => {
            let services = AdvisorServices::from_config(config, storage).await?;
            let finder = services.grants.ok_or_else(|| AdvisorError::IndexError {
                message: "grant catalog or index could not be loaded".to_string(),
            })?;

            let profile = FarmerProfile {
                beginning_farmer,
                veteran,
                state,
                farm_size_acres: farm_size.unwrap_or(100),
                ..Default::default()
            };
            let answer = finder.ask(&question, Some(&profile), &[]).await?;

            println!("{}\n", answer.answer);
            println!("Source: {}", answer.strategy.badge());
            for m in &answer.local_matches {
                println!(
                    "  • {} ({}%, {})",
                    m.program.program_name,
                    m.match_score,
                    m.band().label()
                );
            }
            Ok(())
        }
        GrantsCommand::Checklist { program_id } => {
            let programs = load_programs(storage, &config.grants.catalog_path).await?;
            let program = programs
                .iter()
                .find(|p| p.program_id == program_id)
                .ok_or_else(|| AdvisorError::InvalidRequest {
                    message: format!("no program with id '{}'", program_id),
                })?;
            println!("{}", application_checklist(program));
            Ok(())
        }
        GrantsCommand::BuildIndex => {
            let openai = OpenAiClient::new(&config.openai, &config.http)?;
            build_index(
                storage,
                &openai,
                &config.grants.catalog_path,
                &config.grants.index_path,
                openai.embedding_model(),
            )
            .await?;
            Ok(())
        }
    }
}

/// 依序執行精靈的五個步驟
async fn run_wizard(services: &AdvisorServices, profile: FarmerProfile) -> Result<AdvisorySession> {
    let mut session = AdvisorySession::new();

    session.submit_profile(profile)?;
    tracing::info!("▶️ {}", session.step());
    session.run_soil_climate(&services.advisor).await?;

    tracing::info!("▶️ {}", session.advance()?);
    session.run_markets(&services.market).await?;

    tracing::info!("▶️ {}", session.advance()?);
    session.run_grants(services.grants.as_ref()).await?;

    tracing::info!("▶️ {}", session.advance()?);
    Ok(session)
}
