use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins over the built-in directives.
fn env_filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// 命令列模式：精簡輸出，`-v` 時顯示 debug 與上游請求細節
pub fn init_cli_logger(verbose: bool) {
    let directives = if verbose {
        "farm_advisor=debug,reqwest=debug,info"
    } else {
        "farm_advisor=info,warn"
    };

    tracing_subscriber::registry()
        .with(env_filter(directives))
        .with(
            fmt::layer()
                .with_target(verbose)
                .without_time()
                .compact(),
        )
        .init();
}

/// 服務模式：可選 JSON 格式，方便集中式日誌收集
pub fn init_server_logger(json: bool) {
    let registry = tracing_subscriber::registry()
        .with(env_filter("farm_advisor=info,tower_http=info,axum=info"));

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}
