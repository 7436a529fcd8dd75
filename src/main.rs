use bill_split_rust::{api, db, AppConfig, Adjustment, InMemoryBillStore, SplitService};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let default_adjustment: Adjustment = config.split.default_adjustment.parse()?;

    // 内存账单仓库, 可选预置数据
    let store = Arc::new(InMemoryBillStore::new());
    if let Some(path) = &config.seed.path {
        let count = db::load_seed(store.as_ref(), Path::new(path)).await?;
        info!("Seeded {} bills from {}", count, path);
    }

    let service = Arc::new(SplitService::new(store, default_adjustment));

    let app = api::router(service).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/bills                          - ingest parsed bill");
    info!("  PUT  /api/bills/:bill_id/votes/:user_id  - submit votes");
    info!("  GET  /api/bills/:bill_id/split           - split (JSON, ?adjust=)");
    info!("  GET  /api/bills/:bill_id/split/message   - split (Telegram text)");
    info!("  GET  /api/bills/:bill_id/split/csv       - split (CSV)");
    info!("  POST /api/split/batch                    - batch split");
    info!("Default adjustment: {}", default_adjustment);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
