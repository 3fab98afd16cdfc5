//! # Tourney Identity 主程序
//!
//! 加载配置、迁移数据库、载入角色定义并启动 HTTP 服务

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use tourney_identity::{
    IdentityError, Result,
    app::AppContext,
    auth::SigningKeyProvider,
    config::{self, AppConfig},
    database, http, logging,
    rbac::Rbac,
};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "tourney-identity", version, about)]
struct Cli {
    /// 配置文件路径，缺省时按 RUST_ENV 查找 config/config.{env}.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;
    logging::init_logging(Some(config.logging.level.as_str()));

    if let Err(e) = run(config).await {
        error!(error = %e, "服务启动失败");
        return Err(e);
    }
    info!("服务正常关闭");
    Ok(())
}

async fn run(config: AppConfig) -> Result<()> {
    let db = database::init_database(&config.database).await?;
    database::run_migrations(&db).await?;
    database::check_database_status(&db).await?;

    let rbac = Rbac::from_path(&config.rbac.path)?;

    let bits = config.auth.signing_key_bits;
    let signing_key = tokio::task::spawn_blocking(move || SigningKeyProvider::generate(bits))
        .await
        .map_err(|e| IdentityError::server_error_with_source("签名密钥生成任务失败", e))??;
    info!(key_id = signing_key.key_id(), "签名密钥已生成");

    let context = AppContext::new(config, Arc::new(db), Arc::new(rbac), Arc::new(signing_key));
    http::serve(Arc::new(context)).await
}
