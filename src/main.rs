// ==========================================
// 水洗尺寸质检系统 - 命令行入口
// ==========================================
// 用法: washing-qa <file>...
// 输出: 每个文件的导入结果（JSON 数组, stdout）
// ==========================================

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::path::PathBuf;
use washing_qa::config::ConfigManager;
use washing_qa::importer::{SpecImporter, SpecImporterImpl};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志系统
    washing_qa::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 规格表导入", washing_qa::APP_NAME);
    tracing::info!("系统版本: {}", washing_qa::VERSION);
    tracing::info!("==================================================");

    let file_paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if file_paths.is_empty() {
        bail!("用法: washing-qa <file>...");
    }

    let config = ConfigManager::load_default().context("配置加载失败")?;
    if let Some(path) = config.path() {
        tracing::info!("使用配置: {}", path.display());
    }

    let importer = SpecImporterImpl::with_config(config);
    let results = importer.batch_import(file_paths.clone()).await;

    let output: Vec<_> = file_paths
        .iter()
        .zip(results)
        .map(|(path, result)| match result {
            Ok(import) => json!({ "file": path.display().to_string(), "ok": true, "result": import }),
            Err(message) => json!({ "file": path.display().to_string(), "ok": false, "error": message }),
        })
        .collect();

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("结果序列化失败")?
    );
    Ok(())
}
