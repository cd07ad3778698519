// ==========================================
// 水洗尺寸质检系统 - 规格导入器实现
// ==========================================
// 职责: 整合导入流程, 从文件到结构化规格表
// 流程: 扩展名校验 → 解析（阻塞线程池）→ 过滤工作表 → 逐表清洗
// 红线: 单个工作表失败不影响同文件其他工作表
// ==========================================

use crate::config::ImportConfigReader;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::spec_importer_trait::{
    FileParser, SheetCleaner, SheetFailure, SpecImporter, WorkbookImport,
};
use crate::importer::spec_sheet_cleaner::SpecSheetCleaner;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

// ==========================================
// SpecImporterImpl - 规格导入器实现
// ==========================================
pub struct SpecImporterImpl<C>
where
    C: ImportConfigReader,
{
    // 配置读取器
    config: C,

    // 导入组件
    file_parser: Arc<dyn FileParser>,
    sheet_cleaner: Box<dyn SheetCleaner>,
}

impl<C> SpecImporterImpl<C>
where
    C: ImportConfigReader,
{
    /// 创建新的 SpecImporter 实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - file_parser: 文件解析器
    /// - sheet_cleaner: 规格表清洗器
    pub fn new(
        config: C,
        file_parser: Arc<dyn FileParser>,
        sheet_cleaner: Box<dyn SheetCleaner>,
    ) -> Self {
        Self {
            config,
            file_parser,
            sheet_cleaner,
        }
    }

    /// 默认组件: 通用文件解析器 + 固定版式清洗器
    pub fn with_config(config: C) -> Self {
        Self::new(
            config,
            Arc::new(UniversalFileParser),
            Box::new(SpecSheetCleaner::default()),
        )
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn check_extension(&self, file_path: &Path) -> ImportResult<()> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if !self.config.allows_extension(&ext) {
            return Err(ImportError::UnsupportedFormat(ext));
        }
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<C> SpecImporter for SpecImporterImpl<C>
where
    C: ImportConfigReader,
{
    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    async fn import_workbook(&self, file_path: &Path) -> ImportResult<WorkbookImport> {
        let start_time = Instant::now();
        info!("开始导入规格表");

        // === 步骤 1: 扩展名 / 存在性校验 ===
        self.check_extension(file_path)?;

        // === 步骤 2: 解析文件（阻塞 IO 放入 blocking 线程池）===
        debug!("步骤 2: 解析文件");
        let parser = Arc::clone(&self.file_parser);
        let owned_path = file_path.to_path_buf();
        let raw_sheets = tokio::task::spawn_blocking(move || parser.parse_to_sheets(&owned_path))
            .await
            .map_err(|e| ImportError::InternalError(format!("解析任务异常终止: {}", e)))?
            .map_err(|e| {
                error!(error = %e, "文件解析失败");
                e
            })?;

        info!(sheet_count = raw_sheets.len(), "文件解析完成");

        // === 步骤 3: 逐表清洗 ===
        let mut sheets = Vec::new();
        let mut failures = Vec::new();
        let mut skipped_sheets = Vec::new();

        for raw in raw_sheets {
            if self.config.ignored_sheet(&raw.name) {
                debug!(sheet = %raw.name, "工作表在忽略列表中, 跳过");
                skipped_sheets.push(raw.name);
                continue;
            }
            if raw.rows.iter().flatten().all(|c| c.is_blank()) {
                debug!(sheet = %raw.name, "空工作表, 跳过");
                skipped_sheets.push(raw.name);
                continue;
            }

            match self.sheet_cleaner.clean(&raw.rows, &raw.name) {
                Ok(sheet) => {
                    debug!(
                        sheet = %sheet.sheet_name,
                        rows = sheet.rows.len(),
                        sizes = sheet.headers.len(),
                        "工作表清洗完成"
                    );
                    sheets.push(sheet);
                }
                Err(e) if e.is_sheet_level() => {
                    warn!(sheet = %raw.name, error = %e, "工作表结构无法识别, 已跳过");
                    failures.push(SheetFailure {
                        sheet_name: raw.name,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(sheet = %raw.name, error = %e, "工作表清洗失败");
                    return Err(e);
                }
            }
        }

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        info!(
            sheets = sheets.len(),
            failures = failures.len(),
            skipped = skipped_sheets.len(),
            elapsed_ms = elapsed_ms,
            "规格表导入完成"
        );

        Ok(WorkbookImport {
            file_name,
            sheets,
            failures,
            skipped_sheets,
            elapsed_ms,
        })
    }

    async fn batch_import(&self, file_paths: Vec<PathBuf>) -> Vec<Result<WorkbookImport, String>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        // 为每个文件创建导入任务
        let import_tasks = file_paths.into_iter().map(|path| async move {
            let path_str = path.display().to_string();
            match self.import_workbook(&path).await {
                Ok(result) => {
                    info!(file = %path_str, sheets = result.sheets.len(), "文件导入成功");
                    Ok(result)
                }
                Err(e) => {
                    error!(file = %path_str, error = %e, "文件导入失败");
                    Err(format!("文件 {} 导入失败: {}", path_str, e))
                }
            }
        });

        // 并发执行所有导入任务
        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }
}
