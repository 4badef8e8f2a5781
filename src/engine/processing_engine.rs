// ProcessingEngine - 1回の変換セッション全体を管理
// 依存関係は全てコンストラクタで注入される

use super::cancel::CancelSignal;
use super::dispatcher::spawn_dispatcher;
use super::worker_pool::WorkerPool;
use crate::core::{
    CheckpointStore, ConversionResult, JobProcessor, OutputFormat, ProcessingConfig,
    ProcessingError, ProcessingResult, ProgressReporter, ResultStatus, SessionState,
};
use crate::services::{ConversionStatistics, FileCollector, PathResolver, StatisticsReport};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// 1セッションの処理結果
#[derive(Debug, Clone)]
pub struct ProcessingSummary {
    pub session_id: String,
    /// セッション開始時に宣言された総ファイル数
    pub total_files: usize,
    /// 今回の実行でディスパッチされたファイル数
    pub dispatched_files: usize,
    /// 過去の実行で処理済みとして除外されたファイル数
    pub previously_processed: usize,
    pub elapsed: Duration,
    pub cancelled: bool,
    pub report: StatisticsReport,
}

/// 変換パイプラインのエンジン
///
/// Collector → Dispatcher → WorkerPool → 結果処理ループ（チェックポイント・統計）
pub struct ProcessingEngine<C, R, P> {
    processor: Arc<dyn JobProcessor>,
    collector: FileCollector,
    resolver: PathResolver,
    config: C,
    reporter: Arc<R>,
    checkpoint: Arc<P>,
    checkpoint_enabled: bool,
    cancel: CancelSignal,
}

impl<C, R, P> ProcessingEngine<C, R, P>
where
    C: ProcessingConfig,
    R: ProgressReporter + 'static,
    P: CheckpointStore + 'static,
{
    pub fn new(
        processor: Arc<dyn JobProcessor>,
        collector: FileCollector,
        resolver: PathResolver,
        config: C,
        reporter: R,
        checkpoint: P,
    ) -> Self {
        Self {
            processor,
            collector,
            resolver,
            config,
            reporter: Arc::new(reporter),
            checkpoint: Arc::new(checkpoint),
            checkpoint_enabled: true,
            cancel: CancelSignal::new(),
        }
    }

    /// チェックポイントの保存を有効・無効にする
    pub fn with_checkpointing(mut self, enabled: bool) -> Self {
        self.checkpoint_enabled = enabled;
        self
    }

    /// 外部（Ctrl-C等）から処理を止めるための信号
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    pub fn checkpoint(&self) -> &P {
        &self.checkpoint
    }

    /// 新しいセッションとして入力ディレクトリを変換
    pub async fn run(
        &self,
        input_dir: &Path,
        format: OutputFormat,
    ) -> ProcessingResult<ProcessingSummary> {
        self.execute(input_dir, format, None).await
    }

    /// 保存済みセッションを再開する（無ければ None）
    ///
    /// 記録された入力ディレクトリとフォーマットで再収集し、処理済みファイルは除外する。
    pub async fn resume(&self) -> ProcessingResult<Option<ProcessingSummary>> {
        let Some(state) = self
            .checkpoint
            .load()
            .await
            .map_err(ProcessingError::checkpoint)?
        else {
            return Ok(None);
        };

        info!(
            session_id = %state.session_id,
            input_dir = %state.input_dir.display(),
            format = %state.target_format,
            processed = state.processed_count(),
            total = state.total_files,
            "Resuming session"
        );

        let input_dir = state.input_dir.clone();
        let format = state.target_format;
        self.execute(&input_dir, format, Some(state)).await.map(Some)
    }

    async fn execute(
        &self,
        input_dir: &Path,
        format: OutputFormat,
        resumed: Option<SessionState>,
    ) -> ProcessingResult<ProcessingSummary> {
        let start_time = Instant::now();

        if self.config.worker_count() == 0 {
            return Err(ProcessingError::configuration(
                "ワーカー数は1以上である必要があります",
            ));
        }

        // セッションには絶対パスで記録する（再開はカレントディレクトリに依存しない）
        let root = std::fs::canonicalize(input_dir)
            .map_err(|e| ProcessingError::file_discovery(input_dir, e))?;
        let input_dir = root.as_path();
        let records = self.collector.collect(input_dir)?;

        let is_resume = resumed.is_some();
        let (mut state, pending) = match resumed {
            Some(state) => {
                let pending: Vec<_> = {
                    let processed = state.processed_set();
                    records
                        .into_iter()
                        .filter(|r| !processed.contains(r.path.as_path()))
                        .collect()
                };
                (state, pending)
            }
            None => {
                let total = records.len();
                (SessionState::new(input_dir, format, total), records)
            }
        };
        let previously_processed = state.processed_count();

        info!(
            session_id = %state.session_id,
            input_dir = %input_dir.display(),
            format = %format,
            pending = pending.len(),
            "Starting conversion"
        );

        if pending.is_empty() {
            // 再開時に残りが無ければセッションを閉じる
            if is_resume {
                self.clear_checkpoint().await;
            }
            return Ok(ProcessingSummary {
                session_id: state.session_id,
                total_files: state.total_files,
                dispatched_files: 0,
                previously_processed,
                elapsed: start_time.elapsed(),
                cancelled: false,
                report: ConversionStatistics::new().finalize(),
            });
        }

        self.save_checkpoint(&state).await;

        let pending_count = pending.len();
        self.reporter.report_started(pending_count).await;

        let mut pool = WorkerPool::start(
            Arc::clone(&self.processor),
            &self.config,
            self.cancel.clone(),
        );
        let mut results = pool.take_results().ok_or(ProcessingError::PoolClosed)?;
        let submitter = pool.submitter().ok_or(ProcessingError::PoolClosed)?;
        let dispatcher = spawn_dispatcher(
            pending,
            input_dir.to_path_buf(),
            format,
            self.resolver.clone(),
            submitter,
        );
        // 以降の投入口はディスパッチャーのみ
        pool.close();

        let statistics = self
            .consume_results(&mut results, &mut state, pending_count)
            .await;

        let dispatched_files = dispatcher.await.map_err(ProcessingError::task)?;
        pool.stop().await?;

        let report = statistics.finalize();
        self.reporter
            .report_completed(report.converted_files, report.skipped_files, report.failed_files)
            .await;

        // 全件の結果を受け取っていれば、その後のキャンセルは無視する
        let finished = report.total_files == pending_count;
        let cancelled = self.cancel.is_cancelled() && !finished;
        if cancelled {
            warn!(
                session_id = %state.session_id,
                processed = state.processed_count(),
                "Conversion cancelled, session kept for resume"
            );
        } else {
            self.clear_checkpoint().await;
            info!(
                session_id = %state.session_id,
                converted = report.converted_files,
                skipped = report.skipped_files,
                failed = report.failed_files,
                "Conversion completed"
            );
        }

        Ok(ProcessingSummary {
            session_id: state.session_id,
            total_files: state.total_files,
            dispatched_files,
            previously_processed,
            elapsed: start_time.elapsed(),
            cancelled,
            report,
        })
    }

    /// 結果処理ループ（単一コンシューマ）
    ///
    /// 結果ストリームが閉じるまで読み続ける。待ち時間が閾値を超えても警告して継続する。
    async fn consume_results(
        &self,
        results: &mut mpsc::Receiver<ConversionResult>,
        state: &mut SessionState,
        total: usize,
    ) -> ConversionStatistics {
        let mut statistics = ConversionStatistics::new();
        let mut completed = 0;
        let idle_timeout = self.config.idle_timeout();

        loop {
            let result = match tokio::time::timeout(idle_timeout, results.recv()).await {
                Ok(Some(result)) => result,
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        completed,
                        total,
                        timeout_secs = idle_timeout.as_secs(),
                        "Processing timeout, continuing..."
                    );
                    continue;
                }
            };

            completed += 1;
            statistics.add_result(&result);
            log_result(&result);
            self.reporter.report_result(&result, completed, total).await;

            state.record(result.original_path);
            self.save_checkpoint(state).await;
        }

        statistics
    }

    async fn save_checkpoint(&self, state: &SessionState) {
        if !self.checkpoint_enabled {
            return;
        }
        if let Err(err) = self.checkpoint.save(state).await {
            warn!(error = %format!("{err:#}"), "Failed to save checkpoint");
        }
    }

    async fn clear_checkpoint(&self) {
        if !self.checkpoint_enabled {
            return;
        }
        if let Err(err) = self.checkpoint.clear().await {
            warn!(error = %format!("{err:#}"), "Failed to clear checkpoint");
        }
    }
}

fn log_result(result: &ConversionResult) {
    let path = result.original_path.display();
    match result.status() {
        ResultStatus::Failed => {
            if let Some(err) = &result.error {
                error!(path = %path, error = %err, "Conversion failed");
            }
        }
        ResultStatus::Skipped => match &result.new_path {
            Some(new_path) => info!(path = %path, new_path = %new_path.display(), "[DRY-RUN] Would convert"),
            None => debug!(path = %path, "Skipped"),
        },
        ResultStatus::Converted => {
            if let Some(new_path) = &result.new_path {
                info!(
                    path = %path,
                    new_path = %new_path.display(),
                    original_size = result.original_size,
                    new_size = result.new_size,
                    "Converted"
                );
            }
        }
    }
}
