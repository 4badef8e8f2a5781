// WorkerPool - 固定数ワーカーによる並列変換

use super::cancel::CancelSignal;
use super::rate_limit::RateLimiter;
use crate::core::{
    ConversionResult, ConvertError, Job, JobProcessor, ProcessingConfig, ProcessingError,
    ProcessingResult,
};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

/// ジョブ投入口（ディスパッチャー用）
///
/// 全ての投入口とプール自身の送信側が閉じるとキューが閉じる。
#[derive(Debug, Clone)]
pub struct JobSubmitter {
    tx: mpsc::Sender<Job>,
    cancel: CancelSignal,
}

impl JobSubmitter {
    /// キューに空きができるまで待って投入する
    ///
    /// キャンセル済み、またはワーカーが全て終了している場合はエラー。
    pub async fn submit(&self, job: Job) -> ProcessingResult<()> {
        if self.cancel.is_cancelled() {
            return Err(ProcessingError::PoolClosed);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProcessingError::PoolClosed),
            sent = self.tx.send(job) => sent.map_err(|_| ProcessingError::PoolClosed),
        }
    }
}

/// 固定数ワーカーのプール
///
/// 結果チャンネルの送信側は各ワーカーだけが持つため、
/// 最後のワーカーが終了した時点で結果ストリームが閉じる。
pub struct WorkerPool {
    job_tx: Option<mpsc::Sender<Job>>,
    result_rx: Option<mpsc::Receiver<ConversionResult>>,
    workers: Vec<JoinHandle<()>>,
    cancel: CancelSignal,
}

impl WorkerPool {
    /// ワーカーを起動する
    pub fn start(
        processor: Arc<dyn JobProcessor>,
        config: &dyn ProcessingConfig,
        cancel: CancelSignal,
    ) -> Self {
        let worker_count = config.worker_count().max(1);
        let capacity = config.channel_buffer_size().max(worker_count * 2);

        let (job_tx, job_rx) = mpsc::channel::<Job>(capacity);
        let (result_tx, result_rx) = mpsc::channel::<ConversionResult>(capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let limiter = config.rate_limit().and_then(RateLimiter::new).map(Arc::new);

        debug!(
            worker_count,
            capacity,
            rate_limit = ?config.rate_limit(),
            "Starting worker pool"
        );

        let workers = (0..worker_count)
            .map(|worker_id| {
                spawn_worker(
                    worker_id,
                    Arc::clone(&processor),
                    Arc::clone(&job_rx),
                    result_tx.clone(),
                    limiter.clone(),
                    cancel.clone(),
                )
            })
            .collect();

        Self {
            job_tx: Some(job_tx),
            result_rx: Some(result_rx),
            workers,
            cancel,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// ディスパッチャー用の投入口（停止後は None）
    pub fn submitter(&self) -> Option<JobSubmitter> {
        self.job_tx.as_ref().map(|tx| JobSubmitter {
            tx: tx.clone(),
            cancel: self.cancel.clone(),
        })
    }

    pub async fn submit(&self, job: Job) -> ProcessingResult<()> {
        match self.submitter() {
            Some(submitter) => submitter.submit(job).await,
            None => Err(ProcessingError::PoolClosed),
        }
    }

    /// 結果の受信側を取り出す（一度だけ）
    pub fn take_results(&mut self) -> Option<mpsc::Receiver<ConversionResult>> {
        self.result_rx.take()
    }

    /// 新規ジョブの受付を止める
    ///
    /// キューに残ったジョブはワーカーが処理し切ってから終了する。
    pub fn close(&mut self) {
        self.job_tx = None;
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 受付を止め、全ワーカーの終了を待つ
    ///
    /// 結果の受信側を保持したまま呼ぶ場合、結果を読み続けないと
    /// ワーカーが送信待ちで止まる点に注意。
    pub async fn stop(&mut self) -> ProcessingResult<()> {
        self.close();
        let mut first_error = None;
        for handle in self.workers.drain(..) {
            if let Err(err) = handle.await {
                first_error.get_or_insert(ProcessingError::task(err));
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn spawn_worker(
    worker_id: usize,
    processor: Arc<dyn JobProcessor>,
    job_rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    result_tx: mpsc::Sender<ConversionResult>,
    limiter: Option<Arc<RateLimiter>>,
    cancel: CancelSignal,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            // 次のジョブを取得
            let job = {
                let mut rx = job_rx.lock().await;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    job = rx.recv() => job,
                }
            };
            let Some(job) = job else {
                break; // キュー終了またはキャンセル
            };

            if let Some(limiter) = &limiter {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = limiter.acquire() => {}
                }
            }
            if cancel.is_cancelled() {
                break;
            }

            let source = job.source.clone();
            let processor = Arc::clone(&processor);
            let result = match tokio::task::spawn_blocking(move || processor.process(&job)).await
            {
                Ok(result) => result,
                Err(err) => ConversionResult::failed(&source, ConvertError::Internal(err.to_string())),
            };

            debug!(
                worker_id,
                path = %result.original_path.display(),
                status = ?result.status(),
                elapsed_ms = result.duration.as_millis() as u64,
                "Job completed"
            );

            // 完了済みの結果は空きがある限りキャンセル後でも届ける
            let result = match result_tx.try_send(result) {
                Ok(()) => continue,
                Err(TrySendError::Closed(_)) => break, // 結果の受信側が閉じられた
                Err(TrySendError::Full(result)) => result,
            };
            tokio::select! {
                biased;
                sent = result_tx.send(result) => {
                    if sent.is_err() {
                        break;
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }
        debug!(worker_id, "Worker exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::MockJobProcessor;
    use crate::core::OutputFormat;
    use crate::services::DefaultProcessingConfig;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::time::timeout;

    fn echo_processor() -> Arc<dyn JobProcessor> {
        let mut processor = MockJobProcessor::new();
        processor.expect_process().returning(|job| {
            let mut result = ConversionResult::new(job.source.clone());
            result.new_path = Some(job.destination());
            result.new_size = 1;
            result
        });
        Arc::new(processor)
    }

    fn slow_processor(delay: Duration) -> Arc<dyn JobProcessor> {
        let mut processor = MockJobProcessor::new();
        processor.expect_process().returning(move |job| {
            std::thread::sleep(delay);
            ConversionResult::new(job.source.clone())
        });
        Arc::new(processor)
    }

    async fn run_jobs(job_count: usize, workers: usize, rate: Option<f64>) -> Vec<PathBuf> {
        let config = DefaultProcessingConfig::new(workers).with_rate_limit(rate);
        let mut pool = WorkerPool::start(echo_processor(), &config, CancelSignal::new());
        let mut results = pool.take_results().unwrap();
        let submitter = pool.submitter().unwrap();
        pool.close();

        let dispatcher = tokio::spawn(async move {
            for i in 0..job_count {
                submitter
                    .submit(Job::new(format!("/in/{i}.png"), OutputFormat::Webp))
                    .await
                    .unwrap();
            }
        });

        let mut received = Vec::new();
        while let Some(result) = results.recv().await {
            received.push(result.original_path);
        }
        dispatcher.await.unwrap();
        pool.stop().await.unwrap();
        received
    }

    fn assert_exactly_once(received: &[PathBuf], job_count: usize) {
        assert_eq!(received.len(), job_count);
        let unique: HashSet<_> = received.iter().collect();
        assert_eq!(unique.len(), job_count);
    }

    #[tokio::test]
    async fn test_every_job_yields_one_result() {
        for job_count in [0, 1, 7, 500] {
            let received = run_jobs(job_count, 4, None).await;
            assert_exactly_once(&received, job_count);
        }
    }

    #[tokio::test]
    async fn test_single_worker() {
        let received = run_jobs(50, 1, None).await;
        assert_exactly_once(&received, 50);
    }

    #[tokio::test]
    async fn test_rate_limited_pool_delivers_everything() {
        let start = std::time::Instant::now();
        let received = run_jobs(6, 3, Some(50.0)).await;

        assert_exactly_once(&received, 6);
        // 6件目の開始は5間隔（100ms）以降
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_close_drains_queued_jobs() {
        let config = DefaultProcessingConfig::new(2).with_buffer_size(16);
        let mut pool = WorkerPool::start(
            slow_processor(Duration::from_millis(5)),
            &config,
            CancelSignal::new(),
        );
        let mut results = pool.take_results().unwrap();

        for i in 0..10 {
            pool.submit(Job::new(format!("/in/{i}.png"), OutputFormat::Png))
                .await
                .unwrap();
        }
        pool.close();
        assert!(matches!(
            pool.submit(Job::new("/late.png", OutputFormat::Png)).await,
            Err(ProcessingError::PoolClosed)
        ));

        let mut count = 0;
        while results.recv().await.is_some() {
            count += 1;
        }
        pool.stop().await.unwrap();
        assert_eq!(count, 10);
    }

    #[tokio::test]
    async fn test_cancel_stops_intake_and_closes_results_after_workers() {
        let config = DefaultProcessingConfig::new(2).with_buffer_size(32);
        let cancel = CancelSignal::new();
        let mut pool = WorkerPool::start(
            slow_processor(Duration::from_millis(20)),
            &config,
            cancel.clone(),
        );
        let mut results = pool.take_results().unwrap();
        let submitter = pool.submitter().unwrap();

        for i in 0..20 {
            submitter
                .submit(Job::new(format!("/in/{i}.png"), OutputFormat::Jpg))
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();

        assert!(pool.is_cancelled());
        assert!(matches!(
            submitter.submit(Job::new("/late.png", OutputFormat::Jpg)).await,
            Err(ProcessingError::PoolClosed)
        ));

        timeout(Duration::from_secs(5), pool.stop())
            .await
            .unwrap()
            .unwrap();

        // 全ワーカー終了後なので、受信側は残りを読み切ると閉じている
        let mut delivered = 0;
        while let Some(_result) = timeout(Duration::from_secs(1), results.recv())
            .await
            .unwrap()
        {
            delivered += 1;
        }
        assert!(delivered < 20);
    }

    #[tokio::test]
    async fn test_finished_job_is_delivered_after_cancel() {
        let cancel = CancelSignal::new();
        let mut processor = MockJobProcessor::new();
        let cancel_in_job = cancel.clone();
        processor.expect_process().times(1).returning(move |job| {
            // 変換の完了直後にキャンセルが届いた状況
            cancel_in_job.cancel();
            ConversionResult::new(job.source.clone())
        });
        let config = DefaultProcessingConfig::new(1).with_buffer_size(16);
        let mut pool = WorkerPool::start(Arc::new(processor), &config, cancel.clone());
        let mut results = pool.take_results().unwrap();

        pool.submit(Job::new("/done.png", OutputFormat::Webp))
            .await
            .unwrap();
        timeout(Duration::from_secs(5), pool.stop())
            .await
            .unwrap()
            .unwrap();

        let mut delivered = Vec::new();
        while let Some(result) = results.recv().await {
            delivered.push(result.original_path);
        }
        assert!(cancel.is_cancelled());
        assert_eq!(delivered, vec![PathBuf::from("/done.png")]);
    }

    #[tokio::test]
    async fn test_rate_limit_wait_is_cancellable() {
        let config = DefaultProcessingConfig::new(1).with_rate_limit(Some(0.1));
        let cancel = CancelSignal::new();
        let mut pool = WorkerPool::start(echo_processor(), &config, cancel.clone());
        let mut results = pool.take_results().unwrap();

        pool.submit(Job::new("/a.png", OutputFormat::Webp)).await.unwrap();
        pool.submit(Job::new("/b.png", OutputFormat::Webp)).await.unwrap();
        // 1件目は即座に処理され、2件目は10秒後の枠を待つ
        assert!(results.recv().await.is_some());

        cancel.cancel();
        timeout(Duration::from_secs(1), pool.stop())
            .await
            .unwrap()
            .unwrap();
        assert!(results.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_submitter_absent_after_close() {
        let config = DefaultProcessingConfig::new(1);
        let mut pool = WorkerPool::start(echo_processor(), &config, CancelSignal::new());

        assert_eq!(pool.worker_count(), 1);
        assert!(pool.submitter().is_some());
        pool.close();
        assert!(pool.submitter().is_none());
        pool.stop().await.unwrap();
    }
}
