// Dispatcher - 収集済みファイルをジョブとして配信

use super::worker_pool::JobSubmitter;
use crate::core::{FileRecord, Job, OutputFormat};
use crate::services::PathResolver;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::debug;

/// 1ファイル分のジョブを作る（出力先はここで解決する）
pub fn build_job(
    resolver: &PathResolver,
    input_root: &std::path::Path,
    record: &FileRecord,
    format: OutputFormat,
) -> Job {
    let destination = resolver.resolve(input_root, &record.path, format);
    Job::new(record.path.clone(), format).with_output_path(destination)
}

/// ディスパッチャー起動。投入できたジョブ数を返す。
///
/// 終了時に投入口をdropするので、プール側がcloseしていればキューが閉じる。
pub fn spawn_dispatcher(
    records: Vec<FileRecord>,
    input_root: PathBuf,
    format: OutputFormat,
    resolver: PathResolver,
    submitter: JobSubmitter,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut dispatched = 0;
        for record in &records {
            let job = build_job(&resolver, &input_root, record, format);
            if submitter.submit(job).await.is_err() {
                // キャンセルまたはプール停止
                debug!(dispatched, remaining = records.len() - dispatched, "Dispatch stopped");
                break;
            }
            dispatched += 1;
        }
        dispatched
    })
}
