//! # 批量执行器
//!
//! 并行处理一组帧，结果按输入顺序返回。
//!
//! ## 功能
//! - 基于 rayon 线程池的并行迭代（jobs = 1 时严格顺序执行）
//! - 每帧开始前检查取消标志
//! - 首个错误即中止（其余帧不再开始），进度条清除
//!
//! ## 依赖关系
//! - 被 `commands/batch.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{Result, WaxsError};
use crate::utils::progress;

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 协作式取消标志
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
    cancel: CancelToken,
    show_progress: bool,
}

impl BatchRunner {
    /// 创建新的批量执行器，jobs = 0 时使用全部 CPU
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self {
            jobs,
            cancel: CancelToken::new(),
            show_progress: true,
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 处理文件列表，返回与输入同序的结果
    ///
    /// `processor` 收到 (下标, 路径)。任一帧出错或取消时返回第一个错误。
    pub fn run<T, F>(&self, files: &[PathBuf], processor: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize, &Path) -> Result<T> + Sync + Send,
    {
        let pb = if self.show_progress {
            progress::create_progress_bar(files.len() as u64, "Integrating")
        } else {
            indicatif::ProgressBar::hidden()
        };

        let process = |index: usize, file: &PathBuf| -> Result<T> {
            if self.cancel.is_cancelled() {
                return Err(WaxsError::Cancelled);
            }
            let result = processor(index, file);
            if result.is_err() {
                // 其余帧不再开始
                self.cancel.cancel();
            }
            pb.inc(1);
            result
        };

        let results = if self.jobs == 1 {
            files
                .iter()
                .enumerate()
                .map(|(i, f)| process(i, f))
                .collect::<Result<Vec<T>>>()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()
                .map_err(|e| WaxsError::Computation(format!("thread pool: {}", e)))?;
            let outcomes = pool.install(|| {
                files
                    .par_iter()
                    .enumerate()
                    .map(|(i, f)| process(i, f))
                    .collect::<Vec<Result<T>>>()
            });
            merge_outcomes(outcomes)
        };

        pb.finish_and_clear();
        results
    }
}

/// 合并并行结果：真实错误优先于因其触发的 `Cancelled`
fn merge_outcomes<T>(outcomes: Vec<Result<T>>) -> Result<Vec<T>> {
    let mut values = Vec::with_capacity(outcomes.len());
    let mut cancelled = false;
    for outcome in outcomes {
        match outcome {
            Ok(value) => values.push(value),
            Err(WaxsError::Cancelled) => cancelled = true,
            Err(e) => return Err(e),
        }
    }
    if cancelled {
        return Err(WaxsError::Cancelled);
    }
    Ok(values)
}
