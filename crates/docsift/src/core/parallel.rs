//! Segment-parallel page processing.
//!
//! Large page ranges are split into contiguous segments, one per worker.
//! Each worker receives only its slice of indices and is expected to open
//! its own handle on the immutable document bytes. Results are collected by
//! segment position, so output order never depends on which worker finishes
//! first.

use crate::core::config::PdfConfig;
use crate::core::page_range::PageRange;
use crate::{DocsiftError, Result};
use rayon::prelude::*;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Whether a resolved range is large enough to fan out.
pub fn should_parallelize(range: &PageRange, config: &PdfConfig) -> bool {
    config.parallel && config.worker_count() > 1 && range.len() > config.parallel_page_threshold
}

/// Split `indices` into at most `workers` contiguous, non-empty segments.
pub fn partition(indices: &[usize], workers: usize) -> Vec<&[usize]> {
    if indices.is_empty() {
        return Vec::new();
    }
    let segment_len = indices.len().div_ceil(workers.max(1));
    indices.chunks(segment_len).collect()
}

/// Run `task` on every segment of `indices` and return results in segment order.
///
/// A panic inside a segment becomes [`DocsiftError::WorkerCrash`]. Errors
/// returned by a segment are propagated as-is; when several segments fail,
/// the lowest segment wins.
pub fn run_segments<T, F>(indices: &[usize], workers: usize, task: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize, &[usize]) -> Result<T> + Sync,
{
    let segments = partition(indices, workers);
    if segments.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(segments.len())
        .thread_name(|i| format!("docsift-segment-{}", i))
        .build()
        .map_err(|e| DocsiftError::extraction_failed_with_source("Failed to start page worker pool", e))?;

    tracing::debug!(
        pages = indices.len(),
        segments = segments.len(),
        "Processing page segments in parallel"
    );

    let outcomes: Vec<std::thread::Result<Result<T>>> = pool.install(|| {
        segments
            .par_iter()
            .enumerate()
            .map(|(segment, pages)| catch_unwind(AssertUnwindSafe(|| task(segment, pages))))
            .collect()
    });

    let mut results = Vec::with_capacity(outcomes.len());
    for (segment, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(err)) => return Err(err),
            Err(panic) => {
                let message = extract_panic_reason(&panic);
                tracing::error!(segment, %message, "Page worker crashed");
                return Err(DocsiftError::WorkerCrash { segment, message });
            }
        }
    }

    Ok(results)
}

fn extract_panic_reason(panic: &Box<dyn Any + Send + 'static>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_is_contiguous_and_complete() {
        let indices: Vec<usize> = (0..10).collect();
        let segments = partition(&indices, 3);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], &[0usize, 1, 2, 3][..]);
        assert_eq!(segments[2], &[8usize, 9][..]);
        assert_eq!(segments.concat(), indices);
    }

    #[test]
    fn test_partition_more_workers_than_pages() {
        let indices: [usize; 2] = [4, 7];
        let segments = partition(&indices, 8);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], &[4usize][..]);
        assert_eq!(segments[1], &[7usize][..]);
        assert!(partition(&[], 4).is_empty());
    }

    #[test]
    fn test_run_segments_preserves_segment_order() {
        let indices: Vec<usize> = (0..40).collect();
        let results = run_segments(&indices, 4, |segment, pages| {
            // Earlier segments finish last.
            std::thread::sleep(std::time::Duration::from_millis(((4 - segment) * 5) as u64));
            Ok(pages.iter().map(|p| format!("[{}]", p)).collect::<String>())
        })
        .unwrap();

        let expected: String = indices.iter().map(|p| format!("[{}]", p)).collect();
        assert_eq!(results.concat(), expected);
    }

    #[test]
    fn test_run_segments_panic_is_worker_crash() {
        let indices: Vec<usize> = (0..12).collect();
        let err = run_segments(&indices, 3, |segment, _pages| {
            if segment == 1 {
                panic!("page decoder exploded");
            }
            Ok(segment)
        })
        .unwrap_err();

        match err {
            DocsiftError::WorkerCrash { segment, message } => {
                assert_eq!(segment, 1);
                assert!(message.contains("page decoder exploded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_run_segments_propagates_first_error() {
        let indices: Vec<usize> = (0..6).collect();
        let err = run_segments(&indices, 3, |segment, _pages| -> Result<()> {
            Err(DocsiftError::extraction_failed(format!("segment {} failed", segment)))
        })
        .unwrap_err();
        assert!(err.to_string().contains("segment 0 failed"));
    }

    #[test]
    fn test_should_parallelize_uses_page_count() {
        let config = PdfConfig {
            max_workers: Some(4),
            ..Default::default()
        };
        let small = PageRange::resolve(Some("1-10"), 50).unwrap();
        let large = PageRange::resolve(Some("1-11"), 50).unwrap();
        assert!(!should_parallelize(&small, &config));
        assert!(should_parallelize(&large, &config));

        let disabled = PdfConfig {
            parallel: false,
            ..config.clone()
        };
        assert!(!should_parallelize(&large, &disabled));

        let single = PdfConfig {
            max_workers: Some(1),
            ..config
        };
        assert!(!should_parallelize(&large, &single));
    }
}
