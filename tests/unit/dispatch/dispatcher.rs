use super::*;
use crate::dispatch::progress::NoProgress;
use crate::foundation::core::{FrameIndex, Resolution, Viewport};
use crate::invoke::render::RenderError;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn jobs(n: u64, dir: &Path) -> Vec<FrameJob> {
    (0..n)
        .map(|i| FrameJob {
            index: FrameIndex(i),
            viewport: Viewport::new(-2.0, 1.0, -1.0, 1.0).unwrap(),
            resolution: Resolution {
                width: 8,
                height: 8,
            },
            iterations: 64,
            output: dir.join(format!("f_{i:04}.png")),
        })
        .collect()
}

fn never_done() -> impl Fn(&FrameJob) -> bool + Sync {
    |_: &FrameJob| false
}

#[test]
fn zero_workers_is_invalid() {
    assert!(matches!(
        JobDispatcher::new(0).unwrap_err(),
        ZoomError::InvalidParameter(_)
    ));
}

#[test]
fn results_come_back_in_index_order() {
    let jobs = jobs(64, Path::new("unused"));
    let renderer = |_: &FrameJob| -> Result<(), RenderError> { Ok(()) };
    let progress = DispatchProgress::new(jobs.len());
    let report = JobDispatcher::new(4)
        .unwrap()
        .dispatch(&jobs, &never_done(), &renderer, &progress, &NoProgress)
        .unwrap();

    let indices: Vec<u64> = report.results.iter().map(|r| r.index.0).collect();
    assert_eq!(indices, (0..64).collect::<Vec<_>>());
    assert_eq!(report.counts().rendered, 64);
    assert_eq!(progress.completed(), 64);
    assert!(report.results.iter().all(|r| r.attempts == 1));
}

#[test]
fn second_run_over_same_outputs_renders_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = jobs(20, dir.path());
    let calls = AtomicUsize::new(0);
    let renderer = |job: &FrameJob| -> Result<(), RenderError> {
        calls.fetch_add(1, Ordering::SeqCst);
        std::fs::write(&job.output, b"png").map_err(|e| RenderError::Other {
            message: e.to_string(),
        })
    };
    let dispatcher = JobDispatcher::new(3).unwrap();

    let first = dispatcher
        .dispatch(
            &jobs,
            &OutputFileExists,
            &renderer,
            &DispatchProgress::new(jobs.len()),
            &NoProgress,
        )
        .unwrap();
    assert_eq!(first.counts().rendered, 20);
    assert_eq!(calls.load(Ordering::SeqCst), 20);

    let second = dispatcher
        .dispatch(
            &jobs,
            &OutputFileExists,
            &renderer,
            &DispatchProgress::new(jobs.len()),
            &NoProgress,
        )
        .unwrap();
    assert_eq!(second.counts().skipped, 20);
    assert_eq!(calls.load(Ordering::SeqCst), 20);
}

#[test]
fn injected_resume_check_simulates_partial_prior_run() {
    let jobs = jobs(10, Path::new("unused"));
    let already: HashSet<u64> = [0, 3, 4, 9].into_iter().collect();
    let done = |job: &FrameJob| already.contains(&job.index.0);
    let rendered = Mutex::new(Vec::new());
    let renderer = |job: &FrameJob| -> Result<(), RenderError> {
        rendered.lock().unwrap().push(job.index.0);
        Ok(())
    };

    let report = JobDispatcher::new(2)
        .unwrap()
        .dispatch(
            &jobs,
            &done,
            &renderer,
            &DispatchProgress::new(jobs.len()),
            &NoProgress,
        )
        .unwrap();

    let mut rendered = rendered.into_inner().unwrap();
    rendered.sort();
    assert_eq!(rendered, vec![1, 2, 5, 6, 7, 8]);
    assert_eq!(report.counts().skipped, 4);
    assert!(
        report
            .results
            .iter()
            .filter(|r| r.status == JobStatus::Skipped)
            .all(|r| r.attempts == 0)
    );
}

#[test]
fn failing_frame_does_not_abort_the_batch() {
    let jobs = jobs(30, Path::new("unused"));
    let renderer = |job: &FrameJob| -> Result<(), RenderError> {
        if job.index.0 == 17 {
            Err(RenderError::Exit {
                code: Some(2),
                stderr: "boom".to_string(),
            })
        } else {
            Ok(())
        }
    };

    let report = JobDispatcher::new(4)
        .unwrap()
        .dispatch(
            &jobs,
            &never_done(),
            &renderer,
            &DispatchProgress::new(jobs.len()),
            &NoProgress,
        )
        .unwrap();

    assert_eq!(report.total(), 30);
    assert_eq!(report.failed_indices(), vec![17]);
    let failed = &report.results[17];
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(
        failed.error,
        Some(RenderError::Exit {
            code: Some(2),
            stderr: "boom".to_string()
        })
    );
    assert_eq!(report.counts().rendered, 29);
}

#[test]
fn panicking_renderer_fails_only_its_frame() {
    let jobs = jobs(12, Path::new("unused"));
    let renderer = |job: &FrameJob| -> Result<(), RenderError> {
        if job.index.0 == 5 {
            panic!("bad pixel at frame 5");
        }
        Ok(())
    };

    let report = JobDispatcher::new(3)
        .unwrap()
        .dispatch(
            &jobs,
            &never_done(),
            &renderer,
            &DispatchProgress::new(jobs.len()),
            &NoProgress,
        )
        .unwrap();

    assert_eq!(report.total(), 12);
    assert_eq!(report.failed_indices(), vec![5]);
    assert_eq!(report.counts().rendered, 11);
    match &report.results[5].error {
        Some(RenderError::Other { message }) => {
            assert!(message.contains("panicked"), "{message}");
            assert!(message.contains("bad pixel at frame 5"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn in_flight_renders_never_exceed_pool_size() {
    for workers in [1usize, 2, 3] {
        let jobs = jobs(24, Path::new("unused"));
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let renderer = |_: &FrameJob| -> Result<(), RenderError> {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        };

        JobDispatcher::new(workers)
            .unwrap()
            .dispatch(
                &jobs,
                &never_done(),
                &renderer,
                &DispatchProgress::new(jobs.len()),
                &NoProgress,
            )
            .unwrap();

        let peak = peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= workers, "workers={workers} peak={peak}");
    }
}

#[test]
fn retries_recover_transient_failures() {
    let jobs = jobs(5, Path::new("unused"));
    let attempts_for_two = AtomicUsize::new(0);
    let renderer = |job: &FrameJob| -> Result<(), RenderError> {
        if job.index.0 == 2 && attempts_for_two.fetch_add(1, Ordering::SeqCst) < 2 {
            return Err(RenderError::Timeout { limit_ms: 10 });
        }
        Ok(())
    };

    let report = JobDispatcher::new(2)
        .unwrap()
        .with_retries(2)
        .dispatch(
            &jobs,
            &never_done(),
            &renderer,
            &DispatchProgress::new(jobs.len()),
            &NoProgress,
        )
        .unwrap();

    assert!(!report.has_failures());
    assert_eq!(report.results[2].attempts, 3);
}

#[test]
fn retries_are_bounded() {
    let jobs = jobs(1, Path::new("unused"));
    let calls = AtomicUsize::new(0);
    let renderer = |_: &FrameJob| -> Result<(), RenderError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(RenderError::Timeout { limit_ms: 10 })
    };
    let report = JobDispatcher::new(1)
        .unwrap()
        .with_retries(3)
        .dispatch(
            &jobs,
            &never_done(),
            &renderer,
            &DispatchProgress::new(1),
            &NoProgress,
        )
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(report.results[0].attempts, 4);
    assert_eq!(report.results[0].status, JobStatus::Failed);
}

#[test]
fn cancellation_stops_new_jobs() {
    let jobs = jobs(12, Path::new("unused"));
    let cancel = CancelToken::new();
    let renderer = |_: &FrameJob| -> Result<(), RenderError> { Ok(()) };
    let observer = |_: &JobResult, completed: usize, _total: usize| {
        if completed == 1 {
            cancel.cancel();
        }
    };

    let report = JobDispatcher::new(1)
        .unwrap()
        .with_cancel(cancel.clone())
        .dispatch(
            &jobs,
            &never_done(),
            &renderer,
            &DispatchProgress::new(jobs.len()),
            &observer,
        )
        .unwrap();

    let c = report.counts();
    assert_eq!(c.rendered, 1);
    assert_eq!(c.cancelled, 11);
    assert!(report.was_cancelled());
}

#[test]
fn observer_sees_every_completion_with_total() {
    let jobs = jobs(16, Path::new("unused"));
    let seen = Mutex::new(Vec::new());
    let renderer = |_: &FrameJob| -> Result<(), RenderError> { Ok(()) };
    let observer = |_: &JobResult, completed: usize, total: usize| {
        assert_eq!(total, 16);
        seen.lock().unwrap().push(completed);
    };

    JobDispatcher::new(4)
        .unwrap()
        .dispatch(
            &jobs,
            &never_done(),
            &renderer,
            &DispatchProgress::new(jobs.len()),
            &observer,
        )
        .unwrap();

    let mut seen = seen.into_inner().unwrap();
    seen.sort();
    assert_eq!(seen, (1..=16).collect::<Vec<_>>());
}

#[test]
fn output_file_exists_checks_the_job_path() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = jobs(2, dir.path());
    std::fs::write(&jobs[1].output, b"x").unwrap();
    assert!(!OutputFileExists.is_done(&jobs[0]));
    assert!(OutputFileExists.is_done(&jobs[1]));
}
