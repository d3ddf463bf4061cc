use std::path::PathBuf;
use std::time::Duration;

use compactor_core::{
    update, AppState, CancelPurpose, Codec, CompressOptions, Effect, JobStatus, Msg, Outcome,
    ProgressReport, SelectedFile, SessionState,
};

fn init_logging() {
    compactor_logging::initialize_for_tests();
}

fn clip() -> SelectedFile {
    SelectedFile {
        name: "clip.mp4".to_string(),
        mime_type: Some("video/mp4".to_string()),
        path: PathBuf::from("/tmp/clip.mp4"),
    }
}

fn running(job_id: &str) -> AppState {
    let (state, _) = update(AppState::new(), Msg::FilePicked(clip()));
    let (state, _) = update(state, Msg::SubmitClicked);
    let seq = state.start_seq();
    let (state, _) = update(
        state,
        Msg::StartAccepted {
            seq,
            job_id: job_id.to_string(),
        },
    );
    state
}

fn progress(job_id: &str, report: ProgressReport) -> Msg {
    Msg::ProgressReceived {
        job_id: job_id.to_string(),
        report,
    }
}

fn count<F: Fn(&Effect) -> bool>(effects: &[Effect], pred: F) -> usize {
    effects.iter().filter(|effect| pred(effect)).count()
}

#[test]
fn start_accepted_begins_exactly_one_poll_session() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FilePicked(clip()));
    let (state, _) = update(state, Msg::SubmitClicked);
    let seq = state.start_seq();
    let (state, effects) = update(
        state,
        Msg::StartAccepted {
            seq,
            job_id: "job-1".to_string(),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::StartPolling {
            job_id: "job-1".to_string(),
            every: Duration::from_millis(900),
        }]
    );
    let view = state.view();
    assert_eq!(view.session, SessionState::Running);
    assert_eq!(view.job_id.as_deref(), Some("job-1"));
    assert!(view.cancel_visible);
    assert!(view.submit_busy);
    assert!(!view.submit_enabled);
    assert!(state.is_polling());
}

#[test]
fn poll_tick_requests_progress_for_current_job() {
    init_logging();
    let state = running("job-1");
    let (state, effects) = update(state, Msg::PollTick);
    assert_eq!(
        effects,
        vec![Effect::PollProgress {
            job_id: "job-1".to_string()
        }]
    );
    assert_eq!(state.poll_ticks(), 1);

    let (_, effects) = update(AppState::new(), Msg::PollTick);
    assert!(effects.is_empty());
}

#[test]
fn progress_updates_percent_and_time_left() {
    init_logging();
    let state = running("job-1");
    let (state, effects) = update(
        state,
        progress(
            "job-1",
            ProgressReport {
                percent: Some(41.6),
                time_left: Some(125.0),
                ..ProgressReport::default()
            },
        ),
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.progress.percent, 42);
    assert_eq!(view.progress.label, "42%");
    assert!(view.progress.tinted);
    assert_eq!(view.time_left, "Time left: 02:05");

    // Missing percent counts as zero; missing time_left keeps the last countdown.
    let (state, _) = update(state, progress("job-1", ProgressReport::default()));
    let view = state.view();
    assert_eq!(view.progress.percent, 0);
    assert!(!view.progress.tinted);
    assert_eq!(view.time_left, "Time left: 02:05");

    let (state, _) = update(
        state,
        progress(
            "job-1",
            ProgressReport {
                percent: Some(250.0),
                time_left: Some(59.0),
                ..ProgressReport::default()
            },
        ),
    );
    assert_eq!(state.view().progress.percent, 100);
    assert_eq!(state.view().time_left, "Time left: 00:59");
}

#[test]
fn poll_errors_are_swallowed() {
    init_logging();
    let state = running("job-1");
    let (state, _) = update(
        state,
        progress(
            "job-1",
            ProgressReport {
                percent: Some(30.0),
                ..ProgressReport::default()
            },
        ),
    );
    let before = state.view();

    let (state, effects) = update(
        state,
        progress(
            "job-1",
            ProgressReport {
                percent: Some(90.0),
                status: JobStatus::Done,
                error: Some("busy".to_string()),
                ..ProgressReport::default()
            },
        ),
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().progress, before.progress);
    assert_eq!(state.session(), SessionState::Running);

    let (state, effects) = update(
        state,
        Msg::PollFailed {
            job_id: "job-1".to_string(),
            message: "connection reset".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Running);
    assert!(state.is_polling());
}

#[test]
fn done_triggers_one_download_one_stop_and_delayed_reset() {
    init_logging();
    let state = running("abc");
    let (state, effects) = update(
        state,
        progress(
            "abc",
            ProgressReport {
                percent: Some(100.0),
                time_left: Some(0.0),
                status: JobStatus::Done,
                download_url: Some("/f/abc".to_string()),
                error: None,
            },
        ),
    );

    assert_eq!(
        count(&effects, |e| matches!(e, Effect::Download { url } if url == "/f/abc")),
        1
    );
    assert_eq!(count(&effects, |e| matches!(e, Effect::StopPolling)), 1);
    assert!(effects.contains(&Effect::ScheduleReset {
        after: Duration::from_millis(800)
    }));
    assert_eq!(state.job_id(), None);
    assert_eq!(state.session(), SessionState::Done);
    assert!(!state.is_polling());
    assert_eq!(state.view().downloads_pending, 1);

    // A late duplicate "done" must not trigger another download or stop.
    let (state, effects) = update(
        state,
        progress(
            "abc",
            ProgressReport {
                status: JobStatus::Done,
                download_url: Some("/f/abc".to_string()),
                ..ProgressReport::default()
            },
        ),
    );
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::ResetElapsed);
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.session, SessionState::Idle);
    assert_eq!(view.progress.percent, 0);
    assert_eq!(view.time_left, "Time left: --:--");
    assert!(!view.overlay_visible);
    assert!(!view.cancel_visible);
    assert!(view.submit_enabled);
    assert_eq!(
        view.last_outcome,
        Some(Outcome::Completed {
            download_url: Some("/f/abc".to_string())
        })
    );

    let (state, _) = update(
        state,
        Msg::DownloadSaved {
            url: "/f/abc".to_string(),
            path: PathBuf::from("downloads/abc.mp4"),
        },
    );
    assert_eq!(state.view().downloads_pending, 0);
    assert_eq!(
        state.view().last_download,
        Some(PathBuf::from("downloads/abc.mp4"))
    );
}

#[test]
fn cancel_without_job_sends_nothing() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::CancelClicked);
    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Idle);
    assert_eq!(state.view().last_outcome, None);
}

#[test]
fn cancel_with_job_sends_one_request_and_resets_immediately() {
    init_logging();
    let state = running("job-9");
    let (state, _) = update(
        state,
        progress(
            "job-9",
            ProgressReport {
                percent: Some(55.0),
                time_left: Some(12.0),
                ..ProgressReport::default()
            },
        ),
    );
    let (state, effects) = update(state, Msg::CancelClicked);

    assert_eq!(
        effects,
        vec![
            Effect::SendCancel {
                job_id: "job-9".to_string(),
                purpose: CancelPurpose::Cancel,
            },
            Effect::StopPolling,
        ]
    );
    let view = state.view();
    assert_eq!(view.session, SessionState::Idle);
    assert_eq!(view.job_id, None);
    assert_eq!(view.progress.percent, 0);
    assert_eq!(view.time_left, "Time left: --:--");
    assert!(!view.cancel_visible);
    assert!(view.submit_enabled);
    assert_eq!(view.last_outcome, Some(Outcome::Cancelled));

    // Stray second cancel is a no-op on the network.
    let (state, effects) = update(state, Msg::CancelClicked);
    assert!(effects.is_empty());

    // Late progress for the cancelled job is ignored.
    let (state, effects) = update(
        state,
        progress(
            "job-9",
            ProgressReport {
                percent: Some(80.0),
                ..ProgressReport::default()
            },
        ),
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().progress.percent, 0);
}

#[test]
fn start_rejection_alerts_and_reverts_to_idle() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FilePicked(clip()));
    let (state, _) = update(state, Msg::SubmitClicked);
    let seq = state.start_seq();
    let (state, effects) = update(
        state,
        Msg::StartRejected {
            seq,
            error: "unsupported file".to_string(),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::Alert {
            message: "Failed to start job: unsupported file".to_string()
        }]
    );
    let view = state.view();
    assert_eq!(view.session, SessionState::Idle);
    assert_eq!(view.job_id, None);
    assert!(!view.overlay_visible);
    assert!(view.submit_enabled);
    assert!(!state.is_polling());
}

#[test]
fn start_network_failure_alerts_and_reverts_to_idle() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FilePicked(clip()));
    let (state, _) = update(state, Msg::SubmitClicked);
    let seq = state.start_seq();
    let (state, effects) = update(
        state,
        Msg::StartFailed {
            seq,
            message: "connection refused".to_string(),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::Alert {
            message: "Network error starting job".to_string()
        }]
    );
    assert_eq!(state.session(), SessionState::Idle);
    assert_eq!(
        state.view().last_outcome,
        Some(Outcome::StartFailed("connection refused".to_string()))
    );
}

#[test]
fn job_accepted_after_cancel_during_start_is_released() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FilePicked(clip()));
    let (state, _) = update(state, Msg::SubmitClicked);
    let (state, effects) = update(state, Msg::CancelClicked);
    assert!(effects.is_empty());
    assert_eq!(state.view().last_outcome, Some(Outcome::Cancelled));

    assert_eq!(state.abandoned_starts(), 1);

    let seq = state.start_seq();
    let (state, effects) = update(
        state,
        Msg::StartAccepted {
            seq,
            job_id: "late".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::SendCancel {
            job_id: "late".to_string(),
            purpose: CancelPurpose::Cancel,
        }]
    );
    assert_eq!(state.session(), SessionState::Idle);
    assert!(!state.is_polling());
    assert_eq!(state.abandoned_starts(), 0);
}

#[test]
fn late_reply_to_abandoned_submit_does_not_hijack_the_resubmit() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FilePicked(clip()));
    let (state, _) = update(state, Msg::SubmitClicked);
    let first = state.start_seq();
    let (state, _) = update(state, Msg::CancelClicked);
    let (state, _) = update(
        state,
        Msg::OptionsChanged(CompressOptions {
            codec: Codec::H264,
            ..CompressOptions::default()
        }),
    );
    let (state, effects) = update(state, Msg::SubmitClicked);
    let second = state.start_seq();
    assert_ne!(first, second);
    assert!(matches!(
        effects.as_slice(),
        [Effect::StartJob { seq, options, .. }] if *seq == second && options.codec == Codec::H264
    ));

    let (state, effects) = update(
        state,
        Msg::StartAccepted {
            seq: first,
            job_id: "job-from-start-1".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::SendCancel {
            job_id: "job-from-start-1".to_string(),
            purpose: CancelPurpose::Cancel,
        }]
    );
    assert_eq!(state.session(), SessionState::Starting);
    assert_eq!(state.job_id(), None);

    let (state, effects) = update(
        state,
        Msg::StartAccepted {
            seq: second,
            job_id: "job-from-start-2".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::StartPolling {
            job_id: "job-from-start-2".to_string(),
            every: Duration::from_millis(900),
        }]
    );
    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(state.job_id(), Some("job-from-start-2"));
    assert_eq!(state.abandoned_starts(), 0);
}

#[test]
fn stale_start_failure_leaves_the_live_submit_alone() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FilePicked(clip()));
    let (state, _) = update(state, Msg::SubmitClicked);
    let first = state.start_seq();
    let (state, _) = update(state, Msg::CancelClicked);
    let (state, _) = update(state, Msg::SubmitClicked);

    let (state, effects) = update(
        state,
        Msg::StartFailed {
            seq: first,
            message: "connection reset".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Starting);
    assert!(state.view().overlay_visible);
    assert_eq!(state.abandoned_starts(), 0);
}

#[test]
fn delete_without_job_is_local_only() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FilePicked(clip()));
    assert!(state.view().delete_visible);

    let (state, effects) = update(state, Msg::DeleteUploadClicked);
    assert!(effects.is_empty());
    assert!(!state.view().delete_visible);
}

#[test]
fn delete_with_job_converges_on_success_and_failure() {
    init_logging();
    for ok in [true, false] {
        let state = running("job-3");
        let (state, effects) = update(state, Msg::DeleteUploadClicked);
        assert_eq!(
            effects,
            vec![
                Effect::StopPolling,
                Effect::SendCancel {
                    job_id: "job-3".to_string(),
                    purpose: CancelPurpose::DeleteUpload,
                },
            ]
        );
        assert_eq!(state.session(), SessionState::Cancelling);
        assert_eq!(state.job_id(), None);

        assert!(state.view().overlay_visible);

        let (state, effects) = update(state, Msg::DeleteFinished { ok });
        assert!(effects.is_empty());
        let view = state.view();
        assert_eq!(view.session, SessionState::Idle);
        assert!(!view.delete_visible);
        assert!(!view.cancel_visible);
        assert!(view.submit_enabled);
        assert_eq!(view.job_id, None);
    }
}

#[test]
fn resubmitting_after_completion_starts_a_fresh_poll_session() {
    init_logging();
    let state = running("first");
    let (state, _) = update(
        state,
        progress(
            "first",
            ProgressReport {
                status: JobStatus::Done,
                download_url: Some("/f/first".to_string()),
                ..ProgressReport::default()
            },
        ),
    );
    let (state, _) = update(state, Msg::ResetElapsed);
    let (state, _) = update(state, Msg::SubmitClicked);
    let seq = state.start_seq();
    let (state, effects) = update(
        state,
        Msg::StartAccepted {
            seq,
            job_id: "second".to_string(),
        },
    );

    assert_eq!(
        count(&effects, |e| matches!(e, Effect::StartPolling { .. })),
        1
    );
    assert_eq!(state.job_id(), Some("second"));
}
