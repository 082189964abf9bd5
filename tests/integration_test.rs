use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use http::{Request, StatusCode};
use resilience_core::{
    FaultInjector, Handler, InvalidDecision, Phase, RandomFailure, RecordingSink, ResponseSink,
};

fn get(path: &str) -> Request<()> {
    Request::get(path).body(()).expect("static request is valid")
}

/// Returns `early` at pre-dispatch and `late` at pre-commit.
fn two_phase(early: i32, late: i32) -> impl Fn(&Request<()>, Phase) -> i32 {
    move |_req: &Request<()>, phase: Phase| match phase {
        Phase::PreDispatch => early,
        Phase::PreCommit => late,
    }
}

fn write_hello(_req: &Request<()>, w: &mut dyn ResponseSink) {
    let _ = w.write_bytes(b"hello");
}

#[test]
fn body_without_status_gets_ok() {
    let injector = FaultInjector::new(write_hello, two_phase(0, 0));
    let mut sink = RecordingSink::new();

    injector.handle(&get("/foo"), &mut sink);

    let response = sink.into_response();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_slice(), b"hello");
}

#[test]
fn late_failure_overrides_status_but_keeps_body() {
    let injector = FaultInjector::new(write_hello, two_phase(0, 500));
    let mut sink = RecordingSink::new();

    injector.handle(&get("/foo"), &mut sink);

    let response = sink.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body().as_slice(), b"hello");
}

#[test]
fn early_failure_skips_handler_and_body() {
    let called = AtomicBool::new(false);
    let handler = |_req: &Request<()>, w: &mut dyn ResponseSink| {
        called.store(true, Ordering::SeqCst);
        let _ = w.write_bytes(b"hello");
    };
    let injector = FaultInjector::new(handler, two_phase(500, 0));
    let mut sink = RecordingSink::new();

    injector.handle(&get("/foo"), &mut sink);

    assert!(!called.load(Ordering::SeqCst));
    let response = sink.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body().is_empty());
}

#[test]
fn double_commit_keeps_first_status() {
    let handler = |_req: &Request<()>, w: &mut dyn ResponseSink| {
        w.commit_status(StatusCode::CREATED);
        w.commit_status(StatusCode::ACCEPTED);
        let _ = w.write_bytes(b"hello");
    };
    let injector = FaultInjector::new(handler, two_phase(0, 0));
    let mut sink = RecordingSink::new();

    injector.handle(&get("/foo"), &mut sink);

    assert_eq!(sink.commit_calls(), 1);
    let response = sink.into_response();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.body().as_slice(), b"hello");
}

#[test]
fn late_failure_overrides_explicit_status() {
    let handler = |_req: &Request<()>, w: &mut dyn ResponseSink| {
        w.commit_status(StatusCode::CREATED);
        let _ = w.write_bytes(b"made");
    };
    let injector = FaultInjector::new(handler, two_phase(0, 429));
    let mut sink = RecordingSink::new();

    injector.handle(&get("/items"), &mut sink);

    assert_eq!(sink.status(), Some(StatusCode::TOO_MANY_REQUESTS));
    assert_eq!(sink.body(), b"made");
}

#[test]
fn invalid_decisions_are_fatal_at_either_phase() {
    for value in [1, 399, 600, -5] {
        for phase in [Phase::PreDispatch, Phase::PreCommit] {
            let called = AtomicBool::new(false);
            let handler = |_req: &Request<()>, w: &mut dyn ResponseSink| {
                called.store(true, Ordering::SeqCst);
                let _ = w.write_bytes(b"hello");
            };
            let policy = move |_req: &Request<()>, p: Phase| if p == phase { value } else { 0 };
            let injector = FaultInjector::new(handler, policy);
            let mut sink = RecordingSink::new();

            let result =
                panic::catch_unwind(AssertUnwindSafe(|| injector.handle(&get("/"), &mut sink)));

            let payload = result.expect_err("invalid decision must abort the request");
            assert_eq!(
                payload.downcast_ref::<InvalidDecision>(),
                Some(&InvalidDecision::new(value, phase)),
            );
            assert_eq!(sink.status(), None, "no status may be written");
            assert!(sink.body().is_empty());
            // The handler only runs when the early decision passed.
            assert_eq!(called.load(Ordering::SeqCst), phase == Phase::PreCommit);
        }
    }
}

#[test]
fn policy_sees_the_original_request() {
    let seen = AtomicUsize::new(0);
    let policy = |req: &Request<()>, _phase: Phase| {
        assert_eq!(req.uri().path(), "/checkout");
        seen.fetch_add(1, Ordering::SeqCst);
        0
    };
    let handler = |req: &Request<()>, w: &mut dyn ResponseSink| {
        assert_eq!(req.uri().path(), "/checkout");
        w.commit_status(StatusCode::OK);
    };
    let injector = FaultInjector::new(handler, policy);

    injector.handle(&get("/checkout"), &mut RecordingSink::new());

    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn per_request_policy_can_target_paths() {
    let policy = |req: &Request<()>, phase: Phase| {
        if phase == Phase::PreDispatch && req.uri().path().starts_with("/flaky") {
            503
        } else {
            0
        }
    };
    let injector = FaultInjector::new(write_hello, policy);

    let mut flaky = RecordingSink::new();
    injector.handle(&get("/flaky/a"), &mut flaky);
    let mut stable = RecordingSink::new();
    injector.handle(&get("/stable"), &mut stable);

    assert_eq!(flaky.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(stable.status(), Some(StatusCode::OK));
    assert_eq!(stable.body(), b"hello");
}

#[test]
fn concurrent_requests_keep_independent_commit_state() {
    // Fail every other request late; the counter is the policy's own state.
    let counter = AtomicUsize::new(0);
    let policy = |_req: &Request<()>, phase: Phase| {
        if phase == Phase::PreCommit && counter.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            500
        } else {
            0
        }
    };
    let handler = |_req: &Request<()>, w: &mut dyn ResponseSink| {
        w.commit_status(StatusCode::OK);
        w.commit_status(StatusCode::ACCEPTED);
        let _ = w.write_bytes(b"ok");
    };
    let injector = FaultInjector::new(handler, policy);

    let sinks: Vec<RecordingSink> = std::thread::scope(|s| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    let mut sink = RecordingSink::new();
                    injector.handle(&get("/"), &mut sink);
                    sink
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|w| w.join().expect("worker should not panic"))
            .collect()
    });

    let failed = sinks
        .iter()
        .filter(|s| s.status() == Some(StatusCode::INTERNAL_SERVER_ERROR))
        .count();
    assert_eq!(failed, 4);
    for sink in &sinks {
        assert_eq!(sink.commit_calls(), 1);
        assert_eq!(sink.body(), b"ok");
        assert_ne!(sink.status(), Some(StatusCode::ACCEPTED));
    }
}

#[test]
fn random_failure_at_full_rate_fails_every_request() {
    let injector = FaultInjector::new(write_hello, RandomFailure::new(1.0, 500).unwrap());

    for _ in 0..20 {
        let mut sink = RecordingSink::new();
        injector.handle(&get("/"), &mut sink);
        assert_eq!(sink.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(sink.body().is_empty());
    }
}

#[test]
fn injected_failures_are_logged() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let injector = FaultInjector::new(write_hello, two_phase(0, 502));
    let mut sink = RecordingSink::new();
    injector.handle(&get("/logged"), &mut sink);

    assert_eq!(sink.status(), Some(StatusCode::BAD_GATEWAY));
}
