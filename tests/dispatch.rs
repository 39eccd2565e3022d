use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use regex::RegexBuilder;
use sendero::{Condition, Consumed, Error, Flow, Matcher, Method, Regex, Request, Router, StatusCode};

fn get(app: &Router, target: &str) -> sendero::Response {
    app.dispatch(Method::Get, target).unwrap()
}

#[test]
fn test_nested_branch_and_placeholder() {
    let app = Router::new(|r| {
        r.on("users", |r, _| {
            r.on(Matcher::placeholder("id"), |_, caps| format!("user {}", &caps[0]))
        })?;
        Flow::Continue(())
    });

    let res = get(&app, "/users/42");
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body_str(), Some("user 42"));
    assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));
    assert_eq!(res.header("content-length"), Some("7"));
}

#[test]
fn test_unmatched_path_is_empty_404() {
    let app = Router::new(|r| r.get("users", |_, _| "users"));

    let res = get(&app, "/");
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.body().is_empty());
    assert_eq!(res.header("content-length"), Some("0"));
}

#[test]
fn test_leaf_distinguishes_trailing_slash() {
    let app = Router::new(|r| {
        r.is("a", |_, _| "a")?;
        r.is("a/", |_, _| "a/")
    });
    assert_eq!(get(&app, "/a").body_str(), Some("a"));
    assert_eq!(get(&app, "/a/").body_str(), Some("a/"));
}

#[test]
fn test_written_body_survives_fallthrough() {
    let app = Router::new(|r| {
        r.on("a", |r, _| {
            r.write("partial");
        })?;
        r.get("b", |_, _| "never")
    });

    let res = get(&app, "/a");
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body_str(), Some("partial"));
}

#[test]
fn test_first_matching_sibling_wins() {
    let later = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&later);
    let app = Router::new(move |r| {
        r.on("x", |_, _| "first")?;
        counter.fetch_add(1, Ordering::SeqCst);
        r.on("x", |_, _| "second")
    });

    assert_eq!(get(&app, "/x").body_str(), Some("first"));
    assert_eq!(later.load(Ordering::SeqCst), 0);

    assert_eq!(get(&app, "/y").status(), StatusCode::NOT_FOUND);
    assert_eq!(later.load(Ordering::SeqCst), 1);
}

#[test]
fn test_branch_that_passes_restores_path_for_siblings() {
    let app = Router::new(|r| {
        r.on("api", |r, _| r.is("v1", |_, _| "v1"))?;
        r.on("api", |r, _| r.is("v2", |r, _| format!("v2 at {}", r.matched_path())))
    });
    assert_eq!(get(&app, "/api/v2").body_str(), Some("v2 at /api/v2"));
}

#[test]
fn test_disjunction_stops_at_first_success() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let app = Router::new(move |r| {
        let counter = Arc::clone(&counter);
        let fallback = Matcher::pred(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        });
        r.is(Matcher::any([Matcher::from("feed"), Matcher::from("rss"), fallback]), |_, caps| {
            format!("via {}", &caps[0])
        })
    });

    assert_eq!(get(&app, "/rss").body_str(), Some("via rss"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert_eq!(get(&app, "/atom").status(), StatusCode::NOT_FOUND);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_verbs_and_root() {
    let app = Router::new(|r| {
        r.root(|_, _| "home")?;
        r.on("items", |r, _| {
            r.get((), |_, _| "list")?;
            r.post((), |_, _| StatusCode::CREATED)?;
            r.delete(Matcher::placeholder("id"), |_, caps| format!("deleted {}", &caps[0]))
        })
    });

    assert_eq!(get(&app, "/").body_str(), Some("home"));
    assert_eq!(app.dispatch(Method::Post, "/").unwrap().status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/items").body_str(), Some("list"));
    assert_eq!(app.dispatch(Method::Post, "/items").unwrap().status(), StatusCode::CREATED);
    assert_eq!(app.dispatch(Method::Delete, "/items/3").unwrap().body_str(), Some("deleted 3"));
    assert_eq!(app.dispatch(Method::Head, "/items").unwrap().status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_halt_skips_everything_after_it() {
    let after = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&after);
    let app = Router::new(move |r| {
        r.on("gate", |r, _| {
            r.response().status(StatusCode::UNAUTHORIZED);
            r.halt()
        })?;
        counter.fetch_add(1, Ordering::SeqCst);
        Flow::Continue(())
    });

    assert_eq!(get(&app, "/gate/x").status(), StatusCode::UNAUTHORIZED);
    assert_eq!(after.load(Ordering::SeqCst), 0);
}

#[test]
fn test_redirect() {
    let app = Router::new(|r| r.is("old", |r, _| r.redirect_with("/new", StatusCode::MOVED_PERMANENTLY)));
    let res = get(&app, "/old");
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.header("location"), Some("/new"));
    assert!(res.body().is_empty());
}

#[test]
fn test_mounted_router_sees_consumed_prefix() {
    let api = Router::new(|r| {
        r.get("users", |r, _| format!("{} | {:?}", r.matched_path(), r.remaining_path()))
    });
    let app = Router::new(move |r| {
        r.on("api", |r, _| r.run(&api))?;
        r.get("api", |_, _| "unreachable")
    });

    assert_eq!(get(&app, "/api/users").body_str(), Some("/api/users | \"\""));
    // The mounted router's 404 ends the dispatch.
    assert_eq!(get(&app, "/api/nope").status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_regex_captures() {
    let app = Router::new(|r| {
        r.is(Regex::new(r"files/(.+)").unwrap(), |_, caps| format!("file {}", &caps[0]))?;
        r.is(Regex::new(r"v(\d+)?").unwrap(), |_, caps| format!("[{}]", &caps[0]))
    });
    assert_eq!(get(&app, "/files/a/b.txt").body_str(), Some("file a/b.txt"));
    assert_eq!(get(&app, "/v").body_str(), Some("[]"));
    assert_eq!(get(&app, "/v7").body_str(), Some("[7]"));
}

#[test]
fn test_regex_runs_with_its_builder_settings() {
    let app = Router::new(|r| {
        let re = RegexBuilder::new("abc").case_insensitive(true).build().unwrap();
        r.is(re, |_, _| "abc")
    });
    assert_eq!(get(&app, "/ABC").body_str(), Some("abc"));
    assert_eq!(get(&app, "/abc").body_str(), Some("abc"));
    assert_eq!(get(&app, "/abcd").status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_custom_matcher_cannot_split_a_segment() {
    let app = Router::new(|r| {
        let version = Matcher::custom(|_| Some(Consumed { len: 2, captures: vec![] }));
        r.on(version, |r, _| r.remaining_path().to_owned())
    });
    let err = app.dispatch(Method::Get, "/v2/items").unwrap_err();
    assert!(matches!(err, Error::Consume { consumed: 2, available: 9 }));
    assert!(err.is_config());
}

#[test]
fn test_literal_text_is_not_a_pattern() {
    let app = Router::new(|r| r.is("a.b", |_, _| "dot"));
    assert_eq!(get(&app, "/a.b").body_str(), Some("dot"));
    assert_eq!(get(&app, "/axb").status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_symbol_override_applies_to_embedded_placeholders() {
    let app = Router::builder()
        .symbol("id", r"\d+")
        .unwrap()
        .build(|r| r.is("users/:id", |_, caps| format!("user {}", &caps[0])));

    assert_eq!(get(&app, "/users/7").body_str(), Some("user 7"));
    assert_eq!(get(&app, "/users/abc").status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_request_conditions() {
    let app = Router::new(|r| {
        r.get(("search", Condition::Param("q".into())), |_, caps| format!("q={}", &caps[0]))?;
        r.get(("reports", Condition::Extension("csv".into())), |_, caps| format!("csv {}", &caps[0]))?;
        r.is(("whoami", Condition::Header("x-user".into())), |_, caps| caps[0].clone())
    });

    assert_eq!(get(&app, "/search?q=rust+lang").body_str(), Some("q=rust lang"));
    assert_eq!(get(&app, "/search").status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/reports/q1.csv").body_str(), Some("csv q1"));
    assert_eq!(get(&app, "/reports/q1.pdf").status(), StatusCode::NOT_FOUND);

    let req = Request::new(Method::Get, "/whoami").with_header("X-User", "ana");
    assert_eq!(app.call(&req).unwrap().body_str(), Some("ana"));
}

#[test]
fn test_unknown_condition_is_an_error() {
    let app = Router::new(|r| r.is(Condition::named("role", "admin"), |_, _| "admin"));
    let err = app.dispatch(Method::Get, "").unwrap_err();
    assert!(matches!(err, Error::UnknownCondition(ref name) if name == "role"));
    assert!(err.is_config());
}

#[test]
fn test_handler_error_ends_dispatch() {
    let app = Router::new(|r| {
        r.is("boom", |_, _| "x".parse::<u32>().map(|n| n.to_string()))?;
        r.is("boom", |_, _| "unreachable")
    });
    let err = app.dispatch(Method::Get, "/boom").unwrap_err();
    assert!(matches!(err, Error::Handler(_)));
    assert!(!err.is_config());
}

#[test]
fn test_router_is_shared_across_threads() {
    let app = Router::new(|r| r.get(Matcher::placeholder("n"), |_, caps| caps[0].clone()));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let app = app.clone();
            std::thread::spawn(move || {
                let res = app.dispatch(Method::Get, &format!("/{i}")).unwrap();
                assert_eq!(res.body_str(), Some(i.to_string().as_str()));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(app.cached_patterns(), 1);
}
