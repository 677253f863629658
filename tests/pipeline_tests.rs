use std::sync::{Arc, Mutex};

use brrtdispatch::attributes::{
    as_text, FORWARD_REQUEST_URI, INCLUDE_REQUEST_URI, INCLUDE_SERVLET_PATH, MANAGED,
};
use brrtdispatch::chain::RequestChain;
use brrtdispatch::dispatcher::{DispatchContext, DispatchKind, DispatchPipeline, RequestDispatcher};
use brrtdispatch::error::{DispatchError, HandlerError};
use brrtdispatch::handler::{handler_fn, AppContext, Handler};
use brrtdispatch::paths::{PathPattern, PatternStyle};
use brrtdispatch::registry::{HandlerDefinition, HandlerRegistry};
use brrtdispatch::request::{BaseRequest, BufferedResponse, HttpRequest, HttpResponse};

mod common;
use common::handlers::{CountingHandler, RecordingHandler};
use common::registry::{erase, registry};

fn pipeline(registry: HandlerRegistry) -> DispatchPipeline {
    let pipeline = DispatchPipeline::new(registry, AppContext::new(""));
    pipeline.init().unwrap();
    pipeline
}

#[test]
fn test_only_first_match_services() {
    let pages = Arc::new(CountingHandler::default());
    let scripts = Arc::new(CountingHandler::default());
    let pipeline = pipeline(registry(&[
        ("/*", "default", erase(&pages)),
        ("*.html", "html", erase(&pages)),
        ("/test/*", "test", erase(&scripts)),
        ("/index/*", "index", erase(&pages)),
        ("*.jsp", "jsp", erase(&scripts)),
    ]));
    assert_eq!(pages.inits(), 1);
    assert_eq!(scripts.inits(), 1);

    let mut request = RequestChain::new(BaseRequest::get("/index.html"));
    let mut response = BufferedResponse::new();
    assert!(pipeline.service(&mut request, &mut response).unwrap());
    assert_eq!(response.body_text(), "default");
    assert_eq!(pages.services(), 1);
    assert_eq!(scripts.services(), 0);

    assert!(pipeline.destroy().is_empty());
    assert_eq!(pages.destroys(), 1);
    assert_eq!(scripts.destroys(), 1);
}

#[test]
fn test_unmatched_request_is_left_alone() {
    let handler = Arc::new(CountingHandler::default());
    let pipeline = pipeline(registry(&[("/index.html", "index", erase(&handler))]));

    let mut request = RequestChain::new(BaseRequest::get("/other.html"));
    let mut response = BufferedResponse::new();
    assert!(!pipeline.service(&mut request, &mut response).unwrap());
    assert_eq!(handler.services(), 0);
    assert_eq!(request.depth(), 0);
}

#[test]
fn test_forward_marks_request_managed() {
    let jsp = Arc::new(RecordingHandler::default());
    let front: Arc<dyn Handler> = Arc::new(handler_fn(|req, res, ctx| {
        let target = ctx
            .dispatcher_for("/blah.jsp")
            .ok_or_else(|| HandlerError::msg("no target"))?;
        target.forward(req, res)?;
        Ok(())
    }));
    let pipeline = pipeline(registry(&[("/", "front", front), ("*.jsp", "jsp", erase(&jsp))]));

    let mut request = RequestChain::new(BaseRequest::get("/"));
    let mut response = BufferedResponse::new();
    assert!(pipeline.service(&mut request, &mut response).unwrap());

    let seen = jsp.observations();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].managed);
    assert_eq!(seen[0].servlet_path, "/blah.jsp");
    assert_eq!(seen[0].request_uri, "/blah.jsp");
    assert_eq!(seen[0].depth, 1);

    assert!(request.attribute(MANAGED).is_none());
    assert_eq!(request.request_uri(), "/");
    assert_eq!(request.depth(), 0);
}

#[test]
fn test_forward_from_plain_dispatcher_records_origin() {
    let seen = Arc::new(Mutex::new(None));
    let recorder = Arc::clone(&seen);
    let target: Arc<dyn Handler> = Arc::new(handler_fn(move |req, _res, _ctx| {
        *recorder.lock().unwrap() = as_text(req.attribute(FORWARD_REQUEST_URI));
        Ok(())
    }));
    let pipeline = pipeline(registry(&[("/target/*", "target", target)]));

    let mut request = RequestChain::new(BaseRequest::get("/origin"));
    let mut response = BufferedResponse::new();
    pipeline
        .dispatcher_for("/target/x")
        .unwrap()
        .forward(&mut request, &mut response)
        .unwrap();

    assert_eq!(seen.lock().unwrap().as_deref(), Some("/origin"));
    assert!(request.attribute(FORWARD_REQUEST_URI).is_none());
    assert_eq!(request.servlet_path(), "/origin");
}

#[test]
fn test_query_string_ignored_for_matching() {
    let handler: Arc<dyn Handler> = Arc::new(CountingHandler::default());
    let registry = HandlerRegistry::new(vec![
        HandlerDefinition::new(
            PathPattern::parse("/reports/[0-9]+", PatternStyle::Regex).unwrap(),
            "reports",
            Arc::clone(&handler),
        ),
        HandlerDefinition::new(PathPattern::servlet("/about").unwrap(), "about", handler),
    ]);
    let pipeline = pipeline(registry);

    for uri in ["/reports/42?format=csv", "/about?x=1", "/about;jsessionid=abc"] {
        let mut request = RequestChain::new(BaseRequest::get(uri));
        let mut response = BufferedResponse::new();
        assert!(pipeline.service(&mut request, &mut response).unwrap(), "{uri}");
    }
    assert_eq!(pipeline.dispatcher_for("/about?x=1").unwrap().handler_name(), "about");
    assert_eq!(pipeline.dispatcher_for("/about?x=1").unwrap().path(), "/about");
}

#[test]
fn test_forward_after_commit_rejected() {
    let target = Arc::new(CountingHandler::default());
    let pipeline = pipeline(registry(&[("*.jsp", "jsp", erase(&target))]));

    let mut request = RequestChain::new(BaseRequest::get("/origin"));
    let mut response = BufferedResponse::new();
    response.write(b"already sent").unwrap();
    response.flush().unwrap();

    let err = pipeline
        .dispatcher_for("/page.jsp")
        .unwrap()
        .forward(&mut request, &mut response)
        .unwrap_err();

    assert!(matches!(err, DispatchError::Precondition(_)));
    assert_eq!(target.services(), 0);
    assert_eq!(request.depth(), 0);
    assert_eq!(request.request_uri(), "/origin");
    assert_eq!(response.body_text(), "already sent");
}

#[test]
fn test_forward_discards_buffered_output() {
    let target = Arc::new(CountingHandler::default());
    let pipeline = pipeline(registry(&[("*.jsp", "jsp", erase(&target))]));

    let mut request = RequestChain::new(BaseRequest::get("/origin"));
    let mut response = BufferedResponse::new();
    response.write(b"discarded").unwrap();
    pipeline
        .dispatcher_for("/page.jsp")
        .unwrap()
        .forward(&mut request, &mut response)
        .unwrap();

    assert_eq!(response.body_text(), "jsp");
}

#[test]
fn test_handler_failure_still_unwinds() {
    let broken = Arc::new(CountingHandler {
        fail_service: true,
        ..Default::default()
    });
    let pipeline = pipeline(registry(&[("/*", "broken", erase(&broken))]));

    let mut request = RequestChain::new(BaseRequest::get("/x"));
    let mut response = BufferedResponse::new();
    let err = pipeline.service(&mut request, &mut response).unwrap_err();

    match err {
        DispatchError::Handler { handler, .. } => assert_eq!(handler, "broken"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(request.attribute(MANAGED).is_none());
    assert_eq!(request.depth(), 0);
    assert_eq!(request.servlet_path(), "/x");
}

#[test]
fn test_init_failure_is_fatal() {
    let broken = Arc::new(CountingHandler {
        fail_init: true,
        ..Default::default()
    });
    let pipeline = DispatchPipeline::new(
        registry(&[("/*", "broken", erase(&broken))]),
        AppContext::new(""),
    );

    assert!(matches!(
        pipeline.init(),
        Err(DispatchError::Lifecycle { .. })
    ));
}

#[test]
fn test_nested_includes_restore_outer_view() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let inner_log = Arc::clone(&log);
    let inner: Arc<dyn Handler> = Arc::new(handler_fn(move |req, _res, ctx| {
        assert_eq!(ctx.kind(), DispatchKind::Include);
        inner_log.lock().unwrap().push(format!(
            "inner {} {:?}",
            ctx.depth(),
            as_text(req.attribute(INCLUDE_REQUEST_URI))
        ));
        Ok(())
    }));

    let middle_log = Arc::clone(&log);
    let middle: Arc<dyn Handler> = Arc::new(handler_fn(move |req, res, ctx| {
        let before = as_text(req.attribute(INCLUDE_SERVLET_PATH));
        ctx.dispatcher_for("/frag/inner.jsp")
            .ok_or_else(|| HandlerError::msg("no inner"))?
            .include(req, res)?;
        let after = as_text(req.attribute(INCLUDE_SERVLET_PATH));
        middle_log
            .lock()
            .unwrap()
            .push(format!("middle {} {before:?} {after:?}", ctx.depth()));
        Ok(())
    }));

    let outer_log = Arc::clone(&log);
    let outer: Arc<dyn Handler> = Arc::new(handler_fn(move |req, res, ctx| {
        assert_eq!(ctx.kind(), DispatchKind::Request);
        ctx.dispatcher_for("/frag/middle")
            .ok_or_else(|| HandlerError::msg("no middle"))?
            .include(req, res)?;
        outer_log.lock().unwrap().push(format!(
            "outer {} {:?} {}",
            ctx.depth(),
            as_text(req.attribute(INCLUDE_REQUEST_URI)),
            req.servlet_path()
        ));
        Ok(())
    }));

    let pipeline = pipeline(registry(&[
        ("*.jsp", "inner", inner),
        ("/frag/*", "middle", middle),
        ("/page", "outer", outer),
    ]));

    let mut request = RequestChain::new(BaseRequest::get("/page"));
    let mut response = BufferedResponse::new();
    assert!(pipeline.service(&mut request, &mut response).unwrap());

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "inner 2 Some(\"/frag/inner.jsp\")".to_string(),
            "middle 1 Some(\"/frag\") Some(\"/frag\")".to_string(),
            "outer 0 None /page".to_string(),
        ]
    );
    assert_eq!(request.depth(), 0);
    assert!(request.attribute(INCLUDE_REQUEST_URI).is_none());
}

#[test]
fn test_include_keeps_caller_paths() {
    let fragment: Arc<dyn Handler> = Arc::new(handler_fn(|req, res, _ctx| {
        res.write(req.servlet_path().as_bytes())?;
        Ok(())
    }));
    let pipeline = pipeline(registry(&[("/frag/*", "fragment", fragment)]));

    let mut request = RequestChain::new(BaseRequest::get("/page"));
    let mut response = BufferedResponse::new();
    pipeline
        .dispatcher_for("/frag/a")
        .unwrap()
        .include(&mut request, &mut response)
        .unwrap();

    assert_eq!(response.body_text(), "/frag");
    assert_eq!(request.servlet_path(), "/page");
}

type Views = Arc<Mutex<Vec<(String, String, String, Option<String>, usize)>>>;

fn record_view(views: &Views, label: &str, req: &RequestChain) {
    views.lock().unwrap().push((
        label.to_string(),
        req.request_uri(),
        req.servlet_path(),
        req.path_info(),
        req.depth(),
    ));
}

fn dispatch_to<'a>(
    ctx: &DispatchContext<'a>,
    path: &str,
) -> Result<RequestDispatcher<'a>, HandlerError> {
    ctx.dispatcher_for(path)
        .ok_or_else(|| HandlerError::msg(format!("no mapping for {path}")))
}

#[test]
fn test_forward_from_included_handler() {
    let views: Views = Arc::default();

    let target_views = Arc::clone(&views);
    let target: Arc<dyn Handler> = Arc::new(handler_fn(move |req, _res, ctx| {
        assert_eq!(ctx.kind(), DispatchKind::Forward);
        record_view(&target_views, "target", req);
        Ok(())
    }));

    let fragment_views = Arc::clone(&views);
    let fragment: Arc<dyn Handler> = Arc::new(handler_fn(move |req, res, ctx| {
        dispatch_to(ctx, "/fwd/x")?.forward(req, res)?;
        record_view(&fragment_views, "fragment", req);
        Ok(())
    }));

    let page_views = Arc::clone(&views);
    let page: Arc<dyn Handler> = Arc::new(handler_fn(move |req, res, ctx| {
        dispatch_to(ctx, "/inc/y")?.include(req, res)?;
        record_view(&page_views, "page", req);
        Ok(())
    }));

    let pipeline = pipeline(registry(&[
        ("/fwd/*", "target", target),
        ("/inc/*", "fragment", fragment),
        ("/page", "page", page),
    ]));

    let mut request = RequestChain::new(BaseRequest::get("/page"));
    let mut response = BufferedResponse::new();
    assert!(pipeline.service(&mut request, &mut response).unwrap());

    let some = |s: &str| Some(s.to_string());
    assert_eq!(
        *views.lock().unwrap(),
        vec![
            ("target".into(), "/fwd/x".into(), "/fwd".into(), some("/x"), 3),
            ("fragment".into(), "/inc/y".into(), "/inc".into(), some("/y"), 2),
            ("page".into(), "/page".into(), "/page".into(), None, 1),
        ]
    );
    assert_eq!(request.depth(), 0);
    assert_eq!(request.request_uri(), "/page");
}

#[test]
fn test_include_from_forwarded_handler() {
    let views: Views = Arc::default();

    let fragment_views = Arc::clone(&views);
    let fragment: Arc<dyn Handler> = Arc::new(handler_fn(move |req, _res, ctx| {
        assert_eq!(ctx.kind(), DispatchKind::Include);
        record_view(&fragment_views, "fragment", req);
        Ok(())
    }));

    let target_views = Arc::clone(&views);
    let target: Arc<dyn Handler> = Arc::new(handler_fn(move |req, res, ctx| {
        dispatch_to(ctx, "/inc/y")?.include(req, res)?;
        record_view(&target_views, "target", req);
        Ok(())
    }));

    let page_views = Arc::clone(&views);
    let page: Arc<dyn Handler> = Arc::new(handler_fn(move |req, res, ctx| {
        dispatch_to(ctx, "/fwd/x")?.forward(req, res)?;
        record_view(&page_views, "page", req);
        Ok(())
    }));

    let pipeline = pipeline(registry(&[
        ("/fwd/*", "target", target),
        ("/inc/*", "fragment", fragment),
        ("/page", "page", page),
    ]));

    let mut request = RequestChain::new(BaseRequest::get("/page"));
    let mut response = BufferedResponse::new();
    assert!(pipeline.service(&mut request, &mut response).unwrap());

    let some = |s: &str| Some(s.to_string());
    assert_eq!(
        *views.lock().unwrap(),
        vec![
            ("fragment".into(), "/inc/y".into(), "/inc".into(), some("/y"), 2),
            ("target".into(), "/fwd/x".into(), "/fwd".into(), some("/x"), 1),
            ("page".into(), "/page".into(), "/page".into(), None, 1),
        ]
    );
    assert_eq!(request.depth(), 0);
    assert_eq!(request.servlet_path(), "/page");
}
