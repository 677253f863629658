#![allow(dead_code)]

pub mod handlers {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use brrtdispatch::chain::RequestChain;
    use brrtdispatch::dispatcher::DispatchContext;
    use brrtdispatch::error::HandlerError;
    use brrtdispatch::handler::{Handler, HandlerConfig};
    use brrtdispatch::request::{HttpRequest, HttpResponse};

    /// Counts lifecycle calls and writes its name on service.
    #[derive(Default)]
    pub struct CountingHandler {
        pub inits: AtomicUsize,
        pub services: AtomicUsize,
        pub destroys: AtomicUsize,
        pub fail_init: bool,
        pub fail_destroy: bool,
        pub fail_service: bool,
    }

    impl CountingHandler {
        pub fn inits(&self) -> usize {
            self.inits.load(Ordering::SeqCst)
        }

        pub fn services(&self) -> usize {
            self.services.load(Ordering::SeqCst)
        }

        pub fn destroys(&self) -> usize {
            self.destroys.load(Ordering::SeqCst)
        }
    }

    impl Handler for CountingHandler {
        fn init(&self, _config: &HandlerConfig) -> Result<(), HandlerError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                return Err(HandlerError::msg("init refused"));
            }
            Ok(())
        }

        fn service(
            &self,
            _request: &mut RequestChain,
            response: &mut dyn HttpResponse,
            ctx: &DispatchContext<'_>,
        ) -> Result<(), HandlerError> {
            self.services.fetch_add(1, Ordering::SeqCst);
            if self.fail_service {
                return Err(HandlerError::msg("service failed"));
            }
            response.write(ctx.handler_name().as_bytes())?;
            Ok(())
        }

        fn destroy(&self) -> Result<(), HandlerError> {
            self.destroys.fetch_add(1, Ordering::SeqCst);
            if self.fail_destroy {
                return Err(HandlerError::msg("destroy refused"));
            }
            Ok(())
        }
    }

    /// What a handler saw when it was invoked.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Observation {
        pub handler: String,
        pub request_uri: String,
        pub servlet_path: String,
        pub path_info: Option<String>,
        pub managed: bool,
        pub depth: usize,
    }

    /// Records the request view on every service call.
    #[derive(Default)]
    pub struct RecordingHandler {
        pub seen: Mutex<Vec<Observation>>,
    }

    impl RecordingHandler {
        pub fn observations(&self) -> Vec<Observation> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Handler for RecordingHandler {
        fn service(
            &self,
            request: &mut RequestChain,
            _response: &mut dyn HttpResponse,
            ctx: &DispatchContext<'_>,
        ) -> Result<(), HandlerError> {
            self.seen.lock().unwrap().push(Observation {
                handler: ctx.handler_name().to_string(),
                request_uri: request.request_uri(),
                servlet_path: request.servlet_path(),
                path_info: request.path_info(),
                managed: ctx.is_managed(&*request),
                depth: ctx.depth(),
            });
            Ok(())
        }
    }
}

pub mod registry {
    use std::sync::Arc;

    use brrtdispatch::handler::Handler;
    use brrtdispatch::paths::PathPattern;
    use brrtdispatch::registry::{HandlerDefinition, HandlerRegistry};

    /// Clone a concrete handler as a trait object.
    pub fn erase<H: Handler + 'static>(handler: &Arc<H>) -> Arc<dyn Handler> {
        let handler: Arc<dyn Handler> = handler.clone();
        handler
    }

    /// Registry from `(servlet pattern, name, handler)` triples, in order.
    pub fn registry(mappings: &[(&str, &str, Arc<dyn Handler>)]) -> HandlerRegistry {
        let definitions = mappings
            .iter()
            .map(|(pattern, name, handler)| {
                HandlerDefinition::new(
                    PathPattern::servlet(pattern).unwrap(),
                    *name,
                    Arc::clone(handler),
                )
            })
            .collect();
        HandlerRegistry::new(definitions)
    }
}
