use std::fmt::Debug;

use ehttp::{Request, Response, Result};

pub type FetchCallback = Box<dyn FnOnce(Result<Response>) + Send + 'static>;

/// Seam between commands and the network, so tests can answer requests
/// without a server.
pub trait FetchService: Send + Sync + Debug {
    fn fetch(&self, request: Request, on_done: FetchCallback);
}

#[derive(Debug, Default)]
pub struct EhttpFetcher;

impl FetchService for EhttpFetcher {
    fn fetch(&self, request: Request, on_done: FetchCallback) {
        ehttp::fetch(request, on_done)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockFetcher;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::sync::{Arc, Mutex, PoisonError};

    use super::*;

    #[derive(Debug)]
    struct Canned {
        url_part: String,
        response: Result<Response>,
    }

    /// Answers synchronously with the first canned response whose URL
    /// fragment occurs in the request URL, and records every request.
    #[derive(Default, Clone)]
    pub struct MockFetcher {
        canned: Arc<Mutex<Vec<Canned>>>,
        requests: Arc<Mutex<Vec<Request>>>,
        /// When set, callbacks are parked instead of called. See [`MockFetcher::release`].
        hold: bool,
        parked: Arc<Mutex<Vec<(FetchCallback, Result<Response>)>>>,
    }

    impl Debug for MockFetcher {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockFetcher")
                .field("canned", &self.canned)
                .field("hold", &self.hold)
                .finish_non_exhaustive()
        }
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Parks callbacks until [`MockFetcher::release`] so tests control ordering.
        pub fn holding() -> Self {
            Self {
                hold: true,
                ..Self::default()
            }
        }

        pub fn respond(self, url_part: &str, response: Result<Response>) -> Self {
            self.canned
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Canned {
                    url_part: url_part.to_owned(),
                    response,
                });
            self
        }

        pub fn requests(&self) -> Vec<Request> {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Calls the parked callback at `index` (in request order).
        pub fn release(&self, index: usize) {
            let parked = {
                let mut parked = self.parked.lock().unwrap_or_else(PoisonError::into_inner);
                (index < parked.len()).then(|| parked.remove(index))
            };
            if let Some((on_done, response)) = parked {
                on_done(response);
            }
        }

        pub fn parked(&self) -> usize {
            self.parked
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }
    }

    pub fn response(url: &str, status: u16, content_type: &str, body: &[u8]) -> Response {
        Response {
            url: url.to_owned(),
            ok: (200..300).contains(&status),
            status,
            status_text: String::new(),
            headers: ehttp::Headers::new(&[("content-type", content_type)]),
            bytes: body.to_vec(),
        }
    }

    impl FetchService for MockFetcher {
        fn fetch(&self, request: Request, on_done: FetchCallback) {
            let response = self
                .canned
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .find(|canned| request.url.contains(&canned.url_part))
                .map(|canned| canned.response.clone())
                .unwrap_or_else(|| Err(format!("MockFetcher: no response for {}", request.url)));

            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request);

            if self.hold {
                self.parked
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((on_done, response));
            } else {
                on_done(response);
            }
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::response as mock_response;
