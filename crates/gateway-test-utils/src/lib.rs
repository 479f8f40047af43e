//! A fake gateway serving canned replies, for tests of gateway clients.
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use courier_gateway_types::error::{KnownStarknetErrorCode, StarknetError, StarknetErrorCode};
use warp::http::response::Builder;
use warp::Filter;

/// Matches the path and the raw query of a request, in the form the fixtures
/// are keyed with: `/feeder_gateway/get_block?blockId=null`.
fn path_and_query() -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
    let opt_query_raw = warp::query::raw()
        .map(Some)
        .or_else(|_| async { Ok::<(Option<String>,), Infallible>((None,)) });

    warp::any().and(warp::path::full()).and(opt_query_raw).map(
        |full_path: warp::path::FullPath, raw_query: Option<String>| match raw_query {
            Some(raw_query) => format!("{}?{}", full_path.as_str(), raw_query),
            None => full_path.as_str().to_owned(),
        },
    )
}

fn base_url(addr: std::net::SocketAddr) -> reqwest::Url {
    reqwest::Url::parse(&format!("http://{addr}/")).unwrap()
}

/// # Usage
///
/// Starts a local server which replies to each of the expected url paths
/// and queries with the respective fixture, any number of times. Returns
/// the handle of the server task and its base url.
///
/// # Panics
///
/// The server panics when it receives a path and query that is not expected.
pub fn setup<S1, S2, const N: usize>(
    url_paths_queries_and_response_fixtures: [(S1, (S2, u16)); N],
) -> (tokio::task::JoinHandle<()>, reqwest::Url)
where
    S1: AsRef<str> + std::fmt::Debug + Send + Sync + 'static,
    S2: ToString + Send + Sync + 'static,
{
    let fixtures = Arc::new(url_paths_queries_and_response_fixtures);

    let filter = path_and_query().map(move |actual: String| {
        match fixtures.iter().find(|x| x.0.as_ref() == actual) {
            Some((_, (body, status))) => Builder::new().status(*status).body(body.to_string()),
            None => panic!(
                "Actual url path and query {actual} not found in the expected {:?}",
                fixtures
                    .iter()
                    .map(|(expected_path, _)| expected_path)
                    .collect::<Vec<_>>()
            ),
        }
    });

    let (addr, serve_fut) = warp::serve(filter).bind_ephemeral(([127, 0, 0, 1], 0));
    let server_handle = tokio::spawn(serve_fut);
    (server_handle, base_url(addr))
}

/// # Usage
///
/// Same as [setup], except that the replies for a particular path and query
/// are consumed one at a time, in order.
///
/// # Panics
///
/// The server panics once the replies for a particular path and query have
/// been exhausted and the client still queries it.
pub fn setup_with_varied_responses<const M: usize, const N: usize>(
    url_paths_queries_and_response_fixtures: [(String, [(String, u16); M]); N],
) -> (tokio::task::JoinHandle<()>, reqwest::Url) {
    let fixtures = url_paths_queries_and_response_fixtures
        .into_iter()
        .map(|(path, responses)| (path, responses.into_iter().collect::<VecDeque<_>>()))
        .collect::<Vec<_>>();
    let fixtures = Arc::new(Mutex::new(fixtures));

    let filter = path_and_query().map(move |actual: String| {
        let mut fixtures = fixtures.lock().unwrap();

        match fixtures.iter_mut().find(|x| x.0 == actual) {
            Some((_, responses)) => {
                let (body, status) = responses.pop_front().expect("more responses for this path");
                Builder::new().status(status).body(body)
            }
            None => panic!(
                "Actual url path and query {actual} not found in the expected {:?}",
                fixtures
                    .iter()
                    .map(|(expected_path, _)| expected_path)
                    .collect::<Vec<_>>()
            ),
        }
    });

    let (addr, serve_fut) = warp::serve(filter).bind_ephemeral(([127, 0, 0, 1], 0));
    let server_handle = tokio::spawn(serve_fut);
    (server_handle, base_url(addr))
}

/// Creates a [`StarknetError`] reply for a particular [`KnownStarknetErrorCode`].
pub fn response_from(code: KnownStarknetErrorCode) -> (String, u16) {
    let e = StarknetError {
        code: StarknetErrorCode::Known(code),
        message: String::new(),
    };
    (serde_json::to_string(&e).unwrap(), 500)
}
