//! Template loader tests over the URL source
//!
//! A throwaway TCP listener on localhost stands in for the template host, so
//! the download retry and the URL-keyed cache are observable without any real
//! network.

mod common;

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

use platequote::{LoadError, TemplateLoader, WorkbookSource};
use pretty_assertions::assert_eq;

enum Reply {
    Ok(Vec<u8>),
    ServerError,
}

/// Serve the given replies one connection each, then stop listening.
///
/// Returns the URL to fetch and a handle yielding the number of requests
/// actually served.
fn serve(replies: Vec<Reply>) -> (String, thread::JoinHandle<usize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/template.xlsx", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut served = 0;
        for reply in replies {
            let (mut stream, _) = listener.accept().unwrap();

            // Drain the request head up to the blank line
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).unwrap() <= 2 {
                    break;
                }
            }

            match &reply {
                Reply::Ok(body) => {
                    write!(
                        stream,
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    )
                    .unwrap();
                    stream.write_all(body).unwrap();
                }
                Reply::ServerError => {
                    write!(
                        stream,
                        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                    )
                    .unwrap();
                }
            }
            served += 1;
        }
        served
    });

    (url, handle)
}

#[test]
fn url_fetch_parses_and_caches() {
    let data = common::template(r#"<row r="1"><c r="A1"><v>1</v></c></row>"#);
    let (url, handle) = serve(vec![Reply::Ok(data)]);

    let mut loader = TemplateLoader::new();
    let first = loader.load(&WorkbookSource::Url(url.clone())).unwrap();
    assert_eq!(first.sheet_names(), vec!["Prijzen"]);
    assert!(!first.content_hash().is_empty());

    // The server handled exactly one request and is gone; a second load can
    // only succeed from the cache
    assert_eq!(handle.join().unwrap(), 1);
    let second = loader.load(&WorkbookSource::Url(url)).unwrap();
    assert_eq!(second.content_hash(), first.content_hash());
    assert_eq!(loader.cache_len(), 1);
}

#[test]
fn transient_failure_is_retried_once() {
    let data = common::template(r#"<row r="1"><c r="A1"><v>1</v></c></row>"#);
    let (url, handle) = serve(vec![Reply::ServerError, Reply::Ok(data)]);

    let mut loader = TemplateLoader::new();
    let workbook = loader.load(&WorkbookSource::Url(url)).unwrap();

    assert_eq!(workbook.sheet_names(), vec!["Prijzen"]);
    assert_eq!(handle.join().unwrap(), 2);
}

#[test]
fn repeated_failure_surfaces_load_error() {
    let (url, handle) = serve(vec![Reply::ServerError, Reply::ServerError]);

    let mut loader = TemplateLoader::new();
    let err = loader.load(&WorkbookSource::Url(url)).unwrap_err();

    assert!(matches!(err, LoadError::Fetch(_)));
    // Exactly two attempts: the original and one retry
    assert_eq!(handle.join().unwrap(), 2);
    assert_eq!(loader.cache_len(), 0);
}
