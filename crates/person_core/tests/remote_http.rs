use person_core::db::open_db_in_memory;
use person_core::{
    HttpRemoteSource, PersonService, RemoteSource, RemoteSourceConfig, SqliteMetadataRepository,
    SqlitePersonRepository, SyncError, SyncOutcome, PERSON_METADATA_MODEL_ID,
};
use reqwest::blocking::Client;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Serves exactly one HTTP response and returns the raw request head.
fn serve_once(status_line: &'static str, body: &'static [u8]) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut chunk = [0_u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut chunk).unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..read]);
        }
        let head = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).unwrap();
        stream.write_all(body).unwrap();
        stream.flush().unwrap();
        String::from_utf8_lossy(&request).into_owned()
    });
    (format!("http://{addr}/services/contacts"), handle)
}

fn source(url: &str) -> HttpRemoteSource {
    let client = Client::builder().no_proxy().build().unwrap();
    HttpRemoteSource::with_client(url, client)
}

#[test]
fn success_response_decodes_contacts_with_one_get() {
    let (url, server) = serve_once(
        "200 OK",
        br#"[{"modelId":"003A","firstName":"Ada"},{"modelId":"003B","email":"g@h.io"}]"#,
    );

    let contacts = source(&url).fetch_all().unwrap().expect("contacts expected");
    let request = server.join().unwrap();

    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0].model_id, "003A");
    assert_eq!(contacts[1].email.as_deref(), Some("g@h.io"));
    assert!(request.starts_with("GET /services/contacts HTTP/1.1"));
    assert!(request.to_ascii_lowercase().contains("accept: application/json"));
}

#[test]
fn non_success_status_means_no_update() {
    let (url, server) = serve_once("503 Service Unavailable", br#"{"error":"down"}"#);

    let contacts = source(&url).fetch_all().unwrap();
    server.join().unwrap();

    assert!(contacts.is_none());
}

#[test]
fn malformed_success_body_is_a_decode_error() {
    let (url, server) = serve_once("200 OK", br#"{"records":"#);

    let err = source(&url).fetch_all().unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, SyncError::Decode(_)));
}

#[test]
fn invalid_utf8_body_is_a_decode_error() {
    let (url, server) = serve_once("200 OK", b"[{\"modelId\":\"003A\xff\"}]");

    let err = source(&url).fetch_all().unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, SyncError::Decode(_)));
}

#[test]
fn unreachable_endpoint_means_no_update() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let contacts = source(&format!("http://{addr}/contacts"))
        .fetch_all()
        .unwrap();
    assert!(contacts.is_none());
}

#[test]
fn client_builds_from_config() {
    let config = RemoteSourceConfig {
        base_url: "https://crm.example.com/contacts".to_string(),
        timeout_secs: Some(3),
    };
    let source = HttpRemoteSource::new(&config).unwrap();
    assert_eq!(source.base_url(), "https://crm.example.com/contacts");
}

#[test]
fn service_syncs_from_http_endpoint() {
    let conn = open_db_in_memory().unwrap();
    SqliteMetadataRepository::new(&conn)
        .ensure_metadata(PERSON_METADATA_MODEL_ID)
        .unwrap();
    let (url, server) = serve_once("200 OK", br#"[{"modelId":"003A"},{"modelId":"003B"}]"#);
    let service = PersonService::new(
        SqlitePersonRepository::new(&conn),
        SqliteMetadataRepository::new(&conn),
        source(&url),
        PERSON_METADATA_MODEL_ID,
    )
    .unwrap();

    let outcome = service.update_repository().unwrap();
    server.join().unwrap();

    assert!(matches!(outcome, SyncOutcome::Applied(report) if report.inserted == 2));
    assert_eq!(service.get_all().unwrap().len(), 2);
    assert!(service.last_global_update_time() > 0);
}
