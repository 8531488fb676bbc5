#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use site_editor::catalog::product::Product;
use site_editor::editor::addressor::ElementKey;
use site_editor::page::page_model::NodeId;
use site_editor::page::selector::Selector;
use site_editor::site::app::{Site, SiteOptions};
use site_editor::site::settings::SiteContent;
use site_editor::storage::kv::{KeyValueStorage, MemoryStorage};

pub fn trainer(id: &str, title: &str, category: &str) -> Product {
    Product {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("{} coaching", category),
        price: Some(2500.0),
        image: format!("img/{}.jpg", id),
        category: Some(category.to_string()),
        experience: Some("5 years".to_string()),
        ..Default::default()
    }
}

/// Three trainers: two match `Fitness`, one `CrossFit`, one `Boxing`.
pub fn trainers() -> Vec<Product> {
    vec![
        trainer("prod-001", "Anna Petrova", "Fitness"),
        trainer("prod-002", "Ivan Sokolov", "CrossFit"),
        trainer("prod-003", "Maria Volkova", "Fitness, Boxing"),
    ]
}

pub fn site() -> Site<MemoryStorage> {
    site_with(MemoryStorage::new(), SiteOptions::default())
}

pub fn site_with(storage: MemoryStorage, options: SiteOptions) -> Site<MemoryStorage> {
    Site::new(SiteContent::default(), trainers(), storage, options)
}

/// Element currently addressed by `key`.
pub fn node<S: KeyValueStorage>(site: &Site<S>, key: &str) -> NodeId {
    site.editor()
        .address_map()
        .resolve(&ElementKey::from(key))
        .unwrap_or_else(|| panic!("no element for key {}", key))
}

/// The `index`-th element with `class`.
pub fn by_class<S: KeyValueStorage>(site: &Site<S>, class: &str, index: usize) -> NodeId {
    site.page().select_all(&Selector::class(class))[index]
}

pub fn content<S: KeyValueStorage>(site: &Site<S>, node: NodeId) -> String {
    site.page().content(node).unwrap_or_default().to_string()
}

/// Computed value as the inspector sees it.
pub fn computed<S: KeyValueStorage>(site: &Site<S>, node: NodeId, property: &str) -> String {
    site.editor()
        .inspector()
        .stylesheet()
        .property(site.page(), node, property)
}

pub fn stored<S: KeyValueStorage>(site: &Site<S>, key: &str) -> Option<String> {
    site.editor().store().storage().get(key)
}

// ============================================================================
// Log capture
// ============================================================================

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Everything logged while `f` runs, as plain text.
pub fn captured_logs(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}

// ============================================================================
// Canned HTTP server
// ============================================================================

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    /// `METHOD /path`
    pub line: String,
    pub body: String,
}

/// Local server answering successive connections with canned
/// `(status, body)` pairs, one per connection.
pub struct CannedServer {
    pub url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl CannedServer {
    pub fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        thread::spawn(move || {
            for (status, body) in responses {
                let Ok((stream, _)) = listener.accept() else {
                    return;
                };
                let mut reader = BufReader::new(stream);
                let request = read_request(&mut reader);
                log.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    if status < 400 { "OK" } else { "Error" },
                    body.len(),
                    body
                );
                let mut stream = reader.into_inner();
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        CannedServer { url, seen }
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

fn read_request(reader: &mut impl BufRead) -> SeenRequest {
    let mut first = String::new();
    reader.read_line(&mut first).unwrap_or_default();
    let line = first.split_whitespace().take(2).collect::<Vec<_>>().join(" ");

    let mut content_length = 0;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).unwrap_or(0) == 0 || header.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).unwrap_or_default();
    SeenRequest {
        line,
        body: String::from_utf8_lossy(&body).into_owned(),
    }
}

/// JSON array body for a list of records.
pub fn records_json(products: &[Product]) -> String {
    serde_json::to_string(products).unwrap()
}
