//! Ingestion coordinator tests
//!
//! Drives the coordinator through its event channel directly, with no OS
//! watcher in the loop, so every case is deterministic: events for the
//! same coordinator are processed in order, which lets a "bad event then
//! good event" pair prove the bad one was dropped.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ddosmon::hub::Hub;
use ddosmon::ingest;
use tempfile::TempDir;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const SILENCE_WINDOW: Duration = Duration::from_millis(500);

struct TestPipeline {
    dir: TempDir,
    events: UnboundedSender<PathBuf>,
    hub: Arc<Hub>,
}

impl TestPipeline {
    fn start(column: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let (events, rx) = mpsc::unbounded_channel();
        let hub = Arc::new(Hub::new());
        tokio::spawn(ingest::run(rx, Arc::clone(&hub), column.to_string()));
        Self { dir, events, hub }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn notify(&self, path: &PathBuf) {
        self.events.send(path.clone()).unwrap();
    }
}

async fn next_message(rx: &mut UnboundedReceiver<String>) -> String {
    timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("no broadcast arrived")
        .expect("hub dropped the subscriber")
}

async fn assert_silent(rx: &mut UnboundedReceiver<String>) {
    let extra = timeout(SILENCE_WINDOW, rx.recv()).await;
    assert!(extra.is_err(), "unexpected broadcast: {:?}", extra);
}

#[tokio::test]
async fn successful_extraction_broadcasts_scaled_value() {
    let pipeline = TestPipeline::start("DDOS%");
    let (_id, mut rx) = pipeline.hub.admit();

    let path = pipeline.write("predictions-001.csv", "id,DDOS%\n1,0.15\n2,0.82\n");
    pipeline.notify(&path);

    assert_eq!(next_message(&mut rx).await, r#"{"ddosPercentage":82}"#);
}

#[tokio::test]
async fn event_for_missing_file_is_dropped() {
    let pipeline = TestPipeline::start("DDOS%");
    let (_id, mut rx) = pipeline.hub.admit();

    // The file disappeared before it could be read.
    pipeline.notify(&pipeline.dir.path().join("predictions-gone.csv"));

    let path = pipeline.write("predictions-002.csv", "id,DDOS%\n1,0.4\n");
    pipeline.notify(&path);

    // Events are processed in order, so the first broadcast proves the
    // missing-file event produced nothing.
    assert_eq!(next_message(&mut rx).await, r#"{"ddosPercentage":40}"#);
}

#[tokio::test]
async fn truncated_final_row_uses_last_complete_row() {
    let pipeline = TestPipeline::start("DDOS%");
    let (_id, mut rx) = pipeline.hub.admit();

    let path = pipeline.write("predictions-003.csv", "a,DDOS%\n1,0.2\n2,0.5\n3,0.");
    pipeline.notify(&path);

    assert_eq!(next_message(&mut rx).await, r#"{"ddosPercentage":50}"#);
}

#[tokio::test]
async fn header_only_file_succeeds_on_follow_up_event() {
    let pipeline = TestPipeline::start("DDOS%");
    let (_id, mut rx) = pipeline.hub.admit();

    // Producer has written the header but no rows yet.
    let path = pipeline.write("predictions-004.csv", "id,DDOS%\n");
    pipeline.notify(&path);

    // Producer finishes the file and the follow-up notification fires.
    pipeline.write("predictions-004.csv", "id,DDOS%\n1,0.33\n");
    pipeline.notify(&path);

    assert_eq!(next_message(&mut rx).await, r#"{"ddosPercentage":33}"#);
    assert_silent(&mut rx).await;
}

#[tokio::test]
async fn file_without_score_column_is_abandoned() {
    let pipeline = TestPipeline::start("DDOS%");
    let (_id, mut rx) = pipeline.hub.admit();

    let bad = pipeline.write("predictions-005.csv", "id,score\n1,0.9\n");
    pipeline.notify(&bad);

    let good = pipeline.write("predictions-006.csv", "id,DDOS%\n1,0.6\n");
    pipeline.notify(&good);

    assert_eq!(next_message(&mut rx).await, r#"{"ddosPercentage":60}"#);
}

#[tokio::test]
async fn unchanged_file_is_not_rebroadcast() {
    let pipeline = TestPipeline::start("DDOS%");
    let (_id, mut rx) = pipeline.hub.admit();

    let path = pipeline.write("predictions-007.csv", "id,DDOS%\n1,0.82\n");
    pipeline.notify(&path);
    pipeline.notify(&path);

    assert_eq!(next_message(&mut rx).await, r#"{"ddosPercentage":82}"#);
    assert_silent(&mut rx).await;
}

#[tokio::test]
async fn appended_row_broadcasts_the_new_value() {
    use std::io::Write;

    let pipeline = TestPipeline::start("DDOS%");
    let (_id, mut rx) = pipeline.hub.admit();

    let path = pipeline.write("predictions-008.csv", "id,DDOS%\n1,0.82\n");
    pipeline.notify(&path);
    assert_eq!(next_message(&mut rx).await, r#"{"ddosPercentage":82}"#);

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .unwrap();
    file.write_all(b"2,0.95\n").unwrap();
    drop(file);

    pipeline.notify(&path);
    assert_eq!(next_message(&mut rx).await, r#"{"ddosPercentage":95}"#);
}

#[tokio::test]
async fn out_of_domain_score_is_clamped_before_broadcast() {
    let pipeline = TestPipeline::start("DDOS%");
    let (_id, mut rx) = pipeline.hub.admit();

    let path = pipeline.write("predictions-009.csv", "id,DDOS%\n1,1.7\n");
    pipeline.notify(&path);

    assert_eq!(next_message(&mut rx).await, r#"{"ddosPercentage":100}"#);
}
