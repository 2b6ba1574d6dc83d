use std::path::Path;
use transkh_core::MessageId;
use transkh_reply::{ReplySink, SinkRegistry};

fn dir_config(dir: &Path) -> toml::Value {
    toml::Value::Table({
        let mut t = toml::map::Map::new();
        t.insert(
            "dir".to_string(),
            toml::Value::String(dir.to_string_lossy().to_string()),
        );
        t
    })
}

#[tokio::test]
async fn test_file_sink_placeholder_then_reply() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = SinkRegistry::new();
    let sink = registry.build("file", dir_config(tmp.path())).await.unwrap();

    let placeholder = sink.send_text("Processing your voice message").await.unwrap();
    sink.delete_message(placeholder).await.unwrap();
    let reply = sink.send_text("Original (English): hi").await.unwrap();

    let wav = tmp.path().join("scratch.wav");
    std::fs::write(&wav, b"RIFF....WAVE").unwrap();
    let voice = sink.send_voice(&wav).await.unwrap();

    assert_eq!(placeholder, MessageId(1));
    assert_eq!(reply, MessageId(2));
    assert_eq!(voice, MessageId(3));

    let mut names: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["0002.txt", "0003.wav", "scratch.wav"]);

    tokio::time::timeout(std::time::Duration::from_secs(2), sink.shutdown())
        .await
        .expect("shutdown timed out")
        .unwrap();
}

#[tokio::test]
async fn test_log_sink_from_registry() {
    let registry = SinkRegistry::new();
    let sink = registry
        .build("log", toml::Value::Table(Default::default()))
        .await
        .unwrap();
    let id = sink.send_text("hello").await.unwrap();
    sink.delete_message(id).await.unwrap();
}
