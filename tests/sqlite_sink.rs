// tests/sqlite_sink.rs
use chrono::{TimeZone, Utc};
use feedback_crawler::ingest::types::ClassifiedEntry;
use feedback_crawler::{Entry, FeedbackRecord, ImportSink, SourceKind, SqliteSink};

fn record(project_id: i64, link: &str, source: SourceKind) -> FeedbackRecord {
    let entry = Entry {
        title: "title".into(),
        content: "<p>great</p>".into(),
        published_at: Utc.with_ymd_and_hms(2009, 3, 1, 12, 0, 0).unwrap(),
        link: link.into(),
        author_image: None,
        author_name: "alice".into(),
        author_url: String::new(),
    };
    FeedbackRecord::new(
        project_id,
        source,
        ClassifiedEntry {
            entry,
            polarity: 2.0,
            description: "great".into(),
        },
    )
}

#[tokio::test]
async fn reopened_database_still_suppresses_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("feedback.sqlite3");

    let first = SqliteSink::open(&path).unwrap();
    let s = first
        .import_batch(vec![
            record(1, "http://example.com/a", SourceKind::Blog),
            record(1, "http://example.com/b", SourceKind::Twitter),
        ])
        .await
        .unwrap();
    assert_eq!((s.inserted, s.ignored), (2, 0));
    drop(first);

    let second = SqliteSink::open(&path).unwrap();
    let s = second
        .import_batch(vec![
            record(1, "http://example.com/a", SourceKind::Blog),
            record(1, "http://example.com/c", SourceKind::Blog),
        ])
        .await
        .unwrap();
    assert_eq!((s.inserted, s.ignored), (1, 1));
    assert_eq!(second.count(None).await.unwrap(), 3);
}

#[tokio::test]
async fn same_link_in_two_projects_is_two_rows() {
    let sink = SqliteSink::open_in_memory().unwrap();
    sink.import_batch(vec![
        record(1, "http://example.com/a", SourceKind::Blog),
        record(2, "http://example.com/a", SourceKind::Blog),
    ])
    .await
    .unwrap();

    assert_eq!(sink.count(Some(1)).await.unwrap(), 1);
    assert_eq!(sink.count(Some(2)).await.unwrap(), 1);
    assert_eq!(sink.count(Some(3)).await.unwrap(), 0);
}

#[tokio::test]
async fn duplicate_inside_one_batch_is_ignored() {
    let sink = SqliteSink::open_in_memory().unwrap();
    let s = sink
        .import_batch(vec![
            record(4, "http://example.com/x", SourceKind::Twitter),
            record(4, "http://example.com/x", SourceKind::Blog),
        ])
        .await
        .unwrap();
    assert_eq!((s.inserted, s.ignored), (1, 1));
}

#[tokio::test]
async fn empty_batch_is_a_noop() {
    let sink = SqliteSink::open_in_memory().unwrap();
    let s = sink.import_batch(Vec::new()).await.unwrap();
    assert_eq!((s.inserted, s.ignored), (0, 0));
    assert_eq!(sink.count(None).await.unwrap(), 0);
}
