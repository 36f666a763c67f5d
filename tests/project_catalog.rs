// tests/project_catalog.rs
use std::fs;
use std::path::Path;

use feedback_crawler::config::CrawlerConfig;
use feedback_crawler::projects::{select_projects, ProjectCatalog, ProjectLookupError};

#[test]
fn shipped_sample_files_load() {
    let cfg = CrawlerConfig::load_from(Path::new("config/crawler.toml")).unwrap();
    assert_eq!(cfg, CrawlerConfig::default());

    let catalog = ProjectCatalog::load_from(&cfg.projects_path).unwrap();
    let names: Vec<_> = catalog.projects().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["widget", "gadget"]);
    assert_eq!(catalog.projects()[1].twitter_feed_url, None);
    assert!(!catalog.projects()[1].use_spam_filter);
}

#[tokio::test]
async fn catalog_file_drives_selection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("projects.json");
    fs::write(
        &path,
        r#"[
  {"id": 10, "name": "alpha", "blog_feed_url": "http://a.example/feed"},
  {"id": 11, "name": "beta", "twitter_feed_url": "http://b.example/feed", "use_spam_filter": true}
]"#,
    )
    .unwrap();
    let catalog = ProjectCatalog::load_from(&path).unwrap();

    let all = select_projects(&catalog, &[], false).await.unwrap();
    assert_eq!(all.len(), 2);

    let names = vec!["beta".to_string(), "gamma".to_string()];
    let err = select_projects(&catalog, &names, false).await.unwrap_err();
    assert_eq!(err, ProjectLookupError::Unknown(vec!["gamma".into()]));

    let picked = select_projects(&catalog, &names, true).await.unwrap();
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].id, 11);
}

#[test]
fn duplicate_names_in_file_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("projects.toml");
    fs::write(
        &path,
        "[[projects]]\nid = 1\nname = \"x\"\n\n[[projects]]\nid = 2\nname = \"x\"\n",
    )
    .unwrap();
    let err = ProjectCatalog::load_from(&path).unwrap_err();
    assert!(format!("{err:#}").contains("duplicate project name"));
}
