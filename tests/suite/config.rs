//! Config-driven runs through the library crates

use std::path::Path;
use std::time::Duration;

use verity_config::VerityConfig;
use verity_feedback::{DocumentId, MemoryHost, RunLifecycle};
use verity_types::Category;

use crate::common::{state_json, write_config};

#[tokio::test]
async fn config_styles_reach_the_host() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "[style]\nicon_dir = \"/opt/verity/icons\"\nicon_size = \"50%\"\n",
    );
    let options = VerityConfig::load_from(&path).unwrap().unwrap().into_options();
    assert!(options.root.starts_with(dir.path()));

    let document = DocumentId::from_path(Path::new("/work/a.sc"));
    let mut lifecycle = RunLifecycle::new(MemoryHost::with_documents([document]), options);
    let run = lifecycle.start().unwrap();

    let staged = run.with_extension("tmp");
    std::fs::write(&staged, serde_json::to_vec(&state_json(5, "z")).unwrap()).unwrap();
    std::fs::rename(&staged, run.join("r.json")).unwrap();
    let applied = tokio::time::timeout(Duration::from_secs(10), lifecycle.next_event())
        .await
        .unwrap();
    assert!(applied);

    let handle = lifecycle.store().handle(Category::ProofState).unwrap();
    let style = lifecycle.host().style(handle).unwrap();
    assert_eq!(style.icon_size.as_deref(), Some("50%"));
    let icons = style.icons.as_ref().unwrap();
    assert_eq!(icons.light, Path::new("/opt/verity/icons/gutter-hint@2x.png"));

    lifecycle.end(None);
    assert!(!run.exists());
}
