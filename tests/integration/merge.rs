//! Lenient merging inside an export.

use lopdf::Document;

use vkrpack::Error;
use vkrpack::error::MergeError;
use vkrpack::model::UploadSession;

use crate::common::{Script, TestEnv, ids, page_markers, request, scripted_converter};

fn stored_path(session: &UploadSession, name: &str) -> std::path::PathBuf {
    session
        .files
        .iter()
        .find(|f| f.original_name == name)
        .map(|f| f.path.clone())
        .unwrap()
}

#[tokio::test]
async fn test_vanished_member_is_skipped() {
    let env = TestEnv::new();
    let session = env
        .upload(&["titul.pdf", "appendix.pdf", "antiplagiat.pdf"])
        .await;
    std::fs::remove_file(stored_path(&session, "appendix.pdf")).unwrap();

    let (converter, _) = scripted_converter(Script::Succeed, Script::Succeed);
    let order = ids(&session, &["titul.pdf", "appendix.pdf", "antiplagiat.pdf"]);
    let result = env
        .pipeline(converter)
        .prepare(request(&session, order))
        .await
        .unwrap();

    assert_eq!(
        page_markers(&result.pdf_path),
        vec!["titul-0", "antiplagiat-0"]
    );
    // The result still lists what was requested
    assert_eq!(result.files.len(), 3);
}

#[tokio::test]
async fn test_corrupt_member_is_skipped() {
    let env = TestEnv::new();
    let session = env.upload(&["titul.pdf", "broken.pdf", "thesis.docx"]).await;
    std::fs::write(stored_path(&session, "broken.pdf"), b"%PDF-1.4 garbage").unwrap();

    let (converter, _) = scripted_converter(Script::Succeed, Script::Fail);
    let order = ids(&session, &["titul.pdf", "broken.pdf", "thesis.docx"]);
    let result = env
        .pipeline(converter)
        .prepare(request(&session, order))
        .await
        .unwrap();

    assert_eq!(page_markers(&result.pdf_path), vec!["titul-0", "thesis-0"]);
}

#[tokio::test]
async fn test_nothing_mergeable_fails_export() {
    let env = TestEnv::new();
    let session = env.upload(&["titul.pdf", "antiplagiat.pdf"]).await;
    for name in ["titul.pdf", "antiplagiat.pdf"] {
        std::fs::remove_file(stored_path(&session, name)).unwrap();
    }

    let (converter, _) = scripted_converter(Script::Succeed, Script::Succeed);
    let err = env
        .pipeline(converter)
        .prepare(request(&session, ids(&session, &["titul.pdf", "antiplagiat.pdf"])))
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Merge(MergeError::NothingToMerge { attempted: 2 })),
        "{err}"
    );
    assert_eq!(err.exit_code(), 4);
    assert!(env.export_root_entries().is_empty());
}

#[tokio::test]
async fn test_export_carries_document_info() {
    let env = TestEnv::new();
    let session = env.upload(&["titul.pdf", "antiplagiat.pdf"]).await;

    let (converter, _) = scripted_converter(Script::Succeed, Script::Succeed);
    let mut req = request(&session, ids(&session, &["titul.pdf", "antiplagiat.pdf"]));
    req.metadata.supervisor = Some("A. Sidorov".to_string());
    let result = env.pipeline(converter).prepare(req).await.unwrap();

    let doc = Document::load(&result.pdf_path).unwrap();
    let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_dictionary(info_id).unwrap();

    let text = |key: &[u8]| {
        String::from_utf8_lossy(info.get(key).unwrap().as_str().unwrap()).into_owned()
    };
    assert_eq!(text(b"Title"), "Consensus protocols in practice");
    assert_eq!(text(b"Author"), "Ivan Petrov");
    assert!(text(b"Subject").contains("A. Sidorov"));
    assert_eq!(text(b"Creator"), "vkrpack");
}
