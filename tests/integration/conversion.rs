//! DOCX and image conversion inside an export.

use std::sync::Arc;
use std::time::Duration;

use vkrpack::Error;
use vkrpack::convert::{Converter, DocxConverter, OfficeConverter, TextFallbackConverter};
use vkrpack::error::ConversionError;

use crate::common::{Script, TestEnv, ids, page_count, page_markers, request, scripted_converter};

#[tokio::test]
async fn test_fallback_takes_over_when_primary_fails() {
    let env = TestEnv::new();
    let session = env.upload(&["titul.pdf", "thesis.docx"]).await;
    let (converter, calls) = scripted_converter(Script::Fail, Script::Succeed);

    let result = env
        .pipeline(converter)
        .prepare(request(&session, ids(&session, &["titul.pdf", "thesis.docx"])))
        .await
        .unwrap();

    assert_eq!(page_markers(&result.pdf_path), vec!["titul-0", "thesis-0"]);
    assert_eq!((calls.primary(), calls.fallback()), (1, 1));
}

#[tokio::test]
async fn test_fallback_is_skipped_when_primary_succeeds() {
    let env = TestEnv::new();
    let session = env.upload(&["titul.pdf", "thesis.docx"]).await;
    let (converter, calls) = scripted_converter(Script::Succeed, Script::Succeed);

    env.pipeline(converter)
        .prepare(request(&session, ids(&session, &["titul.pdf", "thesis.docx"])))
        .await
        .unwrap();

    assert_eq!((calls.primary(), calls.fallback()), (1, 0));
}

#[tokio::test]
async fn test_missing_office_binary_falls_back_to_text_rendering() {
    let env = TestEnv::new();
    let session = env.upload(&["titul.pdf", "thesis.docx"]).await;

    let office = env.dir.path().join("no-such-office");
    let converter = Converter::new(DocxConverter::new(
        Box::new(OfficeConverter::new(office, Duration::from_secs(5))),
        Box::new(TextFallbackConverter::new(Duration::from_secs(10))),
    ));

    let result = env
        .pipeline(converter)
        .prepare(request(&session, ids(&session, &["titul.pdf", "thesis.docx"])))
        .await
        .unwrap();

    // Title page plus one rendered text page
    assert_eq!(page_count(&result.pdf_path), 2);
    assert_eq!(page_markers(&result.pdf_path)[0], "titul-0");
}

#[tokio::test]
async fn test_images_become_one_page_each() {
    let env = TestEnv::new();
    let session = env
        .upload(&["titul.pdf", "scan-1.jpg", "scan-2.jpg"])
        .await;
    let (converter, calls) = scripted_converter(Script::Fail, Script::Fail);

    let order = ids(&session, &["titul.pdf", "scan-1.jpg", "scan-2.jpg"]);
    let result = env
        .pipeline(converter)
        .prepare(request(&session, order))
        .await
        .unwrap();

    assert_eq!(page_markers(&result.pdf_path), vec!["titul-0", "", ""]);
    assert_eq!(calls.primary(), 0);
}

#[tokio::test]
async fn test_corrupt_image_fails_export() {
    let env = TestEnv::new();
    let inbox = env.inbox();
    let title = inbox.join("titul.pdf");
    crate::common::write_marked_pdf(&title, "titul", 1);
    let scan = inbox.join("scan.png");
    std::fs::write(&scan, b"not really a png").unwrap();
    let session = env.sessions.create(&[title, scan]).await.unwrap();

    let (converter, _) = scripted_converter(Script::Succeed, Script::Succeed);
    let err = env
        .pipeline(converter)
        .prepare(request(&session, ids(&session, &["titul.pdf", "scan.png"])))
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Conversion(ConversionError::Image { .. })),
        "{err}"
    );
    assert!(env.export_root_entries().is_empty());
}

#[tokio::test]
async fn test_both_strategies_failing_fails_export() {
    let env = TestEnv::new();
    let session = env.upload(&["titul.pdf", "a.docx", "b.docx"]).await;
    let (converter, _) = scripted_converter(Script::Fail, Script::Fail);

    let err = env
        .pipeline(converter)
        .with_workers(1)
        .prepare(request(&session, ids(&session, &["titul.pdf", "a.docx", "b.docx"])))
        .await
        .unwrap_err();

    let Error::Conversion(ConversionError::Docx { primary, fallback, .. }) = err else {
        panic!("expected a DOCX conversion error, got {err}");
    };
    assert_eq!(primary, "office: office refused");
    assert_eq!(fallback, "text: text refused");
}

#[tokio::test]
async fn test_pipeline_shares_converter_across_exports() {
    let env = TestEnv::new();
    let session = env.upload(&["titul.pdf", "thesis.docx"]).await;
    let (converter, calls) = scripted_converter(Script::Succeed, Script::Fail);
    let pipeline = Arc::new(env.pipeline(converter));

    let order = ids(&session, &["titul.pdf", "thesis.docx"]);
    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let req = request(&session, order.clone());
            tokio::spawn(async move { pipeline.prepare(req).await })
        })
        .collect();

    for task in tasks {
        let result = task.await.unwrap().unwrap();
        assert_eq!(page_markers(&result.pdf_path), vec!["titul-0", "thesis-0"]);
    }
    assert_eq!(calls.primary(), 3);
}
