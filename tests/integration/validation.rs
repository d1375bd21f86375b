//! Validation gate of the export pipeline.

use rstest::rstest;

use vkrpack::Error;
use vkrpack::model::{ExportMetadata, SessionState};
use vkrpack::store::SessionStore;

use crate::common::{Script, TestEnv, ids, request, scripted_converter};

fn validation_errors(err: Error) -> Vec<String> {
    match err {
        Error::Validation { errors } => errors,
        other => panic!("expected a validation error, got {other}"),
    }
}

#[tokio::test]
async fn test_unknown_ids_are_all_reported_before_conversion() {
    let env = TestEnv::new();
    let session = env.upload(&["titul.pdf", "thesis.docx"]).await;
    let (converter, calls) = scripted_converter(Script::Succeed, Script::Succeed);

    let mut order = ids(&session, &["titul.pdf", "thesis.docx"]);
    order.insert(1, "ghost-1".to_string());
    order.push("ghost-2".to_string());

    let err = env
        .pipeline(converter)
        .prepare(request(&session, order))
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert_eq!(
        validation_errors(err),
        vec![
            "File ID ghost-1 not found in uploaded files",
            "File ID ghost-2 not found in uploaded files",
        ]
    );
    assert_eq!((calls.primary(), calls.fallback()), (0, 0));
    assert!(env.export_root_entries().is_empty());

    let session = env.sessions.load(&session.session_id).await.unwrap().unwrap();
    assert_eq!(session.state, SessionState::Failed);
}

#[tokio::test]
async fn test_empty_order_is_rejected() {
    let env = TestEnv::new();
    let session = env.upload(&["titul.pdf"]).await;
    let (converter, _) = scripted_converter(Script::Succeed, Script::Succeed);

    let err = env
        .pipeline(converter)
        .prepare(request(&session, Vec::new()))
        .await
        .unwrap_err();

    assert_eq!(validation_errors(err), vec!["No file order specified"]);
}

#[tokio::test]
async fn test_missing_required_metadata_collects_every_error() {
    let env = TestEnv::new();
    let session = env.upload(&["titul.pdf"]).await;
    let (converter, _) = scripted_converter(Script::Succeed, Script::Succeed);

    let mut req = request(&session, ids(&session, &["titul.pdf"]));
    req.metadata = ExportMetadata::default();

    let err = env.pipeline(converter).prepare(req).await.unwrap_err();

    assert_eq!(
        validation_errors(err),
        vec!["Title is required", "Author is required", "Year is required"]
    );
}

#[rstest]
#[case::not_a_number("abc", Some("Year must be a valid number"), None)]
#[case::too_early("1990", None, Some("Year 1990 seems unusual"))]
#[case::plausible("2024", None, None)]
#[tokio::test]
async fn test_year_checks(
    #[case] year: &str,
    #[case] error: Option<&str>,
    #[case] warning: Option<&str>,
) {
    let env = TestEnv::new();
    let session = env
        .upload(&["titul.pdf", "thesis.docx", "antiplagiat.pdf"])
        .await;
    let (converter, _) = scripted_converter(Script::Succeed, Script::Fail);

    let mut req = request(
        &session,
        ids(&session, &["titul.pdf", "thesis.docx", "antiplagiat.pdf"]),
    );
    req.metadata.year = year.to_string();

    let outcome = env.pipeline(converter).prepare(req).await;

    match (error, outcome) {
        (Some(expected), Err(err)) => assert_eq!(validation_errors(err), vec![expected]),
        (None, Ok(result)) => match warning {
            Some(expected) => {
                assert_eq!(result.warnings.len(), 1, "{:?}", result.warnings);
                assert!(result.warnings[0].starts_with(expected), "{:?}", result.warnings);
            }
            None => assert!(result.warnings.is_empty(), "{:?}", result.warnings),
        },
        (expected, outcome) => panic!("expected error {expected:?}, got {outcome:?}"),
    }
}

#[tokio::test]
async fn test_warnings_do_not_block_export() {
    let env = TestEnv::new();
    let session = env.upload(&["chapter.docx", "cover.pdf"]).await;
    let (converter, _) = scripted_converter(Script::Succeed, Script::Fail);

    let mut req = request(&session, ids(&session, &["chapter.docx", "cover.pdf"]));
    req.metadata.title = "CONSENSUS PROTOCOLS".to_string();
    req.metadata.author = "Petrov".to_string();

    let result = env.pipeline(converter).prepare(req).await.unwrap();

    // Inventory first, then metadata, then ordering
    assert_eq!(
        result.warnings,
        vec![
            "No title page detected (look for files with 'titul', 'титул', 'title' in name)",
            "No antiplagiarism report found (look for files with 'plag', 'antiplag' in name)",
            "Title is in all caps - consider using proper case",
            "Author name should include first and last name",
            "Consider placing title page first in the order",
        ]
    );
    assert!(result.pdf_path.exists());
}

#[tokio::test]
async fn test_title_page_not_first_is_a_warning() {
    let env = TestEnv::new();
    let session = env
        .upload(&["thesis.docx", "titul.pdf", "antiplagiat.pdf"])
        .await;
    let (converter, _) = scripted_converter(Script::Succeed, Script::Fail);

    let order = ids(&session, &["thesis.docx", "titul.pdf", "antiplagiat.pdf"]);
    let result = env
        .pipeline(converter)
        .prepare(request(&session, order))
        .await
        .unwrap();

    assert_eq!(
        result.warnings,
        vec!["Consider placing title page first in the order"]
    );
}
