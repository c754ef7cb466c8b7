/*!
 * Integration tests for the full translation pipeline
 *
 * Exercises the application controller end to end over an in-memory store
 * and a mock translator: parse, plan, translate in the background, poll,
 * edit, and export.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use myansub::app_controller::Controller;
use myansub::job::{JobStatus, JobStore, SqliteJobStore, SubtitleIdentity};
use myansub::subtitle_processor::{parse_srt, serialize_srt};
use crate::common;
use crate::common::mock_providers::MockTranslator;

fn make_test_controller(translator: Arc<MockTranslator>) -> Controller {
    common::init_test_logging();
    let store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new_in_memory().unwrap());
    Controller::with_collaborators(common::test_config(2, 1000), store, translator)
}

/// Poll through the controller until the job settles
async fn wait_for_terminal(controller: &Controller, job_id: &str) -> JobStatus {
    for _ in 0..500 {
        let snapshot = controller.status(job_id).await.unwrap();
        if snapshot.status.is_terminal() {
            return snapshot.status;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("Job {} never reached a terminal state", job_id);
}

/// Test the whole pipeline from SRT content to exported translation
#[tokio::test]
async fn test_pipeline_fromSrtToExport_shouldProduceTranslatedFile() -> Result<()> {
    let translator = Arc::new(MockTranslator::new());
    let controller = make_test_controller(translator.clone());

    let lines = parse_srt(common::sample_srt_content())?;
    let summary = controller
        .jobs()
        .start_or_resume(SubtitleIdentity::new("Test Movie", "tt0000001"), lines)
        .await?;

    // 3 lines with a batch size of 2
    assert_eq!(summary.total_batches, 2);

    let status = wait_for_terminal(&controller, &summary.job_id).await;
    assert_eq!(status, JobStatus::Complete);
    assert_eq!(translator.call_count(), 2);

    let (filename, content) = controller.export(&summary.job_id).await?;
    assert_eq!(filename, "Test Movie.srt");

    let exported = parse_srt(&content)?;
    assert_eq!(exported.len(), 3);
    assert_eq!(
        exported[0].source_text,
        MockTranslator::translation_for("This is a test subtitle.")
    );
    assert_eq!(exported[0].timestamp, "00:00:01,000 --> 00:00:04,000");
    Ok(())
}

/// Test that restarting the same movie serves the cached job
#[tokio::test]
async fn test_pipeline_restartedMovie_shouldServeCachedJobWithoutNewWork() -> Result<()> {
    let translator = Arc::new(MockTranslator::new());
    let controller = make_test_controller(translator.clone());
    let identity = SubtitleIdentity::new("Test Movie", "tt0000001");

    let first = controller
        .jobs()
        .start_or_resume(identity.clone(), parse_srt(common::sample_srt_content())?)
        .await?;
    wait_for_terminal(&controller, &first.job_id).await;
    let calls = translator.call_count();

    let second = controller
        .jobs()
        .start_or_resume(identity, parse_srt(common::sample_srt_content())?)
        .await?;

    assert!(second.cache_hit);
    assert_eq!(second.job_id, first.job_id);
    assert_eq!(translator.call_count(), calls);
    Ok(())
}

/// Test manual editing of a finished job through the controller
#[tokio::test]
async fn test_pipeline_editAfterCompletion_shouldExportEditedText() -> Result<()> {
    let translator = Arc::new(MockTranslator::new());
    let controller = make_test_controller(translator);

    let summary = controller
        .jobs()
        .start_or_resume(
            SubtitleIdentity::new("Test Movie", "tt0000001"),
            parse_srt(common::sample_srt_content())?,
        )
        .await?;
    wait_for_terminal(&controller, &summary.job_id).await;

    let mut job = controller.job(&summary.job_id).await?;
    job.lines[1].translated_text = "လက်ဖြင့်ပြင်ထားသည်".to_string();
    controller.update_lines(&summary.job_id, job.lines).await?;

    let (_, content) = controller.export(&summary.job_id).await?;
    assert!(content.contains("လက်ဖြင့်ပြင်ထားသည်"));
    Ok(())
}

/// Test export of a partially translated (cancelled) job
#[tokio::test]
async fn test_pipeline_exportAfterCancel_shouldFallBackToSourceText() -> Result<()> {
    let translator = Arc::new(MockTranslator::new().with_delay(Duration::from_millis(40)));
    let controller = make_test_controller(translator);

    let summary = controller
        .jobs()
        .start_or_resume(
            SubtitleIdentity::new("Test Movie", "tt0000001"),
            parse_srt(common::sample_srt_content())?,
        )
        .await?;

    controller.cancel(&summary.job_id).await?;
    wait_for_terminal(&controller, &summary.job_id).await;

    // Whatever was not translated still exports as English
    let (_, content) = controller.export(&summary.job_id).await?;
    let exported = parse_srt(&content)?;
    assert_eq!(exported.len(), 3);
    Ok(())
}

/// Test that serialization used by export round trips timestamps
#[tokio::test]
async fn test_pipeline_exportedContent_shouldRoundTripThroughParser() -> Result<()> {
    let translator = Arc::new(MockTranslator::new());
    let controller = make_test_controller(translator);

    let original = parse_srt(common::sample_srt_content())?;
    let summary = controller
        .jobs()
        .start_or_resume(SubtitleIdentity::new("Test Movie", "tt0000001"), original.clone())
        .await?;
    wait_for_terminal(&controller, &summary.job_id).await;

    let job = controller.job(&summary.job_id).await?;
    let reparsed = parse_srt(&serialize_srt(&job.lines))?;

    assert_eq!(reparsed.len(), original.len());
    for (a, b) in original.iter().zip(&reparsed) {
        assert_eq!(a.timestamp, b.timestamp);
    }
    Ok(())
}

/// Test the search query guard on the controller
#[tokio::test]
async fn test_search_withEmptyQuery_shouldFailBeforeAnyRequest() {
    let translator = Arc::new(MockTranslator::new());
    let controller = make_test_controller(translator);

    assert!(controller.search("   ").await.is_err());
}

/// Test identity validation on the translation entry point
#[tokio::test]
async fn test_start_translation_withBlankTitle_shouldFailBeforeDownload() {
    let translator = Arc::new(MockTranslator::new());
    let controller = make_test_controller(translator);

    let result = controller.start_translation(1, "", "tt1").await;

    assert!(result.is_err());
}
