/*!
 * Tests for the job controller lifecycle and execution loop
 */

use std::sync::Arc;
use std::time::Duration;

use myansub::job::{
    BatchStatus, JobController, JobStatus, JobStore, SqliteJobStore, StatusSnapshot,
    SubtitleIdentity,
};
use crate::common;
use crate::common::mock_providers::MockTranslator;

fn make_controller(
    translator: Arc<MockTranslator>,
    batch_size: usize,
    max_auto_translate: usize,
) -> (JobController, Arc<dyn JobStore>) {
    common::init_test_logging();
    let store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new_in_memory().unwrap());
    let controller = JobController::new(store.clone(), translator, batch_size, max_auto_translate);
    (controller, store)
}

/// Poll a job until it reaches a terminal state
async fn wait_for_terminal(controller: &JobController, job_id: &str) -> StatusSnapshot {
    for _ in 0..500 {
        let snapshot = controller.status(job_id).await.unwrap();
        if snapshot.status.is_terminal() {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("Job {} never reached a terminal state", job_id);
}

/// Test a full happy-path run through all batches
#[tokio::test]
async fn test_start_or_resume_withFreshIdentity_shouldTranslateAllBatches() {
    let translator = Arc::new(MockTranslator::new());
    let (controller, _store) = make_controller(translator.clone(), 10, 1000);

    let summary = controller
        .start_or_resume(SubtitleIdentity::new("Movie", "tt1"), common::make_lines(30))
        .await
        .unwrap();

    assert!(!summary.cache_hit);
    assert_eq!(summary.total_batches, 3);
    assert_eq!(summary.total_lines, 30);

    let snapshot = wait_for_terminal(&controller, &summary.job_id).await;
    assert_eq!(snapshot.status, JobStatus::Complete);
    assert_eq!(snapshot.completed_batches, 3);
    assert!(snapshot.batches.iter().all(|b| b.status == BatchStatus::Complete));

    let job = controller.job(&summary.job_id).await.unwrap();
    assert!(job
        .lines
        .iter()
        .all(|l| l.translated_text == MockTranslator::translation_for(&l.source_text)));
    assert_eq!(translator.call_count(), 3);
}

/// Test input validation on the entry operation
#[tokio::test]
async fn test_start_or_resume_withBlankIdentityFields_shouldFail() {
    let translator = Arc::new(MockTranslator::new());
    let (controller, _store) = make_controller(translator, 10, 1000);

    let no_title = controller
        .start_or_resume(SubtitleIdentity::new("  ", "tt1"), common::make_lines(5))
        .await;
    assert!(no_title.is_err());

    let no_imdb = controller
        .start_or_resume(SubtitleIdentity::new("Movie", ""), common::make_lines(5))
        .await;
    assert!(no_imdb.is_err());
}

/// Test that a finished job is reused instead of translated again
#[tokio::test]
async fn test_start_or_resume_withCompletedIdentity_shouldReturnCacheHit() {
    let translator = Arc::new(MockTranslator::new());
    let (controller, _store) = make_controller(translator.clone(), 10, 1000);
    let identity = SubtitleIdentity::new("Movie", "tt1");

    let first = controller
        .start_or_resume(identity.clone(), common::make_lines(20))
        .await
        .unwrap();
    wait_for_terminal(&controller, &first.job_id).await;
    let calls_after_first = translator.call_count();

    let second = controller
        .start_or_resume(identity, common::make_lines(20))
        .await
        .unwrap();

    assert!(second.cache_hit);
    assert_eq!(second.job_id, first.job_id);
    assert_eq!(translator.call_count(), calls_after_first);
}

/// Test that a stale unfinished attempt is discarded, not resumed
#[tokio::test]
async fn test_start_or_resume_withStaleFailedJob_shouldDiscardAndStartFresh() {
    let translator = Arc::new(MockTranslator::new());
    let (controller, store) = make_controller(translator.clone(), 10, 1000);
    let identity = SubtitleIdentity::new("Movie", "tt1");

    // A failed earlier attempt for the same identity, seeded directly
    let mut stale = myansub::job::TranslationJob::new(
        identity.clone(),
        common::make_lines(20),
        myansub::job::plan_batches(20, 10, 1000).batches,
    );
    stale.status = JobStatus::Failed;
    store.create(&stale).await.unwrap();

    let fresh = controller
        .start_or_resume(identity.clone(), common::make_lines(20))
        .await
        .unwrap();

    assert!(!fresh.cache_hit);
    assert_ne!(fresh.job_id, stale.id);
    assert!(store.get(&stale.id).await.unwrap().is_none());

    let snapshot = wait_for_terminal(&controller, &fresh.job_id).await;
    assert_eq!(snapshot.status, JobStatus::Complete);
    assert_eq!(snapshot.completed_batches, 2);

    // Exactly one job remains for the identity
    let found = store.find_by_identity(&identity).await.unwrap().unwrap();
    assert_eq!(found.id, fresh.job_id);
}

/// Test the auto-translate ceiling leaves trailing lines untouched
#[tokio::test]
async fn test_start_or_resume_withMoreLinesThanCeiling_shouldOnlyTranslateUpToCeiling() {
    let translator = Arc::new(MockTranslator::new());
    let (controller, _store) = make_controller(translator.clone(), 10, 30);

    let summary = controller
        .start_or_resume(SubtitleIdentity::new("Long Movie", "tt2"), common::make_lines(45))
        .await
        .unwrap();

    assert_eq!(summary.total_batches, 3);
    assert_eq!(summary.total_lines, 45);

    wait_for_terminal(&controller, &summary.job_id).await;
    let job = controller.job(&summary.job_id).await.unwrap();

    assert!(job.lines[..30].iter().all(|l| !l.translated_text.is_empty()));
    assert!(job.lines[30..].iter().all(|l| l.translated_text.is_empty()));
    assert_eq!(translator.call_count(), 3);
}

/// Test that one failed batch does not abort the job
#[tokio::test]
async fn test_execution_loop_withOneFailingBatch_shouldContinueAndComplete() {
    let translator = Arc::new(MockTranslator::failing_on(&[1]));
    let (controller, _store) = make_controller(translator.clone(), 10, 1000);

    let summary = controller
        .start_or_resume(SubtitleIdentity::new("Movie", "tt1"), common::make_lines(30))
        .await
        .unwrap();

    let snapshot = wait_for_terminal(&controller, &summary.job_id).await;

    assert_eq!(snapshot.status, JobStatus::Complete);
    assert_eq!(snapshot.completed_batches, 3);
    assert_eq!(snapshot.batches[0].status, BatchStatus::Complete);
    assert_eq!(snapshot.batches[1].status, BatchStatus::Failed);
    assert_eq!(snapshot.batches[2].status, BatchStatus::Complete);

    // The failed batch's lines stay untranslated
    let job = controller.job(&summary.job_id).await.unwrap();
    assert!(job.lines[10..20].iter().all(|l| l.translated_text.is_empty()));
    assert!(job.lines[..10].iter().all(|l| !l.translated_text.is_empty()));
    assert!(job.lines[20..].iter().all(|l| !l.translated_text.is_empty()));
}

/// Test cancellation takes effect at a batch boundary
#[tokio::test]
async fn test_cancel_onRunningJob_shouldStopWithinOneBatch() {
    let translator = Arc::new(MockTranslator::new().with_delay(Duration::from_millis(50)));
    let (controller, _store) = make_controller(translator.clone(), 10, 1000);

    let summary = controller
        .start_or_resume(SubtitleIdentity::new("Movie", "tt1"), common::make_lines(50))
        .await
        .unwrap();
    assert_eq!(summary.total_batches, 5);

    let status = controller.cancel(&summary.job_id).await.unwrap();
    assert_eq!(status, JobStatus::Cancelled);

    let snapshot = wait_for_terminal(&controller, &summary.job_id).await;
    assert_eq!(snapshot.status, JobStatus::Cancelled);

    // At most the batch already in flight finishes after the cancel
    assert!(translator.call_count() <= 2);
}

/// Test that completion never overwrites a cancellation
#[tokio::test]
async fn test_cancel_duringLastBatch_shouldStayCancelled() {
    let translator = Arc::new(MockTranslator::new().with_delay(Duration::from_millis(30)));
    let (controller, _store) = make_controller(translator, 10, 1000);

    let summary = controller
        .start_or_resume(SubtitleIdentity::new("Movie", "tt1"), common::make_lines(10))
        .await
        .unwrap();

    // Cancel while the only batch is (or is about to be) in flight
    controller.cancel(&summary.job_id).await.unwrap();

    // Give the execution loop time to fully drain
    for _ in 0..100 {
        if !controller.is_active(&summary.job_id) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let snapshot = controller.status(&summary.job_id).await.unwrap();
    assert_eq!(snapshot.status, JobStatus::Cancelled);
}

/// Test cancelling an unknown job
#[tokio::test]
async fn test_cancel_withUnknownId_shouldFail() {
    let translator = Arc::new(MockTranslator::new());
    let (controller, _store) = make_controller(translator, 10, 1000);

    let result = controller.cancel("no-such-job").await;

    assert!(result.is_err());
}

/// Test that cancelling a finished job is a harmless no-op
#[tokio::test]
async fn test_cancel_onCompleteJob_shouldReturnCurrentStatusUnchanged() {
    let translator = Arc::new(MockTranslator::new());
    let (controller, _store) = make_controller(translator, 10, 1000);

    let summary = controller
        .start_or_resume(SubtitleIdentity::new("Movie", "tt1"), common::make_lines(10))
        .await
        .unwrap();
    wait_for_terminal(&controller, &summary.job_id).await;

    let status = controller.cancel(&summary.job_id).await.unwrap();

    assert_eq!(status, JobStatus::Complete);
    let snapshot = controller.status(&summary.job_id).await.unwrap();
    assert_eq!(snapshot.status, JobStatus::Complete);
}

/// Test that the resolved-batch counter never moves backwards
#[tokio::test]
async fn test_status_duringRun_shouldReportMonotonicProgress() {
    let translator = Arc::new(MockTranslator::new().with_delay(Duration::from_millis(10)));
    let (controller, _store) = make_controller(translator, 5, 1000);

    let summary = controller
        .start_or_resume(SubtitleIdentity::new("Movie", "tt1"), common::make_lines(25))
        .await
        .unwrap();

    let mut observed = Vec::new();
    loop {
        let snapshot = controller.status(&summary.job_id).await.unwrap();
        observed.push(snapshot.completed_batches);
        if snapshot.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(observed.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*observed.last().unwrap(), summary.total_batches);
}

/// Test status polling for an unknown job
#[tokio::test]
async fn test_status_withUnknownId_shouldFail() {
    let translator = Arc::new(MockTranslator::new());
    let (controller, _store) = make_controller(translator, 10, 1000);

    assert!(controller.status("no-such-job").await.is_err());
}
