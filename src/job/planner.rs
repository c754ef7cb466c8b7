/*!
 * Batch planning.
 *
 * Pure partitioning of a line count into contiguous translation batches.
 * No I/O, fully deterministic.
 */

use super::models::{BatchRecord, BatchStatus};

/// The output of planning: how many lines will be translated and the
/// batch records covering them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// Number of lines scheduled for translation, `min(total_lines, ceiling)`
    pub total_to_translate: usize,

    /// Contiguous batches partitioning `[0, total_to_translate)`
    pub batches: Vec<BatchRecord>,
}

/// Compute the batch plan for a job
///
/// Lines beyond `max_auto_translate` stay in the job but are never
/// scheduled; they keep empty translations until edited manually.
pub fn plan_batches(total_lines: usize, batch_size: usize, max_auto_translate: usize) -> BatchPlan {
    // Guard against a zero batch size slipping past config validation
    let batch_size = batch_size.max(1);

    let total_to_translate = total_lines.min(max_auto_translate);
    let total_batches = total_to_translate.div_ceil(batch_size);

    let batches = (0..total_batches)
        .map(|index| {
            let start_line = index * batch_size;
            let end_line = ((index + 1) * batch_size).min(total_to_translate);
            BatchRecord {
                index,
                start_line,
                end_line,
                line_count: end_line - start_line,
                status: BatchStatus::Queued,
            }
        })
        .collect();

    BatchPlan {
        total_to_translate,
        batches,
    }
}
