//! Per-task retry loop: admit, send, classify, back off, repeat.

use crate::events::{EventSink, ExecutorEvent, FailureClass};
use crate::gate::{ConcurrencyGate, GateSlot};
use crate::retry::{classify, AttemptOutcome, FailureReason};
use crate::transport::{Transport, TransportError};
use tokio_util::sync::CancellationToken;

use super::result::TaskResult;
use super::{BatchOptions, FetchTask, SlotPolicy};

/// Everything a task borrows from its batch.
pub(super) struct TaskContext<'a> {
    pub(super) gate: &'a ConcurrencyGate,
    pub(super) options: &'a BatchOptions,
    pub(super) transport: &'a dyn Transport,
    pub(super) sink: &'a dyn EventSink,
    pub(super) cancel: &'a CancellationToken,
}

/// Runs one task to its terminal result and reports it to the sink.
///
/// Cancellation drops the in-progress loop (releasing its slot and aborting
/// the in-flight transfer) and records `Failed { Cancelled }`.
pub(super) async fn run_task(ctx: &TaskContext<'_>, task: &FetchTask) -> TaskResult {
    let mut attempts_made = 0u32;
    let finished = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        result = attempt_loop(ctx, task, &mut attempts_made) => Some(result),
    };
    let result = match finished {
        Some(result) => result,
        None => {
            // No new admissions once the batch is cancelled.
            ctx.gate.close();
            TaskResult::cancelled(attempts_made)
        }
    };
    ctx.sink.emit(ExecutorEvent::TaskTerminal {
        task_id: task.id,
        result: result.terminal_state(),
    });
    result
}

async fn attempt_loop(
    ctx: &TaskContext<'_>,
    task: &FetchTask,
    attempts_made: &mut u32,
) -> TaskResult {
    let timeout = ctx.options.request_timeout;
    let mut slot: Option<GateSlot<'_>> = None;
    let mut attempt = 1u32;

    loop {
        if slot.is_none() {
            match ctx.gate.acquire().await {
                Ok(s) => slot = Some(s),
                Err(_) => return TaskResult::cancelled(*attempts_made),
            }
        }

        *attempts_made = attempt;
        ctx.sink.emit(ExecutorEvent::AttemptStarted {
            task_id: task.id,
            attempt,
        });

        let sent = tokio::time::timeout(timeout, ctx.transport.send(&task.url, timeout)).await;
        let result = sent.unwrap_or(Err(TransportError::Timeout(timeout)));

        match classify(result, &ctx.options.extra_retryable) {
            AttemptOutcome::Success { body } => {
                ctx.sink.emit(ExecutorEvent::AttemptSucceeded {
                    task_id: task.id,
                    attempt,
                });
                return TaskResult::Completed {
                    body,
                    attempts: attempt,
                };
            }
            AttemptOutcome::Fatal { reason } => {
                emit_failed(ctx, task, attempt, FailureClass::Fatal, &reason);
                return TaskResult::Failed {
                    reason,
                    attempts_made: attempt,
                };
            }
            AttemptOutcome::Retryable { kind, reason } => {
                emit_failed(ctx, task, attempt, FailureClass::Retryable(kind), &reason);
                let Some(delay) = ctx.options.policy.next_delay(attempt) else {
                    return TaskResult::Failed {
                        reason,
                        attempts_made: attempt,
                    };
                };
                tracing::debug!(
                    task_id = task.id,
                    attempt,
                    ?delay,
                    "backing off before retry"
                );
                if ctx.options.slot_policy == SlotPolicy::ReleaseDuringBackoff {
                    slot = None;
                }
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

fn emit_failed(
    ctx: &TaskContext<'_>,
    task: &FetchTask,
    attempt: u32,
    classification: FailureClass,
    reason: &FailureReason,
) {
    ctx.sink.emit(ExecutorEvent::AttemptFailed {
        task_id: task.id,
        attempt,
        classification,
        reason: reason.clone(),
    });
}
