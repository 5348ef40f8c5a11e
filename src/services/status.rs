// src/services/status.rs
//
// Regra de status derivado da OS: o status vem da contagem de linhas do
// checklist, nunca de uma atribuição livre.

use chrono::{DateTime, Utc};

use crate::models::work_order::WorkOrderStatus;

/// 0 linhas => sem mudança; 1..N-1 => InProgress; N (ou mais) => Completed.
pub fn derive_status(answered_count: i64, total_count: usize) -> Option<WorkOrderStatus> {
    let total = i64::try_from(total_count).unwrap_or(i64::MAX);
    match answered_count {
        n if n <= 0 => None,
        n if n >= total => Some(WorkOrderStatus::Completed),
        _ => Some(WorkOrderStatus::InProgress),
    }
}

/// `completed_at` a gravar junto com o status. Reaplicar o mesmo status não muda o carimbo.
pub fn completion_stamp(
    status: WorkOrderStatus,
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match status {
        WorkOrderStatus::Completed | WorkOrderStatus::Closed => Some(previous.unwrap_or(now)),
        _ => None,
    }
}
