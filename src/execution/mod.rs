/// Execution Layer
///
/// This layer is responsible for:
/// - Submitting transactions through the signer and tracking them by receipt
/// - Allowance checks and exact-amount approvals before every swap leg
/// - Sequencing swap legs and measuring their realized output
/// - Forwarding proceeds to a distinct recipient
/// - Per-sender serialization and the request state machine
///
/// `SwapEngine` drives all of it and returns a `SwapReport` naming exactly which stages ran.

pub mod allowance;
pub mod pipeline;
pub mod remittance;
pub mod report;
pub mod sender_lock;
pub mod state;
pub mod swap_executor;
pub mod transaction;


pub use allowance::{AllowanceOutcome, AllowanceState, ensure_allowance, read_allowance};
pub use pipeline::SwapEngine;
pub use remittance::forward;
pub use report::{StageRecord, StageStatus, SwapOutcome, SwapReport, SwapStage};
pub use sender_lock::{SenderGuard, SenderLocks};
pub use state::{SwapState, SwapStateMachine};
pub use swap_executor::{StepResult, SwapExecutor};
pub use transaction::{ReceiptPolicy, TransactionRecord, TxContext, TxKind, TxStatus};
