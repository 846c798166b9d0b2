//! Cross-pallet seams of the settlement pipeline
//!
//! Registry, vaults, swap adapter, executor and scheduler only know each other through these
//! traits; the runtime wires the concrete pallets at construction time.

use alloc::vec::Vec;
use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use polkadot_sdk::sp_runtime::{DispatchError, DispatchResult};
use scale_info::TypeInfo;

use crate::encrypted::{ExternalInput, Handle};

/// Monotonic batch identifier.
pub type BatchId = u64;

/// Public batching parameters exposed to monitoring UIs.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Default,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
)]
pub struct BatchConfig {
  pub min_batch_users: u32,
  pub max_batch_size: u32,
  pub decryption_timeout: u64,
  pub default_pool_fee: u32,
}

/// Snapshot of the executor's progress.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Default,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
)]
pub struct CurrentBatchInfo {
  /// Id the next opened batch will receive
  pub next_batch_id: BatchId,
  /// Batches awaiting decryption or finalization
  pub open_batches: u32,
  pub finalized_batches: u64,
  pub last_finalized_at: Option<u64>,
}

/// Intent bookkeeping consumed by the executor and the scheduler.
pub trait IntentLedger<AccountId> {
  fn active_users() -> Vec<AccountId>;

  fn active_user_count() -> u32;

  /// Active, not captured by an open batch, and its interval has elapsed at `now`.
  fn is_eligible(who: &AccountId, now: u64) -> bool;

  /// Mark `who` as captured by `batch_id`.
  fn reserve(who: &AccountId, batch_id: BatchId) -> DispatchResult;

  /// Drop the capture of `who` by `batch_id`; a no-op for other batches.
  fn release(who: &AccountId, batch_id: BatchId);

  /// Encrypted amount `who` owes the next batch, clamped to the unspent budget.
  /// `spot_price` feeds dip conditions when a quote is available.
  fn due_amount(who: &AccountId, spot_price: Option<u64>) -> Result<Handle, DispatchError>;

  /// Settle one execution of `who`'s intent. Returns `true` when the intent completed.
  fn record_execution(
    who: &AccountId,
    batch_id: BatchId,
    contribution: &Handle,
    now: u64,
  ) -> Result<bool, DispatchError>;

  fn note_batch_executed(batch_id: BatchId, participants: u32, now: u64);

  fn note_batch_timed_out(batch_id: BatchId, released: u32);
}

/// Encrypted per-user ledger with plaintext custody, as driven by the executor.
pub trait ConfidentialLedger<AccountId> {
  /// Account holding the vault's asset custody.
  fn custody_account() -> AccountId;

  fn encrypted_balance(who: &AccountId) -> Option<Handle>;

  /// Subtract `amount` from `who`; callers must keep `amount <= balance`.
  fn debit(who: &AccountId, amount: &Handle) -> DispatchResult;

  fn credit(who: &AccountId, amount: &Handle) -> DispatchResult;

  /// Check that every input is bound to `(owner = submitter, target = vault)`.
  fn verify_inputs(
    submitter: &AccountId,
    amounts: &[ExternalInput],
  ) -> Result<Vec<Handle>, DispatchError>;

  /// Verify every `(owner = submitter, target = vault)` input first, then credit all of them.
  fn credit_batch(
    submitter: &AccountId,
    users: &[AccountId],
    amounts: &[ExternalInput],
  ) -> DispatchResult;

  /// Move `amount` of plaintext custody to `to`.
  fn release(to: &AccountId, amount: u128) -> DispatchResult;

  /// Record custody that arrived without a user deposit (e.g. swap output).
  fn note_inflow(amount: u128);
}

/// Aggregate conversion of the stable asset into the volatile asset.
pub trait SwapAdapter<AccountId> {
  fn execute_batch_swap(
    batch_id: BatchId,
    from: &AccountId,
    amount_in: u128,
    min_out: u128,
    recipient: &AccountId,
    pool_fee: u32,
  ) -> Result<u128, DispatchError>;

  /// Stable units paid per quote unit of the volatile asset.
  fn spot_price() -> Option<u64>;
}

/// Entry point used by automated triggers to open a batch.
pub trait BatchTrigger<AccountId> {
  fn trigger_batch(users: Vec<AccountId>, min_participants: u32) -> Result<BatchId, DispatchError>;
}

/// Read-only executor status for the registry's monitoring queries.
pub trait BatchStatus {
  fn current_batch_info() -> CurrentBatchInfo;

  fn batch_config() -> BatchConfig;
}

impl BatchStatus for () {
  fn current_batch_info() -> CurrentBatchInfo {
    CurrentBatchInfo::default()
  }

  fn batch_config() -> BatchConfig {
    BatchConfig::default()
  }
}
