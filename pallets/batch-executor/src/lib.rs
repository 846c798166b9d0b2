//! Batch Executor Pallet
//!
//! Collects eligible intents into a batch, sums their encrypted contributions, and settles the
//! batch with a single swap once the oracle reveals the aggregate. Individual amounts stay
//! encrypted end to end; only the batch total is ever decrypted.
//!
//! ## Batch lifecycle
//! ```text
//! Prepared -> DecryptionRequested -> DecryptionFulfilled -> Finalized
//! Prepared | DecryptionRequested  -> TimedOut   (deadline elapsed, no answer)
//! ```
//!
//! - `execute_batch` filters candidates through the registry, escrows each participant's due
//!   amount out of the funding vault and requests decryption of the encrypted sum.
//! - The oracle answer arrives through [`OnDecryptionFulfilled`].
//! - `finalize_batch_execution` releases the escrowed stable asset, swaps it into the reward
//!   vault, credits each participant `contribution * received / total` homomorphically, and
//!   books the rounding remainder to `RemainderRecipient`.
//! - A batch whose deadline passed without an answer is refunded to the funding vault, either by
//!   `force_batch_execution` or automatically from `on_initialize`.
//!
//! With `OperatorAllocations` enabled, finalize holds the swap output instead of crediting
//! shares, and `credit_allocations` distributes it once from operator-encrypted amounts. The
//! amounts are checked homomorphically: unless they cover every participant and sum to at most
//! the swap output, each participant gets the proportional share instead. Either way the reward
//! balances created by a batch add up to exactly its swap output.
//!
//! Each participant is reserved in the registry while their batch is open, so one intent can
//! never be captured by two batches.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
  /// Fund `who` in the funding vault and register an intent that is due now. The swap venue
  /// must be able to fill the resulting batch.
  fn subscribe(who: &AccountId);

  /// Deliver the oracle answer for `request_id`.
  fn reveal(request_id: primitives::RequestId);

  /// Produce an allocation owned by `operator` and bound to the reward vault.
  fn allocation_input(operator: &AccountId, value: u64) -> primitives::ExternalInput;

  /// Move the clock to at least `now` (unix seconds).
  fn set_time(now: u64);
}

const LOG_TARGET: &str = "runtime::batch-executor";

#[frame::pallet]
pub mod pallet {
  use super::{LOG_TARGET, WeightInfo};
  use alloc::{collections::BTreeSet, vec::Vec};
  use frame::prelude::*;
  use polkadot_sdk::{
    frame_support::{
      PalletId,
      storage::with_storage_layer,
      traits::{EnsureOrigin, UnixTime},
    },
    sp_runtime::traits::AccountIdConversion,
  };
  use primitives::{
    Balance, BatchConfig, BatchId, BatchStatus, BatchTrigger, ConfidentialLedger,
    CurrentBatchInfo, DecryptionOracle, EncryptedArithmetic, ExternalInput, FheError, Handle,
    IntentLedger, OnDecryptionFulfilled, RequestId, SwapAdapter,
  };

  #[derive(
    Clone,
    Copy,
    Debug,
    Decode,
    DecodeWithMemTracking,
    Encode,
    Eq,
    PartialEq,
    TypeInfo,
    MaxEncodedLen,
  )]
  pub enum BatchState {
    Prepared,
    DecryptionRequested,
    DecryptionFulfilled,
    Finalized,
    TimedOut,
  }

  impl BatchState {
    /// Still waiting for the oracle
    pub fn is_awaiting_decryption(&self) -> bool {
      matches!(self, Self::Prepared | Self::DecryptionRequested)
    }
  }

  #[derive(
    Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
  )]
  #[scale_info(skip_type_params(MaxBatchSize))]
  pub struct Batch<AccountId, MaxBatchSize: Get<u32> + 'static> {
    /// Captured at open time, deduplicated, in candidate order
    pub participants: BoundedVec<AccountId, MaxBatchSize>,
    /// Escrowed encrypted amount per participant, same order as `participants`
    pub contributions: BoundedVec<Handle, MaxBatchSize>,
    pub encrypted_total: Handle,
    pub decrypted_total: Option<u64>,
    pub request_id: Option<RequestId>,
    pub created_at: u64,
    /// Unix seconds after which the batch may be timed out
    pub deadline: u64,
    pub state: BatchState,
    pub volatile_received: Option<Balance>,
    pub finalized_at: Option<u64>,
    /// Swap output is held until `credit_allocations` distributes it
    pub allocations_pending: bool,
  }

  pub type BatchOf<T> = Batch<<T as frame_system::Config>::AccountId, <T as Config>::MaxBatchSize>;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    type Fhe: EncryptedArithmetic<Self::AccountId>;
    type Oracle: DecryptionOracle;
    type Intents: IntentLedger<Self::AccountId>;
    /// Stable asset ledger the contributions are escrowed from
    type FundingVault: ConfidentialLedger<Self::AccountId>;
    /// Volatile asset ledger the swap output is credited to
    type RewardVault: ConfidentialLedger<Self::AccountId>;
    type Swap: SwapAdapter<Self::AccountId>;
    type Time: UnixTime;
    /// Operator allowed to finalize batches and credit allocations
    type FinalizeOrigin: EnsureOrigin<Self::RuntimeOrigin, Success = Self::AccountId>;
    /// Receives the rounding remainder of every distribution
    type RemainderRecipient: Get<Self::AccountId>;
    #[pallet::constant]
    type PalletId: Get<PalletId>;
    #[pallet::constant]
    type MinBatchUsers: Get<u32>;
    #[pallet::constant]
    type MaxBatchSize: Get<u32> + 'static;
    /// Seconds the oracle has to answer
    #[pallet::constant]
    type DecryptionTimeout: Get<u64>;
    #[pallet::constant]
    type DefaultPoolFee: Get<u32>;
    #[pallet::constant]
    type MaxOpenBatches: Get<u32>;
    /// Leave distribution of the swap output to `credit_allocations`
    #[pallet::constant]
    type OperatorAllocations: Get<bool>;
    type WeightInfo: WeightInfo;
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId>;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::storage]
  #[pallet::getter(fn batches)]
  pub type Batches<T: Config> = StorageMap<_, Twox64Concat, BatchId, BatchOf<T>, OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn next_batch_id)]
  pub type NextBatchId<T> = StorageValue<_, BatchId, ValueQuery>;

  /// Decryption requests still owned by an open batch
  #[pallet::storage]
  pub type RequestToBatch<T> = StorageMap<_, Twox64Concat, RequestId, BatchId, OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn open_batches)]
  pub type OpenBatches<T: Config> =
    StorageValue<_, BoundedVec<BatchId, T::MaxOpenBatches>, ValueQuery>;

  #[pallet::storage]
  pub type FinalizedCount<T> = StorageValue<_, u64, ValueQuery>;

  #[pallet::storage]
  pub type LastFinalizedAt<T> = StorageValue<_, u64, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    BatchPrepared {
      batch_id: BatchId,
      participants: u32,
      deadline: u64,
    },
    BatchDecryptionRequested {
      batch_id: BatchId,
      request_id: RequestId,
    },
    BatchDecryptionFulfilled {
      batch_id: BatchId,
      total: u64,
    },
    BatchExecuted {
      batch_id: BatchId,
      amount_in: Balance,
      amount_out: Balance,
      participants: u32,
    },
    /// Contributions were refunded to the funding vault
    BatchTimeout {
      batch_id: BatchId,
      refunded: u32,
    },
    AllocationsCredited {
      batch_id: BatchId,
      count: u32,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    BatchNotFound,
    /// Fewer eligible candidates than the participant threshold
    InsufficientParticipants,
    TooManyOpenBatches,
    /// Oracle answer does not belong to a batch awaiting it
    StaleOrUnknownRequest,
    /// Aggregate has not been decrypted yet (or the batch is not finalized)
    BatchNotReady,
    BatchAlreadyFinalized,
    BatchTimedOut,
    /// Aggregate is already known; the batch can only be finalized
    DecryptionAlreadyFulfilled,
    DeadlineNotReached,
    NotParticipant,
    /// Batch output was already distributed
    AllocationsNotPending,
    /// Allocations must name every participant exactly once
    AllocationMismatch,
    /// Swap output does not fit the ciphertext domain
    AmountOverflow,
    /// Encrypted arithmetic backend rejected an operation
    ArithmeticFailure,
  }

  impl<T> From<FheError> for Error<T> {
    fn from(_: FheError) -> Self {
      Error::ArithmeticFailure
    }
  }

  #[pallet::hooks]
  impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
    fn on_initialize(_n: BlockNumberFor<T>) -> Weight {
      let now = Self::now();
      let mut weight = T::DbWeight::get().reads(1);

      for batch_id in OpenBatches::<T>::get() {
        weight = weight.saturating_add(T::DbWeight::get().reads(1));
        let expired = Batches::<T>::get(batch_id)
          .is_some_and(|b| b.state.is_awaiting_decryption() && now >= b.deadline);
        if !expired {
          continue;
        }
        match with_storage_layer(|| Self::do_timeout(batch_id, now)) {
          Ok(refunded) => {
            weight = weight.saturating_add(T::WeightInfo::force_batch_execution(refunded));
          }
          Err(e) => {
            log::warn!(target: LOG_TARGET, "automatic timeout of batch {batch_id} failed: {e:?}");
          }
        }
      }
      weight
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Open a batch from `users`
    ///
    /// Ineligible, unfunded and duplicate candidates are dropped; the rest are truncated to
    /// `MaxBatchSize` and must number at least `MinBatchUsers`.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::execute_batch(users.len() as u32))]
    pub fn execute_batch(origin: OriginFor<T>, users: Vec<T::AccountId>) -> DispatchResult {
      ensure_signed(origin)?;
      Self::open_batch(users, T::MinBatchUsers::get())?;
      Ok(())
    }

    /// Swap the decrypted aggregate and distribute the output
    ///
    /// Any failure leaves the batch `DecryptionFulfilled` for a retry.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::finalize_batch_execution(T::MaxBatchSize::get()))]
    pub fn finalize_batch_execution(
      origin: OriginFor<T>,
      batch_id: BatchId,
      min_eth_out: Balance,
      pool_fee: Option<u32>,
    ) -> DispatchResult {
      T::FinalizeOrigin::ensure_origin(origin)?;
      let pool_fee = pool_fee.unwrap_or_else(|| T::DefaultPoolFee::get());
      Self::do_finalize(batch_id, min_eth_out, pool_fee)
    }

    /// Refund a batch the oracle did not answer before its deadline
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::force_batch_execution(T::MaxBatchSize::get()))]
    pub fn force_batch_execution(origin: OriginFor<T>, batch_id: BatchId) -> DispatchResult {
      ensure_signed(origin)?;
      Self::do_timeout(batch_id, Self::now())?;
      Ok(())
    }

    /// Distribute the held swap output of a finalized batch from operator-encrypted amounts
    ///
    /// Inputs must be bound to the operator and the reward vault, and `users` must list every
    /// participant once. If the amounts sum past the swap output, the proportional shares are
    /// credited instead.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::credit_allocations(users.len() as u32))]
    pub fn credit_allocations(
      origin: OriginFor<T>,
      batch_id: BatchId,
      users: BoundedVec<T::AccountId, T::MaxBatchSize>,
      allocations: BoundedVec<ExternalInput, T::MaxBatchSize>,
    ) -> DispatchResult {
      let operator = T::FinalizeOrigin::ensure_origin(origin)?;
      let mut batch = Batches::<T>::get(batch_id).ok_or(Error::<T>::BatchNotFound)?;
      ensure!(
        batch.state == BatchState::Finalized,
        Error::<T>::BatchNotReady
      );
      ensure!(
        batch.allocations_pending,
        Error::<T>::AllocationsNotPending
      );
      ensure!(
        users.iter().all(|u| batch.participants.contains(u)),
        Error::<T>::NotParticipant
      );
      let distinct = users.iter().collect::<BTreeSet<_>>().len();
      ensure!(
        distinct == batch.participants.len() && users.len() == allocations.len(),
        Error::<T>::AllocationMismatch
      );

      let amounts = T::RewardVault::verify_inputs(&operator, &allocations)?;
      let ordered = batch
        .participants
        .iter()
        .map(|who| {
          users
            .iter()
            .position(|u| u == who)
            .and_then(|i| amounts.get(i).copied())
            .ok_or(Error::<T>::AllocationMismatch)
        })
        .collect::<Result<Vec<_>, _>>()?;

      let total = batch.decrypted_total.ok_or(Error::<T>::BatchNotReady)?;
      let received = batch.volatile_received.ok_or(Error::<T>::BatchNotReady)?;
      let received_u64 = u64::try_from(received).map_err(|_| Error::<T>::AmountOverflow)?;
      let shares = Self::proportional_shares(&batch.contributions, received, total)?;
      let credited =
        Self::guard_allocations(&ordered, &shares, received_u64).map_err(Error::<T>::from)?;
      Self::distribute(&batch.participants, &credited, received_u64)?;

      batch.allocations_pending = false;
      Batches::<T>::insert(batch_id, batch);
      Self::deposit_event(Event::AllocationsCredited {
        batch_id,
        count: users.len() as u32,
      });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Settlement account holding released stable funds during a swap
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    pub fn batch_info(batch_id: BatchId) -> Option<BatchOf<T>> {
      Batches::<T>::get(batch_id)
    }

    pub fn batch_config() -> BatchConfig {
      BatchConfig {
        min_batch_users: T::MinBatchUsers::get(),
        max_batch_size: T::MaxBatchSize::get(),
        decryption_timeout: T::DecryptionTimeout::get(),
        default_pool_fee: T::DefaultPoolFee::get(),
      }
    }

    pub fn current_batch_info() -> CurrentBatchInfo {
      CurrentBatchInfo {
        next_batch_id: NextBatchId::<T>::get(),
        open_batches: OpenBatches::<T>::decode_len().unwrap_or(0) as u32,
        finalized_batches: FinalizedCount::<T>::get(),
        last_finalized_at: LastFinalizedAt::<T>::get(),
      }
    }

    fn now() -> u64 {
      T::Time::now().as_secs()
    }

    /// Eligible, funded, deduplicated candidates with their funding balance
    fn select_participants(
      candidates: Vec<T::AccountId>,
      now: u64,
    ) -> Vec<(T::AccountId, Handle)> {
      let max = T::MaxBatchSize::get() as usize;
      let mut seen = BTreeSet::new();
      let mut selected = Vec::new();

      for who in candidates {
        if selected.len() >= max {
          break;
        }
        if !seen.insert(who.clone()) {
          continue;
        }
        if !T::Intents::is_eligible(&who, now) {
          log::debug!(target: LOG_TARGET, "dropping {who:?}: no eligible intent");
          continue;
        }
        match T::FundingVault::encrypted_balance(&who) {
          Some(balance) => selected.push((who, balance)),
          None => log::debug!(target: LOG_TARGET, "dropping {who:?}: no funding balance"),
        }
      }
      selected
    }

    pub(crate) fn open_batch(
      candidates: Vec<T::AccountId>,
      min_participants: u32,
    ) -> Result<BatchId, DispatchError> {
      let now = Self::now();
      let selected = Self::select_participants(candidates, now);
      ensure!(
        selected.len() as u32 >= min_participants.max(1),
        Error::<T>::InsufficientParticipants
      );
      ensure!(
        (OpenBatches::<T>::decode_len().unwrap_or(0) as u32) < T::MaxOpenBatches::get(),
        Error::<T>::TooManyOpenBatches
      );

      let batch_id = NextBatchId::<T>::mutate(|id| {
        let current = *id;
        *id = id.saturating_add(1);
        current
      });
      let spot_price = T::Swap::spot_price();

      let mut participants = Vec::with_capacity(selected.len());
      let mut contributions = Vec::with_capacity(selected.len());
      let mut total = T::Fhe::zero().map_err(Error::<T>::from)?;
      for (who, balance) in selected {
        let due = T::Intents::due_amount(&who, spot_price)?;
        let due = T::Fhe::min(&due, &balance).map_err(Error::<T>::from)?;
        T::FundingVault::debit(&who, &due)?;
        T::Intents::reserve(&who, batch_id)?;
        total = T::Fhe::add(&total, &due).map_err(Error::<T>::from)?;
        participants.push(who);
        contributions.push(due);
      }

      let count = participants.len() as u32;
      let deadline = now.saturating_add(T::DecryptionTimeout::get());
      let mut batch = Batch {
        participants: BoundedVec::truncate_from(participants),
        contributions: BoundedVec::truncate_from(contributions),
        encrypted_total: total,
        decrypted_total: None,
        request_id: None,
        created_at: now,
        deadline,
        state: BatchState::Prepared,
        volatile_received: None,
        finalized_at: None,
        allocations_pending: false,
      };
      OpenBatches::<T>::try_mutate(|open| open.try_push(batch_id))
        .map_err(|_| Error::<T>::TooManyOpenBatches)?;
      Self::deposit_event(Event::BatchPrepared {
        batch_id,
        participants: count,
        deadline,
      });

      let request_id = T::Oracle::request_decryption(&total).map_err(Error::<T>::from)?;
      batch.request_id = Some(request_id);
      batch.state = BatchState::DecryptionRequested;
      Batches::<T>::insert(batch_id, batch);
      RequestToBatch::<T>::insert(request_id, batch_id);

      log::info!(target: LOG_TARGET, "batch {batch_id} opened with {count} participants");
      Self::deposit_event(Event::BatchDecryptionRequested {
        batch_id,
        request_id,
      });
      Ok(batch_id)
    }

    fn fulfill(batch_id: BatchId, request_id: RequestId, total: u64) -> DispatchResult {
      Batches::<T>::try_mutate(batch_id, |maybe| -> DispatchResult {
        let batch = maybe.as_mut().ok_or(Error::<T>::StaleOrUnknownRequest)?;
        ensure!(
          batch.request_id == Some(request_id) && batch.state == BatchState::DecryptionRequested,
          Error::<T>::StaleOrUnknownRequest
        );
        batch.decrypted_total = Some(total);
        batch.state = BatchState::DecryptionFulfilled;
        Ok(())
      })?;

      log::debug!(target: LOG_TARGET, "batch {batch_id} aggregate revealed");
      Self::deposit_event(Event::BatchDecryptionFulfilled { batch_id, total });
      Ok(())
    }

    pub(crate) fn do_finalize(
      batch_id: BatchId,
      min_out: Balance,
      pool_fee: u32,
    ) -> DispatchResult {
      let mut batch = Batches::<T>::get(batch_id).ok_or(Error::<T>::BatchNotFound)?;
      match batch.state {
        BatchState::DecryptionFulfilled => {}
        BatchState::Finalized => return Err(Error::<T>::BatchAlreadyFinalized.into()),
        BatchState::TimedOut => return Err(Error::<T>::BatchTimedOut.into()),
        _ => return Err(Error::<T>::BatchNotReady.into()),
      }
      let total = batch.decrypted_total.ok_or(Error::<T>::BatchNotReady)?;

      let received = if total == 0 {
        0
      } else {
        let settlement = Self::account_id();
        T::FundingVault::release(&settlement, Balance::from(total))?;
        T::Swap::execute_batch_swap(
          batch_id,
          &settlement,
          Balance::from(total),
          min_out,
          &T::RewardVault::custody_account(),
          pool_fee,
        )?
      };
      let received_u64 = u64::try_from(received).map_err(|_| Error::<T>::AmountOverflow)?;
      T::RewardVault::note_inflow(received);

      let hold = T::OperatorAllocations::get() && total > 0;
      if hold {
        log::debug!(target: LOG_TARGET, "batch {batch_id} output held for operator allocations");
      } else {
        let shares = Self::proportional_shares(&batch.contributions, received, total)?;
        Self::distribute(&batch.participants, &shares, received_u64)?;
      }

      let now = Self::now();
      for (who, contribution) in batch.participants.iter().zip(batch.contributions.iter()) {
        T::Intents::record_execution(who, batch_id, contribution, now)?;
      }
      let participants = batch.participants.len() as u32;
      T::Intents::note_batch_executed(batch_id, participants, now);

      if let Some(request_id) = batch.request_id {
        RequestToBatch::<T>::remove(request_id);
      }
      batch.state = BatchState::Finalized;
      batch.volatile_received = Some(received);
      batch.finalized_at = Some(now);
      batch.allocations_pending = hold;
      Batches::<T>::insert(batch_id, batch);
      OpenBatches::<T>::mutate(|open| open.retain(|id| *id != batch_id));
      FinalizedCount::<T>::mutate(|n| *n = n.saturating_add(1));
      LastFinalizedAt::<T>::put(now);

      log::info!(target: LOG_TARGET, "batch {batch_id} settled: {total} in, {received} out");
      Self::deposit_event(Event::BatchExecuted {
        batch_id,
        amount_in: Balance::from(total),
        amount_out: received,
        participants,
      });
      Ok(())
    }

    /// `contribution * received / total` for every contribution, rounded down
    fn proportional_shares(
      contributions: &[Handle],
      received: Balance,
      total: u64,
    ) -> Result<Vec<Handle>, DispatchError> {
      let shares = contributions
        .iter()
        .map(|contribution| {
          if total == 0 {
            T::Fhe::zero()
          } else {
            T::Fhe::scaled_share(contribution, received, Balance::from(total))
          }
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::<T>::from)?;
      Ok(shares)
    }

    /// `allocations` if they sum to at most `cap` without wrapping, `fallback` otherwise
    ///
    /// The check runs on ciphertexts; neither the sum nor the outcome is revealed.
    fn guard_allocations(
      allocations: &[Handle],
      fallback: &[Handle],
      cap: u64,
    ) -> Result<Vec<Handle>, FheError> {
      let cap = T::Fhe::as_encrypted(cap)?;
      let mut sum = T::Fhe::zero()?;
      let mut valid = T::Fhe::le(&sum, &cap)?;
      for amount in allocations {
        let next = T::Fhe::add(&sum, amount)?;
        // `next < sum` only when the addition wrapped
        let no_wrap = T::Fhe::le(&sum, &next)?;
        valid = T::Fhe::select(&no_wrap, &valid, &no_wrap)?;
        sum = next;
      }
      let within = T::Fhe::le(&sum, &cap)?;
      valid = T::Fhe::select(&within, &valid, &within)?;

      allocations
        .iter()
        .zip(fallback)
        .map(|(amount, share)| T::Fhe::select(&valid, amount, share))
        .collect()
    }

    /// Credit `amounts` to `participants` and the rest of `received` to `RemainderRecipient`
    fn distribute(
      participants: &[T::AccountId],
      amounts: &[Handle],
      received: u64,
    ) -> DispatchResult {
      let mut distributed = T::Fhe::zero().map_err(Error::<T>::from)?;
      for (who, amount) in participants.iter().zip(amounts) {
        T::RewardVault::credit(who, amount)?;
        distributed = T::Fhe::add(&distributed, amount).map_err(Error::<T>::from)?;
      }
      let remainder = T::Fhe::as_encrypted(received)
        .and_then(|r| T::Fhe::sub(&r, &distributed))
        .map_err(Error::<T>::from)?;
      T::RewardVault::credit(&T::RemainderRecipient::get(), &remainder)
    }

    /// Refund every contribution and release the reservations; returns the refunded count
    pub(crate) fn do_timeout(batch_id: BatchId, now: u64) -> Result<u32, DispatchError> {
      let mut batch = Batches::<T>::get(batch_id).ok_or(Error::<T>::BatchNotFound)?;
      match batch.state {
        BatchState::Prepared | BatchState::DecryptionRequested => {}
        BatchState::DecryptionFulfilled => {
          return Err(Error::<T>::DecryptionAlreadyFulfilled.into());
        }
        BatchState::Finalized => return Err(Error::<T>::BatchAlreadyFinalized.into()),
        BatchState::TimedOut => return Err(Error::<T>::BatchTimedOut.into()),
      }
      ensure!(now >= batch.deadline, Error::<T>::DeadlineNotReached);

      for (who, contribution) in batch.participants.iter().zip(batch.contributions.iter()) {
        T::FundingVault::credit(who, contribution)?;
        T::Intents::release(who, batch_id);
      }
      // A late oracle answer is then discarded by the gateway.
      if let Some(request_id) = batch.request_id {
        RequestToBatch::<T>::remove(request_id);
      }

      let refunded = batch.participants.len() as u32;
      batch.state = BatchState::TimedOut;
      Batches::<T>::insert(batch_id, batch);
      OpenBatches::<T>::mutate(|open| open.retain(|id| *id != batch_id));
      T::Intents::note_batch_timed_out(batch_id, refunded);

      log::info!(target: LOG_TARGET, "batch {batch_id} timed out, {refunded} contributions refunded");
      Self::deposit_event(Event::BatchTimeout { batch_id, refunded });
      Ok(refunded)
    }
  }

  impl<T: Config> OnDecryptionFulfilled for Pallet<T> {
    fn on_decryption_fulfilled(request_id: RequestId, value: u64) -> Result<bool, DispatchError> {
      match RequestToBatch::<T>::get(request_id) {
        Some(batch_id) => {
          Self::fulfill(batch_id, request_id, value)?;
          Ok(true)
        }
        None => Ok(false),
      }
    }
  }

  impl<T: Config> BatchTrigger<T::AccountId> for Pallet<T> {
    fn trigger_batch(
      users: Vec<T::AccountId>,
      min_participants: u32,
    ) -> Result<BatchId, DispatchError> {
      Self::open_batch(users, min_participants)
    }
  }

  impl<T: Config> BatchStatus for Pallet<T> {
    fn current_batch_info() -> CurrentBatchInfo {
      Self::current_batch_info()
    }

    fn batch_config() -> BatchConfig {
      Self::batch_config()
    }
  }

  /// Genesis configuration: keeps the settlement account alive without a native balance
  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    #[serde(skip)]
    pub _marker: core::marker::PhantomData<T>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
    }
  }
}
