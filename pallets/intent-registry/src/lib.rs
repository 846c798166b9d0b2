//! Intent Registry Pallet
//!
//! Stores one dollar-cost-average intent per account. Amounts (total budget, amount per
//! interval, running spend) are ciphertext handles; only the schedule and the `active` flag are
//! public, which is what lets the batch executor pick participants without learning sizes.
//!
//! ## Lifecycle
//! - `submit_intent` creates or replaces the caller's intent and lists them as active.
//! - The batch executor captures active users through [`IntentLedger`], reserving each one for
//!   the batch until it settles or times out.
//! - `record_execution` advances `spent_so_far` and the period counter; the intent deactivates
//!   itself once every period ran, or once the oracle reveals that the encrypted
//!   `budget_exhausted` flag is set.
//! - `deactivate_intent` lets the owner stop early. Intents are never deleted.
//!
//! ## Dip buying
//! An intent may carry an encrypted price ceiling and a public multiplier. When the swap venue's
//! spot price is at or below the ceiling, the next-due amount is boosted by the multiplier, still
//! clamped to the remaining budget.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

const LOG_TARGET: &str = "runtime::intent-registry";

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
  /// Produce a ciphertext input owned by `owner` and bound to `target`.
  fn encrypted_input(
    owner: &AccountId,
    value: u64,
    target: primitives::ContractTag,
  ) -> primitives::ExternalInput;
}

#[frame::pallet]
pub mod pallet {
  use super::{LOG_TARGET, WeightInfo};
  use alloc::vec::Vec;
  use frame::prelude::*;
  use polkadot_sdk::frame_support::{PalletId, traits::UnixTime};
  use primitives::{
    BatchConfig, BatchId, BatchStatus, ContractTag, CurrentBatchInfo, DecryptionOracle,
    EncryptedArithmetic, ExternalInput, FheError, Handle, IntentLedger, OnDecryptionFulfilled,
    RequestId, params::BPS_DENOMINATOR,
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
  pub enum IntentMode {
    /// Amounts were encrypted client-side
    Encrypted,
    /// Amounts arrived in plaintext through the testing path
    Plaintext,
  }

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
  pub enum DeactivationReason {
    Owner,
    /// Every period has been executed or the budget is spent
    Completed,
  }

  /// Boost applied while the spot price sits at or below an encrypted ceiling
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
  pub struct DipCondition {
    pub trigger_price: Handle,
    /// Multiplier over the regular amount, in basis points (15_000 = 1.5x)
    pub multiplier_bps: u32,
  }

  /// Client-side form of [`DipCondition`]
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
  pub struct DipInput {
    pub trigger_price: ExternalInput,
    pub multiplier_bps: u32,
  }

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
  pub struct Intent {
    pub budget_total: Handle,
    pub amount_per_interval: Handle,
    /// Invariant: never exceeds `budget_total`
    pub spent_so_far: Handle,
    pub interval_seconds: u64,
    pub total_periods: u32,
    pub periods_executed: u32,
    pub last_executed_at: Option<u64>,
    pub submitted_at: u64,
    pub mode: IntentMode,
    /// Encrypted `spent_so_far == budget_total`, refreshed on every execution
    pub budget_exhausted: Option<Handle>,
    pub dip: Option<DipCondition>,
    pub active: bool,
  }

  /// Owner-facing view of an intent
  #[derive(Clone, Copy, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
  pub struct IntentParams {
    pub budget_total: Handle,
    pub amount_per_interval: Handle,
    pub spent_so_far: Handle,
    pub budget_exhausted: Option<Handle>,
    pub active: bool,
  }

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Encrypted arithmetic backend
    type Fhe: EncryptedArithmetic<Self::AccountId>;
    /// Gateway revealing whether a budget is exhausted
    type Oracle: DecryptionOracle;
    /// Wall clock used for interval checks
    type Time: UnixTime;
    /// Executor status surfaced through the registry's queries
    type BatchStatus: BatchStatus;
    /// Tag encrypted inputs must be bound to
    #[pallet::constant]
    type PalletId: Get<PalletId>;
    #[pallet::constant]
    type MaxActiveUsers: Get<u32>;
    #[pallet::constant]
    type MinIntervalSeconds: Get<u64>;
    #[pallet::constant]
    type MaxTotalPeriods: Get<u32>;
    #[pallet::constant]
    type MaxDipMultiplierBps: Get<u32>;
    /// Enables `submit_test_intent`
    #[pallet::constant]
    type AllowPlaintextIntents: Get<bool>;
    type WeightInfo: WeightInfo;
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId>;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::storage]
  #[pallet::getter(fn intents)]
  pub type Intents<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, Intent, OptionQuery>;

  /// Accounts with an active intent, in submission order
  #[pallet::storage]
  pub type ActiveUsers<T: Config> =
    StorageValue<_, BoundedVec<T::AccountId, T::MaxActiveUsers>, ValueQuery>;

  /// Batch currently holding each captured user
  #[pallet::storage]
  #[pallet::getter(fn reservations)]
  pub type Reservations<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, BatchId, OptionQuery>;

  /// Budget-exhaustion reveals in flight: owner and the flag handle that was submitted
  #[pallet::storage]
  pub type ExhaustionChecks<T: Config> =
    StorageMap<_, Twox64Concat, RequestId, (T::AccountId, Handle), OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn batches_executed)]
  pub type BatchesExecuted<T> = StorageValue<_, u64, ValueQuery>;

  #[pallet::storage]
  #[pallet::getter(fn batches_timed_out)]
  pub type BatchesTimedOut<T> = StorageValue<_, u64, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    IntentSubmitted {
      who: T::AccountId,
      mode: IntentMode,
      interval_seconds: u64,
      total_periods: u32,
    },
    /// An existing intent was replaced
    IntentUpdated {
      who: T::AccountId,
      mode: IntentMode,
      interval_seconds: u64,
      total_periods: u32,
    },
    IntentDeactivated {
      who: T::AccountId,
      reason: DeactivationReason,
    },
    /// One period of the intent settled in `batch_id`
    IntentExecuted {
      who: T::AccountId,
      batch_id: BatchId,
      periods_executed: u32,
    },
    BatchExecuted {
      batch_id: BatchId,
      participants: u32,
      executed_at: u64,
    },
    BatchTimeout { batch_id: BatchId, released: u32 },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Encrypted input is not bound to this pallet and the caller
    InvalidCiphertext,
    /// Caller has no active intent
    NoActiveIntent,
    /// Account never submitted an intent
    IntentNotFound,
    /// Intent is captured by a batch awaiting settlement
    IntentReserved,
    /// Interval below the minimum or period count out of range
    InvalidSchedule,
    /// Active user index is full
    TooManyActiveUsers,
    /// Plaintext submissions are disabled on this chain
    PlaintextIntentsDisabled,
    /// Dip multiplier outside `[1x, MaxDipMultiplierBps]`
    InvalidDipMultiplier,
    /// Encrypted arithmetic backend rejected an operation
    ArithmeticFailure,
  }

  impl<T> From<FheError> for Error<T> {
    fn from(e: FheError) -> Self {
      match e {
        FheError::InvalidCiphertext => Error::InvalidCiphertext,
        _ => Error::ArithmeticFailure,
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Create or replace the caller's intent from encrypted amounts
    ///
    /// Both inputs (and the optional dip ceiling) must be bound to this pallet and the caller.
    /// Rejected while a batch holds the caller's current intent.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::submit_intent())]
    pub fn submit_intent(
      origin: OriginFor<T>,
      budget_total: ExternalInput,
      amount_per_interval: ExternalInput,
      interval_seconds: u64,
      total_periods: u32,
      dip: Option<DipInput>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_submittable(&who, interval_seconds, total_periods)?;

      let tag = Self::contract_tag();
      let budget = T::Fhe::verify_input(&who, tag, &budget_total).map_err(Error::<T>::from)?;
      let amount =
        T::Fhe::verify_input(&who, tag, &amount_per_interval).map_err(Error::<T>::from)?;
      let dip = match dip {
        Some(dip) => {
          ensure!(
            (BPS_DENOMINATOR..=T::MaxDipMultiplierBps::get()).contains(&dip.multiplier_bps),
            Error::<T>::InvalidDipMultiplier
          );
          let trigger_price =
            T::Fhe::verify_input(&who, tag, &dip.trigger_price).map_err(Error::<T>::from)?;
          Some(DipCondition {
            trigger_price,
            multiplier_bps: dip.multiplier_bps,
          })
        }
        None => None,
      };

      Self::store_intent(
        who,
        budget,
        amount,
        interval_seconds,
        total_periods,
        IntentMode::Encrypted,
        dip,
      )
    }

    /// Testing path: submit plaintext amounts, encrypted trivially on chain
    ///
    /// Only available when `AllowPlaintextIntents` is set; the intent is labelled
    /// `IntentMode::Plaintext`.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::submit_test_intent())]
    pub fn submit_test_intent(
      origin: OriginFor<T>,
      budget_total: u64,
      amount_per_interval: u64,
      interval_seconds: u64,
      total_periods: u32,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(
        T::AllowPlaintextIntents::get(),
        Error::<T>::PlaintextIntentsDisabled
      );
      Self::ensure_submittable(&who, interval_seconds, total_periods)?;

      let budget = T::Fhe::as_encrypted(budget_total).map_err(Error::<T>::from)?;
      let amount = T::Fhe::as_encrypted(amount_per_interval).map_err(Error::<T>::from)?;

      Self::store_intent(
        who,
        budget,
        amount,
        interval_seconds,
        total_periods,
        IntentMode::Plaintext,
        None,
      )
    }

    /// Stop the caller's intent
    ///
    /// A batch that already captured the intent still settles it.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::deactivate_intent())]
    pub fn deactivate_intent(origin: OriginFor<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;

      Intents::<T>::try_mutate(&who, |maybe| -> DispatchResult {
        let intent = maybe
          .as_mut()
          .filter(|i| i.active)
          .ok_or(Error::<T>::NoActiveIntent)?;
        intent.active = false;
        Ok(())
      })?;
      Self::remove_active(&who);

      Self::deposit_event(Event::IntentDeactivated {
        who,
        reason: DeactivationReason::Owner,
      });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    pub fn contract_tag() -> ContractTag {
      T::PalletId::get().0
    }

    pub fn active_users() -> Vec<T::AccountId> {
      ActiveUsers::<T>::get().into_inner()
    }

    pub fn active_user_count() -> u32 {
      ActiveUsers::<T>::decode_len().unwrap_or(0) as u32
    }

    /// Encrypted parameters of `who`'s intent together with the public `active` flag
    pub fn my_params(who: &T::AccountId) -> Option<IntentParams> {
      Intents::<T>::get(who).map(|intent| IntentParams {
        budget_total: intent.budget_total,
        amount_per_interval: intent.amount_per_interval,
        spent_so_far: intent.spent_so_far,
        budget_exhausted: intent.budget_exhausted,
        active: intent.active,
      })
    }

    pub fn current_batch_info() -> CurrentBatchInfo {
      T::BatchStatus::current_batch_info()
    }

    pub fn batch_config() -> BatchConfig {
      T::BatchStatus::batch_config()
    }

    fn now() -> u64 {
      T::Time::now().as_secs()
    }

    fn ensure_submittable(
      who: &T::AccountId,
      interval_seconds: u64,
      total_periods: u32,
    ) -> DispatchResult {
      ensure!(
        !Reservations::<T>::contains_key(who),
        Error::<T>::IntentReserved
      );
      ensure!(
        interval_seconds >= T::MinIntervalSeconds::get(),
        Error::<T>::InvalidSchedule
      );
      ensure!(
        (1..=T::MaxTotalPeriods::get()).contains(&total_periods),
        Error::<T>::InvalidSchedule
      );
      Ok(())
    }

    fn store_intent(
      who: T::AccountId,
      budget_total: Handle,
      amount_per_interval: Handle,
      interval_seconds: u64,
      total_periods: u32,
      mode: IntentMode,
      dip: Option<DipCondition>,
    ) -> DispatchResult {
      let spent_so_far = T::Fhe::zero().map_err(Error::<T>::from)?;
      for handle in [&budget_total, &amount_per_interval, &spent_so_far] {
        T::Fhe::allow(handle, &who).map_err(Error::<T>::from)?;
      }

      ActiveUsers::<T>::try_mutate(|users| -> DispatchResult {
        if !users.contains(&who) {
          users
            .try_push(who.clone())
            .map_err(|_| Error::<T>::TooManyActiveUsers)?;
        }
        Ok(())
      })?;

      let replaced = Intents::<T>::contains_key(&who);
      Intents::<T>::insert(
        &who,
        Intent {
          budget_total,
          amount_per_interval,
          spent_so_far,
          interval_seconds,
          total_periods,
          periods_executed: 0,
          last_executed_at: None,
          submitted_at: Self::now(),
          mode,
          budget_exhausted: None,
          dip,
          active: true,
        },
      );

      if replaced {
        Self::deposit_event(Event::IntentUpdated {
          who,
          mode,
          interval_seconds,
          total_periods,
        });
      } else {
        Self::deposit_event(Event::IntentSubmitted {
          who,
          mode,
          interval_seconds,
          total_periods,
        });
      }
      Ok(())
    }

    fn remove_active(who: &T::AccountId) {
      ActiveUsers::<T>::mutate(|users| users.retain(|u| u != who));
    }

    fn complete(who: &T::AccountId) {
      Self::remove_active(who);
      Self::deposit_event(Event::IntentDeactivated {
        who: who.clone(),
        reason: DeactivationReason::Completed,
      });
    }

    /// Deactivate `who` if `flag` is still the intent's latest exhaustion flag and it was set
    fn settle_exhaustion_check(who: T::AccountId, flag: Handle, exhausted: bool) {
      let completed = Intents::<T>::mutate(&who, |maybe| match maybe {
        Some(intent) if intent.active && intent.budget_exhausted == Some(flag) && exhausted => {
          intent.active = false;
          true
        }
        _ => false,
      });
      if completed {
        Self::complete(&who);
        log::debug!(target: LOG_TARGET, "intent completed with its budget spent");
      }
    }

    fn next_due(intent: &Intent, spot_price: Option<u64>) -> Result<Handle, FheError> {
      let mut amount = intent.amount_per_interval;
      if let (Some(dip), Some(price)) = (intent.dip, spot_price) {
        let boosted = T::Fhe::scaled_share(
          &amount,
          dip.multiplier_bps as u128,
          BPS_DENOMINATOR as u128,
        )?;
        let price = T::Fhe::as_encrypted(price)?;
        let in_dip = T::Fhe::le(&price, &dip.trigger_price)?;
        amount = T::Fhe::select(&in_dip, &boosted, &amount)?;
      }
      let remaining = T::Fhe::sub(&intent.budget_total, &intent.spent_so_far)?;
      T::Fhe::min(&amount, &remaining)
    }
  }

  impl<T: Config> IntentLedger<T::AccountId> for Pallet<T> {
    fn active_users() -> Vec<T::AccountId> {
      Self::active_users()
    }

    fn active_user_count() -> u32 {
      Self::active_user_count()
    }

    fn is_eligible(who: &T::AccountId, now: u64) -> bool {
      if Reservations::<T>::contains_key(who) {
        return false;
      }
      match Intents::<T>::get(who) {
        Some(intent) if intent.active => intent
          .last_executed_at
          .map_or(true, |last| now >= last.saturating_add(intent.interval_seconds)),
        _ => false,
      }
    }

    fn reserve(who: &T::AccountId, batch_id: BatchId) -> DispatchResult {
      ensure!(
        Intents::<T>::contains_key(who),
        Error::<T>::IntentNotFound
      );
      ensure!(
        !Reservations::<T>::contains_key(who),
        Error::<T>::IntentReserved
      );
      Reservations::<T>::insert(who, batch_id);
      Ok(())
    }

    fn release(who: &T::AccountId, batch_id: BatchId) {
      if Reservations::<T>::get(who) == Some(batch_id) {
        Reservations::<T>::remove(who);
      }
    }

    fn due_amount(who: &T::AccountId, spot_price: Option<u64>) -> Result<Handle, DispatchError> {
      let intent = Intents::<T>::get(who).ok_or(Error::<T>::IntentNotFound)?;
      Ok(Self::next_due(&intent, spot_price).map_err(Error::<T>::from)?)
    }

    fn record_execution(
      who: &T::AccountId,
      batch_id: BatchId,
      contribution: &Handle,
      now: u64,
    ) -> Result<bool, DispatchError> {
      let mut intent = Intents::<T>::get(who).ok_or(Error::<T>::IntentNotFound)?;

      let spent = T::Fhe::add(&intent.spent_so_far, contribution).map_err(Error::<T>::from)?;
      let exhausted = T::Fhe::equals(&spent, &intent.budget_total).map_err(Error::<T>::from)?;
      T::Fhe::allow(&spent, who).map_err(Error::<T>::from)?;
      T::Fhe::allow(&exhausted, who).map_err(Error::<T>::from)?;

      intent.spent_so_far = spent;
      intent.budget_exhausted = Some(exhausted);
      intent.periods_executed = intent.periods_executed.saturating_add(1);
      intent.last_executed_at = Some(now);

      let completed = intent.periods_executed >= intent.total_periods;
      let deactivate = completed && intent.active;
      if deactivate {
        intent.active = false;
      } else if intent.active {
        let request_id = T::Oracle::request_decryption(&exhausted).map_err(Error::<T>::from)?;
        ExhaustionChecks::<T>::insert(request_id, (who.clone(), exhausted));
      }
      let periods_executed = intent.periods_executed;
      Intents::<T>::insert(who, intent);
      Self::release(who, batch_id);

      Self::deposit_event(Event::IntentExecuted {
        who: who.clone(),
        batch_id,
        periods_executed,
      });
      if deactivate {
        Self::complete(who);
        log::debug!(target: LOG_TARGET, "intent completed after {periods_executed} periods");
      }
      Ok(completed)
    }

    fn note_batch_executed(batch_id: BatchId, participants: u32, now: u64) {
      BatchesExecuted::<T>::mutate(|n| *n = n.saturating_add(1));
      Self::deposit_event(Event::BatchExecuted {
        batch_id,
        participants,
        executed_at: now,
      });
    }

    fn note_batch_timed_out(batch_id: BatchId, released: u32) {
      BatchesTimedOut::<T>::mutate(|n| *n = n.saturating_add(1));
      log::info!(target: LOG_TARGET, "batch {batch_id} timed out, {released} intents released");
      Self::deposit_event(Event::BatchTimeout { batch_id, released });
    }
  }

  impl<T: Config> OnDecryptionFulfilled for Pallet<T> {
    fn on_decryption_fulfilled(request_id: RequestId, value: u64) -> Result<bool, DispatchError> {
      match ExhaustionChecks::<T>::take(request_id) {
        Some((who, flag)) => {
          Self::settle_exhaustion_check(who, flag, value != 0);
          Ok(true)
        }
        None => Ok(false),
      }
    }
  }
}
