//! Trigger Scheduler Pallet
//!
//! Keeper-style fallback for opening batches on a timer. `check_upkeep` reports whether the
//! execution interval has elapsed and enough intents are active; `perform_upkeep` re-checks and
//! asks the executor to open a batch over the current roster with the scheduler's own, lower,
//! participant threshold. With `AutoUpkeep` set the same happens from `on_initialize`.

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
pub trait BenchmarkHelper {
  /// Make `count` intents active and move the clock to at least `now` (unix seconds).
  fn prepare_upkeep(count: u32, now: u64);
}

const LOG_TARGET: &str = "runtime::trigger-scheduler";

#[frame::pallet]
pub mod pallet {
  use super::{LOG_TARGET, WeightInfo};
  use alloc::vec::Vec;
  use frame::prelude::*;
  use polkadot_sdk::frame_support::{
    storage::with_storage_layer,
    traits::{EnsureOrigin, UnixTime},
  };
  use primitives::{BatchId, BatchTrigger, IntentLedger, params::EXECUTION_INTERVAL_SECS};

  #[pallet::config]
  pub trait Config: frame_system::Config {
    type Intents: IntentLedger<Self::AccountId>;
    type Trigger: BatchTrigger<Self::AccountId>;
    type Time: UnixTime;
    /// Origin allowed to change the execution interval
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;
    /// Active intents required before a timed batch is attempted
    #[pallet::constant]
    type MinActiveUsers: Get<u32>;
    /// Run upkeep from `on_initialize` instead of waiting for a keeper
    #[pallet::constant]
    type AutoUpkeep: Get<bool>;
    type WeightInfo: WeightInfo;
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::type_value]
  pub fn DefaultExecutionInterval() -> u64 {
    EXECUTION_INTERVAL_SECS
  }

  /// Unix seconds of the last successful upkeep
  #[pallet::storage]
  #[pallet::getter(fn last_execution_time)]
  pub type LastExecutionTime<T> = StorageValue<_, u64, ValueQuery>;

  #[pallet::storage]
  #[pallet::getter(fn execution_interval)]
  pub type ExecutionInterval<T> = StorageValue<_, u64, ValueQuery, DefaultExecutionInterval>;

  #[pallet::storage]
  #[pallet::getter(fn last_upkeep_batch)]
  pub type LastUpkeepBatch<T> = StorageValue<_, BatchId, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    UpkeepPerformed {
      batch_id: BatchId,
      candidates: u32,
      at: u64,
    },
    ExecutionIntervalUpdated {
      interval: u64,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Interval has not elapsed or too few intents are active
    UpkeepNotNeeded,
    InvalidInterval,
  }

  #[pallet::hooks]
  impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
    fn on_initialize(_n: BlockNumberFor<T>) -> Weight {
      if !T::AutoUpkeep::get() {
        return Weight::zero();
      }
      let check_weight = T::DbWeight::get().reads(3);
      if !Self::upkeep_needed() {
        return check_weight;
      }
      if let Err(e) = with_storage_layer(Self::do_perform_upkeep) {
        log::warn!(target: LOG_TARGET, "automatic upkeep failed: {e:?}");
      }
      check_weight.saturating_add(T::WeightInfo::perform_upkeep())
    }
  }

  #[pallet::genesis_config]
  pub struct GenesisConfig<T: Config> {
    pub execution_interval: u64,
    #[serde(skip)]
    pub _marker: core::marker::PhantomData<T>,
  }

  impl<T: Config> Default for GenesisConfig<T> {
    fn default() -> Self {
      Self {
        execution_interval: EXECUTION_INTERVAL_SECS,
        _marker: Default::default(),
      }
    }
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      assert!(
        self.execution_interval > 0,
        "execution interval must be positive"
      );
      ExecutionInterval::<T>::put(self.execution_interval);
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Open a timed batch over the active roster
    ///
    /// `perform_data` is accepted for keeper compatibility; the roster is always read fresh.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::perform_upkeep())]
    pub fn perform_upkeep(origin: OriginFor<T>, _perform_data: Vec<u8>) -> DispatchResult {
      ensure_signed(origin)?;
      ensure!(Self::upkeep_needed(), Error::<T>::UpkeepNotNeeded);
      Self::do_perform_upkeep()
    }

    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::set_execution_interval())]
    pub fn set_execution_interval(origin: OriginFor<T>, interval: u64) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      ensure!(interval > 0, Error::<T>::InvalidInterval);
      ExecutionInterval::<T>::put(interval);
      Self::deposit_event(Event::ExecutionIntervalUpdated { interval });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Whether a timed batch is due, with the roster snapshot a keeper would pass back
    pub fn check_upkeep(_check_data: &[u8]) -> (bool, Vec<u8>) {
      if !Self::upkeep_needed() {
        return (false, Vec::new());
      }
      (true, T::Intents::active_users().encode())
    }

    fn now() -> u64 {
      T::Time::now().as_secs()
    }

    fn upkeep_needed() -> bool {
      let elapsed = Self::now().saturating_sub(LastExecutionTime::<T>::get());
      elapsed >= ExecutionInterval::<T>::get()
        && T::Intents::active_user_count() >= T::MinActiveUsers::get()
    }

    fn do_perform_upkeep() -> DispatchResult {
      let now = Self::now();
      let candidates = T::Intents::active_users();
      let count = candidates.len() as u32;
      let batch_id = T::Trigger::trigger_batch(candidates, T::MinActiveUsers::get())?;

      LastExecutionTime::<T>::put(now);
      LastUpkeepBatch::<T>::put(batch_id);
      log::info!(target: LOG_TARGET, "upkeep opened batch {batch_id} from {count} candidates");
      Self::deposit_event(Event::UpkeepPerformed {
        batch_id,
        candidates: count,
        at: now,
      });
      Ok(())
    }
  }
}
