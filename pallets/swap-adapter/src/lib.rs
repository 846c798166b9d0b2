//! Swap Adapter Pallet
//!
//! Converts the stable asset into the volatile asset through an external venue. The adapter
//! keeps no state: funds are pulled into the adapter account, swapped and paid to the recipient
//! within a single call.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
  /// Give `who` `amount` of the stable asset and let the venue fill a swap of that size.
  fn fund_swap(who: &AccountId, amount: primitives::Balance);
}

const LOG_TARGET: &str = "runtime::swap-adapter";

#[frame::pallet]
pub mod pallet {
  use super::{LOG_TARGET, WeightInfo};
  use frame::prelude::*;
  use polkadot_sdk::{frame_support::PalletId, sp_runtime::traits::AccountIdConversion};
  use primitives::{
    AssetInspector, AssetKind, AssetOps, Balance, BatchId, DexOps, SwapAdapter,
    params::SUPPORTED_POOL_FEES,
  };

  #[pallet::config]
  pub trait Config: frame_system::Config {
    type AssetOps: AssetOps<Self::AccountId, AssetKind, Balance>;
    /// External swap venue
    type Dex: DexOps<Self::AccountId, AssetKind, Balance>;
    /// Asset sold (funding side)
    #[pallet::constant]
    type StableAsset: Get<AssetKind>;
    /// Asset bought (reward side)
    #[pallet::constant]
    type VolatileAsset: Get<AssetKind>;
    /// Pass-through account
    #[pallet::constant]
    type PalletId: Get<PalletId>;
    /// Fee tier used for spot price quotes
    #[pallet::constant]
    type DefaultPoolFee: Get<u32>;
    /// Volatile units priced by `spot_price`
    #[pallet::constant]
    type PriceQuoteUnit: Get<Balance>;
    type WeightInfo: WeightInfo;
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId>;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    Swapped {
      who: T::AccountId,
      recipient: T::AccountId,
      amount_in: Balance,
      amount_out: Balance,
      pool_fee: u32,
    },
    /// Aggregate swap performed on behalf of a batch
    BatchSwapExecuted {
      batch_id: BatchId,
      amount_in: Balance,
      amount_out: Balance,
      recipient: T::AccountId,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Fee tier is not one of the supported pools
    InvalidPoolFee,
    ZeroAmount,
    /// Output below the requested minimum
    SlippageExceeded,
  }

  #[pallet::hooks]
  impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
    fn integrity_test() {
      assert!(
        T::StableAsset::get().is_stable(),
        "StableAsset must carry the stable class"
      );
      assert!(
        T::VolatileAsset::get().is_volatile(),
        "VolatileAsset must carry the volatile class"
      );
      assert!(
        SUPPORTED_POOL_FEES.contains(&T::DefaultPoolFee::get()),
        "DefaultPoolFee must be a supported tier"
      );
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Sell exactly `amount_in` of the stable asset and pay the output to `recipient`
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::swap_usdc_for_eth())]
    pub fn swap_usdc_for_eth(
      origin: OriginFor<T>,
      amount_in: Balance,
      min_amount_out: Balance,
      recipient: T::AccountId,
      pool_fee: u32,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let amount_out = Self::do_swap(&who, amount_in, min_amount_out, &recipient, pool_fee)?;

      Self::deposit_event(Event::Swapped {
        who,
        recipient,
        amount_in,
        amount_out,
        pool_fee,
      });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    /// Output the venue currently quotes for `amount_in`
    pub fn quote(amount_in: Balance, pool_fee: u32) -> Option<Balance> {
      T::Dex::get_quote(
        T::StableAsset::get(),
        T::VolatileAsset::get(),
        amount_in,
        pool_fee,
      )
    }

    fn do_swap(
      from: &T::AccountId,
      amount_in: Balance,
      min_out: Balance,
      recipient: &T::AccountId,
      pool_fee: u32,
    ) -> Result<Balance, DispatchError> {
      ensure!(amount_in > 0, Error::<T>::ZeroAmount);
      ensure!(
        SUPPORTED_POOL_FEES.contains(&pool_fee),
        Error::<T>::InvalidPoolFee
      );
      if let Some(quoted) = Self::quote(amount_in, pool_fee) {
        ensure!(quoted >= min_out, Error::<T>::SlippageExceeded);
      }

      let adapter = Self::account_id();
      let (stable, volatile) = (T::StableAsset::get(), T::VolatileAsset::get());

      T::AssetOps::transfer(from, &adapter, stable, amount_in)?;
      let amount_out = T::Dex::swap_exact_in(&adapter, stable, volatile, amount_in, min_out, pool_fee)?;
      ensure!(amount_out >= min_out, Error::<T>::SlippageExceeded);
      T::AssetOps::transfer(&adapter, recipient, volatile, amount_out)?;

      log::debug!(target: LOG_TARGET, "swapped {amount_in} for {amount_out} at fee tier {pool_fee}");
      Ok(amount_out)
    }
  }

  impl<T: Config> SwapAdapter<T::AccountId> for Pallet<T> {
    fn execute_batch_swap(
      batch_id: BatchId,
      from: &T::AccountId,
      amount_in: u128,
      min_out: u128,
      recipient: &T::AccountId,
      pool_fee: u32,
    ) -> Result<u128, DispatchError> {
      let amount_out = Self::do_swap(from, amount_in, min_out, recipient, pool_fee)?;
      Self::deposit_event(Event::BatchSwapExecuted {
        batch_id,
        amount_in,
        amount_out,
        recipient: recipient.clone(),
      });
      Ok(amount_out)
    }

    fn spot_price() -> Option<u64> {
      T::Dex::get_quote(
        T::VolatileAsset::get(),
        T::StableAsset::get(),
        T::PriceQuoteUnit::get(),
        T::DefaultPoolFee::get(),
      )
      .map(|price| u64::try_from(price).unwrap_or(u64::MAX))
    }
  }
}
