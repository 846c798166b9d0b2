//! Confidential Vault Pallet
//!
//! Encrypted per-user balances backed by plaintext custody of a single asset. The runtime
//! declares two instances: the funding vault (stable asset, users deposit) and the reward vault
//! (volatile asset, only the batch executor credits it).
//!
//! Balances move in three ways:
//! - owners deposit plaintext amounts and withdraw through the decryption oracle,
//! - the authorized executor debits and credits encrypted amounts,
//! - the executor releases plaintext custody for a decrypted aggregate.
//!
//! Withdrawals never branch on the hidden balance. The requested amount is replaced by zero when
//! it exceeds the balance, the result is debited, and the oracle reveals only how much actually
//! left the vault.

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
  /// Give `who` `amount` of `asset` outside the vault.
  fn fund(who: &AccountId, asset: primitives::AssetKind, amount: primitives::Balance);

  /// Produce a ciphertext input owned by `owner` and bound to `target`.
  fn encrypted_input(
    owner: &AccountId,
    value: u64,
    target: primitives::ContractTag,
  ) -> primitives::ExternalInput;
}

const LOG_TARGET: &str = "runtime::confidential-vault";

#[frame::pallet]
pub mod pallet {
  use super::{LOG_TARGET, WeightInfo};
  use alloc::vec::Vec;
  use frame::prelude::*;
  use polkadot_sdk::{frame_support::PalletId, sp_runtime::traits::AccountIdConversion};
  use primitives::{
    AssetKind, AssetOps, Balance, ConfidentialLedger, ContractTag, DecryptionOracle,
    EncryptedArithmetic, ExternalInput, FheError, Handle, OnDecryptionFulfilled, RequestId,
  };

  #[derive(
    Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
  )]
  pub struct PendingWithdrawal<AccountId> {
    pub who: AccountId,
    /// Encrypted amount actually debited (zero when the request exceeded the balance)
    pub amount: Handle,
  }

  #[pallet::config]
  pub trait Config<I: 'static = ()>: frame_system::Config {
    type Fhe: EncryptedArithmetic<Self::AccountId>;
    /// Gateway used to reveal withdrawal amounts
    type Oracle: DecryptionOracle;
    type AssetOps: AssetOps<Self::AccountId, AssetKind, Balance>;
    /// Asset held in custody
    #[pallet::constant]
    type VaultAsset: Get<AssetKind>;
    /// Custody account and input-binding tag
    #[pallet::constant]
    type PalletId: Get<PalletId>;
    /// Only account allowed to move balances on behalf of users
    type AuthorizedExecutor: Get<Self::AccountId>;
    #[pallet::constant]
    type AllowDeposits: Get<bool>;
    #[pallet::constant]
    type MaxBatchCredits: Get<u32>;
    type WeightInfo: WeightInfo;
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId>;
  }

  #[pallet::pallet]
  pub struct Pallet<T, I = ()>(PhantomData<(T, I)>);

  #[pallet::storage]
  pub type EncryptedBalances<T: Config<I>, I: 'static = ()> =
    StorageMap<_, Blake2_128Concat, T::AccountId, Handle, OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn total_deposited)]
  pub type TotalDeposited<T: Config<I>, I: 'static = ()> = StorageValue<_, Balance, ValueQuery>;

  #[pallet::storage]
  #[pallet::getter(fn total_withdrawn)]
  pub type TotalWithdrawn<T: Config<I>, I: 'static = ()> = StorageValue<_, Balance, ValueQuery>;

  /// Custody released to the executor for settlement
  #[pallet::storage]
  #[pallet::getter(fn total_released)]
  pub type TotalReleased<T: Config<I>, I: 'static = ()> = StorageValue<_, Balance, ValueQuery>;

  /// Custody received without a user deposit (swap output)
  #[pallet::storage]
  #[pallet::getter(fn total_inflow)]
  pub type TotalInflow<T: Config<I>, I: 'static = ()> = StorageValue<_, Balance, ValueQuery>;

  #[pallet::storage]
  #[pallet::getter(fn pending_withdrawals)]
  pub type PendingWithdrawals<T: Config<I>, I: 'static = ()> =
    StorageMap<_, Twox64Concat, RequestId, PendingWithdrawal<T::AccountId>, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config<I>, I: 'static = ()> {
    Deposited {
      who: T::AccountId,
      amount: Balance,
    },
    WithdrawalRequested {
      who: T::AccountId,
      request_id: RequestId,
    },
    Withdrawn {
      who: T::AccountId,
      amount: Balance,
    },
    /// Requested amount exceeded the encrypted balance, nothing left the vault
    WithdrawalRejected {
      who: T::AccountId,
      request_id: RequestId,
    },
    TransferredOut {
      to: T::AccountId,
      amount: Balance,
    },
    /// Encrypted amount added to `who`'s balance
    Credited { who: T::AccountId },
    Released {
      to: T::AccountId,
      amount: Balance,
    },
  }

  #[pallet::error]
  pub enum Error<T, I = ()> {
    /// This vault does not take user deposits
    DepositsDisabled,
    ZeroAmount,
    /// Caller is not the authorized executor
    Unauthorized,
    /// Encrypted input is not bound to this vault and the submitter
    InvalidCiphertext,
    /// Caller holds no balance in this vault
    NoBalance,
    /// Users and amounts differ in length
    LengthMismatch,
    /// Encrypted arithmetic backend rejected an operation
    ArithmeticFailure,
  }

  impl<T, I> From<FheError> for Error<T, I> {
    fn from(e: FheError) -> Self {
      match e {
        FheError::InvalidCiphertext => Error::InvalidCiphertext,
        _ => Error::ArithmeticFailure,
      }
    }
  }

  #[pallet::call]
  impl<T: Config<I>, I: 'static> Pallet<T, I> {
    /// Move `amount` of the vault asset into custody and credit it to the caller
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::deposit())]
    pub fn deposit(origin: OriginFor<T>, amount: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(T::AllowDeposits::get(), Error::<T, I>::DepositsDisabled);
      ensure!(amount > 0, Error::<T, I>::ZeroAmount);
      let encrypted_amount = u64::try_from(amount)
        .map_err(|_| Error::<T, I>::ArithmeticFailure)
        .and_then(|a| T::Fhe::as_encrypted(a).map_err(Error::<T, I>::from))?;

      T::AssetOps::transfer(&who, &Self::account_id(), T::VaultAsset::get(), amount)?;
      Self::add_to_balance(&who, &encrypted_amount)?;
      TotalDeposited::<T, I>::mutate(|total| *total = total.saturating_add(amount));

      Self::deposit_event(Event::Deposited { who, amount });
      Ok(())
    }

    /// Withdraw a plaintext amount; settled once the oracle reveals what was debited
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::withdraw())]
    pub fn withdraw(origin: OriginFor<T>, amount: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(amount > 0, Error::<T, I>::ZeroAmount);
      let amount = u64::try_from(amount).unwrap_or(u64::MAX);
      let requested = T::Fhe::as_encrypted(amount).map_err(Error::<T, I>::from)?;
      Self::request_withdrawal(who, requested)
    }

    /// Withdraw an encrypted amount bound to this vault and the caller
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::withdraw())]
    pub fn withdraw_encrypted(origin: OriginFor<T>, amount: ExternalInput) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let requested =
        T::Fhe::verify_input(&who, Self::contract_tag(), &amount).map_err(Error::<T, I>::from)?;
      Self::request_withdrawal(who, requested)
    }

    /// Move plaintext custody out of the vault
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::transfer_out())]
    pub fn transfer_out(origin: OriginFor<T>, to: T::AccountId, amount: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_executor(&who)?;
      ensure!(amount > 0, Error::<T, I>::ZeroAmount);

      T::AssetOps::transfer(&Self::account_id(), &to, T::VaultAsset::get(), amount)?;
      TotalReleased::<T, I>::mutate(|total| *total = total.saturating_add(amount));

      Self::deposit_event(Event::TransferredOut { to, amount });
      Ok(())
    }

    /// Credit encrypted amounts bound to `(caller, this vault)`
    ///
    /// Every input is verified before any balance changes.
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::credit_batch(users.len() as u32))]
    pub fn credit_batch(
      origin: OriginFor<T>,
      users: BoundedVec<T::AccountId, T::MaxBatchCredits>,
      amounts: BoundedVec<ExternalInput, T::MaxBatchCredits>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_executor(&who)?;
      <Self as ConfidentialLedger<T::AccountId>>::credit_batch(&who, &users, &amounts)
    }
  }

  impl<T: Config<I>, I: 'static> Pallet<T, I> {
    /// Custody account derived from the pallet id
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    pub fn contract_tag() -> ContractTag {
      T::PalletId::get().0
    }

    pub fn my_encrypted_balance(who: &T::AccountId) -> Option<Handle> {
      EncryptedBalances::<T, I>::get(who)
    }

    /// Plaintext custody currently held by the vault
    pub fn custody_balance() -> Balance {
      T::AssetOps::balance(&Self::account_id(), T::VaultAsset::get())
    }

    fn ensure_executor(who: &T::AccountId) -> DispatchResult {
      ensure!(
        *who == T::AuthorizedExecutor::get(),
        Error::<T, I>::Unauthorized
      );
      Ok(())
    }

    fn add_to_balance(who: &T::AccountId, amount: &Handle) -> Result<(), Error<T, I>> {
      let balance = match EncryptedBalances::<T, I>::get(who) {
        Some(current) => T::Fhe::add(&current, amount)?,
        None => T::Fhe::add(&T::Fhe::zero()?, amount)?,
      };
      T::Fhe::allow(&balance, who)?;
      EncryptedBalances::<T, I>::insert(who, balance);
      Ok(())
    }

    fn request_withdrawal(who: T::AccountId, requested: Handle) -> DispatchResult {
      let balance = EncryptedBalances::<T, I>::get(&who).ok_or(Error::<T, I>::NoBalance)?;

      let actual = (|| -> Result<Handle, FheError> {
        let fits = T::Fhe::le(&requested, &balance)?;
        let zero = T::Fhe::zero()?;
        let actual = T::Fhe::select(&fits, &requested, &zero)?;
        let remaining = T::Fhe::sub(&balance, &actual)?;
        T::Fhe::allow(&remaining, &who)?;
        EncryptedBalances::<T, I>::insert(&who, remaining);
        Ok(actual)
      })()
      .map_err(Error::<T, I>::from)?;

      let request_id = T::Oracle::request_decryption(&actual).map_err(Error::<T, I>::from)?;
      PendingWithdrawals::<T, I>::insert(
        request_id,
        PendingWithdrawal {
          who: who.clone(),
          amount: actual,
        },
      );

      Self::deposit_event(Event::WithdrawalRequested { who, request_id });
      Ok(())
    }

    fn settle_withdrawal(
      request_id: RequestId,
      pending: PendingWithdrawal<T::AccountId>,
      value: u64,
    ) -> DispatchResult {
      if value == 0 {
        log::debug!(target: LOG_TARGET, "withdrawal {request_id} rejected");
        Self::deposit_event(Event::WithdrawalRejected {
          who: pending.who,
          request_id,
        });
        return Ok(());
      }

      let amount = Balance::from(value);
      T::AssetOps::transfer(
        &Self::account_id(),
        &pending.who,
        T::VaultAsset::get(),
        amount,
      )?;
      TotalWithdrawn::<T, I>::mutate(|total| *total = total.saturating_add(amount));

      Self::deposit_event(Event::Withdrawn {
        who: pending.who,
        amount,
      });
      Ok(())
    }
  }

  impl<T: Config<I>, I: 'static> ConfidentialLedger<T::AccountId> for Pallet<T, I> {
    fn custody_account() -> T::AccountId {
      Self::account_id()
    }

    fn encrypted_balance(who: &T::AccountId) -> Option<Handle> {
      EncryptedBalances::<T, I>::get(who)
    }

    fn debit(who: &T::AccountId, amount: &Handle) -> DispatchResult {
      let balance = EncryptedBalances::<T, I>::get(who).ok_or(Error::<T, I>::NoBalance)?;
      let remaining = T::Fhe::sub(&balance, amount).map_err(Error::<T, I>::from)?;
      T::Fhe::allow(&remaining, who).map_err(Error::<T, I>::from)?;
      EncryptedBalances::<T, I>::insert(who, remaining);
      Ok(())
    }

    fn credit(who: &T::AccountId, amount: &Handle) -> DispatchResult {
      Self::add_to_balance(who, amount)?;
      Self::deposit_event(Event::Credited { who: who.clone() });
      Ok(())
    }

    fn verify_inputs(
      submitter: &T::AccountId,
      amounts: &[ExternalInput],
    ) -> Result<Vec<Handle>, DispatchError> {
      let tag = Self::contract_tag();
      let handles = amounts
        .iter()
        .map(|input| T::Fhe::verify_input(submitter, tag, input))
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::<T, I>::from)?;
      Ok(handles)
    }

    fn credit_batch(
      submitter: &T::AccountId,
      users: &[T::AccountId],
      amounts: &[ExternalInput],
    ) -> DispatchResult {
      ensure!(users.len() == amounts.len(), Error::<T, I>::LengthMismatch);

      let handles = Self::verify_inputs(submitter, amounts)?;
      for (who, amount) in users.iter().zip(handles.iter()) {
        Self::credit(who, amount)?;
      }
      Ok(())
    }

    fn release(to: &T::AccountId, amount: u128) -> DispatchResult {
      T::AssetOps::transfer(&Self::account_id(), to, T::VaultAsset::get(), amount)?;
      TotalReleased::<T, I>::mutate(|total| *total = total.saturating_add(amount));
      Self::deposit_event(Event::Released {
        to: to.clone(),
        amount,
      });
      Ok(())
    }

    fn note_inflow(amount: u128) {
      TotalInflow::<T, I>::mutate(|total| *total = total.saturating_add(amount));
    }
  }

  impl<T: Config<I>, I: 'static> OnDecryptionFulfilled for Pallet<T, I> {
    fn on_decryption_fulfilled(request_id: RequestId, value: u64) -> Result<bool, DispatchError> {
      match PendingWithdrawals::<T, I>::take(request_id) {
        Some(pending) => {
          Self::settle_withdrawal(request_id, pending, value)?;
          Ok(true)
        }
        None => Ok(false),
      }
    }
  }

  /// Genesis configuration: keeps the custody account alive without a native balance
  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config<I>, I: 'static = ()> {
    #[serde(skip)]
    pub _marker: core::marker::PhantomData<(T, I)>,
  }

  #[pallet::genesis_build]
  impl<T: Config<I>, I: 'static> BuildGenesisConfig for GenesisConfig<T, I> {
    fn build(&self) {
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T, I>::account_id());
    }
  }
}
