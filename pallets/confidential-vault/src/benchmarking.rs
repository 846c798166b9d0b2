use crate::*;
use alloc::vec::Vec;
use polkadot_sdk::frame_benchmarking::{account, v2::*, whitelisted_caller};
use polkadot_sdk::frame_support::{BoundedVec, traits::Get};
use polkadot_sdk::frame_system::RawOrigin;
use primitives::{ConfidentialLedger, EncryptedArithmetic};

/// Credit `amount` straight to `who`, bypassing deposits.
fn seed_balance<T: Config<I>, I: 'static>(
  who: &T::AccountId,
  amount: u64,
) -> Result<(), BenchmarkError> {
  let handle =
    T::Fhe::as_encrypted(amount).map_err(|_| BenchmarkError::Stop("encryption failed"))?;
  Pallet::<T, I>::credit(who, &handle).map_err(|_| BenchmarkError::Stop("credit failed"))
}

#[instance_benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn deposit() -> Result<(), BenchmarkError> {
    if !T::AllowDeposits::get() {
      return Err(BenchmarkError::Weightless);
    }
    let caller: T::AccountId = whitelisted_caller();
    T::BenchmarkHelper::fund(&caller, T::VaultAsset::get(), 10_000);
    // Top up an existing balance rather than creating one
    seed_balance::<T, I>(&caller, 1_000)?;

    #[extrinsic_call]
    deposit(RawOrigin::Signed(caller), 5_000);

    assert_eq!(TotalDeposited::<T, I>::get(), 5_000);
    Ok(())
  }

  #[benchmark]
  fn withdraw() -> Result<(), BenchmarkError> {
    let caller: T::AccountId = whitelisted_caller();
    seed_balance::<T, I>(&caller, 1_000)?;

    #[extrinsic_call]
    withdraw(RawOrigin::Signed(caller), 500);

    assert_eq!(PendingWithdrawals::<T, I>::iter().count(), 1);
    Ok(())
  }

  #[benchmark]
  fn transfer_out() {
    let executor = T::AuthorizedExecutor::get();
    let recipient: T::AccountId = account("recipient", 0, 0);
    T::BenchmarkHelper::fund(&Pallet::<T, I>::account_id(), T::VaultAsset::get(), 10_000);

    #[extrinsic_call]
    transfer_out(RawOrigin::Signed(executor), recipient, 5_000);

    assert_eq!(TotalReleased::<T, I>::get(), 5_000);
  }

  #[benchmark]
  fn credit_batch(n: Linear<1, { T::MaxBatchCredits::get() }>) {
    let executor = T::AuthorizedExecutor::get();
    let tag = Pallet::<T, I>::contract_tag();
    let users: Vec<T::AccountId> = (0..n).map(|i| account("user", i, 0)).collect();
    let amounts: Vec<_> = (0..n)
      .map(|_| T::BenchmarkHelper::encrypted_input(&executor, 100, tag))
      .collect();
    let users = BoundedVec::<_, T::MaxBatchCredits>::truncate_from(users);
    let amounts = BoundedVec::<_, T::MaxBatchCredits>::truncate_from(amounts);

    #[extrinsic_call]
    credit_batch(RawOrigin::Signed(executor), users.clone(), amounts);

    assert!(users.iter().all(|who| EncryptedBalances::<T, I>::contains_key(who)));
  }

  #[cfg(test)]
  use crate::mock::{FundingVault, Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(FundingVault, new_test_ext(), Test);
}
