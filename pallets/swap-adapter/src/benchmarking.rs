use crate::*;
use polkadot_sdk::frame_benchmarking::{account, v2::*, whitelisted_caller};
use polkadot_sdk::frame_support::traits::Get;
use polkadot_sdk::frame_system::RawOrigin;
use primitives::{AssetOps, Balance};

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn swap_usdc_for_eth() {
    let caller: T::AccountId = whitelisted_caller();
    let recipient: T::AccountId = account("recipient", 0, 0);
    let amount: Balance = 1_000_000;
    T::BenchmarkHelper::fund_swap(&caller, amount);

    #[extrinsic_call]
    swap_usdc_for_eth(
      RawOrigin::Signed(caller),
      amount,
      0,
      recipient.clone(),
      T::DefaultPoolFee::get(),
    );

    assert!(T::AssetOps::balance(&recipient, T::VolatileAsset::get()) > 0);
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
