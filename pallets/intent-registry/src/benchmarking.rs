use crate::*;
use polkadot_sdk::frame_benchmarking::{account, v2::*, whitelisted_caller};
use polkadot_sdk::frame_support::traits::Get;
use polkadot_sdk::frame_system::RawOrigin;

/// Fill the active index up to one free slot so submission pays the full scan.
fn fill_active_users<T: Config>() {
  let max = T::MaxActiveUsers::get().saturating_sub(1);
  for i in 0..max {
    let who: T::AccountId = account("user", i, 0);
    let _ = Pallet::<T>::submit_test_intent(RawOrigin::Signed(who).into(), 1_000, 100, 86_400, 10);
  }
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn submit_intent() {
    fill_active_users::<T>();
    let caller: T::AccountId = whitelisted_caller();
    let tag = Pallet::<T>::contract_tag();
    let budget = T::BenchmarkHelper::encrypted_input(&caller, 1_000, tag);
    let amount = T::BenchmarkHelper::encrypted_input(&caller, 100, tag);
    let dip = DipInput {
      trigger_price: T::BenchmarkHelper::encrypted_input(&caller, 2_000, tag),
      multiplier_bps: 15_000,
    };

    #[extrinsic_call]
    submit_intent(
      RawOrigin::Signed(caller.clone()),
      budget,
      amount,
      86_400,
      10,
      Some(dip),
    );

    assert!(Intents::<T>::get(&caller).is_some_and(|i| i.active));
  }

  #[benchmark]
  fn submit_test_intent() {
    fill_active_users::<T>();
    let caller: T::AccountId = whitelisted_caller();

    #[extrinsic_call]
    submit_test_intent(RawOrigin::Signed(caller.clone()), 1_000, 100, 86_400, 10);

    assert!(Intents::<T>::contains_key(&caller));
  }

  #[benchmark]
  fn deactivate_intent() {
    fill_active_users::<T>();
    let caller: T::AccountId = whitelisted_caller();
    let tag = Pallet::<T>::contract_tag();
    let budget = T::BenchmarkHelper::encrypted_input(&caller, 1_000, tag);
    let amount = T::BenchmarkHelper::encrypted_input(&caller, 100, tag);
    let _ = Pallet::<T>::submit_intent(
      RawOrigin::Signed(caller.clone()).into(),
      budget,
      amount,
      86_400,
      10,
      None,
    );

    #[extrinsic_call]
    deactivate_intent(RawOrigin::Signed(caller.clone()));

    assert!(Intents::<T>::get(&caller).is_some_and(|i| !i.active));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
