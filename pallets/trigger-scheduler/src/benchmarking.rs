use crate::*;
use alloc::vec::Vec;
use polkadot_sdk::frame_benchmarking::{v2::*, whitelisted_caller};
use polkadot_sdk::frame_support::traits::{EnsureOrigin, Get};
use polkadot_sdk::frame_system::RawOrigin;

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn perform_upkeep() {
    let due_at = LastExecutionTime::<T>::get().saturating_add(ExecutionInterval::<T>::get());
    T::BenchmarkHelper::prepare_upkeep(T::MinActiveUsers::get().max(1), due_at);
    let caller: T::AccountId = whitelisted_caller();

    #[extrinsic_call]
    perform_upkeep(RawOrigin::Signed(caller), Vec::new());

    assert!(LastUpkeepBatch::<T>::get().is_some());
  }

  #[benchmark]
  fn set_execution_interval() -> Result<(), BenchmarkError> {
    let origin =
      T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

    #[extrinsic_call]
    set_execution_interval(origin as T::RuntimeOrigin, 7_200);

    assert_eq!(ExecutionInterval::<T>::get(), 7_200);
    Ok(())
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
