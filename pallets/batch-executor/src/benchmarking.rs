use crate::*;
use alloc::vec::Vec;
use polkadot_sdk::frame_benchmarking::{account, v2::*, whitelisted_caller};
use polkadot_sdk::frame_support::{
  BoundedVec,
  traits::{EnsureOrigin, Get},
};
use polkadot_sdk::frame_system::RawOrigin;
use primitives::BatchId;

fn subscribed<T: Config>(n: u32) -> Vec<T::AccountId> {
  (0..n)
    .map(|i| {
      let who: T::AccountId = account("user", i, 0);
      T::BenchmarkHelper::subscribe(&who);
      who
    })
    .collect()
}

/// Open a batch of `n` participants and let the oracle answer it
fn revealed_batch<T: Config>(n: u32) -> Result<BatchId, BenchmarkError> {
  let batch_id = Pallet::<T>::open_batch(subscribed::<T>(n), T::MinBatchUsers::get())
    .map_err(|_| BenchmarkError::Stop("batch did not open"))?;
  let request_id = Batches::<T>::get(batch_id)
    .and_then(|b| b.request_id)
    .ok_or(BenchmarkError::Stop("no decryption request"))?;
  T::BenchmarkHelper::reveal(request_id);
  Ok(batch_id)
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn execute_batch(n: Linear<{ T::MinBatchUsers::get() }, { T::MaxBatchSize::get() }>) {
    let users = subscribed::<T>(n);
    let caller: T::AccountId = whitelisted_caller();

    #[extrinsic_call]
    execute_batch(RawOrigin::Signed(caller), users);

    assert_eq!(
      Batches::<T>::get(0).map(|b| b.participants.len() as u32),
      Some(n)
    );
  }

  #[benchmark]
  fn finalize_batch_execution(
    n: Linear<{ T::MinBatchUsers::get() }, { T::MaxBatchSize::get() }>,
  ) -> Result<(), BenchmarkError> {
    let batch_id = revealed_batch::<T>(n)?;
    let origin =
      T::FinalizeOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

    #[extrinsic_call]
    finalize_batch_execution(origin as T::RuntimeOrigin, batch_id, 0, None);

    assert_eq!(
      Batches::<T>::get(batch_id).map(|b| b.state),
      Some(BatchState::Finalized)
    );
    Ok(())
  }

  #[benchmark]
  fn force_batch_execution(
    n: Linear<{ T::MinBatchUsers::get() }, { T::MaxBatchSize::get() }>,
  ) -> Result<(), BenchmarkError> {
    let batch_id = Pallet::<T>::open_batch(subscribed::<T>(n), T::MinBatchUsers::get())
      .map_err(|_| BenchmarkError::Stop("batch did not open"))?;
    let deadline = Batches::<T>::get(batch_id)
      .map(|b| b.deadline)
      .ok_or(BenchmarkError::Stop("batch missing"))?;
    T::BenchmarkHelper::set_time(deadline);
    let caller: T::AccountId = whitelisted_caller();

    #[extrinsic_call]
    force_batch_execution(RawOrigin::Signed(caller), batch_id);

    assert_eq!(
      Batches::<T>::get(batch_id).map(|b| b.state),
      Some(BatchState::TimedOut)
    );
    Ok(())
  }

  #[benchmark]
  fn credit_allocations(
    n: Linear<{ T::MinBatchUsers::get() }, { T::MaxBatchSize::get() }>,
  ) -> Result<(), BenchmarkError> {
    let batch_id = revealed_batch::<T>(n)?;
    let origin =
      T::FinalizeOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let operator = T::FinalizeOrigin::ensure_origin(origin.clone())
      .map_err(|_| BenchmarkError::Weightless)?;
    Pallet::<T>::do_finalize(batch_id, 0, T::DefaultPoolFee::get())
      .map_err(|_| BenchmarkError::Stop("finalize failed"))?;
    // Hold the output the way `OperatorAllocations` does
    let mut batch = Batches::<T>::get(batch_id).ok_or(BenchmarkError::Stop("batch missing"))?;
    batch.allocations_pending = true;
    let users = batch.participants.clone();
    Batches::<T>::insert(batch_id, batch);
    let allocations = BoundedVec::truncate_from(
      (0..n)
        .map(|_| T::BenchmarkHelper::allocation_input(&operator, 1))
        .collect(),
    );

    #[extrinsic_call]
    credit_allocations(origin as T::RuntimeOrigin, batch_id, users, allocations);

    assert_eq!(
      Batches::<T>::get(batch_id).map(|b| b.allocations_pending),
      Some(false)
    );
    Ok(())
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
