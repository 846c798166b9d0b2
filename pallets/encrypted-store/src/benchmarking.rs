use crate::*;
use polkadot_sdk::frame_benchmarking::{v2::*, whitelisted_caller};
use polkadot_sdk::frame_support::traits::EnsureOrigin;
use polkadot_sdk::frame_system::RawOrigin;
use primitives::{DecryptionOracle, EncryptedArithmetic};

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn encrypt_input() {
    let caller: T::AccountId = whitelisted_caller();

    #[extrinsic_call]
    encrypt_input(RawOrigin::Signed(caller), 1_000u64, *b"dcaintnt");

    assert_eq!(HandleNonce::<T>::get(), 1);
  }

  #[benchmark]
  fn fulfill_decryption() -> Result<(), BenchmarkError> {
    let origin =
      T::OracleOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let handle = Pallet::<T>::as_encrypted(250_000)
      .map_err(|_| BenchmarkError::Stop("encryption failed"))?;
    let request_id = Pallet::<T>::request_decryption(&handle)
      .map_err(|_| BenchmarkError::Stop("request failed"))?;

    #[extrinsic_call]
    fulfill_decryption(origin as T::RuntimeOrigin, request_id);

    assert!(DecryptionRequests::<T>::get(request_id).is_none());
    Ok(())
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
