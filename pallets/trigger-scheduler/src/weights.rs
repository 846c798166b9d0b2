#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn perform_upkeep() -> Weight;
	fn set_execution_interval() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	// Opening the batch itself is charged at the executor's worst case.
	fn perform_upkeep() -> Weight {
		Weight::from_parts(1_150_000_000, 60000)
			.saturating_add(T::DbWeight::get().reads(150))
			.saturating_add(T::DbWeight::get().writes(140))
	}
	fn set_execution_interval() -> Weight {
		Weight::from_parts(9_000_000, 0)
			.saturating_add(T::DbWeight::get().writes(1))
	}
}

impl WeightInfo for () {
	fn perform_upkeep() -> Weight {
		Weight::from_parts(1_150_000_000, 60000)
	}
	fn set_execution_interval() -> Weight {
		Weight::from_parts(9_000_000, 0)
	}
}
