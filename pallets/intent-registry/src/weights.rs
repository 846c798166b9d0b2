#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn submit_intent() -> Weight;
	fn submit_test_intent() -> Weight;
	fn deactivate_intent() -> Weight;
}

/// Submission and deactivation scan the active index, so both scale with `MaxActiveUsers`.
pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config + crate::Config> WeightInfo for SubstrateWeight<T> {
	fn submit_intent() -> Weight {
		let scan = u64::from(T::MaxActiveUsers::get());
		Weight::from_parts(45_000_000, 4000)
			.saturating_add(Weight::from_parts(40_000, 32).saturating_mul(scan))
			.saturating_add(T::DbWeight::get().reads(8))
			.saturating_add(T::DbWeight::get().writes(9))
	}
	fn submit_test_intent() -> Weight {
		let scan = u64::from(T::MaxActiveUsers::get());
		Weight::from_parts(35_000_000, 3500)
			.saturating_add(Weight::from_parts(40_000, 32).saturating_mul(scan))
			.saturating_add(T::DbWeight::get().reads(5))
			.saturating_add(T::DbWeight::get().writes(9))
	}
	fn deactivate_intent() -> Weight {
		let scan = u64::from(T::MaxActiveUsers::get());
		Weight::from_parts(20_000_000, 2500)
			.saturating_add(Weight::from_parts(40_000, 32).saturating_mul(scan))
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(2))
	}
}

impl WeightInfo for () {
	fn submit_intent() -> Weight {
		Weight::from_parts(45_000_000, 4000)
	}
	fn submit_test_intent() -> Weight {
		Weight::from_parts(35_000_000, 3500)
	}
	fn deactivate_intent() -> Weight {
		Weight::from_parts(20_000_000, 2500)
	}
}
