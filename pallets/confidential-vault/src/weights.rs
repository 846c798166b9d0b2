#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn deposit() -> Weight;
	fn withdraw() -> Weight;
	fn transfer_out() -> Weight;
	fn credit_batch(n: u32) -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn deposit() -> Weight {
		Weight::from_parts(40_000_000, 3500)
			.saturating_add(T::DbWeight::get().reads(4))
			.saturating_add(T::DbWeight::get().writes(6))
	}
	fn withdraw() -> Weight {
		Weight::from_parts(55_000_000, 4000)
			.saturating_add(T::DbWeight::get().reads(7))
			.saturating_add(T::DbWeight::get().writes(10))
	}
	fn transfer_out() -> Weight {
		Weight::from_parts(25_000_000, 2500)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(3))
	}
	fn credit_batch(n: u32) -> Weight {
		Weight::from_parts(10_000_000, 1000)
			.saturating_add(Weight::from_parts(22_000_000, 2000).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads((3_u64).saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes((4_u64).saturating_mul(n.into())))
	}
}

impl WeightInfo for () {
	fn deposit() -> Weight {
		Weight::from_parts(40_000_000, 3500)
	}
	fn withdraw() -> Weight {
		Weight::from_parts(55_000_000, 4000)
	}
	fn transfer_out() -> Weight {
		Weight::from_parts(25_000_000, 2500)
	}
	fn credit_batch(n: u32) -> Weight {
		Weight::from_parts(10_000_000, 1000)
			.saturating_add(Weight::from_parts(22_000_000, 2000).saturating_mul(n.into()))
	}
}
