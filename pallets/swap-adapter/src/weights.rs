#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn swap_usdc_for_eth() -> Weight;
}

/// Venue costs are not benchmarked here; the runtime's DEX weight is added on top.
pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn swap_usdc_for_eth() -> Weight {
		Weight::from_parts(70_000_000, 7000)
			.saturating_add(T::DbWeight::get().reads(6))
			.saturating_add(T::DbWeight::get().writes(6))
	}
}

impl WeightInfo for () {
	fn swap_usdc_for_eth() -> Weight {
		Weight::from_parts(70_000_000, 7000)
	}
}
