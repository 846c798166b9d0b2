#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn execute_batch(n: u32) -> Weight;
	fn finalize_batch_execution(n: u32) -> Weight;
	fn force_batch_execution(n: u32) -> Weight;
	fn credit_allocations(n: u32) -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	// Per candidate: eligibility, funding balance, due amount, escrow debit, reservation.
	fn execute_batch(n: u32) -> Weight {
		Weight::from_parts(45_000_000, 5000)
			.saturating_add(Weight::from_parts(68_000_000, 3200).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads(6))
			.saturating_add(T::DbWeight::get().writes(6))
			.saturating_add(T::DbWeight::get().reads((9_u64).saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes((8_u64).saturating_mul(n.into())))
	}
	// Release, swap and remainder credit, then one share credit and one execution record per participant.
	fn finalize_batch_execution(n: u32) -> Weight {
		Weight::from_parts(120_000_000, 9000)
			.saturating_add(Weight::from_parts(54_000_000, 3000).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads(12))
			.saturating_add(T::DbWeight::get().writes(12))
			.saturating_add(T::DbWeight::get().reads((5_u64).saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes((7_u64).saturating_mul(n.into())))
	}
	fn force_batch_execution(n: u32) -> Weight {
		Weight::from_parts(30_000_000, 4000)
			.saturating_add(Weight::from_parts(24_000_000, 2500).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads(3))
			.saturating_add(T::DbWeight::get().writes(5))
			.saturating_add(T::DbWeight::get().reads((2_u64).saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes((3_u64).saturating_mul(n.into())))
	}
	fn credit_allocations(n: u32) -> Weight {
		Weight::from_parts(20_000_000, 3000)
			.saturating_add(Weight::from_parts(24_000_000, 2000).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().reads((3_u64).saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes((4_u64).saturating_mul(n.into())))
	}
}

impl WeightInfo for () {
	fn execute_batch(n: u32) -> Weight {
		Weight::from_parts(45_000_000, 5000)
			.saturating_add(Weight::from_parts(68_000_000, 3200).saturating_mul(n.into()))
	}
	fn finalize_batch_execution(n: u32) -> Weight {
		Weight::from_parts(120_000_000, 9000)
			.saturating_add(Weight::from_parts(54_000_000, 3000).saturating_mul(n.into()))
	}
	fn force_batch_execution(n: u32) -> Weight {
		Weight::from_parts(30_000_000, 4000)
			.saturating_add(Weight::from_parts(24_000_000, 2500).saturating_mul(n.into()))
	}
	fn credit_allocations(n: u32) -> Weight {
		Weight::from_parts(20_000_000, 3000)
			.saturating_add(Weight::from_parts(24_000_000, 2000).saturating_mul(n.into()))
	}
}
