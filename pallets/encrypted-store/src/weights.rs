#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn encrypt_input() -> Weight;
	fn fulfill_decryption() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn encrypt_input() -> Weight {
		Weight::from_parts(18_000_000, 1500)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(4))
	}
	// Consumer callbacks (batch settlement, vault withdrawals) are accounted here.
	fn fulfill_decryption() -> Weight {
		Weight::from_parts(60_000_000, 6000)
			.saturating_add(T::DbWeight::get().reads(8))
			.saturating_add(T::DbWeight::get().writes(6))
	}
}

impl WeightInfo for () {
	fn encrypt_input() -> Weight {
		Weight::from_parts(18_000_000, 1500)
	}
	fn fulfill_decryption() -> Weight {
		Weight::from_parts(60_000_000, 6000)
	}
}
