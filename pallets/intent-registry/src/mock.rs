use crate as pallet_intent_registry;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl, parameter_types,
  traits::{ConstU32, ConstU64},
};
use polkadot_sdk::frame_system::{self, EnsureRoot};
use polkadot_sdk::sp_runtime::{BuildStorage, traits::IdentityLookup};
use primitives::{
  BatchConfig, BatchStatus, CurrentBatchInfo, ExternalInput, Handle, pallet_ids, params,
};

type Block = frame_system::mocking::MockBlock<Test>;
pub type AccountId = u64;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const CHARLIE: AccountId = 3;

/// 2026-01-01T00:00:00Z
pub const GENESIS_TIME: u64 = 1_767_225_600;
pub const DAY: u64 = 86_400;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Timestamp: polkadot_sdk::pallet_timestamp,
    EncryptedStore: pallet_encrypted_store,
    IntentRegistry: pallet_intent_registry,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
}

impl polkadot_sdk::pallet_timestamp::Config for Test {
  type Moment = u64;
  type OnTimestampSet = ();
  type MinimumPeriod = ConstU64<1>;
  type WeightInfo = ();
}

impl pallet_encrypted_store::Config for Test {
  type OracleOrigin = EnsureRoot<AccountId>;
  type OnDecryption = IntentRegistry;
  type WeightInfo = ();
}

pub struct MockBatchStatus;
impl BatchStatus for MockBatchStatus {
  fn current_batch_info() -> CurrentBatchInfo {
    CurrentBatchInfo {
      next_batch_id: 7,
      open_batches: 1,
      finalized_batches: 5,
      last_finalized_at: Some(GENESIS_TIME),
    }
  }

  fn batch_config() -> BatchConfig {
    BatchConfig {
      min_batch_users: params::MIN_BATCH_USERS,
      max_batch_size: params::MAX_BATCH_SIZE,
      decryption_timeout: params::DECRYPTION_TIMEOUT_SECS,
      default_pool_fee: params::DEFAULT_POOL_FEE,
    }
  }
}

parameter_types! {
  pub const RegistryPalletId: PalletId = PalletId(*pallet_ids::INTENT_REGISTRY_PALLET_ID);
  pub static AllowPlaintext: bool = true;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId> for MockBenchmarkHelper {
  fn encrypted_input(owner: &AccountId, value: u64, target: [u8; 8]) -> ExternalInput {
    EncryptedStore::do_encrypt_input(owner, value, target)
  }
}

impl pallet_intent_registry::Config for Test {
  type Fhe = EncryptedStore;
  type Oracle = EncryptedStore;
  type Time = Timestamp;
  type BatchStatus = MockBatchStatus;
  type PalletId = RegistryPalletId;
  type MaxActiveUsers = ConstU32<4>;
  type MinIntervalSeconds = ConstU64<{ params::MIN_INTERVAL_SECS }>;
  type MaxTotalPeriods = ConstU32<{ params::MAX_TOTAL_PERIODS }>;
  type MaxDipMultiplierBps = ConstU32<{ params::MAX_DIP_MULTIPLIER_BPS }>;
  type AllowPlaintextIntents = AllowPlaintext;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

pub fn set_now(secs: u64) {
  Timestamp::set_timestamp(secs * 1_000);
}

pub fn now() -> u64 {
  Timestamp::get() / 1_000
}

/// Client-side encryption of `value` for the registry
pub fn encrypted(owner: AccountId, value: u64) -> ExternalInput {
  EncryptedStore::do_encrypt_input(&owner, value, *pallet_ids::INTENT_REGISTRY_PALLET_ID)
}

/// Pending budget-exhaustion reveal for `who`
pub fn exhaustion_request(who: AccountId) -> Option<primitives::RequestId> {
  crate::ExhaustionChecks::<Test>::iter()
    .find(|(_, (owner, _))| *owner == who)
    .map(|(request_id, _)| request_id)
}

/// Plaintext behind a handle, as the oracle would see it
pub fn plain(handle: &Handle) -> u64 {
  EncryptedStore::oracle_view(handle).unwrap()
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| {
    System::set_block_number(1);
    set_now(GENESIS_TIME);
    AllowPlaintext::set(true);
  });
  ext
}
