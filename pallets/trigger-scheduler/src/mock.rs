use crate as pallet_trigger_scheduler;
use polkadot_sdk::frame_support::{
  construct_runtime, derive_impl, parameter_types,
  traits::{ConstU32, ConstU64},
};
use polkadot_sdk::frame_system::{self, EnsureRoot};
use polkadot_sdk::sp_runtime::{BuildStorage, DispatchError, DispatchResult, traits::IdentityLookup};
use primitives::{BatchId, BatchTrigger, Handle, IntentLedger, params};

type Block = frame_system::mocking::MockBlock<Test>;
pub type AccountId = u64;

pub const KEEPER: AccountId = 42;

/// 2026-01-01T00:00:00Z
pub const GENESIS_TIME: u64 = 1_767_225_600;
pub const HOUR: u64 = 3_600;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Timestamp: polkadot_sdk::pallet_timestamp,
    TriggerScheduler: pallet_trigger_scheduler,
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

parameter_types! {
  pub static ActiveRoster: Vec<AccountId> = vec![];
  /// `(candidates, min_participants)` of every trigger call
  pub static Triggered: Vec<(Vec<AccountId>, u32)> = vec![];
  pub static TriggerFails: bool = false;
  pub static AutoUpkeepEnabled: bool = false;
}

/// Registry stand-in exposing only the roster
pub struct MockIntents;

impl IntentLedger<AccountId> for MockIntents {
  fn active_users() -> Vec<AccountId> {
    ActiveRoster::get()
  }

  fn active_user_count() -> u32 {
    ActiveRoster::get().len() as u32
  }

  fn is_eligible(_: &AccountId, _: u64) -> bool {
    true
  }

  fn reserve(_: &AccountId, _: BatchId) -> DispatchResult {
    Ok(())
  }

  fn release(_: &AccountId, _: BatchId) {}

  fn due_amount(_: &AccountId, _: Option<u64>) -> Result<Handle, DispatchError> {
    Ok(Handle::default())
  }

  fn record_execution(_: &AccountId, _: BatchId, _: &Handle, _: u64) -> Result<bool, DispatchError> {
    Ok(false)
  }

  fn note_batch_executed(_: BatchId, _: u32, _: u64) {}

  fn note_batch_timed_out(_: BatchId, _: u32) {}
}

/// Executor stand-in recording every trigger
pub struct MockTrigger;

impl BatchTrigger<AccountId> for MockTrigger {
  fn trigger_batch(users: Vec<AccountId>, min_participants: u32) -> Result<BatchId, DispatchError> {
    if TriggerFails::get() {
      return Err(DispatchError::Other("InsufficientParticipants"));
    }
    let mut calls = Triggered::get();
    calls.push((users, min_participants));
    Triggered::set(calls.clone());
    Ok(calls.len() as BatchId - 1)
  }
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper for MockBenchmarkHelper {
  fn prepare_upkeep(count: u32, now: u64) {
    ActiveRoster::set((1..=u64::from(count)).collect());
    set_now(now.max(GENESIS_TIME));
  }
}

impl pallet_trigger_scheduler::Config for Test {
  type Intents = MockIntents;
  type Trigger = MockTrigger;
  type Time = Timestamp;
  type AdminOrigin = EnsureRoot<AccountId>;
  type MinActiveUsers = ConstU32<{ params::SCHEDULER_MIN_ACTIVE_USERS }>;
  type AutoUpkeep = AutoUpkeepEnabled;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

pub fn set_now(secs: u64) {
  Timestamp::set_timestamp(secs * 1_000);
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();
  pallet_trigger_scheduler::GenesisConfig::<Test> {
    execution_interval: HOUR,
    ..Default::default()
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| {
    System::set_block_number(1);
    set_now(GENESIS_TIME);
    ActiveRoster::set(vec![]);
    Triggered::set(vec![]);
    TriggerFails::set(false);
    AutoUpkeepEnabled::set(false);
  });
  ext
}
