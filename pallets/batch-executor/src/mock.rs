use crate as pallet_batch_executor;
use codec::Encode;
use polkadot_sdk::frame_support::{
  PalletId, assert_ok, construct_runtime, derive_impl,
  instances::{Instance1, Instance2},
  ord_parameter_types, parameter_types,
  storage::unhashed,
  traits::{ConstBool, ConstU32, ConstU64, ConstU128},
};
use polkadot_sdk::frame_system::{self, EnsureRoot, EnsureSignedBy};
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, TokenError,
  traits::{AccountIdConversion, IdentityLookup},
};
use primitives::{
  AssetKind, AssetOps, Balance, BatchId, DexOps, Handle, pallet_ids, params, well_known,
};

type Block = frame_system::mocking::MockBlock<Test>;
pub type AccountId = u64;

pub const OPERATOR: AccountId = 100;
pub const TREASURY: AccountId = 200;
pub const DEX_POOL: AccountId = 900;

pub const USDC: AssetKind = AssetKind::Local(well_known::USDC);
pub const ETH: AssetKind = AssetKind::Local(well_known::ETH);

/// 2026-01-01T00:00:00Z
pub const GENESIS_TIME: u64 = 1_767_225_600;
pub const DAY: u64 = 86_400;
pub const TIMEOUT: u64 = 1_800;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Timestamp: polkadot_sdk::pallet_timestamp,
    EncryptedStore: pallet_encrypted_store,
    IntentRegistry: pallet_intent_registry,
    FundingVault: pallet_confidential_vault::<Instance1>,
    RewardVault: pallet_confidential_vault::<Instance2>,
    SwapAdapter: pallet_swap_adapter,
    BatchExecutor: pallet_batch_executor,
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
  type OnDecryption = (BatchExecutor, IntentRegistry, FundingVault, RewardVault);
  type WeightInfo = ();
}

/// Asset balances live in unhashed storage so failed dispatches roll them back
fn asset_key(who: &AccountId, asset: AssetKind) -> Vec<u8> {
  (b"mock/assets", who, asset).encode()
}

pub fn set_asset_balance(who: AccountId, asset: AssetKind, amount: Balance) {
  unhashed::put(&asset_key(&who, asset), &amount);
}

pub fn asset_balance(who: AccountId, asset: AssetKind) -> Balance {
  unhashed::get_or_default(&asset_key(&who, asset))
}

pub struct MockAssetOps;

impl AssetOps<AccountId, AssetKind, Balance> for MockAssetOps {
  fn transfer(
    from: &AccountId,
    to: &AccountId,
    asset: AssetKind,
    amount: Balance,
  ) -> Result<(), DispatchError> {
    let src = asset_balance(*from, asset);
    if src < amount {
      return Err(DispatchError::Token(TokenError::FundsUnavailable));
    }
    set_asset_balance(*from, asset, src - amount);
    let dst = asset_balance(*to, asset);
    set_asset_balance(*to, asset, dst + amount);
    Ok(())
  }

  fn balance(who: &AccountId, asset: AssetKind) -> Balance {
    asset_balance(*who, asset)
  }
}

parameter_types! {
  /// ETH paid per USDC, as (numerator, denominator)
  pub static DexRate: (Balance, Balance) = (1, 5);
}

/// Fixed-rate venue backed by the `DEX_POOL` account
pub struct MockDex;

impl DexOps<AccountId, AssetKind, Balance> for MockDex {
  fn swap_exact_in(
    who: &AccountId,
    asset_in: AssetKind,
    asset_out: AssetKind,
    amount_in: Balance,
    _min_out: Balance,
    pool_fee: u32,
  ) -> Result<Balance, DispatchError> {
    let amount_out = Self::get_quote(asset_in, asset_out, amount_in, pool_fee)
      .ok_or(DispatchError::Other("NoPool"))?;
    MockAssetOps::transfer(who, &DEX_POOL, asset_in, amount_in)?;
    MockAssetOps::transfer(&DEX_POOL, who, asset_out, amount_out)?;
    Ok(amount_out)
  }

  fn get_quote(
    asset_in: AssetKind,
    asset_out: AssetKind,
    amount_in: Balance,
    _pool_fee: u32,
  ) -> Option<Balance> {
    let (num, den) = DexRate::get();
    match (asset_in, asset_out) {
      (USDC, ETH) => Some(amount_in * num / den),
      (ETH, USDC) => Some(amount_in * den / num),
      _ => None,
    }
  }
}

parameter_types! {
  pub const RegistryPalletId: PalletId = PalletId(*pallet_ids::INTENT_REGISTRY_PALLET_ID);
  pub const FundingPalletId: PalletId = PalletId(*pallet_ids::FUNDING_VAULT_PALLET_ID);
  pub const RewardPalletId: PalletId = PalletId(*pallet_ids::REWARD_VAULT_PALLET_ID);
  pub const AdapterPalletId: PalletId = PalletId(*pallet_ids::SWAP_ADAPTER_PALLET_ID);
  pub const ExecutorPalletId: PalletId = PalletId(*pallet_ids::BATCH_EXECUTOR_PALLET_ID);
  pub ExecutorAccount: AccountId = ExecutorPalletId::get().into_account_truncating();
  pub const StableAsset: AssetKind = USDC;
  pub const VolatileAsset: AssetKind = ETH;
  pub const Treasury: AccountId = TREASURY;
  pub static HoldForAllocations: bool = false;
}

ord_parameter_types! {
  pub const Operator: AccountId = OPERATOR;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl pallet_intent_registry::BenchmarkHelper<AccountId> for MockBenchmarkHelper {
  fn encrypted_input(owner: &AccountId, value: u64, target: [u8; 8]) -> primitives::ExternalInput {
    EncryptedStore::do_encrypt_input(owner, value, target)
  }
}

#[cfg(feature = "runtime-benchmarks")]
impl pallet_confidential_vault::BenchmarkHelper<AccountId> for MockBenchmarkHelper {
  fn fund(who: &AccountId, asset: AssetKind, amount: Balance) {
    set_asset_balance(*who, asset, asset_balance(*who, asset) + amount);
  }

  fn encrypted_input(owner: &AccountId, value: u64, target: [u8; 8]) -> primitives::ExternalInput {
    EncryptedStore::do_encrypt_input(owner, value, target)
  }
}

#[cfg(feature = "runtime-benchmarks")]
impl pallet_swap_adapter::BenchmarkHelper<AccountId> for MockBenchmarkHelper {
  fn fund_swap(who: &AccountId, amount: Balance) {
    set_asset_balance(*who, USDC, asset_balance(*who, USDC) + amount);
  }
}

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId> for MockBenchmarkHelper {
  fn subscribe(who: &AccountId) {
    subscribe(*who, 1_000, 1_000, 100, 10);
  }

  fn reveal(request_id: primitives::RequestId) {
    assert_ok!(EncryptedStore::fulfill_decryption(
      RuntimeOrigin::root(),
      request_id
    ));
  }

  fn allocation_input(operator: &AccountId, value: u64) -> primitives::ExternalInput {
    EncryptedStore::do_encrypt_input(operator, value, *pallet_ids::REWARD_VAULT_PALLET_ID)
  }

  fn set_time(at: u64) {
    set_now(at.max(now()));
  }
}

impl pallet_intent_registry::Config for Test {
  type Fhe = EncryptedStore;
  type Oracle = EncryptedStore;
  type Time = Timestamp;
  type BatchStatus = BatchExecutor;
  type PalletId = RegistryPalletId;
  type MaxActiveUsers = ConstU32<32>;
  type MinIntervalSeconds = ConstU64<{ params::MIN_INTERVAL_SECS }>;
  type MaxTotalPeriods = ConstU32<{ params::MAX_TOTAL_PERIODS }>;
  type MaxDipMultiplierBps = ConstU32<{ params::MAX_DIP_MULTIPLIER_BPS }>;
  type AllowPlaintextIntents = ConstBool<true>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

impl pallet_confidential_vault::Config<Instance1> for Test {
  type Fhe = EncryptedStore;
  type Oracle = EncryptedStore;
  type AssetOps = MockAssetOps;
  type VaultAsset = StableAsset;
  type PalletId = FundingPalletId;
  type AuthorizedExecutor = ExecutorAccount;
  type AllowDeposits = ConstBool<true>;
  type MaxBatchCredits = ConstU32<16>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

impl pallet_confidential_vault::Config<Instance2> for Test {
  type Fhe = EncryptedStore;
  type Oracle = EncryptedStore;
  type AssetOps = MockAssetOps;
  type VaultAsset = VolatileAsset;
  type PalletId = RewardPalletId;
  type AuthorizedExecutor = ExecutorAccount;
  type AllowDeposits = ConstBool<false>;
  type MaxBatchCredits = ConstU32<16>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

impl pallet_swap_adapter::Config for Test {
  type AssetOps = MockAssetOps;
  type Dex = MockDex;
  type StableAsset = StableAsset;
  type VolatileAsset = VolatileAsset;
  type PalletId = AdapterPalletId;
  type DefaultPoolFee = ConstU32<{ params::DEFAULT_POOL_FEE }>;
  type PriceQuoteUnit = ConstU128<{ params::PRICE_QUOTE_UNIT }>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

impl pallet_batch_executor::Config for Test {
  type Fhe = EncryptedStore;
  type Oracle = EncryptedStore;
  type Intents = IntentRegistry;
  type FundingVault = FundingVault;
  type RewardVault = RewardVault;
  type Swap = SwapAdapter;
  type Time = Timestamp;
  type FinalizeOrigin = EnsureSignedBy<Operator, AccountId>;
  type RemainderRecipient = Treasury;
  type PalletId = ExecutorPalletId;
  type MinBatchUsers = ConstU32<{ params::MIN_BATCH_USERS }>;
  type MaxBatchSize = ConstU32<16>;
  type DecryptionTimeout = ConstU64<TIMEOUT>;
  type DefaultPoolFee = ConstU32<{ params::DEFAULT_POOL_FEE }>;
  type MaxOpenBatches = ConstU32<3>;
  type OperatorAllocations = HoldForAllocations;
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

pub fn users(n: u64) -> Vec<AccountId> {
  (1..=n).collect()
}

/// Plaintext behind a handle, as the oracle would see it
pub fn plain(handle: &Handle) -> u64 {
  EncryptedStore::oracle_view(handle).unwrap()
}

pub fn funding_balance(who: AccountId) -> u64 {
  FundingVault::my_encrypted_balance(&who).map_or(0, |h| plain(&h))
}

pub fn reward_balance(who: AccountId) -> u64 {
  RewardVault::my_encrypted_balance(&who).map_or(0, |h| plain(&h))
}

pub fn spent(who: AccountId) -> u64 {
  plain(&IntentRegistry::my_params(&who).unwrap().spent_so_far)
}

pub fn budget(who: AccountId) -> u64 {
  plain(&IntentRegistry::my_params(&who).unwrap().budget_total)
}

pub fn is_active(who: AccountId) -> bool {
  IntentRegistry::my_params(&who).is_some_and(|p| p.active)
}

/// Fund `who` in the funding vault and register a daily plaintext intent
pub fn subscribe(who: AccountId, deposit: Balance, budget: u64, per_interval: u64, periods: u32) {
  set_asset_balance(who, USDC, asset_balance(who, USDC) + deposit);
  assert_ok!(FundingVault::deposit(RuntimeOrigin::signed(who), deposit));
  assert_ok!(IntentRegistry::submit_test_intent(
    RuntimeOrigin::signed(who),
    budget,
    per_interval,
    DAY,
    periods,
  ));
}

/// The standard ten-user cohort: 1000 budget, 100 per day, 10 periods
pub fn subscribe_cohort(n: u64) {
  for who in users(n) {
    subscribe(who, 1_000, 1_000, 100, 10);
  }
}

pub fn request_of(batch_id: BatchId) -> primitives::RequestId {
  BatchExecutor::batch_info(batch_id)
    .and_then(|b| b.request_id)
    .unwrap()
}

/// Open a batch over `candidates` and let the oracle answer it
pub fn open_and_reveal(candidates: Vec<AccountId>) -> BatchId {
  let batch_id = BatchExecutor::next_batch_id();
  assert_ok!(BatchExecutor::execute_batch(
    RuntimeOrigin::signed(OPERATOR),
    candidates,
  ));
  assert_ok!(EncryptedStore::fulfill_decryption(
    RuntimeOrigin::root(),
    request_of(batch_id),
  ));
  batch_id
}

/// Let the oracle answer every pending budget-exhaustion check
pub fn reveal_budget_checks() {
  let pending: Vec<_> = pallet_intent_registry::ExhaustionChecks::<Test>::iter_keys().collect();
  for request_id in pending {
    assert_ok!(EncryptedStore::fulfill_decryption(
      RuntimeOrigin::root(),
      request_id
    ));
  }
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let t = RuntimeGenesisConfig::default().build_storage().unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| {
    System::set_block_number(1);
    set_now(GENESIS_TIME);
    DexRate::set((1, 5));
    HoldForAllocations::set(false);
    set_asset_balance(DEX_POOL, ETH, 1_000_000_000);
    set_asset_balance(DEX_POOL, USDC, 1_000_000_000);
  });
  ext
}
