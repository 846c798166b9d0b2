use crate as pallet_confidential_vault;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl,
  instances::{Instance1, Instance2},
  parameter_types,
  traits::{ConstBool, ConstU32},
};
use polkadot_sdk::frame_system::{self, EnsureRoot};
use polkadot_sdk::sp_runtime::{BuildStorage, DispatchError, TokenError, traits::IdentityLookup};
use primitives::{AssetKind, AssetOps, Balance, ExternalInput, Handle, pallet_ids, well_known};

use core::cell::RefCell;
use std::collections::BTreeMap;

type Block = frame_system::mocking::MockBlock<Test>;
pub type AccountId = u64;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const EXECUTOR: AccountId = 100;

pub const USDC: AssetKind = AssetKind::Local(well_known::USDC);
pub const ETH: AssetKind = AssetKind::Local(well_known::ETH);

construct_runtime!(
  pub struct Test {
    System: frame_system,
    EncryptedStore: pallet_encrypted_store,
    FundingVault: pallet_confidential_vault::<Instance1>,
    RewardVault: pallet_confidential_vault::<Instance2>,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
}

impl pallet_encrypted_store::Config for Test {
  type OracleOrigin = EnsureRoot<AccountId>;
  type OnDecryption = (FundingVault, RewardVault);
  type WeightInfo = ();
}

thread_local! {
  static ASSET_BALANCES: RefCell<BTreeMap<(AccountId, AssetKind), Balance>> =
    RefCell::new(BTreeMap::new());
}

pub fn set_asset_balance(who: AccountId, asset: AssetKind, amount: Balance) {
  ASSET_BALANCES.with(|b| {
    b.borrow_mut().insert((who, asset), amount);
  });
}

pub fn asset_balance(who: AccountId, asset: AssetKind) -> Balance {
  ASSET_BALANCES.with(|b| b.borrow().get(&(who, asset)).copied().unwrap_or(0))
}

pub struct MockAssetOps;

impl AssetOps<AccountId, AssetKind, Balance> for MockAssetOps {
  fn transfer(
    from: &AccountId,
    to: &AccountId,
    asset: AssetKind,
    amount: Balance,
  ) -> Result<(), DispatchError> {
    ASSET_BALANCES.with(|b| {
      let mut map = b.borrow_mut();
      let src = map.get(&(*from, asset)).copied().unwrap_or(0);
      if src < amount {
        return Err(DispatchError::Token(TokenError::FundsUnavailable));
      }
      map.insert((*from, asset), src - amount);
      let dst = map.get(&(*to, asset)).copied().unwrap_or(0);
      map.insert((*to, asset), dst + amount);
      Ok(())
    })
  }

  fn balance(who: &AccountId, asset: AssetKind) -> Balance {
    asset_balance(*who, asset)
  }
}

parameter_types! {
  pub const FundingPalletId: PalletId = PalletId(*pallet_ids::FUNDING_VAULT_PALLET_ID);
  pub const RewardPalletId: PalletId = PalletId(*pallet_ids::REWARD_VAULT_PALLET_ID);
  pub const StableAsset: AssetKind = USDC;
  pub const VolatileAsset: AssetKind = ETH;
  pub const Executor: AccountId = EXECUTOR;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId> for MockBenchmarkHelper {
  fn fund(who: &AccountId, asset: AssetKind, amount: Balance) {
    set_asset_balance(*who, asset, asset_balance(*who, asset) + amount);
  }

  fn encrypted_input(owner: &AccountId, value: u64, target: [u8; 8]) -> ExternalInput {
    EncryptedStore::do_encrypt_input(owner, value, target)
  }
}

impl pallet_confidential_vault::Config<Instance1> for Test {
  type Fhe = EncryptedStore;
  type Oracle = EncryptedStore;
  type AssetOps = MockAssetOps;
  type VaultAsset = StableAsset;
  type PalletId = FundingPalletId;
  type AuthorizedExecutor = Executor;
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
  type AuthorizedExecutor = Executor;
  type AllowDeposits = ConstBool<false>;
  type MaxBatchCredits = ConstU32<16>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

pub const INITIAL_USDC: Balance = 1_000_000;

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

/// Client-side encryption of `value` bound to a vault
pub fn encrypted_for(owner: AccountId, value: u64, vault: &[u8; 8]) -> ExternalInput {
  EncryptedStore::do_encrypt_input(&owner, value, *vault)
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let t = RuntimeGenesisConfig::default().build_storage().unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| {
    System::set_block_number(1);
    ASSET_BALANCES.with(|b| b.borrow_mut().clear());
    set_asset_balance(ALICE, USDC, INITIAL_USDC);
    set_asset_balance(BOB, USDC, INITIAL_USDC);
  });
  ext
}
