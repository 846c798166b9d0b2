use crate as pallet_encrypted_store;
use polkadot_sdk::frame_support::{construct_runtime, derive_impl};
use polkadot_sdk::frame_system::{self, EnsureRoot};
use polkadot_sdk::sp_runtime::{BuildStorage, DispatchError};
use primitives::{OnDecryptionFulfilled, RequestId};

use core::cell::RefCell;

type Block = frame_system::mocking::MockBlock<Test>;
pub type AccountId = u64;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;

pub const REGISTRY_TAG: [u8; 8] = *b"dcaintnt";
pub const VAULT_TAG: [u8; 8] = *b"fundvlt0";

construct_runtime!(
  pub struct Test {
    System: frame_system,
    EncryptedStore: pallet_encrypted_store,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = AccountId;
  type Lookup = polkadot_sdk::sp_runtime::traits::IdentityLookup<Self::AccountId>;
}

thread_local! {
  static CLAIMED: RefCell<Option<RequestId>> = const { RefCell::new(None) };
  static DELIVERED: RefCell<Vec<(RequestId, u64)>> = const { RefCell::new(Vec::new()) };
  static FAIL_DELIVERY: RefCell<bool> = const { RefCell::new(false) };
}

/// Consumer owning a single request id at a time
pub struct MockConsumer;

impl MockConsumer {
  pub fn claim(request_id: RequestId) {
    CLAIMED.with(|c| *c.borrow_mut() = Some(request_id));
  }

  pub fn fail_next_delivery() {
    FAIL_DELIVERY.with(|f| *f.borrow_mut() = true);
  }

  pub fn delivered() -> Vec<(RequestId, u64)> {
    DELIVERED.with(|d| d.borrow().clone())
  }
}

impl OnDecryptionFulfilled for MockConsumer {
  fn on_decryption_fulfilled(request_id: RequestId, value: u64) -> Result<bool, DispatchError> {
    if FAIL_DELIVERY.with(|f| f.replace(false)) {
      return Err(DispatchError::Other("consumer failed"));
    }
    if CLAIMED.with(|c| *c.borrow()) != Some(request_id) {
      return Ok(false);
    }
    DELIVERED.with(|d| d.borrow_mut().push((request_id, value)));
    Ok(true)
  }
}

impl pallet_encrypted_store::Config for Test {
  type OracleOrigin = EnsureRoot<AccountId>;
  type OnDecryption = MockConsumer;
  type WeightInfo = ();
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| {
    System::set_block_number(1);
    CLAIMED.with(|c| *c.borrow_mut() = None);
    DELIVERED.with(|d| d.borrow_mut().clear());
    FAIL_DELIVERY.with(|f| *f.borrow_mut() = false);
  });
  ext
}
