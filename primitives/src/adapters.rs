//! Venue adapter traits
//!
//! Two traits abstract the runtime-specific asset plumbing so the vault and swap pallets stay
//! independent of any concrete assets / DEX implementation.

use polkadot_sdk::sp_runtime::DispatchError;

/// Asset custody moves and balance queries.
pub trait AssetOps<AccountId, AssetId, Balance> {
  fn transfer(
    from: &AccountId,
    to: &AccountId,
    asset: AssetId,
    amount: Balance,
  ) -> Result<(), DispatchError>;

  fn balance(who: &AccountId, asset: AssetId) -> Balance;
}

/// External swap venue with Uniswap-style fee tiers.
pub trait DexOps<AccountId, AssetId, Balance> {
  /// Swap the exact `amount_in` held by `who`, crediting the output to `who`.
  fn swap_exact_in(
    who: &AccountId,
    asset_in: AssetId,
    asset_out: AssetId,
    amount_in: Balance,
    min_out: Balance,
    pool_fee: u32,
  ) -> Result<Balance, DispatchError>;

  fn get_quote(
    asset_in: AssetId,
    asset_out: AssetId,
    amount_in: Balance,
    pool_fee: u32,
  ) -> Option<Balance>;
}

/// No-op `AssetOps` for configurations without custody.
impl<AccountId, AssetId, Balance: Default> AssetOps<AccountId, AssetId, Balance> for () {
  fn transfer(_: &AccountId, _: &AccountId, _: AssetId, _: Balance) -> Result<(), DispatchError> {
    Ok(())
  }

  fn balance(_: &AccountId, _: AssetId) -> Balance {
    Balance::default()
  }
}

/// No-op `DexOps` for configurations where no venue is wired.
impl<AccountId, AssetId, Balance> DexOps<AccountId, AssetId, Balance> for () {
  fn swap_exact_in(
    _: &AccountId,
    _: AssetId,
    _: AssetId,
    _: Balance,
    _: Balance,
    _: u32,
  ) -> Result<Balance, DispatchError> {
    Err(DispatchError::Other("DexOps not configured"))
  }

  fn get_quote(_: AssetId, _: AssetId, _: Balance, _: u32) -> Option<Balance> {
    None
  }
}
