//! Ecosystem Constants for confidential DCA batching
//!
//! Pallet ids and the default economic / timing parameters shared by every pallet
//! configuration (runtime and mock runtimes alike).

/// Balance type alias for consistency across the ecosystem
pub type Balance = u128;

/// Pallet identifiers for deriving pallet-owned accounts and input-binding tags.
///
/// Encrypted inputs are bound to the pallet that consumes them through these ids, so a
/// ciphertext produced for the registry cannot be replayed into a vault.
pub mod pallet_ids {
  /// Intent Registry (encrypted DCA parameters)
  pub const INTENT_REGISTRY_PALLET_ID: &[u8; 8] = b"dcaintnt";

  /// Funding vault instance (stable asset custody)
  pub const FUNDING_VAULT_PALLET_ID: &[u8; 8] = b"fundvlt0";

  /// Reward vault instance (volatile asset custody)
  pub const REWARD_VAULT_PALLET_ID: &[u8; 8] = b"rwrdvlt0";

  /// Batch executor (aggregation and settlement)
  pub const BATCH_EXECUTOR_PALLET_ID: &[u8; 8] = b"batchexe";

  /// Swap adapter pass-through account
  pub const SWAP_ADAPTER_PALLET_ID: &[u8; 8] = b"swapadpt";
}

/// Default parameters for batching, settlement and scheduling.
pub mod params {
  use super::Balance;

  /// Denominator of pool fee tiers (Uniswap-style hundredths of a basis point).
  pub const POOL_FEE_DENOMINATOR: u32 = 1_000_000;

  /// Default pool fee tier: 3000 = 0.3%.
  pub const DEFAULT_POOL_FEE: u32 = 3_000;

  /// Fee tiers accepted by the swap adapter.
  pub const SUPPORTED_POOL_FEES: [u32; 3] = [500, 3_000, 10_000];

  /// Participants required before the user-count path may open a batch.
  pub const MIN_BATCH_USERS: u32 = 10;

  /// Lower participant threshold used by the time-based fallback trigger.
  pub const SCHEDULER_MIN_ACTIVE_USERS: u32 = 2;

  /// Upper bound of participants captured by a single batch.
  pub const MAX_BATCH_SIZE: u32 = 64;

  /// Seconds the oracle has to answer before a batch may be timed out.
  pub const DECRYPTION_TIMEOUT_SECS: u64 = 30 * 60;

  /// Seconds between two time-triggered batches.
  pub const EXECUTION_INTERVAL_SECS: u64 = 60 * 60;

  /// Shortest DCA interval a user may request.
  pub const MIN_INTERVAL_SECS: u64 = 60;

  /// Longest DCA schedule in periods.
  pub const MAX_TOTAL_PERIODS: u32 = 10_000;

  /// Basis-point scale used by dip multipliers.
  pub const BPS_DENOMINATOR: u32 = 10_000;

  /// Highest dip multiplier (3x the regular per-interval amount).
  pub const MAX_DIP_MULTIPLIER_BPS: u32 = 30_000;

  /// Volatile units quoted when sampling the spot price for dip conditions (1 ETH at 18 decimals
  /// would overflow the 64-bit ciphertext domain, so prices are quoted per 10^6 base units).
  pub const PRICE_QUOTE_UNIT: Balance = 1_000_000;
}

/// `floor(amount * numerator / denominator)` without intermediate overflow.
///
/// `None` when the denominator is zero or the result does not fit in 128 bits.
pub fn proportional_share(amount: u128, numerator: u128, denominator: u128) -> Option<u128> {
  if denominator == 0 {
    return None;
  }
  sp_arithmetic::helpers_128bit::multiply_by_rational_with_rounding(
    amount,
    numerator,
    denominator,
    sp_arithmetic::Rounding::Down,
  )
}
