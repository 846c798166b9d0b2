use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};

/// Single source of truth for asset identifiers across the DCA pallets.
///
/// - `Native`: the chain's native token (fees, deposits).
/// - `Local(u32)`: fungible assets held in vault custody and routed through the swap venue.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Default,
  Encode,
  Eq,
  MaxEncodedLen,
  Ord,
  PartialEq,
  PartialOrd,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum AssetKind {
  #[default]
  Native,
  Local(u32),
}

impl From<u32> for AssetKind {
  fn from(asset_id: u32) -> Self {
    AssetKind::Local(asset_id)
  }
}

// 32-bit ID Structure:
// [ 4 bits: Class ] [ 28 bits: Index ]
//
// 0x1... -> Volatile assets (the DCA target side)
// 0x2... -> Stable assets (the DCA funding side)

pub const MASK_CLASS: u32 = 0xF000_0000;
pub const MASK_INDEX: u32 = 0x0FFF_FFFF;

pub const CLASS_VOLATILE: u32 = 0x1000_0000;
pub const CLASS_STABLE: u32 = 0x2000_0000;

/// Class of an asset id, used to check that a trading pair is wired the right way round
pub trait AssetInspector {
  fn is_stable(&self) -> bool;
  fn is_volatile(&self) -> bool;
}

impl AssetInspector for AssetKind {
  fn is_stable(&self) -> bool {
    match self {
      AssetKind::Local(id) => (id & MASK_CLASS) == CLASS_STABLE,
      AssetKind::Native => false,
    }
  }

  fn is_volatile(&self) -> bool {
    match self {
      AssetKind::Local(id) => (id & MASK_CLASS) == CLASS_VOLATILE,
      AssetKind::Native => false,
    }
  }
}

const fn make_id(class: u32, index: u32) -> u32 {
  class | (index & MASK_INDEX)
}

/// Well-known asset ids used as the default trading pair
pub mod well_known {
  use super::*;

  pub const ETH: u32 = make_id(CLASS_VOLATILE, 1);
  pub const USDC: u32 = make_id(CLASS_STABLE, 1);
}
