//! Encrypted value capabilities
//!
//! The settlement core never touches plaintext amounts except the oracle-released aggregate.
//! Everything else flows through ciphertext [`Handle`]s manipulated via [`EncryptedArithmetic`],
//! which any FHE backend (or the simulated store used in development) implements.

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use polkadot_sdk::sp_runtime::DispatchError;
use scale_info::TypeInfo;

/// Identifier of an asynchronous decryption request.
pub type RequestId = u64;

/// Tag of the pallet an encrypted input is bound to (the consuming pallet's id bytes).
pub type ContractTag = [u8; 8];

/// Opaque reference to a ciphertext held by the encrypted-arithmetic backend.
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
)]
pub struct Handle(pub [u8; 32]);

/// Plaintext domain of a ciphertext.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum ValueKind {
  /// Unsigned 64-bit integer
  Uint64,
  /// Encrypted boolean produced by comparisons
  Bool,
}

/// Client-encrypted value together with its proof-of-encryption.
///
/// The proof binds the ciphertext to `(owner, target pallet)`; submitting it from another
/// account or into another pallet fails verification.
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
  PartialEq,
  TypeInfo,
)]
pub struct ExternalInput {
  pub handle: Handle,
  pub proof: [u8; 32],
}

/// Failures reported by encrypted-arithmetic backends.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FheError {
  /// Proof does not match the handle, owner or target
  InvalidCiphertext,
  /// Handle is not known to the backend
  UnknownHandle,
  /// Operand has the wrong plaintext domain (bool vs integer)
  KindMismatch,
  /// Account is not on the handle's access list
  AccessDenied,
  /// Plaintext divisor of a scaled share is zero
  DivisionByZero,
  /// Decryption request id is not pending
  UnknownRequest,
  /// Result does not fit the 64-bit plaintext domain
  Overflow,
}

impl From<FheError> for DispatchError {
  fn from(e: FheError) -> Self {
    DispatchError::Other(match e {
      FheError::InvalidCiphertext => "InvalidCiphertext",
      FheError::UnknownHandle => "UnknownHandle",
      FheError::KindMismatch => "KindMismatch",
      FheError::AccessDenied => "AccessDenied",
      FheError::DivisionByZero => "DivisionByZero",
      FheError::UnknownRequest => "UnknownRequest",
      FheError::Overflow => "Overflow",
    })
  }
}

/// Homomorphic operations over 64-bit unsigned ciphertexts.
///
/// `add` and `sub` wrap modulo 2^64 exactly like an FHE circuit would; callers keep operands in
/// range with `min`/`select` instead of branching on values they cannot see.
pub trait EncryptedArithmetic<AccountId> {
  /// Validate a client ciphertext bound to `(owner, target)` and import it.
  fn verify_input(
    owner: &AccountId,
    target: ContractTag,
    input: &ExternalInput,
  ) -> Result<Handle, FheError>;

  /// Trivially encrypt a public value.
  fn as_encrypted(value: u64) -> Result<Handle, FheError>;

  fn add(a: &Handle, b: &Handle) -> Result<Handle, FheError>;

  fn sub(a: &Handle, b: &Handle) -> Result<Handle, FheError>;

  /// Encrypted `a <= b`
  fn le(a: &Handle, b: &Handle) -> Result<Handle, FheError>;

  /// Encrypted `a == b`
  fn equals(a: &Handle, b: &Handle) -> Result<Handle, FheError>;

  /// Encrypted `if cond { if_true } else { if_false }`
  fn select(cond: &Handle, if_true: &Handle, if_false: &Handle) -> Result<Handle, FheError>;

  /// `floor(amount * numerator / denominator)` with plaintext scaling factors.
  ///
  /// Fails with [`FheError::Overflow`] when the result leaves the 64-bit domain.
  fn scaled_share(amount: &Handle, numerator: u128, denominator: u128)
  -> Result<Handle, FheError>;

  /// Grant `who` the right to decrypt `handle` for themselves.
  fn allow(handle: &Handle, who: &AccountId) -> Result<(), FheError>;

  fn is_allowed(handle: &Handle, who: &AccountId) -> bool;

  fn min(a: &Handle, b: &Handle) -> Result<Handle, FheError> {
    let a_le_b = Self::le(a, b)?;
    Self::select(&a_le_b, a, b)
  }

  fn zero() -> Result<Handle, FheError> {
    Self::as_encrypted(0)
  }
}

/// Gateway accepting decryption requests for a single ciphertext.
pub trait DecryptionOracle {
  fn request_decryption(handle: &Handle) -> Result<RequestId, FheError>;
}

/// Callback receiving oracle answers.
///
/// Returns `Ok(true)` when the implementer owned `request_id`, `Ok(false)` when it did not
/// recognise it (so the next consumer in a tuple is asked).
pub trait OnDecryptionFulfilled {
  fn on_decryption_fulfilled(request_id: RequestId, value: u64) -> Result<bool, DispatchError>;
}

impl OnDecryptionFulfilled for () {
  fn on_decryption_fulfilled(_: RequestId, _: u64) -> Result<bool, DispatchError> {
    Ok(false)
  }
}

impl<A: OnDecryptionFulfilled, B: OnDecryptionFulfilled> OnDecryptionFulfilled for (A, B) {
  fn on_decryption_fulfilled(request_id: RequestId, value: u64) -> Result<bool, DispatchError> {
    if A::on_decryption_fulfilled(request_id, value)? {
      return Ok(true);
    }
    B::on_decryption_fulfilled(request_id, value)
  }
}

impl<A: OnDecryptionFulfilled, B: OnDecryptionFulfilled, C: OnDecryptionFulfilled>
  OnDecryptionFulfilled for (A, B, C)
{
  fn on_decryption_fulfilled(request_id: RequestId, value: u64) -> Result<bool, DispatchError> {
    if A::on_decryption_fulfilled(request_id, value)? {
      return Ok(true);
    }
    <(B, C)>::on_decryption_fulfilled(request_id, value)
  }
}

impl<A, B, C, D> OnDecryptionFulfilled for (A, B, C, D)
where
  A: OnDecryptionFulfilled,
  B: OnDecryptionFulfilled,
  C: OnDecryptionFulfilled,
  D: OnDecryptionFulfilled,
{
  fn on_decryption_fulfilled(request_id: RequestId, value: u64) -> Result<bool, DispatchError> {
    if A::on_decryption_fulfilled(request_id, value)? {
      return Ok(true);
    }
    <(B, C, D)>::on_decryption_fulfilled(request_id, value)
  }
}
