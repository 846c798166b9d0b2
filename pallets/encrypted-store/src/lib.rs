//! Encrypted Store Pallet
//!
//! Development backend for the encrypted-arithmetic and decryption capabilities used by the
//! confidential DCA pallets. Ciphertexts are simulated: the store keeps the plaintext next to an
//! opaque [`Handle`] and only ever exposes it through the access list or the oracle gateway.
//!
//! ## Inputs
//! `encrypt_input` plays the role of client-side encryption. The produced proof binds the handle
//! to `(owner, target pallet)`, and [`EncryptedArithmetic::verify_input`] rejects any other
//! pairing.
//!
//! ## Decryption gateway
//! Consumers call [`DecryptionOracle::request_decryption`]; the oracle origin later answers with
//! `fulfill_decryption`, which hands the plaintext to `Config::OnDecryption`. Answers nobody
//! claims (e.g. for a batch that already timed out) are discarded.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

const LOG_TARGET: &str = "runtime::encrypted-store";

#[frame::pallet]
pub mod pallet {
  use super::{LOG_TARGET, WeightInfo};
  use frame::prelude::*;
  use polkadot_sdk::frame_support::traits::EnsureOrigin;
  use primitives::{
    ContractTag, DecryptionOracle, EncryptedArithmetic, ExternalInput, FheError, Handle,
    OnDecryptionFulfilled, RequestId, ValueKind, proportional_share,
  };

  /// Simulated ciphertext: plaintext domain plus the hidden value.
  #[derive(
    Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
  )]
  pub struct Ciphertext {
    pub kind: ValueKind,
    pub value: u64,
  }

  /// Who produced an input ciphertext and for which pallet.
  #[derive(
    Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
  )]
  pub struct InputBinding<AccountId> {
    pub owner: AccountId,
    pub target: ContractTag,
  }

  #[derive(
    Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
  )]
  pub struct PendingDecryption<BlockNumber> {
    pub handle: Handle,
    pub requested_at: BlockNumber,
  }

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Origin allowed to deliver decryption results
    type OracleOrigin: EnsureOrigin<Self::RuntimeOrigin>;
    /// Consumers of decryption results, asked in order until one claims the request
    type OnDecryption: OnDecryptionFulfilled;
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::storage]
  pub type Ciphertexts<T> = StorageMap<_, Identity, Handle, Ciphertext, OptionQuery>;

  /// Accounts allowed to decrypt a handle for themselves
  #[pallet::storage]
  pub type Acl<T: Config> =
    StorageDoubleMap<_, Identity, Handle, Blake2_128Concat, T::AccountId, (), OptionQuery>;

  #[pallet::storage]
  pub type InputBindings<T: Config> =
    StorageMap<_, Identity, Handle, InputBinding<T::AccountId>, OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn handle_nonce)]
  pub type HandleNonce<T> = StorageValue<_, u64, ValueQuery>;

  #[pallet::storage]
  #[pallet::getter(fn decryption_requests)]
  pub type DecryptionRequests<T: Config> =
    StorageMap<_, Twox64Concat, RequestId, PendingDecryption<BlockNumberFor<T>>, OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn next_request_id)]
  pub type NextRequestId<T> = StorageValue<_, RequestId, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// Client input encrypted and bound to `(owner, target)`
    InputEncrypted {
      owner: T::AccountId,
      target: ContractTag,
      handle: Handle,
      proof: [u8; 32],
    },
    DecryptionRequested {
      request_id: RequestId,
      handle: Handle,
    },
    /// Plaintext delivered to the consumer that owns the request
    DecryptionFulfilled {
      request_id: RequestId,
      value: u64,
    },
    /// No consumer recognised the request anymore
    DecryptionDiscarded { request_id: RequestId },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Proof does not match the handle, owner or target
    InvalidCiphertext,
    /// Handle is not known to the store
    UnknownHandle,
    /// Operand has the wrong plaintext domain
    KindMismatch,
    /// Caller is not on the handle's access list
    AccessDenied,
    /// Decryption request is not pending
    UnknownRequest,
    DivisionByZero,
    /// Scaled result does not fit in 64 bits
    Overflow,
  }

  impl<T> From<FheError> for Error<T> {
    fn from(e: FheError) -> Self {
      match e {
        FheError::InvalidCiphertext => Error::InvalidCiphertext,
        FheError::UnknownHandle => Error::UnknownHandle,
        FheError::KindMismatch => Error::KindMismatch,
        FheError::AccessDenied => Error::AccessDenied,
        FheError::DivisionByZero => Error::DivisionByZero,
        FheError::UnknownRequest => Error::UnknownRequest,
        FheError::Overflow => Error::Overflow,
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Encrypt `value` for the caller, bound to the pallet tagged `target`
    ///
    /// The resulting `ExternalInput` is published in `InputEncrypted` and can be passed to the
    /// target pallet's dispatchables.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::encrypt_input())]
    pub fn encrypt_input(origin: OriginFor<T>, value: u64, target: ContractTag) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_encrypt_input(&who, value, target);
      Ok(())
    }

    /// Deliver the plaintext of a pending request
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::fulfill_decryption())]
    pub fn fulfill_decryption(origin: OriginFor<T>, request_id: RequestId) -> DispatchResult {
      T::OracleOrigin::ensure_origin(origin)?;

      let pending = DecryptionRequests::<T>::take(request_id).ok_or(Error::<T>::UnknownRequest)?;
      let value = Self::load(&pending.handle)
        .map_err(Error::<T>::from)?
        .value;

      if T::OnDecryption::on_decryption_fulfilled(request_id, value)? {
        Self::deposit_event(Event::DecryptionFulfilled { request_id, value });
      } else {
        log::debug!(target: LOG_TARGET, "decryption {request_id} unclaimed, discarding");
        Self::deposit_event(Event::DecryptionDiscarded { request_id });
      }

      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Simulated client-side encryption of `value` for `(owner, target)`
    pub fn do_encrypt_input(owner: &T::AccountId, value: u64, target: ContractTag) -> ExternalInput {
      let handle = Self::store(ValueKind::Uint64, value);
      let proof = Self::input_proof(owner, target, &handle);
      InputBindings::<T>::insert(
        handle,
        InputBinding {
          owner: owner.clone(),
          target,
        },
      );
      Acl::<T>::insert(handle, owner, ());
      Self::deposit_event(Event::InputEncrypted {
        owner: owner.clone(),
        target,
        handle,
        proof,
      });
      ExternalInput { handle, proof }
    }

    /// User-side decryption of a handle `who` was granted access to
    pub fn reveal_for(who: &T::AccountId, handle: &Handle) -> Result<u64, FheError> {
      let ciphertext = Self::load(handle)?;
      if !Acl::<T>::contains_key(handle, who) {
        return Err(FheError::AccessDenied);
      }
      Ok(ciphertext.value)
    }

    /// Plaintext as seen by the decryption oracle, bypassing the access list
    pub fn oracle_view(handle: &Handle) -> Option<u64> {
      Ciphertexts::<T>::get(handle).map(|c| c.value)
    }

    fn input_proof(owner: &T::AccountId, target: ContractTag, handle: &Handle) -> [u8; 32] {
      frame::hashing::blake2_256(&(b"fhe/input", owner, target, handle).encode())
    }

    fn store(kind: ValueKind, value: u64) -> Handle {
      let nonce = HandleNonce::<T>::mutate(|n| {
        let current = *n;
        *n = n.wrapping_add(1);
        current
      });
      let handle = Handle(frame::hashing::blake2_256(
        &(b"fhe/hndl", frame_system::Pallet::<T>::block_number(), nonce).encode(),
      ));
      Ciphertexts::<T>::insert(handle, Ciphertext { kind, value });
      handle
    }

    fn load(handle: &Handle) -> Result<Ciphertext, FheError> {
      Ciphertexts::<T>::get(handle).ok_or(FheError::UnknownHandle)
    }

    fn load_uint(handle: &Handle) -> Result<u64, FheError> {
      let ciphertext = Self::load(handle)?;
      ensure!(ciphertext.kind == ValueKind::Uint64, FheError::KindMismatch);
      Ok(ciphertext.value)
    }

    fn load_bool(handle: &Handle) -> Result<bool, FheError> {
      let ciphertext = Self::load(handle)?;
      ensure!(ciphertext.kind == ValueKind::Bool, FheError::KindMismatch);
      Ok(ciphertext.value != 0)
    }
  }

  impl<T: Config> EncryptedArithmetic<T::AccountId> for Pallet<T> {
    fn verify_input(
      owner: &T::AccountId,
      target: ContractTag,
      input: &ExternalInput,
    ) -> Result<Handle, FheError> {
      let binding = InputBindings::<T>::get(input.handle).ok_or(FheError::InvalidCiphertext)?;
      ensure!(
        &binding.owner == owner && binding.target == target,
        FheError::InvalidCiphertext
      );
      ensure!(
        input.proof == Self::input_proof(owner, target, &input.handle),
        FheError::InvalidCiphertext
      );
      Self::load_uint(&input.handle).map_err(|_| FheError::InvalidCiphertext)?;
      Ok(input.handle)
    }

    fn as_encrypted(value: u64) -> Result<Handle, FheError> {
      Ok(Self::store(ValueKind::Uint64, value))
    }

    fn add(a: &Handle, b: &Handle) -> Result<Handle, FheError> {
      let sum = Self::load_uint(a)?.wrapping_add(Self::load_uint(b)?);
      Ok(Self::store(ValueKind::Uint64, sum))
    }

    fn sub(a: &Handle, b: &Handle) -> Result<Handle, FheError> {
      let difference = Self::load_uint(a)?.wrapping_sub(Self::load_uint(b)?);
      Ok(Self::store(ValueKind::Uint64, difference))
    }

    fn le(a: &Handle, b: &Handle) -> Result<Handle, FheError> {
      let result = Self::load_uint(a)? <= Self::load_uint(b)?;
      Ok(Self::store(ValueKind::Bool, result as u64))
    }

    fn equals(a: &Handle, b: &Handle) -> Result<Handle, FheError> {
      let result = Self::load_uint(a)? == Self::load_uint(b)?;
      Ok(Self::store(ValueKind::Bool, result as u64))
    }

    fn select(cond: &Handle, if_true: &Handle, if_false: &Handle) -> Result<Handle, FheError> {
      let cond = Self::load_bool(cond)?;
      let if_true = Self::load(if_true)?;
      let if_false = Self::load(if_false)?;
      ensure!(if_true.kind == if_false.kind, FheError::KindMismatch);
      let chosen = if cond { if_true } else { if_false };
      Ok(Self::store(chosen.kind, chosen.value))
    }

    fn scaled_share(
      amount: &Handle,
      numerator: u128,
      denominator: u128,
    ) -> Result<Handle, FheError> {
      ensure!(denominator != 0, FheError::DivisionByZero);
      let amount = Self::load_uint(amount)?;
      let share = proportional_share(amount as u128, numerator, denominator)
        .and_then(|s| u64::try_from(s).ok())
        .ok_or(FheError::Overflow)?;
      Ok(Self::store(ValueKind::Uint64, share))
    }

    fn allow(handle: &Handle, who: &T::AccountId) -> Result<(), FheError> {
      Self::load(handle)?;
      Acl::<T>::insert(handle, who, ());
      Ok(())
    }

    fn is_allowed(handle: &Handle, who: &T::AccountId) -> bool {
      Acl::<T>::contains_key(handle, who)
    }
  }

  impl<T: Config> DecryptionOracle for Pallet<T> {
    fn request_decryption(handle: &Handle) -> Result<RequestId, FheError> {
      Self::load(handle)?;
      let request_id = NextRequestId::<T>::mutate(|id| {
        let current = *id;
        *id = id.saturating_add(1);
        current
      });
      DecryptionRequests::<T>::insert(
        request_id,
        PendingDecryption {
          handle: *handle,
          requested_at: frame_system::Pallet::<T>::block_number(),
        },
      );
      log::debug!(target: LOG_TARGET, "decryption {request_id} requested");
      Self::deposit_event(Event::DecryptionRequested {
        request_id,
        handle: *handle,
      });
      Ok(request_id)
    }
  }
}
