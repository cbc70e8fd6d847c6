// Copyright (c) 2024-2026 The Meridian Foundation

use crate::codec::CodecError;
use displaydoc::Display;
use mrd_crypto_keys::KeyError;
use mrd_platform_types::OwnersError;

/// Errors from building, signing or syntactically verifying a transaction.
#[derive(Debug, Display)]
pub enum TxError {
    /// transaction network id {got} doesn't match the chain's {expected}
    WrongNetworkId {
        /// The chain's network id.
        expected: u32,
        /// The id the transaction carries.
        got: u32,
    },
    /// transaction blockchain id doesn't match the chain
    WrongBlockchainId,
    /// memo exceeds {0} bytes
    MemoTooLarge(usize),
    /// input or output carries the wrong asset
    WrongAssetId,
    /// input or output carries zero amount
    ZeroAmount,
    /// inputs must be sorted and unique
    UnsortedInputs,
    /// outputs must be sorted
    UnsortedOutputs,
    /// signature indices must be sorted and unique
    UnsortedSigIndices,
    /// locked output carries no lock ids
    EmptyLockIds,
    /// validator weight is zero
    ZeroValidatorWeight,
    /// validator start time {start} is not before end time {end}
    InvalidValidatorTimes {
        /// Validation start time.
        start: u64,
        /// Validation end time.
        end: u64,
    },
    /// validator node id is empty
    EmptyNodeId,
    /// subnet id is empty
    EmptySubnetId,
    /// deposit duration is zero
    ZeroDepositDuration,
    /// deposit offer id is empty
    EmptyOfferId,
    /// claimed amounts don't pair up with claimable owners
    ClaimAmountsMismatch,
    /// claim transaction claims nothing
    EmptyClaim,
    /// duplicate ids in claim transaction
    DuplicateClaimIds,
    /// register-node transaction changes no node id
    EmptyNodeChange,
    /// target address is empty
    EmptyTargetAddress,
    /// consortium member address is empty
    EmptyConsortiumMember,
    /// address state bit {0} out of range
    InvalidAddressStateBit(u8),
    /// rewarded transaction id is empty
    EmptyRewardTxId,
    /// import transaction has no inputs
    NoImportInputs,
    /// import transaction must not produce outputs
    ImportWithOutputs,
    /// credential count {got} doesn't match expected {expected}
    WrongCredentialCount {
        /// How many credentials the transaction kind requires.
        expected: usize,
        /// How many it carries.
        got: usize,
    },
    /// owners: {0}
    Owners(OwnersError),
    /// codec: {0}
    Codec(CodecError),
    /// key: {0}
    Key(KeyError),
}

impl std::error::Error for TxError {}

impl From<OwnersError> for TxError {
    fn from(err: OwnersError) -> Self {
        TxError::Owners(err)
    }
}

impl From<CodecError> for TxError {
    fn from(err: CodecError) -> Self {
        TxError::Codec(err)
    }
}

impl From<KeyError> for TxError {
    fn from(err: KeyError) -> Self {
        TxError::Key(err)
    }
}
