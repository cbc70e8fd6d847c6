// Copyright (c) 2024-2026 The Meridian Foundation

use crate::codec;
use crate::credential::Credential;
use crate::error::TxError;
use crate::validation::{validate_inputs, validate_outputs};
use mrd_core_types::{AssetId, BlockId, Id, NodeId, OwnerId, ShortId, SubnetId, TxId};
use mrd_crypto_keys::SpendKey;
use mrd_platform_types::{OutputOwners, TransferableInput, TransferableOutput};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Maximum memo length in bytes.
pub const MAX_MEMO_SIZE: usize = 256;

/// The chain identity transactions are checked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Network the chain belongs to.
    pub network_id: u32,
    /// The chain's own id.
    pub blockchain_id: BlockId,
    /// The fee asset.
    pub asset_id: AssetId,
}

/// Fields common to every user-built transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseTx {
    /// Network this transaction is valid on.
    pub network_id: u32,
    /// Chain this transaction is valid on.
    pub blockchain_id: BlockId,
    /// Consumed UTXOs, in canonical order.
    pub ins: Vec<TransferableInput>,
    /// Produced outputs, in canonical order.
    pub outs: Vec<TransferableOutput>,
    /// Free-form memo.
    pub memo: Vec<u8>,
}

impl BaseTx {
    fn syntactic_verify(&self, ctx: &Context) -> Result<(), TxError> {
        if self.network_id != ctx.network_id {
            return Err(TxError::WrongNetworkId {
                expected: ctx.network_id,
                got: self.network_id,
            });
        }
        if self.blockchain_id != ctx.blockchain_id {
            return Err(TxError::WrongBlockchainId);
        }
        if self.memo.len() > MAX_MEMO_SIZE {
            return Err(TxError::MemoTooLarge(MAX_MEMO_SIZE));
        }
        validate_inputs(&self.ins, ctx)?;
        validate_outputs(&self.outs, ctx)
    }
}

/// A primary-network validator registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// The validating node.
    pub node_id: NodeId,
    /// Unix time validation starts.
    pub start: u64,
    /// Unix time validation ends.
    pub end: u64,
    /// Stake weight, equal to the bonded amount.
    pub weight: u64,
}

impl Validator {
    fn syntactic_verify(&self) -> Result<(), TxError> {
        if self.node_id.is_empty() {
            return Err(TxError::EmptyNodeId);
        }
        if self.weight == 0 {
            return Err(TxError::ZeroValidatorWeight);
        }
        if self.start >= self.end {
            return Err(TxError::InvalidValidatorTimes {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// A subnet validator registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetValidator {
    /// The validator core.
    pub validator: Validator,
    /// The subnet being validated.
    pub subnet_id: SubnetId,
}

/// Registers a validator, bonding its stake in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddValidatorTx {
    /// Common fields.
    pub base: BaseTx,
    /// The validator being added.
    pub validator: Validator,
    /// Where validation rewards are paid.
    pub rewards_owner: OutputOwners,
}

/// Registers a subnet validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSubnetValidatorTx {
    /// Common fields.
    pub base: BaseTx,
    /// The subnet validator being added.
    pub validator: SubnetValidator,
}

/// System transaction releasing the bond of a resolved validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardValidatorTx {
    /// The validator transaction whose bond is released.
    pub tx_id: TxId,
    /// Bonded UTXOs being consumed, in canonical order.
    pub ins: Vec<TransferableInput>,
    /// Their unlocked counterparts, in canonical order.
    pub outs: Vec<TransferableOutput>,
}

/// Sets or clears one role bit on an address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressStateTx {
    /// Common fields.
    pub base: BaseTx,
    /// The address whose roles change.
    pub address: ShortId,
    /// Clear the bit instead of setting it.
    pub remove: bool,
    /// Which bit changes.
    pub state_bit: u8,
}

/// Locks value as a deposit earning reward under an offer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositTx {
    /// Common fields.
    pub base: BaseTx,
    /// The offer the deposit runs against.
    pub deposit_offer_id: Id,
    /// Deposit duration in seconds.
    pub deposit_duration: u32,
    /// Where deposit rewards are paid.
    pub rewards_owner: OutputOwners,
}

/// Releases expired deposits, user-signed or system-built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockDepositTx {
    /// Common fields.
    pub base: BaseTx,
}

/// Claims accrued deposit rewards and claimables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTx {
    /// Common fields.
    pub base: BaseTx,
    /// Deposits whose accrued reward is claimed.
    pub deposit_tx_ids: Vec<TxId>,
    /// Claimable owners whose balance is claimed.
    pub claimable_owner_ids: Vec<OwnerId>,
    /// Amount claimed per claimable owner.
    pub claimed_amounts: Vec<u64>,
    /// Where the claimed value is paid.
    pub claim_to: OutputOwners,
}

/// Registers or replaces a consortium member's validator node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterNodeTx {
    /// Common fields.
    pub base: BaseTx,
    /// The node id being replaced; empty when registering the first node.
    pub old_node_id: NodeId,
    /// The node id being registered; empty when deregistering.
    pub new_node_id: NodeId,
    /// Signature indices proving the consortium member's assent.
    pub consortium_member_auth: Vec<u32>,
    /// The consortium member the node belongs to.
    pub consortium_member_address: ShortId,
}

/// System transaction importing treasury rewards from another chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsImportTx {
    /// Common fields; outputs are empty, imports only consume.
    pub base: BaseTx,
}

/// Every transaction kind the platform chain accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnsignedTx {
    /// Validator registration.
    AddValidator(AddValidatorTx),
    /// Subnet validator registration.
    AddSubnetValidator(AddSubnetValidatorTx),
    /// Bond release for a resolved validator.
    RewardValidator(RewardValidatorTx),
    /// Address role change.
    AddressState(AddressStateTx),
    /// Deposit creation.
    Deposit(DepositTx),
    /// Deposit release, user- or system-initiated.
    UnlockDeposit(UnlockDepositTx),
    /// Reward claim.
    Claim(ClaimTx),
    /// Node registration.
    RegisterNode(RegisterNodeTx),
    /// Treasury rewards import.
    RewardsImport(RewardsImportTx),
}

impl UnsignedTx {
    /// The consumed inputs, in canonical order.
    pub fn ins(&self) -> &[TransferableInput] {
        match self {
            UnsignedTx::AddValidator(tx) => &tx.base.ins,
            UnsignedTx::AddSubnetValidator(tx) => &tx.base.ins,
            UnsignedTx::RewardValidator(tx) => &tx.ins,
            UnsignedTx::AddressState(tx) => &tx.base.ins,
            UnsignedTx::Deposit(tx) => &tx.base.ins,
            UnsignedTx::UnlockDeposit(tx) => &tx.base.ins,
            UnsignedTx::Claim(tx) => &tx.base.ins,
            UnsignedTx::RegisterNode(tx) => &tx.base.ins,
            UnsignedTx::RewardsImport(tx) => &tx.base.ins,
        }
    }

    /// The produced outputs, in canonical order.
    pub fn outs(&self) -> &[TransferableOutput] {
        match self {
            UnsignedTx::AddValidator(tx) => &tx.base.outs,
            UnsignedTx::AddSubnetValidator(tx) => &tx.base.outs,
            UnsignedTx::RewardValidator(tx) => &tx.outs,
            UnsignedTx::AddressState(tx) => &tx.base.outs,
            UnsignedTx::Deposit(tx) => &tx.base.outs,
            UnsignedTx::UnlockDeposit(tx) => &tx.base.outs,
            UnsignedTx::Claim(tx) => &tx.base.outs,
            UnsignedTx::RegisterNode(tx) => &tx.base.outs,
            UnsignedTx::RewardsImport(tx) => &tx.base.outs,
        }
    }

    /// Check structural well-formedness against the chain identity.
    pub fn syntactic_verify(&self, ctx: &Context) -> Result<(), TxError> {
        match self {
            UnsignedTx::AddValidator(tx) => {
                tx.base.syntactic_verify(ctx)?;
                tx.validator.syntactic_verify()?;
                tx.rewards_owner.verify()?;
                Ok(())
            }
            UnsignedTx::AddSubnetValidator(tx) => {
                tx.base.syntactic_verify(ctx)?;
                tx.validator.validator.syntactic_verify()?;
                if tx.validator.subnet_id.is_empty() {
                    return Err(TxError::EmptySubnetId);
                }
                Ok(())
            }
            UnsignedTx::RewardValidator(tx) => {
                if tx.tx_id.is_empty() {
                    return Err(TxError::EmptyRewardTxId);
                }
                validate_inputs(&tx.ins, ctx)?;
                validate_outputs(&tx.outs, ctx)
            }
            UnsignedTx::AddressState(tx) => {
                tx.base.syntactic_verify(ctx)?;
                if tx.address.is_empty() {
                    return Err(TxError::EmptyTargetAddress);
                }
                if tx.state_bit >= 64 {
                    return Err(TxError::InvalidAddressStateBit(tx.state_bit));
                }
                Ok(())
            }
            UnsignedTx::Deposit(tx) => {
                tx.base.syntactic_verify(ctx)?;
                if tx.deposit_offer_id.is_empty() {
                    return Err(TxError::EmptyOfferId);
                }
                if tx.deposit_duration == 0 {
                    return Err(TxError::ZeroDepositDuration);
                }
                tx.rewards_owner.verify()?;
                Ok(())
            }
            UnsignedTx::UnlockDeposit(tx) => tx.base.syntactic_verify(ctx),
            UnsignedTx::Claim(tx) => {
                tx.base.syntactic_verify(ctx)?;
                if tx.claimable_owner_ids.len() != tx.claimed_amounts.len() {
                    return Err(TxError::ClaimAmountsMismatch);
                }
                if tx.deposit_tx_ids.is_empty() && tx.claimable_owner_ids.is_empty() {
                    return Err(TxError::EmptyClaim);
                }
                let deposits: BTreeSet<&TxId> = tx.deposit_tx_ids.iter().collect();
                let owners: BTreeSet<&OwnerId> = tx.claimable_owner_ids.iter().collect();
                if deposits.len() != tx.deposit_tx_ids.len()
                    || owners.len() != tx.claimable_owner_ids.len()
                {
                    return Err(TxError::DuplicateClaimIds);
                }
                if tx.claimed_amounts.iter().any(|amount| *amount == 0) {
                    return Err(TxError::ZeroAmount);
                }
                tx.claim_to.verify()?;
                Ok(())
            }
            UnsignedTx::RegisterNode(tx) => {
                tx.base.syntactic_verify(ctx)?;
                if tx.old_node_id.is_empty() && tx.new_node_id.is_empty() {
                    return Err(TxError::EmptyNodeChange);
                }
                if tx.consortium_member_address.is_empty() {
                    return Err(TxError::EmptyConsortiumMember);
                }
                if !tx.consortium_member_auth.windows(2).all(|w| w[0] < w[1]) {
                    return Err(TxError::UnsortedSigIndices);
                }
                Ok(())
            }
            UnsignedTx::RewardsImport(tx) => {
                tx.base.syntactic_verify(ctx)?;
                if tx.base.ins.is_empty() {
                    return Err(TxError::NoImportInputs);
                }
                if !tx.base.outs.is_empty() {
                    return Err(TxError::ImportWithOutputs);
                }
                Ok(())
            }
        }
    }

    // How many credentials a signed transaction of this kind carries:
    // one per input plus the kind's trailing role credentials. Subnet
    // validator registrations carry the node credential only on networks
    // that demand node signatures, hence the range.
    fn expected_credentials(&self) -> (usize, usize) {
        let ins = self.ins().len();
        match self {
            UnsignedTx::RewardValidator(_) | UnsignedTx::RewardsImport(_) => (0, 0),
            UnsignedTx::Claim(_) => (ins + 1, ins + 1),
            UnsignedTx::RegisterNode(tx) => {
                let n = ins + 1 + usize::from(!tx.new_node_id.is_empty());
                (n, n)
            }
            UnsignedTx::AddSubnetValidator(_) => (ins, ins + 1),
            _ => (ins, ins),
        }
    }
}

/// A signed transaction: the unsigned body plus its credentials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    /// The unsigned transaction body.
    pub unsigned: UnsignedTx,
    /// One credential per input, then trailing role credentials in the
    /// kind's declared order.
    pub creds: Vec<Credential>,
}

impl Tx {
    /// Sign `unsigned` with one signer list per credential slot.
    ///
    /// An empty signer list yields an empty credential (system-built
    /// inputs); signing with a selection-only fake key fails.
    pub fn sign(unsigned: UnsignedTx, signers: &[Vec<SpendKey>]) -> Result<Tx, TxError> {
        let digest = signing_digest(&unsigned)?;

        let mut creds = Vec::with_capacity(signers.len());
        for signer_list in signers {
            let signatures = signer_list
                .iter()
                .map(|key| key.sign(&digest))
                .collect::<Result<Vec<_>, _>>()?;
            creds.push(Credential { signatures });
        }

        Ok(Tx { unsigned, creds })
    }

    /// The digest the credentials sign.
    pub fn signing_digest(&self) -> Result<[u8; 32], TxError> {
        signing_digest(&self.unsigned)
    }

    /// The signed wire bytes.
    pub fn bytes(&self) -> Result<Vec<u8>, TxError> {
        Ok(codec::marshal(codec::CODEC_VERSION, self)?)
    }

    /// The transaction id: SHA-256 of the signed wire bytes.
    pub fn id(&self) -> Result<TxId, TxError> {
        Ok(Id::sha256(&self.bytes()?))
    }

    /// Check structural well-formedness, including the credential layout.
    pub fn syntactic_verify(&self, ctx: &Context) -> Result<(), TxError> {
        self.unsigned.syntactic_verify(ctx)?;

        let (min, max) = self.unsigned.expected_credentials();
        if self.creds.len() < min || self.creds.len() > max {
            return Err(TxError::WrongCredentialCount {
                expected: min,
                got: self.creds.len(),
            });
        }
        Ok(())
    }
}

fn signing_digest(unsigned: &UnsignedTx) -> Result<[u8; 32], TxError> {
    let bytes = codec::marshal(codec::CODEC_VERSION, unsigned)?;
    Ok(Sha256::digest(&bytes).into())
}
