// Copyright (c) 2024-2026 The Meridian Foundation

//! Structural validation and canonical ordering helpers.
//!
//! Inputs sort by the `(tx_id, output_index)` of the UTXO they consume;
//! outputs sort by their canonical codec bytes. Every produced transaction
//! must already be in canonical order, so sorting is done once at build
//! time and only *checked* at verification time.

use crate::codec;
use crate::error::TxError;
use crate::tx::Context;
use mrd_crypto_keys::SpendKey;
use mrd_platform_types::{Output, TransferableInput, TransferableOutput};

/// Sort inputs by consumed UTXO id.
pub fn sort_transferable_inputs(ins: &mut [TransferableInput]) {
    ins.sort_by_key(|input| input.utxo_id);
}

/// Sort inputs by consumed UTXO id, permuting the per-input signer lists
/// alongside.
pub fn sort_transferable_inputs_with_signers(
    ins: &mut Vec<TransferableInput>,
    signers: &mut Vec<Vec<SpendKey>>,
) {
    debug_assert_eq!(ins.len(), signers.len());
    let mut order: Vec<usize> = (0..ins.len()).collect();
    order.sort_by_key(|&i| ins[i].utxo_id);

    let mut sorted_ins = Vec::with_capacity(ins.len());
    let mut sorted_signers = Vec::with_capacity(signers.len());
    for i in order {
        sorted_ins.push(ins[i].clone());
        sorted_signers.push(signers[i].clone());
    }
    *ins = sorted_ins;
    *signers = sorted_signers;
}

/// Sort outputs by canonical codec bytes.
pub fn sort_transferable_outputs(outs: &mut Vec<TransferableOutput>) -> Result<(), TxError> {
    let mut keyed: Vec<(Vec<u8>, TransferableOutput)> = outs
        .drain(..)
        .map(|out| Ok((codec::sort_key(&out)?, out)))
        .collect::<Result<_, TxError>>()?;
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    *outs = keyed.into_iter().map(|(_, out)| out).collect();
    Ok(())
}

/// Sum of consumed amounts.
pub fn sum_inputs(ins: &[TransferableInput]) -> u64 {
    ins.iter().map(|input| input.input.amount()).sum()
}

/// Sum of produced amounts.
pub fn sum_outputs(outs: &[TransferableOutput]) -> u64 {
    outs.iter().map(|out| out.out.amount()).sum()
}

/// Check inputs: right asset, nonzero amounts, sorted unique signature
/// indices, canonical input order.
pub fn validate_inputs(ins: &[TransferableInput], ctx: &Context) -> Result<(), TxError> {
    for input in ins {
        if input.asset_id != ctx.asset_id {
            return Err(TxError::WrongAssetId);
        }
        if input.input.amount() == 0 {
            return Err(TxError::ZeroAmount);
        }
        let indices = input.input.sig_indices();
        if !indices.windows(2).all(|w| w[0] < w[1]) {
            return Err(TxError::UnsortedSigIndices);
        }
    }
    if !ins.windows(2).all(|w| w[0].utxo_id < w[1].utxo_id) {
        return Err(TxError::UnsortedInputs);
    }
    Ok(())
}

/// Check outputs: right asset, nonzero amounts, well-formed owners, locked
/// outputs actually locked, canonical output order.
pub fn validate_outputs(outs: &[TransferableOutput], ctx: &Context) -> Result<(), TxError> {
    for out in outs {
        if out.asset_id != ctx.asset_id {
            return Err(TxError::WrongAssetId);
        }
        if out.out.amount() == 0 {
            return Err(TxError::ZeroAmount);
        }
        out.out.owners().verify()?;
        if let Output::Locked(locked) = &out.out {
            if !locked.lock_ids.lock_state().is_locked() {
                return Err(TxError::EmptyLockIds);
            }
        }
    }

    let mut previous: Option<Vec<u8>> = None;
    for out in outs {
        let key = codec::sort_key(out)?;
        if let Some(ref prev) = previous {
            if *prev > key {
                return Err(TxError::UnsortedOutputs);
            }
        }
        previous = Some(key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrd_core_types::Id;
    use mrd_platform_types::{Input, OutputOwners, UtxoId};
    use mrd_core_types::ShortId;

    fn ctx() -> Context {
        Context {
            network_id: 1,
            blockchain_id: Id([2; 32]),
            asset_id: Id([3; 32]),
        }
    }

    fn input(tx_byte: u8, index: u32, amount: u64, sig_indices: Vec<u32>) -> TransferableInput {
        TransferableInput {
            utxo_id: UtxoId::new(Id([tx_byte; 32]), index),
            asset_id: Id([3; 32]),
            input: Input::transfer(amount, sig_indices),
        }
    }

    fn output(amount: u64, owner_byte: u8) -> TransferableOutput {
        TransferableOutput {
            asset_id: Id([3; 32]),
            out: Output::transfer(amount, OutputOwners::single(ShortId([owner_byte; 20]))),
        }
    }

    #[test]
    fn test_sort_inputs_with_signers_permutes_together() {
        let mut ins = vec![input(2, 0, 10, vec![0]), input(1, 1, 20, vec![0])];
        let mut signers: Vec<Vec<SpendKey>> = vec![
            vec![SpendKey::Fake(ShortId([2; 20]))],
            vec![SpendKey::Fake(ShortId([1; 20]))],
        ];

        sort_transferable_inputs_with_signers(&mut ins, &mut signers);

        assert_eq!(ins[0].utxo_id.tx_id, Id([1; 32]));
        assert_eq!(signers[0][0].address(), ShortId([1; 20]));
        assert_eq!(signers[1][0].address(), ShortId([2; 20]));
    }

    #[test]
    fn test_sorted_outputs_validate() {
        let mut outs = vec![output(5, 9), output(3, 1), output(4, 4)];
        sort_transferable_outputs(&mut outs).unwrap();
        assert!(validate_outputs(&outs, &ctx()).is_ok());
    }

    #[test]
    fn test_unsorted_inputs_rejected() {
        let ins = vec![input(2, 0, 10, vec![0]), input(1, 0, 20, vec![0])];
        assert!(matches!(
            validate_inputs(&ins, &ctx()),
            Err(TxError::UnsortedInputs)
        ));
    }

    #[test]
    fn test_duplicate_inputs_rejected() {
        let ins = vec![input(1, 0, 10, vec![0]), input(1, 0, 20, vec![0])];
        assert!(matches!(
            validate_inputs(&ins, &ctx()),
            Err(TxError::UnsortedInputs)
        ));
    }

    #[test]
    fn test_unsorted_sig_indices_rejected() {
        let ins = vec![input(1, 0, 10, vec![1, 0])];
        assert!(matches!(
            validate_inputs(&ins, &ctx()),
            Err(TxError::UnsortedSigIndices)
        ));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let ins = vec![input(1, 0, 0, vec![0])];
        assert!(matches!(
            validate_inputs(&ins, &ctx()),
            Err(TxError::ZeroAmount)
        ));

        let outs = vec![output(0, 1)];
        assert!(matches!(
            validate_outputs(&outs, &ctx()),
            Err(TxError::ZeroAmount)
        ));
    }

    #[test]
    fn test_wrong_asset_rejected() {
        let mut bad = output(5, 1);
        bad.asset_id = Id([9; 32]);
        assert!(matches!(
            validate_outputs(&[bad], &ctx()),
            Err(TxError::WrongAssetId)
        ));
    }

    #[test]
    fn test_sums() {
        let ins = vec![input(1, 0, 10, vec![0]), input(2, 0, 20, vec![0])];
        let outs = vec![output(5, 1), output(7, 2)];
        assert_eq!(sum_inputs(&ins), 30);
        assert_eq!(sum_outputs(&outs), 12);
    }
}
