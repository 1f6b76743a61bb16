use crate::blockchain::core::chain::{Block, GENESIS_PREVIOUS_HASH};
use crate::error::ChainError;
use crate::miner::meets_difficulty;

/// Validate a full block sequence, oldest first.
///
/// The first block must be the genesis mint; every later block must link to
/// its predecessor's hash and carry a valid proof-of-work.
pub fn validate_chain(blocks: &[Block]) -> Result<(), ChainError> {
    let genesis = blocks.first().ok_or(ChainError::EmptyChain)?;
    if !genesis.is_genesis() {
        return Err(ChainError::InvalidBlock(
            "First block is not a genesis mint".to_string(),
        ));
    }

    let mut previous_hash = genesis.hash()?;
    for (height, block) in blocks.iter().enumerate().skip(1) {
        if block.previous_hash != previous_hash {
            return Err(ChainError::InvalidBlock(format!(
                "Block {} links to {}, expected {}",
                height,
                hex::encode(block.previous_hash),
                hex::encode(previous_hash)
            )));
        }
        if block.previous_hash == GENESIS_PREVIOUS_HASH || block.transaction.is_genesis_mint() {
            return Err(ChainError::InvalidBlock(format!(
                "Block {} is a second genesis block",
                height
            )));
        }
        if !meets_difficulty(block.nonce, block.proof) {
            return Err(ChainError::InvalidBlock(format!(
                "Block {} has an invalid proof of work",
                height
            )));
        }
        previous_hash = block.hash()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::miner::proof_of_work;
    use crate::transaction::Transaction;

    fn mined_child(parent: &Block, amount: u64) -> Block {
        let tx = Transaction::new(
            amount,
            KeyPair::generate().account_key(),
            KeyPair::generate().account_key(),
        );
        let mut block = Block::new(parent.hash().unwrap(), tx);
        block.proof = proof_of_work(block.nonce);
        block
    }

    fn sample_chain() -> Vec<Block> {
        let genesis = Block::genesis(1000, KeyPair::generate().account_key());
        let first = mined_child(&genesis, 10);
        let second = mined_child(&first, 20);
        vec![genesis, first, second]
    }

    #[test]
    fn test_valid_chain() {
        assert!(validate_chain(&sample_chain()).is_ok());
    }

    #[test]
    fn test_empty_chain() {
        assert_eq!(validate_chain(&[]).unwrap_err(), ChainError::EmptyChain);
    }

    #[test]
    fn test_tampered_block_breaks_linkage() {
        let mut chain = sample_chain();
        chain[1].transaction.amount = 10_000;

        let err = validate_chain(&chain).unwrap_err().to_string();
        assert!(err.contains("Block 2 links to"));
    }

    #[test]
    fn test_missing_proof_detected() {
        let mut chain = sample_chain();
        let genesis_hash = chain[0].hash().unwrap();
        let mut forged = Block::new(genesis_hash, chain[1].transaction.clone());
        while proof_of_work(forged.nonce) == 0 {
            forged.nonce += 1;
        }
        // Every value below the smallest solution misses the target.
        forged.proof = proof_of_work(forged.nonce) - 1;

        chain.truncate(1);
        chain.push(forged);
        let err = validate_chain(&chain).unwrap_err().to_string();
        assert!(err.contains("invalid proof of work"));
    }

    #[test]
    fn test_first_block_must_be_genesis() {
        let chain = sample_chain();
        assert!(validate_chain(&chain[1..]).is_err());
    }
}
