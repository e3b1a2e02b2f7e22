//! Read-only blockchain facts visible to a contract.

use cinder_ir::Name;

use crate::errors::{malformed_blockchain_context, type_mismatch, unbound_name, EvalResult};
use crate::value::Value;

/// Name of the current block number fact.
pub const BLOCKNUMBER: &str = "BLOCKNUMBER";

/// Snapshot of chain facts for one invocation.
///
/// The schema is fixed: exactly one `BLOCKNUMBER` fact holding a `BNum`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockchainContext {
    block_number: u64,
}

impl BlockchainContext {
    pub fn new(block_number: u64) -> Self {
        BlockchainContext { block_number }
    }

    /// Build a context from raw facts, rejecting missing or extra entries.
    pub fn from_facts(facts: &[(Name, Value)]) -> EvalResult<Self> {
        let mut block_number = None;
        for (name, value) in facts {
            if name != BLOCKNUMBER {
                return Err(malformed_blockchain_context(format!(
                    "unexpected fact {name}"
                )));
            }
            if block_number.is_some() {
                return Err(malformed_blockchain_context(format!(
                    "duplicate fact {name}"
                )));
            }
            let Value::BNum(n) = value else {
                return Err(type_mismatch("BNum", value.kind_name()));
            };
            block_number = Some(*n);
        }
        block_number
            .map(BlockchainContext::new)
            .ok_or_else(|| malformed_blockchain_context(format!("missing fact {BLOCKNUMBER}")))
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Read the fact called `name`.
    pub fn lookup(&self, name: &Name) -> EvalResult<Value> {
        if name == BLOCKNUMBER {
            Ok(Value::BNum(self.block_number))
        } else {
            Err(unbound_name(name))
        }
    }
}

impl Default for BlockchainContext {
    fn default() -> Self {
        BlockchainContext::new(0)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::errors::EvalErrorKind;

    fn fact(name: &str, value: Value) -> (Name, Value) {
        (Name::new(name), value)
    }

    #[test]
    fn test_exact_schema_accepted() {
        let ctx = BlockchainContext::from_facts(&[fact(BLOCKNUMBER, Value::BNum(42))]).unwrap();
        assert_eq!(ctx.block_number(), 42);
        assert_eq!(
            ctx.lookup(&Name::new(BLOCKNUMBER)).unwrap(),
            Value::BNum(42)
        );
    }

    #[test]
    fn test_missing_and_extra_facts_rejected() {
        let missing = BlockchainContext::from_facts(&[]).unwrap_err();
        assert!(matches!(
            missing.kind,
            EvalErrorKind::MalformedBlockchainContext { .. }
        ));
        let extra = BlockchainContext::from_facts(&[
            fact(BLOCKNUMBER, Value::BNum(1)),
            fact("TIMESTAMP", Value::BNum(2)),
        ])
        .unwrap_err();
        assert!(matches!(
            extra.kind,
            EvalErrorKind::MalformedBlockchainContext { .. }
        ));
    }

    #[test]
    fn test_default_is_block_zero() {
        assert_eq!(BlockchainContext::default().block_number(), 0);
    }
}
