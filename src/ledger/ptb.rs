// ledger/ptb.rs
//! Minimal BCS layout of a Sui `TransactionKind` holding one move call.
//!
//! Only the pieces needed for read-only predicate calls are modelled. Variant
//! order matters: BCS writes the declaration index, so every enum lists the
//! on-chain variants up to the last one we use.

use serde::Serialize;

use crate::{
    ledger::{
        types::CallTarget,
        LedgerError,
    },
    utils::address::address_bytes,
};

#[derive(Debug, Serialize)]
enum TransactionKind {
    ProgrammableTransaction(ProgrammableTransaction),
}

#[derive(Debug, Serialize)]
struct ProgrammableTransaction {
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
}

#[derive(Debug, Serialize)]
enum CallArg {
    Pure(Vec<u8>),
    Object(ObjectArg),
}

#[allow(dead_code)]
#[derive(Debug, Serialize)]
enum ObjectArg {
    ImmOrOwnedObject(([u8; 32], u64, Vec<u8>)),
    SharedObject {
        id: [u8; 32],
        initial_shared_version: u64,
        mutable: bool,
    },
}

#[derive(Debug, Serialize)]
enum Command {
    MoveCall(Box<ProgrammableMoveCall>),
}

#[derive(Debug, Serialize)]
struct ProgrammableMoveCall {
    package: [u8; 32],
    module: String,
    function: String,
    type_arguments: Vec<TypeTag>,
    arguments: Vec<Argument>,
}

#[allow(dead_code)]
#[derive(Debug, Serialize)]
enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
}

#[allow(dead_code)]
#[derive(Debug, Serialize)]
enum Argument {
    GasCoin,
    Input(u16),
}

/// An argument with everything needed to encode it. Shared objects need their
/// `initial_shared_version`, which the caller looks up beforehand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedArg {
    Shared { id: String, initial_shared_version: u64 },
    Address(String),
    U64(u64),
}

impl ResolvedArg {
    fn into_call_arg(self) -> Result<CallArg, LedgerError> {
        match self {
            ResolvedArg::Shared { id, initial_shared_version } => Ok(CallArg::Object(ObjectArg::SharedObject {
                id: address_bytes(&id).map_err(LedgerError::InvalidId)?,
                initial_shared_version,
                mutable: false,
            })),
            ResolvedArg::Address(address) => {
                let bytes = address_bytes(&address).map_err(LedgerError::InvalidId)?;
                Ok(CallArg::Pure(bytes.to_vec()))
            }
            ResolvedArg::U64(value) => Ok(CallArg::Pure(value.to_le_bytes().to_vec())),
        }
    }
}

/// BCS bytes of a `TransactionKind` calling `target` once with `args` as inputs.
pub fn encode_move_call(target: &CallTarget, args: Vec<ResolvedArg>) -> Result<Vec<u8>, LedgerError> {
    let arguments = (0..args.len())
        .map(|i| u16::try_from(i).map(Argument::Input))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| LedgerError::Malformed("too many call arguments".to_string()))?;

    let inputs = args
        .into_iter()
        .map(ResolvedArg::into_call_arg)
        .collect::<Result<Vec<_>, _>>()?;

    let kind = TransactionKind::ProgrammableTransaction(ProgrammableTransaction {
        inputs,
        commands: vec![Command::MoveCall(Box::new(ProgrammableMoveCall {
            package: address_bytes(&target.package).map_err(LedgerError::InvalidId)?,
            module: target.module.clone(),
            function: target.function.clone(),
            type_arguments: Vec::new(),
            arguments,
        }))],
    });

    bcs::to_bytes(&kind).map_err(|e| LedgerError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_move_call_layout() {
        let target = CallTarget {
            package: "0x1".to_string(),
            module: "m".to_string(),
            function: "f".to_string(),
        };
        let bytes = encode_move_call(&target, vec![ResolvedArg::Address("0x2".to_string())]).unwrap();

        // kind=0, 1 input, Pure=0, 32-byte vector
        assert_eq!(&bytes[..4], &[0, 1, 0, 32]);
        assert_eq!(bytes[4 + 31], 2);
        let rest = &bytes[4 + 32..];
        // 1 command, MoveCall=0, package bytes
        assert_eq!(&rest[..2], &[1, 0]);
        assert_eq!(rest[2 + 31], 1);
        let tail = &rest[2 + 32..];
        // "m", "f", no type args, 1 argument Input(0)
        assert_eq!(tail, &[1, b'm', 1, b'f', 0, 1, 1, 0, 0]);
    }

    #[test]
    fn test_shared_object_arg() {
        let target = CallTarget {
            package: "0x1".to_string(),
            module: "m".to_string(),
            function: "f".to_string(),
        };
        let bytes = encode_move_call(
            &target,
            vec![ResolvedArg::Shared { id: "0x5".to_string(), initial_shared_version: 7 }],
        )
        .unwrap();

        // kind=0, 1 input, Object=1, SharedObject=1
        assert_eq!(&bytes[..4], &[0, 1, 1, 1]);
        assert_eq!(bytes[4 + 31], 5);
        assert_eq!(&bytes[36..44], &7u64.to_le_bytes());
        assert_eq!(bytes[44], 0);
    }

    #[test]
    fn test_invalid_package_is_rejected() {
        let target = CallTarget {
            package: "not-hex".to_string(),
            module: "m".to_string(),
            function: "f".to_string(),
        };
        assert!(matches!(encode_move_call(&target, Vec::new()), Err(LedgerError::InvalidId(_))));
    }
}
