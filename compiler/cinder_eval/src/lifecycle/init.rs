//! Contract initialization.

use cinder_ir::{ContractModule, Name, Type};

use super::library::load_libraries;
use super::ContractState;
use crate::blockchain::BlockchainContext;
use crate::engine::Engine;
use crate::errors::{
    constraint_failed, non_serializable, parameter_mismatch, reserved_name, unknown_field,
    value_type_mismatch, EvalNote, EvalResult, Failure,
};
use crate::interpreter::{Interpreter, BALANCE_FIELD};
use crate::state::FieldState;
use crate::value::Value;

/// Implicit contract parameter holding the contract's own address.
pub const THIS_ADDRESS: &str = "_this_address";
/// Implicit contract parameter holding the block the contract was created in.
pub const CREATION_BLOCK: &str = "_creation_block";

/// Inputs to contract initialization.
#[derive(Clone, Copy, Debug)]
pub struct InitRequest<'a> {
    /// One value per contract parameter, implicit parameters included.
    pub args: &'a [(Name, Value)],
    /// Persisted field values to resume from, if any.
    pub current_fields: Option<&'a [FieldState]>,
    pub balance: u128,
    /// Raw blockchain facts; validated against the fixed schema.
    pub blockchain: &'a [(Name, Value)],
    pub gas_limit: u64,
}

/// A successfully initialized contract.
#[derive(Clone, Debug)]
pub struct Initialized {
    pub state: ContractState,
    pub remaining_gas: u64,
}

impl Engine {
    /// Load libraries, bind parameters, check the constraint and compute the
    /// initial fields of `module`.
    #[tracing::instrument(level = "debug", skip_all, fields(contract = %module.contract.name))]
    pub fn init_contract(
        &self,
        module: &ContractModule,
        request: InitRequest<'_>,
    ) -> Result<Initialized, Failure> {
        let mut interp = self.base_interpreter(request.gas_limit);
        match initialize(&mut interp, module, &request) {
            Ok(state) => {
                tracing::debug!(
                    fields = state.fields.len(),
                    remaining_gas = interp.remaining_gas(),
                    "contract initialized"
                );
                Ok(Initialized {
                    state,
                    remaining_gas: interp.remaining_gas(),
                })
            }
            Err(error) => Err(Failure::new(error, interp.remaining_gas())),
        }
    }
}

fn initialize(
    interp: &mut Interpreter<'_>,
    module: &ContractModule,
    request: &InitRequest<'_>,
) -> EvalResult<ContractState> {
    BlockchainContext::from_facts(request.blockchain)?;
    let contract = &module.contract;

    let lib_env = load_libraries(interp, &module.imports, module.library.as_ref())?;

    interp.prelude().check_params(&contract.params)?;
    let mut params = contract.params.clone();
    params.push((Name::new(THIS_ADDRESS), Type::address()));
    params.push((Name::new(CREATION_BLOCK), Type::bnum()));
    let args = bind_arguments(&params, request.args)?;
    let env = lib_env.bind_all(args);

    let holds = interp.eval(&contract.constraint, &env)?;
    if holds.as_bool() != Some(true) {
        return Err(constraint_failed());
    }

    let mut fields: Vec<FieldState> = Vec::with_capacity(contract.fields.len());
    for decl in &contract.fields {
        if decl.name == BALANCE_FIELD || interp.prelude().is_reserved(&decl.name) {
            return Err(reserved_name(&decl.name));
        }
        if fields.iter().any(|f| f.name == decl.name) {
            return Err(parameter_mismatch(format!("field {} declared twice", decl.name)));
        }
        let value = interp.eval(&decl.init, &env)?;
        if !value.is_pure() {
            return Err(non_serializable(format!("field {}", decl.name)));
        }
        let ty = value.type_of()?;
        if ty != decl.ty {
            return Err(value_type_mismatch(&decl.ty, &ty)
                .with_note(EvalNote::new(format!("initializer of field {}", decl.name))));
        }
        fields.push(FieldState {
            name: decl.name.clone(),
            ty: decl.ty.clone(),
            value,
        });
    }

    if let Some(current) = request.current_fields {
        reconcile(&mut fields, current)?;
    }

    Ok(ContractState {
        env,
        fields,
        balance: request.balance,
        datatypes: interp.datatypes_handle(),
    })
}

/// Match each declared parameter with exactly one argument of its type.
fn bind_arguments(
    params: &[(Name, Type)],
    args: &[(Name, Value)],
) -> EvalResult<Vec<(Name, Value)>> {
    for (i, (name, _)) in params.iter().enumerate() {
        if params[..i].iter().any(|(earlier, _)| earlier == name) {
            return Err(parameter_mismatch(format!("parameter {name} declared twice")));
        }
    }
    for (i, (name, _)) in args.iter().enumerate() {
        if args[..i].iter().any(|(earlier, _)| earlier == name) {
            return Err(parameter_mismatch(format!("argument {name} supplied twice")));
        }
        if !params.iter().any(|(param, _)| param == name) {
            return Err(parameter_mismatch(format!("unexpected argument {name}")));
        }
    }
    params
        .iter()
        .map(|(name, ty)| {
            let value = args
                .iter()
                .find(|(arg, _)| arg == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| parameter_mismatch(format!("missing argument {name}")))?;
            check_argument(name, ty, &value)?;
            Ok((name.clone(), value))
        })
        .collect()
}

/// Fail unless `value` is a pure value of type `ty`.
pub(super) fn check_argument(name: &Name, ty: &Type, value: &Value) -> EvalResult<()> {
    if !value.is_pure() {
        return Err(non_serializable(format!("argument {name}")));
    }
    let got = value.type_of()?;
    if got != *ty {
        return Err(parameter_mismatch(format!(
            "argument {name} has type {got}, expected {ty}"
        )));
    }
    Ok(())
}

/// Overwrite initializer values with persisted ones.
///
/// Every persisted field must be declared with the same type, hold a value
/// of that type and appear once. Declared fields with no persisted value keep their initializer.
fn reconcile(fields: &mut [FieldState], current: &[FieldState]) -> EvalResult<()> {
    for (i, persisted) in current.iter().enumerate() {
        if current[..i].iter().any(|f| f.name == persisted.name) {
            return Err(parameter_mismatch(format!(
                "field {} appears twice in the current state",
                persisted.name
            )));
        }
        let slot = fields
            .iter_mut()
            .find(|f| f.name == persisted.name)
            .ok_or_else(|| unknown_field(&persisted.name))?;
        if slot.ty != persisted.ty {
            return Err(value_type_mismatch(&slot.ty, &persisted.ty)
                .with_note(EvalNote::new(format!("current value of field {}", persisted.name))));
        }
        if !persisted.value.is_pure() {
            return Err(non_serializable(format!("field {}", persisted.name)));
        }
        let got = persisted.value.type_of()?;
        if got != persisted.ty {
            return Err(value_type_mismatch(&persisted.ty, &got)
                .with_note(EvalNote::new(format!("current value of field {}", persisted.name))));
        }
        slot.value = persisted.value.clone();
    }
    Ok(())
}
