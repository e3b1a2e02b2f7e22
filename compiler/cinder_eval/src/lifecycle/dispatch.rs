//! Message dispatch.

use std::sync::Arc;

use cinder_ir::{Component, ComponentKind, ContractModule, Name, Type};

use super::init::check_argument;
use super::ContractState;
use crate::blockchain::BlockchainContext;
use crate::config::Configuration;
use crate::engine::Engine;
use crate::errors::{
    insufficient_balance, integer_overflow, malformed_message, non_serializable,
    parameter_mismatch, unknown_transition, EvalResult, Failure,
};
use crate::interpreter::{check_unique_labels, Interpreter};
use crate::state::{FieldStore, StateBackend};
use crate::value::{Value, AMOUNT_LABEL, ORIGIN_LABEL, SENDER_LABEL, TAG_LABEL};

/// Effects of a transition run against a caller-provided backend.
#[derive(Clone, Debug)]
pub struct Execution {
    /// Balance after accepted funds are credited and sent amounts debited.
    pub balance: u128,
    pub messages: Vec<Value>,
    pub events: Vec<Value>,
    pub accepted: bool,
    pub remaining_gas: u64,
}

/// Result of handling one message.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub state: ContractState,
    pub messages: Vec<Value>,
    pub events: Vec<Value>,
    pub accepted: bool,
    pub remaining_gas: u64,
}

/// An incoming message split into implicit entries and transition arguments.
struct Incoming {
    tag: String,
    amount: u128,
    sender: Value,
    origin: Value,
    args: Vec<(Name, Value)>,
}

impl Engine {
    /// Run the transition `message` names against `state`.
    ///
    /// On failure `state` is untouched and the only output is the error with
    /// the gas remaining when it was raised.
    #[tracing::instrument(level = "debug", skip_all, fields(contract = %module.contract.name))]
    pub fn handle_message(
        &self,
        module: &ContractModule,
        state: &ContractState,
        message: &Value,
        blockchain: &BlockchainContext,
        gas_limit: u64,
    ) -> Result<Outcome, Failure> {
        let mut store = FieldStore::new(state.fields.clone());
        let execution =
            self.execute_transition(module, state, &mut store, message, blockchain, gas_limit)?;
        Ok(Outcome {
            state: ContractState {
                env: state.env.clone(),
                fields: store.into_fields(),
                balance: execution.balance,
                datatypes: Arc::clone(&state.datatypes),
            },
            messages: execution.messages,
            events: execution.events,
            accepted: execution.accepted,
            remaining_gas: execution.remaining_gas,
        })
    }

    /// Run the transition `message` names, reading and writing fields through
    /// `backend`.
    ///
    /// Writes already made through `backend` are not rolled back on failure;
    /// callers needing atomicity discard them, as `handle_message` does.
    pub fn execute_transition(
        &self,
        module: &ContractModule,
        state: &ContractState,
        backend: &mut dyn StateBackend,
        message: &Value,
        blockchain: &BlockchainContext,
        gas_limit: u64,
    ) -> Result<Execution, Failure> {
        let mut interp = self.interpreter(Arc::clone(&state.datatypes), gas_limit);
        match dispatch(&mut interp, module, state, backend, message, blockchain) {
            Ok(mut execution) => {
                execution.remaining_gas = interp.remaining_gas();
                Ok(execution)
            }
            Err(error) => {
                tracing::debug!(%error, "transition failed");
                Err(Failure::new(error, interp.remaining_gas()))
            }
        }
    }
}

fn dispatch(
    interp: &mut Interpreter<'_>,
    module: &ContractModule,
    state: &ContractState,
    backend: &mut dyn StateBackend,
    message: &Value,
    blockchain: &BlockchainContext,
) -> EvalResult<Execution> {
    let incoming = parse_message(message)?;
    tracing::debug!(tag = %incoming.tag, amount = incoming.amount, "dispatching message");

    // Procedures declared after the transition are out of its scope.
    let mut procedures = Vec::new();
    let mut transition: Option<&Component> = None;
    for component in &module.contract.components {
        match component.kind {
            ComponentKind::Procedure => procedures.push(Arc::new(component.clone())),
            ComponentKind::Transition if component.name == incoming.tag.as_str() => {
                transition = Some(component);
                break;
            }
            ComponentKind::Transition => {}
        }
    }
    let transition = transition.ok_or_else(|| unknown_transition(&incoming.tag))?;

    interp.prelude().check_params(&transition.params)?;
    let args = bind_transition_args(&transition.params, incoming.args)?;

    let env = state
        .env
        .bind_all([
            (Name::new(SENDER_LABEL), incoming.sender),
            (Name::new(ORIGIN_LABEL), incoming.origin),
            (Name::new(AMOUNT_LABEL), Value::uint128(incoming.amount)),
        ])
        .bind_all(args);

    let conf = Configuration {
        env,
        init_env: state.env.clone(),
        field_types: Arc::new(state.field_types()),
        balance: state.balance,
        blockchain: blockchain.clone(),
        incoming_funds: incoming.amount,
        procedures,
        call_stack: vec![transition.name.clone()],
        accepted: false,
        messages: Vec::new(),
        events: Vec::new(),
    };
    let conf = interp.exec_stmts(&transition.body, conf, backend)?;

    let mut balance = conf.balance;
    if conf.accepted {
        balance = balance
            .checked_add(conf.incoming_funds)
            .ok_or_else(|| integer_overflow("balance credit"))?;
    }
    let outgoing = conf
        .outgoing_total()
        .ok_or_else(|| integer_overflow("outgoing amount total"))?;
    if outgoing > balance {
        return Err(insufficient_balance(outgoing, balance));
    }
    let balance = balance - outgoing;
    tracing::debug!(
        balance,
        outgoing,
        accepted = conf.accepted,
        messages = conf.messages.len(),
        events = conf.events.len(),
        "balance reconciled"
    );

    Ok(Execution {
        balance,
        messages: conf.messages,
        events: conf.events,
        accepted: conf.accepted,
        remaining_gas: 0,
    })
}

fn parse_message(message: &Value) -> EvalResult<Incoming> {
    let entries = message.as_message().ok_or_else(|| {
        malformed_message(format!("expected a message, got {}", message.kind_name()))
    })?;
    check_unique_labels(entries)?;
    if !message.is_pure() {
        return Err(non_serializable("incoming message"));
    }

    let mut tag = None;
    let mut amount = None;
    let mut sender = None;
    let mut origin = None;
    let mut args = Vec::new();
    for (label, value) in entries {
        match label.as_str() {
            TAG_LABEL => {
                let text = value
                    .as_str()
                    .ok_or_else(|| malformed_message(format!("{TAG_LABEL} must be a String")))?;
                tag = Some(text.to_string());
            }
            AMOUNT_LABEL => {
                let funds = value.as_uint128().ok_or_else(|| {
                    malformed_message(format!("{AMOUNT_LABEL} must be a Uint128"))
                })?;
                amount = Some(funds);
            }
            SENDER_LABEL => sender = Some(address_entry(SENDER_LABEL, value)?),
            ORIGIN_LABEL => origin = Some(address_entry(ORIGIN_LABEL, value)?),
            _ => args.push((label.clone(), value.clone())),
        }
    }

    let tag = tag.ok_or_else(|| malformed_message(format!("missing entry {TAG_LABEL}")))?;
    let amount = amount.ok_or_else(|| malformed_message(format!("missing entry {AMOUNT_LABEL}")))?;
    let sender = sender.unwrap_or_else(|| Value::address([0; 20]));
    let origin = origin.unwrap_or_else(|| sender.clone());
    Ok(Incoming {
        tag,
        amount,
        sender,
        origin,
        args,
    })
}

fn address_entry(label: &str, value: &Value) -> EvalResult<Value> {
    if value.type_of()? != Type::address() {
        return Err(malformed_message(format!("{label} must be a ByStr20")));
    }
    Ok(value.clone())
}

/// Pair each transition parameter with the message entry of the same name.
fn bind_transition_args(
    params: &[(Name, Type)],
    args: Vec<(Name, Value)>,
) -> EvalResult<Vec<(Name, Value)>> {
    if let Some((extra, _)) = args
        .iter()
        .find(|(label, _)| !params.iter().any(|(param, _)| param == label))
    {
        return Err(parameter_mismatch(format!("unexpected entry {extra}")));
    }
    params
        .iter()
        .map(|(name, ty)| {
            let value = args
                .iter()
                .find(|(label, _)| label == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| parameter_mismatch(format!("missing entry {name}")))?;
            check_argument(name, ty, &value)?;
            Ok((name.clone(), value))
        })
        .collect()
}
