//! Statement execution.
//!
//! Statements thread a `Configuration` by value: each one consumes the
//! current configuration and returns the next. Field access goes through the
//! `StateBackend` passed alongside.

use std::sync::Arc;

use cinder_ir::{Name, Stmt, StmtKind, Type};

use super::{match_pattern, Interpreter};
use crate::config::Configuration;
use crate::environment::Env;
use crate::errors::{
    arity_mismatch, malformed_message, non_exhaustive_match, non_serializable, type_mismatch,
    unknown_procedure, user_abort, EvalBacktrace, EvalResult,
};
use crate::gas::eval_cost;
use crate::observer::EvalEvent;
use crate::state::StateBackend;
use crate::value::{
    Value, AMOUNT_LABEL, EVENTNAME_LABEL, ORIGIN_LABEL, RECIPIENT_LABEL, SENDER_LABEL, TAG_LABEL,
};

/// Pseudo-field holding the contract balance. Readable, never writable.
pub const BALANCE_FIELD: &str = "_balance";

/// Check that `msg` can leave the contract as an outgoing message.
pub fn validate_outgoing(msg: &Value) -> EvalResult<()> {
    let Some(entries) = msg.as_message() else {
        return Err(type_mismatch("Message", msg.kind_name()));
    };
    if !msg.is_pure() {
        return Err(non_serializable("outgoing message"));
    }
    check_unique_labels(entries)?;
    if msg.message_entry(TAG_LABEL).and_then(Value::as_str).is_none() {
        return Err(malformed_message(format!("missing String entry {TAG_LABEL}")));
    }
    if msg.message_entry(RECIPIENT_LABEL).is_none() {
        return Err(malformed_message(format!("missing entry {RECIPIENT_LABEL}")));
    }
    if msg
        .message_entry(AMOUNT_LABEL)
        .and_then(Value::as_uint128)
        .is_none()
    {
        return Err(malformed_message(format!("missing Uint128 entry {AMOUNT_LABEL}")));
    }
    Ok(())
}

/// Check that `event` can be emitted.
pub fn validate_event(event: &Value) -> EvalResult<()> {
    let Some(entries) = event.as_message() else {
        return Err(type_mismatch("Message", event.kind_name()));
    };
    if !event.is_pure() {
        return Err(non_serializable("event"));
    }
    check_unique_labels(entries)?;
    if event
        .message_entry(EVENTNAME_LABEL)
        .and_then(Value::as_str)
        .is_none()
    {
        return Err(malformed_message(format!(
            "missing String entry {EVENTNAME_LABEL}"
        )));
    }
    Ok(())
}

pub(crate) fn check_unique_labels(entries: &[(Name, Value)]) -> EvalResult<()> {
    for (i, (label, _)) in entries.iter().enumerate() {
        if entries[..i].iter().any(|(earlier, _)| earlier == label) {
            return Err(malformed_message(format!("duplicate entry {label}")));
        }
    }
    Ok(())
}

/// Type of the value stored `depth` levels deep in a map of type `ty`.
fn nested_value_type(ty: &Type, depth: usize) -> EvalResult<Type> {
    let mut current = ty;
    for _ in 0..depth {
        match current {
            Type::Map(_, val) => current = val,
            other => return Err(type_mismatch("Map", other)),
        }
    }
    Ok(current.clone())
}

fn lookup_all(env: &Env, names: &[Name]) -> EvalResult<Vec<Value>> {
    names.iter().map(|name| env.lookup(name)).collect()
}

impl Interpreter<'_> {
    /// Run `stmts` in order, returning the final configuration.
    pub fn exec_stmts(
        &mut self,
        stmts: &[Stmt],
        mut conf: Configuration,
        backend: &mut dyn StateBackend,
    ) -> EvalResult<Configuration> {
        for stmt in stmts {
            conf = self
                .exec_stmt(stmt, conf, backend)
                .map_err(|e| e.or_span(stmt.span))?;
        }
        Ok(conf)
    }

    fn exec_stmt(
        &mut self,
        stmt: &Stmt,
        mut conf: Configuration,
        backend: &mut dyn StateBackend,
    ) -> EvalResult<Configuration> {
        match &stmt.kind {
            StmtKind::Load { local, field } => {
                let value = if field == BALANCE_FIELD {
                    Value::uint128(conf.balance)
                } else {
                    conf.field_type(field)?;
                    backend.load(field)?
                };
                conf.env = conf.env.bind(local.clone(), value);
            }
            StmtKind::Store { field, local } => {
                conf.field_type(field)?;
                let value = conf.env.lookup(local)?;
                if !value.is_pure() {
                    return Err(non_serializable(format!("field {field}")));
                }
                backend.store(field, value)?;
            }
            StmtKind::Bind { local, expr } => {
                let value = self.eval(expr, &conf.env)?;
                conf.env = conf.env.bind(local.clone(), value);
            }
            StmtKind::MapUpdate { map, keys, value } => {
                conf.field_type(map)?;
                let keys = lookup_all(&conf.env, keys)?;
                let value = match value {
                    Some(name) => {
                        let v = conf.env.lookup(name)?;
                        if !v.is_pure() {
                            return Err(non_serializable(format!("entry of {map}")));
                        }
                        Some(v)
                    }
                    None => None,
                };
                backend.map_update(map, &keys, value)?;
            }
            StmtKind::MapGet {
                local,
                map,
                keys,
                fetch,
            } => {
                let ty = conf.field_type(map)?.clone();
                let keys = lookup_all(&conf.env, keys)?;
                let found = backend.map_get(map, &keys, *fetch)?;
                let value = if *fetch {
                    let val_ty = nested_value_type(&ty, keys.len())?;
                    match found {
                        Some(v) => Value::some(val_ty, v),
                        None => Value::none(val_ty),
                    }
                } else {
                    Value::bool(found.is_some())
                };
                conf.env = conf.env.bind(local.clone(), value);
            }
            StmtKind::ReadFromBc { local, fact } => {
                let value = conf.blockchain.lookup(fact)?;
                conf.env = conf.env.bind(local.clone(), value);
            }
            StmtKind::Match { scrutinee, arms } => {
                let value = conf.env.lookup(scrutinee)?;
                let Some((arm, bindings)) = arms
                    .iter()
                    .find_map(|arm| match_pattern(&arm.pattern, &value).map(|b| (arm, b)))
                else {
                    return Err(non_exhaustive_match(scrutinee));
                };
                // Clause bindings do not outlive the clause.
                let saved = conf.env.clone();
                conf.env = conf.env.bind_all(bindings);
                conf = self.exec_stmts(&arm.body, conf, backend)?;
                conf.env = saved;
            }
            StmtKind::AcceptPayment => {
                conf.accepted = true;
                self.observe(EvalEvent::PaymentAccepted);
            }
            StmtKind::SendMsgs(name) => {
                let value = conf.env.lookup(name)?;
                let msgs = match value.list_elements() {
                    Some(items) => items,
                    None => vec![value],
                };
                for msg in &msgs {
                    validate_outgoing(msg)?;
                    self.observe(EvalEvent::MessageSent {
                        message: msg.clone(),
                    });
                }
                conf.messages.extend(msgs);
            }
            StmtKind::CreateEvent(name) => {
                let event = conf.env.lookup(name)?;
                validate_event(&event)?;
                self.observe(EvalEvent::EventEmitted {
                    event: event.clone(),
                });
                conf.events.push(event);
            }
            StmtKind::CallProc { proc, args } => {
                let args = lookup_all(&conf.env, args)?;
                conf = self.call_procedure(proc, args, conf, backend)?;
            }
            StmtKind::Iterate { list, proc } => {
                let value = conf.env.lookup(list)?;
                let items = value
                    .list_elements()
                    .ok_or_else(|| type_mismatch("List", value.kind_name()))?;
                for item in items {
                    conf = self.call_procedure(proc, vec![item], conf, backend)?;
                }
            }
            StmtKind::Throw(arg) => {
                let message = match arg {
                    Some(name) => Some(conf.env.lookup(name)?.to_string()),
                    None => None,
                };
                self.observe(EvalEvent::Thrown {
                    message: message.clone(),
                });
                return Err(user_abort(message)
                    .with_backtrace(EvalBacktrace::from_call_stack(&conf.call_stack)));
            }
            StmtKind::Gas { cost } => {
                let cost = eval_cost(cost, &conf.env)?;
                self.charge(cost, stmt.span)?;
            }
        }
        Ok(conf)
    }

    /// Run procedure `name` with `args`, then restore the caller's scope.
    ///
    /// The body sees the component-entry bindings, the caller's implicit
    /// message parameters and its own arguments. Only procedures declared
    /// before the callee are callable from inside it.
    #[tracing::instrument(level = "debug", skip_all, fields(procedure = %name))]
    fn call_procedure(
        &mut self,
        name: &Name,
        args: Vec<Value>,
        mut conf: Configuration,
        backend: &mut dyn StateBackend,
    ) -> EvalResult<Configuration> {
        let index = conf
            .procedure_index(name)
            .ok_or_else(|| unknown_procedure(name))?;
        let procedure = Arc::clone(&conf.procedures[index]);
        if procedure.params.len() != args.len() {
            return Err(arity_mismatch(name, procedure.params.len(), args.len()));
        }

        let implicits = [SENDER_LABEL, ORIGIN_LABEL, AMOUNT_LABEL]
            .into_iter()
            .filter_map(|label| {
                let label = Name::new(label);
                conf.env.get(&label).cloned().map(|v| (label, v))
            })
            .collect::<Vec<_>>();
        let params = procedure
            .params
            .iter()
            .map(|(param, _)| param.clone())
            .zip(args);
        let body_env = conf.init_env.bind_all(implicits).bind_all(params);

        let caller_env = std::mem::replace(&mut conf.env, body_env);
        let callable = conf.procedures.clone();
        conf.procedures.truncate(index);
        conf.call_stack.push(name.clone());
        self.observe(EvalEvent::ProcedureEntered {
            name: name.clone(),
            depth: conf.call_stack.len(),
        });

        let mut conf = self.enter(|this| this.exec_stmts(&procedure.body, conf, backend))?;
        conf.call_stack.pop();
        conf.procedures = callable;
        conf.env = caller_env;
        Ok(conf)
    }
}
