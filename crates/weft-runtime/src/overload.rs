//! Overload resolution
//!
//! Platform-default rules only:
//! 1. a candidate applies in normal form when every argument is accepted by
//!    the parameter at its position; a trailing rest parameter then takes a
//!    list as is. Objects fit parameters that view one of their registered
//!    bases
//! 2. a candidate with a trailing rest parameter also applies in expanded
//!    form when the leading arguments match the fixed parameters and every
//!    remaining argument matches the rest element type
//! 3. among applicable candidates the unique best one wins: at least as
//!    specific at every argument position and strictly more specific at one,
//!    with normal form beating expanded form on a tie. A view of a derived
//!    type is more specific than a view of its base
//!
//! No unique best is an ambiguity; no applicable candidate is a miss. Both
//! are hard failures.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::trace;
use weft_schema::{MethodHandle, TypeRegistry};
use weft_sdk::{HostError, HostResult, ParamType, TypeRelation, Value};

/// A chosen overload with arguments packed for its declared parameters
#[derive(Debug, Clone)]
pub struct Binding {
    pub method: Arc<MethodHandle>,
    /// Arguments ready to pass: in expanded form the trailing arguments are
    /// packed into one list
    pub args: Vec<Value>,
    pub expanded: bool,
}

/// Why no overload was chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingFailure {
    NoMatch,
    Ambiguous(Vec<String>),
}

impl BindingFailure {
    /// Host error describing the failure for `what`
    pub fn into_host_error(self, what: &str) -> HostError {
        match self {
            BindingFailure::NoMatch => {
                HostError::NotSupported(format!("no overload of '{}' accepts the arguments", what))
            }
            BindingFailure::Ambiguous(candidates) => HostError::AmbiguousMatch(format!(
                "'{}' matches {}",
                what,
                candidates.join(", ")
            )),
        }
    }
}

struct Applicable<'c> {
    method: &'c Arc<MethodHandle>,
    /// Parameter type seen by each argument position
    shape: Vec<&'c ParamType>,
    expanded: bool,
}

fn normal_form<'c>(
    types: &dyn TypeRelation,
    method: &'c Arc<MethodHandle>,
    args: &[Value],
) -> Option<Applicable<'c>> {
    if method.params.len() != args.len() {
        return None;
    }
    if !method.params.iter().zip(args).all(|(p, a)| p.accepts_in(a, types)) {
        return None;
    }
    Some(Applicable {
        method,
        shape: method.params.iter().collect(),
        expanded: false,
    })
}

fn expanded_form<'c>(
    types: &dyn TypeRelation,
    method: &'c Arc<MethodHandle>,
    args: &[Value],
) -> Option<Applicable<'c>> {
    let (rest, fixed) = method.params.split_last()?;
    let element = rest.rest_element()?;
    if args.len() < fixed.len() {
        return None;
    }
    let (head, tail) = args.split_at(fixed.len());
    if !fixed.iter().zip(head).all(|(p, a)| p.accepts_in(a, types)) {
        return None;
    }
    if !tail.iter().all(|a| element.accepts_in(a, types)) {
        return None;
    }
    let mut shape: Vec<&ParamType> = fixed.iter().collect();
    shape.extend(std::iter::repeat(element).take(tail.len()));
    Some(Applicable {
        method,
        shape,
        expanded: true,
    })
}

fn better(types: &dyn TypeRelation, a: &Applicable<'_>, b: &Applicable<'_>) -> bool {
    let mut a_covers = true;
    let mut b_covers = true;
    for (pa, pb) in a.shape.iter().zip(&b.shape) {
        if !pa.at_least_as_specific_in(pb, types) {
            a_covers = false;
        }
        if !pb.at_least_as_specific_in(pa, types) {
            b_covers = false;
        }
    }
    match (a_covers, b_covers) {
        (true, false) => true,
        (true, true) => !a.expanded && b.expanded,
        _ => false,
    }
}

fn pack(candidate: &Applicable<'_>, args: &[Value]) -> Vec<Value> {
    if !candidate.expanded {
        return args.to_vec();
    }
    let fixed = candidate.method.params.len() - 1;
    let mut packed = args[..fixed].to_vec();
    packed.push(Value::list(args[fixed..].to_vec()));
    packed
}

/// Pick the best candidate for `args`, relating object types by `types`
pub fn select(
    types: &dyn TypeRelation,
    candidates: &[Arc<MethodHandle>],
    args: &[Value],
) -> Result<Binding, BindingFailure> {
    let applicable: Vec<Applicable<'_>> = candidates
        .iter()
        .filter_map(|m| normal_form(types, m, args).or_else(|| expanded_form(types, m, args)))
        .collect();

    let best: Vec<&Applicable<'_>> = applicable
        .iter()
        .enumerate()
        .filter(|(i, a)| {
            applicable
                .iter()
                .enumerate()
                .all(|(j, b)| *i == j || better(types, a, b))
        })
        .map(|(_, a)| a)
        .collect();

    match best.as_slice() {
        [winner] => {
            trace!(method = %winner.method, expanded = winner.expanded, "overload selected");
            Ok(Binding {
                method: Arc::clone(winner.method),
                args: pack(winner, args),
                expanded: winner.expanded,
            })
        }
        _ if applicable.is_empty() => Err(BindingFailure::NoMatch),
        _ => Err(BindingFailure::Ambiguous(
            applicable.iter().map(|a| a.method.to_string()).collect(),
        )),
    }
}

fn mismatch(param: &ParamType, value: &Value) -> HostError {
    HostError::InvalidCast {
        expected: param.to_string(),
        got: value.type_name().to_string(),
    }
}

/// Check already packed arguments against the declared parameters and
/// upcast objects passed for base views
pub fn check_args<'v>(
    registry: &TypeRegistry,
    method: &MethodHandle,
    args: &'v [Value],
) -> HostResult<Cow<'v, [Value]>> {
    if method.params.len() != args.len() {
        return Err(HostError::Argument(format!(
            "'{}' takes {} arguments, got {}",
            method,
            method.params.len(),
            args.len()
        )));
    }
    if let Some((param, arg)) = method
        .params
        .iter()
        .zip(args)
        .find(|(param, arg)| !param.accepts_in(arg, registry))
    {
        return Err(mismatch(param, arg));
    }
    Ok(registry.coerce_args(&method.params, args))
}

/// Check a value against a setter's declared type, upcasting as
/// [`check_args`] does
pub fn check_value<'v>(
    registry: &TypeRegistry,
    value_type: &ParamType,
    value: &'v Value,
) -> HostResult<Cow<'v, Value>> {
    if !value_type.accepts_in(value, registry) {
        return Err(mismatch(value_type, value));
    }
    Ok(registry.coerce(value_type, value))
}
