use alloy::dyn_abi::{DynSolValue, Specifier};
use alloy::json_abi::{Function, JsonAbi, StateMutability};
use serde::Serialize;

use crate::error::{Error, Result};

/// Widget class for one function parameter. Closed policy: elementary
/// unsigned/signed integers get numeric inputs (unsigned floored at 0, step
/// 1), addresses get free text with no checksum validation, everything else
/// is free text interpreted by the declared Solidity type at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
  Unsigned,
  Signed,
  Address,
  Text,
}

/// One input control of a generated sub-form.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
  pub name: String,
  pub sol_type: String,
  pub kind: FieldKind,
}

/// One invocable sub-form: a function of the deployed contract, its typed
/// fields in declared parameter order, and how an invocation is routed.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionForm {
  pub name: String,
  pub signature: String,
  pub state_mutability: StateMutability,
  pub read_only: bool,
  pub fields: Vec<FieldSpec>,
}

/// Generate one sub-form per function in the ABI.
pub fn contract_forms(abi: &JsonAbi) -> Vec<FunctionForm> {
  abi.functions().map(function_form).collect()
}

pub fn function_form(function: &Function) -> FunctionForm {
  FunctionForm {
    name: function.name.clone(),
    signature: function.signature(),
    state_mutability: function.state_mutability,
    read_only: is_read_only(function.state_mutability),
    fields: function
      .inputs
      .iter()
      .map(|param| FieldSpec {
        name: param.name.clone(),
        sol_type: param.ty.clone(),
        kind: field_kind(&param.ty),
      })
      .collect(),
  }
}

/// `view` and `pure` both execute as non-mutating reads. The original
/// console only tested for `view`, pushing `pure` functions through the
/// transaction path; `pure` belongs in the read set.
pub fn is_read_only(mutability: StateMutability) -> bool {
  matches!(mutability, StateMutability::View | StateMutability::Pure)
}

pub fn field_kind(sol_type: &str) -> FieldKind {
  if is_elementary_integer(sol_type, "uint") {
    FieldKind::Unsigned
  } else if is_elementary_integer(sol_type, "int") {
    FieldKind::Signed
  } else if sol_type == "address" {
    FieldKind::Address
  } else {
    FieldKind::Text
  }
}

// "uint", "uint8".."uint256" but not "uint256[]" or "uint256[2]".
fn is_elementary_integer(sol_type: &str, prefix: &str) -> bool {
  sol_type
    .strip_prefix(prefix)
    .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
}

/// Marshal entered values, in declared parameter order, into ABI values for
/// the chain client. Arity or coercion mismatches fail the invocation before
/// anything reaches the node.
pub fn coerce_args(function: &Function, raw: &[String]) -> Result<Vec<DynSolValue>> {
  if raw.len() != function.inputs.len() {
    return Err(Error::Call(format!(
      "{} expects {} argument(s), got {}",
      function.name,
      function.inputs.len(),
      raw.len()
    )));
  }

  function
    .inputs
    .iter()
    .zip(raw)
    .map(|(param, value)| {
      let ty = param.resolve().map_err(|err| {
        Error::Call(format!("unsupported parameter type {}: {err}", param.ty))
      })?;
      ty.coerce_str(value).map_err(|err| {
        Error::Call(format!(
          "value {value:?} is not a valid {}: {err}",
          param.ty
        ))
      })
    })
    .collect()
}

/// Render a decoded return value for the console. Numbers become decimal
/// strings so 256-bit values survive JSON.
pub fn value_to_json(value: &DynSolValue) -> serde_json::Value {
  match value {
    DynSolValue::Bool(b) => serde_json::Value::Bool(*b),
    DynSolValue::Uint(u, _) => serde_json::Value::String(u.to_string()),
    DynSolValue::Int(i, _) => serde_json::Value::String(i.to_string()),
    DynSolValue::Address(a) => serde_json::Value::String(a.to_string()),
    DynSolValue::String(s) => serde_json::Value::String(s.clone()),
    DynSolValue::Bytes(b) => serde_json::Value::String(format!("0x{}", hex::encode(b))),
    DynSolValue::FixedBytes(word, size) => {
      serde_json::Value::String(format!("0x{}", hex::encode(&word[..*size])))
    }
    DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
      serde_json::Value::Array(items.iter().map(value_to_json).collect())
    }
    other => serde_json::Value::String(format!("{other:?}")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use alloy::primitives::U256;
  use serde_json::json;

  fn sample_abi() -> JsonAbi {
    serde_json::from_value(json!([
      {
        "type": "function",
        "name": "set",
        "inputs": [{ "name": "v", "type": "uint256" }],
        "outputs": [],
        "stateMutability": "nonpayable"
      },
      {
        "type": "function",
        "name": "x",
        "inputs": [],
        "outputs": [{ "name": "", "type": "uint256" }],
        "stateMutability": "view"
      },
      {
        "type": "function",
        "name": "mix",
        "inputs": [
          { "name": "amount", "type": "uint256" },
          { "name": "delta", "type": "int8" },
          { "name": "owner", "type": "address" },
          { "name": "label", "type": "string" },
          { "name": "flags", "type": "uint256[]" }
        ],
        "outputs": [],
        "stateMutability": "payable"
      },
      {
        "type": "function",
        "name": "double",
        "inputs": [{ "name": "v", "type": "uint256" }],
        "outputs": [{ "name": "", "type": "uint256" }],
        "stateMutability": "pure"
      }
    ]))
    .expect("parse abi")
  }

  fn form_named<'a>(forms: &'a [FunctionForm], name: &str) -> &'a FunctionForm {
    forms
      .iter()
      .find(|form| form.name == name)
      .expect("form present")
  }

  #[test]
  fn one_form_per_function_one_field_per_parameter() {
    let abi = sample_abi();
    let forms = contract_forms(&abi);
    assert_eq!(forms.len(), 4);
    assert_eq!(form_named(&forms, "set").fields.len(), 1);
    assert_eq!(form_named(&forms, "x").fields.len(), 0);
    assert_eq!(form_named(&forms, "mix").fields.len(), 5);
  }

  #[test]
  fn field_kinds_follow_the_closed_policy() {
    let abi = sample_abi();
    let forms = contract_forms(&abi);
    let mix = form_named(&forms, "mix");
    let kinds: Vec<FieldKind> = mix.fields.iter().map(|field| field.kind).collect();
    assert_eq!(
      kinds,
      vec![
        FieldKind::Unsigned,
        FieldKind::Signed,
        FieldKind::Address,
        FieldKind::Text,
        FieldKind::Text
      ]
    );
  }

  #[test]
  fn fields_preserve_declared_parameter_order() {
    let abi = sample_abi();
    let forms = contract_forms(&abi);
    let names: Vec<&str> = form_named(&forms, "mix")
      .fields
      .iter()
      .map(|field| field.name.as_str())
      .collect();
    assert_eq!(names, vec!["amount", "delta", "owner", "label", "flags"]);
  }

  #[test]
  fn view_and_pure_are_read_only_the_rest_transact() {
    let abi = sample_abi();
    let forms = contract_forms(&abi);
    assert!(form_named(&forms, "x").read_only);
    assert!(form_named(&forms, "double").read_only);
    assert!(!form_named(&forms, "set").read_only);
    assert!(!form_named(&forms, "mix").read_only);
  }

  #[test]
  fn integer_arrays_are_text_fields() {
    assert_eq!(field_kind("uint256[]"), FieldKind::Text);
    assert_eq!(field_kind("uint256[4]"), FieldKind::Text);
    assert_eq!(field_kind("uint"), FieldKind::Unsigned);
    assert_eq!(field_kind("int128"), FieldKind::Signed);
  }

  #[test]
  fn coerce_args_honors_declared_types() {
    let abi = sample_abi();
    let set = &abi.function("set").expect("set")[0];
    let values = coerce_args(set, &["5".to_string()]).expect("coerce");
    assert_eq!(values, vec![DynSolValue::Uint(U256::from(5u64), 256)]);
  }

  #[test]
  fn coerce_args_rejects_arity_mismatch() {
    let abi = sample_abi();
    let set = &abi.function("set").expect("set")[0];
    let err = coerce_args(set, &[]).unwrap_err();
    assert!(matches!(err, Error::Call(_)));
  }

  #[test]
  fn coerce_args_rejects_untypable_values() {
    let abi = sample_abi();
    let set = &abi.function("set").expect("set")[0];
    assert!(coerce_args(set, &["not-a-number".to_string()]).is_err());
  }

  #[test]
  fn values_render_for_the_console() {
    assert_eq!(
      value_to_json(&DynSolValue::Uint(U256::from(5u64), 256)),
      json!("5")
    );
    assert_eq!(value_to_json(&DynSolValue::Bool(true)), json!(true));
    assert_eq!(
      value_to_json(&DynSolValue::String("hi".into())),
      json!("hi")
    );
    assert_eq!(
      value_to_json(&DynSolValue::Array(vec![
        DynSolValue::Uint(U256::from(1u64), 256),
        DynSolValue::Uint(U256::from(2u64), 256)
      ])),
      json!(["1", "2"])
    );
  }
}
