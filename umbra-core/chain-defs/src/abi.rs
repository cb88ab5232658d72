use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    address::Address,
    crypto::{Fr, PublicKey},
    packing::PackingError,
    tx::{FunctionData, FunctionKind, FunctionSelector},
};

pub const MAX_INTEGER_WIDTH: u8 = 128;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbiType {
    Field,
    Boolean,
    Integer { width: u8 },
    Address,
    PublicKey,
    Array { length: usize, element: Box<AbiType> },
}

impl AbiType {
    /// Number of field elements a value of this type packs into, `None` if
    /// it does not fit in a `usize`.
    #[must_use]
    pub fn field_len(&self) -> Option<usize> {
        match self {
            Self::Field | Self::Boolean | Self::Integer { .. } | Self::Address => Some(1),
            Self::PublicKey => Some(2),
            Self::Array { length, element } => length.checked_mul(element.field_len()?),
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => write!(f, "field"),
            Self::Boolean => write!(f, "bool"),
            Self::Integer { width } => write!(f, "u{width}"),
            Self::Address => write!(f, "address"),
            Self::PublicKey => write!(f, "pubkey"),
            Self::Array { length, element } => write!(f, "[{element};{length}]"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbiValue {
    Field(Fr),
    /// Untrusted 32 byte value for a `field` parameter, checked for
    /// canonicity when encoded.
    RawField([u8; 32]),
    Boolean(bool),
    Integer(u128),
    Address(Address),
    PublicKey(PublicKey),
    Array(Vec<AbiValue>),
}

impl From<Fr> for AbiValue {
    fn from(value: Fr) -> Self {
        Self::Field(value)
    }
}

impl From<bool> for AbiValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<u128> for AbiValue {
    fn from(value: u128) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for AbiValue {
    fn from(value: u64) -> Self {
        Self::Integer(u128::from(value))
    }
}

impl From<Address> for AbiValue {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<PublicKey> for AbiValue {
    fn from(value: PublicKey) -> Self {
        Self::PublicKey(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParameter {
    pub name: String,
    pub ty: AbiType,
}

impl AbiParameter {
    #[must_use]
    pub fn new(name: &str, ty: AbiType) -> Self {
        Self {
            name: name.to_owned(),
            ty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionAbi {
    pub name: String,
    pub kind: FunctionKind,
    pub parameters: Vec<AbiParameter>,
}

impl FunctionAbi {
    #[must_use]
    pub fn new(name: &str, kind: FunctionKind, parameters: Vec<AbiParameter>) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            parameters,
        }
    }

    /// Canonical signature, e.g. `transfer(address,u128)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|param| param.ty.to_string())
            .collect();
        format!("{}({})", self.name, params.join(","))
    }

    #[must_use]
    pub fn selector(&self) -> FunctionSelector {
        FunctionSelector::from_signature(&self.signature())
    }

    #[must_use]
    pub fn function_data(&self) -> FunctionData {
        FunctionData::new(self.selector(), self.kind)
    }
}

/// Flattens typed values into field elements following the ABI.
///
/// Values are checked, never coerced: the first mismatch is returned.
pub fn encode_arguments(abi: &FunctionAbi, values: &[AbiValue]) -> Result<Vec<Fr>, PackingError> {
    if abi.parameters.len() != values.len() {
        return Err(PackingError::ArityMismatch {
            function: abi.name.clone(),
            expected: abi.parameters.len(),
            actual: values.len(),
        });
    }
    for param in &abi.parameters {
        param
            .ty
            .field_len()
            .ok_or_else(|| PackingError::UnsupportedType(param.ty.to_string()))?;
    }
    // Declared lengths are untrusted; the values bound the allocation.
    let mut fields = Vec::with_capacity(values.len());
    for (param, value) in abi.parameters.iter().zip(values) {
        encode_value(&param.name, &param.ty, value, &mut fields)?;
    }
    Ok(fields)
}

fn encode_value(
    param: &str,
    ty: &AbiType,
    value: &AbiValue,
    out: &mut Vec<Fr>,
) -> Result<(), PackingError> {
    match (ty, value) {
        (AbiType::Field, AbiValue::Field(fr)) => out.push(*fr),
        (AbiType::Field, AbiValue::RawField(bytes)) => out.push(Fr::try_from_bytes(*bytes)?),
        (AbiType::Boolean, AbiValue::Boolean(flag)) => out.push(Fr::from(*flag)),
        (AbiType::Integer { width }, AbiValue::Integer(value)) => {
            if *width == 0 || *width > MAX_INTEGER_WIDTH {
                return Err(PackingError::UnsupportedType(ty.to_string()));
            }
            if *width < MAX_INTEGER_WIDTH && value >> width != 0 {
                return Err(PackingError::IntegerOverflow {
                    param: param.to_owned(),
                    width: *width,
                });
            }
            out.push(Fr::from(*value));
        }
        (AbiType::Address, AbiValue::Address(address)) => out.push(address.to_field()),
        (AbiType::PublicKey, AbiValue::PublicKey(key)) => {
            let (x, y) = key.coordinates();
            out.extend([x, y]);
        }
        (AbiType::Array { length, element }, AbiValue::Array(items)) => {
            if items.len() != *length {
                return Err(PackingError::ArrayLengthMismatch {
                    param: param.to_owned(),
                    expected: *length,
                    actual: items.len(),
                });
            }
            for item in items {
                encode_value(param, element, item, out)?;
            }
        }
        _ => {
            return Err(PackingError::TypeMismatch {
                param: param.to_owned(),
                expected: ty.to_string(),
            })
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;

    fn transfer_abi() -> FunctionAbi {
        FunctionAbi::new(
            "transfer",
            FunctionKind::Private,
            vec![
                AbiParameter::new("to", AbiType::Address),
                AbiParameter::new("amount", AbiType::Integer { width: 64 }),
                AbiParameter::new(
                    "memo",
                    AbiType::Array {
                        length: 2,
                        element: Box::new(AbiType::Field),
                    },
                ),
            ],
        )
    }

    #[test]
    fn signature_lists_parameter_types() {
        assert_eq!(transfer_abi().signature(), "transfer(address,u64,[field;2])");
    }

    #[test]
    fn encodes_in_parameter_order() {
        let to = Address::new(Fr::from(5u64));
        let fields = encode_arguments(
            &transfer_abi(),
            &[
                to.into(),
                987u64.into(),
                AbiValue::Array(vec![Fr::from(1u64).into(), Fr::from(2u64).into()]),
            ],
        )
        .unwrap();
        assert_eq!(
            fields,
            vec![to.to_field(), Fr::from(987u64), Fr::from(1u64), Fr::from(2u64)]
        );
    }

    #[test]
    fn public_keys_pack_as_two_coordinates() {
        let key = PublicKey::new(k256::SecretKey::random(&mut OsRng).public_key());
        let abi = FunctionAbi::new(
            "constructor",
            FunctionKind::Constructor,
            vec![AbiParameter::new("poker", AbiType::PublicKey)],
        );
        let fields = encode_arguments(&abi, &[key.into()]).unwrap();
        assert_eq!(fields, vec![key.x(), key.y()]);
    }

    #[test]
    fn rejects_malformed_arguments() {
        let abi = transfer_abi();
        let memo = AbiValue::Array(vec![Fr::ZERO.into(), Fr::ZERO.into()]);
        let to: AbiValue = Address::ZERO.into();

        assert!(matches!(
            encode_arguments(&abi, &[to.clone()]),
            Err(PackingError::ArityMismatch {
                expected: 3,
                actual: 1,
                ..
            })
        ));
        assert!(matches!(
            encode_arguments(&abi, &[true.into(), 1u64.into(), memo.clone()]),
            Err(PackingError::TypeMismatch { .. })
        ));
        assert!(matches!(
            encode_arguments(&abi, &[to.clone(), u128::from(u64::MAX).saturating_add(1).into(), memo]),
            Err(PackingError::IntegerOverflow { width: 64, .. })
        ));
        assert!(matches!(
            encode_arguments(
                &abi,
                &[to, 1u64.into(), AbiValue::Array(vec![Fr::ZERO.into()])]
            ),
            Err(PackingError::ArrayLengthMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn rejects_non_canonical_raw_fields() {
        let abi = FunctionAbi::new(
            "set",
            FunctionKind::Private,
            vec![AbiParameter::new("value", AbiType::Field)],
        );
        assert!(matches!(
            encode_arguments(&abi, &[AbiValue::RawField([0xff; 32])]),
            Err(PackingError::NonCanonicalField(_))
        ));
    }

    #[test]
    fn rejects_unsupported_integer_widths() {
        let abi = FunctionAbi::new(
            "set",
            FunctionKind::Private,
            vec![AbiParameter::new("value", AbiType::Integer { width: 200 })],
        );
        assert_eq!(
            encode_arguments(&abi, &[1u64.into()]),
            Err(PackingError::UnsupportedType("u200".to_owned()))
        );
    }

    #[test]
    fn oversized_array_types_are_errors() {
        let huge = |element| AbiType::Array {
            length: usize::MAX / 2,
            element: Box::new(element),
        };
        for ty in [huge(AbiType::Field), huge(AbiType::PublicKey)] {
            let abi = FunctionAbi::new(
                "set",
                FunctionKind::Private,
                vec![AbiParameter::new("values", ty)],
            );
            assert!(matches!(
                encode_arguments(&abi, &[AbiValue::Array(vec![Fr::ZERO.into()])]),
                Err(PackingError::ArrayLengthMismatch { actual: 1, .. })
            ));
        }

        let nested = huge(huge(AbiType::Field));
        assert_eq!(nested.field_len(), None);
        let abi = FunctionAbi::new(
            "set",
            FunctionKind::Private,
            vec![AbiParameter::new("values", nested.clone())],
        );
        assert_eq!(
            encode_arguments(&abi, &[AbiValue::Array(vec![])]),
            Err(PackingError::UnsupportedType(nested.to_string()))
        );
    }
}
