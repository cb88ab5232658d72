//! Two party token whose whole balance anyone can push from the sender to
//! the recipient.
//!
//! Balances live in notes under [`BALANCES_SLOT`], one owner per note. A
//! participants note under [`PARTICIPANTS_SLOT`] is encrypted to the poker
//! and records who the two parties are.
use std::sync::LazyLock;

use rand::RngCore;

use super::{
    CallContext, ContractClass, ContractError, ContractOutput, NoteEmission, PrivateContract,
};
use crate::{
    abi::{AbiParameter, AbiType, AbiValue, FunctionAbi},
    address::Address,
    crypto::{Fr, PublicKey},
    logs::{Note, NotePayload},
    tx::{FunctionKind, FunctionSelector},
};

pub const BALANCES_SLOT: Fr = Fr::from_u64(1);
pub const PARTICIPANTS_SLOT: Fr = Fr::from_u64(2);

pub static ARTIFACT: LazyLock<ContractClass> = LazyLock::new(|| ContractClass {
    name: "PokeableToken".to_owned(),
    functions: vec![
        FunctionAbi::new(
            "constructor",
            FunctionKind::Constructor,
            vec![
                AbiParameter::new("initial_supply", AbiType::Integer { width: 128 }),
                AbiParameter::new("sender", AbiType::Address),
                AbiParameter::new("recipient", AbiType::Address),
                AbiParameter::new("poker", AbiType::PublicKey),
            ],
        ),
        FunctionAbi::new("poke", FunctionKind::Private, vec![]),
        FunctionAbi::new(
            "get_balance",
            FunctionKind::Unconstrained,
            vec![AbiParameter::new("owner", AbiType::Address)],
        ),
    ],
});

static POKE_SELECTOR: LazyLock<FunctionSelector> = LazyLock::new(|| {
    ARTIFACT
        .function("poke")
        .expect("poke is part of the artifact")
        .selector()
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstructorArgs {
    pub initial_supply: u128,
    pub sender: Address,
    pub recipient: Address,
    pub poker: PublicKey,
}

impl ConstructorArgs {
    #[must_use]
    pub fn to_values(&self) -> Vec<AbiValue> {
        vec![
            self.initial_supply.into(),
            self.sender.into(),
            self.recipient.into(),
            self.poker.into(),
        ]
    }

    pub fn from_fields(fields: &[Fr]) -> Result<Self, ContractError> {
        let [initial_supply, sender, recipient, poker_x, poker_y] = fields else {
            return Err(ContractError::MalformedArguments(format!(
                "constructor expects 5 fields, got {}",
                fields.len()
            )));
        };
        let initial_supply = initial_supply.to_u128().ok_or_else(|| {
            ContractError::MalformedArguments("initial supply exceeds 128 bits".to_owned())
        })?;
        let poker = PublicKey::from_fields(poker_x, poker_y)
            .map_err(|e| ContractError::MalformedArguments(e.to_string()))?;
        Ok(Self {
            initial_supply,
            sender: Address::new(*sender),
            recipient: Address::new(*recipient),
            poker,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceNote {
    pub owner: Address,
    pub value: u128,
}

impl BalanceNote {
    #[must_use]
    pub fn into_note(self, randomness: Fr) -> Note {
        Note::new(vec![self.owner.to_field(), Fr::from(self.value)], randomness)
    }

    #[must_use]
    pub fn from_payload(payload: &NotePayload) -> Option<Self> {
        if payload.storage_slot != BALANCES_SLOT {
            return None;
        }
        let [owner, value] = payload.note.items.as_slice() else {
            return None;
        };
        Some(Self {
            owner: Address::new(*owner),
            value: value.to_u128()?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParticipantsNote {
    pub sender: Address,
    pub recipient: Address,
}

impl ParticipantsNote {
    #[must_use]
    pub fn into_note(self, randomness: Fr) -> Note {
        Note::new(
            vec![self.sender.to_field(), self.recipient.to_field()],
            randomness,
        )
    }

    #[must_use]
    pub fn from_payload(payload: &NotePayload) -> Option<Self> {
        if payload.storage_slot != PARTICIPANTS_SLOT {
            return None;
        }
        let [sender, recipient] = payload.note.items.as_slice() else {
            return None;
        };
        Some(Self {
            sender: Address::new(*sender),
            recipient: Address::new(*recipient),
        })
    }
}

/// Sum of the balance notes of `owner` among `notes`.
pub fn get_balance<'a>(
    notes: impl IntoIterator<Item = &'a NotePayload>,
    contract: &Address,
    owner: &Address,
) -> Result<u128, ContractError> {
    notes
        .into_iter()
        .filter(|payload| payload.contract == *contract)
        .filter_map(BalanceNote::from_payload)
        .filter(|note| note.owner == *owner)
        .try_fold(0u128, |acc, note| {
            acc.checked_add(note.value).ok_or(ContractError::Overflow)
        })
}

fn balance_emission(
    contract: Address,
    note: BalanceNote,
    rng: &mut dyn RngCore,
) -> Result<NoteEmission, ContractError> {
    let recipient = note
        .owner
        .to_public_key()
        .map_err(|e| ContractError::MalformedArguments(format!("owner {}: {e}", note.owner)))?;
    Ok(NoteEmission {
        payload: NotePayload {
            contract,
            storage_slot: BALANCES_SLOT,
            note: note.into_note(Fr::random(rng)),
        },
        recipient,
    })
}

pub struct PokeableToken;

impl PrivateContract for PokeableToken {
    fn class(&self) -> &ContractClass {
        &ARTIFACT
    }

    fn construct(
        &self,
        context: &CallContext,
        args: &[Fr],
        rng: &mut dyn RngCore,
    ) -> Result<ContractOutput, ContractError> {
        let args = ConstructorArgs::from_fields(args)?;
        let sender = balance_emission(
            context.contract,
            BalanceNote {
                owner: args.sender,
                value: args.initial_supply,
            },
            rng,
        )?;
        let recipient = balance_emission(
            context.contract,
            BalanceNote {
                owner: args.recipient,
                value: 0,
            },
            rng,
        )?;
        let participants = NoteEmission {
            payload: NotePayload {
                contract: context.contract,
                storage_slot: PARTICIPANTS_SLOT,
                note: ParticipantsNote {
                    sender: args.sender,
                    recipient: args.recipient,
                }
                .into_note(Fr::random(rng)),
            },
            recipient: args.poker,
        };
        Ok(ContractOutput {
            emissions: vec![sender, recipient, participants],
            consumed: vec![],
        })
    }

    fn call(
        &self,
        context: &CallContext,
        selector: &FunctionSelector,
        args: &[Fr],
        notes: &[NotePayload],
        rng: &mut dyn RngCore,
    ) -> Result<ContractOutput, ContractError> {
        if *selector != *POKE_SELECTOR {
            return Err(match ARTIFACT.function_by_selector(selector) {
                Some(_) => ContractError::NotCallable(*selector),
                None => ContractError::UnknownFunction(*selector),
            });
        }
        if !args.is_empty() {
            return Err(ContractError::MalformedArguments(
                "poke takes no arguments".to_owned(),
            ));
        }
        let participants = notes
            .iter()
            .find_map(ParticipantsNote::from_payload)
            .ok_or(ContractError::MissingState("participants note"))?;

        let mut consumed = Vec::new();
        let mut total = 0u128;
        for payload in notes {
            let Some(balance) = BalanceNote::from_payload(payload) else {
                continue;
            };
            if balance.owner == participants.sender || balance.owner == participants.recipient {
                total = total
                    .checked_add(balance.value)
                    .ok_or(ContractError::Overflow)?;
                consumed.push(payload.commitment());
            }
        }

        let recipient = balance_emission(
            context.contract,
            BalanceNote {
                owner: participants.recipient,
                value: total,
            },
            rng,
        )?;
        Ok(ContractOutput {
            emissions: vec![recipient],
            consumed,
        })
    }
}
