//! Measurement outcome bitstrings.
//!
//! Character `k` of a bitstring is the measured value of qubit `k`, so
//! `"01"` means qubit 0 read `0` and qubit 1 read `1`. The matching basis
//! index packs qubit `k` into bit `k`, which is the layout used by the
//! statevector simulator and by dense outcome distributions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{IrError, IrResult};

/// A fixed-length measurement outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bitstring {
    bits: Vec<bool>,
}

impl Bitstring {
    /// Parse a bitstring made of `0` and `1` characters.
    pub fn parse(s: &str) -> IrResult<Self> {
        if s.is_empty() {
            return Err(IrError::InvalidBitstring(s.to_string()));
        }
        let bits = s
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(IrError::InvalidBitstring(s.to_string())),
            })
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Self { bits })
    }

    /// Build the bitstring of a basis index over `num_qubits` qubits.
    pub fn from_index(index: usize, num_qubits: usize) -> Self {
        Self {
            bits: (0..num_qubits).map(|k| (index >> k) & 1 == 1).collect(),
        }
    }

    /// Basis index of this outcome.
    pub fn index(&self) -> usize {
        self.bits
            .iter()
            .enumerate()
            .filter(|&(_, &bit)| bit)
            .fold(0, |acc, (k, _)| acc | (1 << k))
    }

    /// Number of qubits covered.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Always false for a parsed bitstring; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Measured value of one qubit.
    pub fn bit(&self, qubit: usize) -> Option<bool> {
        self.bits.get(qubit).copied()
    }
}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for Bitstring {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Bitstring {
    type Error = IrError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Bitstring> for String {
    fn from(b: Bitstring) -> Self {
        b.to_string()
    }
}
