// SPDX-License-Identifier: Apache-2.0

//! Post-quantum KEM provider: ML-KEM (FIPS 203) at the three standard
//! security levels.

use std::fmt;

use pqcrypto_traits::kem::SharedSecret as _;

use super::OperationProvider;
use crate::error::BackendError;

/// ML-KEM parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MlKemLevel {
    MlKem512,
    MlKem768,
    MlKem1024,
}

impl MlKemLevel {
    /// Canonical algorithm name as used in configuration identifiers and
    /// by external tools.
    pub fn name(&self) -> &'static str {
        match self {
            MlKemLevel::MlKem512 => "ML-KEM-512",
            MlKemLevel::MlKem768 => "ML-KEM-768",
            MlKemLevel::MlKem1024 => "ML-KEM-1024",
        }
    }

    /// Parse a canonical algorithm name.
    pub fn from_name(name: &str) -> Result<Self, BackendError> {
        match name {
            "ML-KEM-512" => Ok(MlKemLevel::MlKem512),
            "ML-KEM-768" => Ok(MlKemLevel::MlKem768),
            "ML-KEM-1024" => Ok(MlKemLevel::MlKem1024),
            _ => Err(BackendError::UnknownKemLevel {
                name: name.to_string(),
            }),
        }
    }

    pub const ALL: [MlKemLevel; 3] = [
        MlKemLevel::MlKem512,
        MlKemLevel::MlKem768,
        MlKemLevel::MlKem1024,
    ];
}

impl fmt::Display for MlKemLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

macro_rules! kem_cycle {
    ($kem:ident, $level:expr) => {{
        use pqcrypto_mlkem::$kem as kem;
        let (pk, sk) = kem::keypair();
        let (ss_enc, ct) = kem::encapsulate(&pk);
        let ss_dec = kem::decapsulate(&ct, &sk);
        if ss_enc.as_bytes() != ss_dec.as_bytes() {
            return Err(BackendError::SharedSecretMismatch {
                scheme: $level.name().to_string(),
            });
        }
        Ok(())
    }};
}

/// One complete KEM round: keypair, encapsulate, decapsulate, and an
/// equality check between the encapsulated and decapsulated secrets.
pub fn kem_cycle(level: MlKemLevel) -> Result<(), BackendError> {
    match level {
        MlKemLevel::MlKem512 => kem_cycle!(mlkem512, level),
        MlKemLevel::MlKem768 => kem_cycle!(mlkem768, level),
        MlKemLevel::MlKem1024 => kem_cycle!(mlkem1024, level),
    }
}

/// Software ML-KEM configuration at a fixed security level.
#[derive(Debug, Clone)]
pub struct MlKem {
    level: MlKemLevel,
    configuration: String,
}

impl MlKem {
    pub fn new(level: MlKemLevel) -> Self {
        Self {
            level,
            configuration: format!("pqc_mlkem_software_{}", level.name()),
        }
    }

    pub fn level(&self) -> MlKemLevel {
        self.level
    }
}

impl OperationProvider for MlKem {
    fn configuration(&self) -> &str {
        &self.configuration
    }

    fn run_cycle(&self) -> Result<(), BackendError> {
        kem_cycle(self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kem_cycle_all_levels() {
        for level in MlKemLevel::ALL {
            kem_cycle(level).unwrap();
        }
    }

    #[test]
    fn test_level_name_round_trip() {
        for level in MlKemLevel::ALL {
            assert_eq!(MlKemLevel::from_name(level.name()).unwrap(), level);
        }
        assert!(MlKemLevel::from_name("Kyber768").is_err());
    }

    #[test]
    fn test_provider_configuration_name() {
        let provider = MlKem::new(MlKemLevel::MlKem768);
        assert_eq!(provider.configuration(), "pqc_mlkem_software_ML-KEM-768");
    }
}
