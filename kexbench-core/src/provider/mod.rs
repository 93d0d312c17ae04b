// SPDX-License-Identifier: Apache-2.0

//! Operation providers: the pluggable cryptographic backends under test.
//!
//! A provider exposes one complete operation cycle for its scheme (a full
//! mutual key exchange, or a full encapsulate/decapsulate round) behind a
//! common trait the trial runner drives. Providers are pure computation
//! with no timing concerns; they must raise on internal failure and never
//! return mismatched shared secrets silently.

mod mlkem;
mod x25519;

pub use mlkem::{MlKem, MlKemLevel};
pub use x25519::X25519Exchange;

use crate::error::BackendError;

/// A named cryptographic scheme the trial runner can measure.
pub trait OperationProvider {
    /// Stable configuration identifier for the result log,
    /// e.g. `classical_ecdh_software`.
    fn configuration(&self) -> &str;

    /// Execute one complete operation cycle, verifying that both ends of
    /// the scheme derived the same shared secret.
    fn run_cycle(&self) -> Result<(), BackendError>;
}
