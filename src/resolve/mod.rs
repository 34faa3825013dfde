//! Built-in build steps that turn symbolic inputs and missing gas fields
//! into concrete values.
//!
//! They run after caller-registered steps, in the order returned by
//! [`default_steps`]. Steps that need the network skip gas fields when no
//! client is configured, leaving the final encode to report what is missing.

mod gas;
mod inputs;
mod objects;
mod validate;

use std::sync::Arc;

pub use gas::{SetGasBudget, SetGasPayment, SetGasPrice};
pub use inputs::NormalizeInputs;
pub use objects::ResolveObjects;
pub use validate::ValidateLimits;

use crate::pipeline::BuildStep;

pub fn default_steps() -> Vec<Arc<dyn BuildStep>> {
    vec![
        Arc::new(NormalizeInputs),
        Arc::new(ResolveObjects),
        Arc::new(SetGasPrice),
        Arc::new(SetGasBudget),
        Arc::new(SetGasPayment),
        Arc::new(ValidateLimits),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_order() {
        let names: Vec<String> = default_steps().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(
            names,
            [
                "NormalizeInputs",
                "ResolveObjects",
                "SetGasPrice",
                "SetGasBudget",
                "SetGasPayment",
                "ValidateLimits"
            ]
        );
    }
}
