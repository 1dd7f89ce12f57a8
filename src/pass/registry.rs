//! Name-based pass lookup, so a host pipeline can request passes by string.

use crate::pass::validate::ValidatePass;
use crate::pass::wrapper::WrapperPass;
use crate::pass::Pass;

/// Registered identifiers, in the order `registered_passes` reports them.
const REGISTERED: &[(&str, &str)] = &[
    ("wrapper", "Wrapper pass"),
    ("validate", "SSA structural validation"),
];

/// Instantiates the pass registered under `name` with its default
/// configuration. Returns `None` for unknown names.
pub fn create_pass(name: &str) -> Option<Box<dyn Pass>> {
    match name {
        "wrapper" => Some(Box::new(WrapperPass::default())),
        "validate" => Some(Box::new(ValidatePass)),
        _ => None,
    }
}

/// `(name, description)` for every registered pass.
pub fn registered_passes() -> &'static [(&'static str, &'static str)] {
    REGISTERED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_name_instantiates() {
        for (name, _) in registered_passes() {
            let pass = create_pass(name).expect("registered pass must instantiate");
            assert_eq!(pass.name(), *name);
        }
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(create_pass("hello").is_none());
    }
}
