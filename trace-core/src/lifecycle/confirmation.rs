use super::DeviceAction;

/// Operations that cannot be undone once the backend accepts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrreversibleOperation {
    Retire,
    DiscountLetter,
}

impl IrreversibleOperation {
    pub fn warning(&self) -> &'static str {
        match self {
            Self::Retire => "Retiring a device is permanent and cannot be undone.",
            Self::DiscountLetter => {
                "Generating the discount letter marks the device as STOLEN permanently."
            }
        }
    }

    pub fn for_action(action: DeviceAction) -> Option<Self> {
        action.is_irreversible().then_some(Self::Retire)
    }
}

impl std::fmt::Display for IrreversibleOperation {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Retire => f.write_str("retire"),
            Self::DiscountLetter => f.write_str("discount letter"),
        }
    }
}

/// Proof that a person acknowledged an irreversible operation.
///
/// Not `Clone`: each submission consumes its own token, so a retry after a
/// failure needs a fresh acknowledgement.
#[derive(Debug)]
pub struct Confirmation {
    operation: IrreversibleOperation,
}

impl Confirmation {
    pub fn acknowledge(operation: IrreversibleOperation) -> Self {
        Self { operation }
    }

    pub fn operation(&self) -> IrreversibleOperation {
        self.operation
    }

    pub fn covers(
        &self,
        operation: IrreversibleOperation,
    ) -> bool {
        self.operation == operation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_retire_maps_to_an_irreversible_operation() {
        assert_eq!(
            IrreversibleOperation::for_action(DeviceAction::Retire),
            Some(IrreversibleOperation::Retire)
        );
        assert_eq!(IrreversibleOperation::for_action(DeviceAction::MarkAvailable), None);
    }

    #[test]
    fn confirmation_is_bound_to_its_operation() {
        let confirmation = Confirmation::acknowledge(IrreversibleOperation::DiscountLetter);

        assert!(confirmation.covers(IrreversibleOperation::DiscountLetter));
        assert!(!confirmation.covers(IrreversibleOperation::Retire));
    }
}
