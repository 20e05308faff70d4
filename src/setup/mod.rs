mod wizard;

pub use self::wizard::{SetupOutcome, SetupWizard};
