mod confirmation;

pub use confirmation::{AutoConfirm, StdinConfirmation, is_affirmative};
