//! Small arithmetic helpers.

pub(crate) mod layout;
