//! The invocation facade: resolves an endpoint's transport and dispatches
//! through its executor, per §4.12.

mod error;
mod invoke;

pub use error::NetdispatchError;
pub use invoke::{Facade, InvokeOptions};
