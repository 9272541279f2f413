use crate::{error::Error, traits::DynMessage};

///
/// Hooks
///
/// Called before each mutation; returning an error aborts the operation
/// before anything is written.
///

pub trait Hooks {
    fn on_insert(&self, message: &dyn DynMessage) -> Result<(), Error>;

    fn on_update(&self, existing: &dyn DynMessage, new: &dyn DynMessage) -> Result<(), Error>;

    fn on_delete(&self, message: &dyn DynMessage) -> Result<(), Error>;
}

///
/// WriteHooks
///
/// Notified once the batch carrying the mutation has been flushed.
///

pub trait WriteHooks {
    fn on_insert(&self, message: &dyn DynMessage);

    fn on_update(&self, existing: &dyn DynMessage, new: &dyn DynMessage);

    fn on_delete(&self, message: &dyn DynMessage);
}
