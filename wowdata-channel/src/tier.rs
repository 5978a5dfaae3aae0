use crate::registration::Mode;
use wowdata_model::{EntityType, Record};
use wowdata_types::ParamGroup;

/// Outcome of dispatching a request to a tier.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled<T> {
    /// The tier never registered, or disabled, the entity type.
    Refused,
    /// Handler output; empty means nothing was found or written.
    Done(Vec<T>),
}

impl<T> Handled<T> {
    pub fn is_refused(&self) -> bool {
        matches!(self, Handled::Refused)
    }

    /// Handler output, empty when refused.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Handled::Refused => Vec::new(),
            Handled::Done(items) => items,
        }
    }
}

/// A request addressed to one tier.
#[derive(Debug, Clone, Copy)]
pub enum Request<'a> {
    Read(&'a [ParamGroup]),
    Write(&'a [Record]),
}

impl Request<'_> {
    pub fn mode(&self) -> Mode {
        match self {
            Request::Read(_) => Mode::Read,
            Request::Write(_) => Mode::Write,
        }
    }
}

/// Answer to a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Refused,
    Records(Vec<Record>),
    Written(Vec<bool>),
}

/// A backend tier the lookup orchestrator walks.
///
/// Implementations usually hold a [`crate::Registration`] and forward to it.
pub trait Tier: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Whether the tier serves `entity` at all.
    fn is_enabled(&self, entity: EntityType) -> bool;

    /// Looks up records for the given groups.
    fn read(&self, entity: EntityType, groups: &[ParamGroup]) -> Handled<Record>;

    /// Stores records; one result per (deduplicated) record.
    fn write(&self, entity: EntityType, records: &[Record]) -> Handled<bool>;

    /// Mode-dispatching entry point over [`Tier::read`] and [`Tier::write`].
    fn handle(&self, entity: EntityType, request: Request<'_>) -> Response {
        match request {
            Request::Read(groups) => match self.read(entity, groups) {
                Handled::Refused => Response::Refused,
                Handled::Done(records) => Response::Records(records),
            },
            Request::Write(records) => match self.write(entity, records) {
                Handled::Refused => Response::Refused,
                Handled::Done(results) => Response::Written(results),
            },
        }
    }
}
