pub mod error;
pub mod events;
pub mod ledger;
pub mod mapping;
pub mod provider;
pub mod registry;
pub mod relation;
pub mod row;

pub mod config;
pub mod script;

pub mod cli;

pub use error::{MappingError, Result};
pub use events::{ListenerId, MappingChange, MappingEvent, Subscription};
pub use ledger::{ShiftEntry, ShiftLedger};
pub use mapping::{Attachment, PherogramMapping};
pub use provider::{Nucleotide, ReferenceProvider, TraceData};
pub use registry::RowMappings;
pub use relation::{Coordinate, IndexRelation};
pub use row::{ChangeKind, EditableRow, RowId, TokenChange, TokenRow};

pub use config::MapConfig;
