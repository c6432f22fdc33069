//! Domain model shared by the store, the importer and the metric engine.

pub mod act;
pub mod event;
pub mod metric;
pub mod pattern;
pub mod role;

pub use act::ActCode;
pub use event::{Speaker, SpeechEvent};
pub use metric::{MetricRecord, ParseTallyError, RoleTally};
pub use pattern::{ANY_CODE, CATALOGUE, PatternError, TransitionPattern};
pub use role::{ParseRoleError, ROLES, Role};
