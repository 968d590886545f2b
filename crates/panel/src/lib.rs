//! Panel core: a cached, change-aware session forest over a record source.

pub mod actions;
pub mod cache;
pub mod clock;
pub mod error;
pub mod source;
pub mod view;

pub use actions::{BatchDeleteResult, BatchOutcome};
pub use cache::{CacheManager, CacheState, LoadSource, RefreshOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PanelError, Result};
pub use source::{JsonRecordSource, RecordSource, SessionMutations};
pub use view::PanelView;
