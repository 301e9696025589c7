//! State engine behind a challenge scoreboard: fetches the catalog and the
//! user's solves, derives the filtered and sorted list, keeps it fresh, and
//! coordinates one open task with its key submissions.

pub mod board;
pub mod completion;
pub mod detail;
pub mod error;
pub mod presentation;
pub mod refresh;
pub mod remote;
pub mod state;
pub mod submission;

pub use board::{BoardController, BoardOptions};
pub use detail::{Location, MemoryLocation};
pub use error::{BoardError, BoardResult};
pub use presentation::FilterSet;
pub use remote::{CatalogService, RemoteCatalogClient};
pub use state::{BoardEvent, BoardView};
