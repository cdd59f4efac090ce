pub mod dom;
pub mod error;
pub mod height;
pub mod protocol;
pub mod runtime;
pub mod template;

// Re-export the pieces the bridge wires together so hosts can write
// `quill_core::EmbeddedRuntime` etc.
pub use error::{DecodeError, DomError, StatementError};
pub use height::HeightSync;
pub use protocol::{Command, CommandEncoder, CommandName, EditorEvent};
pub use runtime::EmbeddedRuntime;
pub use runtime::observer::SizeModel;
pub use template::{DocumentTemplate, render_document};
