pub mod document_session;

pub use document_session::{
    apply_command, close, edit, get_view, reload, set_status, CloseSummary, DocumentSessionActor, DocumentSessionArguments, DocumentSessionMsg,
    SessionError,
};
