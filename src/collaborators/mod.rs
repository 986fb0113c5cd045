//! External collaborators of a curation session.
//!
//! The session never talks to the knowledge base directly. It asks a
//! `FormProvider` for work and hands accepted candidates to a
//! `UsageExampleUploader`.

pub mod forms;
pub mod upload;

pub use forms::{FormProvider, FormProviderError, JsonFormProvider};
pub use upload::{ExportUploader, ExportedExample, UploadError, UploadOutcome, UsageExampleUploader};
