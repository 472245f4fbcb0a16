pub mod mailer;
pub mod qr_label;
pub mod storage;

pub use mailer::{Mailer, SmtpMailer};
pub use qr_label::{LabelInput, QrLabelComposer};
pub use storage::{ImageKind, ImageStore, StagedFile};
