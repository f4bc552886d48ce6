pub mod config;
pub mod controller;
pub mod error;
pub mod markup;
pub mod nav;
pub mod persist;
pub mod rebind;
pub mod submit;
pub mod util;

pub use config::Config;
pub use controller::{normalize_phone, LinkClick, Modifiers, NavigationState, WizardController};
pub use error::{FetchError, HistoryError, StorageError, WizardError};
pub use markup::{Document, Field, FieldKind, Form, Region, StepLink};
pub use nav::{
    Browser, FetchMethod, FetchRequest, FetchResponse, Fetcher, HeadlessBrowser, HistoryMode,
    HttpFetcher, NavOutcome, ScrollTarget, SwapDecision,
};
pub use persist::{
    FieldValue, FileStorage, FormSnapshot, MemoryStorage, PersistenceStore, SnapshotStorage,
};
pub use rebind::{NoopRebind, RebindChain, RebindHook};
pub use submit::{
    ConflictPrompt, CustomerSummary, DuplicateCheckQuery, DuplicateCheckResult, LogPrompt,
    RecordingPrompt, SubmissionState, SubmitOutcome, Submitter,
};
