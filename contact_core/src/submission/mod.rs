//! Form submission: delivery to the external form backend with a native-form fallback

pub mod fallback;
pub mod form;
pub mod in_flight;
pub mod orchestrator;
pub mod payload;
pub mod transport;

pub use fallback::{FallbackSubmitter, HtmlFormFallback, NativeFormPost};
pub use form::SubmissionForm;
pub use in_flight::{InFlightClaim, InFlightRegistry};
pub use orchestrator::{Delivery, SubmissionOrchestrator, SubmissionState, SubmitError};
pub use payload::{FormPayload, FORM_NAME_FIELD, HONEYPOT_FIELD};
pub use transport::{HttpTransport, Transport, TransportError};
