pub mod cgi;
pub mod config;
pub mod exception;
pub mod logging;
pub mod param;
pub mod request;
pub mod response;
pub mod server;
pub mod transport;
pub mod uri;
pub mod util;
pub mod validator;

pub use config::Config;
pub use exception::Exception;
pub use param::ContentKind;
pub use request::Request;
pub use response::Response;
pub use server::{handle_connection, serve, ServerContext};
pub use uri::{Classifier, ResolvedTarget};
pub use util::HtmlBuilder;
