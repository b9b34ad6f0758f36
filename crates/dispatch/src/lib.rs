//! Dispatch layer between a modeling host and the mesh operations.
//!
//! A host sends a [`Request`] naming an operation, its parameters and a mesh as flat
//! arrays. The [`Registry`] maps the name to a constructor, the [`Dispatcher`] runs
//! the constructed [`Operation`] once and hands back a [`ResultPayload`] telling the
//! host what to do: show a message, replace or add a mesh, or color faces.
//!
//! ```no_run
//! use meshbridge::{dispatch, Registry, Request};
//!
//! let request = Request::new("test").with_parameter("output_option", "DISPLAY_TEXT");
//! let payload = dispatch(Registry::global(), request).unwrap();
//! println!("{}", payload.result_text().unwrap_or_default());
//! ```

mod dispatcher;
mod error;
mod operation;
mod operations;
mod params;
mod payload;
mod registry;
mod request;

pub use dispatcher::*;
pub use error::*;
pub use operation::*;
pub use operations::*;
pub use params::*;
pub use payload::*;
pub use registry::*;
pub use request::*;
