//! Editor theme: panel colors and the monospace font the code is set in.

mod schema;
pub use schema::*;

mod deserializers;

mod ext;
pub use ext::*;
