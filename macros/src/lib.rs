mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a new documentation function for the route, named after the original function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the summary, the rest becomes the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates a new `XInput` struct for the model, used as the request body
/// for both creating and replacing a row.
///
/// Fields with `#[serde(skip_deserializing)]` or `#[serde(skip)]` are left out, `#[sqlx(..)]`
/// attributes and the `FromRow` derive are dropped, and all other attributes are kept verbatim.
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}
