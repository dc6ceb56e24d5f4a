mod toggleable;

use proc_macro::TokenStream;

/// Derive macro for the `Toggleable` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Toggleable)]
/// pub struct Post {
///     #[toggle(id)]
///     pub id: String,
///     #[toggle(relation = Like, count = like_count)]
///     pub liked_by_user: bool,
///     pub like_count: u64,
///     #[toggle(relation = Bookmark)]
///     pub bookmarked_by_user: bool,
/// }
/// ```
///
/// - `#[toggle(id)]`: the identifier field (defaults to a field named `id`)
/// - `#[toggle(relation = Kind)]`: a `bool` field caching the user's relation,
///   where `Kind` is a `RelationKind` variant
/// - `count = field`: the `u64` field holding the relation's aggregate count
#[proc_macro_derive(Toggleable, attributes(toggle))]
pub fn derive_toggleable(input: TokenStream) -> TokenStream {
    toggleable::derive_toggleable(input)
}
