/// Nesting state shared by [`JsonReader`](crate::JsonReader) and
/// [`JsonWriter`](crate::JsonWriter).
///
/// The bottom of the stack is always a document scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    EmptyDocument,
    NonEmptyDocument,
    EmptyArray,
    NonEmptyArray,
    EmptyObject,
    /// A member name was read or written, its value is next.
    DanglingName,
    NonEmptyObject,
}
