//! Index newtypes.
//!
//! All ids are dense indices into the owning table of a [`ParserPlan`](crate::ParserPlan)
//! or of one [`FnPlan`](crate::FnPlan).

use serde::Serialize;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub u16);

        impl $name {
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(index as u16)
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Token kind as seen by a generated parser.
    TokenId,
    "T"
);
define_id!(
    /// Declared `%type` tag.
    TypeId,
    "Y"
);
define_id!(
    /// Parse function, one per expression.
    FnId,
    "F"
);
define_id!(
    /// State number inside one function.
    StateId,
    ""
);
define_id!(
    /// Semantic-value slot inside one function's frame. Slot 0 is `$$`.
    SlotId,
    "s"
);
define_id!(
    /// Action snippet.
    SnippetId,
    "A"
);
define_id!(
    /// Repeat counter inside one function's frame.
    CounterId,
    "c"
);
define_id!(
    /// Recovery block.
    RecoveryId,
    "R"
);

impl SlotId {
    /// The expression output slot.
    pub const OUTPUT: SlotId = SlotId(0);
}
