//! Small declarative helpers shared across `rover-core` enums.

/// Implements `Display` for a unit-variant enum by mapping each variant to a
/// literal string, so log lines print `coordinate` rather than `Coordinate`.
macro_rules! simple_display {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let s = match self {
                    $(Self::$variant => $text,)+
                };
                f.write_str(s)
            }
        }
    };
}

pub(crate) use simple_display;
