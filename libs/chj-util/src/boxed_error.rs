//! Error types that are a single pointer wide.

/// Define an error type wrapper e.g. `Foo` around a
/// `Box<FooKind>`. Implements `std::error::Error`, `Deref` (to get at
/// `FooKind`) and `From` for everything `FooKind` can be built from,
/// so `thiserror`'s `#[from]` still works through the box. `FooKind`
/// has to be defined separately.
#[macro_export]
macro_rules! def_boxed_error {
    ($wrappername:ident, $kindname:ident) => {

        #[derive(Debug)]
        pub struct $wrappername(Box<$kindname>);

        impl $wrappername {
            pub fn kind(&self) -> &$kindname {
                &*self.0
            }

            pub fn into_kind(self) -> $kindname {
                *self.0
            }
        }

        impl std::ops::Deref for $wrappername {
            type Target = $kindname;

            fn deref(&self) -> &Self::Target {
                &*self.0
            }
        }

        impl<E> From<E> for $wrappername where $kindname: From<E> {
            fn from(err: E) -> Self {
                $wrappername(Box::new($kindname::from(err)))
            }
        }

        impl std::error::Error for $wrappername {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                self.0.source()
            }
        }

        impl std::fmt::Display for $wrappername {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                // (method call syntax is ambiguous here)
                std::fmt::Display::fmt(&*self.0, f)
            }
        }
    }
}


/// Defines both an error kind type (deriving `thiserror::Error`, so
/// the calling crate needs `thiserror` as a dependency) and its box
/// wrapper as per `def_boxed_error`.
#[macro_export]
macro_rules! def_boxed_thiserror {
    ($wrappername:ident, $vis:vis enum $kindname:ident {$($body:tt)*}) => {
        #[derive(thiserror::Error, Debug)]
        $vis enum $kindname {
            $($body)*
        }

        $crate::def_boxed_error!($wrappername, $kindname);
    };
}
