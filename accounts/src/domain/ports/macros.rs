//! Macro generating port error enums with snake-case constructors.
//!
//! Each variant gets a `thiserror` message and a constructor named after the
//! variant whose field parameters accept anything convertible into the field
//! type.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    define_port_error! {
        pub enum SessionStoreError {
            Unavailable => "session store unavailable",
            Rejected { reason: String } => "session rejected: {reason}",
            Expired { age_secs: u64 } => "session expired after {age_secs}s",
            Tampered { cookie: String, attempts: u32 } => "cookie {cookie} tampered ({attempts})",
        }
    }

    #[test]
    fn unit_variants_get_argumentless_constructors() {
        assert_eq!(SessionStoreError::unavailable(), SessionStoreError::Unavailable);
        assert_eq!(
            SessionStoreError::unavailable().to_string(),
            "session store unavailable"
        );
    }

    #[test]
    fn string_fields_accept_str() {
        let err = SessionStoreError::rejected("bad signature");
        assert_eq!(err.to_string(), "session rejected: bad signature");
    }

    #[test]
    fn non_string_fields_keep_their_type() {
        let err = SessionStoreError::expired(7200_u64);
        assert_eq!(err.to_string(), "session expired after 7200s");
    }

    #[test]
    fn mixed_fields_follow_declaration_order() {
        let err = SessionStoreError::tampered("session", 3_u32);
        assert_eq!(err.to_string(), "cookie session tampered (3)");
    }
}
