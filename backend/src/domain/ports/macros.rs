//! Helper macro for port error enums.
//!
//! Every variant gets a snake_case constructor whose fields accept
//! `impl Into<T>`, so adapters can write `UserDirectoryError::query(err.to_string())`
//! or pass a `&str` straight through.

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
    define_port_error! {
        pub enum SampleLedgerError {
            Unavailable => "ledger unavailable",
            Query { message: String } => "query failed: {message}",
            Shortfall { required: u64, available: u64 } => "need {required}, have {available}",
        }
    }

    #[test]
    fn unit_variant_constructor() {
        assert_eq!(SampleLedgerError::unavailable().to_string(), "ledger unavailable");
    }

    #[test]
    fn string_fields_accept_str() {
        assert_eq!(
            SampleLedgerError::query("timeout").to_string(),
            "query failed: timeout"
        );
    }

    #[test]
    fn numeric_fields_keep_their_type() {
        let err = SampleLedgerError::shortfall(300_u64, 200_u64);
        assert_eq!(
            err,
            SampleLedgerError::Shortfall {
                required: 300,
                available: 200
            }
        );
        assert_eq!(err.to_string(), "need 300, have 200");
    }
}
