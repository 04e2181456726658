//! Declarative macro for defining kernel service interfaces.
//!
//! Each service is a `#[repr(C)]` struct of function pointers registered at
//! runtime through a [`ServiceCell`](crate::ServiceCell). Subsystems that
//! consume a service fetch the table through the generated accessor and
//! handle the `None` case themselves, so a missing provider is an explicit
//! condition rather than a hidden panic.
//!
//! For a service declared as `foo => FooServices { ... }` the macro
//! generates:
//! - `pub struct FooServices { ... }`
//! - `pub fn register_foo_services(&'static FooServices) -> bool`
//! - `pub fn is_foo_registered() -> bool`
//! - `pub fn foo_services() -> Option<&'static FooServices>`

#[macro_export]
macro_rules! define_service {
    (
        $(#[$svc_meta:meta])*
        $svc_name:ident => $struct_name:ident {
            $(
                $(#[$method_meta:meta])*
                $method_name:ident($($arg_name:ident : $arg_ty:ty),* $(,)?) $(-> $ret_ty:ty)?
            );* $(;)?
        }
    ) => {
        $(#[$svc_meta])*
        #[repr(C)]
        pub struct $struct_name {
            $(
                $(#[$method_meta])*
                pub $method_name: fn($($arg_ty),*) $(-> $ret_ty)?,
            )*
        }

        $crate::paste::paste! {
            static [<$svc_name:upper>]: $crate::ServiceCell<$struct_name> =
                $crate::ServiceCell::new(stringify!($svc_name));

            pub fn [<register_ $svc_name _services>](services: &'static $struct_name) -> bool {
                [<$svc_name:upper>].register(services)
            }

            #[inline]
            pub fn [<is_ $svc_name _registered>]() -> bool {
                [<$svc_name:upper>].is_registered()
            }

            #[inline(always)]
            pub fn [<$svc_name _services>]() -> Option<&'static $struct_name> {
                [<$svc_name:upper>].get()
            }
        }
    };
}
