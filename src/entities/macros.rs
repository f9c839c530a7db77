//! Macros for reducing boilerplate in the per-entity cascade API
//!
//! Every collection gets the same three entry points. Instead of writing
//! them by hand, list the collections once and let the macro generate
//! `delete_x`, `count_x` and `soft_delete_x` on the service type.

/// Generate per-collection cascade wrappers on a service type
///
/// The service type must provide generic `delete`, `count` and
/// `soft_delete` methods taking the collection name.
///
/// # Example
///
/// ```rust,ignore
/// impl_dependent_wrappers!(DependentService, {
///     "company" => (delete_company, count_company, soft_delete_company),
///     "user" => (delete_user, count_user, soft_delete_user),
/// });
///
/// let report = service.count_user(Filter::by_id(user_id)).await?;
/// ```
#[macro_export]
macro_rules! impl_dependent_wrappers {
    (
        $service:ty,
        {
            $( $collection:literal => ($delete:ident, $count:ident, $soft_delete:ident) ),* $(,)?
        }
    ) => {
        impl $service {
            $(
                #[doc = concat!("Delete `", $collection, "` records matching `filter`, dependents first")]
                pub async fn $delete(
                    &self,
                    filter: $crate::core::Filter,
                ) -> ::std::result::Result<$crate::cascade::CascadeResult, $crate::core::CascadeError> {
                    self.delete($collection, filter).await
                }

                #[doc = concat!("Count the dependents of `", $collection, "` records matching `filter`")]
                pub async fn $count(
                    &self,
                    filter: $crate::core::Filter,
                ) -> ::std::result::Result<$crate::cascade::CascadeResult, $crate::core::CascadeError> {
                    self.count($collection, filter).await
                }

                #[doc = concat!("Soft-delete `", $collection, "` records matching `filter` and their dependents")]
                pub async fn $soft_delete(
                    &self,
                    filter: $crate::core::Filter,
                    patch: $crate::core::Patch,
                ) -> ::std::result::Result<$crate::cascade::CascadeResult, $crate::core::CascadeError> {
                    self.soft_delete($collection, filter, patch).await
                }
            )*

            /// Collections with generated wrappers, in declaration order
            pub fn wrapped_collections() -> &'static [&'static str] {
                &[ $( $collection ),* ]
            }
        }
    };
}
