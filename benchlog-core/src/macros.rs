//! Declarative generation of entity, draft and patch types.

/// Generate an entity row struct, its draft and patch types, and the
/// [`Entity`](crate::Entity) impl tying them together.
///
/// ```ignore
/// lab_entity! {
///     /// A standard operating procedure.
///     Sop, SopDraft, SopPatch {
///         kind: Sop,
///         order: ByLabel,
///         label: title,
///     }
///     fields {
///         title: String = String::new(),
///         version: String = "v1.0".to_string(),
///     }
/// }
/// ```
///
/// Every field default is used when a create payload omits the field.
/// Patch fields deserialize as `Option<T>` where absent means "keep".
macro_rules! lab_entity {
    (
        $(#[$meta:meta])*
        $name:ident, $draft:ident, $patch:ident {
            kind: $kind:ident,
            order: $order:ident,
            label: $label:ident $(,)?
        }
        fields {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty = $default:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub struct $name {
            pub id: i64,
            $( $(#[$fmeta])* pub $field: $ty, )*
            pub created_at: chrono::DateTime<chrono::Utc>,
            pub updated_at: chrono::DateTime<chrono::Utc>,
        }

        #[doc = concat!("Create payload for [`", stringify!($name), "`].")]
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        #[serde(default)]
        pub struct $draft {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl Default for $draft {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                }
            }
        }

        #[doc = concat!("Sparse update payload for [`", stringify!($name), "`].")]
        #[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
        pub struct $patch {
            $(
                #[serde(default, deserialize_with = "crate::serde_ext::deserialize_some")]
                pub $field: Option<$ty>,
            )*
        }

        impl $crate::Entity for $name {
            type Draft = $draft;
            type Patch = $patch;

            const KIND: $crate::EntityKind = $crate::EntityKind::$kind;
            const ORDER: $crate::ListOrder = $crate::ListOrder::$order;
            const LABEL_FIELD: &'static str = stringify!($label);
            const FIELDS: &'static [&'static str] = &[$( stringify!($field) ),*];

            fn id(&self) -> $crate::RowId {
                self.id
            }

            fn label(&self) -> &str {
                &self.$label
            }

            fn created_at(&self) -> $crate::Timestamp {
                self.created_at
            }

            fn from_draft(id: $crate::RowId, draft: $draft, now: $crate::Timestamp) -> Self {
                Self {
                    id,
                    $( $field: draft.$field, )*
                    created_at: now,
                    updated_at: now,
                }
            }

            fn apply_patch(&mut self, patch: $patch, now: $crate::Timestamp) {
                $(
                    if let Some(value) = patch.$field {
                        self.$field = value;
                    }
                )*
                self.updated_at = now;
            }

            fn replace(&mut self, draft: $draft, now: $crate::Timestamp) {
                $( self.$field = draft.$field; )*
                self.updated_at = now;
            }

            fn check_draft(draft: &$draft) -> Result<(), $crate::ValidationError> {
                $crate::entity::require_label(stringify!($label), &draft.$label)
            }

            fn check_patch(patch: &$patch) -> Result<(), $crate::ValidationError> {
                match &patch.$label {
                    Some(value) => $crate::entity::require_label(stringify!($label), value),
                    None => Ok(()),
                }
            }
        }
    };
}
