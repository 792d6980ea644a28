//! Member access policy
//!
//! There is no ambient visibility elevation, so every call into a non-public
//! constructor, method or accessor goes through an explicit allow-list
//! decision made here.
//!
//! ## Policies
//!
//! | Policy      | Used by           | Allows                                              |
//! |-------------|-------------------|-----------------------------------------------------|
//! | PublicOnly  | reflective binder | public members, zero-argument constructors          |
//! | Owner       | compiling binder  | whatever code inside the owning module/type could   |
//!
//! ## Owner rules
//!
//! | Visibility         | Allowed when                                                   |
//! |--------------------|----------------------------------------------------------------|
//! | Public             | always                                                         |
//! | Internal           | declaring type lives in the owning module                      |
//! | Private            | declaring type is the designated owner type                    |
//! | Protected          | declaring type is the owner type or one of its bases           |
//! | ProtectedInternal  | Internal rule or Protected rule                                |
//!
//! A protected member reached through the owner type is accessed "as if
//! compiled inside the owner": the target is cast to the owner type first
//! and only then to the declaring type.

use weft_schema::{MethodHandle, MethodKind, ModuleId, Target, TypeKey, TypeRegistry, Visibility};
use weft_sdk::{HostError, HostResult, Value};

/// Access rights granted to the compiling binder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwningModule {
    /// Module whose internal members are reachable
    pub module: ModuleId,
    /// Type whose private and protected members are reachable
    pub owner_type: Option<TypeKey>,
}

impl OwningModule {
    pub fn new(module: ModuleId) -> Self {
        Self {
            module,
            owner_type: None,
        }
    }

    pub fn with_owner_type(mut self, owner_type: TypeKey) -> Self {
        self.owner_type = Some(owner_type);
        self
    }
}

/// How to reach the declaring-type part of a target, or why not
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastPlan {
    /// Cast straight to the declaring type
    Direct { declaring: TypeKey },
    /// Cast to the owner type, then to the declaring type
    AsOwner { owner: TypeKey, declaring: TypeKey },
    /// Access refused
    Denied(String),
}

impl CastPlan {
    pub fn is_denied(&self) -> bool {
        matches!(self, CastPlan::Denied(_))
    }

    /// Apply the plan to an instance
    pub fn apply<'a>(
        &self,
        registry: &TypeRegistry,
        instance: &'a Value,
    ) -> HostResult<Target<'a>> {
        let obj = instance.as_object().ok_or_else(|| HostError::InvalidCast {
            expected: "object".to_string(),
            got: instance.type_name().to_string(),
        })?;
        let target: Target<'a> = &**obj;
        match self {
            CastPlan::Direct { declaring } => cast_to(registry, target, *declaring),
            CastPlan::AsOwner { owner, declaring } => {
                let as_owner = cast_to(registry, target, *owner)?;
                cast_to(registry, as_owner, *declaring)
            }
            CastPlan::Denied(reason) => Err(HostError::AccessDenied(reason.clone())),
        }
    }
}

/// View `target` as its `to` part
pub fn cast_to<'a>(
    registry: &TypeRegistry,
    target: Target<'a>,
    to: TypeKey,
) -> HostResult<Target<'a>> {
    registry.cast(target, to).ok_or_else(|| HostError::InvalidCast {
        expected: type_name(registry, to),
        got: registry
            .by_type_id((*target).type_id())
            .map(|d| d.name.clone())
            .unwrap_or_else(|| "unregistered object".to_string()),
    })
}

pub(crate) fn type_name(registry: &TypeRegistry, key: TypeKey) -> String {
    registry
        .get(key)
        .map(|d| d.name.clone())
        .unwrap_or_else(|| key.to_string())
}

/// Who may touch what
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    PublicOnly,
    Owner(OwningModule),
}

impl AccessPolicy {
    /// Plan access to a constructor or method
    pub fn plan_method(&self, registry: &TypeRegistry, method: &MethodHandle) -> CastPlan {
        // Zero-argument constructors are reachable at any visibility
        if method.kind == MethodKind::Constructor && method.params.is_empty() {
            return CastPlan::Direct {
                declaring: method.declaring,
            };
        }
        self.plan(registry, method.declaring, method.visibility, &method.name)
    }

    /// Plan access to a member of `declaring` with `visibility`
    pub fn plan(
        &self,
        registry: &TypeRegistry,
        declaring: TypeKey,
        visibility: Visibility,
        what: &str,
    ) -> CastPlan {
        let direct = CastPlan::Direct { declaring };
        if visibility.is_public() {
            return direct;
        }
        let owner = match self {
            AccessPolicy::PublicOnly => {
                return denied(
                    registry,
                    declaring,
                    visibility,
                    what,
                    "only public members are reachable",
                )
            }
            AccessPolicy::Owner(owner) => owner,
        };

        let same_module = registry.get(declaring).map(|d| d.module) == Some(owner.module);
        let is_owner = owner.owner_type == Some(declaring);
        let protected_plan = || match owner.owner_type {
            Some(owner_type) if owner_type == declaring => Some(CastPlan::Direct { declaring }),
            Some(owner_type) if registry.is_assignable(owner_type, declaring) => {
                Some(CastPlan::AsOwner {
                    owner: owner_type,
                    declaring,
                })
            }
            _ => None,
        };

        let plan = match visibility {
            Visibility::Public => Some(direct),
            Visibility::Internal => same_module.then_some(direct),
            Visibility::Private => is_owner.then_some(direct),
            Visibility::Protected => protected_plan(),
            Visibility::ProtectedInternal => {
                if same_module {
                    Some(direct)
                } else {
                    protected_plan()
                }
            }
        };
        plan.unwrap_or_else(|| {
            denied(registry, declaring, visibility, what, "outside the owning module's rights")
        })
    }
}

fn denied(
    registry: &TypeRegistry,
    declaring: TypeKey,
    visibility: Visibility,
    what: &str,
    why: &str,
) -> CastPlan {
    CastPlan::Denied(format!(
        "{} member '{}.{}' is {}",
        visibility,
        type_name(registry, declaring),
        what,
        why
    ))
}
