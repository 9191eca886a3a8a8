//! Trait and impl tables handed to the vtable construction pass.
//!
//! Dispatch is tabular: "does `T` implement `Tr`" is a lookup in
//! [`TraitMeta::impls`], and a vtable slot is the declaration index of a
//! method within its trait.

/// `Type_Trait_method`: the graph name of one trait method instantiation.
pub fn qualified_name(type_name: &str, trait_name: &str, method: &str) -> String {
    format!("{type_name}_{trait_name}_{method}")
}

/// `Type_Trait`: the vtable qualifier carried by `Vtable_Construct`.
pub fn vtable_name(type_name: &str, trait_name: &str) -> String {
    format!("{type_name}_{trait_name}")
}

/// `Type_method`: the graph name of an inherent method.
pub fn inherent_name(type_name: &str, method: &str) -> String {
    format!("{type_name}_{method}")
}

/// Signature summary of one trait method.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodSig {
    pub name: String,
    /// Parameter count including `self`.
    pub param_count: u32,
    pub has_default: bool,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct TraitInfo {
    pub name: String,
    /// Methods in declaration order; the index is the vtable slot.
    pub methods: Vec<MethodSig>,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ImplInfo {
    pub type_name: String,
    /// `None` for inherent impls.
    pub trait_name: Option<String>,
    /// Graph names, in trait method order for trait impls.
    pub methods: Vec<String>,
}

impl ImplInfo {
    /// Vtable qualifier, for trait impls.
    pub fn vtable_name(&self) -> Option<String> {
        self.trait_name
            .as_deref()
            .map(|trait_name| vtable_name(&self.type_name, trait_name))
    }
}

/// Error raised by a conflicting re-record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraitMetaError {
    #[error("trait `{0}` is already recorded with a different method list")]
    TraitConflict(String),
    #[error("impl of {} for `{type_name}` is already recorded with different methods", trait_label(.trait_name.as_deref()))]
    ImplConflict {
        type_name: String,
        trait_name: Option<String>,
    },
}

fn trait_label(trait_name: Option<&str>) -> String {
    match trait_name {
        Some(name) => format!("`{name}`"),
        None => "inherent methods".to_string(),
    }
}

/// Declaration-ordered trait and impl tables.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct TraitMeta {
    traits: Vec<TraitInfo>,
    impls: Vec<ImplInfo>,
}

impl TraitMeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trait. Recording the same trait twice is a no-op.
    pub fn record_trait(
        &mut self,
        name: impl Into<String>,
        methods: Vec<MethodSig>,
    ) -> Result<(), TraitMetaError> {
        let name = name.into();
        if let Some(existing) = self.trait_info(&name) {
            if existing.methods == methods {
                return Ok(());
            }
            return Err(TraitMetaError::TraitConflict(name));
        }
        self.traits.push(TraitInfo { name, methods });
        Ok(())
    }

    /// Record an impl. Recording the same impl twice is a no-op.
    pub fn record_impl(
        &mut self,
        type_name: impl Into<String>,
        trait_name: Option<&str>,
        methods: Vec<String>,
    ) -> Result<(), TraitMetaError> {
        let type_name = type_name.into();
        if let Some(existing) = self.impl_of(&type_name, trait_name) {
            if existing.methods == methods {
                return Ok(());
            }
            return Err(TraitMetaError::ImplConflict {
                type_name,
                trait_name: trait_name.map(str::to_string),
            });
        }
        self.impls.push(ImplInfo {
            type_name,
            trait_name: trait_name.map(str::to_string),
            methods,
        });
        Ok(())
    }

    pub fn trait_info(&self, name: &str) -> Option<&TraitInfo> {
        self.traits.iter().find(|t| t.name == name)
    }

    /// Impls for `type_name`, inherent and trait, in declaration order.
    pub fn impls_of<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a ImplInfo> + 'a {
        self.impls.iter().filter(move |i| i.type_name == type_name)
    }

    /// The impl of `trait_name` (or the inherent impl, for `None`) for a type.
    pub fn impl_of(&self, type_name: &str, trait_name: Option<&str>) -> Option<&ImplInfo> {
        self.impls
            .iter()
            .find(|i| i.type_name == type_name && i.trait_name.as_deref() == trait_name)
    }

    /// The trait impl whose vtable qualifier is `Type_Trait`.
    pub fn impl_by_vtable(&self, qualifier: &str) -> Option<&ImplInfo> {
        self.impls
            .iter()
            .find(|i| i.vtable_name().as_deref() == Some(qualifier))
    }

    /// Vtable slot of `method` in `trait_name`.
    pub fn slot_of(&self, trait_name: &str, method: &str) -> Option<usize> {
        self.trait_info(trait_name)?
            .methods
            .iter()
            .position(|m| m.name == method)
    }

    pub fn traits(&self) -> &[TraitInfo] {
        &self.traits
    }

    pub fn impls(&self) -> &[ImplInfo] {
        &self.impls
    }
}
